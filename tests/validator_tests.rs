//! Replay validation against a scripted transport

mod support;

use rechat::{validate, ValidationFailure, VideoId};
use support::{batches, Call, Script, ScriptedTransport};

fn video_id() -> VideoId {
    VideoId("ABC123".to_string())
}

#[tokio::test]
async fn test_replay_is_accepted_after_one_batch() {
    let transport = ScriptedTransport::new(Script::replay(batches(&[3, 3, 3])));

    let validated = validate(&transport, video_id()).await.unwrap();

    assert_eq!(validated, video_id());
    assert_eq!(
        transport.calls(),
        vec![Call::Open("ABC123".to_string()), Call::Get, Call::Terminate]
    );
}

#[tokio::test]
async fn test_live_stream_is_not_replayable() {
    let transport = ScriptedTransport::new(Script::live(batches(&[2, 2])));

    let result = validate(&transport, video_id()).await;

    assert!(matches!(result, Err(ValidationFailure::NotReplayable(id)) if id == video_id()));
    assert_eq!(transport.count(&Call::Get), 1);
    assert_eq!(transport.count(&Call::Terminate), 1);
}

#[tokio::test]
async fn test_unresolvable_id_is_invalid() {
    let transport = ScriptedTransport::new(Script::invalid());

    let result = validate(&transport, video_id()).await;

    assert!(matches!(result, Err(ValidationFailure::InvalidIdentifier(_))));
    assert_eq!(transport.calls(), vec![Call::Open("ABC123".to_string())]);
}

#[tokio::test]
async fn test_video_without_chat_is_not_replayable() {
    let transport = ScriptedTransport::new(Script::replay(vec![]));

    let result = validate(&transport, video_id()).await;

    assert!(matches!(result, Err(ValidationFailure::NotReplayable(_))));
    assert_eq!(transport.count(&Call::Get), 0);
}

#[tokio::test]
async fn test_transport_error_is_propagated() {
    let transport = ScriptedTransport::new(Script {
        fail_at: Some(0),
        ..Script::replay(batches(&[1]))
    });

    let result = validate(&transport, video_id()).await;

    assert!(matches!(result, Err(ValidationFailure::Transport(_))));
    assert_eq!(transport.count(&Call::Terminate), 1);
}
