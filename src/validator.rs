//! Pre-flight check that a video is an archived, replayable stream.

use thiserror::Error;

use crate::api::youtube::{FetchError, VideoId};
use crate::transport::{ChatSession, ChatTransport};

#[derive(Error, Debug)]
pub enum ValidationFailure {
    #[error("Invalid video id: {0}")]
    InvalidIdentifier(VideoId),
    /// Live broadcasts and videos without a chat replay
    #[error("Video {0} has no chat replay")]
    NotReplayable(VideoId),
    #[error("Transport error: {0}")]
    Transport(#[source] FetchError),
}

/// Opens a session for `video_id` and pulls a single batch to learn whether it
/// is a replay. The session is terminated before returning.
pub async fn validate<T: ChatTransport>(
    transport: &T,
    video_id: VideoId,
) -> Result<VideoId, ValidationFailure> {
    let mut session = match transport.open(&video_id).await {
        Ok(session) => session,
        Err(FetchError::InvalidVideoId(_)) => {
            return Err(ValidationFailure::InvalidIdentifier(video_id));
        }
        Err(e) => return Err(ValidationFailure::Transport(e)),
    };

    if !session.is_alive() {
        tracing::info!(video_id = %video_id, "🚫 No chat available");
        return Err(ValidationFailure::NotReplayable(video_id));
    }

    let result = session.get().await;
    let is_replay = session.is_replay();
    session.terminate();
    result.map_err(ValidationFailure::Transport)?;

    if is_replay {
        tracing::info!(video_id = %video_id, "✅ Chat replay available");
        Ok(video_id)
    } else {
        tracing::info!(video_id = %video_id, "🚫 Not a replay (live or no archive)");
        Err(ValidationFailure::NotReplayable(video_id))
    }
}
