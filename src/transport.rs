//! Remote chat-log transport abstraction.
//!
//! The retrieval engine and the replay validator only see these traits, so the
//! InnerTube client in [`crate::api::innertube`] can be swapped for a scripted
//! transport in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::api::youtube::{FetchError, VideoId};

/// One chat event as the platform reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatEvent {
    /// Wall-clock time the event was posted, `%Y-%m-%d %H:%M:%S`
    pub datetime: String,
    /// Offset from stream start as displayed by the player (e.g. `1:02:03`)
    pub elapsed_time: String,
    pub author_name: String,
    pub message: String,
    /// `textMessage`, `superChat`, `superSticker`, `newSponsor`
    pub event_type: String,
    /// ISO currency code, empty when the event carries no payment
    pub currency: String,
    /// Payment amount, zero when the event carries no payment
    pub amount: f64,
    pub author_channel_url: String,
}

/// A page of chat events returned by a single pull.
pub type Batch = Vec<ChatEvent>;

/// Opens chat-log sessions for a video.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    type Session: ChatSession;

    /// Opens a session. Fails with [`FetchError::InvalidVideoId`] when the
    /// identifier cannot be resolved at all.
    async fn open(&self, video_id: &VideoId) -> Result<Self::Session, FetchError>;
}

/// An open chat-log session.
#[async_trait]
pub trait ChatSession: Send {
    /// Whether more batches can be pulled.
    fn is_alive(&self) -> bool;

    /// Whether the session reads an archived stream. Valid after the first `get`.
    fn is_replay(&self) -> bool;

    /// Pulls the next batch.
    async fn get(&mut self) -> Result<Batch, FetchError>;

    /// Ends the session, dropping anything not yet pulled.
    fn terminate(&mut self);
}
