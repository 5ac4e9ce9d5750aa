//! Chat retrieval engine.
//!
//! [`RetrievalEngine::step`] pulls one batch from the transport and appends it to
//! the [`FetchSession`]. [`retrieve`] drives the steps to the end of the log,
//! reporting progress and checking for cancellation between batches. A pending
//! cancellation also interrupts a pull that is still waiting on the transport.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::api::youtube::{FetchError, VideoId};
use crate::transport::{Batch, ChatEvent, ChatSession, ChatTransport};

#[derive(Error, Debug)]
pub enum RetrieveError {
    #[error("Retrieval cancelled")]
    Cancelled,
    #[error("Transport error: {0}")]
    Transport(#[from] FetchError),
}

/// One exported chat row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRecord {
    /// 1-based position in retrieval order
    pub num: u64,
    pub datetime: String,
    pub elapsed_time: String,
    pub author_name: String,
    pub message: String,
    pub event_type: String,
    pub currency: String,
    pub amount: f64,
    pub author_channel_url: String,
}

impl ChatRecord {
    pub fn from_event(num: u64, event: ChatEvent) -> Self {
        Self {
            num,
            datetime: event.datetime,
            elapsed_time: event.elapsed_time,
            author_name: event.author_name,
            message: event.message,
            event_type: event.event_type,
            currency: event.currency,
            amount: event.amount,
            author_channel_url: event.author_channel_url,
        }
    }
}

/// Records accumulated for one video during a single run.
#[derive(Debug, Clone)]
pub struct FetchSession {
    pub video_id: VideoId,
    records: Vec<ChatRecord>,
    cancelled: bool,
    pub started_at: DateTime<Local>,
    pub finished_at: Option<DateTime<Local>>,
}

impl FetchSession {
    pub fn new(video_id: VideoId) -> Self {
        Self {
            video_id,
            records: Vec::new(),
            cancelled: false,
            started_at: Local::now(),
            finished_at: None,
        }
    }

    /// Numbers and appends every event of `batch`. Returns the batch size.
    pub fn append_batch(&mut self, batch: Batch) -> usize {
        let count = batch.len();
        self.records.reserve(count);
        for event in batch {
            let num = self.records.len() as u64 + 1;
            self.records.push(ChatRecord::from_event(num, event));
        }
        count
    }

    pub fn total(&self) -> usize {
        self.records.len()
    }

    pub fn records(&self) -> &[ChatRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<ChatRecord> {
        self.records
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    fn mark_cancelled(&mut self) {
        self.cancelled = true;
        self.finished_at = Some(Local::now());
    }

    fn mark_finished(&mut self) {
        self.finished_at = Some(Local::now());
    }
}

/// Receives the running record count after every batch.
pub trait ProgressSink {
    fn report(&mut self, total: usize);
}

impl<F: FnMut(usize)> ProgressSink for F {
    fn report(&mut self, total: usize) {
        self(total)
    }
}

/// Discards progress reports.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _total: usize) {}
}

/// Result of a single [`RetrievalEngine::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// A batch with this many events was appended
    Batch(usize),
    /// The transport reported the end of the log
    Finished,
    /// Cancellation was observed while waiting on the transport
    Cancelled,
}

/// Step-wise fetch over one open chat session.
pub struct RetrievalEngine<S: ChatSession> {
    session: S,
    fetch: FetchSession,
}

impl<S: ChatSession> RetrievalEngine<S> {
    pub async fn open<T>(transport: &T, video_id: VideoId) -> Result<Self, RetrieveError>
    where
        T: ChatTransport<Session = S>,
    {
        let session = transport.open(&video_id).await?;
        tracing::info!(video_id = %video_id, "📥 Chat retrieval started");
        Ok(Self::new(session, FetchSession::new(video_id)))
    }

    pub fn new(session: S, fetch: FetchSession) -> Self {
        Self { session, fetch }
    }

    /// Pulls and records the next batch.
    pub async fn step(&mut self, cancel: &CancellationToken) -> Result<Step, RetrieveError> {
        if self.fetch.is_cancelled() {
            return Ok(Step::Cancelled);
        }
        if !self.session.is_alive() {
            self.fetch.mark_finished();
            return Ok(Step::Finished);
        }

        let pulled = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            batch = self.session.get() => Some(batch),
        };
        let Some(batch) = pulled else {
            self.cancel();
            return Ok(Step::Cancelled);
        };

        let count = self.fetch.append_batch(batch?);
        tracing::trace!(count, total = self.fetch.total(), "📦 Batch appended");
        Ok(Step::Batch(count))
    }

    /// Terminates the transport session. Buffered data is abandoned.
    pub fn cancel(&mut self) {
        self.session.terminate();
        self.fetch.mark_cancelled();
        tracing::info!(
            video_id = %self.fetch.video_id,
            discarded = self.fetch.total(),
            "🛑 Chat retrieval cancelled"
        );
    }

    pub fn total(&self) -> usize {
        self.fetch.total()
    }

    pub fn fetch_session(&self) -> &FetchSession {
        &self.fetch
    }

    pub fn into_fetch_session(self) -> FetchSession {
        self.fetch
    }
}

/// Fetches the whole chat log of `video_id`.
///
/// Returns the records in arrival order together with their count, or
/// [`RetrieveError::Cancelled`] once `cancel` fires. Records of a cancelled run
/// are dropped.
pub async fn retrieve<T, P>(
    transport: &T,
    video_id: VideoId,
    progress: &mut P,
    cancel: &CancellationToken,
) -> Result<(Vec<ChatRecord>, usize), RetrieveError>
where
    T: ChatTransport,
    P: ProgressSink + ?Sized,
{
    let mut engine = RetrievalEngine::open(transport, video_id).await?;

    loop {
        match engine.step(cancel).await? {
            Step::Batch(_) => {
                progress.report(engine.total());
                if cancel.is_cancelled() {
                    engine.cancel();
                    return Err(RetrieveError::Cancelled);
                }
                tokio::task::yield_now().await;
            }
            Step::Finished => break,
            Step::Cancelled => return Err(RetrieveError::Cancelled),
        }
    }

    let fetch = engine.into_fetch_session();
    let total = fetch.total();
    tracing::info!(video_id = %fetch.video_id, total, "✅ Chat retrieval finished");
    Ok((fetch.into_records(), total))
}
