//! Session orchestration: normalize → validate → retrieve → export.

use std::path::PathBuf;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::api::youtube::FetchError;
use crate::export::{CsvExporter, ExportError, DEFAULT_HEADER};
use crate::locator::normalize;
use crate::retrieval::{retrieve, ProgressSink, RetrieveError};
use crate::transport::ChatTransport;
use crate::validator::{validate, ValidationFailure};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Locator or destination was empty
    EmptyField,
    /// Malformed URL, unknown video, live broadcast or no chat replay
    InvalidOrNotReplayable,
}

/// Terminal state of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Completed { total: usize, elapsed: Duration },
    Cancelled,
    Rejected { reason: RejectReason },
}

/// Failures that end a session without an [`Outcome`].
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Export failed: {0}")]
    Export(#[from] ExportError),
    #[error("Transport failed: {0}")]
    Transport(#[from] FetchError),
}

/// Runs one fetch-and-export session against `transport`.
pub struct SessionRunner<'a, T: ChatTransport> {
    transport: &'a T,
    exporter: CsvExporter,
    header: Vec<String>,
}

impl<'a, T: ChatTransport> SessionRunner<'a, T> {
    pub fn new(transport: &'a T) -> Self {
        Self {
            transport,
            exporter: CsvExporter::new(),
            header: DEFAULT_HEADER.iter().map(|h| h.to_string()).collect(),
        }
    }

    pub fn with_exporter(mut self, exporter: CsvExporter) -> Self {
        self.exporter = exporter;
        self
    }

    pub fn with_header(mut self, header: Vec<String>) -> Self {
        self.header = header;
        self
    }

    /// Fetches the chat replay named by `raw_input` and writes it to
    /// `raw_destination`.
    ///
    /// Empty inputs are rejected before the transport is contacted. On
    /// cancellation nothing is written. `elapsed` covers retrieval and export.
    pub async fn run<P>(
        &self,
        raw_input: &str,
        raw_destination: &str,
        progress: &mut P,
        cancel: &CancellationToken,
    ) -> Result<Outcome, SessionError>
    where
        P: ProgressSink + ?Sized,
    {
        if raw_input.trim().is_empty() || raw_destination.is_empty() {
            tracing::warn!("⚠️ Locator or destination is empty");
            return Ok(Outcome::Rejected {
                reason: RejectReason::EmptyField,
            });
        }
        let destination = PathBuf::from(raw_destination);

        let video_id = match normalize(raw_input) {
            Ok(video_id) => video_id,
            Err(e) => {
                tracing::warn!("⚠️ {}", e);
                return Ok(Outcome::Rejected {
                    reason: RejectReason::InvalidOrNotReplayable,
                });
            }
        };

        let video_id = match validate(self.transport, video_id).await {
            Ok(video_id) => video_id,
            Err(ValidationFailure::Transport(e)) => return Err(e.into()),
            Err(e) => {
                tracing::warn!("⚠️ {}", e);
                return Ok(Outcome::Rejected {
                    reason: RejectReason::InvalidOrNotReplayable,
                });
            }
        };

        let started = Instant::now();

        let (records, total) = match retrieve(self.transport, video_id, progress, cancel).await {
            Ok(result) => result,
            Err(RetrieveError::Cancelled) => return Ok(Outcome::Cancelled),
            Err(RetrieveError::Transport(e)) => return Err(e.into()),
        };

        self.exporter
            .export_to_file(&records, self.header.as_slice(), &destination)?;

        let elapsed = started.elapsed();
        tracing::info!(total, elapsed_ms = elapsed.as_millis() as u64, "🏁 Session completed");
        Ok(Outcome::Completed { total, elapsed })
    }
}

/// [`SessionRunner::run`] with the default exporter and header.
pub async fn run_session<T, P>(
    transport: &T,
    raw_input: &str,
    raw_destination: &str,
    progress: &mut P,
    cancel: &CancellationToken,
) -> Result<Outcome, SessionError>
where
    T: ChatTransport,
    P: ProgressSink + ?Sized,
{
    SessionRunner::new(transport)
        .run(raw_input, raw_destination, progress, cancel)
        .await
}
