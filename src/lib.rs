pub mod api;
pub mod config;
pub mod export;
pub mod locator;
pub mod logging;
pub mod retrieval;
pub mod session;
pub mod transport;
pub mod validator;

pub use api::innertube::get_live_chat;

// Re-export the main error types for convenience
pub use api::youtube::FetchError;
pub use export::ExportError;
pub use locator::LocatorError;
pub use retrieval::RetrieveError;
pub use session::SessionError;
pub use validator::ValidationFailure;

// Re-export the pipeline entry points
pub use api::innertube::InnerTubeTransport;
pub use api::youtube::VideoId;
pub use export::{export, CsvExporter, DEFAULT_HEADER};
pub use locator::normalize;
pub use retrieval::{retrieve, ChatRecord, FetchSession, NoProgress, ProgressSink};
pub use session::{run_session, Outcome, RejectReason, SessionRunner};
pub use transport::{ChatEvent, ChatSession, ChatTransport};
pub use validator::validate;

pub use tokio_util::sync::CancellationToken;
