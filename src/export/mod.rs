use std::path::Path;
use thiserror::Error;

pub mod csv_exporter;

pub use csv_exporter::{read_records, CsvExporter};

use crate::retrieval::ChatRecord;

/// Number of columns every export carries.
pub const COLUMN_COUNT: usize = 9;

/// Column names in field order: sequence, datetime, elapsed time, author name,
/// message, type, currency unit, amount, channel reference.
pub const DEFAULT_HEADER: [&str; COLUMN_COUNT] = [
    "num", "d_time", "e_time", "name", "message", "type", "unit", "amount", "channel",
];

/// エクスポートエラー
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    #[error("File access error: {path}: {source}")]
    FileAccess {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ExportError {
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }
}

/// Checks that `header` names exactly one column per record field.
pub fn validate_header<S: AsRef<str>>(header: &[S]) -> Result<(), ExportError> {
    if header.len() != COLUMN_COUNT {
        return Err(ExportError::invalid_data(format!(
            "header must have {} columns, got {}",
            COLUMN_COUNT,
            header.len()
        )));
    }
    if let Some(empty) = header.iter().position(|h| h.as_ref().is_empty()) {
        return Err(ExportError::invalid_data(format!(
            "header column {} is empty",
            empty + 1
        )));
    }
    Ok(())
}

/// Writes `records` under `header` to `destination` as CSV with the default
/// delimiter.
pub fn export<S: AsRef<str>>(
    records: &[ChatRecord],
    header: &[S],
    destination: &Path,
) -> Result<(), ExportError> {
    CsvExporter::new().export_to_file(records, header, destination)
}
