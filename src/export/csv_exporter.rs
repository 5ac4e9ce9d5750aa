use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use super::{validate_header, ExportError, COLUMN_COUNT};
use crate::retrieval::ChatRecord;

/// CSV形式エクスポーター
#[derive(Debug, Clone)]
pub struct CsvExporter {
    delimiter: char,
}

impl CsvExporter {
    pub fn new() -> Self {
        Self { delimiter: ',' }
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// CSVフィールドをエスケープ
    fn escape_csv_field(&self, field: &str) -> String {
        if field.contains(self.delimiter)
            || field.contains('"')
            || field.contains('\n')
            || field.contains('\r')
        {
            format!("\"{}\"", field.replace('"', "\"\""))
        } else {
            field.to_string()
        }
    }

    fn join(&self, fields: impl IntoIterator<Item = String>) -> String {
        fields
            .into_iter()
            .collect::<Vec<_>>()
            .join(&self.delimiter.to_string())
    }

    /// レコードをCSV行に変換
    fn record_to_csv_row(&self, record: &ChatRecord) -> String {
        self.join([
            record.num.to_string(),
            self.escape_csv_field(&record.datetime),
            self.escape_csv_field(&record.elapsed_time),
            self.escape_csv_field(&record.author_name),
            self.escape_csv_field(&record.message),
            self.escape_csv_field(&record.event_type),
            self.escape_csv_field(&record.currency),
            record.amount.to_string(),
            self.escape_csv_field(&record.author_channel_url),
        ])
    }

    /// Serializes the header row and one row per record, each ending in `\n`.
    pub fn export<S: AsRef<str>>(
        &self,
        records: &[ChatRecord],
        header: &[S],
    ) -> Result<Vec<u8>, ExportError> {
        validate_header(header)?;
        if matches!(self.delimiter, '"' | '\r' | '\n') {
            return Err(ExportError::invalid_data(format!(
                "unusable delimiter {:?}",
                self.delimiter
            )));
        }

        let mut csv_content = Vec::new();

        let header_row = self.join(header.iter().map(|h| self.escape_csv_field(h.as_ref())));
        csv_content.extend_from_slice(header_row.as_bytes());
        csv_content.push(b'\n');

        for record in records {
            csv_content.extend_from_slice(self.record_to_csv_row(record).as_bytes());
            csv_content.push(b'\n');
        }

        Ok(csv_content)
    }

    /// Writes the export to `path`, replacing any existing content.
    pub fn export_to_file<S: AsRef<str>>(
        &self,
        records: &[ChatRecord],
        header: &[S],
        path: &Path,
    ) -> Result<(), ExportError> {
        let csv_content = self.export(records, header)?;

        let file_access = |source: std::io::Error| ExportError::FileAccess {
            path: path.display().to_string(),
            source,
        };
        let file = File::create(path).map_err(file_access)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(&csv_content).map_err(file_access)?;
        writer.flush().map_err(file_access)?;

        tracing::info!(
            path = %path.display(),
            rows = records.len(),
            bytes = csv_content.len(),
            "💾 CSV exported"
        );
        Ok(())
    }

    /// Splits CSV text into rows of fields. Rows end at a `\n` outside quotes;
    /// every other character of a quoted field, `\r` included, is kept.
    fn parse_rows(&self, text: &str) -> Result<Vec<Vec<String>>, ExportError> {
        let mut rows = Vec::new();
        let mut row = Vec::new();
        let mut field = String::new();
        let mut in_quotes = false;
        let mut chars = text.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '"' if in_quotes && chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => in_quotes = !in_quotes,
                c if c == self.delimiter && !in_quotes => row.push(std::mem::take(&mut field)),
                '\n' if !in_quotes => {
                    row.push(std::mem::take(&mut field));
                    rows.push(std::mem::take(&mut row));
                }
                c => field.push(c),
            }
        }
        if in_quotes {
            return Err(ExportError::invalid_data("unterminated quoted field"));
        }
        // Last row without a trailing newline
        if !field.is_empty() || !row.is_empty() {
            row.push(field);
            rows.push(row);
        }
        Ok(rows)
    }

    /// Reads a file written by [`CsvExporter::export_to_file`] back into its
    /// header and records.
    pub fn read_file(&self, path: &Path) -> Result<(Vec<String>, Vec<ChatRecord>), ExportError> {
        let text = fs::read_to_string(path)?;
        let rows = self.parse_rows(&text)?;

        let mut rows = rows.into_iter();
        let header = rows
            .next()
            .ok_or_else(|| ExportError::invalid_data("missing header row"))?;
        validate_header(header.as_slice())?;

        let records = rows
            .enumerate()
            .map(|(index, row)| row_to_record(index + 2, row))
            .collect::<Result<Vec<_>, _>>()?;

        Ok((header, records))
    }
}

fn row_to_record(row_number: usize, row: Vec<String>) -> Result<ChatRecord, ExportError> {
    let fields: [String; COLUMN_COUNT] = row.try_into().map_err(|row: Vec<String>| {
        ExportError::invalid_data(format!(
            "row {} has {} columns, expected {}",
            row_number,
            row.len(),
            COLUMN_COUNT
        ))
    })?;
    let [num, datetime, elapsed_time, author_name, message, event_type, currency, amount, author_channel_url] =
        fields;

    Ok(ChatRecord {
        num: num
            .parse()
            .map_err(|e| ExportError::invalid_data(format!("row {}: bad num: {}", row_number, e)))?,
        datetime,
        elapsed_time,
        author_name,
        message,
        event_type,
        currency,
        amount: amount
            .parse()
            .map_err(|e| ExportError::invalid_data(format!("row {}: bad amount: {}", row_number, e)))?,
        author_channel_url,
    })
}

/// Reads a comma-delimited export back into its header and records.
pub fn read_records(path: &Path) -> Result<(Vec<String>, Vec<ChatRecord>), ExportError> {
    CsvExporter::new().read_file(path)
}

impl Default for CsvExporter {
    fn default() -> Self {
        Self::new()
    }
}
