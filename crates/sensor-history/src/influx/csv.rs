//! Annotated-CSV table parsing for Flux query results.
//!
//! A response is a sequence of tables. Each table is an optional block of
//! `#` annotation rows, a header row and data rows, and tables are separated
//! by blank lines. A table whose header has an `error` column reports a
//! runtime failure of the query.

use sensor_common::HistoryError;

use crate::backend::FluxRecord;

/// Line-at-a-time table parser.
#[derive(Debug, Default)]
pub(crate) struct TableParser {
    header: Option<Vec<String>>,
}

impl TableParser {
    /// Feed one line. Returns a record for data rows and `None` for
    /// structural lines.
    pub(crate) fn push_line(&mut self, line: &str) -> Option<Result<FluxRecord, HistoryError>> {
        if line.trim().is_empty() || line.starts_with('#') {
            self.header = None;
            return None;
        }

        let fields = split_line(line);
        if self.header.is_none() {
            self.header = Some(fields);
            return None;
        }
        let header = self.header.as_ref()?;

        let is_error_table = header.iter().any(|column| column == "error");
        let record: FluxRecord = header.iter().cloned().zip(fields).collect();

        if is_error_table {
            let message = record.get("error").unwrap_or("unknown query error");
            return Some(Err(HistoryError::Query(message.to_string())));
        }
        Some(Ok(record))
    }
}

/// Split one CSV line, honoring `"` quoting and `""` escapes.
pub(crate) fn split_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' if current.is_empty() => in_quotes = true,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    fields.push(current);
    fields
}
