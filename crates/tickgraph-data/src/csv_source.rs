//! CSV column source.

use chrono::{NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tickgraph_core::error::DataError;
use tickgraph_core::traits::IterSource;
use tracing::debug;

/// One CSV row keyed by header.
type Row = BTreeMap<String, String>;

/// A numeric column of a headered CSV file.
#[derive(Debug, Clone)]
pub struct CsvColumn {
    path: PathBuf,
    column: String,
    timestamp: Option<String>,
}

impl CsvColumn {
    /// Read `column` from the CSV file at `path`.
    pub fn new(path: impl AsRef<Path>, column: impl Into<String>) -> Result<Self, DataError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DataError::NotFound(path.display().to_string()));
        }
        Ok(Self {
            path: path.to_path_buf(),
            column: column.into(),
            timestamp: None,
        })
    }

    /// Order rows by the timestamp in `column` before reading values.
    pub fn sorted_by(mut self, column: impl Into<String>) -> Self {
        self.timestamp = Some(column.into());
        self
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    /// Load every value of the column, in row (or timestamp) order.
    pub fn load(&self) -> Result<Vec<f64>, DataError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(&self.path)
            .map_err(|e| DataError::ParseError(e.to_string()))?;

        let headers = reader.headers().map_err(|e| DataError::ParseError(e.to_string()))?;
        for wanted in std::iter::once(&self.column).chain(self.timestamp.as_ref()) {
            if !headers.iter().any(|h| h == wanted) {
                return Err(DataError::MissingColumn(wanted.clone()));
            }
        }

        let mut rows = Vec::new();
        for result in reader.deserialize() {
            let row: Row = result.map_err(|e| DataError::ParseError(e.to_string()))?;
            rows.push(row);
        }

        if rows.is_empty() {
            return Err(DataError::NoDataAvailable(self.path.display().to_string()));
        }

        let values = match &self.timestamp {
            Some(timestamp) => {
                let mut keyed = rows
                    .iter()
                    .map(|row| Ok((parse_timestamp(field(row, timestamp)?)?, self.value(row)?)))
                    .collect::<Result<Vec<(i64, f64)>, DataError>>()?;
                // Stable: rows sharing a timestamp keep file order.
                keyed.sort_by_key(|(ts, _)| *ts);
                keyed.into_iter().map(|(_, value)| value).collect()
            }
            None => rows.iter().map(|row| self.value(row)).collect::<Result<Vec<f64>, DataError>>()?,
        };

        debug!(path = %self.path.display(), column = %self.column, rows = values.len(), "Loaded CSV column");
        Ok(values)
    }

    /// Load the column and wrap it as a blocking tick source.
    pub fn into_source(self) -> Result<IterSource<std::vec::IntoIter<f64>>, DataError> {
        Ok(IterSource::new(self.load()?))
    }

    fn value(&self, row: &Row) -> Result<f64, DataError> {
        let raw = field(row, &self.column)?;
        raw.parse::<f64>()
            .map_err(|_| DataError::ParseError(format!("Invalid number in column '{}': {}", self.column, raw)))
    }
}

fn field<'r>(row: &'r Row, column: &str) -> Result<&'r str, DataError> {
    row.get(column)
        .map(String::as_str)
        .ok_or_else(|| DataError::MissingColumn(column.to_string()))
}

/// Parse various timestamp formats into Unix milliseconds.
fn parse_timestamp(date_str: &str) -> Result<i64, DataError> {
    let datetime_formats = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y/%m/%d %H:%M:%S"];
    let date_formats = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y"];

    for format in datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(date_str, format) {
            return Ok(dt.and_utc().timestamp_millis());
        }
    }
    for format in date_formats {
        if let Some(dt) = NaiveDate::parse_from_str(date_str, format)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
        {
            return Ok(dt.and_utc().timestamp_millis());
        }
    }

    // Unix timestamp; milliseconds if more than 10 digits
    if let Ok(ts) = date_str.parse::<i64>() {
        return Ok(if ts > 10_000_000_000 { ts } else { ts * 1000 });
    }

    Err(DataError::ParseError(format!("Could not parse date: {}", date_str)))
}
