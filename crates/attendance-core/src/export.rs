//! CSV export of attendance records.

use std::fmt::Display;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use thiserror::Error;

use crate::types::AttendanceRecord;

pub const CSV_HEADER: &str = "ID,Name,Date,Clock IN Time,Clock OUT Time,Duration,Status";

const MISSING: &str = "-";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// `attendance_<YYYY-MM-DD>.csv`
pub fn export_file_name(date: NaiveDate) -> String {
    format!("attendance_{}.csv", date.format("%Y-%m-%d"))
}

fn cell(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn optional<T: Display>(value: Option<T>) -> String {
    value.map_or_else(|| MISSING.to_string(), |v| v.to_string())
}

/// Render records as CSV, header first, one row per record.
pub fn render_csv<'a, I>(records: I) -> String
where
    I: IntoIterator<Item = &'a AttendanceRecord>,
{
    let mut out = String::from(CSV_HEADER);
    out.push('\n');

    for r in records {
        let row = [
            cell(&r.person_id),
            cell(&r.person_name),
            r.date.format("%Y-%m-%d").to_string(),
            optional(r.clock_in.map(|t| t.format("%H:%M:%S"))),
            optional(r.clock_out.map(|t| t.format("%H:%M:%S"))),
            optional(r.duration),
            r.status.to_string(),
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }

    out
}

/// Write the CSV into `dir` and return the file path.
pub fn write_csv<'a, I>(dir: &Path, date: NaiveDate, records: I) -> Result<PathBuf, ExportError>
where
    I: IntoIterator<Item = &'a AttendanceRecord>,
{
    let path = dir.join(export_file_name(date));
    let body = render_csv(records);
    std::fs::write(&path, body).map_err(|source| ExportError::Write {
        path: path.clone(),
        source,
    })?;
    tracing::info!(path = %path.display(), "attendance exported");
    Ok(path)
}
