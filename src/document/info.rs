//! Meeting metadata rendered as a markdown table.

use crate::models::Meeting;
use chrono::{DateTime, Local};

const NOT_SPECIFIED: &str = "Not specified";

/// Render `meeting` as a two-column `Parameter | Value` table.
///
/// Missing title or participants read "Not specified"; numeric fields that
/// the backend omitted are left empty.
pub fn meeting_info_table(meeting: &Meeting) -> String {
    let created = meeting
        .created_at
        .as_deref()
        .map(format_timestamp)
        .unwrap_or_default();
    let or_not_specified = |v: &Option<String>| {
        v.as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(escape_cell)
            .unwrap_or_else(|| NOT_SPECIFIED.to_string())
    };
    let number = |v: Option<f64>| v.map(|n| n.to_string()).unwrap_or_default();

    let rows = [
        ("Created", created),
        (
            "Original file name",
            meeting
                .original_filename
                .as_deref()
                .map(escape_cell)
                .unwrap_or_default(),
        ),
        ("Title", or_not_specified(&meeting.title)),
        ("Participants", or_not_specified(&meeting.participants)),
        ("Size (MB)", number(meeting.size_mb)),
        ("Duration (sec)", number(meeting.duration)),
    ];

    let mut table = String::from("| Parameter | Value |\n|----------|----------|\n");
    for (name, value) in rows {
        table.push_str(&format!("| {name} | {value} |\n"));
    }
    table
}

/// Format an RFC 3339 timestamp in the local time zone; anything that does
/// not parse is shown as sent.
pub fn format_timestamp(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => ts
            .with_timezone(&Local)
            .format("%d.%m.%Y %H:%M:%S")
            .to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Keep a cell value from breaking out of its table column.
fn escape_cell(value: &str) -> String {
    value.replace('|', "\\|").replace('\n', " ")
}
