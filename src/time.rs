//! Start times as they come out of a spreadsheet.
//!
//! A time cell may hold clock text (`9:30`), an ISO timestamp written by the
//! remote sheet, or a day fraction (`0.5` is noon). Everything is reduced to
//! `HH:MM` text; [`parse_minutes`] turns that back into a sort key.

use crate::sheet::CellValue;
use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

const MINUTES_PER_DAY: i64 = 24 * 60;
// Late shifts are written past midnight as 25:00 and so on, up to one extra day.
const MAX_CLOCK_HOURS: u32 = 48;

static CLOCK_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,2}:\d{2}$").expect("valid clock time pattern"));

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TimeError {
    #[error("'{0}' is not an HH:MM time")]
    Malformed(String),
}

pub fn format_time(cell: &CellValue) -> String {
    match cell {
        CellValue::Text(text) => format_text(text),
        CellValue::Number(value) => format_day_fraction(*value),
        CellValue::Empty | CellValue::Bool(_) => String::new(),
    }
}

pub fn format_text(raw: &str) -> String {
    let text = raw.trim();
    if text.is_empty() {
        return String::new();
    }
    if CLOCK_TIME.is_match(text) {
        return text.to_string();
    }
    if text.contains('T') {
        return match timestamp_clock_utc(text) {
            Some((hour, minute)) => format!("{hour:02}:{minute:02}"),
            None => text.to_string(),
        };
    }
    match text.parse::<f64>() {
        Ok(value) if value.is_finite() => format_day_fraction(value),
        _ => text.to_string(),
    }
}

/// Day fraction to `HH:MM`. Whole days are dropped, so date-time serials work too.
pub fn format_day_fraction(value: f64) -> String {
    if !value.is_finite() {
        return String::new();
    }
    let minutes = ((value * MINUTES_PER_DAY as f64).round() as i64).rem_euclid(MINUTES_PER_DAY);
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

// Sheet timestamps are read in UTC; local time would drift with the 1899 epoch offset.
fn timestamp_clock_utc(text: &str) -> Option<(u32, u32)> {
    if let Ok(stamp) = DateTime::parse_from_rfc3339(text) {
        let utc = stamp.with_timezone(&Utc);
        return Some((utc.hour(), utc.minute()));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|naive| (naive.hour(), naive.minute()))
}

/// Minutes since midnight for `HH:MM` (trailing `:SS` is ignored).
///
/// Hours run up to 47 so next-day clock times like `25:30` still sort last.
pub fn parse_minutes(time: &str) -> Result<u32, TimeError> {
    let malformed = || TimeError::Malformed(time.to_string());
    let (hours, rest) = time.trim().split_once(':').ok_or_else(malformed)?;
    let minutes = rest.split(':').next().unwrap_or_default();
    let hours: u32 = hours.trim().parse().map_err(|_| malformed())?;
    let minutes: u32 = minutes.trim().parse().map_err(|_| malformed())?;
    if hours >= MAX_CLOCK_HOURS || minutes >= 60 {
        return Err(malformed());
    }
    hours
        .checked_mul(60)
        .and_then(|total| total.checked_add(minutes))
        .ok_or_else(malformed)
}
