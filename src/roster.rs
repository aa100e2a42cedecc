use crate::kana::collate;
use crate::models::ShiftRecord;
use crate::sheet::{CellValue, SheetRow};
use crate::time::{format_time, parse_minutes, TimeError};
use thiserror::Error;
use tracing::debug;

/// Status text for people scheduled to come in.
pub const SCHEDULED_MARKER: &str = "出勤予";

pub mod columns {
    pub const NAME: &str = "源氏名";
    pub const STATUS: &str = "シフト状態";
    pub const TIME: &str = "出勤時間";
    pub const DELIDOSU: &str = "でりどす";
    pub const ANECAN: &str = "アネキャン";
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RosterError {
    #[error("sheet has no '{0}' column")]
    MissingColumn(&'static str),
    #[error("no rows are marked 出勤予")]
    NoScheduledRows,
    #[error("start time for {name} is invalid: {source}")]
    MalformedTime {
        name: String,
        #[source]
        source: TimeError,
    },
}

/// Scheduled rows as shift records, earliest first, ties by name.
pub fn build_roster(rows: &[SheetRow]) -> Result<Vec<ShiftRecord>, RosterError> {
    if rows.is_empty() {
        return Err(RosterError::NoScheduledRows);
    }
    for column in [columns::NAME, columns::STATUS] {
        if !rows.iter().any(|row| row.contains_key(column)) {
            return Err(RosterError::MissingColumn(column));
        }
    }

    let mut skipped = 0usize;
    let mut scheduled = Vec::new();
    for row in rows {
        if text(row, columns::STATUS) != SCHEDULED_MARKER {
            skipped += 1;
            continue;
        }
        let record = to_record(row);
        let minutes = parse_minutes(&record.time).map_err(|source| RosterError::MalformedTime {
            name: record.name.clone(),
            source,
        })?;
        scheduled.push((minutes, record));
    }
    debug!(kept = scheduled.len(), skipped, "filtered roster rows");

    if scheduled.is_empty() {
        return Err(RosterError::NoScheduledRows);
    }

    scheduled.sort_by(|(a_minutes, a), (b_minutes, b)| {
        a_minutes.cmp(b_minutes).then_with(|| collate(&a.name, &b.name))
    });
    Ok(scheduled.into_iter().map(|(_, record)| record).collect())
}

fn to_record(row: &SheetRow) -> ShiftRecord {
    ShiftRecord {
        name: text(row, columns::NAME),
        time: row.get(columns::TIME).map(format_time).unwrap_or_default(),
        status: text(row, columns::STATUS),
        delidosu_name: text(row, columns::DELIDOSU),
        anecan_name: text(row, columns::ANECAN),
        checked: false,
    }
}

fn text(row: &SheetRow, column: &str) -> String {
    row.get(column).map(CellValue::to_text).unwrap_or_default()
}
