//! Reading uploaded spreadsheets into header-keyed rows.

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// A single spreadsheet cell, reduced to the shapes the roster cares about.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    /// String form of the cell, trimmed; integral numbers lose their fraction.
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(text) => text.trim().to_string(),
            CellValue::Number(value) if value.fract() == 0.0 && value.is_finite() => {
                format!("{}", *value as i64)
            }
            CellValue::Number(value) => value.to_string(),
            CellValue::Bool(flag) => flag.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }
}

/// One data row keyed by header text. Blank cells are left out.
pub type SheetRow = HashMap<String, CellValue>;

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("unsupported file type '{0}'")]
    Unsupported(String),
    #[error("failed to read workbook: {0}")]
    Workbook(String),
    #[error("workbook has no sheets")]
    NoSheets,
    #[error("failed to read csv: {0}")]
    Csv(#[from] csv::Error),
}

static FILE_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{8}").expect("valid file date pattern"));

/// Reads the first worksheet of `bytes`, picking the format from the file extension.
pub fn read_rows(file_name: &str, bytes: &[u8]) -> Result<Vec<SheetRow>, SheetError> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let rows = match extension.as_str() {
        "csv" => read_csv(bytes)?,
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => read_workbook(bytes)?,
        _ => return Err(SheetError::Unsupported(file_name.to_string())),
    };
    debug!(file_name, rows = rows.len(), "read spreadsheet");
    Ok(rows)
}

fn read_workbook(bytes: &[u8]) -> Result<Vec<SheetRow>, SheetError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|err| SheetError::Workbook(err.to_string()))?;
    let first = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(SheetError::NoSheets)?;
    let range = workbook
        .worksheet_range(&first)
        .map_err(|err| SheetError::Workbook(err.to_string()))?;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(Vec::new());
    };
    let headers: Vec<String> = header.iter().map(|cell| cell_from_data(cell).to_text()).collect();

    Ok(rows
        .map(|row| keyed_row(&headers, row.iter().map(cell_from_data)))
        .filter(|row| !row.is_empty())
        .collect())
}

fn read_csv(bytes: &[u8]) -> Result<Vec<SheetRow>, SheetError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|header| header.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row = keyed_row(&headers, record.iter().map(CellValue::text));
        if !row.is_empty() {
            rows.push(row);
        }
    }
    Ok(rows)
}

fn keyed_row(headers: &[String], cells: impl Iterator<Item = CellValue>) -> SheetRow {
    headers
        .iter()
        .zip(cells)
        .filter(|(header, cell)| !header.is_empty() && !cell.is_empty())
        .map(|(header, cell)| (header.clone(), cell))
        .collect()
}

fn cell_from_data(data: &Data) -> CellValue {
    match data {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(text) | Data::DateTimeIso(text) | Data::DurationIso(text) => {
            CellValue::Text(text.clone())
        }
        Data::Float(value) => CellValue::Number(*value),
        Data::Int(value) => CellValue::Number(*value as f64),
        Data::Bool(flag) => CellValue::Bool(*flag),
        Data::DateTime(stamp) => CellValue::Number(stamp.as_f64()),
    }
}

/// Converts JSON objects (as posted to the roster API) into sheet rows.
pub fn rows_from_json(objects: Vec<serde_json::Map<String, Value>>) -> Vec<SheetRow> {
    objects
        .into_iter()
        .map(|object| {
            object
                .into_iter()
                .map(|(key, value)| {
                    let cell = match value {
                        Value::Null => CellValue::Empty,
                        Value::Bool(flag) => CellValue::Bool(flag),
                        Value::Number(number) => number.as_f64().map_or(CellValue::Empty, CellValue::Number),
                        Value::String(text) => CellValue::Text(text),
                        other => CellValue::Text(other.to_string()),
                    };
                    (key.trim().to_string(), cell)
                })
                .filter(|(key, cell)| !key.is_empty() && !cell.is_empty())
                .collect::<SheetRow>()
        })
        .filter(|row| !row.is_empty())
        .collect()
}

/// First `YYYYMMDD` run in an upload's file name.
pub fn roster_date_from_file_name(file_name: &str) -> Option<NaiveDate> {
    let digits = FILE_DATE.find(file_name)?.as_str();
    NaiveDate::parse_from_str(digits, "%Y%m%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::{build_roster, columns, SCHEDULED_MARKER};
    use rust_xlsxwriter::{Format, Workbook};
    use serde_json::json;

    fn roster_workbook() -> Vec<u8> {
        let mut workbook = Workbook::new();
        let clock = Format::new().set_num_format("hh:mm");
        let sheet = workbook.add_worksheet();
        let headers = [columns::NAME, columns::STATUS, columns::TIME, columns::DELIDOSU];
        for (col, header) in headers.into_iter().enumerate() {
            sheet.write_string(0, col as u16, header).unwrap();
        }
        sheet.write_string(1, 0, "あかり").unwrap();
        sheet.write_string(1, 1, SCHEDULED_MARKER).unwrap();
        sheet.write_number_with_format(1, 2, 0.8125, &clock).unwrap();
        sheet.write_number(1, 3, 1234).unwrap();
        sheet.write_string(2, 0, "みお").unwrap();
        sheet.write_string(2, 1, "休み").unwrap();
        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn csv_rows_are_keyed_by_header_and_skip_blanks() {
        let csv = "\u{feff}源氏名,シフト状態,出勤時間,でりどす\nあかり,出勤予,10:00,\n,,,\nみお,休み,,みお2\n";
        let rows = read_rows("shift_20261018.csv", csv.as_bytes()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("源氏名"), Some(&CellValue::text("あかり")));
        assert_eq!(rows[0].get("出勤時間"), Some(&CellValue::text("10:00")));
        assert!(!rows[0].contains_key("でりどす"));
        assert_eq!(rows[1].get("でりどす"), Some(&CellValue::text("みお2")));
    }

    #[test]
    fn xlsx_cells_reach_the_roster_as_text() {
        let rows = read_rows("shift_20261018.xlsx", &roster_workbook()).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(!rows[1].contains_key(columns::TIME));

        let roster = build_roster(&rows).unwrap();
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].name, "あかり");
        assert_eq!(roster[0].time, "19:30");
        assert_eq!(roster[0].delidosu_name, "1234");
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = read_rows("roster.pdf", b"%PDF").unwrap_err();
        assert!(matches!(err, SheetError::Unsupported(_)));
    }

    #[test]
    fn garbage_workbook_is_an_error() {
        let err = read_rows("roster.xlsx", b"not a zip archive").unwrap_err();
        assert!(matches!(err, SheetError::Workbook(_)));
    }

    #[test]
    fn json_rows_keep_cell_types() {
        let rows = rows_from_json(vec![
            json!({"源氏名": "ゆき", "出勤時間": 0.5, "メモ": null})
                .as_object()
                .cloned()
                .unwrap(),
            json!({}).as_object().cloned().unwrap(),
        ]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("出勤時間"), Some(&CellValue::Number(0.5)));
        assert!(!rows[0].contains_key("メモ"));
    }

    #[test]
    fn date_comes_from_first_eight_digit_run() {
        assert_eq!(
            roster_date_from_file_name("出勤表_20261018_v2.xlsx"),
            NaiveDate::from_ymd_opt(2026, 10, 18)
        );
        assert_eq!(roster_date_from_file_name("roster.xlsx"), None);
        assert_eq!(roster_date_from_file_name("20261399.xlsx"), None);
    }

    #[test]
    fn numbers_render_without_trailing_fraction() {
        assert_eq!(CellValue::Number(42.0).to_text(), "42");
        assert_eq!(CellValue::Number(0.25).to_text(), "0.25");
        assert_eq!(CellValue::text("  x ").to_text(), "x");
    }
}
