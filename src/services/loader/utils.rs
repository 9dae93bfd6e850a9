use std::collections::HashSet;
use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;

use super::types::{Cell, Column, ColumnData};

static DATE_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{1,4}[-/.]\d{1,2}[-/.]\d{1,4}([ T]\d{1,2}:\d{2}(:\d{2}(\.\d+)?)?)?$")
        .expect("date shape pattern is valid")
});

const DATETIME_FORMATS: [&str; 8] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
];

// Month-first wins over day-first for ambiguous slash dates.
const DATE_FORMATS: [&str; 6] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
];

/// Header text for column `index`, made unique within the sheet.
/// Markers a CSV reader treats as missing, as pandas does.
const NA_TOKENS: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

pub fn is_na_token(s: &str) -> bool {
    NA_TOKENS.contains(&s.trim())
}

pub fn unique_header(raw: &str, index: usize, existing_names: &mut HashSet<String>) -> String {
    let trimmed = raw.trim();
    let base_name = if trimmed.is_empty() {
        format!("Unnamed: {}", index)
    } else {
        trimmed.to_string()
    };

    // If the name already exists, add a numeric suffix
    let mut cleaned = base_name.clone();
    let mut counter = 1;
    while !existing_names.insert(cleaned.clone()) {
        cleaned = format!("{}_{}", base_name, counter);
        counter += 1;
    }

    cleaned
}

/// Turns a column or sheet name into something safe to use in a file name.
pub fn sanitize_file_stem(name: &str) -> String {
    let cleaned = name
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect::<String>();

    if cleaned.is_empty() {
        "unnamed".to_string()
    } else {
        cleaned
    }
}

pub fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn parse_date_string(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if !DATE_SHAPE.is_match(s) {
        return None;
    }

    for format in DATETIME_FORMATS.iter() {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }
    for format in DATE_FORMATS.iter() {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Converts a spreadsheet serial date (days since 1899-12-30) to a timestamp.
pub fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    epoch.checked_add_signed(Duration::milliseconds(millis))
}

pub fn is_missing(cell: &Cell) -> bool {
    match cell {
        Cell::Empty => true,
        Cell::Text(s) => s.trim().is_empty(),
        Cell::Number(v) => !v.is_finite(),
        _ => false,
    }
}

fn as_number(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Number(v) if v.is_finite() => Some(*v),
        Cell::Text(s) => parse_number(s),
        _ => None,
    }
}

fn as_date(cell: &Cell) -> Option<NaiveDateTime> {
    match cell {
        Cell::Date(dt) => Some(*dt),
        Cell::Text(s) => parse_date_string(s),
        _ => None,
    }
}

pub fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}

pub fn format_datetime(dt: &NaiveDateTime) -> String {
    if dt.time().num_seconds_from_midnight() == 0 && dt.time().nanosecond() == 0 {
        dt.format("%Y-%m-%d").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

fn as_label(cell: &Cell) -> Option<String> {
    match cell {
        Cell::Empty => None,
        Cell::Text(s) => Some(s.trim().to_string()),
        Cell::Number(v) => Some(format_number(*v)),
        Cell::Bool(true) => Some("True".to_string()),
        Cell::Bool(false) => Some("False".to_string()),
        Cell::Date(dt) => Some(format_datetime(dt)),
    }
}

/// Types a column from its raw cells: numeric if every present value is a
/// number, date if every present value is a date, categorical otherwise.
/// A column with nothing present is numeric.
pub fn infer_column(name: &str, cells: &[Cell]) -> Column {
    let present: Vec<&Cell> = cells.iter().filter(|c| !is_missing(c)).collect();

    let data = if present.iter().all(|c| as_number(c).is_some()) {
        ColumnData::Numeric(
            cells
                .iter()
                .map(|c| if is_missing(c) { None } else { as_number(c) })
                .collect(),
        )
    } else if present.iter().all(|c| as_date(c).is_some()) {
        ColumnData::Date(
            cells
                .iter()
                .map(|c| if is_missing(c) { None } else { as_date(c) })
                .collect(),
        )
    } else {
        ColumnData::Categorical(
            cells
                .iter()
                .map(|c| if is_missing(c) { None } else { as_label(c) })
                .collect(),
        )
    };

    let column = Column {
        name: name.to_string(),
        data,
    };
    tracing::debug!("Inferred column '{}' as {}", name, column.kind());
    column
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::loader::types::ColumnKind;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    #[test]
    fn csv_na_markers_are_recognised() {
        for token in ["NA", "N/A", "NaN", "null", "None", "#N/A", " nan ", ""] {
            assert!(is_na_token(token), "{token:?}");
        }
        assert!(!is_na_token("Nancy"));
        assert!(!is_na_token("0"));
    }

    #[test]
    fn headers_are_made_unique() {
        let mut seen = HashSet::new();
        assert_eq!(unique_header("Region", 0, &mut seen), "Region");
        assert_eq!(unique_header("Region", 1, &mut seen), "Region_1");
        assert_eq!(unique_header("  ", 2, &mut seen), "Unnamed: 2");
        assert_eq!(unique_header("Region", 3, &mut seen), "Region_2");
    }

    #[test]
    fn file_stems_drop_path_characters() {
        assert_eq!(sanitize_file_stem("Units Sold/Day"), "Units_Sold_Day");
        assert_eq!(sanitize_file_stem(""), "unnamed");
    }

    #[test]
    fn date_strings_parse_in_common_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap().and_hms_opt(0, 0, 0).unwrap();
        assert_eq!(parse_date_string("2024-03-09"), Some(expected));
        assert_eq!(parse_date_string("2024/03/09"), Some(expected));
        assert_eq!(parse_date_string("03/09/2024"), Some(expected));
        assert_eq!(parse_date_string("25/12/2024").map(|d| d.date()), NaiveDate::from_ymd_opt(2024, 12, 25));
        assert!(parse_date_string("2024-03-09 14:30:00").is_some());
        assert!(parse_date_string("Laptop").is_none());
        assert!(parse_date_string("2024").is_none());
    }

    #[test]
    fn serial_dates_use_the_1899_epoch() {
        let dt = serial_to_datetime(45000.5).unwrap();
        assert_eq!(dt.date(), NaiveDate::from_ymd_opt(2023, 3, 15).unwrap());
        assert_eq!(dt.time().hour(), 12);
    }

    #[test]
    fn numeric_column_accepts_numeric_text() {
        let cells = vec![Cell::Number(1.0), text("2.5"), Cell::Empty, text(" ")];
        let column = infer_column("Units", &cells);
        assert_eq!(column.kind(), ColumnKind::Numeric);
        assert_eq!(column.as_numeric().unwrap(), &[Some(1.0), Some(2.5), None, None]);
    }

    #[test]
    fn numbers_are_never_read_as_dates() {
        let cells = vec![Cell::Number(45000.0), Cell::Number(45001.0)];
        assert_eq!(infer_column("Serial", &cells).kind(), ColumnKind::Numeric);
    }

    #[test]
    fn date_column_mixes_cells_and_strings() {
        let dt = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let cells = vec![Cell::Date(dt), text("2024-01-02"), Cell::Empty];
        let column = infer_column("Date", &cells);
        assert_eq!(column.kind(), ColumnKind::Date);
        assert_eq!(column.missing_count(), 1);
    }

    #[test]
    fn mixed_values_fall_back_to_categorical() {
        let cells = vec![Cell::Number(3.0), text("North"), Cell::Bool(true), Cell::Empty];
        let column = infer_column("Mixed", &cells);
        assert_eq!(
            column.as_categorical().unwrap(),
            &[Some("3".to_string()), Some("North".to_string()), Some("True".to_string()), None]
        );
    }

    #[test]
    fn all_missing_column_is_numeric() {
        let column = infer_column("Blank", &[Cell::Empty, text("")]);
        assert_eq!(column.kind(), ColumnKind::Numeric);
        assert!(column.numeric_values().unwrap().is_empty());
    }
}
