use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};

use super::types::Cell;
use super::utils::{parse_date_string, serial_to_datetime};
use crate::error::{InsightError, Result};

/// Reads every worksheet into raw rows, in workbook order.
pub fn read_sheets(path: &Path) -> Result<Vec<(String, Vec<Vec<Cell>>)>> {
    let workbook_start = std::time::Instant::now();
    let mut workbook = open_workbook_auto(path).map_err(|e| {
        tracing::error!("Failed to open spreadsheet: {}", e);
        InsightError::Load(format!("Failed to open {}: {}", path.display(), e))
    })?;
    tracing::info!("Workbook opened in {:?}", workbook_start.elapsed());

    let sheet_names = workbook.sheet_names().to_vec();
    let mut sheets = Vec::with_capacity(sheet_names.len());

    for sheet_name in sheet_names {
        let range = workbook.worksheet_range(&sheet_name).map_err(|e| {
            InsightError::Load(format!("Failed to read worksheet {}: {}", sheet_name, e))
        })?;
        let rows: Vec<Vec<Cell>> = range
            .rows()
            .map(|row| row.iter().map(to_cell).collect())
            .collect();
        tracing::debug!("Worksheet {} has {} raw rows", sheet_name, rows.len());
        sheets.push((sheet_name, rows));
    }

    Ok(sheets)
}

fn to_cell(value: &Data) -> Cell {
    match value {
        Data::Empty => Cell::Empty,
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::String(s) => Cell::Text(s.clone()),
        Data::DateTime(d) => match serial_to_datetime(d.as_f64()) {
            Some(dt) => Cell::Date(dt),
            None => Cell::Number(d.as_f64()),
        },
        Data::DateTimeIso(s) => match parse_date_string(s)
            .or_else(|| chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").ok())
        {
            Some(dt) => Cell::Date(dt),
            None => Cell::Text(s.clone()),
        },
        Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(e) => {
            tracing::debug!("Treating error cell {:?} as missing", e);
            Cell::Empty
        }
    }
}
