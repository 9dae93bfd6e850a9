pub mod delimited;
pub mod spreadsheet;
pub mod types;
pub mod utils;

use std::collections::HashSet;
use std::path::Path;

use crate::error::{InsightError, Result};
pub use types::{Cell, Column, ColumnData, ColumnKind, Table, Workbook};
use utils::{infer_column, is_missing, unique_header};

const SPREADSHEET_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Loads every sheet of `path`, or only `sheet` when given.
pub fn load(path: &Path, sheet: Option<&str>) -> Result<Workbook> {
    let start = std::time::Instant::now();
    tracing::info!("Loading {}", path.display());

    if !path.is_file() {
        return Err(InsightError::Load(format!("{} is not a readable file", path.display())));
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let raw_sheets = if SPREADSHEET_EXTENSIONS.contains(&extension.as_str()) {
        spreadsheet::read_sheets(path)?
    } else if extension == "csv" {
        delimited::read_sheets(path)?
    } else {
        return Err(InsightError::Load(format!(
            "unsupported file format '{}' for {}",
            extension,
            path.display()
        )));
    };

    let sheet_names: Vec<String> = raw_sheets.iter().map(|(name, _)| name.clone()).collect();
    tracing::info!("Found {} sheets: {:?}", sheet_names.len(), sheet_names);

    if let Some(wanted) = sheet {
        if !sheet_names.iter().any(|n| n == wanted) {
            return Err(InsightError::Load(format!(
                "sheet '{}' not found; available sheets: {}",
                wanted,
                sheet_names.join(", ")
            )));
        }
    }

    let mut tables = Vec::new();
    for (name, rows) in raw_sheets {
        if sheet.map_or(false, |wanted| wanted != name) {
            continue;
        }
        match build_table(&name, rows) {
            Some(table) => {
                tracing::info!(
                    "Sheet {}: {} rows x {} columns",
                    name,
                    table.row_count,
                    table.column_count()
                );
                tables.push(table);
            }
            None => tracing::warn!("Sheet {} is empty, skipping", name),
        }
    }

    if tables.is_empty() {
        return Err(InsightError::Load(format!("no data found in {}", path.display())));
    }

    tracing::info!("Loaded {} in {:?}", path.display(), start.elapsed());
    Ok(Workbook {
        path: path.to_path_buf(),
        sheet_names,
        tables,
    })
}

/// Builds a typed table from raw rows whose first row is the header.
/// Returns `None` when there is no header or no columns.
pub fn build_table(sheet_name: &str, rows: Vec<Vec<Cell>>) -> Option<Table> {
    let mut rows = rows.into_iter();
    let header = rows.next()?;

    let mut body: Vec<Vec<Cell>> = rows.collect();
    // Blank rows inside the data stay as all-missing rows; trailing ones are padding
    while body
        .last()
        .map_or(false, |row| row.iter().all(is_missing))
    {
        body.pop();
    }

    let width = body
        .iter()
        .map(|row| row.len())
        .chain(std::iter::once(header.len()))
        .max()
        .unwrap_or(0);

    let mut existing_names = HashSet::new();
    let mut columns = Vec::with_capacity(width);
    for idx in 0..width {
        let raw_name = header.get(idx).map(header_text).unwrap_or_default();
        let cells: Vec<Cell> = body
            .iter()
            .map(|row| row.get(idx).cloned().unwrap_or(Cell::Empty))
            .collect();

        // Ragged trailing columns with neither header nor data
        if raw_name.trim().is_empty() && cells.iter().all(is_missing) {
            continue;
        }

        let name = unique_header(&raw_name, idx, &mut existing_names);
        columns.push(infer_column(&name, &cells));
    }

    if columns.is_empty() {
        return None;
    }

    Some(Table {
        sheet_name: sheet_name.to_string(),
        row_count: body.len(),
        columns,
    })
}

fn header_text(cell: &Cell) -> String {
    match cell {
        Cell::Empty => String::new(),
        Cell::Text(s) => s.clone(),
        Cell::Number(v) => utils::format_number(*v),
        Cell::Bool(b) => if *b { "True".to_string() } else { "False".to_string() },
        Cell::Date(dt) => utils::format_datetime(dt),
    }
}
