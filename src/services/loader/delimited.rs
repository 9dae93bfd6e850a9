use std::path::Path;

use csv::ReaderBuilder;

use super::types::Cell;
use super::utils::is_na_token;
use crate::error::{InsightError, Result};

/// Reads a CSV file as a single sheet named after the file stem.
pub fn read_sheets(path: &Path) -> Result<Vec<(String, Vec<Vec<Cell>>)>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| InsightError::Load(format!("Failed to open {}: {}", path.display(), e)))?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(
            record
                .iter()
                .map(|field| {
                    if is_na_token(field) {
                        Cell::Empty
                    } else {
                        Cell::Text(field.to_string())
                    }
                })
                .collect(),
        );
    }

    let sheet_name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Sheet1")
        .to_string();

    Ok(vec![(sheet_name, rows)])
}
