//! Outlier flagging per numeric column.

use smallvec::SmallVec;

use super::statistics::describe;
use crate::config::OutlierMethod;
use crate::error::Result;
use crate::models::{OutlierSet, OUTLIER_SAMPLE_SIZE};
use crate::services::loader::{ColumnKind, Table};

/// Inclusive fences outside of which a value is flagged, or `None` when the
/// rule is undefined for these values.
pub fn fences(values: &[f64], method: OutlierMethod, threshold: f64) -> Result<Option<(f64, f64)>> {
    let Some(d) = describe(values)? else {
        return Ok(None);
    };
    let bounds = match method {
        OutlierMethod::Iqr => {
            let iqr = d.q3 - d.q1;
            Some((d.q1 - threshold * iqr, d.q3 + threshold * iqr))
        }
        OutlierMethod::Zscore => d
            .std
            .filter(|s| *s > 0.0)
            .map(|std| (d.mean - threshold * std, d.mean + threshold * std)),
    };
    Ok(bounds)
}

pub fn detect(
    column: &str,
    values: &[f64],
    method: OutlierMethod,
    threshold: f64,
) -> Result<Option<OutlierSet>> {
    let Some((lower_bound, upper_bound)) = fences(values, method, threshold)? else {
        return Ok(None);
    };

    let mut count = 0;
    let mut sample = SmallVec::<[f64; OUTLIER_SAMPLE_SIZE]>::new();
    for &value in values {
        if value < lower_bound || value > upper_bound {
            count += 1;
            if sample.len() < OUTLIER_SAMPLE_SIZE {
                sample.push(value);
            }
        }
    }

    if count == 0 {
        return Ok(None);
    }

    Ok(Some(OutlierSet {
        column: column.to_string(),
        method,
        count,
        percentage: count as f64 / values.len() as f64 * 100.0,
        lower_bound,
        upper_bound,
        sample,
    }))
}

/// Outlier sets for the numeric columns that have at least one flagged value.
pub fn detect_table(table: &Table, method: OutlierMethod, threshold: f64) -> Result<Vec<OutlierSet>> {
    let mut sets = Vec::new();
    for column in table.columns_of(ColumnKind::Numeric) {
        let values = column.numeric_values()?;
        if let Some(set) = detect(&column.name, &values, method, threshold)? {
            tracing::debug!("'{}': {} outliers ({:.2}%)", set.column, set.count, set.percentage);
            sets.push(set);
        }
    }
    Ok(sets)
}
