//! Eight-number summaries for numeric columns.

use polars::prelude::*;

use crate::error::Result;
use crate::models::ColumnSummary;
use crate::services::loader::{ColumnKind, Table};

const VALUES: &str = "values";

/// Moments and quartiles of one set of values. Quartiles interpolate
/// linearly between ranks, the standard deviation uses `n - 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Describe {
    pub count: usize,
    pub mean: f64,
    pub std: Option<f64>,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

fn scalar(frame: &DataFrame, name: &str) -> PolarsResult<Option<f64>> {
    Ok(frame.column(name)?.f64()?.get(0))
}

/// `None` for an empty slice.
pub fn describe(values: &[f64]) -> Result<Option<Describe>> {
    if values.is_empty() {
        return Ok(None);
    }

    let interpol = QuantileInterpolOptions::Linear;
    let frame = DataFrame::new(vec![Series::new(VALUES, values)])?
        .lazy()
        .select([
            col(VALUES).mean().alias("mean"),
            col(VALUES).std(1).alias("std"),
            col(VALUES).min().alias("min"),
            col(VALUES).quantile(lit(0.25), interpol).alias("q1"),
            col(VALUES).quantile(lit(0.5), interpol).alias("median"),
            col(VALUES).quantile(lit(0.75), interpol).alias("q3"),
            col(VALUES).max().alias("max"),
        ])
        .collect()?;

    let (Some(mean), Some(min), Some(q1), Some(median), Some(q3), Some(max)) = (
        scalar(&frame, "mean")?,
        scalar(&frame, "min")?,
        scalar(&frame, "q1")?,
        scalar(&frame, "median")?,
        scalar(&frame, "q3")?,
        scalar(&frame, "max")?,
    ) else {
        return Ok(None);
    };

    let std = if values.len() < 2 {
        None
    } else {
        scalar(&frame, "std")?.filter(|s| s.is_finite())
    };

    Ok(Some(Describe {
        count: values.len(),
        mean,
        std,
        min,
        q1,
        median,
        q3,
        max,
    }))
}

pub fn summarize(column: &str, values: &[f64]) -> Result<Option<ColumnSummary>> {
    Ok(describe(values)?.map(|d| ColumnSummary {
        column: column.to_string(),
        count: d.count,
        mean: d.mean,
        std: d.std,
        min: d.min,
        q1: d.q1,
        median: d.median,
        q3: d.q3,
        max: d.max,
    }))
}

/// Summaries for every numeric column with at least one value, in column order.
pub fn summarize_table(table: &Table) -> Result<Vec<ColumnSummary>> {
    let mut summaries = Vec::new();
    for column in table.columns_of(ColumnKind::Numeric) {
        let values = column.numeric_values()?;
        match summarize(&column.name, &values)? {
            Some(summary) => summaries.push(summary),
            None => tracing::debug!("Skipping '{}': no non-missing values", column.name),
        }
    }
    Ok(summaries)
}
