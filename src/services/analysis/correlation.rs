//! Pairwise Pearson correlation across numeric columns.

use polars::prelude::*;

use crate::error::Result;
use crate::models::{CorrelationMatrix, CorrelationPair, CorrelationReport};
use crate::services::loader::{ColumnKind, Table};

/// Pearson r over the rows where both sides are present. `None` with fewer
/// than two complete rows or when either side has zero variance.
pub fn pearson(a: &[Option<f64>], b: &[Option<f64>]) -> Result<Option<f64>> {
    let complete = DataFrame::new(vec![Series::new("a", a), Series::new("b", b)])?
        .drop_nulls::<String>(None)?;
    if complete.height() < 2 {
        return Ok(None);
    }

    let r = complete
        .lazy()
        .select([pearson_corr(col("a"), col("b"), 1).alias("r")])
        .collect()?
        .column("r")?
        .f64()?
        .get(0);
    Ok(r.filter(|r| r.is_finite()).map(|r| r.clamp(-1.0, 1.0)))
}

/// Correlation matrix plus the pairs at or above `threshold` in absolute value.
/// Columns without any value take no part. Returns `None` when fewer than two
/// numeric columns remain.
pub fn correlate(table: &Table, threshold: f64) -> Result<Option<CorrelationReport>> {
    let mut names = Vec::new();
    let mut series = Vec::new();
    for column in table.columns_of(ColumnKind::Numeric) {
        let values = column.as_numeric()?;
        if values.iter().any(Option::is_some) {
            names.push(column.name.clone());
            series.push(values);
        }
    }

    if series.len() < 2 {
        tracing::debug!("Need at least 2 numeric columns to calculate correlations");
        return Ok(None);
    }

    let n = series.len();
    let mut values = vec![vec![None; n]; n];
    let mut pairs = Vec::new();
    for i in 0..n {
        values[i][i] = pearson(series[i], series[i])?;
        for j in (i + 1)..n {
            let r = pearson(series[i], series[j])?;
            values[i][j] = r;
            values[j][i] = r;

            if let Some(r) = r {
                if r.abs() >= threshold {
                    pairs.push(CorrelationPair {
                        column_a: names[i].clone(),
                        column_b: names[j].clone(),
                        coefficient: r,
                    });
                }
            }
        }
    }

    tracing::debug!("{} correlated pairs at |r| >= {}", pairs.len(), threshold);
    Ok(Some(CorrelationReport {
        threshold,
        matrix: CorrelationMatrix {
            columns: names,
            values,
        },
        pairs,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::loader::{Column, ColumnData};

    fn numeric(name: &str, values: Vec<Option<f64>>) -> Column {
        Column {
            name: name.into(),
            data: ColumnData::Numeric(values),
        }
    }

    fn some(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().copied().map(Some).collect()
    }

    #[test]
    fn perfect_positive_and_negative() {
        let x = some(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let y = some(&[2.0, 4.0, 6.0, 8.0, 10.0]);
        let z = some(&[5.0, 4.0, 3.0, 2.0, 1.0]);
        assert!((pearson(&x, &y).unwrap().unwrap() - 1.0).abs() < 1e-9);
        assert!((pearson(&x, &z).unwrap().unwrap() + 1.0).abs() < 1e-9);
    }

    #[test]
    fn missing_rows_are_dropped_pairwise() {
        let x = vec![Some(1.0), None, Some(3.0), Some(4.0)];
        let y = vec![Some(1.0), Some(100.0), Some(3.0), Some(4.0)];
        assert!((pearson(&x, &y).unwrap().unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn constant_column_has_no_coefficient() {
        let x = some(&[1.0, 2.0, 3.0]);
        let c = some(&[7.0, 7.0, 7.0]);
        assert_eq!(pearson(&x, &c).unwrap(), None);
    }

    #[test]
    fn pairs_are_unique_and_never_self() {
        let table = Table {
            sheet_name: "s".into(),
            row_count: 5,
            columns: vec![
                numeric("x", some(&[1.0, 2.0, 3.0, 4.0, 5.0])),
                numeric("y", some(&[2.0, 4.0, 6.0, 8.0, 10.0])),
                numeric("noise", some(&[3.1, 2.9, 3.0, 3.2, 2.8])),
                numeric("blank", vec![None; 5]),
            ],
        };
        let report = correlate(&table, 0.9).unwrap().unwrap();
        assert_eq!(report.matrix.columns, vec!["x", "y", "noise"]);
        assert_eq!(report.pairs.len(), 1);
        assert_eq!(report.pairs[0].column_a, "x");
        assert_eq!(report.pairs[0].column_b, "y");
        assert!(report.pairs.iter().all(|p| p.column_a != p.column_b));
        assert!((report.matrix.get(0, 0).unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn single_numeric_column_yields_nothing() {
        let table = Table {
            sheet_name: "s".into(),
            row_count: 3,
            columns: vec![numeric("x", some(&[1.0, 2.0, 3.0]))],
        };
        assert!(correlate(&table, 0.7).unwrap().is_none());
    }
}
