//! Cardinality, missing rate and most frequent labels of categorical columns.

use std::collections::HashMap;

use crate::error::Result;
use crate::models::{CategoricalProfile, CategoryCount};
use crate::services::loader::{ColumnKind, Table};

/// All distinct values with their counts, by descending count. Ties keep the
/// order in which values were first seen.
pub fn value_counts(values: &[Option<String>]) -> Vec<(String, usize)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(&str, usize)> = Vec::new();

    for value in values.iter().flatten() {
        match index.get(value.as_str()) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(value.as_str(), counts.len());
                counts.push((value.as_str(), 1));
            }
        }
    }

    // Stable sort keeps first-seen order among equal counts
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.into_iter().map(|(v, c)| (v.to_string(), c)).collect()
}

pub fn profile(column: &str, values: &[Option<String>], top_n: usize) -> CategoricalProfile {
    let total = values.len();
    let missing_count = values.iter().filter(|v| v.is_none()).count();
    let counts = value_counts(values);
    let pct = |n: usize| if total == 0 { 0.0 } else { n as f64 / total as f64 * 100.0 };

    CategoricalProfile {
        column: column.to_string(),
        unique_count: counts.len(),
        missing_count,
        missing_percentage: pct(missing_count),
        top_values: counts
            .into_iter()
            .take(top_n)
            .map(|(value, count)| CategoryCount {
                value,
                count,
                percentage: pct(count),
            })
            .collect(),
    }
}

pub fn profile_table(table: &Table, top_n: usize) -> Result<Vec<CategoricalProfile>> {
    table
        .columns_of(ColumnKind::Categorical)
        .map(|column| Ok(profile(&column.name, column.as_categorical()?, top_n)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(values: &[Option<&str>]) -> Vec<Option<String>> {
        values.iter().map(|v| v.map(str::to_string)).collect()
    }

    #[test]
    fn counts_sort_descending_with_stable_ties() {
        let values = labels(&[Some("b"), Some("a"), Some("a"), Some("c"), Some("b"), None]);
        let counts = value_counts(&values);
        assert_eq!(
            counts,
            vec![("b".to_string(), 2), ("a".to_string(), 2), ("c".to_string(), 1)]
        );
    }

    #[test]
    fn percentages_use_all_rows() {
        let values = labels(&[Some("North"), Some("North"), Some("South"), None]);
        let profile = profile("Region", &values, 5);
        assert_eq!(profile.unique_count, 2);
        assert_eq!(profile.missing_count, 1);
        assert!((profile.missing_percentage - 25.0).abs() < 1e-9);
        assert_eq!(profile.top_values[0].value, "North");
        assert!((profile.top_values[0].percentage - 50.0).abs() < 1e-9);
    }

    #[test]
    fn top_n_is_respected_and_sums_to_at_most_100() {
        let values: Vec<Option<String>> = (0..40)
            .map(|i| if i % 9 == 0 { None } else { Some(format!("v{}", i % 7)) })
            .collect();
        let profile = profile("c", &values, 5);
        assert_eq!(profile.top_values.len(), 5);
        let sum: f64 = profile.top_values.iter().map(|c| c.percentage).sum();
        assert!(sum <= 100.0);
        assert!(profile
            .top_values
            .windows(2)
            .all(|w| w[0].count >= w[1].count));
    }

    #[test]
    fn empty_column_is_all_zero() {
        let profile = profile("c", &[], 5);
        assert_eq!(profile.unique_count, 0);
        assert_eq!(profile.missing_percentage, 0.0);
        assert!(profile.top_values.is_empty());
    }
}
