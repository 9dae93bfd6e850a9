//! Range and calendar distributions of date columns.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDateTime};

use crate::error::Result;
use crate::models::{DateProfile, DateRange, Frequency};
use crate::services::loader::{ColumnKind, Table};

const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Counts keyed by calendar position, returned by descending count with
/// ties left in calendar order.
fn ranked<K: Ord>(counts: BTreeMap<K, usize>, label: impl Fn(&K) -> String) -> Vec<Frequency> {
    let mut ranked: Vec<Frequency> = counts
        .iter()
        .map(|(key, count)| Frequency {
            label: label(key),
            count: *count,
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked
}

pub fn profile(column: &str, values: &[Option<NaiveDateTime>]) -> DateProfile {
    let total = values.len();
    let present: Vec<&NaiveDateTime> = values.iter().flatten().collect();
    let missing_count = total - present.len();

    let range = match (present.iter().min(), present.iter().max()) {
        (Some(min), Some(max)) => Some(DateRange {
            min: min.date(),
            max: max.date(),
            span_days: (**max - **min).num_days(),
        }),
        _ => None,
    };

    let mut weekdays = BTreeMap::new();
    let mut months = BTreeMap::new();
    let mut years = BTreeMap::new();
    for dt in &present {
        *weekdays.entry(dt.weekday().num_days_from_monday()).or_insert(0) += 1;
        *months.entry(dt.month0()).or_insert(0) += 1;
        *years.entry(dt.year()).or_insert(0) += 1;
    }

    DateProfile {
        column: column.to_string(),
        range,
        missing_count,
        missing_percentage: if total == 0 {
            0.0
        } else {
            missing_count as f64 / total as f64 * 100.0
        },
        by_weekday: ranked(weekdays, |d| WEEKDAYS[*d as usize].to_string()),
        by_month: ranked(months, |m| MONTHS[*m as usize].to_string()),
        by_year: ranked(years, |y| y.to_string()),
    }
}

/// Profiles only the columns typed as dates.
pub fn profile_table(table: &Table) -> Result<Vec<DateProfile>> {
    table
        .columns_of(ColumnKind::Date)
        .map(|column| Ok(profile(&column.name, column.as_dates()?)))
        .collect()
}
