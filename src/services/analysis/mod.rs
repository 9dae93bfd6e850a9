pub mod categorical;
pub mod correlation;
pub mod dates;
pub mod outliers;
pub mod statistics;

use crate::config::Config;
use crate::error::Result;
use crate::models::{ColumnOverview, SheetInsights, SheetOverview};
use crate::services::loader::Table;

pub fn overview(table: &Table) -> SheetOverview {
    SheetOverview {
        sheet_name: table.sheet_name.clone(),
        row_count: table.row_count,
        column_count: table.column_count(),
        columns: table
            .columns
            .iter()
            .map(|c| ColumnOverview {
                name: c.name.clone(),
                kind: c.kind(),
                missing_count: c.missing_count(),
            })
            .collect(),
    }
}

/// Runs every profiler over one table. Charts are attached later.
pub fn analyze_table(table: &Table, config: &Config) -> Result<SheetInsights> {
    let start = std::time::Instant::now();
    tracing::info!("Analyzing sheet {}", table.sheet_name);

    let insights = SheetInsights {
        overview: overview(table),
        statistics: statistics::summarize_table(table)?,
        correlations: correlation::correlate(table, config.correlation_threshold)?,
        outliers: outliers::detect_table(table, config.outlier_method, config.outlier_threshold)?,
        categorical: categorical::profile_table(table, config.top_n)?,
        dates: dates::profile_table(table)?,
        charts: Vec::new(),
    };

    tracing::info!(
        "Sheet {}: {} numeric summaries, {} correlated pairs, {} columns with outliers, {} categorical, {} date columns in {:?}",
        table.sheet_name,
        insights.statistics.len(),
        insights.correlations.as_ref().map_or(0, |c| c.pairs.len()),
        insights.outliers.len(),
        insights.categorical.len(),
        insights.dates.len(),
        start.elapsed()
    );
    Ok(insights)
}
