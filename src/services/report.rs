//! Markdown rendering of a [`Report`].

use std::path::Path;

use crate::error::{InsightError, Result};
use crate::models::{
    CategoricalProfile, ColumnSummary, DateProfile, Frequency, OutlierSet, Report, SheetInsights,
};

pub const REPORT_TITLE: &str = "# Sheet Insights Report";

struct Composer<'a> {
    lines: Vec<String>,
    multi_sheet: bool,
    link_base: Option<&'a Path>,
}

impl<'a> Composer<'a> {
    fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    fn blank(&mut self) {
        self.lines.push(String::new());
    }

    /// Heading for one column; nested one level deeper on multi-sheet reports.
    fn column_heading(&mut self, name: &str) {
        let level = if self.multi_sheet { "####" } else { "###" };
        self.push(format!("{} {}", level, name));
    }

    fn sheet_heading(&mut self, sheet: &SheetInsights) {
        if self.multi_sheet {
            self.push(format!("\n### Sheet: {}", sheet.overview.sheet_name));
        }
    }
}

fn fmt2(v: f64) -> String {
    format!("{:.2}", v)
}

fn fmt_pct(v: f64) -> String {
    format!("{:.2}%", v)
}

/// Renders the whole report as markdown.
pub fn to_markdown(report: &Report, link_base: Option<&Path>) -> String {
    let mut c = Composer {
        lines: Vec::new(),
        multi_sheet: report.sheets.len() > 1,
        link_base,
    };

    c.push(REPORT_TITLE);
    c.push(format!(
        "Generated on: {}\n",
        report.generated_at.format("%Y-%m-%d %H:%M:%S")
    ));

    file_information(&mut c, report);
    statistics_section(&mut c, &report.sheets);
    correlation_section(&mut c, &report.sheets);
    outlier_section(&mut c, &report.sheets);
    categorical_section(&mut c, &report.sheets);
    date_section(&mut c, &report.sheets);
    chart_section(&mut c, &report.sheets);

    let mut text = c.lines.join("\n");
    text.push('\n');
    text
}

/// Renders and writes the report; the file's directory becomes the base for
/// chart links.
pub fn write_report(report: &Report, path: &Path) -> Result<()> {
    let text = to_markdown(report, path.parent());
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| {
            InsightError::Render(format!("Failed to create {}: {}", dir.display(), e))
        })?;
    }
    std::fs::write(path, text)
        .map_err(|e| InsightError::Render(format!("Failed to write report {}: {}", path.display(), e)))?;
    tracing::info!("Report saved to {}", path.display());
    Ok(())
}

fn file_information(c: &mut Composer, report: &Report) {
    let file_name = report
        .file_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    c.push("## File Information");
    c.push(format!("- File: {}", file_name));
    c.push(format!("- Path: {}", report.file_path.display()));
    c.push(format!("- Sheets: {}", report.sheet_names.join(", ")));

    for sheet in &report.sheets {
        let o = &sheet.overview;
        if c.multi_sheet {
            c.push(format!("- {}: {} rows, {} columns", o.sheet_name, o.row_count, o.column_count));
        } else {
            c.push(format!("- Rows: {}", o.row_count));
            c.push(format!("- Columns: {}", o.column_count));
        }
        let types: Vec<String> = o
            .columns
            .iter()
            .map(|col| format!("{} ({}, {} missing)", col.name, col.kind, col.missing_count))
            .collect();
        if !types.is_empty() {
            c.push(format!("- Column types: {}", types.join(", ")));
        }
    }
    c.blank();
}

fn statistics_section(c: &mut Composer, sheets: &[SheetInsights]) {
    if sheets.iter().all(|s| s.statistics.is_empty()) {
        return;
    }
    c.push("## Summary Statistics");

    for sheet in sheets {
        c.sheet_heading(sheet);
        if sheet.statistics.is_empty() {
            c.push("No numerical columns found for analysis.");
            continue;
        }

        let names: Vec<&str> = sheet.statistics.iter().map(|s| s.column.as_str()).collect();
        c.push("The following numerical columns were analyzed:");
        c.push(format!("- {}\n", names.join(", ")));

        for summary in &sheet.statistics {
            column_summary(c, summary);
        }
    }
}

fn column_summary(c: &mut Composer, s: &ColumnSummary) {
    c.column_heading(&s.column);
    c.push(format!("- Count: {}", s.count));
    c.push(format!("- Mean: {}", fmt2(s.mean)));
    c.push(format!("- Std Dev: {}", s.std.map_or_else(|| "N/A".to_string(), fmt2)));
    c.push(format!("- Min: {}", fmt2(s.min)));
    c.push(format!("- 25%: {}", fmt2(s.q1)));
    c.push(format!("- Median: {}", fmt2(s.median)));
    c.push(format!("- 75%: {}", fmt2(s.q3)));
    c.push(format!("- Max: {}", fmt2(s.max)));
    c.blank();
}

fn correlation_section(c: &mut Composer, sheets: &[SheetInsights]) {
    if sheets.iter().all(|s| s.correlations.is_none()) {
        return;
    }
    c.push("## Correlations");

    for sheet in sheets {
        c.sheet_heading(sheet);
        let report = match &sheet.correlations {
            Some(report) => report,
            None => {
                c.push("Fewer than two numerical columns; no correlations computed.");
                continue;
            }
        };
        if report.pairs.is_empty() {
            c.push("No significant correlations found.");
            continue;
        }

        c.push(format!(
            "The following pairs of columns show significant correlation (|r| >= {}):",
            fmt2(report.threshold)
        ));
        for pair in &report.pairs {
            c.push(format!("- {} - {}: {}", pair.column_a, pair.column_b, fmt2(pair.coefficient)));
        }
        c.blank();
    }
}

fn outlier_section(c: &mut Composer, sheets: &[SheetInsights]) {
    if sheets.iter().all(|s| s.statistics.is_empty()) {
        return;
    }
    c.push("## Outliers");

    for sheet in sheets {
        c.sheet_heading(sheet);
        if sheet.outliers.is_empty() {
            c.push("No outliers detected.");
            continue;
        }
        for set in &sheet.outliers {
            outlier_set(c, set);
        }
    }
}

fn outlier_set(c: &mut Composer, set: &OutlierSet) {
    c.column_heading(&set.column);
    c.push(format!("- Outlier count: {}", set.count));
    c.push(format!("- Percentage of data: {}", fmt_pct(set.percentage)));
    c.push(format!(
        "- Bounds: {} to {}",
        fmt2(set.lower_bound),
        fmt2(set.upper_bound)
    ));
    if !set.sample.is_empty() {
        let sample: Vec<String> = set.sample.iter().map(|v| fmt2(*v)).collect();
        c.push(format!("- Sample outliers: [{}]", sample.join(", ")));
    }
    c.blank();
}

fn categorical_section(c: &mut Composer, sheets: &[SheetInsights]) {
    if sheets.iter().all(|s| s.categorical.is_empty()) {
        return;
    }
    c.push("## Categorical Data Analysis");

    for sheet in sheets {
        c.sheet_heading(sheet);
        if sheet.categorical.is_empty() {
            c.push("No categorical columns found for analysis.");
            continue;
        }
        for profile in &sheet.categorical {
            categorical_profile(c, profile);
        }
    }
}

fn categorical_profile(c: &mut Composer, p: &CategoricalProfile) {
    c.column_heading(&p.column);
    c.push(format!("- Unique values: {}", p.unique_count));
    c.push(format!(
        "- Missing values: {} ({})",
        p.missing_count,
        fmt_pct(p.missing_percentage)
    ));

    if !p.top_values.is_empty() {
        c.push("\nTop categories:");
        for top in &p.top_values {
            c.push(format!("- {}: {} ({})", top.value, top.count, fmt_pct(top.percentage)));
        }
    }
    c.blank();
}

fn date_section(c: &mut Composer, sheets: &[SheetInsights]) {
    if sheets.iter().all(|s| s.dates.is_empty()) {
        return;
    }
    c.push("## Date Analysis");

    for sheet in sheets {
        c.sheet_heading(sheet);
        if sheet.dates.is_empty() {
            c.push("No date columns found for analysis.");
            continue;
        }
        for profile in &sheet.dates {
            date_profile(c, profile);
        }
    }
}

fn distribution(c: &mut Composer, heading: &str, freq: &[Frequency]) {
    if freq.is_empty() {
        return;
    }
    c.push(format!("\n{}:", heading));
    for f in freq {
        c.push(format!("- {}: {}", f.label, f.count));
    }
}

fn date_profile(c: &mut Composer, p: &DateProfile) {
    c.column_heading(&p.column);
    match &p.range {
        Some(range) => {
            c.push(format!(
                "- Date range: {} to {}",
                range.min.format("%Y-%m-%d"),
                range.max.format("%Y-%m-%d")
            ));
            c.push(format!("- Range in days: {}", range.span_days));
        }
        None => c.push("- Date range: N/A"),
    }
    c.push(format!(
        "- Missing values: {} ({})",
        p.missing_count,
        fmt_pct(p.missing_percentage)
    ));

    distribution(c, "Day of week distribution", &p.by_weekday);
    distribution(c, "Month distribution", &p.by_month);
    distribution(c, "Year distribution", &p.by_year);
    c.blank();
}

fn chart_section(c: &mut Composer, sheets: &[SheetInsights]) {
    if sheets.iter().all(|s| s.charts.is_empty()) {
        return;
    }
    c.push("## Visualizations");

    for sheet in sheets {
        c.sheet_heading(sheet);
        for chart in &sheet.charts {
            let path = c
                .link_base
                .and_then(|base| pathdiff::diff_paths(&chart.path, base))
                .unwrap_or_else(|| chart.path.clone());
            let link = path.to_string_lossy().replace('\\', "/");
            c.push(format!("- {}: [{}]({})", chart.kind.label(), chart.title, link));
        }
        c.blank();
    }
}
