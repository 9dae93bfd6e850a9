//! PNG charts for a sheet's insights, drawn with [`plotters`].
//!
//! Planning (which charts exist and where they go) is kept apart from drawing
//! so the former can be checked without a font-capable environment.

use std::collections::HashSet;
use std::path::Path;

use plotters::element::Pie;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::config::Config;
use crate::error::{InsightError, Result};
use crate::models::{ChartKind, ChartRef, CorrelationMatrix, SheetInsights};
use crate::services::analysis::categorical::value_counts;
use crate::services::loader::utils::sanitize_file_stem;
use crate::services::loader::Table;

const CHART_SIZE: (u32, u32) = (1200, 800);
const LABEL_WIDTH: usize = 20;
const PIE_COLUMNS: usize = 3;
const PIE_MAX_SLICES: usize = 10;

const HISTOGRAM_FILL: RGBColor = RGBColor(135, 206, 235);
const BAR_FILL: RGBColor = RGBColor(144, 238, 144);
const MISSING_CELL: RGBColor = RGBColor(200, 200, 200);

/// One chart to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartJob {
    pub kind: ChartKind,
    pub title: String,
    pub column: Option<String>,
    pub file_name: String,
}

/// Reserves `<stem>.png` in `used`, adding `_1`, `_2`, ... until the name is free.
fn claim_file_name(stem: &str, used: &mut HashSet<String>) -> String {
    let mut name = format!("{}.png", stem);
    let mut counter = 1;
    while !used.insert(name.clone()) {
        name = format!("{}_{}.png", stem, counter);
        counter += 1;
    }
    name
}

/// Lists the charts the insights call for: a histogram and a boxplot per
/// summarized numeric column, a bar chart per categorical column with values,
/// a heatmap when a correlation matrix exists, and a pie chart for each of the
/// first three categorical columns with at most ten distinct values.
///
/// `used` holds the file names already taken in this run; every planned name
/// is added to it.
pub fn plan(insights: &SheetInsights, prefix: Option<&str>, used: &mut HashSet<String>) -> Vec<ChartJob> {
    let mut jobs = Vec::new();
    let mut push = |kind: ChartKind, title: String, column: Option<&str>, stem: String| {
        let stem = match prefix {
            Some(p) => format!("{}_{}", sanitize_file_stem(p), stem),
            None => stem,
        };
        jobs.push(ChartJob {
            kind,
            title,
            column: column.map(str::to_string),
            file_name: claim_file_name(&stem, used),
        });
    };

    for summary in &insights.statistics {
        push(
            ChartKind::Histogram,
            format!("Distribution of {}", summary.column),
            Some(summary.column.as_str()),
            format!("histogram_{}", sanitize_file_stem(&summary.column)),
        );
    }

    for profile in insights.categorical.iter().filter(|p| p.unique_count > 0) {
        push(
            ChartKind::BarChart,
            format!("Top Categories in {}", profile.column),
            Some(profile.column.as_str()),
            format!("barchart_{}", sanitize_file_stem(&profile.column)),
        );
    }

    if insights.correlations.is_some() {
        push(
            ChartKind::Heatmap,
            "Correlation Heatmap".to_string(),
            None,
            "correlation_heatmap".to_string(),
        );
    }

    for summary in &insights.statistics {
        push(
            ChartKind::Boxplot,
            format!("Boxplot of {}", summary.column),
            Some(summary.column.as_str()),
            format!("boxplot_{}", sanitize_file_stem(&summary.column)),
        );
    }

    for profile in insights
        .categorical
        .iter()
        .take(PIE_COLUMNS)
        .filter(|p| (1..=PIE_MAX_SLICES).contains(&p.unique_count))
    {
        push(
            ChartKind::Pie,
            format!("Distribution of {}", profile.column),
            Some(profile.column.as_str()),
            format!("piechart_{}", sanitize_file_stem(&profile.column)),
        );
    }

    jobs
}

/// Draws every planned chart into `dir` and returns references to them.
pub fn render_all(
    table: &Table,
    insights: &SheetInsights,
    config: &Config,
    dir: &Path,
    prefix: Option<&str>,
    used: &mut HashSet<String>,
) -> Result<Vec<ChartRef>> {
    std::fs::create_dir_all(dir).map_err(|e| {
        InsightError::Render(format!("Failed to create chart directory {}: {}", dir.display(), e))
    })?;

    let jobs = plan(insights, prefix, used);
    tracing::info!("Rendering {} charts for sheet {}", jobs.len(), table.sheet_name);

    let mut refs = Vec::with_capacity(jobs.len());
    for job in jobs {
        let path = dir.join(&job.file_name);
        render(table, insights, config, &job, &path)?;
        tracing::debug!("Saved {}", path.display());
        refs.push(ChartRef {
            kind: job.kind,
            title: job.title,
            column: job.column,
            path,
        });
    }
    Ok(refs)
}

fn render(table: &Table, insights: &SheetInsights, config: &Config, job: &ChartJob, path: &Path) -> Result<()> {
    let column = |name: &Option<String>| {
        name.as_deref()
            .and_then(|n| table.column(n))
            .ok_or_else(|| InsightError::Render(format!("no column for chart '{}'", job.title)))
    };

    match job.kind {
        ChartKind::Histogram => {
            let col = column(&job.column)?;
            draw_histogram(path, &job.title, &col.name, &col.numeric_values()?, config.histogram_bins)
        }
        ChartKind::Boxplot => {
            let col = column(&job.column)?;
            draw_boxplot(path, &job.title, &col.name, &col.numeric_values()?)
        }
        ChartKind::BarChart => {
            let col = column(&job.column)?;
            let mut counts = value_counts(col.as_categorical()?);
            counts.truncate(config.bar_chart_top);
            draw_bar_chart(path, &job.title, &col.name, &counts)
        }
        ChartKind::Pie => {
            let col = column(&job.column)?;
            draw_pie(path, &job.title, &value_counts(col.as_categorical()?))
        }
        ChartKind::Heatmap => {
            let report = insights.correlations.as_ref().ok_or_else(|| {
                InsightError::Render("heatmap requested without correlations".to_string())
            })?;
            draw_heatmap(path, &job.title, &report.matrix)
        }
    }
}

fn render_err<E: std::fmt::Display>(e: E) -> InsightError {
    InsightError::Render(e.to_string())
}

fn short_label(label: &str) -> String {
    if label.chars().count() > LABEL_WIDTH {
        let truncated: String = label.chars().take(LABEL_WIDTH - 1).collect();
        format!("{}…", truncated)
    } else {
        label.to_string()
    }
}

/// Equal-width bin counts over `[min, max]`; a constant column gets a unit-wide range.
pub fn bin_counts(values: &[f64], bins: usize) -> Option<(f64, f64, Vec<usize>)> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if values.is_empty() || bins == 0 || !min.is_finite() || !max.is_finite() {
        return None;
    }
    let (lo, hi) = if min == max { (min - 0.5, max + 0.5) } else { (min, max) };
    let width = (hi - lo) / bins as f64;

    let mut counts = vec![0usize; bins];
    for v in values {
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    Some((lo, hi, counts))
}

fn draw_histogram(path: &Path, title: &str, column: &str, values: &[f64], bins: usize) -> Result<()> {
    let (lo, hi, counts) = bin_counts(values, bins)
        .ok_or_else(|| InsightError::Render(format!("no values to plot for {}", column)))?;
    let width = (hi - lo) / bins as f64;
    let y_max = counts.iter().copied().max().unwrap_or(0) as f64 * 1.1 + 1.0;

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 32))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(70)
        .build_cartesian_2d(lo..hi, 0f64..y_max)
        .map_err(render_err)?;

    chart
        .configure_mesh()
        .x_desc(column)
        .y_desc("Frequency")
        .label_style(("sans-serif", 18))
        .draw()
        .map_err(render_err)?;

    chart
        .draw_series(counts.iter().enumerate().map(|(i, count)| {
            let x0 = lo + i as f64 * width;
            Rectangle::new([(x0, 0.0), (x0 + width, *count as f64)], HISTOGRAM_FILL.filled())
        }))
        .map_err(render_err)?;
    chart
        .draw_series(counts.iter().enumerate().map(|(i, count)| {
            let x0 = lo + i as f64 * width;
            Rectangle::new([(x0, 0.0), (x0 + width, *count as f64)], BLACK.stroke_width(1))
        }))
        .map_err(render_err)?;

    root.present().map_err(render_err)?;
    Ok(())
}

fn draw_bar_chart(path: &Path, title: &str, column: &str, counts: &[(String, usize)]) -> Result<()> {
    let n = counts.len() as u32;
    let labels: Vec<String> = counts.iter().map(|(v, _)| short_label(v)).collect();
    let y_max = counts.iter().map(|(_, c)| *c).max().unwrap_or(0) as u32 + 1;
    let y_max = y_max + y_max / 10;

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 32))
        .margin(20)
        .x_label_area_size(80)
        .y_label_area_size(70)
        .build_cartesian_2d((0u32..n).into_segmented(), 0u32..y_max)
        .map_err(render_err)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n as usize)
        .x_label_formatter(&|v| match v {
            SegmentValue::CenterOf(i) => labels.get(*i as usize).cloned().unwrap_or_default(),
            _ => String::new(),
        })
        .x_desc(column)
        .y_desc("Count")
        .label_style(("sans-serif", 16))
        .draw()
        .map_err(render_err)?;

    chart
        .draw_series(
            Histogram::vertical(&chart)
                .style(BAR_FILL.filled())
                .margin(10)
                .data(counts.iter().enumerate().map(|(i, (_, c))| (i as u32, *c as u32))),
        )
        .map_err(render_err)?;

    root.present().map_err(render_err)?;
    Ok(())
}

/// Blue for -1, near-white for 0, red for +1.
fn heat_color(r: Option<f64>) -> RGBColor {
    const NEGATIVE: (f64, f64, f64) = (59.0, 76.0, 192.0);
    const NEUTRAL: (f64, f64, f64) = (221.0, 221.0, 221.0);
    const POSITIVE: (f64, f64, f64) = (180.0, 4.0, 38.0);

    let r = match r {
        Some(r) => r.clamp(-1.0, 1.0),
        None => return MISSING_CELL,
    };
    let (from, to, t) = if r < 0.0 { (NEUTRAL, NEGATIVE, -r) } else { (NEUTRAL, POSITIVE, r) };
    let mix = |a: f64, b: f64| (a + (b - a) * t).round() as u8;
    RGBColor(mix(from.0, to.0), mix(from.1, to.1), mix(from.2, to.2))
}

fn draw_heatmap(path: &Path, title: &str, matrix: &CorrelationMatrix) -> Result<()> {
    let n = matrix.columns.len() as u32;
    let labels: Vec<String> = matrix.columns.iter().map(|c| short_label(c)).collect();
    let axis_label = |v: &SegmentValue<u32>| match v {
        SegmentValue::CenterOf(i) => labels.get(*i as usize).cloned().unwrap_or_default(),
        _ => String::new(),
    };

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 32))
        .margin(20)
        .x_label_area_size(120)
        .y_label_area_size(160)
        .build_cartesian_2d((0u32..n).into_segmented(), (0u32..n).into_segmented())
        .map_err(render_err)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(n as usize)
        .y_labels(n as usize)
        .x_label_formatter(&axis_label)
        .y_label_formatter(&axis_label)
        .label_style(("sans-serif", 16))
        .draw()
        .map_err(render_err)?;

    let cells: Vec<(u32, u32)> = (0..n).flat_map(|i| (0..n).map(move |j| (i, j))).collect();

    chart
        .draw_series(cells.iter().map(|&(i, j)| {
            let r = matrix.get(i as usize, j as usize);
            Rectangle::new(
                [
                    (SegmentValue::Exact(j), SegmentValue::Exact(i)),
                    (SegmentValue::Exact(j + 1), SegmentValue::Exact(i + 1)),
                ],
                heat_color(r).filled(),
            )
        }))
        .map_err(render_err)?;

    let centered = Pos::new(HPos::Center, VPos::Center);
    chart
        .draw_series(cells.iter().map(|&(i, j)| {
            let r = matrix.get(i as usize, j as usize);
            let text = r.map_or_else(|| "n/a".to_string(), |r| format!("{:.2}", r));
            let color: &'static RGBColor = if r.map_or(false, |r| r.abs() > 0.5) { &WHITE } else { &BLACK };
            let style = TextStyle::from(("sans-serif", 16).into_font())
                .pos(centered)
                .color(color);
            Text::new(text, (SegmentValue::CenterOf(j), SegmentValue::CenterOf(i)), style)
        }))
        .map_err(render_err)?;

    root.present().map_err(render_err)?;
    Ok(())
}

fn draw_boxplot(path: &Path, title: &str, column: &str, values: &[f64]) -> Result<()> {
    if values.is_empty() {
        return Err(InsightError::Render(format!("no values to plot for {}", column)));
    }
    let quartiles = Quartiles::new(values);
    let [lower_fence, _, _, _, upper_fence] = quartiles.values();

    let min = values.iter().copied().fold(f64::INFINITY, f64::min) as f32;
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max) as f32;
    let lo = min.min(lower_fence);
    let hi = max.max(upper_fence);
    let pad = ((hi - lo) * 0.05).max(0.5);

    let labels = [short_label(column)];

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 32))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(160)
        .build_cartesian_2d((lo - pad)..(hi + pad), labels[..].into_segmented())
        .map_err(render_err)?;

    chart
        .configure_mesh()
        .x_desc(column)
        .label_style(("sans-serif", 18))
        .draw()
        .map_err(render_err)?;

    chart
        .draw_series(std::iter::once(
            Boxplot::new_horizontal(SegmentValue::CenterOf(&labels[0]), &quartiles)
                .width(60)
                .style(&BLUE),
        ))
        .map_err(render_err)?;

    // Points beyond the whiskers
    chart
        .draw_series(
            values
                .iter()
                .map(|v| *v as f32)
                .filter(|v| *v < lower_fence || *v > upper_fence)
                .map(|v| Circle::new((v, SegmentValue::CenterOf(&labels[0])), 4, RED.filled())),
        )
        .map_err(render_err)?;

    root.present().map_err(render_err)?;
    Ok(())
}

fn draw_pie(path: &Path, title: &str, counts: &[(String, usize)]) -> Result<()> {
    if counts.is_empty() {
        return Err(InsightError::Render(format!("no values for '{}'", title)));
    }
    let sizes: Vec<f64> = counts.iter().map(|(_, c)| *c as f64).collect();
    let labels: Vec<String> = counts.iter().map(|(v, _)| short_label(v)).collect();
    let colors: Vec<RGBColor> = (0..counts.len())
        .map(|i| {
            let (r, g, b) = Palette99::pick(i).rgb();
            RGBColor(r, g, b)
        })
        .collect();

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;
    let root = root.titled(title, ("sans-serif", 32)).map_err(render_err)?;

    let (width, height) = root.dim_in_pixel();
    let center = (width as i32 / 2, height as i32 / 2);
    let radius = f64::from(width.min(height)) * 0.35;

    let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
    pie.start_angle(90.0);
    pie.label_style(("sans-serif", 18).into_font().color(&BLACK));
    pie.percentages(("sans-serif", 16).into_font().color(&BLACK));
    root.draw(&pie).map_err(render_err)?;

    root.present().map_err(render_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        CategoricalProfile, ColumnSummary, CorrelationReport, SheetOverview,
    };

    fn summary(column: &str) -> ColumnSummary {
        ColumnSummary {
            column: column.to_string(),
            count: 3,
            mean: 2.0,
            std: Some(1.0),
            min: 1.0,
            q1: 1.5,
            median: 2.0,
            q3: 2.5,
            max: 3.0,
        }
    }

    fn insights(numeric: &[&str], with_matrix: bool) -> SheetInsights {
        SheetInsights {
            overview: SheetOverview {
                sheet_name: "Sales".into(),
                row_count: 3,
                column_count: numeric.len() + 1,
                columns: Vec::new(),
            },
            statistics: numeric.iter().map(|c| summary(c)).collect(),
            correlations: with_matrix.then(|| CorrelationReport {
                threshold: 0.7,
                matrix: CorrelationMatrix {
                    columns: numeric.iter().map(|c| c.to_string()).collect(),
                    values: vec![vec![Some(1.0); numeric.len()]; numeric.len()],
                },
                pairs: Vec::new(),
            }),
            outliers: Vec::new(),
            categorical: vec![CategoricalProfile {
                column: "Region Name".into(),
                unique_count: 2,
                missing_count: 0,
                missing_percentage: 0.0,
                top_values: Vec::new(),
            }],
            dates: Vec::new(),
            charts: Vec::new(),
        }
    }

    fn categorical(column: &str, unique_count: usize) -> CategoricalProfile {
        CategoricalProfile {
            column: column.into(),
            unique_count,
            missing_count: 0,
            missing_percentage: 0.0,
            top_values: Vec::new(),
        }
    }

    fn names(jobs: &[ChartJob]) -> Vec<&str> {
        jobs.iter().map(|j| j.file_name.as_str()).collect()
    }

    #[test]
    fn plan_lists_one_chart_per_profile() {
        let jobs = plan(&insights(&["Units_Sold", "Profit"], true), None, &mut HashSet::new());
        assert_eq!(
            names(&jobs),
            vec![
                "histogram_Units_Sold.png",
                "histogram_Profit.png",
                "barchart_Region_Name.png",
                "correlation_heatmap.png",
                "boxplot_Units_Sold.png",
                "boxplot_Profit.png",
                "piechart_Region_Name.png",
            ]
        );
        assert_eq!(jobs.last().unwrap().kind, ChartKind::Pie);
    }

    #[test]
    fn plan_skips_heatmap_without_matrix_and_applies_prefix() {
        let jobs = plan(&insights(&["Units_Sold"], false), Some("Q1 Sales"), &mut HashSet::new());
        assert!(jobs.iter().all(|j| j.kind != ChartKind::Heatmap));
        assert!(jobs.iter().all(|j| j.file_name.starts_with("Q1_Sales_")));
    }

    #[test]
    fn pie_charts_cover_the_first_three_small_categorical_columns() {
        let mut sheet = insights(&["Units_Sold"], false);
        sheet.categorical = vec![
            categorical("Customer", 40),
            categorical("Region", 5),
            categorical("Blank", 0),
            categorical("Segment", 3),
        ];
        let pies: Vec<String> = plan(&sheet, None, &mut HashSet::new())
            .into_iter()
            .filter(|j| j.kind == ChartKind::Pie)
            .map(|j| j.file_name)
            .collect();
        assert_eq!(pies, vec!["piechart_Region.png"]);
    }

    #[test]
    fn colliding_stems_get_numeric_suffixes() {
        let jobs = plan(&insights(&["Units Sold", "Units_Sold"], true), None, &mut HashSet::new());
        let files = names(&jobs);
        let unique: HashSet<&str> = files.iter().copied().collect();
        assert_eq!(unique.len(), files.len());
        assert_eq!(&files[..2], &["histogram_Units_Sold.png", "histogram_Units_Sold_1.png"]);
    }

    #[test]
    fn sheets_sharing_a_sanitized_prefix_do_not_overwrite_each_other() {
        let mut used = HashSet::new();
        let first = plan(&insights(&["Units_Sold"], false), Some("Q1 Sales"), &mut used);
        let second = plan(&insights(&["Units_Sold"], false), Some("Q1_Sales"), &mut used);
        assert_eq!(first[0].file_name, "Q1_Sales_histogram_Units_Sold.png");
        assert_eq!(second[0].file_name, "Q1_Sales_histogram_Units_Sold_1.png");
        assert!(second.iter().all(|j| !names(&first).contains(&j.file_name.as_str())));
        assert_eq!(used.len(), first.len() + second.len());
    }

    #[test]
    fn bins_cover_every_value() {
        let values = [1.0, 2.0, 2.5, 9.0, 10.0];
        let (lo, hi, counts) = bin_counts(&values, 4).unwrap();
        assert_eq!((lo, hi), (1.0, 10.0));
        assert_eq!(counts.iter().sum::<usize>(), values.len());
        assert_eq!(counts[3], 2);

        let (lo, hi, counts) = bin_counts(&[5.0, 5.0], 3).unwrap();
        assert!(lo < 5.0 && hi > 5.0);
        assert_eq!(counts.iter().sum::<usize>(), 2);
        assert!(bin_counts(&[], 3).is_none());
    }

    #[test]
    fn heat_colors_span_the_scale() {
        assert_eq!(heat_color(Some(1.0)), RGBColor(180, 4, 38));
        assert_eq!(heat_color(Some(-1.0)), RGBColor(59, 76, 192));
        assert_eq!(heat_color(Some(0.0)), RGBColor(221, 221, 221));
        assert_eq!(heat_color(None), MISSING_CELL);
    }

    #[test]
    fn long_labels_are_shortened() {
        assert_eq!(short_label("Region"), "Region");
        assert_eq!(short_label("a_really_long_column_name_here").chars().count(), LABEL_WIDTH);
    }

    #[test]
    #[ignore = "needs a system sans-serif font"]
    fn renders_png_files() {
        use crate::services::loader::{Column, ColumnData};

        let table = Table {
            sheet_name: "Sales".into(),
            row_count: 6,
            columns: vec![
                Column {
                    name: "Units_Sold".into(),
                    data: ColumnData::Numeric(vec![Some(1.0), Some(2.0), Some(3.0), Some(2.0), Some(4.0), Some(40.0)]),
                },
                Column {
                    name: "Profit".into(),
                    data: ColumnData::Numeric(vec![Some(10.0), Some(20.0), Some(30.0), Some(20.0), Some(40.0), Some(400.0)]),
                },
                Column {
                    name: "Region Name".into(),
                    data: ColumnData::Categorical(
                        ["North", "South", "North", "East", "North", "South"]
                            .iter()
                            .map(|s| Some(s.to_string()))
                            .collect(),
                    ),
                },
            ],
        };
        let dir = tempfile::tempdir().unwrap();
        let refs = render_all(
            &table,
            &insights(&["Units_Sold", "Profit"], true),
            &Config::default(),
            dir.path(),
            None,
            &mut HashSet::new(),
        )
        .unwrap();
        assert_eq!(refs.len(), 7);
        assert!(refs.iter().all(|r| r.path.exists()));
    }
}
