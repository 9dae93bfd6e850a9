use chrono::NaiveDate;
use serde::Serialize;
use smallvec::SmallVec;

use crate::config::{Config, OutlierMethod};
use crate::services::loader::ColumnKind;

pub const OUTLIER_SAMPLE_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnOverview {
    pub name: String,
    pub kind: ColumnKind,
    pub missing_count: usize,
}

/// Basic shape of one sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetOverview {
    pub sheet_name: String,
    pub row_count: usize,
    pub column_count: usize,
    pub columns: Vec<ColumnOverview>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; `None` with a single value.
    pub std: Option<f64>,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationPair {
    pub column_a: String,
    pub column_b: String,
    pub coefficient: f64,
}

/// Square Pearson matrix over the numeric columns; `None` where undefined.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.values.get(row).and_then(|r| r.get(col)).copied().flatten()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationReport {
    pub threshold: f64,
    pub matrix: CorrelationMatrix,
    pub pairs: Vec<CorrelationPair>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlierSet {
    pub column: String,
    pub method: OutlierMethod,
    pub count: usize,
    /// Share of the column's non-missing values.
    pub percentage: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    /// First flagged values in row order, never more than [`OUTLIER_SAMPLE_SIZE`].
    pub sample: SmallVec<[f64; OUTLIER_SAMPLE_SIZE]>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub value: String,
    pub count: usize,
    /// Share of all rows, missing included.
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoricalProfile {
    pub column: String,
    pub unique_count: usize,
    pub missing_count: usize,
    pub missing_percentage: f64,
    pub top_values: Vec<CategoryCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateRange {
    pub min: NaiveDate,
    pub max: NaiveDate,
    pub span_days: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Frequency {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateProfile {
    pub column: String,
    pub range: Option<DateRange>,
    pub missing_count: usize,
    pub missing_percentage: f64,
    pub by_weekday: Vec<Frequency>,
    pub by_month: Vec<Frequency>,
    pub by_year: Vec<Frequency>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Histogram,
    BarChart,
    Heatmap,
    Boxplot,
    Pie,
}

impl ChartKind {
    pub fn label(&self) -> &'static str {
        match self {
            ChartKind::Histogram => "Histogram",
            ChartKind::BarChart => "Bar chart",
            ChartKind::Heatmap => "Correlation heatmap",
            ChartKind::Boxplot => "Boxplot",
            ChartKind::Pie => "Pie chart",
        }
    }
}

/// A chart written to disk, as referenced from the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartRef {
    pub kind: ChartKind,
    pub title: String,
    /// Column the chart describes; `None` for the heatmap.
    pub column: Option<String>,
    pub path: std::path::PathBuf,
}

/// Every finding for one sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetInsights {
    pub overview: SheetOverview,
    pub statistics: Vec<ColumnSummary>,
    /// `None` when fewer than two numeric columns have data.
    pub correlations: Option<CorrelationReport>,
    pub outliers: Vec<OutlierSet>,
    pub categorical: Vec<CategoricalProfile>,
    pub dates: Vec<DateProfile>,
    pub charts: Vec<ChartRef>,
}

/// All insights for one input file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub file_path: std::path::PathBuf,
    pub sheet_names: Vec<String>,
    pub generated_at: chrono::NaiveDateTime,
    pub config: Config,
    pub sheets: Vec<SheetInsights>,
}
