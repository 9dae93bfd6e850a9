use std::collections::HashSet;
use std::path::PathBuf;

use crate::config::Config;
use crate::error::Result;
use crate::models::Report;
use crate::services::{analysis, charts, loader, report};

pub const DEFAULT_REPORT_NAME: &str = "insights_report.md";
pub const CHART_DIR_NAME: &str = "visualizations";

/// Everything one run needs to know.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub input: PathBuf,
    pub sheet: Option<String>,
    pub output_dir: PathBuf,
    /// Defaults to `insights_report.md` inside `output_dir`.
    pub report_path: Option<PathBuf>,
    pub json_path: Option<PathBuf>,
    pub config: Config,
}

impl RunOptions {
    pub fn new(input: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            sheet: None,
            output_dir: output_dir.into(),
            report_path: None,
            json_path: None,
            config: Config::default(),
        }
    }

    pub fn report_path(&self) -> PathBuf {
        self.report_path
            .clone()
            .unwrap_or_else(|| self.output_dir.join(DEFAULT_REPORT_NAME))
    }

    pub fn chart_dir(&self) -> PathBuf {
        self.output_dir.join(CHART_DIR_NAME)
    }
}

#[derive(Debug)]
pub struct RunSummary {
    pub report: Report,
    pub report_path: PathBuf,
    pub chart_count: usize,
}

/// Loads the input, analyzes every sheet, draws charts and writes the report.
/// Any failure aborts the run.
pub fn run(options: &RunOptions) -> Result<RunSummary> {
    let start = std::time::Instant::now();
    options.config.validate()?;

    let workbook = loader::load(&options.input, options.sheet.as_deref())?;
    let multi_sheet = workbook.tables.len() > 1;

    // Report links are computed between these two, so both must be absolute
    let cwd = std::env::current_dir()?;
    let chart_dir = cwd.join(options.chart_dir());
    let report_path = cwd.join(options.report_path());
    let mut used_chart_names = HashSet::new();

    let mut sheets = Vec::with_capacity(workbook.tables.len());
    for table in &workbook.tables {
        let mut insights = analysis::analyze_table(table, &options.config)?;

        if options.config.charts_enabled {
            let prefix = multi_sheet.then_some(table.sheet_name.as_str());
            insights.charts = charts::render_all(
                table,
                &insights,
                &options.config,
                &chart_dir,
                prefix,
                &mut used_chart_names,
            )?;
        }
        sheets.push(insights);
    }

    let report = Report {
        file_path: workbook.path.clone(),
        sheet_names: workbook.sheet_names.clone(),
        generated_at: chrono::Local::now().naive_local(),
        config: options.config.clone(),
        sheets,
    };

    report::write_report(&report, &report_path)?;

    if let Some(json_path) = &options.json_path {
        let file = std::fs::File::create(json_path)?;
        serde_json::to_writer_pretty(std::io::BufWriter::new(file), &report)?;
        tracing::info!("Insights exported to {}", json_path.display());
    }

    let chart_count = report.sheets.iter().map(|s| s.charts.len()).sum();
    tracing::info!("Analysis complete in {:?}", start.elapsed());

    Ok(RunSummary {
        report,
        report_path,
        chart_count,
    })
}
