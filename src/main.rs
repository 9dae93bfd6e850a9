use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use sheet_insights::{logging, Config, OutlierMethod, RunOptions};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliOutlierMethod {
    /// Interquartile-range fences
    Iqr,
    /// Absolute z-score
    Zscore,
}

impl From<CliOutlierMethod> for OutlierMethod {
    fn from(cli: CliOutlierMethod) -> Self {
        match cli {
            CliOutlierMethod::Iqr => OutlierMethod::Iqr,
            CliOutlierMethod::Zscore => OutlierMethod::Zscore,
        }
    }
}

/// Profile a spreadsheet and write a markdown insights report with charts.
#[derive(Debug, Parser)]
#[command(name = "sheet-insights", version, about)]
struct Cli {
    /// Workbook or CSV file to analyze (.xlsx, .xlsm, .xlsb, .xls, .ods, .csv)
    input: PathBuf,

    /// Analyze only this sheet
    #[arg(long)]
    sheet: Option<String>,

    /// Directory receiving the report and the visualizations folder
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Report path, defaults to <OUTPUT_DIR>/insights_report.md
    #[arg(long)]
    report: Option<PathBuf>,

    /// Also export the insights as JSON
    #[arg(long)]
    json: Option<PathBuf>,

    /// Minimum |r| for a pair to be listed as a strong correlation
    #[arg(long)]
    correlation_threshold: Option<f64>,

    #[arg(long, value_enum)]
    outlier_method: Option<CliOutlierMethod>,

    /// IQR multiplier or z-score cutoff, depending on the method
    #[arg(long)]
    outlier_threshold: Option<f64>,

    /// Number of most frequent values listed per categorical column
    #[arg(long)]
    top_n: Option<usize>,

    /// Skip chart rendering
    #[arg(long)]
    no_charts: bool,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(v) = self.correlation_threshold {
            config.correlation_threshold = v;
        }
        if let Some(m) = self.outlier_method {
            config.outlier_method = m.into();
        }
        if let Some(v) = self.outlier_threshold {
            config.outlier_threshold = v;
        }
        if let Some(n) = self.top_n {
            config.top_n = n;
        }
        if self.no_charts {
            config.charts_enabled = false;
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init_logging()?;

    let mut config = Config::new().context("Failed to load configuration")?;
    cli.apply(&mut config);
    config.validate()?;

    let options = RunOptions {
        input: cli.input.clone(),
        sheet: cli.sheet.clone(),
        output_dir: cli.output_dir.clone(),
        report_path: cli.report.clone(),
        json_path: cli.json.clone(),
        config,
    };

    tracing::info!("Analyzing {}", options.input.display());
    let summary = sheet_insights::run(&options)
        .with_context(|| format!("Analysis of {} failed", options.input.display()))?;

    println!("Analysis complete for {}", summary.report.file_path.display());
    for sheet in &summary.report.sheets {
        let overview = &sheet.overview;
        println!(
            "  {}: {} rows, {} columns",
            overview.sheet_name, overview.row_count, overview.column_count
        );
        if let Some(correlations) = &sheet.correlations {
            println!("    strong correlations: {}", correlations.pairs.len());
        }
        for outliers in &sheet.outliers {
            println!("    outliers in {}: {}", outliers.column, outliers.count);
        }
    }
    println!("Charts written: {}", summary.chart_count);
    println!("Report: {}", summary.report_path.display());

    Ok(())
}
