//! Automated first-pass exploration of spreadsheet data.
//!
//! A run loads a workbook (or CSV file), profiles every sheet (summary
//! statistics, correlations, outliers, categorical and date breakdowns),
//! draws charts and writes a markdown report.

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod services;

pub use config::{Config, OutlierMethod};
pub use error::{InsightError, Result};
pub use pipeline::{run, RunOptions, RunSummary};
