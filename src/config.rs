use serde::{Deserialize, Serialize};
use dotenvy::dotenv;
use std::str::FromStr;

use crate::error::{InsightError, Result};

const ENV_PREFIX: &str = "SHEET_INSIGHTS_";

fn default_correlation_threshold() -> f64 {
    0.7
}

fn default_outlier_threshold() -> f64 {
    1.5
}

fn default_top_n() -> usize {
    5
}

fn default_bar_chart_top() -> usize {
    10
}

fn default_histogram_bins() -> usize {
    20
}

fn default_charts_enabled() -> bool {
    true
}

/// Rule used by the outlier detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutlierMethod {
    /// Interquartile-range fencing.
    #[default]
    Iqr,
    /// Absolute z-score above the threshold.
    Zscore,
}

impl FromStr for OutlierMethod {
    type Err = InsightError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "iqr" => Ok(OutlierMethod::Iqr),
            "zscore" | "z-score" => Ok(OutlierMethod::Zscore),
            other => Err(InsightError::Config(format!("unknown outlier method '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_correlation_threshold")]
    pub correlation_threshold: f64,
    #[serde(default)]
    pub outlier_method: OutlierMethod,
    #[serde(default = "default_outlier_threshold")]
    pub outlier_threshold: f64,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default = "default_bar_chart_top")]
    pub bar_chart_top: usize,
    #[serde(default = "default_histogram_bins")]
    pub histogram_bins: usize,
    #[serde(default = "default_charts_enabled")]
    pub charts_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            correlation_threshold: default_correlation_threshold(),
            outlier_method: OutlierMethod::default(),
            outlier_threshold: default_outlier_threshold(),
            top_n: default_top_n(),
            bar_chart_top: default_bar_chart_top(),
            histogram_bins: default_histogram_bins(),
            charts_enabled: default_charts_enabled(),
        }
    }
}

impl Config {
    /// Defaults overlaid with `.env` and `SHEET_INSIGHTS_*` environment variables.
    pub fn new() -> Result<Self> {
        // Load .env file first
        dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup. Keys are the upper-cased
    /// field names with the `SHEET_INSIGHTS_` prefix.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        if let Some(value) = var("CORRELATION_THRESHOLD") {
            config.correlation_threshold = parse_value("CORRELATION_THRESHOLD", &value)?;
        }
        if let Some(value) = var("OUTLIER_METHOD") {
            config.outlier_method = value.parse()?;
        }
        if let Some(value) = var("OUTLIER_THRESHOLD") {
            config.outlier_threshold = parse_value("OUTLIER_THRESHOLD", &value)?;
        }
        if let Some(value) = var("TOP_N") {
            config.top_n = parse_value("TOP_N", &value)?;
        }
        if let Some(value) = var("BAR_CHART_TOP") {
            config.bar_chart_top = parse_value("BAR_CHART_TOP", &value)?;
        }
        if let Some(value) = var("HISTOGRAM_BINS") {
            config.histogram_bins = parse_value("HISTOGRAM_BINS", &value)?;
        }
        if let Some(value) = var("CHARTS") {
            config.charts_enabled = parse_value("CHARTS", &value)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.correlation_threshold.is_finite()
            || !(0.0..=1.0).contains(&self.correlation_threshold)
        {
            return Err(InsightError::Config(format!(
                "correlation threshold must be within [0, 1], got {}",
                self.correlation_threshold
            )));
        }
        if !self.outlier_threshold.is_finite() || self.outlier_threshold < 0.0 {
            return Err(InsightError::Config(format!(
                "outlier threshold must be a non-negative number, got {}",
                self.outlier_threshold
            )));
        }
        if self.top_n == 0 {
            return Err(InsightError::Config("top-n must be at least 1".to_string()));
        }
        if self.bar_chart_top == 0 || self.histogram_bins == 0 {
            return Err(InsightError::Config(
                "chart sizes must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_value<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        InsightError::Config(format!("{}{} has invalid value '{}'", ENV_PREFIX, name, value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_observed_behaviour() {
        let config = Config::default();
        assert_eq!(config.correlation_threshold, 0.7);
        assert_eq!(config.outlier_method, OutlierMethod::Iqr);
        assert_eq!(config.outlier_threshold, 1.5);
        assert_eq!(config.top_n, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn environment_overrides_are_applied() {
        let config = Config::from_lookup(lookup(&[
            ("SHEET_INSIGHTS_CORRELATION_THRESHOLD", "0.5"),
            ("SHEET_INSIGHTS_OUTLIER_METHOD", "zscore"),
            ("SHEET_INSIGHTS_TOP_N", "3"),
            ("SHEET_INSIGHTS_CHARTS", "false"),
        ]))
        .unwrap();
        assert_eq!(config.correlation_threshold, 0.5);
        assert_eq!(config.outlier_method, OutlierMethod::Zscore);
        assert_eq!(config.top_n, 3);
        assert!(!config.charts_enabled);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = Config::from_lookup(lookup(&[("SHEET_INSIGHTS_TOP_N", "many")])).unwrap_err();
        assert!(matches!(err, InsightError::Config(_)));

        let err = Config::from_lookup(lookup(&[("SHEET_INSIGHTS_CORRELATION_THRESHOLD", "1.5")]))
            .unwrap_err();
        assert!(matches!(err, InsightError::Config(_)));

        let err = Config::from_lookup(lookup(&[("SHEET_INSIGHTS_OUTLIER_METHOD", "mad")]))
            .unwrap_err();
        assert!(matches!(err, InsightError::Config(_)));
    }
}
