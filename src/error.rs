use thiserror::Error;

#[derive(Debug, Error)]
pub enum InsightError {
    #[error("Load error: {0}")]
    Load(String),
    #[error("Column type error: {0}")]
    ColumnType(String),
    #[error("DataFrame error: {0}")]
    Analysis(String),
    #[error("Render error: {0}")]
    Render(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<calamine::Error> for InsightError {
    fn from(err: calamine::Error) -> Self {
        InsightError::Load(err.to_string())
    }
}

impl From<csv::Error> for InsightError {
    fn from(err: csv::Error) -> Self {
        InsightError::Load(err.to_string())
    }
}

impl From<polars::prelude::PolarsError> for InsightError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        InsightError::Analysis(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, InsightError>;
