use chrono::NaiveDateTime;
use serde::Serialize;

use crate::error::{InsightError, Result};

/// A raw cell as read from the source file, before column typing.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Bool(bool),
    Text(String),
    Date(NaiveDateTime),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Numeric,
    Categorical,
    Date,
}

impl std::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnKind::Numeric => write!(f, "numeric"),
            ColumnKind::Categorical => write!(f, "categorical"),
            ColumnKind::Date => write!(f, "date"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Numeric(Vec<Option<f64>>),
    Categorical(Vec<Option<String>>),
    Date(Vec<Option<NaiveDateTime>>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn kind(&self) -> ColumnKind {
        match self.data {
            ColumnData::Numeric(_) => ColumnKind::Numeric,
            ColumnData::Categorical(_) => ColumnKind::Categorical,
            ColumnData::Date(_) => ColumnKind::Date,
        }
    }

    pub fn len(&self) -> usize {
        match &self.data {
            ColumnData::Numeric(v) => v.len(),
            ColumnData::Categorical(v) => v.len(),
            ColumnData::Date(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn missing_count(&self) -> usize {
        match &self.data {
            ColumnData::Numeric(v) => v.iter().filter(|x| x.is_none()).count(),
            ColumnData::Categorical(v) => v.iter().filter(|x| x.is_none()).count(),
            ColumnData::Date(v) => v.iter().filter(|x| x.is_none()).count(),
        }
    }

    pub fn as_numeric(&self) -> Result<&[Option<f64>]> {
        match &self.data {
            ColumnData::Numeric(v) => Ok(v),
            _ => Err(self.type_error(ColumnKind::Numeric)),
        }
    }

    pub fn as_categorical(&self) -> Result<&[Option<String>]> {
        match &self.data {
            ColumnData::Categorical(v) => Ok(v),
            _ => Err(self.type_error(ColumnKind::Categorical)),
        }
    }

    pub fn as_dates(&self) -> Result<&[Option<NaiveDateTime>]> {
        match &self.data {
            ColumnData::Date(v) => Ok(v),
            _ => Err(self.type_error(ColumnKind::Date)),
        }
    }

    /// Non-missing numeric values in row order.
    pub fn numeric_values(&self) -> Result<Vec<f64>> {
        Ok(self.as_numeric()?.iter().flatten().copied().collect())
    }

    fn type_error(&self, expected: ColumnKind) -> InsightError {
        InsightError::ColumnType(format!(
            "column '{}' is {} but was read as {}",
            self.name,
            self.kind(),
            expected
        ))
    }
}

/// One sheet of the input, typed column by column.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub sheet_name: String,
    pub row_count: usize,
    pub columns: Vec<Column>,
}

impl Table {
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn columns_of(&self, kind: ColumnKind) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(move |c| c.kind() == kind)
    }
}

/// Everything read from one input file.
#[derive(Debug, Clone)]
pub struct Workbook {
    pub path: std::path::PathBuf,
    pub sheet_names: Vec<String>,
    pub tables: Vec<Table>,
}
