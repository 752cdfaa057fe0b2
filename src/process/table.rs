// src/process/table.rs
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Values of one column, typed once when the table is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "values", rename_all = "snake_case")]
pub enum ColumnData {
    Text(Vec<Option<String>>),
    Numeric(Vec<Option<f64>>),
    DateTime(Vec<Option<NaiveDateTime>>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Numeric,
    DateTime,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Text => write!(f, "text"),
            ColumnType::Numeric => write!(f, "numeric"),
            ColumnType::DateTime => write!(f, "datetime"),
        }
    }
}

/// A single cell as seen by consumers.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue<'a> {
    Null,
    Text(&'a str),
    Number(f64),
    DateTime(NaiveDateTime),
}

impl CellValue<'_> {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Text(v) => v.len(),
            ColumnData::Numeric(v) => v.len(),
            ColumnData::DateTime(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn column_type(&self) -> ColumnType {
        match self {
            ColumnData::Text(_) => ColumnType::Text,
            ColumnData::Numeric(_) => ColumnType::Numeric,
            ColumnData::DateTime(_) => ColumnType::DateTime,
        }
    }

    pub fn get(&self, row: usize) -> CellValue<'_> {
        match self {
            ColumnData::Text(v) => v
                .get(row)
                .and_then(|c| c.as_deref())
                .map_or(CellValue::Null, CellValue::Text),
            ColumnData::Numeric(v) => v
                .get(row)
                .copied()
                .flatten()
                .map_or(CellValue::Null, CellValue::Number),
            ColumnData::DateTime(v) => v
                .get(row)
                .copied()
                .flatten()
                .map_or(CellValue::Null, CellValue::DateTime),
        }
    }

    pub fn null_count(&self) -> usize {
        (0..self.len()).filter(|&i| self.get(i).is_null()).count()
    }

    fn select(&self, rows: &[usize]) -> ColumnData {
        match self {
            ColumnData::Text(v) => ColumnData::Text(rows.iter().map(|&i| v[i].clone()).collect()),
            ColumnData::Numeric(v) => ColumnData::Numeric(rows.iter().map(|&i| v[i]).collect()),
            ColumnData::DateTime(v) => ColumnData::DateTime(rows.iter().map(|&i| v[i]).collect()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

/// One reconstructed table: uniquely named typed columns of equal length, plus
/// the row kind (`Data`, `SubTotal`, `Total`, ...) each row was exported with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    labels: Vec<String>,
    columns: Vec<Column>,
}

impl Table {
    /// Callers guarantee that every column has `labels.len()` values and that
    /// names are unique.
    pub(crate) fn new(labels: Vec<String>, columns: Vec<Column>) -> Self {
        debug_assert!(columns.iter().all(|c| c.data.len() == labels.len()));
        Self { labels, columns }
    }

    pub fn num_rows(&self) -> usize {
        self.labels.len()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn headers(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Row kinds in row order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn value(&self, row: usize, column: &str) -> Option<CellValue<'_>> {
        self.column(column).map(|c| c.data.get(row))
    }

    /// `(header, value)` pairs of one row, in column order.
    pub fn record(&self, row: usize) -> Vec<(&str, CellValue<'_>)> {
        self.columns
            .iter()
            .map(|c| (c.name.as_str(), c.data.get(row)))
            .collect()
    }

    /// New table holding only `rows` (in the given order); columns left without
    /// any value are dropped.
    pub fn select_rows(&self, rows: &[usize]) -> Table {
        let labels = rows.iter().map(|&i| self.labels[i].clone()).collect();
        let columns = self
            .columns
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                data: c.data.select(rows),
            })
            .filter(|c| c.data.null_count() < c.data.len())
            .collect();
        Table::new(labels, columns)
    }
}
