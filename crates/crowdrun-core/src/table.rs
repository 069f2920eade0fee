//! Tabular datasets with role-prefixed columns.
//!
//! Task datasets and assignment exports are plain tables whose column names
//! carry their role as a prefix (`INPUT:text`, `GOLDEN:label`,
//! `ASSIGNMENT:worker_id`, ...). Cells are JSON values; `null` marks a
//! missing value.

use serde_json::{Map, Value};

use crate::CoreError;

/// Prefix of task input columns.
pub const INPUT_PREFIX: &str = "INPUT:";
/// Prefix of expected-output columns.
pub const GOLDEN_PREFIX: &str = "GOLDEN:";
/// Prefix of training hint columns.
pub const HINT_PREFIX: &str = "HINT:";
/// Prefix of submitted-answer columns.
pub const OUTPUT_PREFIX: &str = "OUTPUT:";
/// Column holding the responding worker's id.
pub const WORKER_ID_COLUMN: &str = "ASSIGNMENT:worker_id";

/// An ordered table of JSON cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Create an empty table with the given columns.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row; it must have exactly one cell per column.
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<(), CoreError> {
        if row.len() != self.columns.len() {
            return Err(CoreError::InvalidInput(format!(
                "row has {} cells, table has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Builder variant of [`Table::push_row`].
    pub fn with_row(mut self, row: Vec<Value>) -> Result<Self, CoreError> {
        self.push_row(row)?;
        Ok(self)
    }

    /// Build a table from JSON records.
    ///
    /// Columns appear in first-seen order; a record without a column gets a
    /// `null` cell there.
    pub fn from_records(records: &[Map<String, Value>]) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for record in records {
            for key in record.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }

        let rows = records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|c| record.get(c).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect();

        Self { columns, rows }
    }

    /// Parse a tab-separated export with a header line.
    ///
    /// Cells may be quoted, with tabs, line breaks and doubled quotes inside.
    /// Every non-empty cell becomes a JSON string; empty cells become `null`.
    /// Only blank lines are skipped; a row of empty cells is kept.
    pub fn from_tsv(text: &str) -> Result<Self, CoreError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .flexible(true)
            .from_reader(text.as_bytes());

        let header = reader.headers().map_err(tsv_error)?;
        if header.is_empty() {
            return Ok(Self::default());
        }

        let mut table = Self::new(header.iter());
        for record in reader.records() {
            let record = record.map_err(tsv_error)?;
            let row: Vec<Value> = record
                .iter()
                .map(|cell| {
                    if cell.is_empty() {
                        Value::Null
                    } else {
                        Value::String(cell.to_string())
                    }
                })
                .collect();
            table.push_row(row).map_err(|e| {
                let line = record.position().map_or(0, |p| p.line());
                CoreError::InvalidInput(format!("TSV line {line}: {e}"))
            })?;
        }
        Ok(table)
    }

    /// Column names in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows in order.
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by exact name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Columns starting with `prefix`, as (position, name without prefix).
    pub fn prefixed_columns<'a>(&'a self, prefix: &str) -> Vec<(usize, &'a str)> {
        self.columns
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.strip_prefix(prefix).map(|field| (i, field)))
            .collect()
    }
}

fn tsv_error(e: csv::Error) -> CoreError {
    match e.position() {
        Some(position) => CoreError::InvalidInput(format!("TSV line {}: {e}", position.line())),
        None => CoreError::InvalidInput(format!("TSV: {e}")),
    }
}

/// Returns true if the cell holds no value.
pub fn is_missing(cell: &Value) -> bool {
    cell.is_null()
}

/// Text form of a cell: strings verbatim, anything else as JSON.
pub fn cell_text(cell: &Value) -> String {
    match cell {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
