//! Column normalization: raw text cells in, typed values out.
//!
//! Normalization runs in four steps over a loaded raw table: trim every
//! cell, translate column names, apply the [`ColumnRule`] table, and project
//! the result onto [`OUTPUT_COLUMNS`]. A cell that cannot be converted
//! becomes [`Value::Null`] or a sentinel; rows are never dropped.

pub mod rules;

use crate::error::{PipelineError, Result};
use crate::store::RawTable;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use tracing::{info, warn};

pub use rules::{COLUMN_RULES, CORE_COUNTS, ColumnRule, OUTPUT_COLUMNS, TRANSLATIONS};

/// A typed cell of the normalized dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

static NULL: Value = Value::Null;

impl Value {
    /// Trimmed cell text; blank cells are `Null`.
    pub fn from_cell(cell: &str) -> Self {
        let trimmed = cell.trim();
        if trimmed.is_empty() {
            Value::Null
        } else {
            Value::Text(trimmed.to_string())
        }
    }

    pub fn text(s: &str) -> Self {
        Value::Text(s.to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Textual form of any non-null value, used by the numeric rules so that
    /// already-typed cells go through the same parsing as raw text.
    pub fn to_plain_string(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Int(i) => Some(i.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::Text(s) => Some(s.clone()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => f.write_str(s),
        }
    }
}

/// One row keyed by (translated) column name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: HashMap<String, Value>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cell of `column`, `Null` when the column does not exist.
    pub fn get(&self, column: &str) -> &Value {
        self.cells.get(column).unwrap_or(&NULL)
    }

    pub fn set(&mut self, column: &str, value: Value) {
        self.cells.insert(column.to_string(), value);
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, Value)>) -> Self {
        let mut row = Row::new();
        for (column, value) in pairs {
            row.set(column, value);
        }
        row
    }
}

/// The final typed table, columns in [`OUTPUT_COLUMNS`] order.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedDataset {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl NormalizedDataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// All values of `column`, top to bottom.
    pub fn column(&self, column: &str) -> Option<Vec<&Value>> {
        let idx = self.column_index(column)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }
}

/// Applies the rule table to a raw table.
pub struct ColumnNormalizer {
    translations: &'static [(&'static str, &'static str)],
    rules: &'static [ColumnRule],
    output_columns: &'static [&'static str],
}

impl Default for ColumnNormalizer {
    fn default() -> Self {
        Self {
            translations: TRANSLATIONS,
            rules: COLUMN_RULES,
            output_columns: OUTPUT_COLUMNS,
        }
    }
}

impl ColumnNormalizer {
    pub fn new(
        translations: &'static [(&'static str, &'static str)],
        rules: &'static [ColumnRule],
        output_columns: &'static [&'static str],
    ) -> Self {
        Self {
            translations,
            rules,
            output_columns,
        }
    }

    fn translate<'a>(&self, column: &'a str) -> &'a str {
        let column = column.trim();
        self.translations
            .iter()
            .find(|(from, _)| *from == column)
            .map(|(_, to)| *to)
            .unwrap_or(column)
    }

    pub fn normalize(&self, table: &RawTable) -> Result<NormalizedDataset> {
        let header: Vec<&str> = table.header.iter().map(|h| self.translate(h)).collect();
        if !header.contains(&"Name") {
            return Err(PipelineError::MissingColumn("Name".to_string()));
        }
        for expected in self.output_columns {
            if !header.contains(expected) && !self.is_derived(expected) {
                warn!("Column '{}' is absent from the input; it will be empty", expected);
            }
        }

        let rows = table
            .rows
            .iter()
            .map(|raw| {
                let row = Row::from_pairs(
                    header
                        .iter()
                        .zip(raw.iter())
                        .map(|(column, cell)| (*column, Value::from_cell(cell))),
                );
                self.project(&self.apply_rules(row))
            })
            .collect::<Vec<_>>();

        info!("Normalized {} row(s) into {} column(s)", rows.len(), self.output_columns.len());
        Ok(NormalizedDataset {
            columns: self.output_columns.iter().map(|c| c.to_string()).collect(),
            rows,
        })
    }

    pub fn apply_rules(&self, mut row: Row) -> Row {
        for rule in self.rules {
            let outputs = (rule.transform)(row.get(rule.column), &row);
            debug_assert_eq!(outputs.len(), rule.outputs.len(), "rule for {}", rule.column);
            for (column, value) in rule.outputs.iter().zip(outputs) {
                row.set(column, value);
            }
        }
        row
    }

    fn project(&self, row: &Row) -> Vec<Value> {
        self.output_columns
            .iter()
            .map(|column| row.get(column).clone())
            .collect()
    }

    fn is_derived(&self, column: &str) -> bool {
        self.rules
            .iter()
            .any(|rule| rule.outputs.iter().skip(1).any(|c| *c == column))
    }
}
