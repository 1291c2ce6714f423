//! Column-oriented table used for inputs and table-valued outputs.
//!
//! A `Table` is an ordered list of named, equal-length columns. It carries
//! just enough structure for the validator to check schema and types, and for
//! derived outputs (funding curve, monthly returns) to be handed to reporting
//! code without a dataframe dependency.

use crate::domain::error::ValidationError;
use chrono::NaiveDateTime;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", content = "values", rename_all = "lowercase"))]
pub enum Column {
    Time(Vec<NaiveDateTime>),
    Float(Vec<f64>),
    Int(Vec<i64>),
    Text(Vec<String>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Time(v) => v.len(),
            Column::Float(v) => v.len(),
            Column::Int(v) => v.len(),
            Column::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Short type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Column::Time(_) => "time",
            Column::Float(_) => "float",
            Column::Int(_) => "int",
            Column::Text(_) => "text",
        }
    }

    pub fn as_time(&self) -> Option<&[NaiveDateTime]> {
        match self {
            Column::Time(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<&[f64]> {
        match self {
            Column::Float(v) => Some(v),
            _ => None,
        }
    }

    /// Numeric view of the column; integers are widened to `f64`.
    pub fn to_f64(&self) -> Option<Vec<f64>> {
        match self {
            Column::Float(v) => Some(v.clone()),
            Column::Int(v) => Some(v.iter().map(|&x| x as f64).collect()),
            _ => None,
        }
    }

    fn cell(&self, row: usize) -> String {
        match self {
            Column::Time(v) => v[row].to_string(),
            Column::Float(v) => format!("{:.6}", v[row]),
            Column::Int(v) => v[row].to_string(),
            Column::Text(v) => v[row].clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Table {
    names: Vec<String>,
    columns: Vec<Column>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Two-column `time` + `value_name` table, the shape of both engine inputs.
    pub fn time_series(value_name: &str, time: Vec<NaiveDateTime>, values: Vec<f64>) -> Self {
        let mut table = Table::new();
        table.names.push("time".to_string());
        table.columns.push(Column::Time(time));
        table.names.push(value_name.to_string());
        table.columns.push(Column::Float(values));
        table
    }

    /// Table from columns the caller built with equal lengths and distinct names.
    pub(crate) fn from_parts(parts: Vec<(&str, Column)>) -> Self {
        debug_assert!(parts.windows(2).all(|w| w[0].1.len() == w[1].1.len()));
        let (names, columns) = parts
            .into_iter()
            .map(|(name, column)| (name.to_string(), column))
            .unzip();
        Table { names, columns }
    }

    /// Builder form of [`Table::push_column`].
    pub fn with_column(mut self, name: &str, column: Column) -> Result<Self, ValidationError> {
        self.push_column(name, column)?;
        Ok(self)
    }

    /// Append a column. Fails on a duplicate name or a length that differs
    /// from the columns already present.
    pub fn push_column(&mut self, name: &str, column: Column) -> Result<(), ValidationError> {
        if self.names.iter().any(|n| n == name) {
            return Err(ValidationError::DuplicateColumn {
                column: name.to_string(),
            });
        }
        if let Some(first) = self.columns.first() {
            if first.len() != column.len() {
                return Err(ValidationError::ColumnLength {
                    column: name.to_string(),
                    expected: first.len(),
                    actual: column.len(),
                });
            }
        }
        self.names.push(name.to_string());
        self.columns.push(column);
        Ok(())
    }

    pub fn height(&self) -> usize {
        self.columns.first().map(Column::len).unwrap_or(0)
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| &self.columns[i])
    }

    pub fn time_column(&self, name: &str) -> Option<&[NaiveDateTime]> {
        self.column(name).and_then(Column::as_time)
    }

    pub fn float_column(&self, name: &str) -> Option<&[f64]> {
        self.column(name).and_then(Column::as_float)
    }

    /// Projection onto the named columns, in the order given. `None` if any is absent.
    pub fn select(&self, names: &[&str]) -> Option<Table> {
        let mut out = Table::new();
        for &name in names {
            let column = self.column(name)?.clone();
            out.names.push(name.to_string());
            out.columns.push(column);
        }
        Some(out)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.names.join("\t"))?;
        for row in 0..self.height() {
            let cells: Vec<String> = self.columns.iter().map(|c| c.cell(row)).collect();
            writeln!(f, "{}", cells.join("\t"))?;
        }
        Ok(())
    }
}
