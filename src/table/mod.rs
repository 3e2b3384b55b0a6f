//! In-memory tabular data model
//!
//! A [`Table`] is an ordered sequence of named, homogeneously typed columns
//! of equal length. Missing entries are explicit [`CellValue::Null`] markers,
//! so `row_count` is always well defined.

pub mod stats;
mod value;

pub use stats::NumericSummary;
pub use value::{CellValue, ColumnType};

use crate::error::{EtlError, Result};

/// One named column of typed values
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    ty: ColumnType,
    values: Vec<CellValue>,
}

impl Column {
    pub fn new(name: impl Into<String>, ty: ColumnType, values: Vec<CellValue>) -> Self {
        Self {
            name: name.into(),
            ty,
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> ColumnType {
        self.ty
    }

    pub fn values(&self) -> &[CellValue] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_null()).count()
    }

    /// Present numeric values, in row order
    pub fn numeric_values(&self) -> Vec<f64> {
        self.values.iter().filter_map(|v| v.as_f64()).collect()
    }
}

/// An ordered collection of equally sized columns with unique names
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from columns, checking the shape invariants
    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        let mut table = Self::new();
        for column in columns {
            table.push_column(column)?;
        }
        Ok(table)
    }

    /// Append a column; its length must match the existing row count and its
    /// name must be unused
    pub fn push_column(&mut self, column: Column) -> Result<()> {
        if self.has_column(column.name()) {
            return Err(EtlError::DuplicateColumn(column.name().to_string()));
        }
        if !self.columns.is_empty() && column.len() != self.row_count() {
            return Err(EtlError::ColumnLength {
                column: column.name().to_string(),
                expected: self.row_count(),
                actual: column.len(),
            });
        }
        self.columns.push(column);
        Ok(())
    }

    /// Insert a column, replacing any existing column of the same name
    pub fn insert_column(&mut self, column: Column) -> Result<()> {
        if !self.columns.is_empty() && column.len() != self.row_count() {
            return Err(EtlError::ColumnLength {
                column: column.name().to_string(),
                expected: self.row_count(),
                actual: column.len(),
            });
        }
        match self.columns.iter_mut().find(|c| c.name == column.name) {
            Some(slot) => *slot = column,
            None => self.columns.push(column),
        }
        Ok(())
    }

    /// Rebuild from columns already known to satisfy the invariants
    pub(crate) fn from_columns_unchecked(columns: Vec<Column>) -> Table {
        Table { columns }
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map(Column::len).unwrap_or(0)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Cells of row `idx` in column order
    pub fn row(&self, idx: usize) -> Vec<&CellValue> {
        self.columns.iter().map(|c| &c.values[idx]).collect()
    }

    /// New table keeping only rows where the mask is true, order preserved
    pub fn retain_rows(&self, keep: &[bool]) -> Table {
        debug_assert_eq!(keep.len(), self.row_count());
        let columns = self
            .columns
            .iter()
            .map(|column| {
                let values = column
                    .values
                    .iter()
                    .zip(keep)
                    .filter(|(_, k)| **k)
                    .map(|(v, _)| v.clone())
                    .collect();
                Column::new(column.name(), column.ty(), values)
            })
            .collect();
        Table { columns }
    }

    /// Project the table as one JSON object per row
    pub fn row_objects(&self) -> Vec<serde_json::Map<String, serde_json::Value>> {
        (0..self.row_count())
            .map(|idx| {
                self.columns
                    .iter()
                    .map(|c| (c.name().to_string(), c.values[idx].to_json()))
                    .collect()
            })
            .collect()
    }
}
