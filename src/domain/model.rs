use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// Storage type of a column, inferred from the source cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
}

impl ColumnType {
    pub fn sql_type(self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text => "TEXT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub dtype: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, dtype: ColumnType) -> Self {
        Self {
            name: name.into(),
            dtype,
        }
    }
}

/// One row: column name to scalar (string, number or null).
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub data: HashMap<String, Value>,
}

impl Record {
    pub fn from_pairs<K, I>(pairs: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Self {
            data: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Absent keys read as null.
    pub fn get(&self, column: &str) -> &Value {
        self.data.get(column).unwrap_or(&Value::Null)
    }

    pub fn has_missing<'a, I>(&self, columns: I) -> bool
    where
        I: IntoIterator<Item = &'a Column>,
    {
        columns
            .into_iter()
            .any(|column| self.get(&column.name).is_null())
    }
}

/// An ordered set of records sharing one column schema, alive for a single run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordBatch {
    columns: Vec<Column>,
    records: Vec<Record>,
}

impl RecordBatch {
    pub fn new(columns: Vec<Column>, records: Vec<Record>) -> Self {
        Self { columns, records }
    }

    /// Zero rows, zero columns.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn num_rows(&self) -> usize {
        self.records.len()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// A batch with no rows or no columns holds no data.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty() || self.columns.is_empty()
    }

    pub fn into_parts(self) -> (Vec<Column>, Vec<Record>) {
        (self.columns, self.records)
    }
}

/// Result of a load attempt. A failed load is reported here, never raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum LoadOutcome {
    Loaded { table: String, rows: usize },
    Failed { reason: String },
}

impl LoadOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadOutcome::Loaded { .. })
    }
}
