// ============================================================================
// L1: DATA STRUCTURES
// ============================================================================
use std::collections::BTreeMap;

use crate::sql_types::SqlType;

/// One column of a source table as reported by the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub sql_type: SqlType,
    /// Declared maximum length; 0 means unbounded.
    pub max_length: u32,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, sql_type: SqlType, max_length: u32) -> Self {
        ColumnDescriptor {
            name: name.into(),
            sql_type,
            max_length,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TablePair {
    pub source_table: String,
    pub destination_table: String,
}

impl TablePair {
    pub fn label(&self) -> String {
        format!("{} / {}", self.source_table, self.destination_table)
    }
}

/// Raw user input for one insert attempt, keyed by column index.
#[derive(Debug, Clone, Default)]
pub struct PendingInsertForm {
    values: BTreeMap<usize, String>,
}

impl PendingInsertForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, index: usize, value: impl Into<String>) {
        self.values.insert(index, value.into());
    }

    /// Unset fields read as empty input.
    pub fn value(&self, index: usize) -> &str {
        self.values.get(&index).map(String::as_str).unwrap_or("")
    }
}

/// Result of one `SELECT *`, already rendered to cell text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSnapshot {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}
