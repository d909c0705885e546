//! Schema and table storage.
//!
//! A [`Table`] owns its rows, its secondary indexes, and its row-id
//! allocator. Every mutation runs through [`Table::insert`],
//! [`Table::update`], or [`Table::delete`], which are the sole places
//! constraints are enforced and indexes kept in sync.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::btree::{BTreeIndex, RowId};
use crate::error::{ConstraintError, Result, StorageError};
use crate::value::{ColumnType, Value};

/// Immutable column metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Column name, unique within its table, case-sensitive.
    pub name: String,
    /// Declared type.
    #[serde(rename = "type")]
    pub data_type: ColumnType,
    /// Whether this column is the table's primary key.
    #[serde(default)]
    pub primary_key: bool,
    /// Whether this column must hold distinct non-null values.
    #[serde(default)]
    pub unique: bool,
    /// Whether `Null` is rejected for this column.
    #[serde(default)]
    pub not_null: bool,
}

/// A single row: column name → value.
pub type Row = BTreeMap<String, Value>;

/// A table: columns, row storage, secondary indexes, and a row-id
/// allocator.
#[derive(Debug)]
pub struct Table {
    name: String,
    columns: Vec<Column>,
    rows: BTreeMap<RowId, Row>,
    indexes: BTreeMap<String, BTreeIndex>,
    next_row_id: RowId,
    path: Option<PathBuf>,
}

impl Table {
    /// Creates a new, empty table. `directory` is where the table's
    /// document is persisted; `None` keeps the table purely in memory
    /// (used by tests that don't exercise persistence).
    #[must_use]
    pub fn new(name: impl Into<String>, columns: Vec<Column>, directory: Option<&Path>) -> Self {
        let name = name.into();
        let mut table = Self {
            path: directory.map(|dir| table_path(dir, &name)),
            name,
            columns,
            rows: BTreeMap::new(),
            indexes: BTreeMap::new(),
            next_row_id: 1,
        };
        for column in table.columns.clone() {
            if column.primary_key || column.unique {
                table.create_column_index(&column.name);
            }
        }
        table
    }

    /// The table's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The table's declared columns, in declaration order.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Looks up a declared column by name (case-sensitive).
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Whether `column` has a secondary index.
    #[must_use]
    pub fn has_index(&self, column: &str) -> bool {
        self.indexes.contains_key(column)
    }

    /// Returns the index on `column`, if one exists.
    #[must_use]
    pub fn index(&self, column: &str) -> Option<&BTreeIndex> {
        self.indexes.get(column)
    }

    /// Builds (or rebuilds) an index over `column` from the rows
    /// currently stored. Idempotent.
    pub fn create_column_index(&mut self, column: &str) {
        let mut index = BTreeIndex::new();
        for (rowid, row) in &self.rows {
            if let Some(value) = row.get(column) {
                if !value.is_null() {
                    index.insert(value.clone(), *rowid);
                }
            }
        }
        self.indexes.insert(column.to_string(), index);
    }

    /// Lazily iterates all rows in ascending row-id order.
    pub fn scan(&self) -> impl Iterator<Item = (RowId, &Row)> {
        self.rows.iter().map(|(id, row)| (*id, row))
    }

    /// Looks up a single row by id.
    #[must_use]
    pub fn row(&self, rowid: RowId) -> Option<&Row> {
        self.rows.get(&rowid)
    }

    /// Inserts one row, supplied as a partial column→value mapping
    /// (missing columns default to `Null`). Runs type coercion and
    /// every declarative constraint before the row is stored; on
    /// failure the table is left untouched.
    pub fn insert(&mut self, mut values: Row) -> Result<RowId> {
        if values.len() > self.columns.len() {
            let extra = values
                .keys()
                .find(|k| !self.columns.iter().any(|c| &c.name == *k))
                .cloned()
                .unwrap_or_default();
            return Err(ConstraintError::UnknownColumn(extra).into());
        }

        let mut resolved = Row::new();
        for column in &self.columns {
            let supplied = values.remove(&column.name).unwrap_or(Value::Null);
            let coerced = column.data_type.coerce(supplied).map_err(|found| {
                ConstraintError::TypeMismatch {
                    column: column.name.clone(),
                    expected: column.data_type.to_string(),
                    found: value_kind(&found),
                }
            })?;
            if column.not_null && coerced.is_null() {
                return Err(ConstraintError::NotNull(column.name.clone()).into());
            }
            resolved.insert(column.name.clone(), coerced);
        }

        for column in &self.columns {
            if !(column.unique || column.primary_key) {
                continue;
            }
            let value = &resolved[&column.name];
            if value.is_null() {
                continue;
            }
            if let Some(index) = self.indexes.get(&column.name) {
                if index.contains(value) {
                    return Err(if column.primary_key {
                        ConstraintError::PrimaryKeyViolation(column.name.clone()).into()
                    } else {
                        ConstraintError::UniqueViolation(column.name.clone()).into()
                    });
                }
            }
        }

        let rowid = self.next_row_id;
        self.next_row_id += 1;
        for (column, value) in &resolved {
            if let Some(index) = self.indexes.get_mut(column) {
                if !value.is_null() {
                    index.insert(value.clone(), rowid);
                }
            }
        }
        self.rows.insert(rowid, resolved);
        debug!(table = %self.name, rowid, "row inserted");
        self.persist()?;
        Ok(rowid)
    }

    /// Applies `assignments` to every row matching `predicate`,
    /// two-phase: every proposed row is validated before any row is
    /// actually mutated, so a constraint failure on a later row leaves
    /// earlier matches untouched.
    pub fn update<F>(&mut self, assignments: &[(String, Value)], predicate: F) -> Result<usize>
    where
        F: Fn(&Row) -> Result<bool>,
    {
        let mut matches: Vec<RowId> = Vec::new();
        for (id, row) in &self.rows {
            if predicate(row)? {
                matches.push(*id);
            }
        }

        let mut proposed: Vec<(RowId, Row)> = Vec::with_capacity(matches.len());
        for rowid in &matches {
            let mut candidate = self.rows[rowid].clone();
            for (column_name, new_value) in assignments {
                let column = self
                    .column(column_name)
                    .ok_or_else(|| ConstraintError::UnknownColumn(column_name.clone()))?;
                let coerced = column.data_type.coerce(new_value.clone()).map_err(|found| {
                    ConstraintError::TypeMismatch {
                        column: column.name.clone(),
                        expected: column.data_type.to_string(),
                        found: value_kind(&found),
                    }
                })?;
                if column.not_null && coerced.is_null() {
                    return Err(ConstraintError::NotNull(column.name.clone()).into());
                }
                candidate.insert(column.name.clone(), coerced);
            }
            proposed.push((*rowid, candidate));
        }

        for column in &self.columns {
            if !(column.unique || column.primary_key) {
                continue;
            }
            for (rowid, candidate) in &proposed {
                let value = &candidate[&column.name];
                if value.is_null() {
                    continue;
                }
                let collides_with_untouched = self
                    .rows
                    .iter()
                    .any(|(other_id, other_row)| {
                        other_id != rowid
                            && !matches.contains(other_id)
                            && other_row.get(&column.name) == Some(value)
                    });
                let collides_with_another_proposed = proposed
                    .iter()
                    .any(|(other_id, other_row)| {
                        other_id != rowid && &other_row[&column.name] == value
                    });
                if collides_with_untouched || collides_with_another_proposed {
                    return Err(if column.primary_key {
                        ConstraintError::PrimaryKeyViolation(column.name.clone()).into()
                    } else {
                        ConstraintError::UniqueViolation(column.name.clone()).into()
                    });
                }
            }
        }

        for (rowid, candidate) in proposed {
            let old = self.rows.insert(rowid, candidate.clone()).expect("row exists");
            for column in &self.columns {
                let Some(index) = self.indexes.get_mut(&column.name) else {
                    continue;
                };
                if let Some(old_value) = old.get(&column.name) {
                    if !old_value.is_null() {
                        index.remove(old_value, rowid);
                    }
                }
                if let Some(new_value) = candidate.get(&column.name) {
                    if !new_value.is_null() {
                        index.insert(new_value.clone(), rowid);
                    }
                }
            }
        }

        debug!(table = %self.name, count = matches.len(), "rows updated");
        if !matches.is_empty() {
            self.persist()?;
        }
        Ok(matches.len())
    }

    /// Removes every row matching `predicate` from the row store and
    /// every index. Returns the number of rows removed.
    pub fn delete<F>(&mut self, predicate: F) -> Result<usize>
    where
        F: Fn(&Row) -> Result<bool>,
    {
        let mut matches: Vec<RowId> = Vec::new();
        for (id, row) in &self.rows {
            if predicate(row)? {
                matches.push(*id);
            }
        }

        for rowid in &matches {
            if let Some(row) = self.rows.remove(rowid) {
                for (column, value) in &row {
                    if value.is_null() {
                        continue;
                    }
                    if let Some(index) = self.indexes.get_mut(column) {
                        index.remove(value, *rowid);
                    }
                }
            }
        }

        debug!(table = %self.name, count = matches.len(), "rows deleted");
        if !matches.is_empty() {
            self.persist()?;
        }
        Ok(matches.len())
    }

    /// Removes this table's persisted document, if any.
    pub fn drop_persisted(&self) -> Result<()> {
        if let Some(path) = &self.path {
            if path.exists() {
                std::fs::remove_file(path).map_err(StorageError::Io)?;
            }
        }
        Ok(())
    }

    fn persist(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let document = TableDocument {
            schema: self.columns.clone(),
            rows: self.rows.clone(),
            next_row_id: self.next_row_id,
        };
        let json = serde_json::to_vec_pretty(&document).map_err(|source| StorageError::Corrupt {
            table: self.name.clone(),
            source,
        })?;
        let tmp_path = path.with_extension("tmp");
        std::fs::write(&tmp_path, json).map_err(StorageError::Io)?;
        std::fs::rename(&tmp_path, path).map_err(StorageError::Io)?;
        tracing::info!(table = %self.name, "table persisted");
        Ok(())
    }

    /// Loads a table from its persisted document. `Err` if the
    /// document is unreadable or fails to parse; callers treat that as
    /// the table simply being absent from the reopened database.
    pub fn load(name: &str, directory: &Path) -> Result<Self> {
        let path = table_path(directory, name);
        let bytes = std::fs::read(&path).map_err(StorageError::Io)?;
        let document: TableDocument =
            serde_json::from_slice(&bytes).map_err(|source| StorageError::Corrupt {
                table: name.to_string(),
                source,
            })?;

        let mut table = Self {
            name: name.to_string(),
            columns: document.schema.clone(),
            rows: BTreeMap::new(),
            indexes: BTreeMap::new(),
            next_row_id: 1,
            path: Some(path),
        };
        for column in &document.schema {
            if column.primary_key || column.unique {
                table.indexes.insert(column.name.clone(), BTreeIndex::new());
            }
        }

        for (rowid, row) in document.rows {
            for (column, value) in &row {
                if let Some(index) = table.indexes.get_mut(column) {
                    if !value.is_null() {
                        index.insert(value.clone(), rowid);
                    }
                }
            }
            table.rows.insert(rowid, row);
        }
        table.next_row_id = document.next_row_id;
        Ok(table)
    }
}

fn value_kind(value: &Value) -> String {
    match value {
        Value::Integer(_) => "INTEGER".to_string(),
        Value::Float(_) => "FLOAT".to_string(),
        Value::Text(_) => "TEXT".to_string(),
        Value::Boolean(_) => "BOOLEAN".to_string(),
        Value::Null => "NULL".to_string(),
    }
}

fn table_path(directory: &Path, name: &str) -> PathBuf {
    directory.join(format!("{name}.json"))
}

#[derive(Debug, Serialize, Deserialize)]
struct TableDocument {
    schema: Vec<Column>,
    rows: BTreeMap<RowId, Row>,
    next_row_id: RowId,
}
