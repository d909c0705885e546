//! A named collection of tables with on-disk lifecycle.
//!
//! Table name lookups are case-insensitive; the casing a `CREATE TABLE`
//! statement declared is preserved for display and for the persisted
//! document's file name.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{ConstraintError, PlanError, Result};
use crate::table::{Column, Table};

/// An open, in-memory database backed by a directory of JSON documents.
#[derive(Debug)]
pub struct Database {
    directory: Option<PathBuf>,
    tables: BTreeMap<String, Table>,
}

impl Database {
    /// Opens (or creates) a database rooted at `directory`, loading
    /// every `*.json` document found there. A document that fails to
    /// parse is skipped with a warning rather than aborting the open.
    pub fn open(directory: impl AsRef<Path>) -> Result<Self> {
        let directory = directory.as_ref().to_path_buf();
        std::fs::create_dir_all(&directory).map_err(crate::error::StorageError::Io)?;

        let mut tables = BTreeMap::new();
        for entry in std::fs::read_dir(&directory).map_err(crate::error::StorageError::Io)? {
            let entry = entry.map_err(crate::error::StorageError::Io)?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match Table::load(stem, &directory) {
                Ok(table) => {
                    info!(table = stem, "table loaded");
                    tables.insert(stem.to_lowercase(), table);
                }
                Err(err) => {
                    warn!(table = stem, error = %err, "skipping table with corrupt document");
                }
            }
        }

        Ok(Self {
            directory: Some(directory),
            tables,
        })
    }

    /// Creates a purely in-memory database with no backing directory.
    /// Mutations never touch the filesystem.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            directory: None,
            tables: BTreeMap::new(),
        }
    }

    /// Releases the database. Persistence has already happened
    /// per-mutation, so this is a no-op beyond dropping in-memory
    /// state; provided to match the embedded API surface.
    pub fn close(self) {}

    /// Table names, in a database-defined order (declaration order is
    /// not preserved; this returns case-preserved names sorted by the
    /// lowercase lookup key).
    #[must_use]
    pub fn list_tables(&self) -> Vec<&str> {
        self.tables.values().map(Table::name).collect()
    }

    /// The declared columns of `table`, or `None` if it doesn't exist.
    #[must_use]
    pub fn schema(&self, table: &str) -> Option<&[Column]> {
        self.get(table).map(Table::columns)
    }

    /// Looks up a table by name, case-insensitively.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Table> {
        self.tables.get(&name.to_lowercase())
    }

    /// Looks up a table by name, case-insensitively, for mutation.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.tables.get_mut(&name.to_lowercase())
    }

    /// Whether a table named `name` exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(&name.to_lowercase())
    }

    /// Creates a new table. Rejects a duplicate name (case-insensitive)
    /// and duplicate column names within the declaration.
    pub fn create_table(&mut self, name: &str, columns: Vec<Column>) -> Result<()> {
        let key = name.to_lowercase();
        if self.tables.contains_key(&key) {
            return Err(ConstraintError::UniqueViolation(name.to_string()).into());
        }
        let mut seen = std::collections::HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.clone()) {
                return Err(ConstraintError::DuplicateColumn(column.name.clone()).into());
            }
        }
        if let Some(second) = columns
            .iter()
            .filter(|c| c.primary_key)
            .nth(1)
        {
            return Err(ConstraintError::MultiplePrimaryKeys(second.name.clone()).into());
        }
        let table = Table::new(name, columns, self.directory.as_deref());
        info!(table = name, "table created");
        self.tables.insert(key, table);
        Ok(())
    }

    /// Drops `name`, removing both its in-memory state and its
    /// persisted document.
    pub fn drop_table(&mut self, name: &str) -> Result<()> {
        let key = name.to_lowercase();
        let Some(table) = self.tables.remove(&key) else {
            return Err(PlanError::UnknownTable(name.to_string()).into());
        };
        table.drop_persisted()?;
        info!(table = name, "table dropped");
        Ok(())
    }
}
