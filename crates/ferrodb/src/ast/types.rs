//! `CREATE TABLE` column declarations.

use crate::value::ColumnType;

/// A single column declaration inside a `CREATE TABLE` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    /// Column name.
    pub name: String,
    /// Declared type.
    pub data_type: ColumnType,
    /// Whether `PRIMARY KEY` was declared on this column.
    pub primary_key: bool,
    /// Whether `UNIQUE` was declared on this column.
    pub unique: bool,
    /// Whether `NOT NULL` was declared on this column.
    pub not_null: bool,
}

impl ColumnDef {
    /// Creates a bare column declaration with no constraints.
    #[must_use]
    pub fn new(name: impl Into<String>, data_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            data_type,
            primary_key: false,
            unique: false,
            not_null: false,
        }
    }

    /// Marks this column `PRIMARY KEY`, which implies `UNIQUE` and `NOT NULL`.
    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.unique = true;
        self.not_null = true;
        self
    }

    /// Marks this column `UNIQUE`.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Marks this column `NOT NULL`.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }
}

impl std::fmt::Display for ColumnDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.name, self.data_type)?;
        if self.primary_key {
            write!(f, " PRIMARY KEY")?;
        } else {
            if self.unique {
                write!(f, " UNIQUE")?;
            }
            if self.not_null {
                write!(f, " NOT NULL")?;
            }
        }
        Ok(())
    }
}
