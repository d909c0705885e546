//! The shape of a statement's outcome.

use crate::value::Value;

/// Which kind of statement produced a [`QueryResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// `SELECT`.
    Select,
    /// `INSERT`.
    Insert,
    /// `UPDATE`.
    Update,
    /// `DELETE`.
    Delete,
    /// `CREATE TABLE`.
    CreateTable,
    /// `DROP TABLE`.
    DropTable,
}

/// The result of executing one statement.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    /// Which statement produced this result.
    pub kind: StatementKind,
    /// Column names, in projection order. Empty for non-`SELECT`
    /// statements.
    pub columns: Vec<String>,
    /// Row tuples, each parallel to `columns`. Empty for non-`SELECT`
    /// statements.
    pub rows: Vec<Vec<Value>>,
    /// Number of rows created, matched, or removed by a mutating
    /// statement. `0` for `SELECT`, `CREATE TABLE`, and `DROP TABLE`.
    pub affected: usize,
}

impl QueryResult {
    /// Builds a `SELECT` result.
    #[must_use]
    pub fn select(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            kind: StatementKind::Select,
            columns,
            rows,
            affected: 0,
        }
    }

    /// Builds a result for a row-affecting statement (`INSERT`,
    /// `UPDATE`, `DELETE`).
    #[must_use]
    pub fn mutation(kind: StatementKind, affected: usize) -> Self {
        Self {
            kind,
            columns: Vec::new(),
            rows: Vec::new(),
            affected,
        }
    }

    /// Builds a result for a schema-affecting statement (`CREATE
    /// TABLE`, `DROP TABLE`).
    #[must_use]
    pub fn schema_change(kind: StatementKind) -> Self {
        Self {
            kind,
            columns: Vec::new(),
            rows: Vec::new(),
            affected: 0,
        }
    }
}
