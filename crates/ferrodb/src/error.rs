//! Crate-wide error types.
//!
//! One `thiserror`-derived enum per fault family from the engine's
//! error design: lexing, parsing, planning, constraint violations, and
//! storage. Every fault-carrying variant keeps structured context
//! (position, column, table) as named fields rather than folding
//! everything into a single message string.

use crate::lexer::Span;

/// Errors produced anywhere in the engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed source text.
    #[error("lex error at {span:?}: {message}")]
    Lex {
        /// Description of the malformed input.
        message: String,
        /// Byte span of the offending text.
        span: Span,
    },

    /// Unexpected token or premature end of input.
    #[error("parse error at {span:?}: {message}")]
    Parse {
        /// Description of the problem.
        message: String,
        /// Byte span of the offending token.
        span: Span,
        /// What the parser expected, if known.
        expected: Option<String>,
    },

    /// Unknown table/column, ambiguous reference, or predicate type mismatch.
    #[error("plan error: {0}")]
    Plan(#[from] PlanError),

    /// A declarative constraint was violated.
    #[error("constraint error: {0}")]
    Constraint(#[from] ConstraintError),

    /// I/O failure or document corruption while persisting a table.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Reserved for arithmetic faults; the current dialect has no
    /// arithmetic operators, so this variant is never constructed.
    #[error("runtime error: {0}")]
    Runtime(String),
}

/// Faults raised while planning or executing a statement.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// `FROM`/`JOIN` named a table the database doesn't have.
    #[error("unknown table: {0}")]
    UnknownTable(String),

    /// A projection, predicate, or `ORDER BY` referenced a column that
    /// doesn't exist on the resolved table(s).
    #[error("unknown column: {0}")]
    UnknownColumn(String),

    /// An unqualified column reference matched more than one joined table.
    #[error("ambiguous column reference: {0}")]
    AmbiguousColumn(String),

    /// A predicate compared values whose types can never be equal.
    #[error("type mismatch in predicate on column {column}")]
    TypeMismatch {
        /// The column whose declared type the literal didn't match.
        column: String,
    },
}

/// Declarative constraint violations, matched exhaustively at every
/// row mutation site.
#[derive(Debug, thiserror::Error)]
pub enum ConstraintError {
    /// A value's variant didn't conform to its column's declared type.
    #[error("type mismatch on column {column}: expected {expected}, found {found}")]
    TypeMismatch {
        /// The offending column.
        column: String,
        /// The column's declared type.
        expected: String,
        /// What was supplied instead.
        found: String,
    },

    /// A `not_null` column received `Null`.
    #[error("column {0} is NOT NULL")]
    NotNull(String),

    /// A `unique` column collided with an existing non-null value.
    #[error("unique constraint violated on column {0}")]
    UniqueViolation(String),

    /// A `primary_key` column collided with an existing value.
    #[error("primary key constraint violated on column {0}")]
    PrimaryKeyViolation(String),

    /// A row or assignment referenced a column the table doesn't declare.
    #[error("unknown column: {0}")]
    UnknownColumn(String),

    /// `CREATE TABLE` declared the same column name twice.
    #[error("duplicate column: {0}")]
    DuplicateColumn(String),

    /// `CREATE TABLE` declared more than one `PRIMARY KEY` column.
    #[error("table declares more than one primary key: {0}")]
    MultiplePrimaryKeys(String),

    /// A positional `INSERT` supplied a different number of values
    /// than the table has columns.
    #[error("expected {expected} values, found {found}")]
    ColumnCountMismatch {
        /// Number of declared columns.
        expected: usize,
        /// Number of values supplied.
        found: usize,
    },
}

/// I/O and persistence-document faults.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The underlying filesystem operation failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The persisted document could not be parsed as JSON.
    #[error("document for table {table} is corrupt: {source}")]
    Corrupt {
        /// The table whose document failed to parse.
        table: String,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
