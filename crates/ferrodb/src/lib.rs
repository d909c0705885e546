//! # ferrodb
//!
//! A small, single-process, in-memory relational database engine: a
//! hand-written SQL lexer and recursive-descent parser, a typed
//! storage and constraint layer, a classical B-Tree secondary index,
//! and a predicate-directed query planner and executor.
//!
//! ```rust
//! use ferrodb::Database;
//!
//! let mut db = Database::in_memory();
//! db.execute("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL)").unwrap();
//! db.execute("INSERT INTO users VALUES (1, 'Alice')").unwrap();
//! let result = db.execute("SELECT name FROM users WHERE id = 1").unwrap();
//! assert_eq!(result.rows.len(), 1);
//! ```
//!
//! Persistence is opt-in: [`Database::open`] loads and rewrites one
//! JSON document per table in a directory; [`Database::in_memory`]
//! never touches the filesystem. Nothing here installs a `tracing`
//! subscriber or parses process configuration — wiring those is the
//! embedder's job.

pub mod ast;
pub mod btree;
pub mod database;
pub mod error;
pub mod executor;
pub mod lexer;
pub mod parser;
pub mod result;
pub mod table;
pub mod value;

use std::path::Path;

pub use database::Database;
pub use error::{ConstraintError, Error, PlanError, Result, StorageError};
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::{ParseError, Parser};
pub use result::{QueryResult, StatementKind};
pub use table::{Column, Row};
pub use value::{ColumnType, Value};

impl Database {
    /// Parses and runs one SQL statement.
    ///
    /// This is the crate's entire embedded API surface: parse `sql`,
    /// execute it against this database, and return its result. A
    /// parse or execution failure leaves the database byte-identical
    /// to its state before the call.
    pub fn execute(&mut self, sql: &str) -> Result<QueryResult> {
        let mut parser = Parser::new(sql);
        let statement = parser.parse()?;
        executor::execute(self, statement)
    }
}

/// Opens (or creates) a database rooted at `directory` and returns it
/// ready to accept [`Database::execute`] calls.
pub fn open(directory: impl AsRef<Path>) -> Result<Database> {
    Database::open(directory)
}
