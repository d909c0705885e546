//! SQL parser.
//!
//! A hand-written recursive-descent parser with Pratt expression parsing
//! for predicates, covering exactly the statements and clauses this
//! engine supports:
//!
//! | Statement      | Clauses |
//! |----------------|---------|
//! | `SELECT`       | projection (`*`, `t.*`, column list), `FROM`, `JOIN ... ON`, `WHERE`, `ORDER BY`, `LIMIT` |
//! | `INSERT`       | optional column list, `VALUES (...), (...)` |
//! | `UPDATE`       | `SET`, `WHERE` |
//! | `DELETE`       | `WHERE` |
//! | `CREATE TABLE` | column declarations with `PRIMARY KEY` / `UNIQUE` / `NOT NULL` |
//! | `DROP TABLE`   | |
//!
//! Predicates are a tree of comparisons (`= <> != < <= > >=`) joined by
//! `AND`/`OR` and optionally negated with `NOT`; there is no arithmetic,
//! no subqueries, and no aggregation, matching the restricted dialect
//! this crate implements.

mod error;
mod parser;
mod pratt;

pub use error::ParseError;
pub use parser::Parser;
