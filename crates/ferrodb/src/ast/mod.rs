//! Abstract Syntax Tree (AST) types for SQL statements.

mod expression;
mod statement;
mod types;

pub use expression::{BinaryOp, Expr, Literal, UnaryOp};
pub use statement::{
    CreateTableStatement, DeleteStatement, DropTableStatement, InsertStatement, JoinClause,
    JoinType, OrderBy, OrderDirection, SelectColumn, SelectStatement, Statement, TableRef,
    UpdateAssignment, UpdateStatement,
};
pub use types::ColumnDef;
