//! SQL Parser implementation.

use super::error::ParseError;
use super::pratt::{infix_binding_power, prefix_binding_power, token_to_binary_op};
use crate::ast::{
    ColumnDef, CreateTableStatement, DeleteStatement, DropTableStatement, Expr, InsertStatement,
    JoinClause, JoinType, Literal, OrderBy, OrderDirection, SelectColumn, SelectStatement,
    Statement, TableRef, UpdateAssignment, UpdateStatement,
};
use crate::lexer::{Keyword, Lexer, Span, Token, TokenKind};
use crate::value::ColumnType;

/// Recursive-descent SQL parser with Pratt expression parsing for
/// predicates.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for the given input.
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token();
        Self { lexer, current }
    }

    /// Parses exactly one statement, consuming an optional trailing `;`.
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` if the input is not a valid statement, or
    /// if trailing tokens remain after it.
    pub fn parse(&mut self) -> Result<Statement, ParseError> {
        let stmt = self.parse_statement()?;
        if matches!(self.current.kind, TokenKind::Semicolon) {
            self.advance();
        }
        if !self.current.is_eof() {
            return Err(ParseError::unexpected(
                "end of input",
                self.current.kind.clone(),
                self.current.span,
            ));
        }
        Ok(stmt)
    }

    fn advance(&mut self) -> Token {
        let next = self.lexer.next_token();
        std::mem::replace(&mut self.current, next)
    }

    fn expect_keyword(&mut self, kw: Keyword) -> Result<(), ParseError> {
        if self.current.as_keyword() == Some(kw) {
            self.advance();
            Ok(())
        } else {
            Err(ParseError::unexpected(
                kw.as_str(),
                self.current.kind.clone(),
                self.current.span,
            ))
        }
    }

    fn check_keyword(&self, kw: Keyword) -> bool {
        self.current.as_keyword() == Some(kw)
    }

    fn expect_token(&mut self, kind: &TokenKind) -> Result<(), ParseError> {
        if &self.current.kind == kind {
            self.advance();
            Ok(())
        } else {
            Err(ParseError::unexpected(
                format!("{kind:?}"),
                self.current.kind.clone(),
                self.current.span,
            ))
        }
    }

    fn expect_identifier(&mut self) -> Result<String, ParseError> {
        match self.current.kind.clone() {
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(name)
            }
            other => Err(ParseError::unexpected(
                "an identifier",
                other,
                self.current.span,
            )),
        }
    }

    fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        match self.current.as_keyword() {
            Some(Keyword::Select) => Ok(Statement::Select(self.parse_select_statement()?)),
            Some(Keyword::Insert) => Ok(Statement::Insert(self.parse_insert_statement()?)),
            Some(Keyword::Update) => Ok(Statement::Update(self.parse_update_statement()?)),
            Some(Keyword::Delete) => Ok(Statement::Delete(self.parse_delete_statement()?)),
            Some(Keyword::Create) => Ok(Statement::CreateTable(self.parse_create_table()?)),
            Some(Keyword::Drop) => Ok(Statement::DropTable(self.parse_drop_table()?)),
            _ => {
                if self.current.is_eof() {
                    Err(ParseError::unexpected_eof(
                        "SELECT, INSERT, UPDATE, DELETE, CREATE TABLE, or DROP TABLE",
                        self.current.span,
                    ))
                } else {
                    Err(ParseError::unexpected(
                        "SELECT, INSERT, UPDATE, DELETE, CREATE TABLE, or DROP TABLE",
                        self.current.kind.clone(),
                        self.current.span,
                    ))
                }
            }
        }
    }

    // ---- CREATE TABLE / DROP TABLE ----------------------------------

    fn parse_create_table(&mut self) -> Result<CreateTableStatement, ParseError> {
        self.expect_keyword(Keyword::Create)?;
        self.expect_keyword(Keyword::Table)?;
        let name = self.expect_identifier()?;
        self.expect_token(&TokenKind::LeftParen)?;

        let mut columns = vec![self.parse_column_def()?];
        while matches!(self.current.kind, TokenKind::Comma) {
            self.advance();
            columns.push(self.parse_column_def()?);
        }
        self.expect_token(&TokenKind::RightParen)?;

        Ok(CreateTableStatement { name, columns })
    }

    fn parse_column_def(&mut self) -> Result<ColumnDef, ParseError> {
        let name = self.expect_identifier()?;
        let data_type = match self.current.as_keyword() {
            Some(Keyword::Integer) => ColumnType::Integer,
            Some(Keyword::Text) => ColumnType::Text,
            Some(Keyword::Float) => ColumnType::Float,
            Some(Keyword::Boolean) => ColumnType::Boolean,
            _ => {
                return Err(ParseError::unexpected(
                    "INTEGER, TEXT, FLOAT, or BOOLEAN",
                    self.current.kind.clone(),
                    self.current.span,
                ));
            }
        };
        self.advance();

        let mut column = ColumnDef::new(name, data_type);
        loop {
            match self.current.as_keyword() {
                Some(Keyword::Primary) => {
                    self.advance();
                    self.expect_keyword(Keyword::Key)?;
                    column = column.primary_key();
                }
                Some(Keyword::Unique) => {
                    self.advance();
                    column = column.unique();
                }
                Some(Keyword::Not) => {
                    self.advance();
                    self.expect_keyword(Keyword::Null)?;
                    column = column.not_null();
                }
                _ => break,
            }
        }
        Ok(column)
    }

    fn parse_drop_table(&mut self) -> Result<DropTableStatement, ParseError> {
        self.expect_keyword(Keyword::Drop)?;
        self.expect_keyword(Keyword::Table)?;
        let name = self.expect_identifier()?;
        Ok(DropTableStatement { name })
    }

    // ---- INSERT ------------------------------------------------------

    fn parse_insert_statement(&mut self) -> Result<InsertStatement, ParseError> {
        self.expect_keyword(Keyword::Insert)?;
        self.expect_keyword(Keyword::Into)?;
        let table = self.expect_identifier()?;

        let mut columns = Vec::new();
        if matches!(self.current.kind, TokenKind::LeftParen) {
            self.advance();
            columns.push(self.expect_identifier()?);
            while matches!(self.current.kind, TokenKind::Comma) {
                self.advance();
                columns.push(self.expect_identifier()?);
            }
            self.expect_token(&TokenKind::RightParen)?;
        }

        self.expect_keyword(Keyword::Values)?;
        let mut values = vec![self.parse_value_tuple()?];
        while matches!(self.current.kind, TokenKind::Comma) {
            self.advance();
            values.push(self.parse_value_tuple()?);
        }

        Ok(InsertStatement {
            table,
            columns,
            values,
        })
    }

    fn parse_value_tuple(&mut self) -> Result<Vec<Expr>, ParseError> {
        self.expect_token(&TokenKind::LeftParen)?;
        let mut values = vec![self.parse_expr(0)?];
        while matches!(self.current.kind, TokenKind::Comma) {
            self.advance();
            values.push(self.parse_expr(0)?);
        }
        self.expect_token(&TokenKind::RightParen)?;
        Ok(values)
    }

    // ---- UPDATE / DELETE ----------------------------------------------

    fn parse_update_statement(&mut self) -> Result<UpdateStatement, ParseError> {
        self.expect_keyword(Keyword::Update)?;
        let table = self.expect_identifier()?;
        self.expect_keyword(Keyword::Set)?;

        let mut assignments = vec![self.parse_assignment()?];
        while matches!(self.current.kind, TokenKind::Comma) {
            self.advance();
            assignments.push(self.parse_assignment()?);
        }

        let where_clause = self.parse_optional_where()?;

        Ok(UpdateStatement {
            table,
            assignments,
            where_clause,
        })
    }

    fn parse_assignment(&mut self) -> Result<UpdateAssignment, ParseError> {
        let column = self.expect_identifier()?;
        self.expect_token(&TokenKind::Eq)?;
        let value = self.parse_expr(0)?;
        Ok(UpdateAssignment { column, value })
    }

    fn parse_delete_statement(&mut self) -> Result<DeleteStatement, ParseError> {
        self.expect_keyword(Keyword::Delete)?;
        self.expect_keyword(Keyword::From)?;
        let table = self.expect_identifier()?;
        let where_clause = self.parse_optional_where()?;
        Ok(DeleteStatement { table, where_clause })
    }

    // ---- SELECT --------------------------------------------------------

    fn parse_select_statement(&mut self) -> Result<SelectStatement, ParseError> {
        self.expect_keyword(Keyword::Select)?;

        let mut columns = vec![self.parse_select_column()?];
        while matches!(self.current.kind, TokenKind::Comma) {
            self.advance();
            columns.push(self.parse_select_column()?);
        }

        self.expect_keyword(Keyword::From)?;
        let from = self.parse_table_ref()?;

        let mut joins = Vec::new();
        loop {
            let join_type = if self.check_keyword(Keyword::Inner) {
                self.advance();
                self.expect_keyword(Keyword::Join)?;
                JoinType::Inner
            } else if self.check_keyword(Keyword::Join) {
                self.advance();
                JoinType::Inner
            } else {
                break;
            };
            let table = self.parse_table_ref()?;
            self.expect_keyword(Keyword::On)?;
            let on = self.parse_expr(0)?;
            joins.push(JoinClause {
                join_type,
                table,
                on,
            });
        }

        let where_clause = self.parse_optional_where()?;

        let mut order_by = Vec::new();
        if self.check_keyword(Keyword::Order) {
            self.advance();
            self.expect_keyword(Keyword::By)?;
            order_by.push(self.parse_order_item()?);
            while matches!(self.current.kind, TokenKind::Comma) {
                self.advance();
                order_by.push(self.parse_order_item()?);
            }
        }

        let limit = if self.check_keyword(Keyword::Limit) {
            self.advance();
            Some(self.parse_limit_value()?)
        } else {
            None
        };

        Ok(SelectStatement {
            columns,
            from,
            joins,
            where_clause,
            order_by,
            limit,
        })
    }

    fn parse_limit_value(&mut self) -> Result<u64, ParseError> {
        match self.current.kind.clone() {
            TokenKind::Integer(n) if n >= 0 => {
                self.advance();
                Ok(n as u64)
            }
            other => Err(ParseError::unexpected(
                "a non-negative integer",
                other,
                self.current.span,
            )),
        }
    }

    fn parse_order_item(&mut self) -> Result<OrderBy, ParseError> {
        let expr = self.parse_column_ref()?;
        let direction = if self.check_keyword(Keyword::Asc) {
            self.advance();
            OrderDirection::Asc
        } else if self.check_keyword(Keyword::Desc) {
            self.advance();
            OrderDirection::Desc
        } else {
            OrderDirection::Asc
        };
        Ok(OrderBy { expr, direction })
    }

    fn parse_optional_where(&mut self) -> Result<Option<Expr>, ParseError> {
        if self.check_keyword(Keyword::Where) {
            self.advance();
            Ok(Some(self.parse_expr(0)?))
        } else {
            Ok(None)
        }
    }

    fn parse_table_ref(&mut self) -> Result<TableRef, ParseError> {
        let name = self.expect_identifier()?;
        let mut table_ref = TableRef::new(name);
        if let TokenKind::Identifier(alias) = self.current.kind.clone() {
            self.advance();
            table_ref = table_ref.with_alias(alias);
        }
        Ok(table_ref)
    }

    fn parse_select_column(&mut self) -> Result<SelectColumn, ParseError> {
        if matches!(self.current.kind, TokenKind::Star) {
            self.advance();
            return Ok(SelectColumn {
                expr: Expr::Wildcard { table: None },
            });
        }
        Ok(SelectColumn {
            expr: self.parse_column_ref()?,
        })
    }

    /// Parses a (possibly qualified) column reference, or `t.*`.
    fn parse_column_ref(&mut self) -> Result<Expr, ParseError> {
        let first = self.expect_identifier()?;
        if matches!(self.current.kind, TokenKind::Dot) {
            self.advance();
            if matches!(self.current.kind, TokenKind::Star) {
                self.advance();
                return Ok(Expr::Wildcard { table: Some(first) });
            }
            let span = self.current.span;
            let name = self.expect_identifier()?;
            return Ok(Expr::Column {
                table: Some(first),
                name,
                span,
            });
        }
        Ok(Expr::column(first))
    }

    // ---- Expressions (Pratt) -------------------------------------------

    fn parse_expr(&mut self, min_bp: u8) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_prefix()?;

        loop {
            let Some((left_bp, right_bp)) = infix_binding_power(&self.current.kind) else {
                break;
            };
            if left_bp < min_bp {
                break;
            }
            let op_kind = self.current.kind.clone();
            self.advance();
            let op = token_to_binary_op(&op_kind).expect("infix token must map to a BinaryOp");
            let rhs = self.parse_expr(right_bp)?;
            lhs = Expr::Binary {
                left: Box::new(lhs),
                op,
                right: Box::new(rhs),
            };
        }

        Ok(lhs)
    }

    fn parse_prefix(&mut self) -> Result<Expr, ParseError> {
        if prefix_binding_power(&self.current.kind).is_none() {
            return Err(ParseError::unexpected(
                "an expression",
                self.current.kind.clone(),
                self.current.span,
            ));
        }

        match self.current.kind.clone() {
            TokenKind::Keyword(Keyword::Not) => {
                self.advance();
                let operand = self.parse_expr(3)?;
                Ok(Expr::Unary {
                    op: crate::ast::UnaryOp::Not,
                    operand: Box::new(operand),
                })
            }
            TokenKind::Integer(n) => {
                self.advance();
                Ok(Expr::Literal(Literal::Integer(n)))
            }
            TokenKind::Float(f) => {
                self.advance();
                Ok(Expr::Literal(Literal::Float(f)))
            }
            TokenKind::String(s) => {
                self.advance();
                Ok(Expr::Literal(Literal::String(s)))
            }
            TokenKind::Keyword(Keyword::True) => {
                self.advance();
                Ok(Expr::Literal(Literal::Boolean(true)))
            }
            TokenKind::Keyword(Keyword::False) => {
                self.advance();
                Ok(Expr::Literal(Literal::Boolean(false)))
            }
            TokenKind::Keyword(Keyword::Null) => {
                self.advance();
                Ok(Expr::Literal(Literal::Null))
            }
            TokenKind::Identifier(_) => self.parse_column_ref(),
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.parse_expr(0)?;
                self.expect_token(&TokenKind::RightParen)?;
                Ok(expr)
            }
            other => Err(ParseError::unexpected(
                "an expression",
                other,
                self.current.span,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::BinaryOp;

    fn parse(sql: &str) -> Statement {
        Parser::new(sql).parse().expect("statement should parse")
    }

    #[test]
    fn test_parse_create_table() {
        let stmt = parse("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL)");
        let Statement::CreateTable(c) = stmt else {
            panic!("expected CreateTable");
        };
        assert_eq!(c.name, "users");
        assert_eq!(c.columns.len(), 2);
        assert!(c.columns[0].primary_key);
        assert!(c.columns[1].not_null);
    }

    #[test]
    fn test_parse_drop_table() {
        let stmt = parse("DROP TABLE users");
        assert!(matches!(stmt, Statement::DropTable(d) if d.name == "users"));
    }

    #[test]
    fn test_parse_insert_positional() {
        let stmt = parse("INSERT INTO users VALUES (1, 'alice')");
        let Statement::Insert(i) = stmt else {
            panic!("expected Insert");
        };
        assert!(i.columns.is_empty());
        assert_eq!(i.values.len(), 1);
        assert_eq!(i.values[0].len(), 2);
    }

    #[test]
    fn test_parse_insert_with_columns() {
        let stmt = parse("INSERT INTO users (id, name) VALUES (1, 'alice')");
        let Statement::Insert(i) = stmt else {
            panic!("expected Insert");
        };
        assert_eq!(i.columns, vec!["id".to_string(), "name".to_string()]);
    }

    #[test]
    fn test_parse_select_wildcard() {
        let stmt = parse("SELECT * FROM users WHERE id = 1");
        let Statement::Select(s) = stmt else {
            panic!("expected Select");
        };
        assert_eq!(s.columns.len(), 1);
        assert!(matches!(s.columns[0].expr, Expr::Wildcard { table: None }));
        assert!(s.where_clause.is_some());
    }

    #[test]
    fn test_parse_select_join() {
        let stmt = parse("SELECT a.n, b.v FROM a JOIN b ON a.id = b.aid ORDER BY b.v ASC");
        let Statement::Select(s) = stmt else {
            panic!("expected Select");
        };
        assert_eq!(s.joins.len(), 1);
        assert_eq!(s.order_by.len(), 1);
        assert_eq!(s.order_by[0].direction, OrderDirection::Asc);
    }

    #[test]
    fn test_parse_select_limit() {
        let stmt = parse("SELECT * FROM users LIMIT 5");
        let Statement::Select(s) = stmt else {
            panic!("expected Select");
        };
        assert_eq!(s.limit, Some(5));
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let stmt = parse("SELECT * FROM t WHERE a = 1 OR b = 2 AND c = 3");
        let Statement::Select(s) = stmt else {
            panic!("expected Select");
        };
        let Expr::Binary { op, right, .. } = s.where_clause.unwrap() else {
            panic!("expected Binary");
        };
        assert_eq!(op, BinaryOp::Or);
        assert!(matches!(*right, Expr::Binary { op: BinaryOp::And, .. }));
    }

    #[test]
    fn test_parse_update() {
        let stmt = parse("UPDATE users SET name = 'bob' WHERE id = 1");
        let Statement::Update(u) = stmt else {
            panic!("expected Update");
        };
        assert_eq!(u.assignments.len(), 1);
        assert!(u.where_clause.is_some());
    }

    #[test]
    fn test_parse_delete() {
        let stmt = parse("DELETE FROM users WHERE id = 1");
        assert!(matches!(stmt, Statement::Delete(d) if d.table == "users"));
    }

    #[test]
    fn test_not_predicate() {
        let stmt = parse("SELECT * FROM t WHERE NOT active = TRUE");
        let Statement::Select(s) = stmt else {
            panic!("expected Select");
        };
        assert!(matches!(s.where_clause, Some(Expr::Unary { .. })));
    }

    #[test]
    fn test_trailing_semicolon_is_optional() {
        parse("SELECT * FROM users;");
        parse("SELECT * FROM users");
    }

    #[test]
    fn test_trailing_garbage_is_an_error() {
        let result = Parser::new("SELECT * FROM users EXTRA").parse();
        assert!(result.is_err());
    }

    #[test]
    fn test_unterminated_string_surfaces_as_lex_error() {
        let err = Parser::new("SELECT * FROM t WHERE name = 'oops").parse().unwrap_err();
        let converted: crate::error::Error = err.into();
        assert!(matches!(converted, crate::error::Error::Lex { .. }));
    }

    #[test]
    fn test_unknown_character_surfaces_as_lex_error() {
        let err = Parser::new("SELECT * FROM t WHERE a = 1 # 2").parse().unwrap_err();
        let converted: crate::error::Error = err.into();
        assert!(matches!(converted, crate::error::Error::Lex { .. }));
    }
}
