//! Planner and executor: turns a parsed [`Statement`] into a
//! [`QueryResult`] against a [`Database`].
//!
//! Index selection is predicate-directed rather than cost-based: for a
//! table's `WHERE` (or `ON`) clause, the outermost conjunction is split
//! on `AND`; at most one equality or single-sided range comparison on
//! an indexed column is chosen as the access path, and everything else
//! is applied as a filter afterward. A disjunction anywhere in a
//! conjunct simply can't supply a usable comparison, so that conjunct
//! falls back to being filtered rather than probed.

use std::cmp::Ordering;

use crate::ast::{
    BinaryOp, Expr, Literal, OrderBy, OrderDirection, SelectColumn, SelectStatement, Statement,
    UnaryOp,
};
use crate::btree::RowId;
use crate::database::Database;
use crate::error::{ConstraintError, PlanError, Result};
use crate::result::{QueryResult, StatementKind};
use crate::table::{Row, Table};
use crate::value::Value;

/// Executes one parsed statement against `db`.
pub fn execute(db: &mut Database, statement: Statement) -> Result<QueryResult> {
    match statement {
        Statement::Select(select) => execute_select(db, &select),
        Statement::Insert(insert) => execute_insert(db, &insert),
        Statement::Update(update) => execute_update(db, &update),
        Statement::Delete(delete) => execute_delete(db, &delete),
        Statement::CreateTable(create) => execute_create_table(db, &create),
        Statement::DropTable(drop) => execute_drop_table(db, &drop),
    }
}

/// A row bound to the table alias it came from, used while evaluating
/// expressions across a join.
struct BoundRow<'a> {
    alias: &'a str,
    row: &'a Row,
}

fn execute_select(db: &Database, select: &SelectStatement) -> Result<QueryResult> {
    let driving = db
        .get(&select.from.name)
        .ok_or_else(|| PlanError::UnknownTable(select.from.name.clone()))?;
    let driving_alias = select.from.display_name();

    let conjuncts = select
        .where_clause
        .as_ref()
        .map(split_conjuncts)
        .unwrap_or_default();
    let probe = choose_probe(&conjuncts, driving_alias, driving);
    let driving_ids = match &probe {
        Some(IndexProbe { column, kind }) => {
            let index = driving.index(column).expect("probe only selects an indexed column");
            match kind {
                ProbeKind::Equal(value) => index.find_equal(value).to_vec(),
                ProbeKind::Range {
                    lo,
                    hi,
                    lo_inclusive,
                    hi_inclusive,
                } => index.find_range(lo.as_ref(), hi.as_ref(), *lo_inclusive, *hi_inclusive),
            }
        }
        None => driving.scan().map(|(id, _)| id).collect(),
    };

    let mut resolved_tables = Vec::with_capacity(1 + select.joins.len());
    resolved_tables.push((driving_alias.to_string(), driving));
    for join in &select.joins {
        let table = db
            .get(&join.table.name)
            .ok_or_else(|| PlanError::UnknownTable(join.table.name.clone()))?;
        resolved_tables.push((join.table.display_name().to_string(), table));
    }

    let mut rows_so_far: Vec<Vec<(String, RowId)>> = driving_ids
        .into_iter()
        .map(|id| vec![(driving_alias.to_string(), id)])
        .collect();

    for join in &select.joins {
        let inner_alias = join.table.display_name().to_string();
        let inner_table = db
            .get(&join.table.name)
            .ok_or_else(|| PlanError::UnknownTable(join.table.name.clone()))?;
        let mut next = Vec::new();
        for combo in rows_so_far {
            let bound = bind_rows(&resolved_tables, &combo)?;
            let candidate_ids = join_candidates(inner_table, &inner_alias, &join.on, &bound)?;
            for inner_id in candidate_ids {
                let mut extended = combo.clone();
                extended.push((inner_alias.clone(), inner_id));
                let ctx = bind_rows(&resolved_tables, &extended)?;
                if eval_bool(&ctx, &join.on)?.unwrap_or(false) {
                    next.push(extended);
                }
            }
        }
        rows_so_far = next;
    }

    let mut matched = Vec::with_capacity(rows_so_far.len());
    for combo in rows_so_far {
        let ctx = bind_rows(&resolved_tables, &combo)?;
        let keep = match &select.where_clause {
            Some(expr) => eval_bool(&ctx, expr)?.unwrap_or(false),
            None => true,
        };
        if keep {
            matched.push(combo);
        }
    }

    if !select.order_by.is_empty() {
        sort_combos(&mut matched, &resolved_tables, &select.order_by)?;
    }

    if let Some(limit) = select.limit {
        matched.truncate(limit as usize);
    }

    let has_joins = !select.joins.is_empty();
    let column_names = projection_columns(&select.columns, &resolved_tables, has_joins)?;
    let mut out_rows = Vec::with_capacity(matched.len());
    for combo in &matched {
        let ctx = bind_rows(&resolved_tables, combo)?;
        out_rows.push(project_row(&select.columns, &ctx)?);
    }

    Ok(QueryResult::select(column_names, out_rows))
}

fn bind_rows<'a>(
    resolved_tables: &'a [(String, &'a Table)],
    combo: &'a [(String, RowId)],
) -> Result<Vec<BoundRow<'a>>> {
    let mut bound = Vec::with_capacity(combo.len());
    for (alias, rowid) in combo {
        let table = resolved_tables
            .iter()
            .find(|(a, _)| a == alias)
            .map(|(_, t)| *t)
            .ok_or_else(|| PlanError::UnknownTable(alias.clone()))?;
        let row = table
            .row(*rowid)
            .ok_or_else(|| PlanError::UnknownColumn(format!("stale row reference in {alias}")))?;
        bound.push(BoundRow { alias, row });
    }
    Ok(bound)
}

/// Picks row ids on `inner_table` for one outer row, using an index
/// when the `ON` clause is a bare equality between a column of
/// `inner_table` and a column resolvable in `outer`.
fn join_candidates(
    inner_table: &Table,
    inner_alias: &str,
    on: &Expr,
    outer: &[BoundRow<'_>],
) -> Result<Vec<RowId>> {
    if let Expr::Binary {
        left,
        op: BinaryOp::Eq,
        right,
    } = on
    {
        if let Some(ids) = try_equi_join(inner_table, inner_alias, left, right, outer)
            .or_else(|| try_equi_join(inner_table, inner_alias, right, left, outer))
        {
            return Ok(ids);
        }
    }
    Ok(inner_table.scan().map(|(id, _)| id).collect())
}

fn try_equi_join(
    inner_table: &Table,
    inner_alias: &str,
    inner_side: &Expr,
    outer_side: &Expr,
    outer: &[BoundRow<'_>],
) -> Option<Vec<RowId>> {
    let Expr::Column { table, name, .. } = inner_side else {
        return None;
    };
    if let Some(t) = table {
        if t != inner_alias {
            return None;
        }
    }
    if !inner_table.has_index(name) {
        return None;
    }
    let outer_value = eval_value(outer, outer_side).ok()?;
    if outer_value.is_null() {
        return Some(Vec::new());
    }
    Some(inner_table.index(name)?.find_equal(&outer_value).to_vec())
}

fn sort_combos(
    combos: &mut [Vec<(String, RowId)>],
    resolved_tables: &[(String, &Table)],
    order_by: &[OrderBy],
) -> Result<()> {
    let mut keyed: Vec<(Vec<Value>, Vec<(String, RowId)>)> = Vec::with_capacity(combos.len());
    for combo in combos.iter() {
        let ctx = bind_rows(resolved_tables, combo)?;
        let mut key = Vec::with_capacity(order_by.len());
        for ob in order_by {
            key.push(eval_value(&ctx, &ob.expr)?);
        }
        keyed.push((key, combo.clone()));
    }
    keyed.sort_by(|a, b| {
        for (i, ob) in order_by.iter().enumerate() {
            let ord = a.0[i].order_key(&b.0[i]);
            let ord = match ob.direction {
                OrderDirection::Asc => ord,
                OrderDirection::Desc => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
    for (slot, (_, combo)) in combos.iter_mut().zip(keyed) {
        *slot = combo;
    }
    Ok(())
}

fn projection_columns(
    columns: &[SelectColumn],
    resolved_tables: &[(String, &Table)],
    has_joins: bool,
) -> Result<Vec<String>> {
    let mut out = Vec::new();
    for select_column in columns {
        match &select_column.expr {
            Expr::Wildcard { table: None } => {
                for (alias, table) in resolved_tables {
                    for column in table.columns() {
                        out.push(qualify(alias, &column.name, has_joins));
                    }
                }
            }
            Expr::Wildcard { table: Some(alias) } => {
                let (_, table) = resolved_tables
                    .iter()
                    .find(|(a, _)| a == alias)
                    .ok_or_else(|| PlanError::UnknownTable(alias.clone()))?;
                for column in table.columns() {
                    out.push(qualify(alias, &column.name, has_joins));
                }
            }
            Expr::Column { table, name, .. } => {
                let alias = resolve_column_owner(resolved_tables, table.as_deref(), name)?;
                out.push(qualify(&alias, name, has_joins));
            }
            other => {
                return Err(
                    PlanError::UnknownColumn(format!("unsupported projection expression: {other}"))
                        .into(),
                )
            }
        }
    }
    Ok(out)
}

fn qualify(alias: &str, name: &str, has_joins: bool) -> String {
    if has_joins {
        format!("{alias}.{name}")
    } else {
        name.to_string()
    }
}

fn project_row(columns: &[SelectColumn], ctx: &[BoundRow<'_>]) -> Result<Vec<Value>> {
    let mut out = Vec::new();
    for select_column in columns {
        match &select_column.expr {
            Expr::Wildcard { table: None } => {
                for bound in ctx {
                    for (_, value) in bound.row {
                        out.push(value.clone());
                    }
                }
            }
            Expr::Wildcard { table: Some(alias) } => {
                let bound = ctx
                    .iter()
                    .find(|b| b.alias == alias)
                    .ok_or_else(|| PlanError::UnknownTable(alias.clone()))?;
                for (_, value) in bound.row {
                    out.push(value.clone());
                }
            }
            expr => out.push(eval_value(ctx, expr)?),
        }
    }
    Ok(out)
}

fn resolve_column_owner(
    resolved_tables: &[(String, &Table)],
    qualifier: Option<&str>,
    name: &str,
) -> Result<String> {
    if let Some(qualifier) = qualifier {
        let (alias, table) = resolved_tables
            .iter()
            .find(|(a, _)| a == qualifier)
            .ok_or_else(|| PlanError::UnknownTable(qualifier.to_string()))?;
        if table.column(name).is_none() {
            return Err(PlanError::UnknownColumn(format!("{qualifier}.{name}")).into());
        }
        return Ok(alias.clone());
    }
    let owners: Vec<&String> = resolved_tables
        .iter()
        .filter(|(_, table)| table.column(name).is_some())
        .map(|(alias, _)| alias)
        .collect();
    match owners.len() {
        0 => Err(PlanError::UnknownColumn(name.to_string()).into()),
        1 => Ok(owners[0].clone()),
        _ => Err(PlanError::AmbiguousColumn(name.to_string()).into()),
    }
}

fn eval_value(ctx: &[BoundRow<'_>], expr: &Expr) -> Result<Value> {
    match expr {
        Expr::Literal(Literal::Integer(i)) => Ok(Value::Integer(*i)),
        Expr::Literal(Literal::Float(f)) => Ok(Value::Float(*f)),
        Expr::Literal(Literal::String(s)) => Ok(Value::Text(s.clone())),
        Expr::Literal(Literal::Boolean(b)) => Ok(Value::Boolean(*b)),
        Expr::Literal(Literal::Null) => Ok(Value::Null),
        Expr::Column { table, name, .. } => {
            let candidates: Vec<&BoundRow<'_>> = ctx
                .iter()
                .filter(|b| table.as_deref().map_or(true, |t| t == b.alias))
                .filter(|b| b.row.contains_key(name))
                .collect();
            match candidates.len() {
                0 => Err(PlanError::UnknownColumn(name.clone()).into()),
                1 => Ok(candidates[0].row[name].clone()),
                _ => Err(PlanError::AmbiguousColumn(name.clone()).into()),
            }
        }
        Expr::Wildcard { .. } => Err(PlanError::UnknownColumn("* is not a value".to_string()).into()),
        Expr::Binary { .. } | Expr::Unary { .. } => {
            match eval_bool(ctx, expr)? {
                Some(b) => Ok(Value::Boolean(b)),
                None => Ok(Value::Null),
            }
        }
    }
}

fn eval_bool(ctx: &[BoundRow<'_>], expr: &Expr) -> Result<Option<bool>> {
    match expr {
        Expr::Literal(Literal::Boolean(b)) => Ok(Some(*b)),
        Expr::Literal(Literal::Null) => Ok(None),
        Expr::Binary { left, op, right } if op.is_comparison() => {
            let l = eval_value(ctx, left)?;
            let r = eval_value(ctx, right)?;
            Ok(compare3(*op, &l, &r))
        }
        Expr::Binary {
            left,
            op: BinaryOp::And,
            right,
        } => Ok(and3(eval_bool(ctx, left)?, eval_bool(ctx, right)?)),
        Expr::Binary {
            left,
            op: BinaryOp::Or,
            right,
        } => Ok(or3(eval_bool(ctx, left)?, eval_bool(ctx, right)?)),
        Expr::Unary {
            op: UnaryOp::Not,
            operand,
        } => Ok(eval_bool(ctx, operand)?.map(|b| !b)),
        Expr::Column { name, .. } => match eval_value(ctx, expr)? {
            Value::Boolean(b) => Ok(Some(b)),
            Value::Null => Ok(None),
            _ => Err(PlanError::TypeMismatch {
                column: name.clone(),
            }
            .into()),
        },
        other => Err(PlanError::UnknownColumn(format!("not a predicate: {other}")).into()),
    }
}

fn compare3(op: BinaryOp, l: &Value, r: &Value) -> Option<bool> {
    match op {
        BinaryOp::Eq => l.eq3(r),
        BinaryOp::NotEq => l.eq3(r).map(|b| !b),
        BinaryOp::Lt => l.partial_cmp3(r).map(|o| o == Ordering::Less),
        BinaryOp::LtEq => l.partial_cmp3(r).map(|o| o != Ordering::Greater),
        BinaryOp::Gt => l.partial_cmp3(r).map(|o| o == Ordering::Greater),
        BinaryOp::GtEq => l.partial_cmp3(r).map(|o| o != Ordering::Less),
        BinaryOp::And | BinaryOp::Or => unreachable!("not a comparison operator"),
    }
}

fn and3(a: Option<bool>, b: Option<bool>) -> Option<bool> {
    match (a, b) {
        (Some(false), _) | (_, Some(false)) => Some(false),
        (Some(true), Some(true)) => Some(true),
        _ => None,
    }
}

fn or3(a: Option<bool>, b: Option<bool>) -> Option<bool> {
    match (a, b) {
        (Some(true), _) | (_, Some(true)) => Some(true),
        (Some(false), Some(false)) => Some(false),
        _ => None,
    }
}

/// Splits `expr` on its top-level `AND`s. A top-level `OR` yields a
/// single, non-decomposed conjunct.
fn split_conjuncts(expr: &Expr) -> Vec<&Expr> {
    match expr {
        Expr::Binary {
            left,
            op: BinaryOp::And,
            right,
        } => {
            let mut out = split_conjuncts(left);
            out.extend(split_conjuncts(right));
            out
        }
        other => vec![other],
    }
}

enum ProbeKind {
    Equal(Value),
    Range {
        lo: Option<Value>,
        hi: Option<Value>,
        lo_inclusive: bool,
        hi_inclusive: bool,
    },
}

struct IndexProbe {
    column: String,
    kind: ProbeKind,
}

/// Chooses at most one index probe for `table`/`alias` from the
/// conjuncts of a `WHERE` (or `ON`) clause. Prefers an equality
/// comparison; otherwise the first single-sided range comparison on an
/// indexed column.
fn choose_probe(conjuncts: &[&Expr], alias: &str, table: &Table) -> Option<IndexProbe> {
    let mut range_candidate: Option<IndexProbe> = None;
    for conjunct in conjuncts {
        let Expr::Binary { left, op, right } = conjunct else {
            continue;
        };
        if !op.is_comparison() {
            continue;
        }
        if let Some(probe) = column_literal_probe(alias, table, left, *op, right)
            .or_else(|| column_literal_probe(alias, table, right, flip(*op), left))
        {
            if matches!(probe.kind, ProbeKind::Equal(_)) {
                return Some(probe);
            }
            if range_candidate.is_none() {
                range_candidate = Some(probe);
            }
        }
    }
    range_candidate
}

fn column_literal_probe(
    alias: &str,
    table: &Table,
    column_side: &Expr,
    op: BinaryOp,
    literal_side: &Expr,
) -> Option<IndexProbe> {
    let Expr::Column { table: t, name, .. } = column_side else {
        return None;
    };
    if let Some(t) = t {
        if t != alias {
            return None;
        }
    }
    if !table.has_index(name) {
        return None;
    }
    let value = literal_value(literal_side)?;
    let kind = match op {
        BinaryOp::Eq => ProbeKind::Equal(value),
        BinaryOp::Lt => ProbeKind::Range {
            lo: None,
            hi: Some(value),
            lo_inclusive: true,
            hi_inclusive: false,
        },
        BinaryOp::LtEq => ProbeKind::Range {
            lo: None,
            hi: Some(value),
            lo_inclusive: true,
            hi_inclusive: true,
        },
        BinaryOp::Gt => ProbeKind::Range {
            lo: Some(value),
            hi: None,
            lo_inclusive: false,
            hi_inclusive: true,
        },
        BinaryOp::GtEq => ProbeKind::Range {
            lo: Some(value),
            hi: None,
            lo_inclusive: true,
            hi_inclusive: true,
        },
        BinaryOp::NotEq | BinaryOp::And | BinaryOp::Or => return None,
    };
    Some(IndexProbe {
        column: name.clone(),
        kind,
    })
}

/// Extracts a non-null literal value, for use as an index-probe key.
/// `NULL` deliberately returns `None` here: a B-Tree key is never
/// `Null` (§3 stores null membership only via constraint checks), so a
/// predicate like `col = NULL` can never be satisfied by an index probe.
fn literal_value(expr: &Expr) -> Option<Value> {
    match expr {
        Expr::Literal(Literal::Integer(i)) => Some(Value::Integer(*i)),
        Expr::Literal(Literal::Float(f)) => Some(Value::Float(*f)),
        Expr::Literal(Literal::String(s)) => Some(Value::Text(s.clone())),
        Expr::Literal(Literal::Boolean(b)) => Some(Value::Boolean(*b)),
        _ => None,
    }
}

fn flip(op: BinaryOp) -> BinaryOp {
    match op {
        BinaryOp::Lt => BinaryOp::Gt,
        BinaryOp::LtEq => BinaryOp::GtEq,
        BinaryOp::Gt => BinaryOp::Lt,
        BinaryOp::GtEq => BinaryOp::LtEq,
        other => other,
    }
}

fn row_filter(where_clause: &Option<Expr>, row: &Row, table_name: &str) -> Result<bool> {
    let Some(expr) = where_clause else {
        return Ok(true);
    };
    let bound = [BoundRow {
        alias: table_name,
        row,
    }];
    Ok(eval_bool(&bound, expr)?.unwrap_or(false))
}

/// Converts a literal expression (as found in an `INSERT ... VALUES`
/// tuple or an `UPDATE ... SET` assignment) into its stored `Value`,
/// including `NULL` — unlike [`literal_value`], which is probe-only.
fn literal_to_value(expr: &Expr) -> Result<Value> {
    match expr {
        Expr::Literal(Literal::Null) => Ok(Value::Null),
        _ => literal_value(expr).ok_or_else(|| {
            PlanError::TypeMismatch {
                column: expr.to_string(),
            }
            .into()
        }),
    }
}

fn execute_insert(db: &mut Database, insert: &crate::ast::InsertStatement) -> Result<QueryResult> {
    let table = db
        .get_mut(&insert.table)
        .ok_or_else(|| PlanError::UnknownTable(insert.table.clone()))?;

    let target_columns: Vec<String> = if insert.columns.is_empty() {
        table.columns().iter().map(|c| c.name.clone()).collect()
    } else {
        insert.columns.clone()
    };

    let mut affected = 0;
    for tuple in &insert.values {
        if tuple.len() != target_columns.len() {
            return Err(ConstraintError::ColumnCountMismatch {
                expected: target_columns.len(),
                found: tuple.len(),
            }
            .into());
        }
        let mut row = Row::new();
        for (column_name, expr) in target_columns.iter().zip(tuple) {
            row.insert(column_name.clone(), literal_to_value(expr)?);
        }
        table.insert(row)?;
        affected += 1;
    }

    Ok(QueryResult::mutation(StatementKind::Insert, affected))
}

fn execute_update(db: &mut Database, update: &crate::ast::UpdateStatement) -> Result<QueryResult> {
    let table = db
        .get_mut(&update.table)
        .ok_or_else(|| PlanError::UnknownTable(update.table.clone()))?;

    let assignments: Vec<(String, Value)> = update
        .assignments
        .iter()
        .map(|a| literal_to_value(&a.value).map(|v| (a.column.clone(), v)))
        .collect::<Result<_>>()?;

    let table_name = update.table.clone();
    let where_clause = update.where_clause.clone();
    let affected = table.update(&assignments, |row| row_filter(&where_clause, row, &table_name))?;

    Ok(QueryResult::mutation(StatementKind::Update, affected))
}

fn execute_delete(db: &mut Database, delete: &crate::ast::DeleteStatement) -> Result<QueryResult> {
    let table = db
        .get_mut(&delete.table)
        .ok_or_else(|| PlanError::UnknownTable(delete.table.clone()))?;

    let table_name = delete.table.clone();
    let where_clause = delete.where_clause.clone();
    let affected = table.delete(|row| row_filter(&where_clause, row, &table_name))?;

    Ok(QueryResult::mutation(StatementKind::Delete, affected))
}

fn execute_create_table(
    db: &mut Database,
    create: &crate::ast::CreateTableStatement,
) -> Result<QueryResult> {
    let columns = create
        .columns
        .iter()
        .map(|c| crate::table::Column {
            name: c.name.clone(),
            data_type: c.data_type,
            primary_key: c.primary_key,
            unique: c.unique,
            not_null: c.not_null,
        })
        .collect();
    db.create_table(&create.name, columns)?;
    Ok(QueryResult::schema_change(StatementKind::CreateTable))
}

fn execute_drop_table(
    db: &mut Database,
    drop: &crate::ast::DropTableStatement,
) -> Result<QueryResult> {
    db.drop_table(&drop.name)?;
    Ok(QueryResult::schema_change(StatementKind::DropTable))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::parser::Parser;

    fn run(db: &mut Database, sql: &str) -> Result<QueryResult> {
        let mut parser = Parser::new(sql);
        let stmt = parser.parse().map_err(Error::from)?;
        execute(db, stmt)
    }

    fn setup_users(db: &mut Database) {
        run(
            db,
            "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL, age INTEGER)",
        )
        .unwrap();
        run(db, "INSERT INTO users VALUES (1, 'Alice', 30)").unwrap();
        run(db, "INSERT INTO users VALUES (2, 'Bob', 25)").unwrap();
        run(db, "INSERT INTO users VALUES (3, 'Carol', 35)").unwrap();
    }

    #[test]
    fn create_insert_select_round_trip() {
        let mut db = Database::in_memory();
        setup_users(&mut db);
        let result = run(&mut db, "SELECT id, name FROM users WHERE age > 28").unwrap();
        assert_eq!(result.columns, vec!["id", "name"]);
        assert_eq!(result.rows.len(), 2);
    }

    #[test]
    fn select_wildcard_projects_all_columns() {
        let mut db = Database::in_memory();
        setup_users(&mut db);
        let result = run(&mut db, "SELECT * FROM users WHERE id = 1").unwrap();
        assert_eq!(result.columns, vec!["id", "name", "age"]);
        assert_eq!(result.rows[0][1], Value::Text("Alice".into()));
    }

    #[test]
    fn order_by_desc_with_limit() {
        let mut db = Database::in_memory();
        setup_users(&mut db);
        let result = run(&mut db, "SELECT name FROM users ORDER BY age DESC LIMIT 1").unwrap();
        assert_eq!(result.rows, vec![vec![Value::Text("Carol".into())]]);
    }

    #[test]
    fn update_then_delete() {
        let mut db = Database::in_memory();
        setup_users(&mut db);
        let updated = run(&mut db, "UPDATE users SET age = 31 WHERE id = 1").unwrap();
        assert_eq!(updated.affected, 1);
        let deleted = run(&mut db, "DELETE FROM users WHERE id = 2").unwrap();
        assert_eq!(deleted.affected, 1);
        let remaining = run(&mut db, "SELECT id FROM users").unwrap();
        assert_eq!(remaining.rows.len(), 2);
    }

    #[test]
    fn update_with_unknown_column_in_where_is_an_error() {
        let mut db = Database::in_memory();
        setup_users(&mut db);
        let err = run(&mut db, "UPDATE users SET age = 31 WHERE bogus = 5").unwrap_err();
        assert!(matches!(
            err,
            Error::Plan(crate::error::PlanError::UnknownColumn(_))
        ));
        let remaining = run(&mut db, "SELECT id FROM users").unwrap();
        assert_eq!(remaining.rows.len(), 3);
    }

    #[test]
    fn delete_with_type_mismatch_in_where_is_an_error() {
        let mut db = Database::in_memory();
        setup_users(&mut db);
        let err = run(&mut db, "DELETE FROM users WHERE name").unwrap_err();
        assert!(matches!(
            err,
            Error::Plan(crate::error::PlanError::TypeMismatch { .. })
        ));
        let remaining = run(&mut db, "SELECT id FROM users").unwrap();
        assert_eq!(remaining.rows.len(), 3);
    }

    #[test]
    fn join_projects_qualified_columns() {
        let mut db = Database::in_memory();
        run(&mut db, "CREATE TABLE a (id INTEGER PRIMARY KEY, n TEXT)").unwrap();
        run(&mut db, "CREATE TABLE b (id INTEGER PRIMARY KEY, aid INTEGER, v INTEGER)").unwrap();
        run(&mut db, "INSERT INTO a VALUES (1, 'x')").unwrap();
        run(&mut db, "INSERT INTO a VALUES (2, 'y')").unwrap();
        run(&mut db, "INSERT INTO b VALUES (1, 1, 10)").unwrap();
        run(&mut db, "INSERT INTO b VALUES (2, 1, 20)").unwrap();

        let result = run(
            &mut db,
            "SELECT a.n, b.v FROM a JOIN b ON a.id = b.aid ORDER BY b.v ASC",
        )
        .unwrap();
        assert_eq!(result.columns, vec!["a.n", "b.v"]);
        assert_eq!(
            result.rows,
            vec![
                vec![Value::Text("x".into()), Value::Integer(10)],
                vec![Value::Text("x".into()), Value::Integer(20)],
            ]
        );
    }

    #[test]
    fn ambiguous_unqualified_column_in_join_is_an_error() {
        let mut db = Database::in_memory();
        run(&mut db, "CREATE TABLE a (id INTEGER PRIMARY KEY)").unwrap();
        run(&mut db, "CREATE TABLE b (id INTEGER PRIMARY KEY)").unwrap();
        run(&mut db, "INSERT INTO a VALUES (1)").unwrap();
        run(&mut db, "INSERT INTO b VALUES (1)").unwrap();
        let err = run(&mut db, "SELECT id FROM a JOIN b ON a.id = b.id").unwrap_err();
        assert!(matches!(err, Error::Plan(PlanError::AmbiguousColumn(_))));
    }

    #[test]
    fn null_in_where_excludes_row() {
        let mut db = Database::in_memory();
        run(
            &mut db,
            "CREATE TABLE t (id INTEGER PRIMARY KEY, label TEXT)",
        )
        .unwrap();
        run(&mut db, "INSERT INTO t (id) VALUES (1)").unwrap();
        let result = run(&mut db, "SELECT id FROM t WHERE label = 'x'").unwrap();
        assert!(result.rows.is_empty());
    }

    #[test]
    fn limit_zero_returns_no_rows() {
        let mut db = Database::in_memory();
        setup_users(&mut db);
        let result = run(&mut db, "SELECT id FROM users LIMIT 0").unwrap();
        assert!(result.rows.is_empty());
    }

    #[test]
    fn select_from_empty_table_returns_no_rows() {
        let mut db = Database::in_memory();
        run(&mut db, "CREATE TABLE t (id INTEGER PRIMARY KEY)").unwrap();
        let result = run(&mut db, "SELECT id FROM t").unwrap();
        assert!(result.rows.is_empty());
        assert_eq!(result.columns, vec!["id"]);
    }

    #[test]
    fn column_count_mismatch_is_rejected() {
        let mut db = Database::in_memory();
        run(&mut db, "CREATE TABLE t (id INTEGER, name TEXT)").unwrap();
        let err = run(&mut db, "INSERT INTO t VALUES (1)").unwrap_err();
        assert!(matches!(
            err,
            Error::Constraint(ConstraintError::ColumnCountMismatch { .. })
        ));
    }

    #[test]
    fn insert_accepts_an_explicit_null_literal() {
        let mut db = Database::in_memory();
        run(&mut db, "CREATE TABLE t (id INTEGER PRIMARY KEY, label TEXT)").unwrap();
        run(&mut db, "INSERT INTO t VALUES (1, NULL)").unwrap();
        let result = run(&mut db, "SELECT label FROM t WHERE id = 1").unwrap();
        assert_eq!(result.rows, vec![vec![Value::Null]]);
    }

    #[test]
    fn update_can_set_a_column_back_to_null() {
        let mut db = Database::in_memory();
        run(&mut db, "CREATE TABLE t (id INTEGER PRIMARY KEY, label TEXT)").unwrap();
        run(&mut db, "INSERT INTO t VALUES (1, 'x')").unwrap();
        run(&mut db, "UPDATE t SET label = NULL WHERE id = 1").unwrap();
        let result = run(&mut db, "SELECT label FROM t WHERE id = 1").unwrap();
        assert_eq!(result.rows, vec![vec![Value::Null]]);
    }

    #[test]
    fn no_where_clause_means_no_index_probe() {
        let mut db = Database::in_memory();
        setup_users(&mut db);
        let table = db.get("users").unwrap();
        assert!(choose_probe(&[], "users", table).is_none());
    }

    #[test]
    fn equality_on_primary_key_selects_an_equal_probe() {
        let mut db = Database::in_memory();
        setup_users(&mut db);
        let table = db.get("users").unwrap();
        let expr = Expr::column("id").binary(BinaryOp::Eq, Expr::integer(2));
        let probe = choose_probe(&[&expr], "users", table).expect("probe selected");
        assert_eq!(probe.column, "id");
        assert!(matches!(probe.kind, ProbeKind::Equal(Value::Integer(2))));
    }

    #[test]
    fn one_sided_range_on_indexed_column_is_selected() {
        let mut db = Database::in_memory();
        setup_users(&mut db);
        let table = db.get("users").unwrap();
        let expr = Expr::column("id").binary(BinaryOp::Gt, Expr::integer(1));
        let probe = choose_probe(&[&expr], "users", table).expect("probe selected");
        assert_eq!(probe.column, "id");
        assert!(matches!(
            probe.kind,
            ProbeKind::Range {
                lo: Some(Value::Integer(1)),
                hi: None,
                lo_inclusive: false,
                ..
            }
        ));
    }

    #[test]
    fn disjunction_disables_index_use_for_that_conjunct() {
        let mut db = Database::in_memory();
        setup_users(&mut db);
        let table = db.get("users").unwrap();
        let expr = Expr::column("id")
            .binary(BinaryOp::Eq, Expr::integer(1))
            .or(Expr::column("id").binary(BinaryOp::Eq, Expr::integer(2)));
        assert!(choose_probe(&[&expr], "users", table).is_none());
    }
}
