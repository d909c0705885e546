//! Integration tests exercising the embedded `Database::execute` surface
//! end to end, one process per test, no shared state.

use ferrodb::{Database, Value};

/// S1 — create, insert, scan with `ORDER BY ... DESC`.
#[test]
fn create_insert_scan_descending() {
    let mut db = Database::in_memory();
    db.execute("CREATE TABLE u(id INTEGER PRIMARY KEY, name TEXT NOT NULL)")
        .unwrap();
    db.execute("INSERT INTO u VALUES (1,'Alice')").unwrap();
    db.execute("INSERT INTO u VALUES (2,'Bob')").unwrap();

    let result = db.execute("SELECT * FROM u ORDER BY id DESC").unwrap();
    assert_eq!(
        result.rows,
        vec![
            vec![Value::Integer(2), Value::Text("Bob".into())],
            vec![Value::Integer(1), Value::Text("Alice".into())],
        ]
    );
}

/// S2 — a unique violation leaves the table exactly as it was.
#[test]
fn unique_violation_leaves_table_unchanged() {
    let mut db = Database::in_memory();
    db.execute("CREATE TABLE u(id INTEGER PRIMARY KEY, email TEXT UNIQUE)")
        .unwrap();
    db.execute("INSERT INTO u VALUES (1,'a@x')").unwrap();

    let err = db.execute("INSERT INTO u VALUES (2,'a@x')").unwrap_err();
    assert!(matches!(
        err,
        ferrodb::Error::Constraint(ferrodb::ConstraintError::UniqueViolation(_))
    ));

    let result = db.execute("SELECT * FROM u").unwrap();
    assert_eq!(
        result.rows,
        vec![vec![Value::Integer(1), Value::Text("a@x".into())]]
    );

    // The row-id counter already advanced past the failed insert's
    // candidate id; the next successful insert receives id >= 2.
    db.execute("INSERT INTO u VALUES (3,'b@x')").unwrap();
    let result = db.execute("SELECT * FROM u ORDER BY id ASC").unwrap();
    assert_eq!(result.rows.len(), 2);
}

/// S3 — an equality predicate on an indexed column is satisfied by a
/// single-row probe rather than a full scan.
#[test]
fn indexed_equality_returns_single_row() {
    let mut db = Database::in_memory();
    db.execute("CREATE TABLE p(id INTEGER PRIMARY KEY, price FLOAT)")
        .unwrap();
    db.execute("INSERT INTO p VALUES (1,10.0)").unwrap();
    db.execute("INSERT INTO p VALUES (2,20.0)").unwrap();
    db.execute("INSERT INTO p VALUES (3,30.0)").unwrap();

    let result = db.execute("SELECT * FROM p WHERE id = 2").unwrap();
    assert_eq!(
        result.rows,
        vec![vec![Value::Integer(2), Value::Float(20.0)]]
    );
}

/// S4 — inner join across two tables, ordered by a column of the
/// right-hand side.
#[test]
fn inner_join_orders_by_right_hand_column() {
    let mut db = Database::in_memory();
    db.execute("CREATE TABLE a(id INTEGER PRIMARY KEY, n TEXT)")
        .unwrap();
    db.execute("CREATE TABLE b(id INTEGER PRIMARY KEY, aid INTEGER, v INTEGER)")
        .unwrap();
    db.execute("INSERT INTO a VALUES (1,'x')").unwrap();
    db.execute("INSERT INTO a VALUES (2,'y')").unwrap();
    db.execute("INSERT INTO b VALUES (1,1,10)").unwrap();
    db.execute("INSERT INTO b VALUES (2,1,11)").unwrap();
    db.execute("INSERT INTO b VALUES (3,2,20)").unwrap();

    let result = db
        .execute("SELECT a.n,b.v FROM a JOIN b ON a.id=b.aid ORDER BY b.v ASC")
        .unwrap();
    assert_eq!(
        result.rows,
        vec![
            vec![Value::Text("x".into()), Value::Integer(10)],
            vec![Value::Text("x".into()), Value::Integer(11)],
            vec![Value::Text("y".into()), Value::Integer(20)],
        ]
    );
}

/// S5 — an `UPDATE` that would violate a constraint mutates nothing.
#[test]
fn update_constraint_violation_is_all_or_nothing() {
    let mut db = Database::in_memory();
    db.execute("CREATE TABLE u(id INTEGER PRIMARY KEY, email TEXT UNIQUE)")
        .unwrap();
    db.execute("INSERT INTO u VALUES (1,'a')").unwrap();
    db.execute("INSERT INTO u VALUES (2,'b')").unwrap();

    let err = db
        .execute("UPDATE u SET email='a' WHERE id=2")
        .unwrap_err();
    assert!(matches!(
        err,
        ferrodb::Error::Constraint(ferrodb::ConstraintError::UniqueViolation(_))
    ));

    let result = db.execute("SELECT * FROM u ORDER BY id ASC").unwrap();
    assert_eq!(
        result.rows,
        vec![
            vec![Value::Integer(1), Value::Text("a".into())],
            vec![Value::Integer(2), Value::Text("b".into())],
        ]
    );
}

/// S6 — a persisted database round-trips through a close and reopen,
/// including row-id monotonicity.
#[test]
fn persistence_round_trip_preserves_state_and_row_id_counter() {
    let dir = tempfile::tempdir().unwrap();

    {
        let mut db = Database::open(dir.path()).unwrap();
        db.execute("CREATE TABLE u(id INTEGER PRIMARY KEY, name TEXT NOT NULL)")
            .unwrap();
        db.execute("INSERT INTO u VALUES (1,'Alice')").unwrap();
        db.execute("INSERT INTO u VALUES (2,'Bob')").unwrap();
        db.close();
    }

    let mut reopened = Database::open(dir.path()).unwrap();
    let result = reopened.execute("SELECT * FROM u ORDER BY id ASC").unwrap();
    assert_eq!(
        result.rows,
        vec![
            vec![Value::Integer(1), Value::Text("Alice".into())],
            vec![Value::Integer(2), Value::Text("Bob".into())],
        ]
    );

    reopened.execute("INSERT INTO u VALUES (3,'Carol')").unwrap();
    let result = reopened.execute("SELECT id FROM u ORDER BY id ASC").unwrap();
    assert_eq!(
        result.rows,
        vec![
            vec![Value::Integer(1)],
            vec![Value::Integer(2)],
            vec![Value::Integer(3)],
        ]
    );
}

/// Law: INSERT then DELETE of that row restores the table to its
/// pre-insert state, modulo the row-id counter.
#[test]
fn insert_then_delete_restores_prior_state() {
    let mut db = Database::in_memory();
    db.execute("CREATE TABLE u(id INTEGER PRIMARY KEY, name TEXT UNIQUE)")
        .unwrap();
    db.execute("INSERT INTO u VALUES (1,'Alice')").unwrap();

    let before = db.execute("SELECT * FROM u").unwrap();

    db.execute("INSERT INTO u VALUES (2,'Bob')").unwrap();
    let deleted = db.execute("DELETE FROM u WHERE id = 2").unwrap();
    assert_eq!(deleted.affected, 1);

    let after = db.execute("SELECT * FROM u").unwrap();
    assert_eq!(before.rows, after.rows);

    // The index no longer resolves the deleted key: a fresh row reusing
    // the same name is accepted, proving the unique index entry is gone.
    db.execute("INSERT INTO u VALUES (3,'Bob')").unwrap();
}

/// Law: `ORDER BY c ASC` and `ORDER BY c DESC` are reverses of one
/// another when the column has no nulls and no duplicate values.
#[test]
fn ascending_and_descending_order_are_reverses() {
    let mut db = Database::in_memory();
    db.execute("CREATE TABLE t(id INTEGER PRIMARY KEY, n INTEGER)")
        .unwrap();
    for (id, n) in [(1, 30), (2, 10), (3, 20)] {
        db.execute(&format!("INSERT INTO t VALUES ({id},{n})"))
            .unwrap();
    }

    let asc = db.execute("SELECT n FROM t ORDER BY n ASC").unwrap();
    let mut desc = db.execute("SELECT n FROM t ORDER BY n DESC").unwrap();
    desc.rows.reverse();
    assert_eq!(asc.rows, desc.rows);
}

/// Law: an `UPDATE` that reassigns a column to its current value is a
/// no-op — it still reports the row as affected, but leaves every
/// value unchanged.
#[test]
fn update_to_same_value_is_a_no_op() {
    let mut db = Database::in_memory();
    db.execute("CREATE TABLE u(id INTEGER PRIMARY KEY, name TEXT)")
        .unwrap();
    db.execute("INSERT INTO u VALUES (1,'Alice')").unwrap();

    let before = db.execute("SELECT * FROM u").unwrap();
    let updated = db
        .execute("UPDATE u SET name='Alice' WHERE id=1")
        .unwrap();
    assert_eq!(updated.affected, 1);
    let after = db.execute("SELECT * FROM u").unwrap();
    assert_eq!(before.rows, after.rows);
}

/// Boundary: an empty table scans to zero rows, and mutations against
/// it report zero rows affected.
#[test]
fn empty_table_boundaries() {
    let mut db = Database::in_memory();
    db.execute("CREATE TABLE u(id INTEGER PRIMARY KEY, name TEXT)")
        .unwrap();

    let select = db.execute("SELECT * FROM u").unwrap();
    assert!(select.rows.is_empty());

    let updated = db.execute("UPDATE u SET name='x' WHERE id=1").unwrap();
    assert_eq!(updated.affected, 0);

    let deleted = db.execute("DELETE FROM u WHERE id=1").unwrap();
    assert_eq!(deleted.affected, 0);
}

/// Boundary: `LIMIT 0` always yields an empty result set.
#[test]
fn limit_zero_yields_no_rows() {
    let mut db = Database::in_memory();
    db.execute("CREATE TABLE u(id INTEGER PRIMARY KEY)").unwrap();
    db.execute("INSERT INTO u VALUES (1)").unwrap();
    db.execute("INSERT INTO u VALUES (2)").unwrap();

    let result = db.execute("SELECT * FROM u LIMIT 0").unwrap();
    assert!(result.rows.is_empty());
}

/// Boundary: a `WHERE` predicate comparing anything against `NULL`
/// excludes the row, never matching it.
#[test]
fn null_comparison_excludes_the_row() {
    let mut db = Database::in_memory();
    db.execute("CREATE TABLE u(id INTEGER PRIMARY KEY, score FLOAT)")
        .unwrap();
    db.execute("INSERT INTO u VALUES (1, NULL)").unwrap();
    db.execute("INSERT INTO u VALUES (2, 5.0)").unwrap();

    let equal = db.execute("SELECT * FROM u WHERE score = 5.0").unwrap();
    assert_eq!(equal.rows.len(), 1);

    let not_equal = db.execute("SELECT * FROM u WHERE score != 5.0").unwrap();
    assert_eq!(not_equal.rows.len(), 0);
}

/// A failed statement — here, a duplicate `CREATE TABLE` — never
/// mutates the database's set of tables.
#[test]
fn failed_create_table_does_not_register_a_second_table() {
    let mut db = Database::in_memory();
    db.execute("CREATE TABLE u(id INTEGER PRIMARY KEY)").unwrap();
    assert!(db.execute("CREATE TABLE u(id INTEGER PRIMARY KEY)").is_err());
    assert_eq!(db.list_tables(), vec!["u"]);
}

/// A positional `INSERT` with the wrong number of values is rejected
/// with `ColumnCountMismatch` rather than silently padding or
/// truncating.
#[test]
fn insert_arity_mismatch_is_rejected() {
    let mut db = Database::in_memory();
    db.execute("CREATE TABLE u(id INTEGER PRIMARY KEY, name TEXT)")
        .unwrap();
    let err = db.execute("INSERT INTO u VALUES (1)").unwrap_err();
    assert!(matches!(
        err,
        ferrodb::Error::Constraint(ferrodb::ConstraintError::ColumnCountMismatch { .. })
    ));
}

/// Malformed source text surfaces as a lex error distinct from an
/// ordinary parse error.
#[test]
fn unterminated_string_is_a_lex_error() {
    let mut db = Database::in_memory();
    db.execute("CREATE TABLE u(id INTEGER PRIMARY KEY, name TEXT)")
        .unwrap();
    let err = db
        .execute("SELECT * FROM u WHERE name = 'unterminated")
        .unwrap_err();
    assert!(matches!(err, ferrodb::Error::Lex { .. }));
}

/// Referencing a table that doesn't exist is a plan error, not a panic.
#[test]
fn unknown_table_is_a_plan_error() {
    let mut db = Database::in_memory();
    let err = db.execute("SELECT * FROM ghost").unwrap_err();
    assert!(matches!(
        err,
        ferrodb::Error::Plan(ferrodb::PlanError::UnknownTable(_))
    ));
}

/// `DROP TABLE` removes both the in-memory schema and a persisted
/// table's on-disk document.
#[test]
fn drop_table_removes_persisted_document() {
    let dir = tempfile::tempdir().unwrap();
    let mut db = Database::open(dir.path()).unwrap();
    db.execute("CREATE TABLE u(id INTEGER PRIMARY KEY)").unwrap();
    db.execute("INSERT INTO u VALUES (1)").unwrap();
    assert!(dir.path().join("u.json").exists());

    db.execute("DROP TABLE u").unwrap();
    assert!(!dir.path().join("u.json").exists());
    assert!(db.execute("SELECT * FROM u").is_err());
}
