mod common;

use common::{int, text, ScriptedConnection};
use oxide_query::{
    Direction, OracleDialect, QueryError, SqlServerDialect, SqlValue, SqliteDialect, Statement, Table,
};
use pretty_assertions::assert_eq;

fn insert_user(users: &Table) -> Statement {
    Statement::insert()
        .into(users)
        .set(users.column::<String>("NAME").to("ann"))
}

#[test]
fn test_output_clause_fills_cells() {
    let conn = ScriptedConnection::new(&SqlServerDialect);
    conn.reply(&["ID"], vec![vec![int(42)]]);

    let users = Table::new("USERS");
    let mut insert = insert_user(&users);
    let id = insert.bind(&users.column::<i64>("ID"));

    assert_eq!(insert.execute_non_query(&conn).unwrap(), 1);
    assert_eq!(id.get().unwrap(), 42);
    assert_eq!(
        conn.sql(0),
        "INSERT INTO USERS (NAME) OUTPUT INSERTED.[ID] VALUES (@ph00)"
    );
    assert_eq!(insert.staged_rows(), 0);
}

#[test]
fn test_output_clause_counts_every_returned_row() {
    let conn = ScriptedConnection::new(&SqlServerDialect);
    conn.reply(&["ID"], vec![vec![int(42)], vec![int(43)]]);

    let users = Table::new("USERS");
    let name = users.column::<String>("NAME");
    let mut insert = Statement::insert().into(&users);
    for value in ["ann", "bob"] {
        insert.assign(name.to(value));
        insert.stage_row();
    }
    let id = insert.bind(&users.column::<i64>("ID"));

    assert_eq!(insert.execute_non_query(&conn).unwrap(), 2);
    assert_eq!(id.get().unwrap(), 42);
    assert_eq!(
        conn.sql(0),
        "INSERT INTO USERS (NAME) OUTPUT INSERTED.[ID] VALUES (@ph00), (@ph01)"
    );
}

#[test]
fn test_returning_into_reads_output_parameters() {
    let conn = ScriptedConnection::new(&OracleDialect);
    conn.outputs(vec![int(7), text("2024-01-01")]);

    let users = Table::new("USERS");
    let mut insert = insert_user(&users);
    let id = insert.bind(&users.column::<i64>("ID"));
    let created = insert.bind(&users.column::<String>("CREATED"));

    assert_eq!(insert.execute_non_query(&conn).unwrap(), 1);
    assert_eq!(id.get().unwrap(), 7);
    assert_eq!(created.get().unwrap(), "2024-01-01");

    let commands = conn.commands.borrow();
    let params: Vec<_> = commands[0]
        .parameters
        .iter()
        .map(|p| (p.name.as_str(), p.direction))
        .collect();
    assert_eq!(
        params,
        vec![
            ("par00", Direction::Output),
            ("par01", Direction::Output),
            ("ph00", Direction::Input),
        ]
    );
    assert_eq!(
        commands[0].sql,
        "INSERT INTO USERS (NAME) VALUES (:ph00) RETURNING ID, CREATED INTO :par00, :par01"
    );
}

#[test]
fn test_returning_into_without_row_leaves_cells_null() {
    let conn = ScriptedConnection::new(&OracleDialect);
    conn.affected(0).outputs(vec![int(7)]);

    let users = Table::new("USERS");
    let mut insert = insert_user(&users);
    let id = insert.bind(&users.column::<i64>("ID"));

    assert_eq!(insert.execute_non_query(&conn).unwrap(), 0);
    assert!(id.is_null());
}

#[test]
fn test_last_insert_id_queries_generated_key() {
    let conn = ScriptedConnection::new(&SqliteDialect);
    conn.reply(&["last_insert_rowid()"], vec![vec![int(5)]]);

    let users = Table::new("USERS");
    let mut insert = insert_user(&users);
    let id = insert.bind(&users.column::<i64>("ID"));

    assert_eq!(insert.execute_non_query(&conn).unwrap(), 1);
    assert_eq!(id.get().unwrap(), 5);
    assert_eq!(conn.sql(0), "INSERT INTO USERS (NAME) VALUES (:ph00)");
    assert_eq!(conn.sql(1), "SELECT last_insert_rowid()");
}

#[test]
fn test_last_insert_id_reports_affected_rows() {
    let conn = ScriptedConnection::new(&SqliteDialect);
    conn.affected(2).reply(&["last_insert_rowid()"], vec![vec![int(8)]]);

    let tags = Table::new("TAGS");
    let label = tags.column::<String>("LABEL");
    let mut insert = Statement::insert().into(&tags);
    for value in ["red", "blue"] {
        insert.assign(label.to(value));
        insert.stage_row();
    }
    let id = insert.bind(&tags.column::<i64>("ID"));

    assert_eq!(insert.execute_non_query(&conn).unwrap(), 2);
    assert_eq!(id.get().unwrap(), 8);
}

#[test]
fn test_insert_without_rows_skips_generated_key() {
    let conn = ScriptedConnection::new(&SqliteDialect);
    conn.affected(0).reply(&["last_insert_rowid()"], vec![vec![int(3)]]);

    let users = Table::new("USERS");
    let mut insert = insert_user(&users);
    let id = insert.bind(&users.column::<i64>("ID"));

    assert_eq!(insert.execute_non_query(&conn).unwrap(), 0);
    assert!(id.is_null());
    assert_eq!(conn.command_count(), 1);
}

#[test]
fn test_zero_generated_key_is_not_recovered() {
    let conn = ScriptedConnection::new(&SqliteDialect);
    conn.reply(&["last_insert_rowid()"], vec![vec![int(0)]]);

    let users = Table::new("USERS");
    let mut insert = insert_user(&users);
    let id = insert.bind(&users.column::<i64>("ID"));

    assert_eq!(insert.execute_non_query(&conn).unwrap(), 0);
    assert_eq!(id.raw(), SqlValue::Null);
}

#[test]
fn test_multi_column_return_fails_before_execution() {
    let conn = ScriptedConnection::new(&SqliteDialect);

    let users = Table::new("USERS");
    let mut insert = insert_user(&users);
    let _id = insert.bind(&users.column::<i64>("ID"));
    let _created = insert.bind(&users.column::<String>("CREATED"));

    let err = insert.execute_non_query(&conn).unwrap_err();
    assert!(matches!(
        err,
        QueryError::UnsupportedReturning {
            dialect: "sqlite",
            requested: 2
        }
    ));
    assert_eq!(conn.command_count(), 0);
    assert_eq!(insert.staged_rows(), 1);
}

#[test]
fn test_returning_on_update_is_rejected() {
    let conn = ScriptedConnection::new(&SqlServerDialect);

    let users = Table::new("USERS");
    let name = users.column::<String>("NAME");
    let mut update = Statement::update().into(&users).set(name.to("bob"));
    let _id = update.bind(&users.column::<i64>("ID"));

    assert!(matches!(
        update.execute_non_query(&conn),
        Err(QueryError::ReturningOnlyForInsert("UPDATE"))
    ));
    assert_eq!(conn.command_count(), 0);
}

#[test]
fn test_multi_row_insert() {
    let conn = ScriptedConnection::new(&SqliteDialect);
    conn.affected(2);

    let tags = Table::new("TAGS");
    let label = tags.column::<String>("LABEL");
    let mut insert = Statement::insert().into(&tags);
    for value in ["red", "blue"] {
        insert.assign(label.to(value));
        insert.stage_row();
    }

    assert_eq!(insert.execute_non_query(&conn).unwrap(), 2);
    let commands = conn.commands.borrow();
    assert_eq!(commands[0].sql, "INSERT INTO TAGS (LABEL) VALUES (:ph00), (:ph01)");
    assert_eq!(commands[0].parameters[1].value, text("blue"));
}
