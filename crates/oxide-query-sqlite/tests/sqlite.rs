mod common;

use chrono::NaiveDate;
use common::{add_customer, add_order, schema, setup};
use oxide_query::{
    case_when, Connection, ConnectionSettings, Mapper, QueryError, SqlExpr, SqlValue, Statement, StoredProcedure,
    TableRef,
};
use oxide_query_sqlite::SqliteConnection;
use pretty_assertions::assert_eq;

#[test]
fn test_generated_keys_are_returned() {
    let conn = setup();
    assert_eq!(add_customer(&conn, "ann"), 1);
    assert_eq!(add_customer(&conn, "bob"), 2);
}

#[test]
fn test_select_with_paging() {
    let conn = setup();
    for name in ["d", "a", "c", "b", "e"] {
        add_customer(&conn, name);
    }

    let s = schema();
    let name = s.customers.column::<String>("NAME");
    let mut query = Statement::select()
        .from(&s.customers)
        .order_by(&name)
        .offset(1)
        .limit(3);
    assert_eq!(query.read_values(&conn, &name).unwrap(), vec!["b", "c", "d"]);

    let mut tail = Statement::select().from(&s.customers).order_descending(&name).offset(3);
    assert_eq!(tail.read_values(&conn, &name).unwrap(), vec!["b", "a"]);
}

#[test]
fn test_round_trip_of_typed_values() {
    let conn = setup();
    let s = schema();
    let created = NaiveDate::from_ymd_opt(2024, 3, 9)
        .unwrap()
        .and_hms_milli_opt(14, 30, 5, 250)
        .unwrap();

    let mut insert = Statement::insert()
        .into(&s.customers)
        .set(s.customers.column::<String>("NAME").to("it's"))
        .set(s.customers.column::<bool>("ACTIVE").to(false))
        .set(s.customers.column::<chrono::NaiveDateTime>("CREATED").to(created));
    insert.execute_non_query(&conn).unwrap();

    let mut query = Statement::select().from(&s.customers);
    let name = query.bind(&s.customers.column::<String>("NAME"));
    let active = query.bind(&s.customers.column::<bool>("ACTIVE"));
    let stamp = query.bind(&s.customers.column::<Option<chrono::NaiveDateTime>>("CREATED"));

    assert!(query.read_single(&conn).unwrap());
    assert_eq!(name.get().unwrap(), "it's");
    assert!(!active.get().unwrap());
    assert_eq!(stamp.get().unwrap(), Some(created));
}

#[test]
fn test_update_with_expression() {
    let conn = setup();
    let id = add_customer(&conn, "ann");
    let s = schema();
    let name = s.customers.column::<String>("NAME");
    let key = s.customers.column::<i64>("ID");

    let mut update = Statement::update()
        .into(&s.customers)
        .set(name.to(name.concat("-x").upper()))
        .where_(key.eq(id));
    assert_eq!(update.execute_non_query(&conn).unwrap(), 1);

    let mut query = Statement::select().from(&s.customers).where_(key.eq(id));
    assert_eq!(query.read_value(&conn, &name).unwrap(), Some(String::from("ANN-X")));
}

#[test]
fn test_delete_not_in_sub_query() {
    let conn = setup();
    let ann = add_customer(&conn, "ann");
    add_customer(&conn, "bob");
    add_order(&conn, ann, 10.0);

    let s = schema();
    let customer_id = s.customers.column::<i64>("ID");
    let buyer = s.orders.column::<i64>("CUSTOMER_ID");
    let mut delete = Statement::delete()
        .from(&s.customers)
        .where_(customer_id.not_in_query(Statement::select().add_select(&buyer).from(&s.orders)));

    assert_eq!(delete.execute_non_query(&conn).unwrap(), 1);
    let mut rest = Statement::select().from(&s.customers);
    assert_eq!(rest.read_values(&conn, &customer_id).unwrap(), vec![ann]);
}

#[test]
fn test_aggregates_group_by_selected_columns() {
    let conn = setup();
    let ann = add_customer(&conn, "ann");
    let bob = add_customer(&conn, "bob");
    add_order(&conn, ann, 10.0);
    add_order(&conn, ann, 5.5);
    add_order(&conn, bob, 1.0);

    let s = schema();
    let name = s.customers.column::<String>("NAME");
    let total = s.orders.column::<f64>("TOTAL");
    let spent = total.sum().alias("SPENT");
    let mut query = Statement::select()
        .from(
            s.customers
                .inner_join(&s.orders)
                .on(s.customers.column::<i64>("ID").eq(&s.orders.column::<i64>("CUSTOMER_ID"))),
        )
        .order_descending(&spent);
    let who = query.bind(&name);
    let amount = query.bind(&spent);

    let mut rows = Vec::new();
    query
        .read_each(&conn, || {
            rows.push((who.get()?, amount.get()?));
            Ok(())
        })
        .unwrap();
    assert_eq!(rows, vec![(String::from("ann"), 15.5), (String::from("bob"), 1.0)]);
}

#[derive(Debug, Default, PartialEq)]
struct Customer {
    id: i64,
    name: String,
    orders: Vec<Order>,
}

#[derive(Debug, Default, PartialEq)]
struct Order {
    total: f64,
}

#[test]
fn test_mapper_groups_left_join() {
    let conn = setup();
    let ann = add_customer(&conn, "ann");
    add_customer(&conn, "bob");
    add_order(&conn, ann, 2.0);
    add_order(&conn, ann, 3.0);

    let s = schema();
    let id = s.customers.column::<i64>("ID");
    let order_id = s.orders.column::<i64>("ID");
    let mut query = Statement::select()
        .from(
            s.customers
                .left_join(&s.orders)
                .on(id.eq(&s.orders.column::<i64>("CUSTOMER_ID"))),
        )
        .order_by(&id)
        .order_by(&order_id);

    let mut mapper = Mapper::<Customer>::new()
        .map2(&id, &s.customers.column::<String>("NAME"), |c, id, name| {
            c.id = id;
            c.name = name;
        })
        .group_on(&id)
        .group(
            Mapper::<Order>::new()
                .map(&s.orders.column::<Option<f64>>("TOTAL"), |o, t| o.total = t.unwrap_or_default())
                .group_when(|_, _| true),
            |c, orders| c.orders = orders,
        );

    let customers = query.read_all(&conn, &mut mapper).unwrap();
    assert_eq!(customers.len(), 2);
    assert_eq!(customers[0].orders, vec![Order { total: 2.0 }, Order { total: 3.0 }]);
    assert_eq!(customers[1].name, "bob");
    assert_eq!(customers[1].orders, vec![Order { total: 0.0 }]);
}

#[test]
fn test_inline_table() {
    let conn = setup();
    let ann = add_customer(&conn, "ann");
    add_order(&conn, ann, 4.0);
    add_order(&conn, ann, 6.0);

    let s = schema();
    let buyer = s.orders.column::<i64>("CUSTOMER_ID");
    let per_customer = Statement::select()
        .add_select(&buyer)
        .add_select(&s.orders.column::<f64>("TOTAL").avg().alias("AVERAGE"))
        .from(&s.orders);
    let stats = TableRef::inline(per_customer, "STATS");
    let average = stats.column::<f64>("AVERAGE");

    let mut query = Statement::select().from(stats);
    assert_eq!(query.read_value(&conn, &average).unwrap(), Some(5.0));
}

#[test]
fn test_case_when_and_column_lookup() {
    let conn = setup();
    add_customer(&conn, "ann");
    let s = schema();
    let active = s.customers.column::<bool>("ACTIVE");
    let status = case_when::<String>(active.eq(true), "on", "off").alias("STATUS");

    let sql = Statement::select()
        .add_select(&status)
        .from(&s.customers)
        .to_sql(conn.dialect())
        .unwrap();
    let mut rows = conn.query_sql(&sql).unwrap();
    assert!(rows.advance().unwrap());
    assert_eq!(rows.get::<String>("status").unwrap(), "on");

    let err = rows.get::<Option<String>>("MISSING").unwrap_err();
    assert!(matches!(err, QueryError::ColumnNotFound(name) if name == "MISSING"));
}

#[test]
fn test_transaction_rollback() {
    let conn = setup();
    conn.begin_transaction().unwrap();
    add_customer(&conn, "ann");
    conn.rollback().unwrap();

    conn.begin_transaction().unwrap();
    add_customer(&conn, "bob");
    conn.commit().unwrap();

    let s = schema();
    let name = s.customers.column::<String>("NAME");
    let mut query = Statement::select().from(&s.customers);
    assert_eq!(query.read_values(&conn, &name).unwrap(), vec!["bob"]);
}

#[test]
fn test_table_exists_and_delete_all() {
    let conn = setup();
    add_customer(&conn, "ann");
    let s = schema();

    assert!(conn.table_exists("customers").unwrap());
    assert!(!conn.table_exists("MISSING").unwrap());
    assert_eq!(conn.delete_all(&s.customers).unwrap(), 1);
}

#[test]
fn test_execution_error_carries_sql() {
    let conn = setup();
    let err = conn.execute_sql("INSERT INTO NOWHERE VALUES (1)").unwrap_err();
    assert_eq!(err.sql(), Some("INSERT INTO NOWHERE VALUES (1)"));
    assert!(err.to_string().contains("no such table"));
}

#[test]
fn test_stored_procedure_reports_unsupported() {
    let conn = setup();
    let mut call = StoredProcedure::call("PURGE").input("DAYS", 30_i64);
    assert!(matches!(call.execute(&conn), Err(QueryError::Execution { .. })));
}

#[test]
fn test_settings_enable_foreign_keys() {
    let settings: ConnectionSettings =
        serde_json::from_str(r#"{"provider": "sqlite", "database": ":memory:", "foreign_keys": true}"#).unwrap();
    let conn = SqliteConnection::from_settings(&settings).unwrap();

    let mut rows = conn.query_sql("PRAGMA foreign_keys").unwrap();
    assert!(rows.advance().unwrap());
    assert_eq!(rows.value(0_usize).unwrap(), &SqlValue::Int(1));
}
