#![allow(dead_code)]

use oxide_query::{Connection, Statement, Table};
use oxide_query_sqlite::SqliteConnection;

pub const SCHEMA: &str = "
    CREATE TABLE CUSTOMERS (
        ID INTEGER PRIMARY KEY AUTOINCREMENT,
        NAME TEXT NOT NULL,
        ACTIVE INTEGER NOT NULL DEFAULT 1,
        CREATED TEXT
    );
    CREATE TABLE ORDERS (
        ID INTEGER PRIMARY KEY AUTOINCREMENT,
        CUSTOMER_ID INTEGER NOT NULL REFERENCES CUSTOMERS (ID),
        TOTAL REAL NOT NULL
    );
";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// In-memory database with the test schema.
pub fn setup() -> SqliteConnection {
    init_tracing();
    let conn = SqliteConnection::open_in_memory().unwrap_or_else(|e| panic!("open failed: {e}"));
    for ddl in SCHEMA.split(';').map(str::trim).filter(|s| !s.is_empty()) {
        conn.execute_sql(ddl)
            .unwrap_or_else(|e| panic!("schema failed: {ddl}\nError: {e}"));
    }
    conn
}

pub struct Schema {
    pub customers: Table,
    pub orders: Table,
}

pub fn schema() -> Schema {
    Schema {
        customers: Table::new("CUSTOMERS"),
        orders: Table::new("ORDERS"),
    }
}

/// Inserts a customer and returns its generated id.
pub fn add_customer(conn: &SqliteConnection, name: &str) -> i64 {
    let customers = Table::new("CUSTOMERS");
    let mut insert = Statement::insert()
        .into(&customers)
        .set(customers.column::<String>("NAME").to(name));
    let id = insert.bind(&customers.column::<i64>("ID"));
    insert
        .execute_non_query(conn)
        .unwrap_or_else(|e| panic!("insert failed: {e}"));
    id.get().unwrap()
}

pub fn add_order(conn: &SqliteConnection, customer: i64, total: f64) {
    let orders = Table::new("ORDERS");
    let mut insert = Statement::insert()
        .into(&orders)
        .set(orders.column::<i64>("CUSTOMER_ID").to(customer))
        .set(orders.column::<f64>("TOTAL").to(total));
    insert
        .execute_non_query(conn)
        .unwrap_or_else(|e| panic!("insert failed: {e}"));
}
