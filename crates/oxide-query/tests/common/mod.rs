#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use oxide_query::{Command, Connection, Dialect, Direction, DriverError, RowSource, SqlValue};

/// One scripted answer to a query.
pub enum Reply {
    Rows(Vec<&'static str>, Vec<Vec<SqlValue>>),
    Fail(&'static str),
}

struct Rows {
    columns: Vec<String>,
    rows: std::vec::IntoIter<Vec<SqlValue>>,
}

impl RowSource for Rows {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn next_row(&mut self) -> Result<Option<Vec<SqlValue>>, DriverError> {
        Ok(self.rows.next())
    }
}

/// Connection answering queries from a script and recording every command.
pub struct ScriptedConnection {
    dialect: &'static dyn Dialect,
    replies: RefCell<VecDeque<Reply>>,
    outputs: RefCell<Vec<SqlValue>>,
    affected: Cell<u64>,
    pub commands: RefCell<Vec<Command>>,
}

impl ScriptedConnection {
    pub fn new(dialect: &'static dyn Dialect) -> Self {
        init_tracing();
        Self {
            dialect,
            replies: RefCell::new(VecDeque::new()),
            outputs: RefCell::new(Vec::new()),
            affected: Cell::new(1),
            commands: RefCell::new(Vec::new()),
        }
    }

    /// Queues rows for the next query.
    pub fn reply(&self, columns: &[&'static str], rows: Vec<Vec<SqlValue>>) -> &Self {
        self.replies
            .borrow_mut()
            .push_back(Reply::Rows(columns.to_vec(), rows));
        self
    }

    /// Queues a provider failure for the next query.
    pub fn fail(&self, message: &'static str) -> &Self {
        self.replies.borrow_mut().push_back(Reply::Fail(message));
        self
    }

    /// Values written into output parameters, in order, by the next commands.
    pub fn outputs(&self, values: Vec<SqlValue>) -> &Self {
        *self.outputs.borrow_mut() = values;
        self
    }

    pub fn affected(&self, count: u64) -> &Self {
        self.affected.set(count);
        self
    }

    pub fn sql(&self, index: usize) -> String {
        self.commands.borrow()[index].sql.clone()
    }

    pub fn command_count(&self) -> usize {
        self.commands.borrow().len()
    }
}

impl Connection for ScriptedConnection {
    fn dialect(&self) -> &dyn Dialect {
        self.dialect
    }

    fn execute_reader(&self, command: &Command) -> Result<Box<dyn RowSource + '_>, DriverError> {
        self.commands.borrow_mut().push(command.clone());
        match self.replies.borrow_mut().pop_front() {
            Some(Reply::Rows(columns, rows)) => Ok(Box::new(Rows {
                columns: columns.into_iter().map(String::from).collect(),
                rows: rows.into_iter(),
            })),
            Some(Reply::Fail(message)) => Err(message.into()),
            None => Ok(Box::new(Rows {
                columns: Vec::new(),
                rows: Vec::new().into_iter(),
            })),
        }
    }

    fn execute_non_query(&self, command: &mut Command) -> Result<u64, DriverError> {
        let mut outputs = self.outputs.borrow().clone().into_iter();
        for parameter in &mut command.parameters {
            if parameter.direction != Direction::Input {
                if let Some(value) = outputs.next() {
                    parameter.value = value;
                }
            }
        }
        self.commands.borrow_mut().push(command.clone());
        Ok(self.affected.get())
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn int(value: i64) -> SqlValue {
    SqlValue::Int(value)
}

pub fn text(value: &str) -> SqlValue {
    SqlValue::Text(String::from(value))
}
