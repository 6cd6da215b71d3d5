use crate::{config::DriverKind, result::DriverError, shaping::Row};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Buffered outcome of one statement
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowCursor {
    /// Result column names; empty for statements that return no rows
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    /// Rows changed by an INSERT/UPDATE/DELETE
    pub affected_rows: u64,
}

impl RowCursor {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_rows(columns: Vec<String>, rows: Vec<Row>) -> Self {
        RowCursor {
            columns,
            rows,
            affected_rows: 0,
        }
    }

    pub fn affected(count: u64) -> Self {
        RowCursor {
            affected_rows: count,
            ..Self::default()
        }
    }

    /// True when the statement produced a result set
    pub fn returns_rows(&self) -> bool {
        !self.columns.is_empty()
    }

    /// Result rows for queries, changed rows for writes
    pub fn row_count(&self) -> u64 {
        if self.returns_rows() {
            self.rows.len() as u64
        } else {
            self.affected_rows
        }
    }

    pub fn first(&self) -> Option<&Row> {
        self.rows.first()
    }

    pub fn fetch_all(self) -> Vec<Row> {
        self.rows
    }

    /// Deserialize every row into a structured record
    pub fn fetch_all_as<T: DeserializeOwned>(self) -> serde_json::Result<Vec<T>> {
        self.rows
            .into_iter()
            .map(|row| serde_json::from_value(Value::Object(row)))
            .collect()
    }
}

/// SQL execution backend consumed by [`crate::Hopper`]
pub trait SqlDriver {
    /// Prepare `sql` and execute it with positional `?` parameters
    fn prepare_and_execute(&mut self, sql: &str, params: &[Value]) -> Result<RowCursor, DriverError>;

    /// Execute `sql` without binding
    fn execute_direct(&mut self, sql: &str) -> Result<RowCursor, DriverError>;

    /// Id generated by the most recent successful insert
    fn last_insert_id(&self) -> i64;

    fn kind(&self) -> DriverKind;
}

impl<D: SqlDriver + ?Sized> SqlDriver for Box<D> {
    fn prepare_and_execute(&mut self, sql: &str, params: &[Value]) -> Result<RowCursor, DriverError> {
        (**self).prepare_and_execute(sql, params)
    }

    fn execute_direct(&mut self, sql: &str) -> Result<RowCursor, DriverError> {
        (**self).execute_direct(sql)
    }

    fn last_insert_id(&self) -> i64 {
        (**self).last_insert_id()
    }

    fn kind(&self) -> DriverKind {
        (**self).kind()
    }
}
