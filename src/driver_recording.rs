use crate::{
    config::DriverKind,
    driver::{RowCursor, SqlDriver},
    result::DriverError,
    shaping::Row,
};
use serde_json::Value;
use std::collections::VecDeque;

/// A recorded statement execution for verification.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedQuery {
    pub sql: String,
    pub params: Vec<Value>,
    /// True when issued through `execute_direct`
    pub direct: bool,
}

/// A scripted in-memory driver for testing.
///
/// Queued responses are returned in FIFO order; once the queue is empty the
/// default response is used. Every statement is recorded.
///
/// # Example
/// ```
/// use hopper_sql::{Hopper, RecordingDriver, ResultMode};
/// use serde_json::json;
///
/// let driver = RecordingDriver::new().with_rows(&["count"], vec![vec![json!(5)]]);
/// let mut hopper = Hopper::new(driver);
/// let count = hopper.select("SELECT count(*) AS count FROM t", None, ResultMode::Value, None).unwrap();
/// assert_eq!(count.into_value(), Some(json!(5)));
/// ```
pub struct RecordingDriver {
    responses: VecDeque<Result<RowCursor, DriverError>>,
    recorded_queries: Vec<RecordedQuery>,
    default_response: RowCursor,
    insert_id: i64,
    kind: DriverKind,
}

impl Default for RecordingDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingDriver {
    /// Create a new recording driver with no pre-configured responses.
    pub fn new() -> Self {
        RecordingDriver {
            responses: VecDeque::new(),
            recorded_queries: Vec::new(),
            default_response: RowCursor::empty(),
            insert_id: 0,
            kind: DriverKind::Mysql,
        }
    }

    /// Add a response to be returned by the next statement.
    pub fn with_response(mut self, response: RowCursor) -> Self {
        self.responses.push_back(Ok(response));
        self
    }

    /// Queue a result set built from column names and positional row values.
    pub fn with_rows(self, columns: &[&str], rows: Vec<Vec<Value>>) -> Self {
        let columns: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
        let rows = rows
            .into_iter()
            .map(|values| columns.iter().cloned().zip(values).collect::<Row>())
            .collect();
        self.with_response(RowCursor::with_rows(columns, rows))
    }

    /// Queue a write that reports `count` changed rows.
    pub fn with_affected(self, count: u64) -> Self {
        self.with_response(RowCursor::affected(count))
    }

    /// Queue a failure for the next statement.
    pub fn with_error(mut self, message: &str) -> Self {
        self.responses.push_back(Err(DriverError::new(message)));
        self
    }

    /// Set a default response to use when no queued responses remain.
    pub fn with_default_response(mut self, response: RowCursor) -> Self {
        self.default_response = response;
        self
    }

    /// Id reported by `last_insert_id`.
    pub fn with_insert_id(mut self, id: i64) -> Self {
        self.insert_id = id;
        self
    }

    pub fn with_kind(mut self, kind: DriverKind) -> Self {
        self.kind = kind;
        self
    }

    /// Get all recorded statements that have been executed.
    pub fn recorded_queries(&self) -> &[RecordedQuery] {
        &self.recorded_queries
    }

    /// Get the last recorded statement, if any.
    pub fn last_query(&self) -> Option<&RecordedQuery> {
        self.recorded_queries.last()
    }

    fn respond(&mut self, sql: &str, params: &[Value], direct: bool) -> Result<RowCursor, DriverError> {
        self.recorded_queries.push(RecordedQuery {
            sql: sql.to_string(),
            params: params.to_vec(),
            direct,
        });
        self.responses
            .pop_front()
            .unwrap_or_else(|| Ok(self.default_response.clone()))
    }
}

impl SqlDriver for RecordingDriver {
    fn prepare_and_execute(&mut self, sql: &str, params: &[Value]) -> Result<RowCursor, DriverError> {
        self.respond(sql, params, false)
    }

    fn execute_direct(&mut self, sql: &str) -> Result<RowCursor, DriverError> {
        self.respond(sql, &[], true)
    }

    fn last_insert_id(&self) -> i64 {
        self.insert_id
    }

    fn kind(&self) -> DriverKind {
        self.kind
    }
}
