use crate::{config::DEFAULT_ERROR_LOG_CAPACITY, result::format_params};
use serde_json::Value;
use std::collections::VecDeque;
use std::panic::Location;

/// One failed statement
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorRecord {
    pub message: String,
    pub sql: String,
    pub params: Vec<Value>,
    /// Call site of the helper method that issued the statement
    pub location: &'static Location<'static>,
}

impl std::fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Database Error: {} in query '{}'",
            self.message, self.sql
        )?;
        if !self.params.is_empty() {
            write!(f, " with params [{}]", format_params(&self.params))?;
        }
        write!(f, " at {}:{}", self.location.file(), self.location.line())
    }
}

/// Mutable bookkeeping owned by one helper instance
#[derive(Debug)]
pub struct ExecutionState {
    last_query: String,
    errors: VecDeque<ErrorRecord>,
    capacity: usize,
    dropped_errors: usize,
    last_insert_id: i64,
    affected_rows: u64,
}

impl Default for ExecutionState {
    fn default() -> Self {
        Self::new(DEFAULT_ERROR_LOG_CAPACITY)
    }
}

impl ExecutionState {
    pub fn new(capacity: usize) -> Self {
        ExecutionState {
            last_query: String::new(),
            errors: VecDeque::new(),
            capacity: capacity.max(1),
            dropped_errors: 0,
            last_insert_id: 0,
            affected_rows: 0,
        }
    }

    pub fn set_last_query(&mut self, sql: &str) {
        self.last_query.clear();
        self.last_query.push_str(sql);
    }

    pub fn last_query(&self) -> &str {
        &self.last_query
    }

    /// Append a record; once full, the oldest record is dropped
    pub fn record_error(
        &mut self,
        message: impl Into<String>,
        sql: &str,
        params: &[Value],
        location: &'static Location<'static>,
    ) {
        if self.errors.len() == self.capacity {
            self.errors.pop_front();
            self.dropped_errors += 1;
        }
        self.errors.push_back(ErrorRecord {
            message: message.into(),
            sql: sql.to_string(),
            params: params.to_vec(),
            location,
        });
    }

    /// All recorded errors, one per line
    pub fn errors(&self) -> Option<String> {
        if self.errors.is_empty() {
            return None;
        }
        let mut lines: Vec<String> = Vec::with_capacity(self.errors.len() + 1);
        if self.dropped_errors > 0 {
            lines.push(format!("({} earlier errors dropped)", self.dropped_errors));
        }
        lines.extend(self.errors.iter().map(ToString::to_string));
        Some(lines.join("\n"))
    }

    pub fn error_records(&self) -> impl Iterator<Item = &ErrorRecord> {
        self.errors.iter()
    }

    pub fn set_last_insert_id(&mut self, id: i64) {
        self.last_insert_id = id;
    }

    pub fn last_insert_id(&self) -> i64 {
        self.last_insert_id
    }

    pub fn set_affected_rows(&mut self, count: u64) {
        self.affected_rows = count;
    }

    pub fn affected_rows(&self) -> u64 {
        self.affected_rows
    }
}
