use crate::str_utils::count_placeholders;
use serde_json::Value;

/// Parameterized SQL text plus its positional arguments
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QuerySpec {
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        QuerySpec {
            sql: sql.into(),
            params,
        }
    }

    /// A statement with no bound parameters
    pub fn direct(sql: impl Into<String>) -> Self {
        Self::new(sql, Vec::new())
    }

    /// Number of `?` placeholders outside quoted literals
    pub fn placeholder_count(&self) -> usize {
        count_placeholders(&self.sql)
    }
}
