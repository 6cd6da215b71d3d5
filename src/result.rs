use thiserror::Error;

/// Error reported by a SQL execution backend
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct DriverError {
    pub message: String,
}

impl DriverError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<rusqlite::Error> for DriverError {
    fn from(err: rusqlite::Error) -> Self {
        Self::new(err.to_string())
    }
}

impl From<mysql::Error> for DriverError {
    fn from(err: mysql::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// Main error type for the Hopper database helper
#[derive(Error, Debug)]
pub enum HopperError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Database error: {source} in query: {sql} with params: [{}]", format_params(.params))]
    Driver {
        sql: String,
        params: Vec<serde_json::Value>,
        #[source]
        source: DriverError,
    },
    #[error("No result for query: {sql}")]
    NotFound { sql: String },
    #[error("Could not connect to {dsn}: {source}")]
    Connect {
        dsn: String,
        #[source]
        source: DriverError,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HopperError {
    pub fn new_validation(message: impl Into<String>) -> Self {
        HopperError::Validation(message.into())
    }

    pub fn new_driver(sql: &str, params: &[serde_json::Value], source: DriverError) -> Self {
        HopperError::Driver {
            sql: sql.to_string(),
            params: params.to_vec(),
            source,
        }
    }

    /// True when a single-row fetch found nothing; callers treat this as "no data"
    pub fn is_not_found(&self) -> bool {
        matches!(self, HopperError::NotFound { .. })
    }
}

/// Render a parameter snapshot as a comma separated list
pub fn format_params(params: &[serde_json::Value]) -> String {
    params
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Type alias for Results using HopperError
pub type Result<T> = std::result::Result<T, HopperError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_driver_error_display_includes_sql_and_params() {
        let err = HopperError::new_driver(
            "UPDATE users SET name=? WHERE id=?",
            &[json!("Ann"), json!(4)],
            DriverError::new("no such table: users"),
        );
        assert_eq!(
            err.to_string(),
            "Database error: no such table: users in query: UPDATE users SET name=? WHERE id=? with params: [\"Ann\", 4]"
        );
    }

    #[test]
    fn test_not_found_helper() {
        let err = HopperError::NotFound {
            sql: "SELECT 1".to_string(),
        };
        assert!(err.is_not_found());
        assert!(!HopperError::new_validation("x").is_not_found());
    }
}
