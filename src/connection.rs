use crate::{
    config::{DriverKind, HopperConfig},
    driver::{RowCursor, SqlDriver},
    driver_mysql::MysqlDriver,
    driver_sqlite::SqliteDriver,
    result::{DriverError, HopperError, Result},
};
use serde_json::Value;

/// Database connection enum that holds different database backends
pub enum DatabaseConnection {
    /// MySQL connection
    MySQL(MysqlDriver),
    /// SQLite connection
    SQLite(SqliteDriver),
}

impl DatabaseConnection {
    /// Open the backend named by `config.driver`
    pub fn open(config: &HopperConfig) -> Result<Self> {
        let dsn = config.dsn();
        match config.driver {
            DriverKind::Sqlite => {
                let path = config.database.as_deref().unwrap_or(":memory:");
                let driver = SqliteDriver::open(path)
                    .map_err(|source| HopperError::Connect { dsn, source })?;
                tracing::debug!(path, "opened sqlite connection");
                Ok(DatabaseConnection::SQLite(driver))
            }
            DriverKind::Mysql => {
                let driver = MysqlDriver::connect(config)
                    .map_err(|source| HopperError::Connect { dsn: dsn.clone(), source })?;
                tracing::debug!(dsn = %dsn, "opened mysql connection");
                Ok(DatabaseConnection::MySQL(driver))
            }
        }
    }
}

impl SqlDriver for DatabaseConnection {
    fn prepare_and_execute(&mut self, sql: &str, params: &[Value]) -> std::result::Result<RowCursor, DriverError> {
        match self {
            DatabaseConnection::MySQL(driver) => driver.prepare_and_execute(sql, params),
            DatabaseConnection::SQLite(driver) => driver.prepare_and_execute(sql, params),
        }
    }

    fn execute_direct(&mut self, sql: &str) -> std::result::Result<RowCursor, DriverError> {
        match self {
            DatabaseConnection::MySQL(driver) => driver.execute_direct(sql),
            DatabaseConnection::SQLite(driver) => driver.execute_direct(sql),
        }
    }

    fn last_insert_id(&self) -> i64 {
        match self {
            DatabaseConnection::MySQL(driver) => driver.last_insert_id(),
            DatabaseConnection::SQLite(driver) => driver.last_insert_id(),
        }
    }

    fn kind(&self) -> DriverKind {
        match self {
            DatabaseConnection::MySQL(driver) => driver.kind(),
            DatabaseConnection::SQLite(driver) => driver.kind(),
        }
    }
}
