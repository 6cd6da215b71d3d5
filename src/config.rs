use serde::{Deserialize, Serialize};
use std::fs;

pub const DEFAULT_ERROR_LOG_CAPACITY: usize = 100;
pub const DEFAULT_MYSQL_HOST: &str = "localhost";

/// Database backend selected by the `type` setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    Mysql,
    Sqlite,
}

impl std::fmt::Display for DriverKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DriverKind::Mysql => "mysql",
            DriverKind::Sqlite => "sqlite",
        };
        write!(f, "{s}")
    }
}

/// TLS material paths for network backends
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TlsConfig {
    pub ca: Option<String>,
    pub cert: Option<String>,
    pub key: Option<String>,
}

/// Connection settings, loaded before a [`crate::Hopper`] is constructed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HopperConfig {
    #[serde(rename = "type")]
    pub driver: DriverKind,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub charset: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub tls: Option<TlsConfig>,
    /// Include parameter snapshots when logging driver errors
    #[serde(default)]
    pub debug: bool,
    #[serde(default = "default_error_log_capacity")]
    pub error_log_capacity: usize,
}

fn default_error_log_capacity() -> usize {
    DEFAULT_ERROR_LOG_CAPACITY
}

impl HopperConfig {
    /// Settings for a SQLite database file (or `:memory:`)
    pub fn sqlite(database: impl Into<String>) -> Self {
        HopperConfig {
            driver: DriverKind::Sqlite,
            hostname: None,
            database: Some(database.into()),
            username: None,
            password: None,
            charset: None,
            port: None,
            tls: None,
            debug: false,
            error_log_capacity: DEFAULT_ERROR_LOG_CAPACITY,
        }
    }

    /// Load settings from a JSON file
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let json: serde_json::Value = serde_json::from_str(&content)?;
        Self::from_json(json)
    }

    /// Load settings from a serde_json::Value object
    pub fn from_json(json: serde_json::Value) -> anyhow::Result<Self> {
        let config: HopperConfig = serde_json::from_value(json)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.driver == DriverKind::Sqlite && self.database.as_deref().is_none_or(str::is_empty)
        {
            anyhow::bail!("sqlite configuration requires a 'database' path");
        }
        if self.error_log_capacity == 0 {
            anyhow::bail!("'error_log_capacity' must be at least 1");
        }
        Ok(())
    }

    /// Data source name describing the connection target
    pub fn dsn(&self) -> String {
        match self.driver {
            DriverKind::Mysql => {
                let host = self.hostname.as_deref().unwrap_or(DEFAULT_MYSQL_HOST);
                let mut dsn = format!("mysql:host={host}");
                if let Some(port) = self.port {
                    dsn.push_str(&format!(";port={port}"));
                }
                if let Some(database) = &self.database {
                    dsn.push_str(&format!(";dbname={database}"));
                }
                if let Some(charset) = &self.charset {
                    dsn.push_str(&format!(";charset={charset}"));
                }
                dsn
            }
            DriverKind::Sqlite => {
                format!("sqlite:{}", self.database.as_deref().unwrap_or_default())
            }
        }
    }
}
