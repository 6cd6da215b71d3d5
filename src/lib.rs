pub mod config;
pub mod connection;
pub mod driver;
pub mod driver_mysql;
pub mod driver_recording;
pub mod driver_sqlite;
pub mod hopper;
pub mod navigation;
pub mod parameters;
pub mod query;
pub mod result;
pub mod shaping;
pub mod state;
pub mod str_utils;
pub mod tree;

// Re-export types for convenience
pub use config::{DriverKind, HopperConfig, TlsConfig};
pub use connection::DatabaseConnection;
pub use driver::{RowCursor, SqlDriver};
pub use driver_mysql::MysqlDriver;
pub use driver_recording::{RecordedQuery, RecordingDriver};
pub use driver_sqlite::SqliteDriver;
pub use hopper::Hopper;
pub use navigation::{Neighbors, RowWindow, neighbor_ids};
pub use parameters::{Binding, FieldSelector, FieldSet, IdSet, bind_field_set};
pub use query::{KeyValueSettings, QuerySpec};
pub use result::{DriverError, HopperError, Result};
pub use shaping::{ResultMode, Row, Selected, normalize};
pub use state::{ErrorRecord, ExecutionState};
pub use tree::{Tree, TreeSpec};

// Re-export third-party types used in the public API to provide fallback for dependency conflicts
pub use serde_json::Value as JsonValue;

// Re-export third-party types used in the public API to provide fallback for dependency conflicts
pub use rusqlite::Connection as SqliteConnection;
