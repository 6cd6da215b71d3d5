use crate::{
    config::DriverKind,
    driver::{RowCursor, SqlDriver},
    result::DriverError,
    shaping::Row,
};
use rusqlite::Connection;
use rusqlite::types::{Value as SqliteValue, ValueRef};
use serde_json::Value;

/// Convert a JSON scalar into an owned SQLite value
/// SQLite represents booleans as integers; arrays and objects are stored as JSON text
pub fn json_to_sqlite(value: &Value) -> Result<SqliteValue, DriverError> {
    let converted = match value {
        Value::Null => SqliteValue::Null,
        Value::Bool(b) => SqliteValue::Integer(*b as i64),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                SqliteValue::Integer(i)
            } else if n.is_u64() {
                return Err(DriverError::new(format!(
                    "integer parameter {n} does not fit a 64-bit signed SQLite integer"
                )));
            } else {
                SqliteValue::Real(n.as_f64().unwrap_or_default())
            }
        }
        Value::String(s) => SqliteValue::Text(s.clone()),
        other => SqliteValue::Text(other.to_string()),
    };
    Ok(converted)
}

/// Convert a borrowed SQLite column value into JSON
pub fn sqlite_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Integer(i) => Value::Number(i.into()),
        ValueRef::Real(r) => Value::from(r),
        ValueRef::Text(s) => Value::String(String::from_utf8_lossy(s).to_string()),
        ValueRef::Blob(b) => Value::Array(b.iter().map(|&byte| Value::Number(byte.into())).collect()),
        ValueRef::Null => Value::Null,
    }
}

/// [`SqlDriver`] backed by a rusqlite connection
pub struct SqliteDriver {
    conn: Connection,
}

impl SqliteDriver {
    pub fn new(conn: Connection) -> Self {
        SqliteDriver { conn }
    }

    /// Open a database file, or an in-memory database for `:memory:`
    pub fn open(path: &str) -> Result<Self, DriverError> {
        let conn = if path == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(path)?
        };
        Ok(Self::new(conn))
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn into_inner(self) -> Connection {
        self.conn
    }
}

impl From<Connection> for SqliteDriver {
    fn from(conn: Connection) -> Self {
        Self::new(conn)
    }
}

impl SqlDriver for SqliteDriver {
    fn prepare_and_execute(&mut self, sql: &str, params: &[Value]) -> Result<RowCursor, DriverError> {
        let mut stmt = self.conn.prepare(sql)?;
        let values = params
            .iter()
            .map(json_to_sqlite)
            .collect::<Result<Vec<SqliteValue>, DriverError>>()?;

        // DDL leaves sqlite3_changes() at the previous write's count
        let changes_before = self.conn.total_changes();

        if stmt.column_count() == 0 {
            stmt.execute(rusqlite::params_from_iter(values.iter()))?;
            let affected = self.conn.total_changes() - changes_before;
            return Ok(RowCursor::affected(affected as u64));
        }

        let columns: Vec<String> = stmt
            .column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();

        let mut result_rows = Vec::new();
        let mut rows = stmt.query(rusqlite::params_from_iter(values.iter()))?;
        while let Some(row) = rows.next()? {
            let mut obj = Row::new();
            for (idx, name) in columns.iter().enumerate() {
                obj.insert(name.clone(), sqlite_to_json(row.get_ref(idx)?));
            }
            result_rows.push(obj);
        }

        drop(rows);
        // RETURNING clauses report changes alongside rows
        let affected = self.conn.total_changes() - changes_before;
        let mut cursor = RowCursor::with_rows(columns, result_rows);
        cursor.affected_rows = affected as u64;
        Ok(cursor)
    }

    fn execute_direct(&mut self, sql: &str) -> Result<RowCursor, DriverError> {
        self.prepare_and_execute(sql, &[])
    }

    fn last_insert_id(&self) -> i64 {
        self.conn.last_insert_rowid()
    }

    fn kind(&self) -> DriverKind {
        DriverKind::Sqlite
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn setup() -> SqliteDriver {
        let driver = SqliteDriver::open(":memory:").unwrap();
        driver
            .connection()
            .execute(
                "CREATE TABLE source (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT, score REAL, data BLOB)",
                [],
            )
            .unwrap();
        driver
    }

    #[test]
    fn test_write_reports_affected_rows() {
        let mut driver = setup();
        let cursor = driver
            .prepare_and_execute(
                "INSERT INTO source (name, score) VALUES (?, ?), (?, ?)",
                &[json!("John"), json!(1.5), json!("Jane"), json!(null)],
            )
            .unwrap();
        assert!(!cursor.returns_rows());
        assert_eq!(cursor.affected_rows, 2);
        assert_eq!(driver.last_insert_id(), 2);
    }

    #[test]
    fn test_select_maps_column_types() {
        let mut driver = setup();
        driver
            .execute_direct("INSERT INTO source VALUES (1, 'John', 2.5, X'010203'), (2, NULL, NULL, NULL)")
            .unwrap();

        let cursor = driver
            .prepare_and_execute("SELECT id, name, score, data FROM source ORDER BY id", &[])
            .unwrap();
        assert_eq!(cursor.columns, vec!["id", "name", "score", "data"]);
        assert_eq!(
            Value::Object(cursor.rows[0].clone()),
            json!({"id": 1, "name": "John", "score": 2.5, "data": [1, 2, 3]})
        );
        assert_eq!(
            Value::Object(cursor.rows[1].clone()),
            json!({"id": 2, "name": null, "score": null, "data": null})
        );
    }

    #[test]
    fn test_booleans_bind_as_integers() {
        let mut driver = setup();
        driver
            .prepare_and_execute("INSERT INTO source (name, score) VALUES (?, ?)", &[json!("x"), json!(true)])
            .unwrap();
        let cursor = driver
            .prepare_and_execute("SELECT score FROM source WHERE score = ?", &[json!(1)])
            .unwrap();
        assert_eq!(cursor.rows.len(), 1);
    }

    #[test]
    fn test_schema_change_reports_no_affected_rows() {
        let mut driver = setup();
        driver
            .execute_direct("INSERT INTO source (name) VALUES ('a'), ('b')")
            .unwrap();
        let cursor = driver.execute_direct("CREATE TABLE other (id INTEGER)").unwrap();
        assert_eq!(cursor.affected_rows, 0);
    }

    #[test]
    fn test_unsigned_beyond_i64_is_rejected() {
        let mut driver = setup();
        let err = driver
            .prepare_and_execute("INSERT INTO source (score) VALUES (?)", &[json!(u64::MAX)])
            .unwrap_err();
        assert!(err.message.contains("18446744073709551615"));
        assert_eq!(json_to_sqlite(&json!(i64::MAX)).unwrap(), SqliteValue::Integer(i64::MAX));
        assert_eq!(json_to_sqlite(&json!(1.5)).unwrap(), SqliteValue::Real(1.5));
    }

    #[test]
    fn test_syntax_error_is_driver_error() {
        let mut driver = setup();
        let err = driver.execute_direct("INVALID SQL SYNTAX").unwrap_err();
        assert!(err.message.contains("syntax"));
    }
}
