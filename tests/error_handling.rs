use hopper_sql::{DriverError, Hopper, HopperError, RecordingDriver, ResultMode, SqliteDriver};
use rusqlite::Connection;
use serde_json::json;

fn setup_db() -> Hopper<SqliteDriver> {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute(
        "CREATE TABLE source (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT UNIQUE, score REAL)",
        [],
    )
    .unwrap();
    Hopper::new(SqliteDriver::new(conn))
}

#[test]
fn test_sql_syntax_error_is_propagated_and_logged() {
    let mut hopper = setup_db();

    let result = hopper.query("INVALID SQL SYNTAX THAT WILL FAIL");
    let err = result.unwrap_err();
    match &err {
        HopperError::Driver { sql, params, source } => {
            assert_eq!(sql, "INVALID SQL SYNTAX THAT WILL FAIL");
            assert!(params.is_empty());
            assert!(source.message.contains("syntax"));
        }
        other => panic!("Expected Driver error, got: {other:?}"),
    }

    // the driver error is reachable as the error source
    let source = std::error::Error::source(&err).unwrap();
    assert!(source.downcast_ref::<DriverError>().is_some());

    assert_eq!(hopper.get_last_query(), "INVALID SQL SYNTAX THAT WILL FAIL");
    let log = hopper.get_errors().unwrap();
    assert!(log.starts_with("Database Error: "));
    assert!(log.contains("INVALID SQL SYNTAX THAT WILL FAIL"));
}

#[test]
fn test_error_records_point_at_caller() {
    let mut hopper = setup_db();
    let _ = hopper.select("SELECT nope FROM missing", None, ResultMode::Array, None);

    let records: Vec<_> = hopper.error_records().collect();
    assert_eq!(records.len(), 1);
    assert!(records[0].location.file().ends_with("error_handling.rs"));
    assert_eq!(records[0].sql, "SELECT nope FROM missing");
}

#[test]
fn test_constraint_violation_carries_params() {
    let mut hopper = setup_db();
    hopper
        .insert_or_update("source", &json!({"name": "John"}), "id")
        .unwrap();

    let err = hopper
        .insert_or_update("source", &json!({"name": "John", "score": 1.5}), "id")
        .unwrap_err();
    match err {
        HopperError::Driver { sql, params, source } => {
            assert_eq!(sql, "INSERT INTO source (name, score) VALUES (?, ?)");
            assert_eq!(params, vec![json!("John"), json!(1.5)]);
            assert!(source.message.contains("UNIQUE"));
        }
        other => panic!("Expected Driver error, got: {other:?}"),
    }

    // a failed insert does not move the last insert id
    assert_eq!(hopper.last_insert_id(), 1);
}

#[test]
fn test_errors_accumulate_across_calls() {
    let mut hopper = setup_db();
    assert!(hopper.get_errors().is_none());

    let _ = hopper.query("SELEC 1");
    hopper.query("SELECT 1").unwrap();
    let _ = hopper.execute("DELETE FROM nowhere WHERE id=?", &[json!(1)]);

    let log = hopper.get_errors().unwrap();
    assert_eq!(log.lines().count(), 2);
    assert!(log.lines().nth(1).unwrap().contains("with params [1]"));
    assert_eq!(hopper.get_last_query(), "DELETE FROM nowhere WHERE id=?");
}

#[test]
fn test_error_log_capacity() {
    let driver = RecordingDriver::new()
        .with_error("e1")
        .with_error("e2")
        .with_error("e3");
    let mut hopper = Hopper::new(driver).with_error_log_capacity(2);

    for sql in ["A", "B", "C"] {
        assert!(hopper.query(sql).is_err());
    }
    let messages: Vec<&str> = hopper.error_records().map(|r| r.message.as_str()).collect();
    assert_eq!(messages, vec!["e2", "e3"]);
}

#[test]
fn test_key_value_replace_stops_at_failed_delete() {
    let driver = RecordingDriver::new().with_error("table is locked");
    let mut hopper = Hopper::new(driver);
    let settings = hopper_sql::KeyValueSettings::new("record_id", 1, "k", "v");

    let result = hopper.replace_key_value_set("props", &json!({"a": 1}), &settings);
    assert!(matches!(result, Err(HopperError::Driver { .. })));
    assert_eq!(hopper.driver().recorded_queries().len(), 1);
}

#[test]
fn test_index_field_missing_from_rows() {
    let mut hopper = setup_db();
    hopper.insert_or_update("source", &json!({"name": "a"}), "id").unwrap();
    let result = hopper.select("SELECT id FROM source", None, ResultMode::Array, Some("slug"));
    assert!(matches!(result, Err(HopperError::Validation(_))));
}
