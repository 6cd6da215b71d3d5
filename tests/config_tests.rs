use hopper_sql::{DriverKind, Hopper, HopperConfig, HopperError, ResultMode};
use serde_json::json;
use std::io::Write;

#[test]
fn test_config_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "type": "mysql",
            "hostname": "db.internal",
            "database": "shop",
            "username": "app",
            "password": "secret",
            "charset": "utf8",
            "tls": {{ "ca": "/etc/ssl/ca.pem" }},
            "debug": true
        }}"#
    )
    .unwrap();

    let config = HopperConfig::from_file(file.path().to_str().unwrap()).unwrap();
    assert_eq!(config.driver, DriverKind::Mysql);
    assert_eq!(config.username.as_deref(), Some("app"));
    assert_eq!(config.tls.unwrap().ca.as_deref(), Some("/etc/ssl/ca.pem"));
    assert!(config.debug);
}

#[test]
fn test_config_file_missing() {
    let result = HopperConfig::from_file("non_existent_config.json");
    let err = result.unwrap_err();
    assert!(err.downcast_ref::<std::io::Error>().is_some());
}

#[test]
fn test_mysql_config_error_reported_before_connecting() {
    let config = HopperConfig::from_json(json!({
        "type": "mysql",
        "database": "shop",
        "tls": { "key": "/etc/ssl/client.key" }
    }))
    .unwrap();
    match Hopper::connect(&config) {
        Err(HopperError::Connect { dsn, source }) => {
            assert_eq!(dsn, "mysql:host=localhost;dbname=shop");
            assert!(source.message.contains("cert"));
        }
        Err(other) => panic!("Expected Connect error, got: {other:?}"),
        Ok(_) => panic!("Expected Connect error"),
    }
}

#[test]
fn test_mysql_unreachable_server_is_connect_error() {
    let config = HopperConfig::from_json(json!({
        "type": "mysql",
        "hostname": "127.0.0.1",
        "port": 1,
        "database": "shop"
    }))
    .unwrap();
    match Hopper::connect(&config) {
        Err(HopperError::Connect { dsn, .. }) => {
            assert_eq!(dsn, "mysql:host=127.0.0.1;port=1;dbname=shop");
        }
        Err(other) => panic!("Expected Connect error, got: {other:?}"),
        Ok(_) => panic!("Expected Connect error"),
    }
}

#[test]
fn test_sqlite_connect_file_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("site.db");
    let config = HopperConfig::from_json(json!({
        "type": "sqlite",
        "database": path.to_str().unwrap(),
        "error_log_capacity": 5
    }))
    .unwrap();
    assert_eq!(config.dsn(), format!("sqlite:{}", path.to_str().unwrap()));

    {
        let mut hopper = Hopper::connect(&config).unwrap();
        hopper
            .query("CREATE TABLE settings (id INTEGER PRIMARY KEY, name TEXT)")
            .unwrap();
        hopper
            .insert_or_update("settings", &json!({"name": "theme"}), "id")
            .unwrap();
    }

    // data persists across connections
    let mut hopper = Hopper::connect(&config).unwrap();
    let name = hopper
        .select("SELECT name FROM settings", None, ResultMode::Value, None)
        .unwrap();
    assert_eq!(name.into_value(), Some(json!("theme")));
}

#[test]
fn test_sqlite_connect_in_memory() {
    let mut hopper = Hopper::connect(&HopperConfig::sqlite(":memory:")).unwrap();
    let one = hopper
        .select("SELECT 1 AS one", None, ResultMode::Value, None)
        .unwrap();
    assert_eq!(one.into_value(), Some(json!(1)));
}
