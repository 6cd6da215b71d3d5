use hopper_sql::{Hopper, KeyValueSettings, ResultMode, SqliteDriver};
use rusqlite::Connection;
use serde_json::{Value, json};

fn setup_db() -> Hopper<SqliteDriver> {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute(
        "CREATE TABLE product_props (id INTEGER PRIMARY KEY AUTOINCREMENT, product_id INTEGER, lang TEXT, field_name TEXT, value TEXT)",
        [],
    )
    .unwrap();
    Hopper::new(SqliteDriver::new(conn))
}

fn props_of(hopper: &mut Hopper<SqliteDriver>, product_id: i64) -> Value {
    hopper
        .select(
            "SELECT field_name, value FROM product_props WHERE product_id=? ORDER BY field_name",
            Some(&[json!(product_id)]),
            ResultMode::KeyPair,
            None,
        )
        .unwrap()
        .to_json()
}

fn settings(product_id: i64) -> KeyValueSettings {
    KeyValueSettings::new("product_id", product_id, "field_name", "value").with_dependent_field("lang", "en")
}

#[test]
fn test_replace_writes_one_row_per_entry() {
    let mut hopper = setup_db();

    let inserted = hopper
        .replace_key_value_set("product_props", &json!({"color": "red", "size": "L"}), &settings(1))
        .unwrap();
    assert_eq!(inserted, 2);
    assert_eq!(props_of(&mut hopper, 1), json!({"color": "red", "size": "L"}));

    let langs = hopper
        .select("SELECT DISTINCT lang FROM product_props", None, ResultMode::Array, None)
        .unwrap();
    assert_eq!(langs.into_list().unwrap(), vec![json!("en")]);
}

#[test]
fn test_replace_is_wholesale_not_merge() {
    let mut hopper = setup_db();
    hopper
        .replace_key_value_set("product_props", &json!({"color": "red", "size": "L"}), &settings(1))
        .unwrap();
    hopper
        .replace_key_value_set("product_props", &json!({"weight": "2kg"}), &settings(1))
        .unwrap();

    assert_eq!(props_of(&mut hopper, 1), json!({"weight": "2kg"}));
}

#[test]
fn test_replace_is_idempotent() {
    let mut hopper = setup_db();
    let entries = json!({"color": "red", "size": "L", "stock": 4});

    hopper
        .replace_key_value_set("product_props", &entries, &settings(1))
        .unwrap();
    let first = props_of(&mut hopper, 1);

    hopper
        .replace_key_value_set("product_props", &entries, &settings(1))
        .unwrap();
    let second = props_of(&mut hopper, 1);

    assert_eq!(first, second);
    assert_eq!(
        hopper
            .row_count("SELECT * FROM product_props WHERE product_id=?", &[json!(1)])
            .unwrap(),
        3
    );
}

#[test]
fn test_replace_leaves_other_records_alone() {
    let mut hopper = setup_db();
    hopper
        .replace_key_value_set("product_props", &json!({"color": "red"}), &settings(1))
        .unwrap();
    hopper
        .replace_key_value_set("product_props", &json!({"color": "blue"}), &settings(2))
        .unwrap();
    hopper
        .replace_key_value_set("product_props", &json!({}), &settings(2))
        .unwrap();

    assert_eq!(props_of(&mut hopper, 1), json!({"color": "red"}));
    assert_eq!(props_of(&mut hopper, 2), json!({}));
}
