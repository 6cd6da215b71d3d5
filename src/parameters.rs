use crate::result::{HopperError, Result};
use regex::Regex;
use serde_json::Value;

// Regex compiled once as a lazy static for performance
pub static IDENTIFIER_REGEX: once_cell::sync::Lazy<Regex> = once_cell::sync::Lazy::new(|| {
    Regex::new(r"^`?[A-Za-z_][A-Za-z0-9_]*`?(\.`?[A-Za-z_][A-Za-z0-9_]*`?)?$").unwrap()
});

/// Ordered column name to value mapping for a single row write
pub type FieldSet = serde_json::Map<String, Value>;

/// Check that a table or column name is a plain SQL identifier
pub fn validate_identifier(name: &str) -> Result<()> {
    if IDENTIFIER_REGEX.is_match(name) {
        Ok(())
    } else {
        Err(HopperError::new_validation(format!(
            "invalid identifier '{name}' (letters, digits and underscores only)"
        )))
    }
}

pub fn validate_identifiers<S: AsRef<str>>(names: &[S]) -> Result<()> {
    names
        .iter()
        .try_for_each(|name| validate_identifier(name.as_ref()))
}

/// Check a comma separated column list such as `id, title` or `*`
pub fn validate_column_list(list: &str) -> Result<()> {
    if list.trim() == "*" {
        return Ok(());
    }
    list.split(',')
        .try_for_each(|column| validate_identifier(column.trim()))
}

/// Only strings, numbers, booleans and null may be bound to a placeholder
pub fn validate_scalar(name: &str, value: &Value) -> Result<()> {
    match value {
        Value::Array(_) | Value::Object(_) => Err(HopperError::new_validation(format!(
            "value for '{name}' must be a scalar, got {value}"
        ))),
        _ => Ok(()),
    }
}

/// Field names and positional values produced from a FieldSet
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    /// Column names to write, never including the id field
    pub fields: Vec<String>,
    /// Positional values; for updates the id value is last
    pub values: Vec<Value>,
    pub is_update: bool,
}

/// Split a FieldSet into columns and positional values.
///
/// When `id_field` is present the write is an update: the id is removed from
/// the column list and its value is moved to the end of `values`, matching a
/// trailing `WHERE id=?` placeholder.
pub fn bind_field_set(field_set: &Value, id_field: &str) -> Result<Binding> {
    let map = field_set
        .as_object()
        .ok_or_else(|| HopperError::new_validation(format!("expected object, got {field_set}")))?;

    if map.is_empty() {
        return Err(HopperError::new_validation("Key/Value array empty"));
    }

    let mut fields = Vec::with_capacity(map.len());
    let mut values = Vec::with_capacity(map.len());
    let mut id_value = None;

    for (name, value) in map {
        validate_scalar(name, value)?;
        if name == id_field {
            id_value = Some(value.clone());
        } else {
            fields.push(name.clone());
            values.push(value.clone());
        }
    }

    let is_update = id_value.is_some();
    if let Some(id) = id_value {
        values.push(id);
    }

    Ok(Binding {
        fields,
        values,
        is_update,
    })
}

/// One id value or a list of them
#[derive(Debug, Clone, PartialEq)]
pub enum IdSet {
    One(Value),
    Many(Vec<Value>),
}

impl From<Value> for IdSet {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) => IdSet::Many(items),
            other => IdSet::One(other),
        }
    }
}

macro_rules! id_set_from_integer {
    ($($t:ty),*) => {
        $(impl From<$t> for IdSet {
            fn from(value: $t) -> Self {
                IdSet::One(value.into())
            }
        })*
    };
}

id_set_from_integer!(i32, i64, u32, u64);

impl From<&str> for IdSet {
    fn from(value: &str) -> Self {
        IdSet::One(value.into())
    }
}

impl<T: Into<Value>> From<Vec<T>> for IdSet {
    fn from(values: Vec<T>) -> Self {
        IdSet::Many(values.into_iter().map(Into::into).collect())
    }
}

/// One column name or a list of them, paired with an [`IdSet`]
#[derive(Debug, Clone, PartialEq)]
pub enum FieldSelector {
    One(String),
    Many(Vec<String>),
}

impl From<&str> for FieldSelector {
    fn from(field: &str) -> Self {
        FieldSelector::One(field.to_string())
    }
}

impl From<String> for FieldSelector {
    fn from(field: String) -> Self {
        FieldSelector::One(field)
    }
}

impl From<Vec<&str>> for FieldSelector {
    fn from(fields: Vec<&str>) -> Self {
        FieldSelector::Many(fields.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for FieldSelector {
    fn from(fields: Vec<String>) -> Self {
        FieldSelector::Many(fields)
    }
}

/// Convert a value to the string key used by indexed result maps.
/// Null becomes the empty string.
pub fn value_to_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
