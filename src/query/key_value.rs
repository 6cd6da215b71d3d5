use super::{QuerySpec, build_bulk_insert};
use crate::{
    parameters::{FieldSet, validate_identifier, validate_scalar},
    result::{HopperError, Result},
};
use serde::Deserialize;
use serde_json::Value;

/// Layout of a scalable key/value table: one row per named attribute of a parent record
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct KeyValueSettings {
    /// Column holding the parent record id, e.g. `record_id`
    pub record_id_field: String,
    pub record_id: Value,
    /// Column holding the attribute name
    pub key_field: String,
    /// Column holding the attribute value
    pub value_field: String,
    /// Extra columns written with the same value on every row
    #[serde(default)]
    pub dependent_fields: FieldSet,
}

impl KeyValueSettings {
    pub fn new(
        record_id_field: impl Into<String>,
        record_id: impl Into<Value>,
        key_field: impl Into<String>,
        value_field: impl Into<String>,
    ) -> Self {
        KeyValueSettings {
            record_id_field: record_id_field.into(),
            record_id: record_id.into(),
            key_field: key_field.into(),
            value_field: value_field.into(),
            dependent_fields: FieldSet::new(),
        }
    }

    pub fn with_dependent_field(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.dependent_fields.insert(field.into(), value.into());
        self
    }

    /// Column order of every inserted row
    pub fn columns(&self) -> Vec<String> {
        let mut columns = vec![self.record_id_field.clone()];
        columns.extend(
            self.dependent_fields
                .keys()
                .filter(|name| **name != self.record_id_field)
                .cloned(),
        );
        columns.push(self.key_field.clone());
        columns.push(self.value_field.clone());
        columns
    }

    fn validate(&self) -> Result<()> {
        validate_identifier(&self.record_id_field)?;
        validate_identifier(&self.key_field)?;
        validate_identifier(&self.value_field)?;
        validate_scalar(&self.record_id_field, &self.record_id)?;
        if self.record_id.is_null() {
            return Err(HopperError::new_validation("record_id must not be null"));
        }
        for (name, value) in &self.dependent_fields {
            validate_identifier(name)?;
            validate_scalar(name, value)?;
        }
        Ok(())
    }
}

/// Replace every attribute row of one record: a delete followed by a bulk insert.
///
/// Returns only the delete when `entries` is empty.
pub fn build_key_value_replace(
    table: &str,
    settings: &KeyValueSettings,
    entries: &FieldSet,
) -> Result<Vec<QuerySpec>> {
    validate_identifier(table)?;
    settings.validate()?;

    let delete = QuerySpec::new(
        format!("DELETE FROM {table} WHERE {}=?", settings.record_id_field),
        vec![settings.record_id.clone()],
    );
    if entries.is_empty() {
        return Ok(vec![delete]);
    }

    let dependent_values: Vec<Value> = settings
        .dependent_fields
        .iter()
        .filter(|(name, _)| **name != settings.record_id_field)
        .map(|(_, value)| value.clone())
        .collect();

    let rows: Vec<Vec<Value>> = entries
        .iter()
        .map(|(key, value)| {
            let mut row = Vec::with_capacity(dependent_values.len() + 3);
            row.push(settings.record_id.clone());
            row.extend(dependent_values.iter().cloned());
            row.push(Value::String(key.clone()));
            row.push(value.clone());
            row
        })
        .collect();

    let columns = settings.columns();
    let insert = build_bulk_insert(table, columns.as_slice(), &rows)?;
    Ok(vec![delete, insert])
}
