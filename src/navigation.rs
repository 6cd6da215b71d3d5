use crate::{
    parameters::{validate_column_list, validate_identifier, validate_scalar},
    query::QuerySpec,
    result::Result,
    shaping::Row,
};
use serde::Deserialize;
use serde_json::Value;

/// A window of rows around an id, ordered by `id_field`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RowWindow {
    pub table: String,
    pub id: Value,
    #[serde(default = "default_fields")]
    pub fields: String,
    #[serde(default = "default_id_field")]
    pub id_field: String,
    #[serde(default = "default_number_of_rows")]
    pub number_of_rows: u32,
}

fn default_fields() -> String {
    "*".to_string()
}

fn default_id_field() -> String {
    "id".to_string()
}

fn default_number_of_rows() -> u32 {
    1
}

impl RowWindow {
    pub fn new(table: impl Into<String>, id: impl Into<Value>) -> Self {
        RowWindow {
            table: table.into(),
            id: id.into(),
            fields: default_fields(),
            id_field: default_id_field(),
            number_of_rows: default_number_of_rows(),
        }
    }

    pub fn fields(mut self, fields: impl Into<String>) -> Self {
        self.fields = fields.into();
        self
    }

    pub fn id_field(mut self, id_field: impl Into<String>) -> Self {
        self.id_field = id_field.into();
        self
    }

    pub fn rows(mut self, number_of_rows: u32) -> Self {
        self.number_of_rows = number_of_rows.max(1);
        self
    }

    /// Rows requested on each side; zero means one
    fn row_limit(&self) -> u32 {
        self.number_of_rows.max(1)
    }

    fn validate(&self) -> Result<()> {
        validate_identifier(&self.table)?;
        validate_identifier(&self.id_field)?;
        validate_column_list(&self.fields)?;
        validate_scalar(&self.id_field, &self.id)
    }

    /// Rows after `id`, ascending
    pub fn build_next(&self) -> Result<QuerySpec> {
        self.validate()?;
        Ok(QuerySpec::new(
            format!(
                "SELECT {} FROM {} WHERE {}>? ORDER BY {} ASC LIMIT {}",
                self.fields,
                self.table,
                self.id_field,
                self.id_field,
                self.row_limit()
            ),
            vec![self.id.clone()],
        ))
    }

    /// The row at `id` and the rows before it, descending; reversed by the caller
    pub fn build_preceding(&self) -> Result<QuerySpec> {
        self.validate()?;
        Ok(QuerySpec::new(
            format!(
                "SELECT {} FROM {} WHERE {}<=? ORDER BY {} DESC LIMIT {}",
                self.fields,
                self.table,
                self.id_field,
                self.id_field,
                self.row_limit().saturating_add(1)
            ),
            vec![self.id.clone()],
        ))
    }
}

/// Ids before and after a given id
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbors {
    pub prev: Value,
    pub next: Value,
}

/// Find the ids around `id` in an ordered row sequence, wrapping at both ends.
///
/// Returns `None` for an empty sequence. An id that is not present is treated
/// like the first row.
pub fn neighbor_ids(rows: &[Row], id: &Value, field: &str) -> Option<Neighbors> {
    let ids: Vec<Value> = rows
        .iter()
        .map(|row| row.get(field).cloned().unwrap_or(Value::Null))
        .collect();
    let last = ids.len().checked_sub(1)?;
    let pos = ids.iter().position(|candidate| candidate == id).unwrap_or(0);

    let prev = if pos == 0 { ids[last].clone() } else { ids[pos - 1].clone() };
    let next = if pos == last { ids[0].clone() } else { ids[pos + 1].clone() };
    Some(Neighbors { prev, next })
}
