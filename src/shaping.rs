use crate::{
    parameters::value_to_key,
    result::{HopperError, Result},
};
use serde::Serialize;
use serde_json::Value;
use std::str::FromStr;

/// One result row: column name to value, in column order
pub type Row = serde_json::Map<String, Value>;

/// Shape selector for query results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultMode {
    /// Single-column results flatten to a list, otherwise rows as mappings
    #[default]
    Array,
    /// Like `Array`, but multi-column rows lose their column names
    List,
    /// Always every row as a mapping (`2dim`)
    ArrayOfArrays,
    /// First row as a record
    Object,
    /// Every row as a record (`class`)
    ArrayOfObjects,
    /// Every row as a record
    Bound,
    /// First column of the first row
    Number,
    /// First column of the first row
    Value,
    /// First column mapped to second column
    KeyPair,
}

impl FromStr for ResultMode {
    type Err = HopperError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "array" => Ok(ResultMode::Array),
            "list" => Ok(ResultMode::List),
            "2dim" | "arrays" => Ok(ResultMode::ArrayOfArrays),
            "object" => Ok(ResultMode::Object),
            "class" | "objects" => Ok(ResultMode::ArrayOfObjects),
            "bound" => Ok(ResultMode::Bound),
            "number" => Ok(ResultMode::Number),
            "value" => Ok(ResultMode::Value),
            "keypair" | "key_pair" => Ok(ResultMode::KeyPair),
            other => Err(HopperError::new_validation(format!(
                "unknown result mode '{other}'"
            ))),
        }
    }
}

impl std::fmt::Display for ResultMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ResultMode::Array => "array",
            ResultMode::List => "list",
            ResultMode::ArrayOfArrays => "2dim",
            ResultMode::Object => "object",
            ResultMode::ArrayOfObjects => "class",
            ResultMode::Bound => "bound",
            ResultMode::Number => "number",
            ResultMode::Value => "value",
            ResultMode::KeyPair => "keypair",
        };
        write!(f, "{s}")
    }
}

impl ResultMode {
    /// Modes that answer "no result" instead of an empty collection
    pub fn is_single_row(&self) -> bool {
        matches!(
            self,
            ResultMode::Value | ResultMode::Number | ResultMode::Object
        )
    }
}

/// A shaped query result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Selected {
    Value(Value),
    List(Vec<Value>),
    Rows(Vec<Row>),
    Record(Row),
    /// Rows keyed by the value of an index column
    Indexed(serde_json::Map<String, Value>),
    /// First column value to second column value
    Pairs(serde_json::Map<String, Value>),
}

impl Selected {
    pub fn into_value(self) -> Option<Value> {
        match self {
            Selected::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_list(self) -> Option<Vec<Value>> {
        match self {
            Selected::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn into_rows(self) -> Option<Vec<Row>> {
        match self {
            Selected::Rows(rows) => Some(rows),
            _ => None,
        }
    }

    pub fn into_record(self) -> Option<Row> {
        match self {
            Selected::Record(row) => Some(row),
            _ => None,
        }
    }

    pub fn into_map(self) -> Option<serde_json::Map<String, Value>> {
        match self {
            Selected::Indexed(map) | Selected::Pairs(map) => Some(map),
            _ => None,
        }
    }

    /// Convert to a plain JSON value
    pub fn to_json(&self) -> Value {
        match self {
            Selected::Value(v) => v.clone(),
            Selected::List(list) => Value::Array(list.clone()),
            Selected::Rows(rows) => {
                Value::Array(rows.iter().cloned().map(Value::Object).collect())
            }
            Selected::Record(row) => Value::Object(row.clone()),
            Selected::Indexed(map) | Selected::Pairs(map) => Value::Object(map.clone()),
        }
    }
}

fn first_column(row: &Row) -> Value {
    row.values().next().cloned().unwrap_or(Value::Null)
}

/// Reshape raw rows according to `mode`.
///
/// `index_field` takes priority over the mode. Returns `Ok(None)` when a
/// single-row mode meets an empty result.
pub fn normalize(rows: Vec<Row>, mode: ResultMode, index_field: Option<&str>) -> Result<Option<Selected>> {
    if let Some(index) = index_field {
        let mut indexed = serde_json::Map::new();
        for row in rows {
            let key = row.get(index).map(value_to_key).ok_or_else(|| {
                HopperError::new_validation(format!("index column '{index}' not in result row"))
            })?;
            indexed.insert(key, Value::Object(row));
        }
        return Ok(Some(Selected::Indexed(indexed)));
    }

    let shaped = match mode {
        ResultMode::Value | ResultMode::Number => rows.first().map(|row| Selected::Value(first_column(row))),
        ResultMode::Array => {
            if !rows.is_empty() && rows.iter().all(|row| row.len() == 1) {
                Some(Selected::List(rows.iter().map(first_column).collect()))
            } else {
                Some(Selected::Rows(rows))
            }
        }
        ResultMode::List => {
            let list = rows
                .into_iter()
                .map(|row| {
                    if row.len() == 1 {
                        first_column(&row)
                    } else {
                        Value::Array(row.into_iter().map(|(_, v)| v).collect())
                    }
                })
                .collect();
            Some(Selected::List(list))
        }
        ResultMode::Object => rows.into_iter().next().map(Selected::Record),
        ResultMode::ArrayOfArrays | ResultMode::ArrayOfObjects | ResultMode::Bound => {
            Some(Selected::Rows(rows))
        }
        ResultMode::KeyPair => {
            let mut pairs = serde_json::Map::new();
            for row in rows {
                let mut values = row.into_iter().map(|(_, v)| v);
                let key = values.next().map(|v| value_to_key(&v)).unwrap_or_default();
                pairs.insert(key, values.next().unwrap_or(Value::Null));
            }
            Some(Selected::Pairs(pairs))
        }
    };

    Ok(shaped)
}
