use super::QuerySpec;
use crate::{
    config::DriverKind,
    parameters::{FieldSelector, IdSet, validate_identifier, validate_identifiers, validate_scalar},
    result::{HopperError, Result},
    str_utils::{assignment_list, placeholder_list},
};
use serde_json::Value;

/// `INSERT INTO t (a, b) VALUES (?, ?)`
pub fn build_insert(table: &str, fields: &[String], values: &[Value]) -> Result<QuerySpec> {
    validate_identifier(table)?;
    if fields.is_empty() {
        return Err(HopperError::new_validation("no fields to insert"));
    }
    validate_identifiers(fields)?;
    if fields.len() != values.len() {
        return Err(HopperError::new_validation(format!(
            "{} fields but {} values",
            fields.len(),
            values.len()
        )));
    }

    let sql = format!(
        "INSERT INTO {table} ({}) VALUES ({})",
        fields.join(", "),
        placeholder_list(fields.len())
    );
    Ok(QuerySpec::new(sql, values.to_vec()))
}

/// `UPDATE t SET a=?, b=? WHERE id=?`; `values` carries the id value last
pub fn build_update(
    table: &str,
    fields: &[String],
    values: &[Value],
    id_field: &str,
) -> Result<QuerySpec> {
    validate_identifier(table)?;
    validate_identifier(id_field)?;
    if fields.is_empty() {
        return Err(HopperError::new_validation(format!(
            "no fields to update besides '{id_field}'"
        )));
    }
    validate_identifiers(fields)?;
    if fields.len() + 1 != values.len() {
        return Err(HopperError::new_validation(format!(
            "{} fields need {} values including the id, got {}",
            fields.len(),
            fields.len() + 1,
            values.len()
        )));
    }

    let sql = format!(
        "UPDATE {table} SET {} WHERE {id_field}=?",
        assignment_list(fields, ", ")
    );
    Ok(QuerySpec::new(sql, values.to_vec()))
}

/// Build a DELETE for one id, a list of ids on one column, or one id per column.
///
/// A list made only of integers is inlined as `IN(1,2,3)` literals. Any other
/// list is bound as `IN(?, ?)` so that string ids never become SQL text.
pub fn build_delete(table: &str, ids: &IdSet, fields: &FieldSelector) -> Result<QuerySpec> {
    validate_identifier(table)?;

    match (ids, fields) {
        (IdSet::One(id), FieldSelector::One(field)) => {
            validate_identifier(field)?;
            validate_scalar(field, id)?;
            Ok(QuerySpec::new(
                format!("DELETE FROM {table} WHERE {field}=?"),
                vec![id.clone()],
            ))
        }
        (IdSet::Many(ids), FieldSelector::One(field)) => {
            validate_identifier(field)?;
            if ids.is_empty() {
                return Err(HopperError::new_validation("id list is empty"));
            }
            if ids.iter().all(|id| id.is_i64() || id.is_u64()) {
                let literals = ids
                    .iter()
                    .map(|id| id.to_string())
                    .collect::<Vec<_>>()
                    .join(",");
                Ok(QuerySpec::direct(format!(
                    "DELETE FROM {table} WHERE {field} IN({literals})"
                )))
            } else {
                for id in ids {
                    validate_scalar(field, id)?;
                }
                Ok(QuerySpec::new(
                    format!(
                        "DELETE FROM {table} WHERE {field} IN({})",
                        placeholder_list(ids.len())
                    ),
                    ids.clone(),
                ))
            }
        }
        (IdSet::Many(ids), FieldSelector::Many(fields)) => {
            if fields.is_empty() || fields.len() != ids.len() {
                return Err(HopperError::new_validation(format!(
                    "{} fields cannot be matched with {} ids",
                    fields.len(),
                    ids.len()
                )));
            }
            validate_identifiers(fields)?;
            for (field, id) in fields.iter().zip(ids) {
                validate_scalar(field, id)?;
            }
            Ok(QuerySpec::new(
                format!(
                    "DELETE FROM {table} WHERE {}",
                    assignment_list(fields, " AND ")
                ),
                ids.clone(),
            ))
        }
        (IdSet::One(_), FieldSelector::Many(_)) => Err(HopperError::new_validation(
            "a list of fields needs a list of ids of the same length",
        )),
    }
}

/// One `(?, ?)` group per row, values flattened row-major
pub fn build_bulk_insert<S: AsRef<str>>(
    table: &str,
    fields: &[S],
    rows: &[Vec<Value>],
) -> Result<QuerySpec> {
    validate_identifier(table)?;
    if fields.is_empty() {
        return Err(HopperError::new_validation("no fields to insert"));
    }
    validate_identifiers(fields)?;
    if rows.is_empty() {
        return Err(HopperError::new_validation("no rows to insert"));
    }

    let mut params = Vec::with_capacity(rows.len() * fields.len());
    for (idx, row) in rows.iter().enumerate() {
        if row.len() != fields.len() {
            return Err(HopperError::new_validation(format!(
                "row {idx} has {} values, expected {}",
                row.len(),
                fields.len()
            )));
        }
        for (field, value) in fields.iter().zip(row) {
            validate_scalar(field.as_ref(), value)?;
            params.push(value.clone());
        }
    }

    let group = format!("({})", placeholder_list(fields.len()));
    let sql = format!(
        "INSERT INTO {table} ({}) VALUES {}",
        fields
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(", "),
        vec![group.as_str(); rows.len()].join(", ")
    );
    Ok(QuerySpec::new(sql, params))
}

/// Empty a table; SQLite has no TRUNCATE statement
pub fn build_truncate(table: &str, kind: DriverKind) -> Result<QuerySpec> {
    validate_identifier(table)?;
    let sql = match kind {
        DriverKind::Mysql => format!("TRUNCATE TABLE {table}"),
        DriverKind::Sqlite => format!("DELETE FROM {table}"),
    };
    Ok(QuerySpec::direct(sql))
}
