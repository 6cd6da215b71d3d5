use crate::{
    parameters::{validate_column_list, validate_identifier, value_to_key},
    query::QuerySpec,
    result::{HopperError, Result},
    shaping::Row,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Columns and filter for loading a parent/child table
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TreeSpec {
    pub table: String,
    #[serde(default = "default_id_field")]
    pub id_field: String,
    #[serde(default = "default_parent_field")]
    pub parent_field: String,
    pub title_field: String,
    pub sort_field: String,
    #[serde(default)]
    pub full_path_field: Option<String>,
    /// Extra columns, comma separated
    #[serde(default)]
    pub other_fields: Option<String>,
    /// Raw condition such as `menu=? AND visible=?`
    #[serde(default, rename = "where")]
    pub where_clause: Option<String>,
    #[serde(default)]
    pub values: Vec<Value>,
}

fn default_id_field() -> String {
    "id".to_string()
}

fn default_parent_field() -> String {
    "parent".to_string()
}

impl TreeSpec {
    pub fn new(table: impl Into<String>, title_field: impl Into<String>, sort_field: impl Into<String>) -> Self {
        TreeSpec {
            table: table.into(),
            id_field: default_id_field(),
            parent_field: default_parent_field(),
            title_field: title_field.into(),
            sort_field: sort_field.into(),
            full_path_field: None,
            other_fields: None,
            where_clause: None,
            values: Vec::new(),
        }
    }

    pub fn filter(mut self, where_clause: impl Into<String>, values: Vec<Value>) -> Self {
        self.where_clause = Some(where_clause.into());
        self.values = values;
        self
    }

    /// `SELECT id, parent, title[, path][, others] FROM t [WHERE ..] ORDER BY parent, sort, title`
    pub fn build_query(&self) -> Result<QuerySpec> {
        validate_identifier(&self.table)?;
        validate_identifier(&self.id_field)?;
        validate_identifier(&self.parent_field)?;
        validate_identifier(&self.title_field)?;
        validate_identifier(&self.sort_field)?;

        let mut columns = vec![
            self.id_field.clone(),
            self.parent_field.clone(),
            self.title_field.clone(),
        ];
        if let Some(path) = self.full_path_field.as_deref().filter(|p| !p.is_empty()) {
            validate_identifier(path)?;
            columns.push(path.to_string());
        }
        if let Some(others) = self.other_fields.as_deref().filter(|o| !o.trim().is_empty()) {
            validate_column_list(others)?;
            columns.extend(others.split(',').map(|c| c.trim().to_string()));
        }

        let mut sql = format!("SELECT {} FROM {}", columns.join(", "), self.table);
        if let Some(condition) = self.where_clause.as_deref().filter(|w| !w.trim().is_empty()) {
            sql.push_str(" WHERE ");
            sql.push_str(condition);
        }
        sql.push_str(&format!(
            " ORDER BY {}, {}, {}",
            self.parent_field, self.sort_field, self.title_field
        ));

        Ok(QuerySpec::new(sql, self.values.clone()))
    }
}

/// Rows keyed by id, plus the ordered child ids of every parent
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Tree {
    pub items: Map<String, Value>,
    /// Parent id -> array of child ids, parents in first-seen order
    pub parents: Map<String, Value>,
}

/// Name a selected column comes back under: `` `menu`.`order` `` reads as `order`
fn result_column(field: &str) -> &str {
    field.rsplit('.').next().unwrap_or(field).trim_matches('`')
}

impl Tree {
    /// Group rows already ordered by parent and sort column
    pub fn from_rows(rows: Vec<Row>, id_field: &str, parent_field: &str) -> Result<Self> {
        let id_column = result_column(id_field);
        let parent_column = result_column(parent_field);

        let mut tree = Tree::default();
        for row in rows {
            let id = row.get(id_column).cloned().ok_or_else(|| {
                HopperError::new_validation(format!("tree row has no '{id_column}' column"))
            })?;
            let parent = row.get(parent_column).map(value_to_key).ok_or_else(|| {
                HopperError::new_validation(format!("tree row has no '{parent_column}' column"))
            })?;
            if let Value::Array(children) = tree
                .parents
                .entry(parent)
                .or_insert_with(|| Value::Array(Vec::new()))
            {
                children.push(id.clone());
            }
            tree.items.insert(value_to_key(&id), Value::Object(row));
        }
        Ok(tree)
    }

    /// Child ids of `parent`, in sort order
    pub fn children(&self, parent: &Value) -> &[Value] {
        self.parents
            .get(&value_to_key(parent))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn item(&self, id: &Value) -> Option<&Value> {
        self.items.get(&value_to_key(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tree_query() {
        let mut spec = TreeSpec::new("menu", "title", "sort_order").filter("menu_id=?", vec![json!(2)]);
        spec.full_path_field = Some("path".to_string());
        spec.other_fields = Some("url, target".to_string());

        let query = spec.build_query().unwrap();
        assert_eq!(
            query.sql,
            "SELECT id, parent, title, path, url, target FROM menu WHERE menu_id=? ORDER BY parent, sort_order, title"
        );
        assert_eq!(query.params, vec![json!(2)]);
    }

    #[test]
    fn test_tree_from_rows() {
        let rows: Vec<Row> = json!([
            {"id": 1, "parent": 0, "title": "Home"},
            {"id": 3, "parent": 0, "title": "About"},
            {"id": 2, "parent": 1, "title": "News"}
        ])
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r.as_object().unwrap().clone())
        .collect();

        let tree = Tree::from_rows(rows, "id", "parent").unwrap();
        assert_eq!(tree.children(&json!(0)), &[json!(1), json!(3)]);
        assert_eq!(tree.children(&json!(1)), &[json!(2)]);
        assert!(tree.children(&json!(2)).is_empty());
        assert_eq!(tree.item(&json!(2)).unwrap()["title"], json!("News"));
    }

    #[test]
    fn test_backticked_fields_match_result_columns() {
        let rows: Vec<Row> = json!([
            {"order": 1, "parent": 0, "title": "Home"},
            {"order": 2, "parent": 1, "title": "News"}
        ])
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r.as_object().unwrap().clone())
        .collect();

        let tree = Tree::from_rows(rows, "`order`", "`menu`.`parent`").unwrap();
        assert_eq!(tree.children(&json!(1)), &[json!(2)]);
        assert_eq!(tree.item(&json!(1)).unwrap()["title"], json!("Home"));
    }

    #[test]
    fn test_parents_serialize_in_first_seen_order() {
        let rows: Vec<Row> = json!([
            {"id": 5, "parent": 9, "title": "a"},
            {"id": 6, "parent": 2, "title": "b"},
            {"id": 7, "parent": 0, "title": "c"}
        ])
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r.as_object().unwrap().clone())
        .collect();

        let tree = Tree::from_rows(rows, "id", "parent").unwrap();
        let json = serde_json::to_string(&tree.parents).unwrap();
        assert_eq!(json, r#"{"9":[5],"2":[6],"0":[7]}"#);
    }
}
