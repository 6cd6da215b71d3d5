use crate::{
    config::HopperConfig,
    connection::DatabaseConnection,
    driver::{RowCursor, SqlDriver},
    navigation::RowWindow,
    parameters::{FieldSelector, IdSet, bind_field_set},
    query::{
        KeyValueSettings, QuerySpec, build_bulk_insert, build_delete, build_insert,
        build_key_value_replace, build_truncate, build_update,
    },
    result::{HopperError, Result},
    shaping::{ResultMode, Row, Selected, normalize},
    state::{ErrorRecord, ExecutionState},
    tree::{Tree, TreeSpec},
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::panic::Location;

/// Database helper: builds parameterized statements, runs them on a driver
/// and shapes the results.
///
/// Every method records the statement it attempted. Driver failures are
/// appended to the error log and returned to the caller.
pub struct Hopper<D: SqlDriver = DatabaseConnection> {
    driver: D,
    state: ExecutionState,
    debug: bool,
}

impl Hopper<DatabaseConnection> {
    /// Open the configured backend
    pub fn connect(config: &HopperConfig) -> Result<Self> {
        let driver = DatabaseConnection::open(config)?;
        Ok(Hopper {
            driver,
            state: ExecutionState::new(config.error_log_capacity),
            debug: config.debug,
        })
    }
}

impl<D: SqlDriver> Hopper<D> {
    pub fn new(driver: D) -> Self {
        Hopper {
            driver,
            state: ExecutionState::default(),
            debug: false,
        }
    }

    pub fn with_error_log_capacity(mut self, capacity: usize) -> Self {
        self.state = ExecutionState::new(capacity);
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    #[track_caller]
    fn run(&mut self, spec: &QuerySpec, direct: bool) -> Result<RowCursor> {
        let location = Location::caller();
        self.state.set_last_query(&spec.sql);
        tracing::debug!(sql = %spec.sql, params = spec.params.len(), "executing statement");

        let outcome = if direct {
            self.driver.execute_direct(&spec.sql)
        } else {
            self.driver.prepare_and_execute(&spec.sql, &spec.params)
        };

        match outcome {
            Ok(cursor) => {
                if !cursor.returns_rows() || cursor.affected_rows > 0 {
                    self.state.set_affected_rows(cursor.affected_rows);
                }
                Ok(cursor)
            }
            Err(source) => {
                if self.debug {
                    tracing::warn!(
                        sql = %spec.sql,
                        params = ?spec.params,
                        error = %source,
                        "statement failed"
                    );
                } else {
                    tracing::warn!(sql = %spec.sql, error = %source, "statement failed");
                }
                self.state
                    .record_error(source.message.clone(), &spec.sql, &spec.params, location);
                Err(HopperError::new_driver(&spec.sql, &spec.params, source))
            }
        }
    }

    #[track_caller]
    fn run_prepared(&mut self, spec: &QuerySpec) -> Result<RowCursor> {
        self.run(spec, false)
    }

    /// Run SQL without binding
    #[track_caller]
    pub fn query(&mut self, sql: &str) -> Result<RowCursor> {
        self.run(&QuerySpec::direct(sql), true)
    }

    /// Run a prepared statement and return the number of changed rows.
    ///
    /// A successful statement that changes nothing returns `Ok(0)`; use
    /// [`Hopper::updated`] to ask whether the last write changed anything.
    #[track_caller]
    pub fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64> {
        let cursor = self.run_prepared(&QuerySpec::new(sql, params.to_vec()))?;
        Ok(cursor.affected_rows)
    }

    /// Run a query and shape its rows.
    ///
    /// With `params` the statement is prepared, otherwise it runs directly.
    /// `index_field` keys the result by that column and takes priority over
    /// `mode`. Single-row modes return [`HopperError::NotFound`] when nothing
    /// matches.
    #[track_caller]
    pub fn select(
        &mut self,
        sql: &str,
        params: Option<&[Value]>,
        mode: ResultMode,
        index_field: Option<&str>,
    ) -> Result<Selected> {
        let cursor = match params {
            Some(params) => self.run_prepared(&QuerySpec::new(sql, params.to_vec()))?,
            None => self.run(&QuerySpec::direct(sql), true)?,
        };
        normalize(cursor.fetch_all(), mode, index_field)?.ok_or_else(|| HopperError::NotFound {
            sql: sql.to_string(),
        })
    }

    /// Deserialize every result row into `T`
    #[track_caller]
    pub fn select_as<T: DeserializeOwned>(&mut self, sql: &str, params: &[Value]) -> Result<Vec<T>> {
        let cursor = self.run_prepared(&QuerySpec::new(sql, params.to_vec()))?;
        Ok(cursor.fetch_all_as()?)
    }

    /// Deserialize the first result row into `T`
    #[track_caller]
    pub fn select_one_as<T: DeserializeOwned>(&mut self, sql: &str, params: &[Value]) -> Result<T> {
        let cursor = self.run_prepared(&QuerySpec::new(sql, params.to_vec()))?;
        let row = cursor.fetch_all().into_iter().next().ok_or_else(|| HopperError::NotFound {
            sql: sql.to_string(),
        })?;
        Ok(serde_json::from_value(Value::Object(row))?)
    }

    /// Insert a row, or update it when `field_set` contains `id_field`.
    ///
    /// Returns the generated id for inserts and echoes the id for updates.
    #[track_caller]
    pub fn insert_or_update(&mut self, table: &str, field_set: &Value, id_field: &str) -> Result<Value> {
        let binding = bind_field_set(field_set, id_field)?;

        if binding.is_update {
            let spec = build_update(table, &binding.fields, &binding.values, id_field)?;
            self.run_prepared(&spec)?;
            Ok(binding.values.last().cloned().unwrap_or(Value::Null))
        } else {
            let spec = build_insert(table, &binding.fields, &binding.values)?;
            self.run_prepared(&spec)?;
            let id = self.driver.last_insert_id();
            self.state.set_last_insert_id(id);
            Ok(Value::from(id))
        }
    }

    /// Insert many rows with one statement; returns the number of rows inserted
    #[track_caller]
    pub fn insert_multiple<S: AsRef<str>>(
        &mut self,
        table: &str,
        fields: &[S],
        rows: &[Vec<Value>],
    ) -> Result<u64> {
        let spec = build_bulk_insert(table, fields, rows)?;
        let cursor = self.run_prepared(&spec)?;
        let id = self.driver.last_insert_id();
        self.state.set_last_insert_id(id);
        Ok(cursor.affected_rows)
    }

    /// Delete by one id, a list of ids, or one id per field; returns the rows removed
    #[track_caller]
    pub fn delete(
        &mut self,
        table: &str,
        ids: impl Into<IdSet>,
        fields: impl Into<FieldSelector>,
    ) -> Result<u64> {
        let spec = build_delete(table, &ids.into(), &fields.into())?;
        let cursor = if spec.params.is_empty() {
            self.run(&spec, true)?
        } else {
            self.run_prepared(&spec)?
        };
        Ok(cursor.affected_rows)
    }

    /// Number of rows a query returns, or a write changes
    #[track_caller]
    pub fn row_count(&mut self, sql: &str, params: &[Value]) -> Result<u64> {
        let cursor = self.run_prepared(&QuerySpec::new(sql, params.to_vec()))?;
        Ok(cursor.row_count())
    }

    /// Remove every row of `table`
    #[track_caller]
    pub fn truncate(&mut self, table: &str) -> Result<u64> {
        let spec = build_truncate(table, self.driver.kind())?;
        let cursor = self.run(&spec, true)?;
        Ok(cursor.affected_rows)
    }

    /// Replace the key/value rows of one record with `entries`.
    ///
    /// Deletes every row of the record, then inserts one row per entry.
    /// Returns the number of rows inserted.
    #[track_caller]
    pub fn replace_key_value_set(
        &mut self,
        table: &str,
        entries: &Value,
        settings: &KeyValueSettings,
    ) -> Result<u64> {
        let entries = entries
            .as_object()
            .ok_or_else(|| HopperError::new_validation(format!("expected object, got {entries}")))?;
        let specs = build_key_value_replace(table, settings, entries)?;

        let mut inserted = 0;
        for (idx, spec) in specs.iter().enumerate() {
            let cursor = self.run_prepared(spec)?;
            if idx > 0 {
                inserted += cursor.affected_rows;
            }
        }
        Ok(inserted)
    }

    /// Load a parent/child table into items by id and child ids by parent
    #[track_caller]
    pub fn tree(&mut self, spec: &TreeSpec) -> Result<Tree> {
        let query = spec.build_query()?;
        let cursor = if query.params.is_empty() {
            self.run(&query, true)?
        } else {
            self.run_prepared(&query)?
        };
        Tree::from_rows(cursor.fetch_all(), &spec.id_field, &spec.parent_field)
    }

    /// Rows following `window.id`
    #[track_caller]
    pub fn next_rows(&mut self, window: &RowWindow) -> Result<Vec<Row>> {
        let spec = window.build_next()?;
        Ok(self.run_prepared(&spec)?.fetch_all())
    }

    /// Rows around `window.id`: the row itself and up to `number_of_rows`
    /// on each side, ascending
    #[track_caller]
    pub fn range(&mut self, window: &RowWindow) -> Result<Vec<Row>> {
        let preceding = window.build_preceding()?;
        let mut rows = self.run_prepared(&preceding)?.fetch_all();
        rows.reverse();

        let following = window.build_next()?;
        rows.extend(self.run_prepared(&following)?.fetch_all());
        Ok(rows)
    }

    /// Id generated by the most recent insert, 0 if none
    pub fn last_insert_id(&self) -> i64 {
        self.state.last_insert_id()
    }

    /// Rows changed by the most recent write
    pub fn affected_rows(&self) -> u64 {
        self.state.affected_rows()
    }

    /// Whether the most recent write changed any row
    pub fn updated(&self) -> bool {
        self.state.affected_rows() > 0
    }

    /// Every recorded driver error, one per line
    pub fn get_errors(&self) -> Option<String> {
        self.state.errors()
    }

    pub fn error_records(&self) -> impl Iterator<Item = &ErrorRecord> {
        self.state.error_records()
    }

    /// The most recently attempted SQL, whether or not it succeeded
    pub fn get_last_query(&self) -> &str {
        self.state.last_query()
    }
}
