use crate::config::CrudConfig;
use crate::descriptor::{resolve, EntityDescriptor};
use crate::entity::Entity;
use crate::error::{CrudError, CrudResult, ExecutorError, MappingError, QueryError};
use crate::executor::Executor;
use crate::extract::{
    align, extract, materialize, primary_key_value, ColumnValueMap, NullPolicy, Row,
};
use crate::filter::Filter;
use crate::query::{build_query, Criteria, Params};
use crate::request::{
    DeleteByCondition, DeleteByKey, InsertMany, InsertOne, SelectAdvanced, SelectByKey,
    UpdateByCondition, UpdateByKey,
};
use crate::value::ToValue;
use serde::Serialize;

/// Generic CRUD operations over any [`Entity`] type.
///
/// Every call resolves the entity's descriptor (cached after first use),
/// builds exactly one request and hands it to the executor. Mapping and
/// query errors are raised before the executor is called.
///
/// # Example
///
/// ```ignore
/// let crud = CrudEngine::new(MysqlExecutor::new(pool));
/// crud.insert(&User { id: 1, name: Some("alice".into()), ..Default::default() })?;
/// let user: Option<User> = crud.select_by_key::<User>(1)?;
/// let page: Vec<User> = crud.select_advanced::<User>(Criteria::new().page(1, 20))?;
/// ```
pub struct CrudEngine<X> {
    executor: X,
    config: CrudConfig,
}

impl<X: Executor> CrudEngine<X> {
    pub fn new(executor: X) -> Self {
        Self::with_config(executor, CrudConfig::default())
    }

    pub fn with_config(executor: X, config: CrudConfig) -> Self {
        Self { executor, config }
    }

    /// Get the underlying executor reference.
    pub fn executor(&self) -> &X {
        &self.executor
    }

    pub fn config(&self) -> &CrudConfig {
        &self.config
    }

    /// A [`Filter`] using the configured parameter style.
    pub fn filter(&self) -> Filter {
        Filter::new().style(self.config.param_style)
    }

    /// Fetch the row whose primary key equals `key`.
    pub fn select_by_key<E: Entity>(&self, key: impl ToValue) -> CrudResult<Option<E>> {
        let descriptor = resolve::<E>()?;
        let primary_key = descriptor.primary_key_column()?.to_string();
        let key_value = key.to_value();
        if key_value.is_null() {
            return Err(MappingError::NullKey {
                entity: descriptor.entity(),
                column: primary_key,
            }
            .into());
        }

        let request = SelectByKey {
            table_name: descriptor.table_name().to_string(),
            primary_key,
            key_value,
            select_columns: descriptor.column_names(),
        };
        self.trace_request("select_by_key", &request);
        let row = self.finish(
            "select_by_key",
            descriptor.table_name(),
            self.executor.select_by_key(request),
        )?;
        tracing::debug!(
            op = "select_by_key",
            table = descriptor.table_name(),
            found = row.is_some(),
            "Executed request"
        );
        match row {
            Some(row) => Ok(Some(materialize(&descriptor, row)?)),
            None => Ok(None),
        }
    }

    /// Insert every column of `entity`, nulls included.
    pub fn insert<E: Entity>(&self, entity: &E) -> CrudResult<u64> {
        self.insert_with(entity, NullPolicy::All, "insert")
    }

    /// Insert only the non-null columns of `entity`, leaving the rest to
    /// column defaults.
    pub fn insert_selective<E: Entity>(&self, entity: &E) -> CrudResult<u64> {
        self.insert_with(entity, NullPolicy::NonNullOnly, "insert_selective")
    }

    fn insert_with<E: Entity>(
        &self,
        entity: &E,
        policy: NullPolicy,
        op: &'static str,
    ) -> CrudResult<u64> {
        let descriptor = resolve::<E>()?;
        let request = InsertOne {
            table_name: descriptor.table_name().to_string(),
            values: extract(&descriptor, entity, policy),
        };
        self.trace_request(op, &request);
        let affected = self.finish(op, descriptor.table_name(), self.executor.insert(request))?;
        tracing::debug!(op, table = descriptor.table_name(), affected, "Executed request");
        Ok(affected)
    }

    /// Insert all `entities` in a single request.
    ///
    /// Every row is laid out along the entity's full column list, with
    /// explicit nulls, so rows stay positionally aligned. An empty slice is a
    /// no-op returning 0.
    pub fn insert_batch<E: Entity>(&self, entities: &[E]) -> CrudResult<u64> {
        if entities.is_empty() {
            tracing::debug!(op = "insert_batch", "Empty batch, nothing to insert");
            return Ok(0);
        }
        let descriptor = resolve::<E>()?;
        let rows = entities
            .iter()
            .map(|e| align(&descriptor, &extract(&descriptor, e, NullPolicy::NonNullOnly)))
            .collect::<Vec<_>>();
        let request = InsertMany {
            table_name: descriptor.table_name().to_string(),
            column_names: descriptor.column_names(),
            rows,
        };
        self.trace_request("insert_batch", &request);
        let affected = self.finish(
            "insert_batch",
            descriptor.table_name(),
            self.executor.insert_batch(request),
        )?;
        tracing::debug!(
            op = "insert_batch",
            table = descriptor.table_name(),
            rows = entities.len(),
            affected,
            "Executed request"
        );
        Ok(affected)
    }

    pub fn delete_by_key<E: Entity>(&self, key: impl ToValue) -> CrudResult<u64> {
        let descriptor = resolve::<E>()?;
        let primary_key = descriptor.primary_key_column()?.to_string();
        let key_value = key.to_value();
        if key_value.is_null() {
            return Err(MappingError::NullKey {
                entity: descriptor.entity(),
                column: primary_key,
            }
            .into());
        }

        let request = DeleteByKey {
            table_name: descriptor.table_name().to_string(),
            primary_key,
            key_value,
        };
        self.trace_request("delete_by_key", &request);
        let affected = self.finish(
            "delete_by_key",
            descriptor.table_name(),
            self.executor.delete_by_key(request),
        )?;
        tracing::debug!(
            op = "delete_by_key",
            table = descriptor.table_name(),
            affected,
            "Executed request"
        );
        Ok(affected)
    }

    /// Delete the rows matching `condition`. The expression and parameters
    /// are passed to the executor unchanged.
    pub fn delete_by_condition<E: Entity>(
        &self,
        condition: impl Into<String>,
        params: Params,
    ) -> CrudResult<u64> {
        let descriptor = resolve::<E>()?;
        let request = DeleteByCondition {
            table_name: descriptor.table_name().to_string(),
            condition: condition.into(),
            params,
        };
        self.trace_request("delete_by_condition", &request);
        let affected = self.finish(
            "delete_by_condition",
            descriptor.table_name(),
            self.executor.delete_by_condition(request),
        )?;
        tracing::debug!(
            op = "delete_by_condition",
            table = descriptor.table_name(),
            affected,
            "Executed request"
        );
        Ok(affected)
    }

    /// Overwrite every non-key column of the row identified by `entity`'s key,
    /// nulls included.
    pub fn update_by_key<E: Entity>(&self, entity: &E) -> CrudResult<u64> {
        self.update_with(entity, NullPolicy::AllExcludingKey, "update_by_key")
    }

    /// Update only the non-null columns of `entity`; other columns keep their
    /// stored values.
    pub fn update_by_key_selective<E: Entity>(&self, entity: &E) -> CrudResult<u64> {
        self.update_with(entity, NullPolicy::NonNullExcludingKey, "update_by_key_selective")
    }

    fn update_with<E: Entity>(
        &self,
        entity: &E,
        policy: NullPolicy,
        op: &'static str,
    ) -> CrudResult<u64> {
        let descriptor = resolve::<E>()?;
        let primary_key = descriptor.primary_key_column()?.to_string();
        let key_value = primary_key_value(&descriptor, entity)?;
        let values = extract(&descriptor, entity, policy);
        if values.is_empty() {
            return Err(QueryError::EmptyAssignment {
                table: descriptor.table_name().to_string(),
            }
            .into());
        }

        let request = UpdateByKey {
            table_name: descriptor.table_name().to_string(),
            primary_key,
            key_value,
            values,
        };
        self.trace_request(op, &request);
        let affected = self.finish(
            op,
            descriptor.table_name(),
            self.executor.update_by_key(request),
        )?;
        tracing::debug!(op, table = descriptor.table_name(), affected, "Executed request");
        Ok(affected)
    }

    /// Assign `values` to every row matching `condition`.
    ///
    /// `values` must name declared columns of `E` and must not be empty.
    pub fn update_by_condition<E: Entity>(
        &self,
        values: ColumnValueMap,
        condition: impl Into<String>,
        params: Params,
    ) -> CrudResult<u64> {
        let descriptor = resolve::<E>()?;
        if values.is_empty() {
            return Err(QueryError::EmptyAssignment {
                table: descriptor.table_name().to_string(),
            }
            .into());
        }
        for column in values.columns() {
            descriptor.require_column(column)?;
        }

        let request = UpdateByCondition {
            table_name: descriptor.table_name().to_string(),
            values,
            condition: condition.into(),
            params,
        };
        self.trace_request("update_by_condition", &request);
        let affected = self.finish(
            "update_by_condition",
            descriptor.table_name(),
            self.executor.update_by_condition(request),
        )?;
        tracing::debug!(
            op = "update_by_condition",
            table = descriptor.table_name(),
            affected,
            "Executed request"
        );
        Ok(affected)
    }

    /// Select all columns of the rows matching `criteria` and map them back to
    /// entities. Any column list in `criteria` is replaced by the full list.
    pub fn select_advanced<E: Entity>(&self, mut criteria: Criteria) -> CrudResult<Vec<E>> {
        let descriptor = resolve::<E>()?;
        criteria.columns = None;
        let rows = self.select_rows(&descriptor, criteria, "select_advanced")?;
        rows.into_iter()
            .map(|row| materialize(&descriptor, row).map_err(CrudError::from))
            .collect()
    }

    /// Like [`select_advanced`](Self::select_advanced) but returns raw rows.
    ///
    /// Honours `criteria.columns` when set (non-empty, each a declared
    /// column); otherwise selects every column.
    pub fn select_advanced_by_column<E: Entity>(&self, criteria: Criteria) -> CrudResult<Vec<Row>> {
        let descriptor = resolve::<E>()?;
        self.select_rows(&descriptor, criteria, "select_advanced_by_column")
    }

    fn select_rows<E>(
        &self,
        descriptor: &EntityDescriptor<E>,
        mut criteria: Criteria,
        op: &'static str,
    ) -> CrudResult<Vec<Row>> {
        let columns = match criteria.columns.take() {
            Some(columns) if columns.is_empty() => {
                return Err(QueryError::EmptySelection {
                    table: descriptor.table_name().to_string(),
                }
                .into());
            }
            Some(columns) => {
                for column in &columns {
                    descriptor.require_column(column)?;
                }
                columns
            }
            None => descriptor.column_names(),
        };
        let query = build_query(
            descriptor.table_name(),
            columns,
            criteria,
            self.config.max_page_size,
        )?;

        let request = SelectAdvanced { query };
        self.trace_request(op, &request);
        let rows = self.finish(
            op,
            descriptor.table_name(),
            self.executor.select_advanced(request),
        )?;
        tracing::debug!(
            op,
            table = descriptor.table_name(),
            rows = rows.len(),
            "Executed request"
        );
        Ok(rows)
    }

    fn trace_request<R: Serialize>(&self, op: &'static str, request: &R) {
        if !self.config.log_requests || !tracing::enabled!(tracing::Level::TRACE) {
            return;
        }
        match serde_json::to_string(request) {
            Ok(json) => tracing::trace!(op, request = %json, "Dispatching request"),
            Err(err) => tracing::trace!(op, error = %err, "Dispatching unserializable request"),
        }
    }

    fn finish<T>(
        &self,
        op: &'static str,
        table: &str,
        result: Result<T, ExecutorError>,
    ) -> CrudResult<T> {
        result.map_err(|err| {
            tracing::warn!(op, table, error = %err, "Executor call failed");
            CrudError::Executor(err)
        })
    }
}

impl<X: Clone> Clone for CrudEngine<X> {
    fn clone(&self) -> Self {
        Self {
            executor: self.executor.clone(),
            config: self.config.clone(),
        }
    }
}
