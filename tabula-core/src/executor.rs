use crate::error::ExecutorError;
use crate::extract::Row;
use crate::request::{
    DeleteByCondition, DeleteByKey, InsertMany, InsertOne, SelectAdvanced, SelectByKey,
    UpdateByCondition, UpdateByKey,
};
use std::sync::Arc;

/// The backend that renders and runs statements for the CRUD engine.
///
/// Implementations own SQL generation, parameter binding, connections and
/// transactions. Each call is synchronous and receives its request by value.
/// Mutating calls return the affected-row count.
///
/// # Example
///
/// ```ignore
/// struct MysqlExecutor { pool: mysql::Pool }
///
/// impl Executor for MysqlExecutor {
///     fn insert(&self, request: InsertOne) -> Result<u64, ExecutorError> {
///         let columns: Vec<_> = request.values.columns().collect();
///         let sql = format!(
///             "INSERT INTO {} ({}) VALUES ({})",
///             request.table_name,
///             columns.join(", "),
///             vec!["?"; columns.len()].join(", "),
///         );
///         // bind request.values.values() and execute ...
///     }
///     // ...
/// }
/// ```
pub trait Executor: Send + Sync {
    fn select_by_key(&self, request: SelectByKey) -> Result<Option<Row>, ExecutorError>;

    fn insert(&self, request: InsertOne) -> Result<u64, ExecutorError>;

    fn insert_batch(&self, request: InsertMany) -> Result<u64, ExecutorError>;

    fn delete_by_key(&self, request: DeleteByKey) -> Result<u64, ExecutorError>;

    fn delete_by_condition(&self, request: DeleteByCondition) -> Result<u64, ExecutorError>;

    fn update_by_key(&self, request: UpdateByKey) -> Result<u64, ExecutorError>;

    fn update_by_condition(&self, request: UpdateByCondition) -> Result<u64, ExecutorError>;

    fn select_advanced(&self, request: SelectAdvanced) -> Result<Vec<Row>, ExecutorError>;
}

macro_rules! forward_executor {
    ($($ptr:ty),*) => {
        $(
            impl<T: Executor + ?Sized> Executor for $ptr {
                fn select_by_key(
                    &self,
                    request: SelectByKey,
                ) -> Result<Option<Row>, ExecutorError> {
                    (**self).select_by_key(request)
                }

                fn insert(&self, request: InsertOne) -> Result<u64, ExecutorError> {
                    (**self).insert(request)
                }

                fn insert_batch(&self, request: InsertMany) -> Result<u64, ExecutorError> {
                    (**self).insert_batch(request)
                }

                fn delete_by_key(&self, request: DeleteByKey) -> Result<u64, ExecutorError> {
                    (**self).delete_by_key(request)
                }

                fn delete_by_condition(
                    &self,
                    request: DeleteByCondition,
                ) -> Result<u64, ExecutorError> {
                    (**self).delete_by_condition(request)
                }

                fn update_by_key(&self, request: UpdateByKey) -> Result<u64, ExecutorError> {
                    (**self).update_by_key(request)
                }

                fn update_by_condition(
                    &self,
                    request: UpdateByCondition,
                ) -> Result<u64, ExecutorError> {
                    (**self).update_by_condition(request)
                }

                fn select_advanced(
                    &self,
                    request: SelectAdvanced,
                ) -> Result<Vec<Row>, ExecutorError> {
                    (**self).select_advanced(request)
                }
            }
        )*
    };
}

forward_executor!(&T, Arc<T>, Box<T>);
