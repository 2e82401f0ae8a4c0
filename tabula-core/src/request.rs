//! Request descriptors handed to the [`Executor`](crate::Executor).
//!
//! One struct per operation kind, each carrying exactly what the executor
//! needs to render and run its statement. [`Request`] wraps them when a
//! single type is more convenient (logging, recording executors).

use crate::extract::ColumnValueMap;
use crate::query::{Pagination, Params, QueryDescriptor};
use crate::value::Value;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectByKey {
    pub table_name: String,
    pub primary_key: String,
    pub key_value: Value,
    pub select_columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsertOne {
    pub table_name: String,
    pub values: ColumnValueMap,
}

/// A multi-row insert. Every row in `rows` is aligned to `column_names`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsertMany {
    pub table_name: String,
    pub column_names: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeleteByKey {
    pub table_name: String,
    pub primary_key: String,
    pub key_value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeleteByCondition {
    pub table_name: String,
    pub condition: String,
    pub params: Params,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateByKey {
    pub table_name: String,
    pub primary_key: String,
    pub key_value: Value,
    pub values: ColumnValueMap,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateByCondition {
    pub table_name: String,
    pub values: ColumnValueMap,
    pub condition: String,
    pub params: Params,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectAdvanced {
    pub query: QueryDescriptor,
}

impl SelectAdvanced {
    pub fn table_name(&self) -> &str {
        &self.query.table_name
    }

    pub fn pagination(&self) -> Option<Pagination> {
        self.query.pagination
    }
}

/// Any request the engine can produce.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Request {
    SelectByKey(SelectByKey),
    InsertOne(InsertOne),
    InsertMany(InsertMany),
    DeleteByKey(DeleteByKey),
    DeleteByCondition(DeleteByCondition),
    UpdateByKey(UpdateByKey),
    UpdateByCondition(UpdateByCondition),
    SelectAdvanced(SelectAdvanced),
}

impl Request {
    pub fn kind(&self) -> &'static str {
        match self {
            Request::SelectByKey(_) => "select_by_key",
            Request::InsertOne(_) => "insert_one",
            Request::InsertMany(_) => "insert_many",
            Request::DeleteByKey(_) => "delete_by_key",
            Request::DeleteByCondition(_) => "delete_by_condition",
            Request::UpdateByKey(_) => "update_by_key",
            Request::UpdateByCondition(_) => "update_by_condition",
            Request::SelectAdvanced(_) => "select_advanced",
        }
    }

    pub fn table_name(&self) -> &str {
        match self {
            Request::SelectByKey(r) => &r.table_name,
            Request::InsertOne(r) => &r.table_name,
            Request::InsertMany(r) => &r.table_name,
            Request::DeleteByKey(r) => &r.table_name,
            Request::DeleteByCondition(r) => &r.table_name,
            Request::UpdateByKey(r) => &r.table_name,
            Request::UpdateByCondition(r) => &r.table_name,
            Request::SelectAdvanced(r) => r.table_name(),
        }
    }
}

macro_rules! into_request {
    ($($variant:ident),*) => {
        $(
            impl From<$variant> for Request {
                fn from(request: $variant) -> Self {
                    Request::$variant(request)
                }
            }
        )*
    };
}

into_request!(
    SelectByKey,
    InsertOne,
    InsertMany,
    DeleteByKey,
    DeleteByCondition,
    UpdateByKey,
    UpdateByCondition,
    SelectAdvanced
);
