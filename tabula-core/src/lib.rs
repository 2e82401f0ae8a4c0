//! # tabula-core: entity-to-row mapping and CRUD request construction
//!
//! Maps plain Rust structs onto table rows without hand-written queries and
//! turns each CRUD call into one structured request for an external
//! [`Executor`], which renders and runs the actual SQL.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Entity`] | Declares a struct's fields, markers and accessors (usually derived) |
//! | [`EntityDescriptor`] | Resolved table/column/key metadata, cached per type |
//! | [`ColumnValueMap`] | Ordered column → [`Value`] mapping extracted from an instance |
//! | [`Criteria`] / [`QueryDescriptor`] | Advanced-select input and its validated form |
//! | [`Filter`] / [`OrderBy`] | Builders for condition and order expressions |
//! | [`Request`] | Tagged request descriptors handed to the executor |
//! | [`CrudEngine`] | The public operation surface |
//!
//! # Naming rule
//!
//! Table names default to the type name in `snake_case` (`UserAccount` →
//! `user_account`); column names default to the field name. Both can be
//! overridden per type / per field.

extern crate self as tabula_core;

pub mod config;
pub mod crud;
pub mod descriptor;
pub mod entity;
pub mod error;
pub mod executor;
pub mod extract;
pub mod filter;
pub mod query;
pub mod request;
pub mod value;

mod ident;

pub use config::{ConfigError, CrudConfig};
pub use crud::CrudEngine;
pub use descriptor::{resolve, ColumnSpec, EntityDescriptor};
pub use entity::{Entity, EntityShape, FieldDef};
pub use error::{CrudError, CrudResult, ExecutorError, MappingError, QueryError};
pub use executor::Executor;
pub use extract::{ColumnValueMap, NullPolicy, Row};
pub use filter::{Filter, OrderBy, ParamStyle};
pub use query::{Criteria, Pagination, Params, QueryDescriptor};
pub use request::Request;
pub use value::{FromValue, ToValue, Value, ValueError};

pub mod prelude {
    //! Re-exports of the most commonly used types.
    pub use crate::{
        ColumnValueMap, Criteria, CrudEngine, CrudError, CrudResult, Entity, Executor, Filter,
        OrderBy, Params, Row, Value,
    };
}
