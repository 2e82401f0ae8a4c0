//! Tabula: flat single-table CRUD over plain Rust structs.
//!
//! This facade crate re-exports `tabula-core` and the `Entity` derive through
//! a single dependency. Import everything you need with:
//!
//! ```
//! use tabula::prelude::*;
//!
//! #[derive(Entity, Default)]
//! #[entity(table = "users")]
//! struct User {
//!     #[id]
//!     id: i64,
//!     name: Option<String>,
//! }
//!
//! let users = tabula::resolve::<User>().unwrap();
//! assert_eq!(users.table_name(), "users");
//! assert_eq!(users.column_names(), vec!["id", "name"]);
//! ```
//!
//! Hand a [`CrudEngine`] any [`Executor`] and call its operations:
//!
//! ```ignore
//! let crud = CrudEngine::new(my_executor);
//! crud.insert_selective(&User { id: 1, name: None })?;
//! ```
//!
//! # Feature flags
//!
//! | Feature   | Default | Crate            |
//! |-----------|---------|------------------|
//! | `derive`  | **yes** | `tabula-macros`  |
//! | `testing` | no      | `tabula-test`    |

// The derive uses `proc-macro-crate` to detect whether the user depends on
// `tabula` or `tabula-core`, and generates paths accordingly. Derives expanded
// inside this crate resolve `::tabula` through the alias below.
extern crate self as tabula;

pub extern crate tabula_core;

#[cfg(feature = "derive")]
pub extern crate tabula_macros;

pub use tabula_core::*;

#[cfg(feature = "derive")]
pub use tabula_macros::Entity;

#[cfg(feature = "testing")]
pub use tabula_test as testing;

/// Unified prelude: `use tabula::prelude::*`.
pub mod prelude {
    pub use tabula_core::prelude::*;

    #[cfg(feature = "derive")]
    pub use tabula_macros::Entity;
}
