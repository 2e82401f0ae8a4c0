extern crate proc_macro;
use proc_macro::TokenStream;

pub(crate) mod crate_path;
pub(crate) mod entity_derive;

/// Derive macro implementing `tabula_core::Entity` for a struct.
///
/// The generated impl lists every mapped field with a getter/setter pair, so
/// the CRUD engine can read and write columns without reflection. Each mapped
/// field type must implement `ToValue` and `FromValue`; the struct must
/// implement `Default`.
///
/// # Struct-level attribute
///
/// | Attribute | Description |
/// |-----------|-------------|
/// | `#[entity(table = "...")]` | Table name. Defaults to the struct name in `snake_case`. |
///
/// # Field attributes
///
/// | Attribute | Description |
/// |-----------|-------------|
/// | `#[id]` / `#[column(primary_key)]` | Marks the primary-key field. |
/// | `#[column(name = "...")]` | Column name. Defaults to the field name. |
/// | `#[transient]` / `#[column(transient)]` | Excludes the field from the mapping. |
///
/// Missing or duplicate key markers are not rejected here; the descriptor
/// resolver reports them at runtime, the same way it does for hand-written
/// impls.
///
/// # Example
///
/// ```ignore
/// use tabula::prelude::*;
///
/// #[derive(Entity, Default)]
/// #[entity(table = "users")]
/// pub struct User {
///     #[id]
///     pub id: i64,
///     #[column(name = "user_name")]
///     pub name: Option<String>,
///     pub email: Option<String>,
///     #[transient]
///     pub session: Vec<String>,
/// }
/// ```
#[proc_macro_derive(Entity, attributes(entity, id, column, transient))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    entity_derive::expand(input)
}
