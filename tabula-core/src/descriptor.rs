//! Entity descriptors and the process-wide descriptor cache.
//!
//! A descriptor is derived from [`Entity::shape`] once per type and shared
//! behind an `Arc` for the rest of the process. Derivation is pure, so two
//! threads racing on the same type at worst build it twice; the first one to
//! publish wins and both callers get the published entry.

use crate::entity::{Entity, Getter, Setter};
use crate::error::MappingError;
use crate::ident::{is_valid_identifier, is_valid_segment};
use convert_case::{Case, Casing};
use dashmap::DashMap;
use std::any::{Any, TypeId};
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, LazyLock};

static DESCRIPTORS: LazyLock<DashMap<TypeId, Arc<dyn Any + Send + Sync>>> =
    LazyLock::new(DashMap::new);

/// A mapped column with its accessor pair.
pub struct ColumnSpec<E> {
    name: String,
    field: &'static str,
    primary_key: bool,
    get: Getter<E>,
    set: Setter<E>,
}

impl<E> ColumnSpec<E> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The Rust field this column is read from.
    pub fn field(&self) -> &'static str {
        self.field
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    pub(crate) fn get(&self, entity: &E) -> crate::Value {
        (self.get)(entity)
    }

    pub(crate) fn set(&self, entity: &mut E, value: crate::Value) -> Result<(), MappingError> {
        (self.set)(entity, value).map_err(|err| MappingError::Conversion {
            column: self.name.clone(),
            reason: err.to_string(),
        })
    }
}

impl<E> fmt::Debug for ColumnSpec<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnSpec")
            .field("name", &self.name)
            .field("field", &self.field)
            .field("primary_key", &self.primary_key)
            .finish()
    }
}

impl<E> PartialEq for ColumnSpec<E> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.field == other.field
            && self.primary_key == other.primary_key
    }
}

/// Static mapping metadata for one entity type.
pub struct EntityDescriptor<E> {
    entity: &'static str,
    table_name: String,
    columns: Vec<ColumnSpec<E>>,
    primary_key: Option<usize>,
}

impl<E> EntityDescriptor<E> {
    /// The Rust type name the descriptor was derived from.
    pub fn entity(&self) -> &'static str {
        self.entity
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Columns in declaration order.
    pub fn columns(&self) -> &[ColumnSpec<E>] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSpec<E>> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_primary_key(&self) -> bool {
        self.primary_key.is_some()
    }

    /// The key column, or `MissingKey` for key-less entity types.
    pub fn primary_key(&self) -> Result<&ColumnSpec<E>, MappingError> {
        self.primary_key
            .map(|idx| &self.columns[idx])
            .ok_or(MappingError::MissingKey {
                entity: self.entity,
            })
    }

    pub fn primary_key_column(&self) -> Result<&str, MappingError> {
        self.primary_key().map(|c| c.name())
    }

    /// Fails with `UnknownColumn` unless `name` is a declared column.
    pub fn require_column(&self, name: &str) -> Result<&ColumnSpec<E>, MappingError> {
        self.column(name).ok_or_else(|| MappingError::UnknownColumn {
            entity: self.entity,
            column: name.to_string(),
        })
    }
}

impl<E> fmt::Debug for EntityDescriptor<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityDescriptor")
            .field("entity", &self.entity)
            .field("table_name", &self.table_name)
            .field("columns", &self.columns)
            .field("primary_key", &self.primary_key)
            .finish()
    }
}

impl<E> PartialEq for EntityDescriptor<E> {
    fn eq(&self, other: &Self) -> bool {
        self.entity == other.entity
            && self.table_name == other.table_name
            && self.columns == other.columns
            && self.primary_key == other.primary_key
    }
}

/// Table name used when the entity does not override it.
///
/// `UserAccount` becomes `user_account`. Module paths are stripped first.
pub fn default_table_name(type_name: &str) -> String {
    let short = type_name.rsplit("::").next().unwrap_or(type_name);
    short.to_case(Case::Snake)
}

/// Derive the descriptor for `E` without touching the cache.
pub fn derive_descriptor<E: Entity>() -> Result<EntityDescriptor<E>, MappingError> {
    let shape = E::shape();
    let entity = shape.type_name;

    let table_name = match shape.table {
        Some(table) => table.to_string(),
        None => default_table_name(entity),
    };
    if !is_valid_identifier(&table_name) {
        return Err(MappingError::InvalidIdentifier {
            kind: "table",
            ident: table_name,
        });
    }

    let mut columns = Vec::with_capacity(shape.fields.len());
    let mut seen = HashSet::new();
    for field in shape.fields.into_iter().filter(|f| !f.transient) {
        let name = field.column.unwrap_or(field.name).to_string();
        if !is_valid_segment(&name) {
            return Err(MappingError::InvalidIdentifier {
                kind: "column",
                ident: name,
            });
        }
        if !seen.insert(name.clone()) {
            return Err(MappingError::DuplicateColumn {
                entity,
                column: name,
            });
        }
        columns.push(ColumnSpec {
            name,
            field: field.name,
            primary_key: field.primary_key,
            get: field.get,
            set: field.set,
        });
    }

    if columns.is_empty() {
        return Err(MappingError::NoColumns { entity });
    }

    let keys: Vec<usize> = columns
        .iter()
        .enumerate()
        .filter(|(_, c)| c.primary_key)
        .map(|(idx, _)| idx)
        .collect();
    if keys.len() > 1 {
        return Err(MappingError::AmbiguousKey {
            entity,
            columns: keys.iter().map(|&idx| columns[idx].name.clone()).collect(),
        });
    }

    Ok(EntityDescriptor {
        entity,
        table_name,
        columns,
        primary_key: keys.first().copied(),
    })
}

/// Resolve the descriptor for `E`, building and caching it on first use.
pub fn resolve<E: Entity>() -> Result<Arc<EntityDescriptor<E>>, MappingError> {
    let type_id = TypeId::of::<E>();
    if let Some(cached) = DESCRIPTORS.get(&type_id) {
        if let Ok(descriptor) = Arc::clone(cached.value()).downcast::<EntityDescriptor<E>>() {
            return Ok(descriptor);
        }
    }

    // Build outside the shard lock; a concurrent builder may publish first.
    let built = Arc::new(derive_descriptor::<E>()?);
    let erased: Arc<dyn Any + Send + Sync> = built.clone();
    let published = Arc::clone(DESCRIPTORS.entry(type_id).or_insert(erased).value());
    let descriptor = published
        .downcast::<EntityDescriptor<E>>()
        .unwrap_or(built);

    tracing::debug!(
        entity = descriptor.entity(),
        table = descriptor.table_name(),
        columns = descriptor.columns().len(),
        "Resolved entity descriptor"
    );
    Ok(descriptor)
}
