//! Column-value extraction and row materialization.

use crate::descriptor::EntityDescriptor;
use crate::error::MappingError;
use crate::value::Value;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Which columns of an instance end up in a [`ColumnValueMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullPolicy {
    /// Every column, nulls included. Used for full inserts.
    All,
    /// Every column except the primary key, nulls included. Used for full updates.
    AllExcludingKey,
    /// Only columns holding a value. Used for selective inserts.
    NonNullOnly,
    /// Non-null columns without the primary key. Used for selective updates.
    NonNullExcludingKey,
}

impl NullPolicy {
    fn skips_nulls(self) -> bool {
        matches!(self, NullPolicy::NonNullOnly | NullPolicy::NonNullExcludingKey)
    }

    fn skips_key(self) -> bool {
        matches!(self, NullPolicy::AllExcludingKey | NullPolicy::NonNullExcludingKey)
    }
}

/// Insertion-ordered mapping from column name to value.
///
/// Also used for raw rows coming back from the executor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnValueMap {
    entries: Vec<(String, Value)>,
}

/// A raw result row, keyed by column name.
pub type Row = ColumnValueMap;

impl ColumnValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Insert a value, replacing an existing entry in place.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(c, _)| *c == column) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((column, value)),
        }
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.entries.iter().find(|(c, _)| c == column).map(|(_, v)| v)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    pub fn remove(&mut self, column: &str) -> Option<Value> {
        let idx = self.entries.iter().position(|(c, _)| c == column)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(c, _)| c.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(c, v)| (c.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ColumnValueMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = ColumnValueMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl IntoIterator for ColumnValueMap {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for ColumnValueMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (column, value) in &self.entries {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ColumnValueMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MapVisitor;

        impl<'de> Visitor<'de> for MapVisitor {
            type Value = ColumnValueMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of column names to values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut map = ColumnValueMap::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((column, value)) = access.next_entry::<String, Value>()? {
                    map.insert(column, value);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(MapVisitor)
    }
}

/// Read the columns of `instance` selected by `policy`, in descriptor order.
pub fn extract<E>(
    descriptor: &EntityDescriptor<E>,
    instance: &E,
    policy: NullPolicy,
) -> ColumnValueMap {
    let mut map = ColumnValueMap::with_capacity(descriptor.columns().len());
    for column in descriptor.columns() {
        if policy.skips_key() && column.is_primary_key() {
            continue;
        }
        let value = column.get(instance);
        if policy.skips_nulls() && value.is_null() {
            continue;
        }
        map.entries.push((column.name().to_string(), value));
    }
    map
}

/// The key value of `instance`; a null key identifies no row.
pub fn primary_key_value<E>(
    descriptor: &EntityDescriptor<E>,
    instance: &E,
) -> Result<Value, MappingError> {
    let key = descriptor.primary_key()?;
    let value = key.get(instance);
    if value.is_null() {
        return Err(MappingError::NullKey {
            entity: descriptor.entity(),
            column: key.name().to_string(),
        });
    }
    Ok(value)
}

/// Lay `map` out positionally along the descriptor's full column list,
/// filling `Null` for missing columns.
pub fn align<E>(descriptor: &EntityDescriptor<E>, map: &ColumnValueMap) -> Vec<Value> {
    descriptor
        .columns()
        .iter()
        .map(|c| map.get(c.name()).cloned().unwrap_or(Value::Null))
        .collect()
}

/// Build an entity from a raw row.
///
/// Row columns the descriptor does not know are ignored; descriptor columns
/// missing from the row keep their `Default` value.
pub fn materialize<E: Default>(
    descriptor: &EntityDescriptor<E>,
    row: Row,
) -> Result<E, MappingError> {
    let mut entity = E::default();
    for (column, value) in row {
        if let Some(spec) = descriptor.column(&column) {
            spec.set(&mut entity, value)?;
        }
    }
    Ok(entity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::derive_descriptor;
    use crate::entity::{Entity, EntityShape, FieldDef};
    use crate::value::{FromValue, ToValue};

    #[derive(Default)]
    struct Draft {
        id: Option<i64>,
        title: Option<String>,
    }

    impl Entity for Draft {
        fn shape() -> EntityShape<Self> {
            EntityShape::new("Draft")
                .field(
                    FieldDef::new(
                        "id",
                        |e: &Self| e.id.to_value(),
                        |e, v| {
                            e.id = FromValue::from_value(v)?;
                            Ok(())
                        },
                    )
                    .primary_key(),
                )
                .field(FieldDef::new(
                    "title",
                    |e: &Self| e.title.to_value(),
                    |e, v| {
                        e.title = FromValue::from_value(v)?;
                        Ok(())
                    },
                ))
        }
    }

    #[test]
    fn test_primary_key_value() {
        let d = derive_descriptor::<Draft>().unwrap();
        let draft = Draft {
            id: Some(4),
            title: None,
        };
        assert_eq!(primary_key_value(&d, &draft).unwrap(), Value::Int(4));
    }

    #[test]
    fn test_null_primary_key_value_rejected() {
        let d = derive_descriptor::<Draft>().unwrap();
        let draft = Draft {
            id: None,
            title: Some("untitled".into()),
        };
        assert_eq!(
            primary_key_value(&d, &draft).unwrap_err(),
            MappingError::NullKey {
                entity: "Draft",
                column: "id".into()
            }
        );
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut map = ColumnValueMap::new();
        map.insert("a", Value::Int(1));
        map.insert("b", Value::Int(2));
        map.insert("a", Value::Int(3));
        let cols: Vec<_> = map.columns().collect();
        assert_eq!(cols, vec!["a", "b"]);
        assert_eq!(map.get("a"), Some(&Value::Int(3)));
    }

    #[test]
    fn test_serializes_in_insertion_order() {
        let map = ColumnValueMap::new()
            .with("zeta", Value::Int(1))
            .with("alpha", Value::Null);
        assert_eq!(
            serde_json::to_string(&map).unwrap(),
            r#"{"zeta":1,"alpha":null}"#
        );
    }

    #[test]
    fn test_deserializes_in_document_order() {
        let map: ColumnValueMap = serde_json::from_str(r#"{"b":2,"a":"x"}"#).unwrap();
        let cols: Vec<_> = map.columns().collect();
        assert_eq!(cols, vec!["b", "a"]);
        assert_eq!(map.get("a"), Some(&Value::Text("x".into())));
    }

    #[test]
    fn test_remove() {
        let mut map = ColumnValueMap::new().with("a", Value::Bool(true));
        assert_eq!(map.remove("a"), Some(Value::Bool(true)));
        assert!(map.is_empty());
        assert_eq!(map.remove("a"), None);
    }
}
