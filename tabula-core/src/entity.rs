use crate::value::{Value, ValueError};

/// Reads one field of an entity as a [`Value`].
pub type Getter<E> = fn(&E) -> Value;

/// Writes a [`Value`] back into one field of an entity.
pub type Setter<E> = fn(&mut E, Value) -> Result<(), ValueError>;

/// Trait representing a type that maps onto a single table row.
///
/// Usually generated with `#[derive(Entity)]`, but can be written by hand:
///
/// ```ignore
/// impl Entity for User {
///     fn shape() -> EntityShape<Self> {
///         EntityShape::new("User")
///             .field(FieldDef::new("id", |u: &User| u.id.to_value(), |u, v| {
///                 u.id = FromValue::from_value(v)?;
///                 Ok(())
///             }).primary_key())
///             .field(FieldDef::new("name", |u: &User| u.name.to_value(), |u, v| {
///                 u.name = FromValue::from_value(v)?;
///                 Ok(())
///             }))
///     }
/// }
/// ```
///
/// `Default` provides the starting point when rows are materialized back into
/// entities: columns missing from a row keep their default value.
pub trait Entity: Default + Send + Sync + 'static {
    /// The declared shape of this type. Called at most a handful of times per
    /// process; the resolved descriptor is cached.
    fn shape() -> EntityShape<Self>;
}

/// The declared, unvalidated shape of an entity type.
pub struct EntityShape<E> {
    pub type_name: &'static str,
    pub table: Option<&'static str>,
    pub fields: Vec<FieldDef<E>>,
}

impl<E> EntityShape<E> {
    pub fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            table: None,
            fields: Vec::new(),
        }
    }

    /// Override the derived table name.
    pub fn table(mut self, table: &'static str) -> Self {
        self.table = Some(table);
        self
    }

    pub fn field(mut self, field: FieldDef<E>) -> Self {
        self.fields.push(field);
        self
    }
}

/// One declared field together with its accessors and markers.
pub struct FieldDef<E> {
    pub name: &'static str,
    pub column: Option<&'static str>,
    pub primary_key: bool,
    pub transient: bool,
    pub get: Getter<E>,
    pub set: Setter<E>,
}

impl<E> FieldDef<E> {
    pub fn new(name: &'static str, get: Getter<E>, set: Setter<E>) -> Self {
        Self {
            name,
            column: None,
            primary_key: false,
            transient: false,
            get,
            set,
        }
    }

    /// Override the column name (defaults to the field name).
    pub fn column(mut self, column: &'static str) -> Self {
        self.column = Some(column);
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Exclude the field from the mapping entirely.
    pub fn transient(mut self) -> Self {
        self.transient = true;
        self
    }
}
