use std::fmt;

/// Convenience alias for results returned by the CRUD engine.
pub type CrudResult<T> = Result<T, CrudError>;

/// Errors raised while turning an entity type or instance into table metadata.
#[derive(Debug, Clone, PartialEq)]
pub enum MappingError {
    /// Every field is transient, or the type declares no fields at all.
    NoColumns { entity: &'static str },
    /// More than one field carries the primary-key marker.
    AmbiguousKey {
        entity: &'static str,
        columns: Vec<String>,
    },
    /// A key-dependent operation was requested on a type without a key field.
    MissingKey { entity: &'static str },
    /// The key field (or a caller-supplied key) holds no value.
    NullKey { entity: &'static str, column: String },
    /// Two fields map onto the same column name.
    DuplicateColumn {
        entity: &'static str,
        column: String,
    },
    /// A derived table or column name is not a plain SQL identifier.
    InvalidIdentifier { kind: &'static str, ident: String },
    /// A caller referenced a column the entity does not declare.
    UnknownColumn {
        entity: &'static str,
        column: String,
    },
    /// A raw value could not be written into an entity field.
    Conversion { column: String, reason: String },
}

impl fmt::Display for MappingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingError::NoColumns { entity } => {
                write!(f, "Entity `{entity}` declares no mappable columns")
            }
            MappingError::AmbiguousKey { entity, columns } => write!(
                f,
                "Entity `{entity}` declares more than one primary key: {}",
                columns.join(", ")
            ),
            MappingError::MissingKey { entity } => {
                write!(f, "Entity `{entity}` declares no primary key")
            }
            MappingError::NullKey { entity, column } => {
                write!(f, "Primary key `{column}` of entity `{entity}` is null")
            }
            MappingError::DuplicateColumn { entity, column } => {
                write!(f, "Entity `{entity}` maps column `{column}` more than once")
            }
            MappingError::InvalidIdentifier { kind, ident } => {
                write!(f, "Invalid {kind} identifier: {ident}")
            }
            MappingError::UnknownColumn { entity, column } => {
                write!(f, "Entity `{entity}` has no column `{column}`")
            }
            MappingError::Conversion { column, reason } => {
                write!(f, "Cannot map value of column `{column}`: {reason}")
            }
        }
    }
}

impl std::error::Error for MappingError {}

/// Errors raised while assembling a query or update request.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryError {
    /// Only one of page number and page size was supplied.
    PartialPagination {
        page_no: Option<u64>,
        page_size: Option<u64>,
    },
    /// Page numbers are 1-based.
    InvalidPageNo(u64),
    /// Page size must be at least 1.
    InvalidPageSize(u64),
    /// Page size exceeds the configured maximum.
    PageSizeTooLarge { page_size: u64, max: u64 },
    /// An update would carry an empty SET list.
    EmptyAssignment { table: String },
    /// A select was given an explicit but empty column list.
    EmptySelection { table: String },
    /// A column or order identifier failed validation.
    InvalidIdentifier { kind: &'static str, ident: String },
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::PartialPagination { page_no, page_size } => write!(
                f,
                "Pagination requires both page number and page size (got page_no={page_no:?}, page_size={page_size:?})"
            ),
            QueryError::InvalidPageNo(n) => write!(f, "Page number must be >= 1, got {n}"),
            QueryError::InvalidPageSize(n) => write!(f, "Page size must be >= 1, got {n}"),
            QueryError::PageSizeTooLarge { page_size, max } => {
                write!(f, "Page size {page_size} exceeds the maximum of {max}")
            }
            QueryError::EmptyAssignment { table } => {
                write!(f, "Update of `{table}` has no columns to assign")
            }
            QueryError::EmptySelection { table } => {
                write!(f, "Select from `{table}` names no columns")
            }
            QueryError::InvalidIdentifier { kind, ident } => {
                write!(f, "Invalid {kind} identifier: {ident}")
            }
        }
    }
}

impl std::error::Error for QueryError {}

/// Opaque failure reported by an [`Executor`](crate::Executor).
///
/// The CRUD engine never inspects the cause; it only carries it back to the
/// caller.
#[derive(Debug)]
pub struct ExecutorError {
    message: String,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ExecutorError {
    /// Wrap a backend-specific error.
    pub fn new(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }

    /// Build an error from a plain message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ExecutorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ExecutorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.source {
            Some(err) => Some(err.as_ref()),
            None => None,
        }
    }
}

/// Top-level error returned by every CRUD operation.
#[derive(Debug)]
pub enum CrudError {
    Mapping(MappingError),
    InvalidQuery(QueryError),
    Executor(ExecutorError),
}

impl CrudError {
    pub fn is_mapping(&self) -> bool {
        matches!(self, CrudError::Mapping(_))
    }

    pub fn is_invalid_query(&self) -> bool {
        matches!(self, CrudError::InvalidQuery(_))
    }

    pub fn is_executor(&self) -> bool {
        matches!(self, CrudError::Executor(_))
    }
}

impl fmt::Display for CrudError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrudError::Mapping(err) => write!(f, "Mapping error: {err}"),
            CrudError::InvalidQuery(err) => write!(f, "Invalid query: {err}"),
            CrudError::Executor(err) => write!(f, "Executor error: {err}"),
        }
    }
}

impl std::error::Error for CrudError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CrudError::Mapping(err) => Some(err),
            CrudError::InvalidQuery(err) => Some(err),
            CrudError::Executor(err) => Some(err),
        }
    }
}

impl From<MappingError> for CrudError {
    fn from(err: MappingError) -> Self {
        CrudError::Mapping(err)
    }
}

impl From<QueryError> for CrudError {
    fn from(err: QueryError) -> Self {
        CrudError::InvalidQuery(err)
    }
}

impl From<ExecutorError> for CrudError {
    fn from(err: ExecutorError) -> Self {
        CrudError::Executor(err)
    }
}
