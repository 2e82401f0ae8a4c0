//! Advanced-select criteria and query descriptors.
//!
//! # Example
//!
//! ```ignore
//! let criteria = Criteria::new()
//!     .condition("status = :status AND age > :age")
//!     .param("status", "active")
//!     .param("age", 18)
//!     .order("created_at DESC")
//!     .page(2, 20);
//! let users: Vec<User> = crud.select_advanced(criteria)?;
//! ```

use crate::error::QueryError;
use crate::filter::{Filter, OrderBy};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Bound parameters of a condition expression, keyed by token name.
pub type Params = BTreeMap<String, Value>;

/// Caller-facing input of an advanced select.
///
/// The condition and order expressions are handed to the executor untouched;
/// matching tokens against parameters is the executor's job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Criteria {
    /// Columns to return. Only honoured by `select_advanced_by_column`.
    pub columns: Option<Vec<String>>,
    pub condition: Option<String>,
    pub params: Params,
    pub order: Option<String>,
    pub page_no: Option<u64>,
    pub page_size: Option<u64>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn condition(mut self, expression: impl Into<String>) -> Self {
        self.condition = Some(expression.into());
        self
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn params(mut self, params: Params) -> Self {
        self.params.extend(params);
        self
    }

    pub fn order(mut self, expression: impl Into<String>) -> Self {
        self.order = Some(expression.into());
        self
    }

    /// Request page `page_no` (1-based) of `page_size` rows.
    pub fn page(mut self, page_no: u64, page_size: u64) -> Self {
        self.page_no = Some(page_no);
        self.page_size = Some(page_size);
        self
    }

    /// Replace the condition and its parameters with those rendered from a
    /// [`Filter`]. Parameters bound earlier are dropped along with the old
    /// condition; bind extra ones with [`param`](Self::param) afterwards.
    pub fn filter(mut self, filter: Filter) -> Result<Self, QueryError> {
        let (expression, params) = filter.render()?;
        self.condition = if expression.is_empty() {
            None
        } else {
            Some(expression)
        };
        self.params = params;
        Ok(self)
    }

    /// Replace the order expression with one rendered from an [`OrderBy`].
    pub fn order_by(mut self, order: OrderBy) -> Result<Self, QueryError> {
        let expression = order.render()?;
        self.order = if expression.is_empty() {
            None
        } else {
            Some(expression)
        };
        Ok(self)
    }
}

/// LIMIT/OFFSET window of a paginated query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub limit: u64,
    pub offset: u64,
}

/// Structured description of an advanced select.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryDescriptor {
    pub table_name: String,
    pub select_columns: Vec<String>,
    pub filter_expression: Option<String>,
    pub filter_parameters: Params,
    pub order_expression: Option<String>,
    pub pagination: Option<Pagination>,
}

/// Turn a 1-based page number and page size into a LIMIT/OFFSET window.
///
/// Both must be present to paginate; neither means an unbounded query.
pub fn pagination(
    page_no: Option<u64>,
    page_size: Option<u64>,
    max_page_size: Option<u64>,
) -> Result<Option<Pagination>, QueryError> {
    let (page_no, page_size) = match (page_no, page_size) {
        (None, None) => return Ok(None),
        (Some(no), Some(size)) => (no, size),
        (page_no, page_size) => {
            return Err(QueryError::PartialPagination { page_no, page_size })
        }
    };
    if page_no < 1 {
        return Err(QueryError::InvalidPageNo(page_no));
    }
    if page_size < 1 {
        return Err(QueryError::InvalidPageSize(page_size));
    }
    if let Some(max) = max_page_size {
        if page_size > max {
            return Err(QueryError::PageSizeTooLarge { page_size, max });
        }
    }
    let offset = (page_no - 1)
        .checked_mul(page_size)
        .ok_or(QueryError::InvalidPageNo(page_no))?;
    Ok(Some(Pagination {
        limit: page_size,
        offset,
    }))
}

/// Assemble the descriptor of an advanced select over `select_columns`.
pub fn build_query(
    table_name: &str,
    select_columns: Vec<String>,
    criteria: Criteria,
    max_page_size: Option<u64>,
) -> Result<QueryDescriptor, QueryError> {
    let pagination = pagination(criteria.page_no, criteria.page_size, max_page_size)?;
    Ok(QueryDescriptor {
        table_name: table_name.to_string(),
        select_columns,
        filter_expression: criteria.condition,
        filter_parameters: criteria.params,
        order_expression: criteria.order,
        pagination,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols() -> Vec<String> {
        vec!["id".into(), "name".into()]
    }

    #[test]
    fn test_second_page() {
        let q = build_query("users", cols(), Criteria::new().page(2, 10), None).unwrap();
        assert_eq!(
            q.pagination,
            Some(Pagination {
                limit: 10,
                offset: 10
            })
        );
    }

    #[test]
    fn test_first_page_starts_at_zero() {
        let q = build_query("users", cols(), Criteria::new().page(1, 10), None).unwrap();
        assert_eq!(q.pagination.unwrap().offset, 0);
    }

    #[test]
    fn test_unpaged_query_is_unbounded() {
        let q = build_query("users", cols(), Criteria::new(), None).unwrap();
        assert_eq!(q.pagination, None);
        assert_eq!(q.select_columns, cols());
    }

    #[test]
    fn test_partial_pagination_rejected() {
        let mut only_no = Criteria::new();
        only_no.page_no = Some(1);
        assert!(matches!(
            build_query("users", cols(), only_no, None),
            Err(QueryError::PartialPagination { .. })
        ));

        let mut only_size = Criteria::new();
        only_size.page_size = Some(10);
        assert!(matches!(
            build_query("users", cols(), only_size, None),
            Err(QueryError::PartialPagination { .. })
        ));
    }

    #[test]
    fn test_zero_page_values_rejected() {
        assert_eq!(pagination(Some(0), Some(10), None), Err(QueryError::InvalidPageNo(0)));
        assert_eq!(pagination(Some(1), Some(0), None), Err(QueryError::InvalidPageSize(0)));
    }

    #[test]
    fn test_max_page_size() {
        assert_eq!(
            pagination(Some(1), Some(500), Some(100)),
            Err(QueryError::PageSizeTooLarge {
                page_size: 500,
                max: 100
            })
        );
        assert!(pagination(Some(1), Some(100), Some(100)).unwrap().is_some());
    }

    #[test]
    fn test_condition_passes_through() {
        let criteria = Criteria::new()
            .condition("name = :name")
            .param("name", "bob")
            .order("id DESC");
        let q = build_query("users", cols(), criteria, None).unwrap();
        assert_eq!(q.filter_expression.as_deref(), Some("name = :name"));
        assert_eq!(q.filter_parameters.get("name"), Some(&Value::Text("bob".into())));
        assert_eq!(q.order_expression.as_deref(), Some("id DESC"));
    }

    #[test]
    fn test_filter_replaces_earlier_params() {
        let criteria = Criteria::new()
            .param("old", 1)
            .condition("x = :old")
            .filter(Filter::new().eq("a", 2))
            .unwrap();
        assert_eq!(criteria.condition.as_deref(), Some("a = :p0"));
        assert_eq!(criteria.params.len(), 1);
        assert_eq!(criteria.params.get("p0"), Some(&Value::Int(2)));
        assert!(!criteria.params.contains_key("old"));
    }

    #[test]
    fn test_criteria_from_json() {
        let json = r#"{"condition":"age > :age","params":{"age":30},"page_no":3,"page_size":5}"#;
        let criteria: Criteria = serde_json::from_str(json).unwrap();
        let q = build_query("users", cols(), criteria, None).unwrap();
        assert_eq!(q.pagination, Some(Pagination { limit: 5, offset: 10 }));
        assert_eq!(q.filter_parameters.get("age"), Some(&Value::Int(30)));
    }
}
