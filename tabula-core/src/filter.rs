//! Fluent builders for condition and order expressions.
//!
//! Hand-written condition strings work fine with [`Criteria`](crate::Criteria),
//! but a [`Filter`] validates column names and generates the parameter tokens
//! so values never end up inside the expression text.
//!
//! ```ignore
//! let filter = Filter::new()
//!     .eq("status", "active")
//!     .like("name", "%alice%")
//!     .in_list("role", ["admin", "user"]);
//! let (expr, params) = filter.render()?;
//! assert_eq!(expr, "status = :p0 AND name LIKE :p1 AND role IN (:p2, :p3)");
//! ```

use crate::error::QueryError;
use crate::ident::is_valid_identifier;
use crate::query::Params;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Token syntax used for bound parameters inside condition expressions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamStyle {
    /// `:name`
    #[default]
    Colon,
    /// `#{name}`
    Hash,
}

impl ParamStyle {
    pub fn token(self, name: &str) -> String {
        match self {
            ParamStyle::Colon => format!(":{name}"),
            ParamStyle::Hash => format!("#{{{name}}}"),
        }
    }
}

impl FromStr for ParamStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "colon" => Ok(ParamStyle::Colon),
            "hash" => Ok(ParamStyle::Hash),
            other => Err(format!("unknown parameter style `{other}` (expected `colon` or `hash`)")),
        }
    }
}

#[derive(Debug, Clone)]
enum Condition {
    Eq(String, Value),
    NotEq(String, Value),
    Like(String, Value),
    Gt(String, Value),
    Lt(String, Value),
    In(String, Vec<Value>),
    IsNull(String),
    IsNotNull(String),
}

impl Condition {
    fn column(&self) -> &str {
        match self {
            Condition::Eq(c, _)
            | Condition::NotEq(c, _)
            | Condition::Like(c, _)
            | Condition::Gt(c, _)
            | Condition::Lt(c, _)
            | Condition::In(c, _)
            | Condition::IsNull(c)
            | Condition::IsNotNull(c) => c,
        }
    }
}

/// Conjunction of simple column conditions.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    conditions: Vec<Condition>,
    style: ParamStyle,
    prefix: Option<String>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn style(mut self, style: ParamStyle) -> Self {
        self.style = style;
        self
    }

    /// Prefix for generated token names (default `p`).
    pub fn token_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Eq(column.to_string(), value.into()));
        self
    }

    pub fn not_eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::NotEq(column.to_string(), value.into()));
        self
    }

    pub fn like(mut self, column: &str, pattern: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Like(column.to_string(), pattern.into()));
        self
    }

    pub fn gt(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Gt(column.to_string(), value.into()));
        self
    }

    pub fn lt(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Lt(column.to_string(), value.into()));
        self
    }

    pub fn in_list<I, V>(mut self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.conditions.push(Condition::In(
            column.to_string(),
            values.into_iter().map(Into::into).collect(),
        ));
        self
    }

    pub fn is_null(mut self, column: &str) -> Self {
        self.conditions.push(Condition::IsNull(column.to_string()));
        self
    }

    pub fn is_not_null(mut self, column: &str) -> Self {
        self.conditions.push(Condition::IsNotNull(column.to_string()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Render the expression and its parameters.
    ///
    /// An empty filter renders as an empty expression.
    pub fn render(&self) -> Result<(String, Params), QueryError> {
        let prefix = self.prefix.as_deref().unwrap_or("p");
        let mut params = Params::new();
        let mut clauses = Vec::with_capacity(self.conditions.len());
        let next_token = |value: &Value, params: &mut Params| {
            let name = format!("{prefix}{}", params.len());
            params.insert(name.clone(), value.clone());
            self.style.token(&name)
        };

        for cond in &self.conditions {
            let col = cond.column();
            if !is_valid_identifier(col) {
                return Err(QueryError::InvalidIdentifier {
                    kind: "column",
                    ident: col.to_string(),
                });
            }
            let clause = match cond {
                Condition::Eq(_, val) => format!("{col} = {}", next_token(val, &mut params)),
                Condition::NotEq(_, val) => format!("{col} != {}", next_token(val, &mut params)),
                Condition::Like(_, val) => format!("{col} LIKE {}", next_token(val, &mut params)),
                Condition::Gt(_, val) => format!("{col} > {}", next_token(val, &mut params)),
                Condition::Lt(_, val) => format!("{col} < {}", next_token(val, &mut params)),
                // IN () is not valid SQL; an empty list matches nothing.
                Condition::In(_, vals) if vals.is_empty() => "1 = 0".to_string(),
                Condition::In(_, vals) => {
                    let tokens: Vec<_> = vals
                        .iter()
                        .map(|val| next_token(val, &mut params))
                        .collect();
                    format!("{col} IN ({})", tokens.join(", "))
                }
                Condition::IsNull(_) => format!("{col} IS NULL"),
                Condition::IsNotNull(_) => format!("{col} IS NOT NULL"),
            };
            clauses.push(clause);
        }
        Ok((clauses.join(" AND "), params))
    }
}

/// Ordered list of `column ASC|DESC` terms.
#[derive(Debug, Clone, Default)]
pub struct OrderBy {
    terms: Vec<(String, bool)>,
}

impl OrderBy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn asc(mut self, column: &str) -> Self {
        self.terms.push((column.to_string(), true));
        self
    }

    pub fn desc(mut self, column: &str) -> Self {
        self.terms.push((column.to_string(), false));
        self
    }

    pub fn render(&self) -> Result<String, QueryError> {
        let mut clauses = Vec::with_capacity(self.terms.len());
        for (col, asc) in &self.terms {
            if !is_valid_identifier(col) {
                return Err(QueryError::InvalidIdentifier {
                    kind: "order",
                    ident: col.clone(),
                });
            }
            if *asc {
                clauses.push(format!("{col} ASC"));
            } else {
                clauses.push(format!("{col} DESC"));
            }
        }
        Ok(clauses.join(", "))
    }
}
