use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tabula_core::executor::Executor;
use tabula_core::request::{
    DeleteByCondition, DeleteByKey, InsertMany, InsertOne, SelectAdvanced, SelectByKey,
    UpdateByCondition, UpdateByKey,
};
use tabula_core::{ColumnValueMap, ExecutorError, Params, Row, Value};

/// In-memory executor backed by per-table row lists.
///
/// Understands key lookups and conditions made of `column = token` terms
/// joined by `AND` (as rendered by `Filter::eq`, in either parameter
/// style), plus `column ASC|DESC` order lists. Anything else is rejected
/// with an executor error.
#[derive(Default)]
pub struct MemoryExecutor {
    tables: Mutex<HashMap<String, Vec<Row>>>,
}

type Predicate = Vec<(String, Value)>;

impl MemoryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append rows to `table` directly, bypassing the engine.
    pub fn seed(&self, table: &str, rows: impl IntoIterator<Item = Row>) {
        self.tables()
            .entry(table.to_string())
            .or_default()
            .extend(rows);
    }

    /// Snapshot of the rows stored in `table`.
    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.tables().get(table).cloned().unwrap_or_default()
    }

    fn tables(&self) -> MutexGuard<'_, HashMap<String, Vec<Row>>> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn matches(row: &Row, predicate: &Predicate) -> bool {
    predicate
        .iter()
        .all(|(column, value)| row.get(column) == Some(value))
}

fn project(row: &Row, columns: &[String]) -> Row {
    columns
        .iter()
        .map(|c| (c.clone(), row.get(c).cloned().unwrap_or(Value::Null)))
        .collect()
}

fn assign(row: &mut Row, values: &ColumnValueMap) {
    for (column, value) in values.iter() {
        row.insert(column, value.clone());
    }
}

fn param_name(token: &str) -> Option<&str> {
    token
        .strip_prefix(':')
        .or_else(|| token.strip_prefix("#{").and_then(|t| t.strip_suffix('}')))
}

/// Parse `a = :p0 AND b = #{p1}` into column/value pairs.
fn parse_condition(condition: &str, params: &Params) -> Result<Predicate, ExecutorError> {
    let condition = condition.trim();
    if condition.is_empty() {
        return Ok(Vec::new());
    }
    condition
        .split(" AND ")
        .map(|term| -> Result<(String, Value), ExecutorError> {
            let (column, token) = term.split_once(" = ").ok_or_else(|| {
                ExecutorError::msg(format!("unsupported condition term `{term}`"))
            })?;
            let name = param_name(token.trim()).ok_or_else(|| {
                ExecutorError::msg(format!("expected a parameter token in `{term}`"))
            })?;
            let value = params
                .get(name)
                .cloned()
                .ok_or_else(|| ExecutorError::msg(format!("unbound parameter `{name}`")))?;
            Ok((column.trim().to_string(), value))
        })
        .collect()
}

/// Parse `a ASC, b DESC` into (column, ascending) pairs.
fn parse_order(order: &str) -> Result<Vec<(String, bool)>, ExecutorError> {
    order
        .split(',')
        .map(|term| -> Result<(String, bool), ExecutorError> {
            let mut parts = term.split_whitespace();
            let column = parts
                .next()
                .ok_or_else(|| ExecutorError::msg("empty order term"))?;
            let ascending = match parts.next().map(str::to_ascii_uppercase).as_deref() {
                None | Some("ASC") => true,
                Some("DESC") => false,
                Some(other) => {
                    return Err(ExecutorError::msg(format!("unsupported order direction `{other}`")))
                }
            };
            Ok((column.to_string(), ascending))
        })
        .collect()
}

fn rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Int(_) | Value::Float(_) => 2,
        Value::Text(_) => 3,
        Value::Bytes(_) => 4,
    }
}

/// Nulls sort first, numbers compare across int and float.
fn compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Int(x), Value::Int(y)) => x.cmp(y),
        (Value::Int(x), Value::Float(y)) => (*x as f64).total_cmp(y),
        (Value::Float(x), Value::Int(y)) => x.total_cmp(&(*y as f64)),
        (Value::Float(x), Value::Float(y)) => x.total_cmp(y),
        (Value::Text(x), Value::Text(y)) => x.cmp(y),
        (Value::Bytes(x), Value::Bytes(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

const NULL: Value = Value::Null;

fn sort(rows: &mut [Row], order: &[(String, bool)]) {
    rows.sort_by(|a, b| {
        for (column, ascending) in order {
            let left = a.get(column).unwrap_or(&NULL);
            let right = b.get(column).unwrap_or(&NULL);
            let ord = compare(left, right);
            let ord = if *ascending { ord } else { ord.reverse() };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
}

impl Executor for MemoryExecutor {
    fn select_by_key(&self, request: SelectByKey) -> Result<Option<Row>, ExecutorError> {
        let predicate = vec![(request.primary_key, request.key_value)];
        let tables = self.tables();
        let found = tables
            .get(&request.table_name)
            .and_then(|rows| rows.iter().find(|row| matches(row, &predicate)))
            .map(|row| project(row, &request.select_columns));
        Ok(found)
    }

    fn insert(&self, request: InsertOne) -> Result<u64, ExecutorError> {
        self.seed(&request.table_name, [request.values]);
        Ok(1)
    }

    fn insert_batch(&self, request: InsertMany) -> Result<u64, ExecutorError> {
        let columns = request.column_names;
        let rows: Vec<Row> = request
            .rows
            .into_iter()
            .map(|values| -> Result<Row, ExecutorError> {
                if values.len() != columns.len() {
                    return Err(ExecutorError::msg(format!(
                        "row has {} values for {} columns",
                        values.len(),
                        columns.len()
                    )));
                }
                Ok(columns.iter().cloned().zip(values).collect())
            })
            .collect::<Result<_, _>>()?;
        let inserted = rows.len() as u64;
        self.seed(&request.table_name, rows);
        Ok(inserted)
    }

    fn delete_by_key(&self, request: DeleteByKey) -> Result<u64, ExecutorError> {
        let predicate = vec![(request.primary_key, request.key_value)];
        Ok(delete_where(&mut self.tables(), &request.table_name, &predicate))
    }

    fn delete_by_condition(&self, request: DeleteByCondition) -> Result<u64, ExecutorError> {
        let predicate = parse_condition(&request.condition, &request.params)?;
        Ok(delete_where(&mut self.tables(), &request.table_name, &predicate))
    }

    fn update_by_key(&self, request: UpdateByKey) -> Result<u64, ExecutorError> {
        let predicate = vec![(request.primary_key, request.key_value)];
        Ok(update_where(
            &mut self.tables(),
            &request.table_name,
            &predicate,
            &request.values,
        ))
    }

    fn update_by_condition(&self, request: UpdateByCondition) -> Result<u64, ExecutorError> {
        let predicate = parse_condition(&request.condition, &request.params)?;
        Ok(update_where(
            &mut self.tables(),
            &request.table_name,
            &predicate,
            &request.values,
        ))
    }

    fn select_advanced(&self, request: SelectAdvanced) -> Result<Vec<Row>, ExecutorError> {
        let query = request.query;
        let predicate = match &query.filter_expression {
            Some(condition) => parse_condition(condition, &query.filter_parameters)?,
            None => Vec::new(),
        };
        let mut rows: Vec<Row> = self
            .tables()
            .get(&query.table_name)
            .map(|rows| {
                rows.iter()
                    .filter(|row| matches(row, &predicate))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        if let Some(order) = &query.order_expression {
            sort(&mut rows, &parse_order(order)?);
        }
        let rows = match query.pagination {
            Some(page) => {
                let offset = usize::try_from(page.offset).unwrap_or(usize::MAX);
                let limit = usize::try_from(page.limit).unwrap_or(usize::MAX);
                rows.into_iter().skip(offset).take(limit).collect()
            }
            None => rows,
        };
        Ok(rows
            .iter()
            .map(|row| project(row, &query.select_columns))
            .collect())
    }
}

fn delete_where(tables: &mut HashMap<String, Vec<Row>>, table: &str, predicate: &Predicate) -> u64 {
    let Some(rows) = tables.get_mut(table) else {
        return 0;
    };
    let before = rows.len();
    rows.retain(|row| !matches(row, predicate));
    (before - rows.len()) as u64
}

fn update_where(
    tables: &mut HashMap<String, Vec<Row>>,
    table: &str,
    predicate: &Predicate,
    values: &ColumnValueMap,
) -> u64 {
    let Some(rows) = tables.get_mut(table) else {
        return 0;
    };
    let mut updated = 0;
    for row in rows.iter_mut().filter(|row| matches(row, predicate)) {
        assign(row, values);
        updated += 1;
    }
    updated
}
