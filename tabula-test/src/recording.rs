use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tabula_core::executor::Executor;
use tabula_core::request::{
    DeleteByCondition, DeleteByKey, InsertMany, InsertOne, Request, SelectAdvanced, SelectByKey,
    UpdateByCondition, UpdateByKey,
};
use tabula_core::{ExecutorError, Row};

/// A scripted reply consumed by the next executor call.
#[derive(Debug, Clone)]
pub enum Reply {
    Affected(u64),
    Row(Option<Row>),
    Rows(Vec<Row>),
    Fail(String),
}

/// Executor that records every request it receives and answers from a
/// FIFO of scripted replies.
///
/// With no reply queued, mutating calls report one affected row (batches
/// report their row count) and selects return nothing.
///
/// ```ignore
/// let executor = RecordingExecutor::new();
/// executor.push_rows(vec![row]);
/// let crud = CrudEngine::new(&executor);
/// let users: Vec<User> = crud.select_advanced(Criteria::new())?;
/// assert_eq!(executor.requests().len(), 1);
/// ```
#[derive(Default)]
pub struct RecordingExecutor {
    requests: Mutex<Vec<Request>>,
    replies: Mutex<VecDeque<Reply>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_reply(&self, reply: Reply) -> &Self {
        lock(&self.replies).push_back(reply);
        self
    }

    pub fn push_affected(&self, affected: u64) -> &Self {
        self.push_reply(Reply::Affected(affected))
    }

    pub fn push_row(&self, row: Option<Row>) -> &Self {
        self.push_reply(Reply::Row(row))
    }

    pub fn push_rows(&self, rows: Vec<Row>) -> &Self {
        self.push_reply(Reply::Rows(rows))
    }

    /// Make the next call fail with `message`.
    pub fn fail_next(&self, message: impl Into<String>) -> &Self {
        self.push_reply(Reply::Fail(message.into()))
    }

    /// Snapshot of the recorded requests, oldest first.
    pub fn requests(&self) -> Vec<Request> {
        lock(&self.requests).clone()
    }

    pub fn last_request(&self) -> Option<Request> {
        lock(&self.requests).last().cloned()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.requests).len()
    }

    /// The recorded requests as JSON, for whole-request assertions.
    pub fn requests_json(&self) -> serde_json::Value {
        serde_json::to_value(&*lock(&self.requests)).unwrap_or(serde_json::Value::Null)
    }

    pub fn clear(&self) {
        lock(&self.requests).clear();
        lock(&self.replies).clear();
    }

    fn record(&self, request: impl Into<Request>) -> Option<Reply> {
        let request = request.into();
        tracing::trace!(kind = request.kind(), table = request.table_name(), "Recorded request");
        lock(&self.requests).push(request);
        lock(&self.replies).pop_front()
    }

    fn affected(&self, request: impl Into<Request>, default: u64) -> Result<u64, ExecutorError> {
        match self.record(request) {
            None => Ok(default),
            Some(Reply::Affected(n)) => Ok(n),
            Some(Reply::Fail(message)) => Err(ExecutorError::msg(message)),
            Some(other) => Err(unexpected("an affected-row count", &other)),
        }
    }
}

fn unexpected(expected: &str, reply: &Reply) -> ExecutorError {
    ExecutorError::msg(format!("scripted reply {reply:?} where {expected} was expected"))
}

impl Executor for RecordingExecutor {
    fn select_by_key(&self, request: SelectByKey) -> Result<Option<Row>, ExecutorError> {
        match self.record(request) {
            None => Ok(None),
            Some(Reply::Row(row)) => Ok(row),
            Some(Reply::Fail(message)) => Err(ExecutorError::msg(message)),
            Some(other) => Err(unexpected("a single row", &other)),
        }
    }

    fn insert(&self, request: InsertOne) -> Result<u64, ExecutorError> {
        self.affected(request, 1)
    }

    fn insert_batch(&self, request: InsertMany) -> Result<u64, ExecutorError> {
        let rows = request.rows.len() as u64;
        self.affected(request, rows)
    }

    fn delete_by_key(&self, request: DeleteByKey) -> Result<u64, ExecutorError> {
        self.affected(request, 1)
    }

    fn delete_by_condition(&self, request: DeleteByCondition) -> Result<u64, ExecutorError> {
        self.affected(request, 1)
    }

    fn update_by_key(&self, request: UpdateByKey) -> Result<u64, ExecutorError> {
        self.affected(request, 1)
    }

    fn update_by_condition(&self, request: UpdateByCondition) -> Result<u64, ExecutorError> {
        self.affected(request, 1)
    }

    fn select_advanced(&self, request: SelectAdvanced) -> Result<Vec<Row>, ExecutorError> {
        match self.record(request) {
            None => Ok(Vec::new()),
            Some(Reply::Rows(rows)) => Ok(rows),
            Some(Reply::Fail(message)) => Err(ExecutorError::msg(message)),
            Some(other) => Err(unexpected("a list of rows", &other)),
        }
    }
}
