use async_trait::async_trait;
use chrono::{DateTime, Duration, DurationRound, Utc};
use thiserror::Error;

use crate::model::{Task, TaskId};

/// Errors from a [`TaskStore`]
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Task {0} not found")]
    NotFound(TaskId),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Predicate for [`TaskStore::find_where`]. Unset fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub completed: Option<bool>,
}

impl TaskFilter {
    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
        }
    }

    pub fn matches(&self, task: &Task) -> bool {
        self.completed.map_or(true, |c| task.completed == c)
    }
}

/// Durable keyed storage for task items.
///
/// The store is the sole authority for id assignment and timestamps:
/// `save` on a task without an id inserts it and stamps `created_at` and
/// `updated_at`; `save` on a task with an id overwrites the mutable fields,
/// refreshes `updated_at` and keeps the stored `created_at`. Saving an id
/// that is no longer stored yields [`StoreError::NotFound`].
///
/// Listing operations return tasks in ascending id order.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn find_by_id(&self, id: TaskId) -> Result<Option<Task>, StoreError>;

    async fn find_all(&self) -> Result<Vec<Task>, StoreError>;

    async fn find_where(&self, filter: TaskFilter) -> Result<Vec<Task>, StoreError>;

    async fn save(&self, task: Task) -> Result<Task, StoreError>;

    /// Returns `false` when nothing was deleted.
    async fn delete_by_id(&self, id: TaskId) -> Result<bool, StoreError>;

    async fn exists_by_id(&self, id: TaskId) -> Result<bool, StoreError>;

    async fn count(&self) -> Result<u64, StoreError>;

    /// Like `find_by_id`, but a missing task is an error.
    async fn find_404(&self, id: TaskId) -> Result<Task, StoreError> {
        self.find_by_id(id).await?.ok_or(StoreError::NotFound(id))
    }
}

/// Current time at microsecond precision (what PostgreSQL keeps).
pub fn now_micros() -> DateTime<Utc> {
    let now = Utc::now();
    now.duration_trunc(Duration::microseconds(1)).unwrap_or(now)
}

/// Timestamp for a save whose previous `updated_at` was `previous`.
/// Always strictly later than `previous`.
pub fn next_timestamp(previous: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let now = now_micros();
    match previous {
        Some(prev) if now <= prev => prev + Duration::microseconds(1),
        _ => now,
    }
}
