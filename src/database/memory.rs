use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::model::{Task, TaskId};

use super::repository::{next_timestamp, StoreError, TaskFilter, TaskStore};

#[derive(Debug, Default)]
struct Inner {
    tasks: BTreeMap<TaskId, Task>,
    // Last id handed out; ids are never reused.
    last_id: i64,
}

/// Process-local [`TaskStore`] backed by an ordered map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn find_by_id(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
        Ok(self.inner.read().await.tasks.get(&id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Task>, StoreError> {
        Ok(self.inner.read().await.tasks.values().cloned().collect())
    }

    async fn find_where(&self, filter: TaskFilter) -> Result<Vec<Task>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .tasks
            .values()
            .filter(|task| filter.matches(task))
            .cloned()
            .collect())
    }

    async fn save(&self, mut task: Task) -> Result<Task, StoreError> {
        let mut inner = self.inner.write().await;

        match task.id {
            None => {
                inner.last_id += 1;
                let id = TaskId(inner.last_id);
                let now = next_timestamp(None);
                task.id = Some(id);
                task.created_at = Some(now);
                task.updated_at = Some(now);
                inner.tasks.insert(id, task.clone());
                Ok(task)
            }
            Some(id) => {
                let stored = inner.tasks.get_mut(&id).ok_or(StoreError::NotFound(id))?;
                stored.title = task.title;
                stored.description = task.description;
                stored.completed = task.completed;
                stored.updated_at = Some(next_timestamp(stored.updated_at));
                Ok(stored.clone())
            }
        }
    }

    async fn delete_by_id(&self, id: TaskId) -> Result<bool, StoreError> {
        Ok(self.inner.write().await.tasks.remove(&id).is_some())
    }

    async fn exists_by_id(&self, id: TaskId) -> Result<bool, StoreError> {
        Ok(self.inner.read().await.tasks.contains_key(&id))
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.inner.read().await.tasks.len() as u64)
    }
}
