use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use tracing::info;

use crate::config::DatabaseConfig;
use crate::model::{Task, TaskId};

use super::repository::{now_micros, StoreError, TaskFilter, TaskStore};

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS tasks (
        id          BIGSERIAL PRIMARY KEY,
        title       TEXT,
        description TEXT,
        completed   BOOLEAN NOT NULL DEFAULT FALSE,
        created_at  TIMESTAMPTZ NOT NULL,
        updated_at  TIMESTAMPTZ NOT NULL
    )
"#;

const COLUMNS: &str = "id, title, description, completed, created_at, updated_at";

#[derive(Debug, FromRow)]
struct TaskRow {
    id: i64,
    title: Option<String>,
    description: Option<String>,
    completed: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        Self {
            id: Some(TaskId(row.id)),
            title: row.title,
            description: row.description,
            completed: row.completed,
            created_at: Some(row.created_at),
            updated_at: Some(row.updated_at),
        }
    }
}

/// [`TaskStore`] over a PostgreSQL `tasks` table
#[derive(Debug, Clone)]
pub struct PgTaskStore {
    pool: PgPool,
}

impl PgTaskStore {
    /// Connect using `config.url` and make sure the table exists.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let url = config
            .url
            .as_deref()
            .ok_or_else(|| StoreError::Unavailable("DATABASE_URL is not set".to_string()))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let store = Self::from_pool(pool);
        store.migrate().await?;
        info!("Connected task store to PostgreSQL");
        Ok(store)
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Idempotent schema bootstrap
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("Closed task store pool");
    }

    async fn insert(&self, task: Task) -> Result<Task, StoreError> {
        let now = now_micros();
        let sql = format!(
            "INSERT INTO tasks (title, description, completed, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $4) RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(task.title)
            .bind(task.description)
            .bind(task.completed)
            .bind(now)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn update(&self, id: TaskId, task: Task) -> Result<Task, StoreError> {
        // created_at is never in the SET list; updated_at always moves forward.
        let sql = format!(
            "UPDATE tasks SET title = $2, description = $3, completed = $4, \
             updated_at = GREATEST($5, updated_at + INTERVAL '1 microsecond') \
             WHERE id = $1 RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(id.0)
            .bind(task.title)
            .bind(task.description)
            .bind(task.completed)
            .bind(now_micros())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Task::from).ok_or(StoreError::NotFound(id))
    }
}

#[async_trait]
impl TaskStore for PgTaskStore {
    async fn find_by_id(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
        let sql = format!("SELECT {COLUMNS} FROM tasks WHERE id = $1");
        let row = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Task::from))
    }

    async fn find_all(&self) -> Result<Vec<Task>, StoreError> {
        let sql = format!("SELECT {COLUMNS} FROM tasks ORDER BY id");
        let rows = sqlx::query_as::<_, TaskRow>(&sql).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Task::from).collect())
    }

    async fn find_where(&self, filter: TaskFilter) -> Result<Vec<Task>, StoreError> {
        // NULL parameter leaves the column unconstrained
        let sql = format!(
            "SELECT {COLUMNS} FROM tasks \
             WHERE ($1::BOOLEAN IS NULL OR completed = $1) ORDER BY id"
        );
        let rows = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(filter.completed)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Task::from).collect())
    }

    async fn save(&self, task: Task) -> Result<Task, StoreError> {
        match task.id {
            None => self.insert(task).await,
            Some(id) => self.update(id, task).await,
        }
    }

    async fn delete_by_id(&self, id: TaskId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn exists_by_id(&self, id: TaskId) -> Result<bool, StoreError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM tasks WHERE id = $1)")
            .bind(id.0)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tasks")
            .fetch_one(&self.pool)
            .await?;
        u64::try_from(count).map_err(|_| StoreError::QueryError(format!("negative count {count}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_converts_to_persisted_task() {
        let now = now_micros();
        let task = Task::from(TaskRow {
            id: 7,
            title: Some("row".into()),
            description: None,
            completed: true,
            created_at: now,
            updated_at: now,
        });
        assert_eq!(task.id, Some(TaskId(7)));
        assert!(task.is_persisted());
        assert!(task.completed);
        assert_eq!(task.created_at, task.updated_at);
    }

    #[tokio::test]
    async fn connect_without_url_is_unavailable() {
        let config = DatabaseConfig {
            url: None,
            max_connections: 1,
            connection_timeout: 1,
        };
        let err = PgTaskStore::connect(&config).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }

    /// Connects only when `TEST_DATABASE_URL` points at a scratch database.
    async fn live_store() -> Option<PgTaskStore> {
        let url = std::env::var("TEST_DATABASE_URL").ok()?;
        let config = DatabaseConfig {
            url: Some(url),
            max_connections: 2,
            connection_timeout: 5,
        };
        Some(PgTaskStore::connect(&config).await.expect("connect to TEST_DATABASE_URL"))
    }

    // One test so concurrent CREATE TABLE IF NOT EXISTS never races.
    #[tokio::test]
    async fn sql_round_trip_against_live_database() {
        let Some(store) = live_store().await else {
            eprintln!("TEST_DATABASE_URL not set; skipping PostgreSQL store test");
            return;
        };

        // insert
        let open = store.save(Task::new("pg open")).await.unwrap();
        let done = store
            .save(Task::new("pg done").with_completed(true))
            .await
            .unwrap();
        let open_id = open.id.unwrap();
        let done_id = done.id.unwrap();
        assert!(done_id > open_id);
        assert!(open.created_at.is_some());
        assert_eq!(open.created_at, open.updated_at);

        // update keeps created_at and moves updated_at forward
        let mut changed = open.clone();
        changed.title = Some("pg open, renamed".into());
        changed.description = Some("now with a description".into());
        let updated = store.save(changed).await.unwrap();
        assert_eq!(updated.id, Some(open_id));
        assert_eq!(updated.title.as_deref(), Some("pg open, renamed"));
        assert_eq!(updated.created_at, open.created_at);
        assert!(updated.updated_at > open.updated_at);

        // a stored updated_at ahead of the clock is still bumped past
        let ahead = now_micros() + chrono::Duration::hours(1);
        sqlx::query("UPDATE tasks SET updated_at = $2 WHERE id = $1")
            .bind(open_id.0)
            .bind(ahead)
            .execute(&store.pool)
            .await
            .unwrap();
        let current = store.find_by_id(open_id).await.unwrap().unwrap();
        let bumped = store.save(current).await.unwrap();
        assert_eq!(
            bumped.updated_at,
            Some(ahead + chrono::Duration::microseconds(1))
        );

        // completed filter, and no filter at all
        let completed = store.find_where(TaskFilter::completed(true)).await.unwrap();
        assert!(completed.iter().all(|t| t.completed));
        assert!(completed.iter().any(|t| t.id == Some(done_id)));
        assert!(!completed.iter().any(|t| t.id == Some(open_id)));

        let pending = store.find_where(TaskFilter::completed(false)).await.unwrap();
        assert!(pending.iter().all(|t| !t.completed));
        assert!(pending.iter().any(|t| t.id == Some(open_id)));

        let everything = store.find_where(TaskFilter::default()).await.unwrap();
        assert!(everything.iter().any(|t| t.id == Some(open_id)));
        assert!(everything.iter().any(|t| t.id == Some(done_id)));
        assert!(everything.windows(2).all(|w| w[0].id < w[1].id));
        assert!(store.count().await.unwrap() >= 2);

        // delete, then every lookup of that id misses
        assert!(store.exists_by_id(done_id).await.unwrap());
        assert!(store.delete_by_id(done_id).await.unwrap());
        assert!(!store.delete_by_id(done_id).await.unwrap());
        assert!(!store.exists_by_id(done_id).await.unwrap());
        assert!(store.find_by_id(done_id).await.unwrap().is_none());
        let err = store.save(done).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(id) if id == done_id));

        store.delete_by_id(open_id).await.unwrap();
        store.close().await;
    }
}
