use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::database::TaskFilter;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::model::{Task, TaskDraft, TaskId, TaskReplacement};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Only return tasks whose `completed` flag equals this value
    pub completed: Option<bool>,
}

/// GET /tasks[?completed=bool]
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<Task>> {
    tracing::info!("Fetching all tasks, completed filter: {:?}", query.completed);
    let tasks = match query.completed {
        Some(completed) => state.store.find_where(TaskFilter::completed(completed)).await?,
        None => state.store.find_all().await?,
    };
    Ok(ApiResponse::success(tasks))
}

/// GET /tasks/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<TaskId>) -> ApiResult<Task> {
    tracing::info!("Fetching task with id: {}", id);
    let task = state.store.find_404(id).await?;
    Ok(ApiResponse::success(task))
}

/// POST /tasks
pub async fn create(
    State(state): State<AppState>,
    Json(draft): Json<TaskDraft>,
) -> ApiResult<Task> {
    tracing::info!("Creating new task: {:?}", draft.title);
    let saved = state.store.save(Task::from(draft)).await?;
    Ok(ApiResponse::created(saved))
}

/// PUT /tasks/:id - full replace of title, description and completed
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<TaskId>,
    Json(replacement): Json<TaskReplacement>,
) -> ApiResult<Task> {
    tracing::info!("Updating task with id: {}", id);
    let mut task = state.store.find_404(id).await?;
    task.replace_with(replacement);
    let updated = state.store.save(task).await?;
    Ok(ApiResponse::success(updated))
}

/// PATCH /tasks/:id/complete
pub async fn complete(State(state): State<AppState>, Path(id): Path<TaskId>) -> ApiResult<Task> {
    tracing::info!("Marking task {} as completed", id);
    let mut task = state.store.find_404(id).await?;
    task.mark_completed();
    let updated = state.store.save(task).await?;
    Ok(ApiResponse::success(updated))
}

/// DELETE /tasks/:id
pub async fn delete(State(state): State<AppState>, Path(id): Path<TaskId>) -> ApiResult<()> {
    tracing::info!("Deleting task with id: {}", id);
    if !state.store.exists_by_id(id).await? {
        return Err(ApiError::not_found(format!("task {} not found", id)));
    }
    // Lost a race with a concurrent delete
    if !state.store.delete_by_id(id).await? {
        return Err(ApiError::not_found(format!("task {} already deleted", id)));
    }
    Ok(ApiResponse::no_content())
}
