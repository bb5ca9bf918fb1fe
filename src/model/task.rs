use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned task identifier. Never reused after deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub i64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A task item as seen by handlers and the store.
///
/// `id`, `created_at` and `updated_at` stay `None` until the first save;
/// only a [`TaskStore`](crate::database::TaskStore) fills them in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Option<TaskId>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Task {
    /// An unsaved task with the given title and `completed = false`.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }

    /// True once the store has assigned an id.
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Overwrite every mutable field from a full replacement body.
    pub fn replace_with(&mut self, replacement: TaskReplacement) {
        self.title = Some(replacement.title);
        self.description = replacement.description;
        self.completed = replacement.completed;
    }

    pub fn mark_completed(&mut self) {
        self.completed = true;
    }
}

/// POST body. Any subset of the mutable fields; `id` and timestamps sent by
/// the caller are not part of this shape and are dropped on deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskDraft {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
}

impl From<TaskDraft> for Task {
    fn from(draft: TaskDraft) -> Self {
        Self {
            title: draft.title,
            description: draft.description,
            completed: draft.completed.unwrap_or(false),
            ..Self::default()
        }
    }
}

/// PUT body. A full replace: `title` and `completed` are required,
/// an omitted `description` clears it.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskReplacement {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub completed: bool,
}
