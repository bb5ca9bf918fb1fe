pub mod task;

pub use task::{Task, TaskDraft, TaskId, TaskReplacement};
