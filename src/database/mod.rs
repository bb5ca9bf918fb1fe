pub mod memory;
pub mod postgres;
pub mod repository;

pub use memory::InMemoryTaskStore;
pub use postgres::PgTaskStore;
pub use repository::{StoreError, TaskFilter, TaskStore};
