// Declare submodules
pub mod task_models;
pub mod task_repository;

// Re-export public items
pub use task_models::Task;
pub use task_repository::{PgTaskRepository, TaskStore};
