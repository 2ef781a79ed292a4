// Declare submodules
pub mod dispatch;
pub mod payload;
pub mod query;
pub mod scheduler;
#[cfg(test)]
pub mod testing;

// Re-export public items
pub use dispatch::Dispatcher;
pub use payload::{NotificationEvent, NotificationPayload};
pub use query::{DueTask, DueTaskQuery};
pub use scheduler::NotificationScheduler;
