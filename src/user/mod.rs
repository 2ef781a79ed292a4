// Declare submodules
pub mod user_models;
pub mod user_repository;

// Re-export public items
pub use user_models::{NativePushToken, Platform, User, WebPushSubscription};
pub use user_repository::{PgUserRepository, UserStore};
