use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Scheduler error: {0}")]
    Scheduler(String),
}

impl From<tokio_cron_scheduler::JobSchedulerError> for AppError {
    fn from(err: tokio_cron_scheduler::JobSchedulerError) -> Self {
        AppError::Scheduler(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
