use crate::error::Result;
use crate::task::task_models::Task;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// Task store as seen by the notification scheduler. The CRUD API layer owns
/// creation and editing; the scheduler only queries due tasks and sets the
/// two notification flags.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Uncompleted tasks with `now <= due_date <= now + window` whose
    /// reminder has not been sent yet.
    async fn find_due_for_reminder(
        &self,
        now: DateTime<Utc>,
        window: Duration,
    ) -> Result<Vec<Task>>;

    /// Uncompleted tasks with `due_date < now` whose overdue notification has
    /// not been sent yet.
    async fn find_overdue(&self, now: DateTime<Utc>) -> Result<Vec<Task>>;

    async fn mark_reminder_sent(&self, task_id: Uuid) -> Result<()>;

    async fn mark_overdue_notification_sent(&self, task_id: Uuid) -> Result<()>;
}

#[derive(Clone)]
pub struct PgTaskRepository {
    pool: PgPool,
}

impl PgTaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskStore for PgTaskRepository {
    async fn find_due_for_reminder(
        &self,
        now: DateTime<Utc>,
        window: Duration,
    ) -> Result<Vec<Task>> {
        let tasks = sqlx::query_as::<_, Task>(
            "SELECT * FROM tasks
             WHERE is_completed = false
               AND reminder_sent = false
               AND due_date IS NOT NULL
               AND due_date >= $1
               AND due_date <= $2
             ORDER BY due_date ASC",
        )
        .bind(now)
        .bind(now + window)
        .fetch_all(&self.pool)
        .await?;

        Ok(tasks)
    }

    async fn find_overdue(&self, now: DateTime<Utc>) -> Result<Vec<Task>> {
        let tasks = sqlx::query_as::<_, Task>(
            "SELECT * FROM tasks
             WHERE is_completed = false
               AND overdue_notification_sent = false
               AND due_date IS NOT NULL
               AND due_date < $1
             ORDER BY due_date ASC",
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(tasks)
    }

    // The flags only ever move from false to true here. Resetting them on a
    // due-date edit is the CRUD layer's call, not the scheduler's.
    async fn mark_reminder_sent(&self, task_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE tasks SET reminder_sent = true, updated_at = NOW() WHERE id = $1")
            .bind(task_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn mark_overdue_notification_sent(&self, task_id: Uuid) -> Result<()> {
        sqlx::query(
            "UPDATE tasks SET overdue_notification_sent = true, updated_at = NOW() WHERE id = $1",
        )
        .bind(task_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
