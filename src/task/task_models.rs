use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub priority: String,
    pub due_date: Option<DateTime<Utc>>,
    pub is_completed: bool,
    /// Set once the reminder notification has been dispatched. Never reset
    /// by the scheduler.
    pub reminder_sent: bool,
    /// Set once the overdue notification has been dispatched. Independent of
    /// `reminder_sent`: both events may fire for the same task.
    pub overdue_notification_sent: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// True when the task is due within `window` of `now` and the reminder
    /// has not yet been sent. Mirrors the SQL in `PgTaskRepository`.
    pub fn is_due_for_reminder(&self, now: DateTime<Utc>, window: Duration) -> bool {
        match self.due_date {
            Some(due) => {
                !self.is_completed && !self.reminder_sent && due >= now && due <= now + window
            }
            None => false,
        }
    }

    /// True when the due date has passed and the overdue notification has not
    /// yet been sent. Mirrors the SQL in `PgTaskRepository`.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        match self.due_date {
            Some(due) => !self.is_completed && !self.overdue_notification_sent && due < now,
            None => false,
        }
    }
}
