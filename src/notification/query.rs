use crate::error::Result;
use crate::task::{Task, TaskStore};
use crate::user::{User, UserStore};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::warn;

/// A due task with its owning user fully resolved. Queries hand out either
/// plain `Task` rows (store level) or these aggregates (engine level), never
/// an ambiguous mix.
#[derive(Debug, Clone)]
pub struct DueTask {
    pub task: Task,
    pub user: User,
}

/// Time-windowed queries over the task store, resolving each hit to its
/// owning user. Idempotent across ticks: the notification flags checked by
/// the store queries keep already-notified tasks out of both sets.
pub struct DueTaskQuery {
    tasks: Arc<dyn TaskStore>,
    users: Arc<dyn UserStore>,
    window: Duration,
}

impl DueTaskQuery {
    pub fn new(tasks: Arc<dyn TaskStore>, users: Arc<dyn UserStore>, window: Duration) -> Self {
        Self {
            tasks,
            users,
            window,
        }
    }

    /// Tasks due within the reminder window of `now`.
    pub async fn upcoming(&self, now: DateTime<Utc>) -> Result<Vec<DueTask>> {
        let tasks = self.tasks.find_due_for_reminder(now, self.window).await?;
        self.resolve_owners(tasks).await
    }

    /// Tasks whose due date has already passed.
    pub async fn overdue(&self, now: DateTime<Utc>) -> Result<Vec<DueTask>> {
        let tasks = self.tasks.find_overdue(now).await?;
        self.resolve_owners(tasks).await
    }

    // A task pointing at a missing user is skipped with a warning; a store
    // error propagates to the tick boundary.
    async fn resolve_owners(&self, tasks: Vec<Task>) -> Result<Vec<DueTask>> {
        let mut due = Vec::with_capacity(tasks.len());

        for task in tasks {
            match self.users.find_by_id(task.user_id).await? {
                Some(user) => due.push(DueTask { task, user }),
                None => {
                    warn!(task_id = %task.id, user_id = %task.user_id, "skipping task: owning user not found");
                }
            }
        }

        Ok(due)
    }
}
