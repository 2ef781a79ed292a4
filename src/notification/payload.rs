use crate::task::Task;
use serde::Serialize;

/// Icon path resolved by the web client's asset bundle.
pub const NOTIFICATION_ICON: &str = "assets/icons/icon-96x96.png";

/// The two scheduler-originated notification events. Each is gated by its
/// own per-task flag, so one task can produce both across separate ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationEvent {
    Reminder,
    Overdue,
}

impl std::fmt::Display for NotificationEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationEvent::Reminder => write!(f, "reminder"),
            NotificationEvent::Overdue => write!(f, "overdue"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PayloadData {
    pub url: String,
}

/// Channel-agnostic notification content. Derived per task and event, never
/// persisted; each adapter reshapes it into its own wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub data: PayloadData,
}

impl NotificationPayload {
    pub fn for_task(task: &Task, event: NotificationEvent) -> Self {
        let (title, body) = match event {
            NotificationEvent::Reminder => (
                format!("🔔 Reminder: {}", task.title),
                "Your task is due in less than an hour!".to_string(),
            ),
            NotificationEvent::Overdue => (
                format!("⏰ Overdue task: {}", task.title),
                "You did not complete this task on time.".to_string(),
            ),
        };

        Self {
            title,
            body,
            icon: NOTIFICATION_ICON.to_string(),
            data: PayloadData {
                url: format!("/tasks/{}", task.id),
            },
        }
    }
}
