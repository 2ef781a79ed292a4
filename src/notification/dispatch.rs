use crate::error::Result;
use crate::notification::payload::{NotificationEvent, NotificationPayload};
use crate::notification::query::DueTask;
use crate::push::{NativePushSender, PushOutcome, WebPushSender};
use crate::task::TaskStore;
use crate::user::UserStore;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{error, info};

/// Fans one task's notification out across every delivery endpoint of its
/// owner, prunes endpoints the channels report as gone, then marks the task
/// notified.
///
/// The flag means "attempted", not "confirmed delivered": a task with zero
/// endpoints, or whose sends all failed, is still marked. Deliberate policy;
/// re-scanning such tasks every tick would hammer a broken channel forever.
pub struct Dispatcher {
    tasks: Arc<dyn TaskStore>,
    users: Arc<dyn UserStore>,
    web: Arc<dyn WebPushSender>,
    native: Arc<dyn NativePushSender>,
}

impl Dispatcher {
    pub fn new(
        tasks: Arc<dyn TaskStore>,
        users: Arc<dyn UserStore>,
        web: Arc<dyn WebPushSender>,
        native: Arc<dyn NativePushSender>,
    ) -> Self {
        Self {
            tasks,
            users,
            web,
            native,
        }
    }

    pub async fn dispatch(&self, due: &DueTask, event: NotificationEvent) -> Result<()> {
        let payload = NotificationPayload::for_task(&due.task, event);

        // Fire all sends concurrently, join before touching any state.
        let web_sends = due.user.push_subscriptions.iter().map(|sub| {
            let payload = &payload;
            async move { (sub, self.web.send(sub, payload).await) }
        });
        let native_sends = due.user.native_push_tokens.iter().map(|token| {
            let payload = &payload;
            async move { (token, self.native.send(token, payload).await) }
        });

        let (web_outcomes, native_outcomes) =
            tokio::join!(join_all(web_sends), join_all(native_sends));

        // Cleanup failures are logged but never block the flag update.
        for (subscription, outcome) in web_outcomes {
            if outcome == PushOutcome::InvalidEndpoint {
                match self
                    .users
                    .remove_web_subscription(&subscription.endpoint)
                    .await
                {
                    Ok(()) => {
                        info!(endpoint = %subscription.endpoint, "removed invalid web push subscription")
                    }
                    Err(e) => {
                        error!(endpoint = %subscription.endpoint, "failed to remove invalid web push subscription: {e}")
                    }
                }
            }
        }
        for (token, outcome) in native_outcomes {
            if outcome == PushOutcome::InvalidEndpoint {
                match self.users.remove_native_token(&token.token).await {
                    Ok(()) => info!(platform = %token.platform, "removed invalid native push token"),
                    Err(e) => {
                        error!(platform = %token.platform, "failed to remove invalid native push token: {e}")
                    }
                }
            }
        }

        match event {
            NotificationEvent::Reminder => self.tasks.mark_reminder_sent(due.task.id).await?,
            NotificationEvent::Overdue => {
                self.tasks.mark_overdue_notification_sent(due.task.id).await?
            }
        }

        info!(task_id = %due.task.id, %event, "notification dispatched");
        Ok(())
    }
}
