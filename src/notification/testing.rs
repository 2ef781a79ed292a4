//! In-memory store and channel doubles for scheduler tests. The stores obey
//! the same contracts as the Postgres repositories: window predicates match
//! the SQL, endpoint inserts are add-if-absent, removals remove-if-present.

use crate::error::{AppError, Result};
use crate::notification::payload::NotificationPayload;
use crate::push::{NativePushSender, PushOutcome, WebPushSender};
use crate::task::{Task, TaskStore};
use crate::user::{NativePushToken, Platform, User, UserStore, WebPushSubscription};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration as StdDuration;
use tokio::sync::Mutex;
use uuid::Uuid;

pub fn task_due_in(user_id: Uuid, minutes: i64) -> Task {
    let now = Utc::now();
    Task {
        id: Uuid::new_v4(),
        user_id,
        title: "Write report".to_string(),
        description: None,
        priority: "medium".to_string(),
        due_date: Some(now + Duration::minutes(minutes)),
        is_completed: false,
        reminder_sent: false,
        overdue_notification_sent: false,
        created_at: now,
        updated_at: now,
    }
}

pub fn web_subscription(endpoint: &str) -> WebPushSubscription {
    WebPushSubscription {
        endpoint: endpoint.to_string(),
        expiration_time: None,
        p256dh: "p256dh-key".to_string(),
        auth: "auth-secret".to_string(),
    }
}

pub fn native_token(token: &str) -> NativePushToken {
    NativePushToken {
        token: token.to_string(),
        platform: Platform::Android,
    }
}

pub fn user_with(subscriptions: &[WebPushSubscription], tokens: &[NativePushToken]) -> User {
    User {
        id: Uuid::new_v4(),
        username: "olena".to_string(),
        email: "olena@example.com".to_string(),
        created_at: Utc::now(),
        push_subscriptions: subscriptions.to_vec(),
        native_push_tokens: tokens.to_vec(),
    }
}

fn store_unreachable() -> AppError {
    AppError::Database(sqlx::Error::PoolClosed)
}

#[derive(Default)]
pub struct MemoryTaskStore {
    tasks: Mutex<Vec<Task>>,
    fail_all: AtomicBool,
    fail_upcoming_only: AtomicBool,
    fail_marks: AtomicBool,
}

impl MemoryTaskStore {
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        Self {
            tasks: Mutex::new(tasks),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        let store = Self::default();
        store.set_failing(true);
        store
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail_all.store(failing, Ordering::SeqCst);
    }

    pub fn set_failing_upcoming_only(&self, failing: bool) {
        self.fail_upcoming_only.store(failing, Ordering::SeqCst);
    }

    pub fn fail_marks(&self) {
        self.fail_marks.store(true, Ordering::SeqCst);
    }

    pub async fn insert(&self, task: Task) {
        self.tasks.lock().await.push(task);
    }

    pub async fn get(&self, id: Uuid) -> Option<Task> {
        self.tasks.lock().await.iter().find(|t| t.id == id).cloned()
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn find_due_for_reminder(
        &self,
        now: DateTime<Utc>,
        window: Duration,
    ) -> Result<Vec<Task>> {
        if self.fail_all.load(Ordering::SeqCst) || self.fail_upcoming_only.load(Ordering::SeqCst) {
            return Err(store_unreachable());
        }
        Ok(self
            .tasks
            .lock()
            .await
            .iter()
            .filter(|t| t.is_due_for_reminder(now, window))
            .cloned()
            .collect())
    }

    async fn find_overdue(&self, now: DateTime<Utc>) -> Result<Vec<Task>> {
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(store_unreachable());
        }
        Ok(self
            .tasks
            .lock()
            .await
            .iter()
            .filter(|t| t.is_overdue(now))
            .cloned()
            .collect())
    }

    async fn mark_reminder_sent(&self, task_id: Uuid) -> Result<()> {
        if self.fail_marks.load(Ordering::SeqCst) {
            return Err(store_unreachable());
        }
        let mut tasks = self.tasks.lock().await;
        if let Some(task) = tasks.iter_mut().find(|t| t.id == task_id) {
            task.reminder_sent = true;
        }
        Ok(())
    }

    async fn mark_overdue_notification_sent(&self, task_id: Uuid) -> Result<()> {
        if self.fail_marks.load(Ordering::SeqCst) {
            return Err(store_unreachable());
        }
        let mut tasks = self.tasks.lock().await;
        if let Some(task) = tasks.iter_mut().find(|t| t.id == task_id) {
            task.overdue_notification_sent = true;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub async fn insert(&self, user: User) {
        self.users.lock().await.insert(user.id, user);
    }

    pub async fn get(&self, id: Uuid) -> Option<User> {
        self.users.lock().await.get(&id).cloned()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        Ok(self.users.lock().await.get(&user_id).cloned())
    }

    async fn add_web_subscription(
        &self,
        user_id: Uuid,
        subscription: &WebPushSubscription,
    ) -> Result<()> {
        let mut users = self.users.lock().await;
        let exists = users
            .values()
            .any(|u| u.push_subscriptions.iter().any(|s| s.endpoint == subscription.endpoint));
        if !exists {
            if let Some(user) = users.get_mut(&user_id) {
                user.push_subscriptions.push(subscription.clone());
            }
        }
        Ok(())
    }

    async fn remove_web_subscription(&self, endpoint: &str) -> Result<()> {
        for user in self.users.lock().await.values_mut() {
            user.push_subscriptions.retain(|s| s.endpoint != endpoint);
        }
        Ok(())
    }

    async fn add_native_token(&self, user_id: Uuid, token: &NativePushToken) -> Result<()> {
        let mut users = self.users.lock().await;
        let exists = users
            .values()
            .any(|u| u.native_push_tokens.iter().any(|t| t.token == token.token));
        if !exists {
            if let Some(user) = users.get_mut(&user_id) {
                user.native_push_tokens.push(token.clone());
            }
        }
        Ok(())
    }

    async fn remove_native_token(&self, token: &str) -> Result<()> {
        for user in self.users.lock().await.values_mut() {
            user.native_push_tokens.retain(|t| t.token != token);
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct ScriptedWebSender {
    outcomes: Mutex<HashMap<String, PushOutcome>>,
    calls: Mutex<Vec<String>>,
    delay: Mutex<Option<StdDuration>>,
}

impl ScriptedWebSender {
    pub async fn script(&self, endpoint: &str, outcome: PushOutcome) {
        self.outcomes
            .lock()
            .await
            .insert(endpoint.to_string(), outcome);
    }

    pub async fn set_delay(&self, delay: StdDuration) {
        *self.delay.lock().await = Some(delay);
    }

    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl WebPushSender for ScriptedWebSender {
    async fn send(
        &self,
        subscription: &WebPushSubscription,
        _payload: &NotificationPayload,
    ) -> PushOutcome {
        let delay = *self.delay.lock().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.calls.lock().await.push(subscription.endpoint.clone());
        self.outcomes
            .lock()
            .await
            .get(&subscription.endpoint)
            .copied()
            .unwrap_or(PushOutcome::Delivered)
    }
}

#[derive(Default)]
pub struct ScriptedNativeSender {
    outcomes: Mutex<HashMap<String, PushOutcome>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedNativeSender {
    pub async fn script(&self, token: &str, outcome: PushOutcome) {
        self.outcomes.lock().await.insert(token.to_string(), outcome);
    }

    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl NativePushSender for ScriptedNativeSender {
    async fn send(&self, token: &NativePushToken, _payload: &NotificationPayload) -> PushOutcome {
        self.calls.lock().await.push(token.token.clone());
        self.outcomes
            .lock()
            .await
            .get(&token.token)
            .copied()
            .unwrap_or(PushOutcome::Delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Contract shared with the Postgres repository: subscribing then
    // unsubscribing the same endpoint leaves the collection as it was, and
    // re-subscribing an existing endpoint is a no-op.
    #[tokio::test]
    async fn subscribe_then_unsubscribe_round_trips() {
        let store = MemoryUserStore::default();
        let user = user_with(&[web_subscription("https://push/stable")], &[]);
        store.insert(user.clone()).await;

        let new_sub = web_subscription("https://push/new");
        store.add_web_subscription(user.id, &new_sub).await.unwrap();
        assert_eq!(store.get(user.id).await.unwrap().push_subscriptions.len(), 2);

        store
            .remove_web_subscription("https://push/new")
            .await
            .unwrap();
        let stored = store.get(user.id).await.unwrap();
        assert_eq!(stored.push_subscriptions, user.push_subscriptions);
    }

    #[tokio::test]
    async fn duplicate_subscription_is_not_added_twice() {
        let store = MemoryUserStore::default();
        let user = user_with(&[web_subscription("https://push/1")], &[]);
        store.insert(user.clone()).await;

        store
            .add_web_subscription(user.id, &web_subscription("https://push/1"))
            .await
            .unwrap();
        assert_eq!(store.get(user.id).await.unwrap().push_subscriptions.len(), 1);
    }

    #[tokio::test]
    async fn removing_unknown_token_is_a_no_op() {
        let store = MemoryUserStore::default();
        let user = user_with(&[], &[native_token("tok-1")]);
        store.insert(user.clone()).await;

        store.remove_native_token("tok-unknown").await.unwrap();
        assert_eq!(store.get(user.id).await.unwrap().native_push_tokens.len(), 1);
    }
}
