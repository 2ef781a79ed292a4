use crate::error::Result;
use crate::user::user_models::{NativePushToken, User, WebPushSubscription};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// User store as seen by the notification subsystem: aggregate lookup plus
/// endpoint-collection mutation. Inserts are add-if-absent, removals are
/// remove-if-present, so a race between a user-initiated unsubscribe and the
/// scheduler's invalid-endpoint cleanup is harmless.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Resolves the user with both delivery-endpoint collections loaded.
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>>;

    async fn add_web_subscription(
        &self,
        user_id: Uuid,
        subscription: &WebPushSubscription,
    ) -> Result<()>;

    /// Removes the subscription with exactly this endpoint, wherever it is
    /// attached. Endpoints are unique system-wide.
    async fn remove_web_subscription(&self, endpoint: &str) -> Result<()>;

    async fn add_native_token(&self, user_id: Uuid, token: &NativePushToken) -> Result<()>;

    /// Removes the native token with exactly this token string.
    async fn remove_native_token(&self, token: &str) -> Result<()>;
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    created_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserRepository {
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, email, created_at FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let push_subscriptions = sqlx::query_as::<_, WebPushSubscription>(
            "SELECT endpoint, expiration_time, p256dh, auth
             FROM push_subscriptions WHERE user_id = $1 ORDER BY created_at ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let native_push_tokens = sqlx::query_as::<_, NativePushToken>(
            "SELECT token, platform FROM native_push_tokens
             WHERE user_id = $1 ORDER BY created_at ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(User {
            id: row.id,
            username: row.username,
            email: row.email,
            created_at: row.created_at,
            push_subscriptions,
            native_push_tokens,
        }))
    }

    async fn add_web_subscription(
        &self,
        user_id: Uuid,
        subscription: &WebPushSubscription,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO push_subscriptions (user_id, endpoint, expiration_time, p256dh, auth)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (endpoint) DO NOTHING",
        )
        .bind(user_id)
        .bind(&subscription.endpoint)
        .bind(subscription.expiration_time)
        .bind(&subscription.p256dh)
        .bind(&subscription.auth)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove_web_subscription(&self, endpoint: &str) -> Result<()> {
        sqlx::query("DELETE FROM push_subscriptions WHERE endpoint = $1")
            .bind(endpoint)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn add_native_token(&self, user_id: Uuid, token: &NativePushToken) -> Result<()> {
        sqlx::query(
            "INSERT INTO native_push_tokens (user_id, token, platform)
             VALUES ($1, $2, $3)
             ON CONFLICT (token) DO NOTHING",
        )
        .bind(user_id)
        .bind(&token.token)
        .bind(token.platform)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove_native_token(&self, token: &str) -> Result<()> {
        sqlx::query("DELETE FROM native_push_tokens WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
