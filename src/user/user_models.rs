use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Platform tag carried with a native push token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Android,
    Ios,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::Android => write!(f, "android"),
            Platform::Ios => write!(f, "ios"),
        }
    }
}

/// Browser web-push subscription: endpoint URL plus the two encryption keys
/// handed out by the push service. Endpoints are unique system-wide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct WebPushSubscription {
    pub endpoint: String,
    pub expiration_time: Option<i64>,
    pub p256dh: String,
    pub auth: String,
}

/// Device token issued by a mobile push service. Tokens are unique
/// system-wide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct NativePushToken {
    pub token: String,
    pub platform: Platform,
}

/// User aggregate with both delivery-endpoint collections resolved. This is
/// what the dispatch engine fans out over.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub push_subscriptions: Vec<WebPushSubscription>,
    pub native_push_tokens: Vec<NativePushToken>,
}
