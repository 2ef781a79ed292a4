use std::path::PathBuf;
use std::time::Duration;

/// How far ahead of a due date the reminder notification fires.
pub const DEFAULT_REMINDER_WINDOW_MINUTES: u64 = 60;

/// How often the scheduler scans the task store.
pub const DEFAULT_SCHEDULER_INTERVAL_SECS: u64 = 60;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub scheduler_interval: Duration,
    pub reminder_window: chrono::Duration,
    pub web_push: Option<WebPushConfig>,
    pub fcm: Option<FcmConfig>,
}

/// VAPID key pair for signing web-push requests.
#[derive(Clone)]
pub struct WebPushConfig {
    pub public_key: String,
    pub private_key: String,
    pub subject: String,
}

/// Firebase service-account credentials for FCM HTTP v1.
#[derive(Clone)]
pub struct FcmConfig {
    pub service_account_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        let scheduler_interval_secs = std::env::var("SCHEDULER_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_SCHEDULER_INTERVAL_SECS);

        let reminder_window_minutes = std::env::var("REMINDER_WINDOW_MINUTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_REMINDER_WINDOW_MINUTES);

        Self {
            database_url: std::env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            scheduler_interval: Duration::from_secs(scheduler_interval_secs),
            reminder_window: chrono::Duration::minutes(reminder_window_minutes as i64),
            web_push: Self::web_push_from_env(),
            fcm: Self::fcm_from_env(),
        }
    }

    // Channel credentials are optional: a missing pair means the channel
    // degrades to a logging no-op rather than failing startup.
    fn web_push_from_env() -> Option<WebPushConfig> {
        let public_key = std::env::var("VAPID_PUBLIC_KEY").ok()?;
        let private_key = std::env::var("VAPID_PRIVATE_KEY").ok()?;
        let subject = std::env::var("VAPID_SUBJECT")
            .unwrap_or_else(|_| "mailto:test@example.com".to_string());

        Some(WebPushConfig {
            public_key,
            private_key,
            subject,
        })
    }

    fn fcm_from_env() -> Option<FcmConfig> {
        let path = std::env::var("FCM_SERVICE_ACCOUNT").ok()?;
        Some(FcmConfig {
            service_account_path: PathBuf::from(path),
        })
    }
}
