use crate::config::FcmConfig;
use crate::notification::payload::NotificationPayload;
use crate::push::{NativePushSender, PushOutcome};
use crate::user::NativePushToken;
use async_trait::async_trait;
use gcp_auth::{CustomServiceAccount, TokenProvider};
use serde_json::{json, Value};
use tracing::{debug, error, warn};

const FCM_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";
const FCM_ENDPOINT: &str = "https://fcm.googleapis.com/v1/projects";

/// Native push adapter speaking the FCM HTTP v1 API, authenticated with a
/// Firebase service account. Without credentials it degrades to a no-op that
/// logs and reports `TransientError` for every call.
pub struct FcmPushSender {
    http: reqwest::Client,
    credentials: Option<FcmCredentials>,
}

struct FcmCredentials {
    account: CustomServiceAccount,
    project_id: String,
}

impl FcmPushSender {
    pub async fn from_config(config: Option<FcmConfig>) -> Self {
        let credentials = match config {
            Some(config) => match Self::load_credentials(&config).await {
                Ok(credentials) => Some(credentials),
                Err(e) => {
                    warn!("failed to load FCM service account: {e}; native push disabled");
                    None
                }
            },
            None => {
                warn!("FCM_SERVICE_ACCOUNT not set; native push notifications are disabled");
                None
            }
        };

        Self {
            http: reqwest::Client::new(),
            credentials,
        }
    }

    async fn load_credentials(config: &FcmConfig) -> Result<FcmCredentials, gcp_auth::Error> {
        let account = CustomServiceAccount::from_file(&config.service_account_path)?;
        let project_id = account
            .project_id()
            .ok_or(gcp_auth::Error::Str("service account has no project_id"))?
            .to_string();
        Ok(FcmCredentials {
            account,
            project_id,
        })
    }

    /// Pure reshape of the channel-agnostic payload into the FCM v1 message
    /// envelope. The notification block carries what the OS renders; the data
    /// block carries the deep link and icon for the app to consume.
    fn to_fcm_message(token: &NativePushToken, payload: &NotificationPayload) -> Value {
        json!({
            "message": {
                "token": token.token,
                "notification": {
                    "title": payload.title,
                    "body": payload.body,
                },
                "data": {
                    "url": payload.data.url,
                    "icon": payload.icon,
                },
                "android": {
                    "priority": "HIGH",
                },
                "apns": {
                    "headers": { "apns-priority": "10" },
                },
            }
        })
    }
}

#[async_trait]
impl NativePushSender for FcmPushSender {
    async fn send(&self, token: &NativePushToken, payload: &NotificationPayload) -> PushOutcome {
        let Some(credentials) = &self.credentials else {
            warn!("native push send skipped: FCM credentials not configured");
            return PushOutcome::TransientError;
        };

        let bearer = match credentials.account.token(&[FCM_SCOPE]).await {
            Ok(bearer) => bearer,
            Err(e) => {
                error!("failed to obtain FCM access token: {e}");
                return PushOutcome::TransientError;
            }
        };

        let url = format!("{}/{}/messages:send", FCM_ENDPOINT, credentials.project_id);
        let response = self
            .http
            .post(&url)
            .bearer_auth(bearer.as_str())
            .json(&Self::to_fcm_message(token, payload))
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                error!(platform = %token.platform, "native push send failed: {e}");
                return PushOutcome::TransientError;
            }
        };

        let status = response.status();
        if status.is_success() {
            debug!(platform = %token.platform, "native push delivered");
            return PushOutcome::Delivered;
        }

        let body: Value = response.json().await.unwrap_or_default();
        let error_status = body["error"]["status"].as_str().unwrap_or_default();

        // UNREGISTERED / INVALID_ARGUMENT mean the token itself is no longer
        // usable and should be purged.
        if status == reqwest::StatusCode::NOT_FOUND
            || error_status == "UNREGISTERED"
            || error_status == "INVALID_ARGUMENT"
        {
            warn!(platform = %token.platform, "native push token no longer valid");
            PushOutcome::InvalidEndpoint
        } else {
            error!(platform = %token.platform, "native push rejected: {status} {error_status}");
            PushOutcome::TransientError
        }
    }
}
