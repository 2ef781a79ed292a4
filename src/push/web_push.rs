use crate::config::WebPushConfig;
use crate::notification::payload::NotificationPayload;
use crate::push::{PushOutcome, WebPushSender};
use crate::user::WebPushSubscription;
use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, error, warn};
use web_push::{
    ContentEncoding, HyperWebPushClient, SubscriptionInfo, VapidSignatureBuilder, WebPushClient,
    WebPushError, WebPushMessage, WebPushMessageBuilder, URL_SAFE_NO_PAD,
};

/// Web-push adapter signing requests with the VAPID key pair. Constructed
/// without credentials it degrades to a no-op that logs and reports
/// `TransientError` for every call.
pub struct VapidWebPushSender {
    client: HyperWebPushClient,
    config: Option<WebPushConfig>,
}

impl VapidWebPushSender {
    pub fn new(config: Option<WebPushConfig>) -> Self {
        if config.is_none() {
            warn!("VAPID keys not configured; web push notifications are disabled");
        }
        Self {
            client: HyperWebPushClient::new(),
            config,
        }
    }

    /// The wire body wraps the logical payload in a `notification` envelope,
    /// the shape the browser service worker expects.
    fn wire_body(payload: &NotificationPayload) -> Vec<u8> {
        serde_json::to_vec(&json!({ "notification": payload })).unwrap_or_default()
    }

    fn build_message(
        config: &WebPushConfig,
        subscription: &WebPushSubscription,
        body: &[u8],
    ) -> Result<WebPushMessage, WebPushError> {
        let info = SubscriptionInfo::new(
            subscription.endpoint.clone(),
            subscription.p256dh.clone(),
            subscription.auth.clone(),
        );

        let mut signature =
            VapidSignatureBuilder::from_base64(&config.private_key, URL_SAFE_NO_PAD, &info)?;
        signature.add_claim("sub", config.subject.as_str());

        let mut builder = WebPushMessageBuilder::new(&info);
        builder.set_payload(ContentEncoding::Aes128Gcm, body);
        builder.set_vapid_signature(signature.build()?);
        builder.build()
    }
}

#[async_trait]
impl WebPushSender for VapidWebPushSender {
    async fn send(
        &self,
        subscription: &WebPushSubscription,
        payload: &NotificationPayload,
    ) -> PushOutcome {
        let Some(config) = &self.config else {
            warn!("web push send skipped: VAPID keys not configured");
            return PushOutcome::TransientError;
        };

        let body = Self::wire_body(payload);
        let message = match Self::build_message(config, subscription, &body) {
            Ok(message) => message,
            Err(e) => {
                error!(endpoint = %subscription.endpoint, "failed to build web push message: {e}");
                return PushOutcome::TransientError;
            }
        };

        match self.client.send(message).await {
            Ok(()) => {
                debug!(endpoint = %subscription.endpoint, "web push delivered");
                PushOutcome::Delivered
            }
            // 404 / 410 from the push service: the subscription is gone.
            Err(WebPushError::EndpointNotFound) | Err(WebPushError::EndpointNotValid) => {
                warn!(endpoint = %subscription.endpoint, "web push endpoint no longer valid");
                PushOutcome::InvalidEndpoint
            }
            Err(e) => {
                error!(endpoint = %subscription.endpoint, "web push send failed: {e}");
                PushOutcome::TransientError
            }
        }
    }
}
