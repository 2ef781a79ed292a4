// Declare submodules
pub mod native_push;
pub mod web_push;

// Re-export public items
pub use self::native_push::FcmPushSender;
pub use self::web_push::VapidWebPushSender;

use crate::notification::payload::NotificationPayload;
use crate::user::{NativePushToken, WebPushSubscription};
use async_trait::async_trait;

/// Normalized result of one send attempt. Adapters never return an error:
/// every transport failure collapses into one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// The transport accepted the message.
    Delivered,
    /// The recipient address is permanently gone and should be purged.
    InvalidEndpoint,
    /// Channel-side or configuration failure; logged, no retry this tick.
    TransientError,
}

/// Browser web-push delivery channel.
#[async_trait]
pub trait WebPushSender: Send + Sync {
    async fn send(
        &self,
        subscription: &WebPushSubscription,
        payload: &NotificationPayload,
    ) -> PushOutcome;
}

/// Mobile native push delivery channel.
#[async_trait]
pub trait NativePushSender: Send + Sync {
    async fn send(&self, token: &NativePushToken, payload: &NotificationPayload) -> PushOutcome;
}
