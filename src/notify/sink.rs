// ABOUTME: Notification sink contract and delivery result types.
// ABOUTME: A sink performs exactly one delivery attempt per call.

use async_trait::async_trait;

use super::NotificationEvent;

/// Successful outcome of an emit call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ack {
    /// The sink accepted the event.
    Delivered,
    /// Notifications are disabled (no telemetry credentials); nothing was sent.
    Disabled,
}

/// Failed delivery. Logged by the emitter, never a pipeline failure.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("notification sink rejected event with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("notification transport error: {0}")]
    Transport(String),

    #[error("failed to encode notification: {0}")]
    Encode(String),
}

/// Destination for notification events.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Attempt a single delivery. Implementations must not retry.
    async fn deliver(&self, event: &NotificationEvent) -> Result<Ack, DeliveryError>;
}
