// ABOUTME: Notification emitter wrapping an optional sink.
// ABOUTME: Delivery failures are logged and returned, never escalated.

use std::sync::Arc;

use super::{Ack, DeliveryError, NotificationEvent, NotificationSink};

/// Emits events to a sink, or does nothing when disabled.
#[derive(Clone, Default)]
pub struct NotificationEmitter {
    sink: Option<Arc<dyn NotificationSink>>,
}

impl std::fmt::Debug for NotificationEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationEmitter")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

impl NotificationEmitter {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink: Some(sink) }
    }

    /// An emitter that acknowledges every event without sending it.
    pub fn disabled() -> Self {
        Self { sink: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    /// Make one delivery attempt.
    ///
    /// The error is returned for reporting only; callers must not treat it
    /// as a pipeline failure.
    pub async fn emit(&self, event: &NotificationEvent) -> Result<Ack, DeliveryError> {
        let Some(sink) = &self.sink else {
            tracing::info!(title = %event.title, "notifications disabled, event not sent");
            return Ok(Ack::Disabled);
        };

        match sink.deliver(event).await {
            Ok(ack) => {
                tracing::debug!(title = %event.title, "notification delivered");
                Ok(ack)
            }
            Err(e) => {
                tracing::warn!(title = %event.title, "notification delivery failed: {}", e);
                Err(e)
            }
        }
    }
}
