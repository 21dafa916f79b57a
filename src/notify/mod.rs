// ABOUTME: Best-effort pipeline notifications to an external telemetry sink.
// ABOUTME: Exports the event model, the sink contract, and the emitter.

mod emitter;
mod event;
mod http;
mod sink;

pub use emitter::NotificationEmitter;
pub use event::{NotificationEvent, Severity, Tag, Tags};
pub use http::{DEFAULT_EVENTS_ENDPOINT, HttpSink, HttpSinkConfig};
pub use sink::{Ack, DeliveryError, NotificationSink};
