//! Webhook notification side channel

pub mod dispatcher;
pub mod payload;
pub mod render;
pub mod retry;
pub mod transport;

pub use dispatcher::{InFlight, Notifier, NotifierConfig, DEFAULT_SHUTDOWN_TIMEOUT};
pub use payload::{Attachment, Block, TextObject, WebhookMessage};
pub use render::{render_field, render_fields, RenderedField, RenderedFields};
pub use retry::{DeliveryError, RetryPolicy};
pub use transport::{TracingTransport, WebhookError, WebhookTransport};
