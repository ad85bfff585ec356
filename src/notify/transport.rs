//! Webhook transport seam
//!
//! The HTTP client is supplied by the embedding application. The crate
//! ships [`TracingTransport`], which records the payload on the
//! diagnostic channel instead of sending it.

use super::payload::WebhookMessage;
use std::sync::Arc;
use std::time::Duration;

/// Failure reported by a transport for one delivery attempt
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WebhookError {
    #[error("webhook rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("webhook rejected payload with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("webhook transport error: {0}")]
    Transport(String),

    #[error("webhook delivery timed out after {0:?}")]
    Timeout(Duration),
}

impl WebhookError {
    pub fn rate_limited(retry_after: Duration) -> Self {
        Self::RateLimited { retry_after }
    }

    pub fn rejected(status: u16, body: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            body: body.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Server-mandated wait, if any
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }

    /// Whether the failure itself says retrying can help.
    ///
    /// `None` means it does not say; the caller backs off and retries.
    pub fn retryable(&self) -> Option<bool> {
        match self {
            Self::RateLimited { .. } => Some(true),
            Self::Rejected { status, .. } => Some(*status >= 500 || *status == 408),
            Self::Transport(_) | Self::Timeout(_) => None,
        }
    }
}

/// Posts one message to one webhook URL.
///
/// Called from notification worker threads; `timeout` is what remains of
/// the delivery deadline for this attempt.
pub trait WebhookTransport: Send + Sync {
    fn post(
        &self,
        url: &str,
        message: &WebhookMessage,
        timeout: Duration,
    ) -> Result<(), WebhookError>;

    fn name(&self) -> &str;
}

impl<T: WebhookTransport + ?Sized> WebhookTransport for Arc<T> {
    fn post(
        &self,
        url: &str,
        message: &WebhookMessage,
        timeout: Duration,
    ) -> Result<(), WebhookError> {
        (**self).post(url, message, timeout)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Logs each payload at info level instead of sending it
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTransport;

impl WebhookTransport for TracingTransport {
    fn post(
        &self,
        url: &str,
        message: &WebhookMessage,
        _timeout: Duration,
    ) -> Result<(), WebhookError> {
        let payload = serde_json::to_string(message)
            .map_err(|e| WebhookError::transport(e.to_string()))?;
        tracing::info!(url = %url, payload = %payload, "would post webhook notification");
        Ok(())
    }

    fn name(&self) -> &str {
        "tracing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_hints() {
        let limited = WebhookError::rate_limited(Duration::from_secs(2));
        assert_eq!(limited.retry_after(), Some(Duration::from_secs(2)));
        assert_eq!(limited.retryable(), Some(true));

        assert_eq!(WebhookError::rejected(400, "invalid_blocks").retryable(), Some(false));
        assert_eq!(WebhookError::rejected(404, "no_service").retryable(), Some(false));
        assert_eq!(WebhookError::rejected(503, "").retryable(), Some(true));
        assert_eq!(WebhookError::transport("connection reset").retryable(), None);
        assert_eq!(WebhookError::Timeout(Duration::from_secs(1)).retry_after(), None);
    }

    #[test]
    fn test_tracing_transport_accepts() {
        let message = WebhookMessage {
            attachments: Vec::new(),
        };
        let transport = Arc::new(TracingTransport);
        assert!(transport
            .post("https://hooks.example.com", &message, Duration::from_secs(1))
            .is_ok());
        assert_eq!(transport.name(), "tracing");
    }
}
