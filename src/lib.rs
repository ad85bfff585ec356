//! # Rust Logger Stackdriver
//!
//! Structured logging in the Google Cloud Logging / Error Reporting shape,
//! with optional chat-webhook alerts for selected entries.
//!
//! ## Features
//!
//! - **Stackdriver Schema**: source location, service context, labels and
//!   trace fields emitted the way the Cloud Logging agent expects them
//! - **Reserved Fields**: `label#*`, `context`, `user`, `stack_trace` and
//!   `slack` markers recognized and rewritten
//! - **Scoped Loggers**: fields, labels and notification decisions
//!   inherited by derived loggers
//! - **Webhook Alerts**: delivered off the write path by a bounded worker
//!   pool with retry and backoff
//!
//! ```
//! use rust_logger_stackdriver::prelude::*;
//!
//! let logger = Logger::builder()
//!     .service("billing")
//!     .version("1.4.2")
//!     .writer(std::io::sink())
//!     .build()
//!     .unwrap();
//!
//! let request = logger.with(&[Field::user("alice"), Field::label("tenant", "acme")]);
//! request.error("charge failed", &[Field::slack(), Field::string("invoice", "in_42")]);
//! logger.sync().unwrap();
//! ```

pub mod appenders;
pub mod core;
pub mod macros;
pub mod notify;
pub mod stackdriver;

pub mod prelude {
    pub use crate::appenders::JsonCore;
    pub use crate::core::{
        CallSite, Field, FieldValue, LogCore, LogEntry, LogLevel, Logger, LoggerBuilder,
        LoggerConfig, LoggerError, NotifierMetrics, OverflowCallback, OverflowPolicy, Result,
    };
    pub use crate::notify::{RetryPolicy, WebhookError, WebhookMessage, WebhookTransport};
    pub use crate::stackdriver::{ContextInfo, HttpRequestEntry, ServiceContext};
}

pub use crate::appenders::JsonCore;
pub use crate::core::{
    CallSite, Field, FieldKind, FieldValue, Float, Integer, LogCore, LogEntry, LogLevel, Logger,
    LoggerBuilder, LoggerConfig, LoggerError, NotifierMetrics, OverflowCallback, OverflowPolicy,
    Result, SharedError, UNKNOWN,
};
pub use crate::notify::{
    Notifier, NotifierConfig, RetryPolicy, TracingTransport, WebhookError, WebhookMessage,
    WebhookTransport, DEFAULT_SHUTDOWN_TIMEOUT,
};
pub use crate::stackdriver::{
    ContextInfo, ErrorRenderer, HttpRequestEntry, NotificationDirective, ServiceContext,
    StackdriverCore, StackdriverSettings,
};
