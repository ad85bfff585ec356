//! Core logger types and traits

pub mod config;
pub mod error;
pub mod field;
pub mod log_core;
pub mod log_entry;
pub mod log_level;
pub mod logger;
pub mod metrics;
pub mod overflow_policy;

pub use config::{LoggerConfig, UNKNOWN};
pub use error::{LoggerError, Result};
pub use field::{Field, FieldKind, FieldValue, Float, Integer, SharedError};
pub use log_core::LogCore;
pub use log_entry::{CallSite, LogEntry};
pub use log_level::LogLevel;
pub use logger::{Logger, LoggerBuilder};
pub use metrics::NotifierMetrics;
pub use overflow_policy::{OverflowCallback, OverflowPolicy};
