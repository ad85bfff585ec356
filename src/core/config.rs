//! Declarative logger configuration
//!
//! Every field has a default, so a config file only needs to name what it
//! changes:
//!
//! ```
//! use rust_logger_stackdriver::LoggerConfig;
//!
//! let config: LoggerConfig = serde_json::from_str(
//!     r#"{ "service": "billing", "webhook_url": "https://hooks.example.com/T0" }"#,
//! ).unwrap();
//! assert_eq!(config.version, "unknown");
//! ```

use super::error::{LoggerError, Result};
use super::log_level::LogLevel;
use super::overflow_policy::OverflowPolicy;
use serde::{Deserialize, Serialize};

/// Placeholder used for unset service name and version
pub const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Minimum level written by the inner core
    pub level: LogLevel,

    /// Default webhook destination; empty disables default notifications
    pub webhook_url: String,

    /// Cloud project used to qualify trace ids; empty leaves them bare
    pub project_id: String,

    pub service: String,
    pub version: String,

    /// Worker threads delivering notifications
    pub notify_workers: usize,

    /// Notifications that may wait for a worker before overflow applies
    pub notify_queue_capacity: usize,

    pub overflow_policy: OverflowPolicy,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Debug,
            webhook_url: String::new(),
            project_id: String::new(),
            service: UNKNOWN.to_string(),
            version: UNKNOWN.to_string(),
            notify_workers: 4,
            notify_queue_capacity: 1024,
            overflow_policy: OverflowPolicy::AlertAndDrop,
        }
    }
}

impl LoggerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.notify_workers == 0 {
            return Err(LoggerError::config(
                "LoggerConfig",
                "notify_workers must be at least 1",
            ));
        }
        if self.notify_queue_capacity == 0 {
            return Err(LoggerError::config(
                "LoggerConfig",
                "notify_queue_capacity must be at least 1",
            ));
        }
        Ok(())
    }
}
