//! Core trait for log output destinations

use super::{error::Result, field::Field, log_entry::LogEntry, log_level::LogLevel};
use std::sync::Arc;

/// The capability a logger writes through.
///
/// Cores are shared between threads and between derived loggers, so every
/// method takes `&self`; implementations synchronize internally.
pub trait LogCore: Send + Sync {
    /// Whether an entry at `level` would be written
    fn enabled(&self, level: LogLevel) -> bool;

    /// Derive a core that adds `fields` to every subsequent write.
    ///
    /// `self` is left unchanged.
    fn with(&self, fields: &[Field]) -> Arc<dyn LogCore>;

    /// Write one entry with its call-specific fields
    fn write(&self, entry: &LogEntry, fields: &[Field]) -> Result<()>;

    /// Flush any buffered or outstanding work
    fn sync(&self) -> Result<()>;

    fn name(&self) -> &str;
}
