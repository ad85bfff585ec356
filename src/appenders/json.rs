//! JSON core for structured logging
//!
//! Writes each entry as a single-line JSON object (JSONL). The default
//! inner core behind the Stackdriver decorator; its key layout matches
//! what the Cloud Logging agent parses from container stdout.

use crate::core::{Field, LogCore, LogEntry, LogLevel, LoggerError, Result};
use chrono::SecondsFormat;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::io::{self, Write};
use std::sync::Arc;

/// Keys written by the encoder itself
pub const ENCODER_KEYS: [&str; 6] = [
    "severity",
    "eventTime",
    "logger",
    "caller",
    "message",
    "stacktrace",
];

/// Prefix for fields whose key collides with an encoder key
pub const COLLISION_PREFIX: &str = "fields.";

/// Writer shared between a core and the cores derived from it
type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

pub struct JsonCore {
    min_level: LogLevel,
    writer: SharedWriter,
    context: Vec<Field>,
}

impl JsonCore {
    pub fn new<W: Write + Send + 'static>(writer: W, min_level: LogLevel) -> Self {
        Self {
            min_level,
            writer: Arc::new(Mutex::new(Box::new(writer))),
            context: Vec::new(),
        }
    }

    pub fn stdout(min_level: LogLevel) -> Self {
        Self::new(io::stdout(), min_level)
    }

    pub fn min_level(&self) -> LogLevel {
        self.min_level
    }

    /// Encode one entry without writing it.
    ///
    /// A field named like one of [`ENCODER_KEYS`] never replaces the
    /// entry's own value; it is written under `fields.<key>` instead.
    pub fn encode(&self, entry: &LogEntry, fields: &[Field]) -> Result<String> {
        let mut obj = Map::new();
        obj.insert("severity".into(), entry.level.severity().into());
        obj.insert(
            "eventTime".into(),
            entry
                .timestamp
                .to_rfc3339_opts(SecondsFormat::Millis, true)
                .into(),
        );
        if !entry.logger_name.is_empty() {
            obj.insert("logger".into(), entry.logger_name.clone().into());
        }
        if let Some(site) = &entry.call_site {
            obj.insert("caller".into(), site.short().into());
        }
        obj.insert("message".into(), entry.message.clone().into());
        if let Some(stack) = &entry.stack {
            obj.insert("stacktrace".into(), stack.clone().into());
        }

        for field in self.context.iter().chain(fields) {
            let key = if ENCODER_KEYS.contains(&field.key.as_str()) {
                format!("{}{}", COLLISION_PREFIX, field.key)
            } else {
                field.key.clone()
            };
            obj.insert(key, field.value.to_json_value());
        }

        Ok(serde_json::to_string(&Value::Object(obj))?)
    }
}

impl LogCore for JsonCore {
    fn enabled(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    fn with(&self, fields: &[Field]) -> Arc<dyn LogCore> {
        let mut context = self.context.clone();
        context.extend_from_slice(fields);
        Arc::new(Self {
            min_level: self.min_level,
            writer: Arc::clone(&self.writer),
            context,
        })
    }

    fn write(&self, entry: &LogEntry, fields: &[Field]) -> Result<()> {
        if !self.enabled(entry.level) {
            return Ok(());
        }
        let line = self.encode(entry, fields)?;
        let mut writer = self.writer.lock();
        writeln!(writer, "{}", line)
            .map_err(|e| LoggerError::io_operation("writing log entry", e.to_string(), e))
    }

    fn sync(&self) -> Result<()> {
        self.writer
            .lock()
            .flush()
            .map_err(|e| LoggerError::io_operation("flushing log output", e.to_string(), e))
    }

    fn name(&self) -> &str {
        "json"
    }
}
