//! Logger façade
//!
//! A [`Logger`] is a cheap handle over a shared [`LogCore`]: it filters by
//! level, captures the call site, and carries the logger name. Cloning and
//! deriving loggers never copies the core.
//!
//! The level methods (`logger.info(..)` and friends) capture file and line
//! only; `functionName` in `sourceLocation` and `reportLocation` stays
//! empty for them. The [`info!`](crate::info)-style macros also record the
//! enclosing module path, and [`Logger::log_at`] accepts any [`CallSite`].

use super::{
    config::LoggerConfig,
    error::Result,
    field::Field,
    log_core::LogCore,
    log_entry::{CallSite, LogEntry},
    log_level::LogLevel,
    overflow_policy::{OverflowCallback, OverflowPolicy},
};
use crate::appenders::JsonCore;
use crate::notify::{Notifier, NotifierConfig, RetryPolicy, TracingTransport, WebhookTransport};
use crate::stackdriver::{ErrorRenderer, ServiceContext, StackdriverCore, StackdriverSettings};
use std::error::Error as StdError;
use std::io::Write;
use std::sync::Arc;

#[derive(Clone)]
pub struct Logger {
    core: Arc<dyn LogCore>,
    name: String,
}

impl Logger {
    /// Wrap an existing core. The logger starts unnamed.
    #[must_use]
    pub fn new(core: Arc<dyn LogCore>) -> Self {
        Self {
            core,
            name: String::new(),
        }
    }

    pub fn core(&self) -> &Arc<dyn LogCore> {
        &self.core
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Child logger whose name is joined to this one with `.`
    #[must_use]
    pub fn named(&self, name: &str) -> Logger {
        let name = match (self.name.is_empty(), name.is_empty()) {
            (_, true) => self.name.clone(),
            (true, false) => name.to_string(),
            (false, false) => format!("{}.{}", self.name, name),
        };
        Logger {
            core: Arc::clone(&self.core),
            name,
        }
    }

    /// Child logger that adds `fields` to every entry
    #[must_use]
    pub fn with(&self, fields: &[Field]) -> Logger {
        if fields.is_empty() {
            return self.clone();
        }
        Logger {
            core: self.core.with(fields),
            name: self.name.clone(),
        }
    }

    pub fn enabled(&self, level: LogLevel) -> bool {
        self.core.enabled(level)
    }

    /// Write one entry and report inner-core failures to the caller
    pub fn try_log(
        &self,
        level: LogLevel,
        message: impl Into<String>,
        fields: &[Field],
        call_site: Option<CallSite>,
    ) -> Result<()> {
        if !self.core.enabled(level) {
            return Ok(());
        }
        let mut entry = LogEntry::new(level, message).with_logger_name(self.name.clone());
        if let Some(site) = call_site {
            entry = entry.with_call_site(site);
        }
        self.core.write(&entry, fields)
    }

    /// Like [`try_log`](Self::try_log); write failures go to the
    /// diagnostic channel instead.
    pub fn log_at(
        &self,
        level: LogLevel,
        message: impl Into<String>,
        fields: &[Field],
        call_site: Option<CallSite>,
    ) {
        if let Err(e) = self.try_log(level, message, fields, call_site) {
            tracing::error!(error = %e, core = self.core.name(), "failed to write log entry");
        }
    }

    #[track_caller]
    pub fn log(&self, level: LogLevel, message: impl Into<String>, fields: &[Field]) {
        self.log_at(level, message, fields, Some(CallSite::caller()));
    }

    #[track_caller]
    pub fn debug(&self, message: impl Into<String>, fields: &[Field]) {
        self.log(LogLevel::Debug, message, fields);
    }

    #[track_caller]
    pub fn info(&self, message: impl Into<String>, fields: &[Field]) {
        self.log(LogLevel::Info, message, fields);
    }

    #[track_caller]
    pub fn warn(&self, message: impl Into<String>, fields: &[Field]) {
        self.log(LogLevel::Warn, message, fields);
    }

    #[track_caller]
    pub fn error(&self, message: impl Into<String>, fields: &[Field]) {
        self.log(LogLevel::Error, message, fields);
    }

    /// Logged at CRITICAL. Does not panic.
    #[track_caller]
    pub fn dpanic(&self, message: impl Into<String>, fields: &[Field]) {
        self.log(LogLevel::DPanic, message, fields);
    }

    /// Log at ALERT, wait for notifications, then panic with `message`
    #[track_caller]
    pub fn panic(&self, message: impl Into<String>, fields: &[Field]) -> ! {
        let message = message.into();
        self.log(LogLevel::Panic, message.clone(), fields);
        if let Err(e) = self.sync() {
            tracing::error!(error = %e, "failed to sync before panic");
        }
        panic!("{}", message);
    }

    /// Log at EMERGENCY, wait for notifications, then exit with status 1
    #[track_caller]
    pub fn fatal(&self, message: impl Into<String>, fields: &[Field]) -> ! {
        self.log(LogLevel::Fatal, message, fields);
        if let Err(e) = self.sync() {
            tracing::error!(error = %e, "failed to sync before exit");
        }
        std::process::exit(1);
    }

    /// Block until queued notifications finish, then flush the inner core
    pub fn sync(&self) -> Result<()> {
        self.core.sync()
    }

    /// Create a builder for Logger
    ///
    /// # Example
    /// ```
    /// use rust_logger_stackdriver::prelude::*;
    ///
    /// let logger = Logger::builder()
    ///     .service("billing")
    ///     .version("1.4.2")
    ///     .min_level(LogLevel::Info)
    ///     .writer(std::io::sink())
    ///     .build()
    ///     .unwrap();
    /// logger.info("ready", &[Field::label("team", "payments")]);
    /// ```
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }
}

/// Builder wiring a [`JsonCore`], the Stackdriver decorator, and the
/// notification worker pool together.
///
/// # Example
/// ```
/// use rust_logger_stackdriver::prelude::*;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let logger = Logger::builder()
///     .service("billing")
///     .webhook_url("https://hooks.example.com/T000/B000")
///     .notify_workers(2)
///     .overflow_policy(OverflowPolicy::BlockWithTimeout(Duration::from_millis(50)))
///     .on_overflow(Arc::new(|count| {
///         eprintln!("ALERT: {} notifications dropped", count);
///     }))
///     .writer(std::io::sink())
///     .build()
///     .unwrap();
/// ```
pub struct LoggerBuilder {
    config: LoggerConfig,
    writer: Option<Box<dyn Write + Send>>,
    inner: Option<Arc<dyn LogCore>>,
    transport: Option<Arc<dyn WebhookTransport>>,
    error_renderer: Option<ErrorRenderer>,
    retry_policy: RetryPolicy,
    on_overflow: Option<OverflowCallback>,
}

impl LoggerBuilder {
    pub fn new() -> Self {
        Self {
            config: LoggerConfig::default(),
            writer: None,
            inner: None,
            transport: None,
            error_renderer: None,
            retry_policy: RetryPolicy::default(),
            on_overflow: None,
        }
    }

    /// Replace every data option with `config`
    #[must_use = "builder methods return a new value"]
    pub fn config(mut self, config: LoggerConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn min_level(mut self, level: LogLevel) -> Self {
        self.config.level = level;
        self
    }

    /// Default notification destination
    #[must_use = "builder methods return a new value"]
    pub fn webhook_url(mut self, url: impl Into<String>) -> Self {
        self.config.webhook_url = url.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn project_id(mut self, project_id: impl Into<String>) -> Self {
        self.config.project_id = project_id.into();
        self
    }

    /// Service name; also becomes the logger name
    #[must_use = "builder methods return a new value"]
    pub fn service(mut self, service: impl Into<String>) -> Self {
        self.config.service = service.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.config.version = version.into();
        self
    }

    /// Renderer turning error fields into structured objects
    #[must_use = "builder methods return a new value"]
    pub fn error_renderer<F>(mut self, render: F) -> Self
    where
        F: Fn(&(dyn StdError + Send + Sync + 'static)) -> Option<serde_json::Value>
            + Send
            + Sync
            + 'static,
    {
        self.error_renderer = Some(Arc::new(render));
        self
    }

    /// Output for the built-in JSON core. Defaults to stdout.
    #[must_use = "builder methods return a new value"]
    pub fn writer<W: Write + Send + 'static>(mut self, writer: W) -> Self {
        self.writer = Some(Box::new(writer));
        self
    }

    /// Use `core` instead of the built-in JSON core
    #[must_use = "builder methods return a new value"]
    pub fn inner_core(mut self, core: Arc<dyn LogCore>) -> Self {
        self.inner = Some(core);
        self
    }

    /// Defaults to [`TracingTransport`]
    #[must_use = "builder methods return a new value"]
    pub fn webhook_transport<T: WebhookTransport + 'static>(mut self, transport: T) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn notify_workers(mut self, workers: usize) -> Self {
        self.config.notify_workers = workers;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn notify_queue_capacity(mut self, capacity: usize) -> Self {
        self.config.notify_queue_capacity = capacity;
        self
    }

    /// What happens when the notification queue is full.
    /// Default is `AlertAndDrop`.
    #[must_use = "builder methods return a new value"]
    pub fn overflow_policy(mut self, policy: OverflowPolicy) -> Self {
        self.config.overflow_policy = policy;
        self
    }

    /// Invoked with the running drop count when notifications are dropped
    #[must_use = "builder methods return a new value"]
    pub fn on_overflow(mut self, callback: OverflowCallback) -> Self {
        self.on_overflow = Some(callback);
        self
    }

    /// Validate the configuration and start the notification workers
    pub fn build(self) -> Result<Logger> {
        let config = self.config;
        config.validate()?;

        let inner: Arc<dyn LogCore> = match (self.inner, self.writer) {
            (Some(core), _) => core,
            (None, Some(writer)) => Arc::new(JsonCore::new(writer, config.level)),
            (None, None) => Arc::new(JsonCore::stdout(config.level)),
        };
        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(TracingTransport));

        if config.overflow_policy.may_block() {
            tracing::warn!(
                policy = %config.overflow_policy,
                "notification overflow policy can stall log writes while the queue is full"
            );
        }

        let service = ServiceContext::new(config.service.clone(), config.version.clone());
        let notifier = Notifier::new(
            NotifierConfig {
                workers: config.notify_workers,
                queue_capacity: config.notify_queue_capacity,
                overflow_policy: config.overflow_policy.clone(),
                on_overflow: self.on_overflow,
                retry: self.retry_policy,
                ..NotifierConfig::default()
            },
            service.clone(),
            transport,
        )?;

        let mut settings = StackdriverSettings::new(service)
            .project_id(config.project_id)
            .webhook_url(config.webhook_url);
        settings.error_renderer = self.error_renderer;

        let core = StackdriverCore::new(inner, Arc::new(notifier), settings);
        Ok(Logger::new(Arc::new(core)).named(&config.service))
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::LoggerError;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorded(Mutex<Vec<LogEntry>>);

    struct RecordingCore {
        min_level: LogLevel,
        seen: Arc<Recorded>,
    }

    impl LogCore for RecordingCore {
        fn enabled(&self, level: LogLevel) -> bool {
            level >= self.min_level
        }

        fn with(&self, _: &[Field]) -> Arc<dyn LogCore> {
            Arc::new(RecordingCore {
                min_level: self.min_level,
                seen: Arc::clone(&self.seen),
            })
        }

        fn write(&self, entry: &LogEntry, _: &[Field]) -> Result<()> {
            self.seen.0.lock().push(entry.clone());
            Ok(())
        }

        fn sync(&self) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    fn recording(min_level: LogLevel) -> (Logger, Arc<Recorded>) {
        let seen = Arc::new(Recorded::default());
        let core = RecordingCore {
            min_level,
            seen: Arc::clone(&seen),
        };
        (Logger::new(Arc::new(core)), seen)
    }

    #[test]
    fn test_level_filter_and_call_site() {
        let (logger, seen) = recording(LogLevel::Info);
        logger.debug("hidden", &[]);
        logger.info("shown", &[]);
        let line = line!() - 1;

        let entries = seen.0.lock();
        assert_eq!(entries.len(), 1);
        let site = entries[0].call_site.as_ref().unwrap();
        assert!(site.file.ends_with("logger.rs"));
        assert_eq!(site.line, line);
    }

    #[test]
    fn test_function_name_only_from_explicit_call_site() {
        let (logger, seen) = recording(LogLevel::Debug);
        logger.info("method", &[]);
        crate::info!(logger, "macro");
        logger.log_at(
            LogLevel::Info,
            "explicit",
            &[],
            Some(CallSite::new("src/jobs.rs", 7, "jobs::run")),
        );

        let entries = seen.0.lock();
        let functions: Vec<_> = entries
            .iter()
            .map(|e| e.call_site.as_ref().unwrap().function.clone())
            .collect();
        assert_eq!(functions, vec!["", module_path!(), "jobs::run"]);
    }

    #[test]
    fn test_named_joins() {
        let (logger, seen) = recording(LogLevel::Debug);
        let child = logger.named("api").named("v1");
        assert_eq!(child.name(), "api.v1");
        assert_eq!(logger.named("").name(), "");

        child.warn("slow", &[]);
        assert_eq!(seen.0.lock()[0].logger_name, "api.v1");
    }

    #[test]
    #[should_panic(expected = "unrecoverable")]
    fn test_panic_after_logging() {
        let (logger, _) = recording(LogLevel::Debug);
        logger.panic("unrecoverable", &[]);
    }

    #[test]
    fn test_builder_names_logger_by_service() {
        let logger = Logger::builder()
            .service("billing")
            .writer(std::io::sink())
            .build()
            .unwrap();
        assert_eq!(logger.name(), "billing");
        assert!(logger.enabled(LogLevel::Debug));
    }

    #[test]
    fn test_builder_rejects_invalid_config() {
        let result = Logger::builder()
            .notify_queue_capacity(0)
            .writer(std::io::sink())
            .build();
        assert!(matches!(
            result,
            Err(LoggerError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_builder_accepts_blocking_overflow_policy() {
        let logger = Logger::builder()
            .service("ingest")
            .webhook_url("https://hook")
            .overflow_policy(OverflowPolicy::BlockWithTimeout(std::time::Duration::from_millis(5)))
            .webhook_transport(crate::notify::TracingTransport)
            .writer(std::io::sink())
            .build()
            .unwrap();
        logger.error("queued", &[Field::slack()]);
        logger.sync().unwrap();
    }

    #[test]
    fn test_builder_from_config() {
        let config = LoggerConfig {
            level: LogLevel::Warn,
            service: "jobs".into(),
            ..LoggerConfig::default()
        };
        let logger = Logger::builder()
            .config(config)
            .writer(std::io::sink())
            .build()
            .unwrap();
        assert!(!logger.enabled(LogLevel::Info));
        assert!(logger.enabled(LogLevel::Error));
        logger.sync().unwrap();
    }
}
