//! Logging macros for ergonomic log message formatting.
//!
//! Each macro formats its message like `format!`, records the call site
//! (file, line and module path), and accepts an optional list of fields
//! in brackets ahead of the message.
//!
//! # Examples
//!
//! ```
//! use rust_logger_stackdriver::prelude::*;
//! use rust_logger_stackdriver::{error, info};
//!
//! let logger = Logger::builder().writer(std::io::sink()).build().unwrap();
//!
//! info!(logger, "Server started");
//!
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//!
//! // Fields go in brackets, separated from the message by `;`
//! error!(logger, [Field::slack(), Field::user("alice")]; "Payment {} declined", 42);
//! ```

/// Expands to the [`CallSite`](crate::CallSite) of the macro invocation.
#[doc(hidden)]
#[macro_export]
macro_rules! __call_site {
    () => {
        $crate::CallSite::new(file!(), line!(), module_path!())
    };
}

/// Log at an explicit level.
///
/// # Examples
///
/// ```
/// # use rust_logger_stackdriver::prelude::*;
/// # let logger = Logger::builder().writer(std::io::sink()).build().unwrap();
/// use rust_logger_stackdriver::log;
/// log!(logger, LogLevel::Info, "Simple message");
/// log!(logger, LogLevel::Error, [Field::int("code", 500_i64)]; "Request failed");
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, [$($field:expr),* $(,)?]; $($arg:tt)+) => {
        $logger.log_at(
            $level,
            format!($($arg)+),
            &[$($field),*],
            Some($crate::__call_site!()),
        )
    };
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log_at($level, format!($($arg)+), &[], Some($crate::__call_site!()))
    };
}

/// Log a debug-level message.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Log an info-level message.
///
/// # Examples
///
/// ```
/// # use rust_logger_stackdriver::prelude::*;
/// # let logger = Logger::builder().writer(std::io::sink()).build().unwrap();
/// use rust_logger_stackdriver::info;
/// info!(logger, "Application started");
/// info!(logger, [Field::label("region", "eu")]; "Processing {} items", 100);
/// ```
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warn, $($arg)+)
    };
}

/// Log an error-level message.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

/// Log at CRITICAL without panicking.
#[macro_export]
macro_rules! dpanic {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::DPanic, $($arg)+)
    };
}
