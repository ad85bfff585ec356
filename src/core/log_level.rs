//! Log level definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(Default)]
pub enum LogLevel {
    Debug = 0,
    #[default]
    Info = 1,
    Warn = 2,
    Error = 3,
    /// Logged as critical; the logger never panics at this level
    DPanic = 4,
    Panic = 5,
    Fatal = 6,
}

impl LogLevel {
    pub const ALL: [LogLevel; 7] = [
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
        LogLevel::DPanic,
        LogLevel::Panic,
        LogLevel::Fatal,
    ];

    pub fn to_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::DPanic => "DPANIC",
            LogLevel::Panic => "PANIC",
            LogLevel::Fatal => "FATAL",
        }
    }

    /// Cloud Logging `severity` value for this level
    pub fn severity(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::DPanic => "CRITICAL",
            LogLevel::Panic => "ALERT",
            LogLevel::Fatal => "EMERGENCY",
        }
    }

    /// Attachment colour used for webhook alerts.
    ///
    /// Levels without a colour never produce a notification.
    pub fn alert_color(&self) -> Option<&'static str> {
        match self {
            LogLevel::Debug => Some("#2196F3"),
            LogLevel::Info => Some("#9E9E9E"),
            LogLevel::Warn => Some("#FF9800"),
            LogLevel::Error | LogLevel::Panic | LogLevel::Fatal => Some("#D50000"),
            LogLevel::DPanic => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            "DPANIC" | "CRITICAL" => Ok(LogLevel::DPanic),
            "PANIC" | "ALERT" => Ok(LogLevel::Panic),
            "FATAL" | "EMERGENCY" => Ok(LogLevel::Fatal),
            _ => Err(format!("Invalid log level: '{}'", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_mapping() {
        assert_eq!(LogLevel::Debug.severity(), "DEBUG");
        assert_eq!(LogLevel::Info.severity(), "INFO");
        assert_eq!(LogLevel::Warn.severity(), "WARNING");
        assert_eq!(LogLevel::Error.severity(), "ERROR");
        assert_eq!(LogLevel::DPanic.severity(), "CRITICAL");
        assert_eq!(LogLevel::Panic.severity(), "ALERT");
        assert_eq!(LogLevel::Fatal.severity(), "EMERGENCY");
    }

    #[test]
    fn test_alert_colors() {
        assert_eq!(LogLevel::Warn.alert_color(), Some("#FF9800"));
        assert_eq!(LogLevel::Fatal.alert_color(), Some("#D50000"));
        assert_eq!(LogLevel::DPanic.alert_color(), None);
    }

    #[test]
    fn test_parse_accepts_severity_names() {
        assert_eq!("warning".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert_eq!("EMERGENCY".parse::<LogLevel>(), Ok(LogLevel::Fatal));
        assert!("verbose".parse::<LogLevel>().is_err());
    }
}
