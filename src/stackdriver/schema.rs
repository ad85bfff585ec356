//! Output schema and reserved field markers
//!
//! See <https://cloud.google.com/error-reporting/docs/formatting-error-messages>
//! for the layout these types produce.

use crate::core::config::UNKNOWN;
use crate::core::field::Field;
use crate::core::log_entry::CallSite;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Key prefix marking a label field; the prefix is stripped on output
pub const LABEL_PREFIX: &str = "label#";
/// Key of the trace/request context marker
pub const CONTEXT_INFO_KEY: &str = "context";
/// Key of the notification directive marker
pub const SLACK_KEY: &str = "slack";
/// Key of the attribution user marker
pub const USER_KEY: &str = "user";
/// Key of the stack trace field
pub const STACK_TRACE_KEY: &str = "stack_trace";
/// Key whose rendered form is pinned to the notification header
pub const ERROR_KEY: &str = "error";

pub const SOURCE_LOCATION_KEY: &str = "logging.googleapis.com/sourceLocation";
pub const LABELS_KEY: &str = "logging.googleapis.com/labels";
pub const TRACE_SAMPLED_KEY: &str = "logging.googleapis.com/trace_sampled";
pub const TRACE_KEY: &str = "logging.googleapis.com/trace";
pub const SPAN_ID_KEY: &str = "logging.googleapis.com/spanId";
pub const SERVICE_CONTEXT_KEY: &str = "serviceContext";
pub const ERROR_CONTEXT_KEY: &str = "context";
pub const GRPC_METHOD_KEY: &str = "grpc_method";
pub const REQUEST_ID_KEY: &str = "request_id";
pub const HTTP_REQUEST_KEY: &str = "httpRequest";
pub const METADATA_KEY: &str = "metadata";

/// Trace and request identity carried by a `context` field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextInfo {
    #[serde(rename = "isSampled")]
    pub is_sampled: bool,
    #[serde(rename = "traceID")]
    pub trace_id: String,
    #[serde(rename = "spanID")]
    pub span_id: String,
    #[serde(rename = "grpcMethod")]
    pub grpc_method: String,
    #[serde(rename = "requestID")]
    pub request_id: String,
}

impl ContextInfo {
    /// Parse an `x-cloud-trace-context` header (`TRACE_ID/SPAN_ID;o=1`).
    ///
    /// Returns `None` when the header has no `/` separator.
    pub fn from_cloud_trace_header(header: &str) -> Option<Self> {
        let (trace_id, rest) = header.split_once('/')?;
        let (span_id, options) = match rest.split_once(';') {
            Some((span, options)) => (span, options),
            None => (rest, ""),
        };
        Some(Self {
            is_sampled: options.starts_with("o=1"),
            trace_id: trace_id.to_string(),
            span_id: span_id.to_string(),
            ..Self::default()
        })
    }

    #[must_use]
    pub fn with_grpc_method(mut self, method: impl Into<String>) -> Self {
        self.grpc_method = method.into();
        self
    }

    #[must_use]
    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = id.into();
        self
    }

    /// Trace value as Cloud Logging expects it for `project`
    pub fn trace_resource(&self, project: &str) -> String {
        if project.is_empty() {
            self.trace_id.clone()
        } else {
            format!("projects/{}/traces/{}", project, self.trace_id)
        }
    }
}

/// Service identity attached to every entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceContext {
    pub service: String,
    pub version: String,
}

impl ServiceContext {
    pub fn new(service: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            version: version.into(),
        }
    }
}

impl Default for ServiceContext {
    fn default() -> Self {
        Self::new(UNKNOWN, UNKNOWN)
    }
}

/// Call-site view under `logging.googleapis.com/sourceLocation`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceLocation {
    pub file_path: String,
    pub line_number: u32,
    pub function_name: String,
}

/// Call-site view inside the error-reporting `context` object
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportLocation {
    pub file: String,
    pub line: u32,
    pub function: String,
}

/// Both views are built from one computed location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub file: String,
    pub line: u32,
    pub function: String,
}

impl Location {
    /// Undefined call sites produce an empty location
    pub fn from_call_site(call_site: Option<&CallSite>) -> Self {
        match call_site {
            Some(site) => Self {
                file: site.trimmed_path().to_string(),
                line: site.line,
                function: site.function.clone(),
            },
            None => Self::default(),
        }
    }

    pub fn source_location(&self) -> SourceLocation {
        SourceLocation {
            file_path: self.file.clone(),
            line_number: self.line,
            function_name: self.function.clone(),
        }
    }

    pub fn report_location(&self) -> ReportLocation {
        ReportLocation {
            file: self.file.clone(),
            line: self.line,
            function: self.function.clone(),
        }
    }
}

/// Error Reporting context: who was affected and where it was reported
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReportingContext {
    pub report_location: ReportLocation,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub user: String,
}

/// HTTP request associated with a log entry.
///
/// Serialized in the Cloud Logging `HttpRequest` shape; see
/// <https://cloud.google.com/logging/docs/reference/v2/rest/v2/LogEntry#HttpRequest>.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpRequestEntry {
    pub request_method: String,
    pub request_url: String,
    pub request_size: i64,
    pub status: u16,
    pub response_size: i64,
    pub user_agent: String,
    pub remote_ip: String,
    pub referer: String,
    pub latency: Duration,
}

impl HttpRequestEntry {
    pub fn to_json(&self) -> serde_json::Value {
        let mut obj = serde_json::Map::new();
        let method = if self.request_method.is_empty() {
            "POST"
        } else {
            self.request_method.as_str()
        };
        obj.insert("requestMethod".into(), method.into());
        insert_non_empty(&mut obj, "requestUrl", &self.request_url);
        obj.insert("requestSize".into(), self.request_size.to_string().into());
        if self.status != 0 {
            obj.insert("status".into(), self.status.into());
        }
        obj.insert("responseSize".into(), self.response_size.to_string().into());
        insert_non_empty(&mut obj, "userAgent", &self.user_agent);
        insert_non_empty(&mut obj, "remoteIp", &self.remote_ip);
        insert_non_empty(&mut obj, "referer", &self.referer);
        if !self.latency.is_zero() {
            obj.insert(
                "latency".into(),
                format!("{:.6}s", self.latency.as_secs_f64()).into(),
            );
        }
        serde_json::Value::Object(obj)
    }
}

fn insert_non_empty(obj: &mut serde_json::Map<String, serde_json::Value>, key: &str, val: &str) {
    if !val.is_empty() {
        obj.insert(key.to_string(), val.into());
    }
}

/// Constructors for the reserved markers and schema helpers
impl Field {
    /// Output label; collected into `logging.googleapis.com/labels`
    pub fn label(key: impl AsRef<str>, value: impl Into<String>) -> Self {
        Field::string(format!("{}{}", LABEL_PREFIX, key.as_ref()), value)
    }

    /// Notify the configured default destination
    pub fn slack() -> Self {
        Field::bool(SLACK_KEY, true)
    }

    /// Notify an explicit destination instead of the default one
    pub fn slack_to(url: impl Into<String>) -> Self {
        Field::string(SLACK_KEY, url)
    }

    /// Suppress notifications, including ones enabled by a parent logger
    pub fn no_slack() -> Self {
        Field::bool(SLACK_KEY, false)
    }

    pub fn user(user: impl Into<String>) -> Self {
        Field::string(USER_KEY, user)
    }

    pub fn stack_trace(stack: impl Into<String>) -> Self {
        Field::string(STACK_TRACE_KEY, stack)
    }

    pub fn context(info: &ContextInfo) -> Self {
        Field::reflect(CONTEXT_INFO_KEY, info)
    }

    pub fn http_request(request: &HttpRequestEntry) -> Self {
        Field::object(HTTP_REQUEST_KEY, &request.to_json())
    }

    /// Request metadata (e.g. gRPC incoming metadata) as key → values
    pub fn metadata(md: &BTreeMap<String, Vec<String>>) -> Self {
        Field::object(METADATA_KEY, md)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::field::FieldValue;
    use serde_json::json;

    #[test]
    fn test_cloud_trace_header() {
        let info = ContextInfo::from_cloud_trace_header("105445aa7843bc8bf206b120001000/123;o=1")
            .unwrap();
        assert_eq!(info.trace_id, "105445aa7843bc8bf206b120001000");
        assert_eq!(info.span_id, "123");
        assert!(info.is_sampled);

        let info = ContextInfo::from_cloud_trace_header("abc/456").unwrap();
        assert_eq!(info.span_id, "456");
        assert!(!info.is_sampled);

        assert!(ContextInfo::from_cloud_trace_header("no-separator").is_none());
    }

    #[test]
    fn test_context_info_wire_names() {
        let info = ContextInfo {
            is_sampled: true,
            trace_id: "t".into(),
            span_id: "s".into(),
            grpc_method: "/svc/Method".into(),
            request_id: "r".into(),
        };
        assert_eq!(
            serde_json::to_value(&info).unwrap(),
            json!({
                "isSampled": true,
                "traceID": "t",
                "spanID": "s",
                "grpcMethod": "/svc/Method",
                "requestID": "r"
            })
        );
    }

    #[test]
    fn test_trace_resource() {
        let info = ContextInfo {
            trace_id: "abc".into(),
            ..ContextInfo::default()
        };
        assert_eq!(info.trace_resource(""), "abc");
        assert_eq!(info.trace_resource("my-proj"), "projects/my-proj/traces/abc");
    }

    #[test]
    fn test_location_views() {
        let site = CallSite::new("/src/app/main.rs", 12, "app::main");
        let loc = Location::from_call_site(Some(&site));

        assert_eq!(
            serde_json::to_value(loc.source_location()).unwrap(),
            json!({"filePath": "app/main.rs", "lineNumber": 12, "functionName": "app::main"})
        );
        assert_eq!(
            serde_json::to_value(loc.report_location()).unwrap(),
            json!({"file": "app/main.rs", "line": 12, "function": "app::main"})
        );
        assert_eq!(Location::from_call_site(None), Location::default());
    }

    #[test]
    fn test_error_reporting_context_omits_empty_user() {
        let ctx = ErrorReportingContext::default();
        let value = serde_json::to_value(&ctx).unwrap();
        assert!(value.get("user").is_none());
        assert!(value.get("reportLocation").is_some());
    }

    #[test]
    fn test_http_request_shape() {
        let req = HttpRequestEntry {
            request_method: "GET".into(),
            request_url: "http://example.com".into(),
            request_size: 1024,
            status: 200,
            user_agent: "curl".into(),
            latency: Duration::from_secs(1),
            ..HttpRequestEntry::default()
        };
        assert_eq!(
            req.to_json(),
            json!({
                "requestMethod": "GET",
                "requestUrl": "http://example.com",
                "requestSize": "1024",
                "status": 200,
                "responseSize": "0",
                "userAgent": "curl",
                "latency": "1.000000s"
            })
        );

        let default_method = HttpRequestEntry::default().to_json();
        assert_eq!(default_method["requestMethod"], "POST");
    }

    #[test]
    fn test_marker_constructors() {
        assert_eq!(Field::label("team", "core").key, "label#team");
        assert_eq!(Field::slack().value, FieldValue::Bool(true));
        assert_eq!(Field::no_slack().value, FieldValue::Bool(false));
        assert_eq!(
            Field::slack_to("https://hook").value,
            FieldValue::String("https://hook".into())
        );
        assert!(matches!(
            Field::context(&ContextInfo::default()).value,
            FieldValue::Reflected(_)
        ));
    }
}
