//! Basic usage of the Stackdriver logger
//!
//! Run with `RUST_LOG=debug` to see the webhook payloads the default
//! transport would post.

use rust_logger_stackdriver::prelude::*;
use rust_logger_stackdriver::{error, info};
use serde_json::json;
use std::fmt;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
struct UpstreamError {
    service: &'static str,
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} is unavailable", self.service)
    }
}

impl std::error::Error for UpstreamError {}

fn main() -> Result<()> {
    // Diagnostics (and the payloads TracingTransport records) go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let logger = Logger::builder()
        .service("example-service")
        .version("v0.0.1")
        .project_id("example-project")
        .webhook_url("https://hooks.example.com/services/T000/B000/XXXX")
        .error_renderer(|err| {
            Some(json!({
                "error": err.to_string(),
                "message": "custom message",
            }))
        })
        .build()?;

    logger.debug(
        "hello world",
        &[
            Field::error(UpstreamError { service: "ledger" }),
            Field::label("foo-label", "foo"),
            Field::label("bar-label", "bar"),
            Field::http_request(&HttpRequestEntry {
                request_method: "GET".into(),
                request_url: "http://example.com".into(),
                request_size: 1024,
                status: 200,
                user_agent: "curl".into(),
                remote_ip: "8.8.8.8".into(),
                referer: "http://example.com".into(),
                latency: Duration::from_secs(1),
                ..HttpRequestEntry::default()
            }),
        ],
    );

    // Request-scoped logger: trace context, user and labels on every entry
    let trace = ContextInfo::from_cloud_trace_header("105445aa7843bc8bf206b120001000/123;o=1")
        .unwrap_or_default()
        .with_request_id("req-42");
    let request = logger.with(&[
        Field::context(&trace),
        Field::user("alice@example.com"),
        Field::label("tenant", "acme"),
    ]);

    info!(request, "charging card ending {}", 4242);

    // Sent to the default webhook as well as logged
    error!(request, [Field::slack(), Field::error(UpstreamError { service: "payments" })];
        "charge failed");

    // Silenced scope: no notifications unless a call opts back in
    let batch = request.with(&[Field::no_slack()]);
    batch.error("retry queue full", &[Field::int("depth", 10_000_i64)]);

    logger.sync()
}
