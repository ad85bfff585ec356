//! Stress tests for the notification pipeline
//!
//! These tests verify:
//! - Concurrent writers with notifications enabled
//! - Overflow never blocks the write path and always releases slots
//! - Derived loggers stay isolated across threads
//! - Sync returns only after every notification finished

use parking_lot::{Condvar, Mutex};
use rust_logger_stackdriver::notify::NotifierConfig;
use rust_logger_stackdriver::prelude::*;
use rust_logger_stackdriver::{Notifier, StackdriverCore, StackdriverSettings};
use serde_json::Value;
use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Clone, Default)]
struct Buffer(Arc<Mutex<Vec<u8>>>);

impl Write for Buffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Counts posts; optionally holds every post until opened
struct GatedTransport {
    posts: AtomicUsize,
    open: Mutex<bool>,
    cond: Condvar,
}

impl GatedTransport {
    fn new(open: bool) -> Arc<Self> {
        Arc::new(Self {
            posts: AtomicUsize::new(0),
            open: Mutex::new(open),
            cond: Condvar::new(),
        })
    }

    fn open(&self) {
        *self.open.lock() = true;
        self.cond.notify_all();
    }
}

impl WebhookTransport for GatedTransport {
    fn post(
        &self,
        _url: &str,
        _message: &WebhookMessage,
        _timeout: Duration,
    ) -> std::result::Result<(), WebhookError> {
        let mut open = self.open.lock();
        while !*open {
            self.cond.wait(&mut open);
        }
        drop(open);
        self.posts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &str {
        "gated"
    }
}

fn build(
    transport: Arc<GatedTransport>,
    config: NotifierConfig,
    output: Buffer,
) -> (Logger, Arc<Notifier>) {
    let service = ServiceContext::new("stress", "1");
    let notifier = Arc::new(Notifier::new(config, service.clone(), transport).unwrap());
    let settings = StackdriverSettings::new(service).webhook_url("https://hook");
    let core = StackdriverCore::new(
        Arc::new(JsonCore::new(output, LogLevel::Debug)),
        Arc::clone(&notifier),
        settings,
    );
    (Logger::new(Arc::new(core)), notifier)
}

#[test]
fn test_concurrent_notifications_all_delivered() {
    let transport = GatedTransport::new(true);
    let (logger, notifier) = build(
        Arc::clone(&transport),
        NotifierConfig {
            workers: 4,
            queue_capacity: 4096,
            ..NotifierConfig::default()
        },
        Buffer::default(),
    );

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let logger = logger.with(&[Field::int("thread", t as i64)]);
            thread::spawn(move || {
                for i in 0..100 {
                    logger.error(format!("failure {}", i), &[Field::slack()]);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    logger.sync().unwrap();
    assert_eq!(transport.posts.load(Ordering::SeqCst), 800);
    assert_eq!(notifier.metrics().delivered(), 800);
    assert_eq!(notifier.metrics().dropped(), 0);
    assert_eq!(notifier.pending(), 0);
}

#[test]
fn test_overflow_never_blocks_writes() {
    let transport = GatedTransport::new(false);
    let overflow_alerts = Arc::new(AtomicUsize::new(0));
    let alerts = Arc::clone(&overflow_alerts);
    let (logger, notifier) = build(
        Arc::clone(&transport),
        NotifierConfig {
            workers: 2,
            queue_capacity: 8,
            overflow_policy: OverflowPolicy::AlertAndDrop,
            on_overflow: Some(Arc::new(move |_| {
                alerts.fetch_add(1, Ordering::SeqCst);
            })),
            ..NotifierConfig::default()
        },
        Buffer::default(),
    );

    let start = Instant::now();
    for i in 0..2000 {
        logger.warn(format!("flood {}", i), &[Field::slack()]);
    }
    assert!(
        start.elapsed() < Duration::from_secs(5),
        "writes blocked on a full queue"
    );

    // At most one job per worker plus the queue survives
    let accepted = notifier.metrics().dispatched();
    assert!(accepted <= 10);
    assert_eq!(notifier.metrics().dropped(), 2000 - accepted);
    // First drop and drop #1000
    assert_eq!(overflow_alerts.load(Ordering::SeqCst), 2);

    transport.open();
    logger.sync().unwrap();
    assert_eq!(transport.posts.load(Ordering::SeqCst) as u64, accepted);
    assert_eq!(notifier.pending(), 0);
}

#[test]
fn test_block_policy_delivers_everything() {
    let transport = GatedTransport::new(true);
    let (logger, notifier) = build(
        Arc::clone(&transport),
        NotifierConfig {
            workers: 1,
            queue_capacity: 2,
            overflow_policy: OverflowPolicy::Block,
            ..NotifierConfig::default()
        },
        Buffer::default(),
    );

    for i in 0..200 {
        logger.error(format!("must arrive {}", i), &[Field::slack()]);
    }
    logger.sync().unwrap();

    assert_eq!(transport.posts.load(Ordering::SeqCst), 200);
    assert_eq!(notifier.metrics().dropped(), 0);
}

#[test]
fn test_derived_loggers_isolated_across_threads() {
    let output = Buffer::default();
    let (logger, _notifier) = build(
        GatedTransport::new(true),
        NotifierConfig::default(),
        output.clone(),
    );

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let scoped = logger.with(&[
                Field::user(format!("user-{}", t)),
                Field::label("worker", t.to_string()),
            ]);
            thread::spawn(move || {
                for i in 0..50 {
                    scoped.info(format!("{}:{}", t, i), &[]);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    logger.sync().unwrap();

    let content = String::from_utf8_lossy(&output.0.lock()).into_owned();
    let lines: Vec<Value> = content
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 400);

    for line in lines {
        let message = line["message"].as_str().unwrap();
        let thread_id = message.split(':').next().unwrap();
        assert_eq!(line["context"]["user"], format!("user-{}", thread_id));
        assert_eq!(line["logging.googleapis.com/labels"]["worker"], thread_id);
    }
}
