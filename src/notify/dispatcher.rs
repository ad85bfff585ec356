//! Bounded notification dispatcher
//!
//! Notifications are queued on a bounded channel and delivered by a fixed
//! pool of worker threads. The logging call never waits on the network;
//! rendering and delivery both happen on the workers. When the queue is
//! full the configured [`OverflowPolicy`] decides what happens.
//!
//! Every queued notification holds an [`InFlightSlot`]. The slot is
//! released when the job is dropped, whether it was delivered, given up
//! on, evicted, or hit a panic, so [`Notifier::wait_idle`] always returns
//! once the queue drains.

use super::payload::WebhookMessage;
use super::render::render_fields;
use super::retry::RetryPolicy;
use super::transport::WebhookTransport;
use crate::core::error::{LoggerError, Result};
use crate::core::field::Field;
use crate::core::log_entry::LogEntry;
use crate::core::metrics::NotifierMetrics;
use crate::core::overflow_policy::{OverflowCallback, OverflowPolicy};
use crate::stackdriver::schema::ServiceContext;
use crossbeam_channel::{bounded, Receiver, SendTimeoutError, Sender, TrySendError};
use parking_lot::{Condvar, Mutex};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// How long dropping the notifier waits for workers to drain
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Evictions tried under `DropOldest` before giving up on the new job
const EVICT_ATTEMPTS: usize = 3;

/// Counts notifications that have been queued but not yet finished
#[derive(Debug, Default)]
pub struct InFlight {
    count: Mutex<usize>,
    idle: Condvar,
}

impl InFlight {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register one notification; it finishes when the slot drops
    pub fn acquire(self: &Arc<Self>) -> InFlightSlot {
        *self.count.lock() += 1;
        InFlightSlot(Arc::clone(self))
    }

    fn release(&self) {
        let mut count = self.count.lock();
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.idle.notify_all();
        }
    }

    pub fn count(&self) -> usize {
        *self.count.lock()
    }

    /// Block until nothing is in flight
    pub fn wait(&self) {
        let mut count = self.count.lock();
        while *count > 0 {
            self.idle.wait(&mut count);
        }
    }

    /// Like [`wait`](Self::wait) but bounded. Returns `true` if idle.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut count = self.count.lock();
        while *count > 0 {
            if self.idle.wait_until(&mut count, deadline).timed_out() {
                return *count == 0;
            }
        }
        true
    }
}

/// Marks one notification as in flight until dropped
#[derive(Debug)]
pub struct InFlightSlot(Arc<InFlight>);

impl Drop for InFlightSlot {
    fn drop(&mut self) {
        self.0.release();
    }
}

struct Job {
    destination: String,
    entry: LogEntry,
    fields: Vec<Field>,
    _slot: InFlightSlot,
}

/// Worker pool settings
#[derive(Clone)]
pub struct NotifierConfig {
    pub workers: usize,
    pub queue_capacity: usize,
    pub overflow_policy: OverflowPolicy,
    pub on_overflow: Option<OverflowCallback>,
    pub retry: RetryPolicy,
    pub shutdown_timeout: Duration,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            queue_capacity: 1024,
            overflow_policy: OverflowPolicy::AlertAndDrop,
            on_overflow: None,
            retry: RetryPolicy::default(),
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }
}

/// State the workers share
struct Delivery {
    service: ServiceContext,
    transport: Arc<dyn WebhookTransport>,
    retry: RetryPolicy,
    metrics: Arc<NotifierMetrics>,
}

impl Delivery {
    fn deliver(&self, job: &Job) {
        let Some(color) = job.entry.level.alert_color() else {
            return;
        };

        let rendered = match render_fields(&job.fields) {
            Ok(rendered) => rendered,
            Err(e) => {
                self.metrics.record_render_failure();
                tracing::error!(error = %e, message = %job.entry.message, "failed to render notification");
                return;
            }
        };
        let message = WebhookMessage::build(&job.entry, &self.service, rendered, color);

        let result = self.retry.run(|attempt, remaining| {
            if attempt > 1 {
                self.metrics.record_retry();
            }
            self.transport.post(&job.destination, &message, remaining)
        });

        match result {
            Ok(_) => {
                self.metrics.record_delivered();
            }
            Err(e) => {
                self.metrics.record_failed();
                tracing::warn!(
                    transport = self.transport.name(),
                    attempts = e.attempts,
                    error = %e.source,
                    "failed to post webhook notification"
                );
            }
        }
    }
}

/// Asynchronous webhook notifier
pub struct Notifier {
    sender: Option<Sender<Job>>,
    // Kept so DropOldest can evict from the head of the queue
    receiver: Receiver<Job>,
    workers: Vec<JoinHandle<()>>,
    in_flight: Arc<InFlight>,
    metrics: Arc<NotifierMetrics>,
    overflow_policy: OverflowPolicy,
    on_overflow: Option<OverflowCallback>,
    shutdown_timeout: Duration,
}

impl Notifier {
    /// Start the worker pool
    pub fn new(
        config: NotifierConfig,
        service: ServiceContext,
        transport: Arc<dyn WebhookTransport>,
    ) -> Result<Self> {
        if config.workers == 0 || config.queue_capacity == 0 {
            return Err(LoggerError::config(
                "Notifier",
                "workers and queue capacity must be at least 1",
            ));
        }

        let (sender, receiver) = bounded::<Job>(config.queue_capacity);
        let metrics = Arc::new(NotifierMetrics::new());
        let delivery = Arc::new(Delivery {
            service,
            transport,
            retry: config.retry,
            metrics: Arc::clone(&metrics),
        });

        let mut workers = Vec::with_capacity(config.workers);
        for id in 0..config.workers {
            let receiver = receiver.clone();
            let delivery = Arc::clone(&delivery);
            let handle = thread::Builder::new()
                .name(format!("notify-worker-{}", id))
                .spawn(move || worker_loop(receiver, delivery))
                .map_err(|e| {
                    LoggerError::io_operation("spawning notification worker", e.to_string(), e)
                })?;
            workers.push(handle);
        }

        Ok(Self {
            sender: Some(sender),
            receiver,
            workers,
            in_flight: InFlight::new(),
            metrics,
            overflow_policy: config.overflow_policy,
            on_overflow: config.on_overflow,
            shutdown_timeout: config.shutdown_timeout,
        })
    }

    /// Queue a notification for `entry`.
    ///
    /// Returns `false` when nothing was queued: no destination, a level
    /// without an alert colour, or the overflow policy dropped it.
    pub fn dispatch(&self, destination: &str, entry: &LogEntry, fields: Vec<Field>) -> bool {
        if destination.is_empty() || entry.level.alert_color().is_none() {
            return false;
        }
        let Some(sender) = self.sender.as_ref() else {
            return false;
        };

        let job = Job {
            destination: destination.to_string(),
            entry: entry.clone(),
            fields,
            _slot: self.in_flight.acquire(),
        };

        let queued = match sender.try_send(job) {
            Ok(()) => true,
            Err(TrySendError::Full(job)) => self.handle_overflow(sender, job),
            // Shutting down
            Err(TrySendError::Disconnected(_)) => false,
        };
        if queued {
            self.metrics.record_dispatched();
        }
        queued
    }

    fn handle_overflow(&self, sender: &Sender<Job>, job: Job) -> bool {
        match &self.overflow_policy {
            OverflowPolicy::DropNewest => {
                self.metrics.record_dropped();
                false
            }

            OverflowPolicy::DropOldest => {
                let mut job = job;
                for _ in 0..EVICT_ATTEMPTS {
                    if let Ok(oldest) = self.receiver.try_recv() {
                        self.alert_and_drop(oldest);
                    }
                    match sender.try_send(job) {
                        Ok(()) => return true,
                        Err(TrySendError::Full(back)) => job = back,
                        Err(TrySendError::Disconnected(_)) => return false,
                    }
                }
                self.alert_and_drop(job);
                false
            }

            OverflowPolicy::Block => sender.send(job).is_ok(),

            OverflowPolicy::BlockWithTimeout(timeout) => {
                match sender.send_timeout(job, *timeout) {
                    Ok(()) => true,
                    Err(SendTimeoutError::Timeout(job)) => {
                        self.alert_and_drop(job);
                        false
                    }
                    Err(SendTimeoutError::Disconnected(_)) => false,
                }
            }

            OverflowPolicy::AlertAndDrop => {
                self.alert_and_drop(job);
                false
            }
        }
    }

    fn alert_and_drop(&self, job: Job) {
        let dropped = self.metrics.record_dropped() + 1;
        drop(job);

        // First drop and every thousandth after
        if dropped == 1 || dropped % 1000 == 0 {
            tracing::warn!(
                dropped,
                policy = %self.overflow_policy,
                "notification queue full, dropping notifications"
            );
            if let Some(callback) = &self.on_overflow {
                callback(dropped);
            }
        }
    }

    /// Block until every queued notification has finished
    pub fn wait_idle(&self) {
        self.in_flight.wait();
    }

    /// Bounded [`wait_idle`](Self::wait_idle). Returns `true` if idle.
    pub fn wait_idle_timeout(&self, timeout: Duration) -> bool {
        self.in_flight.wait_timeout(timeout)
    }

    /// Notifications queued or being delivered
    pub fn pending(&self) -> usize {
        self.in_flight.count()
    }

    pub fn metrics(&self) -> &NotifierMetrics {
        &self.metrics
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }
}

fn worker_loop(receiver: Receiver<Job>, delivery: Arc<Delivery>) {
    for job in receiver.iter() {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| delivery.deliver(&job)));
        if outcome.is_err() {
            delivery.metrics.record_failed();
            tracing::error!(
                destination = %job.destination,
                "notification worker panicked during delivery"
            );
        }
    }
}

impl Drop for Notifier {
    fn drop(&mut self) {
        // Closing the channel lets workers drain what is queued and exit
        drop(self.sender.take());

        let deadline = Instant::now() + self.shutdown_timeout;
        for handle in self.workers.drain(..) {
            loop {
                if handle.is_finished() {
                    if handle.join().is_err() {
                        tracing::error!("notification worker panicked during shutdown");
                    }
                    break;
                }
                if Instant::now() >= deadline {
                    tracing::warn!(
                        timeout = ?self.shutdown_timeout,
                        pending = self.in_flight.count(),
                        "notification workers did not finish in time, some notifications may be lost"
                    );
                    return;
                }
                thread::sleep(Duration::from_millis(10));
            }
        }

        let dropped = self.metrics.dropped();
        if dropped > 0 {
            tracing::warn!(
                dropped,
                drop_rate = self.metrics.drop_rate(),
                "notifier shut down with dropped notifications"
            );
        }
    }
}
