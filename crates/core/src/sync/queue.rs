//! Durable offline session queue.
//!
//! Completed sessions are buffered in the plain state store under
//! `distrack.session_queue` (oldest first) and uploaded one by one. Delivery is
//! at-least-once; every item carries a `session_id` the service dedups on.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use distrack_common::storage::JsonFileStateStore;
//! use distrack_core::{SessionQueue, SessionQueueConfig, SessionUploader};
//! use distrack_domain::SessionPayload;
//!
//! # async fn example(uploader: Arc<dyn SessionUploader>, payload: SessionPayload)
//! #     -> Result<(), distrack_core::QueueError> {
//! let store = Arc::new(JsonFileStateStore::new("/tmp/distrack/state.json"));
//! let queue = SessionQueue::new(store, uploader, SessionQueueConfig::default());
//!
//! queue.start();
//! let session_id = queue.enqueue(payload).await?;
//! // ... application runs ...
//! queue.stop().await;
//! # let _ = session_id;
//! # Ok(())
//! # }
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use distrack_common::storage::StateStore;
use distrack_common::time::{Clock, SystemClock};
use distrack_domain::constants::{
    FLUSH_INTERVAL_SECS, MAX_LAST_ERROR_LEN, MAX_QUEUE_ITEMS, SESSION_QUEUE_KEY,
};
use distrack_domain::{QueueConfig, QueuedSession, SessionPayload};
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::errors::QueueError;
use super::ports::SessionUploader;

/// Configuration for the session queue.
#[derive(Debug, Clone)]
pub struct SessionQueueConfig {
    /// Oldest items are evicted beyond this length
    pub max_items: usize,
    /// Interval between periodic flushes
    pub flush_interval: Duration,
    /// Spawn a background flush after every enqueue
    pub flush_on_enqueue: bool,
    /// Join timeout when stopping the timer
    pub join_timeout: Duration,
}

impl Default for SessionQueueConfig {
    fn default() -> Self {
        Self {
            max_items: MAX_QUEUE_ITEMS,
            flush_interval: Duration::from_secs(FLUSH_INTERVAL_SECS),
            flush_on_enqueue: true,
            join_timeout: Duration::from_secs(5),
        }
    }
}

impl From<&QueueConfig> for SessionQueueConfig {
    fn from(config: &QueueConfig) -> Self {
        Self {
            max_items: config.max_items,
            flush_interval: Duration::from_secs(config.flush_interval_secs),
            ..Self::default()
        }
    }
}

/// Outcome of one flush pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Another flush was already running; nothing was attempted
    pub skipped: bool,
    pub attempted: usize,
    pub sent: usize,
    pub failed: usize,
    /// Queue length after the pass, including items enqueued meanwhile
    pub remaining: usize,
}

impl FlushReport {
    const fn skipped() -> Self {
        Self { skipped: true, attempted: 0, sent: 0, failed: 0, remaining: 0 }
    }
}

/// Durable queue of sessions awaiting upload.
///
/// Dropping the queue cancels the periodic timer without flushing.
pub struct SessionQueue {
    inner: Arc<QueueInner>,
    worker: parking_lot::Mutex<Option<Worker>>,
}

struct Worker {
    cancellation: CancellationToken,
    handle: JoinHandle<()>,
}

struct QueueInner {
    store: Arc<dyn StateStore>,
    uploader: Arc<dyn SessionUploader>,
    clock: Arc<dyn Clock>,
    config: SessionQueueConfig,
    flushing: AtomicBool,
    /// Serialises read-modify-write of the stored queue
    write_lock: Mutex<()>,
}

/// Resets the in-progress flag however the flush ends.
struct FlushGuard<'a>(&'a AtomicBool);

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl SessionQueue {
    /// Create a queue stamping items with the system clock.
    pub fn new(
        store: Arc<dyn StateStore>,
        uploader: Arc<dyn SessionUploader>,
        config: SessionQueueConfig,
    ) -> Self {
        Self::with_clock(store, uploader, config, Arc::new(SystemClock))
    }

    /// Create a queue with an explicit clock.
    pub fn with_clock(
        store: Arc<dyn StateStore>,
        uploader: Arc<dyn SessionUploader>,
        config: SessionQueueConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            inner: Arc::new(QueueInner {
                store,
                uploader,
                clock,
                config,
                flushing: AtomicBool::new(false),
                write_lock: Mutex::new(()),
            }),
            worker: parking_lot::Mutex::new(None),
        }
    }

    /// Queue a session for upload and return its id.
    ///
    /// Assigns a `session_id` when absent. Re-enqueueing an id that is already
    /// queued replaces that item in place. Beyond `max_items` the oldest items
    /// are dropped. A background flush is spawned afterwards unless disabled;
    /// network conditions never fail this call.
    ///
    /// # Errors
    /// Only when the queue cannot be read or persisted
    #[instrument(skip(self, payload))]
    pub async fn enqueue(&self, payload: SessionPayload) -> Result<Uuid, QueueError> {
        let session_id = payload.session_id.unwrap_or_else(Uuid::new_v4);
        let item = QueuedSession::new(session_id, payload, self.inner.clock.now_utc());

        {
            let _write = self.inner.write_lock.lock().await;
            let mut items = self.inner.load().await?;

            if let Some(existing) = items.iter_mut().find(|i| i.session_id == session_id) {
                debug!(%session_id, "Replacing queued session with same id");
                *existing = item;
            } else {
                items.push(item);
            }

            self.inner.enforce_cap(&mut items);
            self.inner.save(&items).await?;
            debug!(%session_id, queued = items.len(), "Session queued");
        }

        if self.inner.config.flush_on_enqueue {
            let inner = Arc::clone(&self.inner);
            tokio::spawn(async move {
                if let Err(e) = inner.flush().await {
                    warn!(error = %e, "Background flush after enqueue failed");
                }
            });
        }

        Ok(session_id)
    }

    /// Try to upload every queued item once.
    ///
    /// Overlapping calls return immediately with `skipped = true`.
    ///
    /// # Errors
    /// Only when the queue cannot be read or persisted
    pub async fn flush(&self) -> Result<FlushReport, QueueError> {
        self.inner.flush().await
    }

    /// Snapshot of the queued items, oldest first.
    ///
    /// # Errors
    /// When the queue cannot be read
    pub async fn pending(&self) -> Result<Vec<QueuedSession>, QueueError> {
        self.inner.load().await
    }

    /// Number of queued items.
    ///
    /// # Errors
    /// When the queue cannot be read
    pub async fn len(&self) -> Result<usize, QueueError> {
        Ok(self.inner.load().await?.len())
    }

    /// Whether nothing is queued.
    ///
    /// # Errors
    /// When the queue cannot be read
    pub async fn is_empty(&self) -> Result<bool, QueueError> {
        Ok(self.len().await? == 0)
    }

    /// Whether the periodic flush timer is active.
    pub fn is_running(&self) -> bool {
        self.worker.lock().is_some()
    }

    /// Start the periodic flush timer. No-op when already running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) {
        let mut worker = self.worker.lock();
        if worker.is_some() {
            debug!("Session queue timer already running");
            return;
        }

        let cancellation = CancellationToken::new();
        let cancel = cancellation.clone();
        let inner = Arc::clone(&self.inner);
        let interval = self.inner.config.flush_interval;

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = cancel.cancelled() => {
                        debug!("Session queue timer cancelled");
                        break;
                    }
                    () = tokio::time::sleep(interval) => {
                        match inner.flush().await {
                            Ok(report) if report.failed > 0 => {
                                warn!(
                                    failed = report.failed,
                                    remaining = report.remaining,
                                    "Periodic flush left sessions queued"
                                );
                            }
                            Ok(report) => debug!(sent = report.sent, "Periodic flush finished"),
                            Err(e) => warn!(error = %e, "Periodic flush failed"),
                        }
                    }
                }
            }
        });

        *worker = Some(Worker { cancellation, handle });
        info!(interval_secs = interval.as_secs(), "Session queue timer started");
    }

    /// Stop the periodic flush timer. No-op when not running.
    ///
    /// A flush already in progress finishes before the timer task exits.
    pub async fn stop(&self) {
        let Some(worker) = self.worker.lock().take() else {
            return;
        };

        worker.cancellation.cancel();
        match tokio::time::timeout(self.inner.config.join_timeout, worker.handle).await {
            Ok(Ok(())) => info!("Session queue timer stopped"),
            Ok(Err(e)) => warn!(error = %e, "Session queue timer task panicked"),
            Err(_) => warn!("Session queue timer did not stop within timeout"),
        }
    }
}

impl Drop for SessionQueue {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.get_mut().take() {
            worker.cancellation.cancel();
        }
    }
}

impl QueueInner {
    #[instrument(skip(self))]
    async fn flush(&self) -> Result<FlushReport, QueueError> {
        if self
            .flushing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Flush already in progress; skipping");
            return Ok(FlushReport::skipped());
        }
        let _guard = FlushGuard(&self.flushing);

        let snapshot = self.load().await?;
        if snapshot.is_empty() {
            return Ok(FlushReport::default());
        }

        let mut report = FlushReport { attempted: snapshot.len(), ..FlushReport::default() };
        let attempted: HashMap<Uuid, QueuedSession> =
            snapshot.iter().map(|item| (item.session_id, item.clone())).collect();
        let mut failed = Vec::new();

        for mut item in snapshot {
            match self.uploader.upload(&item.payload()).await {
                Ok(()) => {
                    report.sent += 1;
                    debug!(session_id = %item.session_id, "Session uploaded");
                }
                Err(e) => {
                    debug!(
                        session_id = %item.session_id,
                        attempts = item.attempts + 1,
                        error = %e,
                        "Session upload failed"
                    );
                    item.record_failure(truncate_error(&e.to_string()));
                    failed.push(item);
                }
            }
        }
        report.failed = failed.len();

        let _write = self.write_lock.lock().await;
        let current = self.load().await?;

        // Items enqueued or replaced while uploading survive the pass.
        let mut arrived = Vec::new();
        let mut replaced = HashSet::new();
        for item in current {
            match attempted.get(&item.session_id) {
                None => arrived.push(item),
                Some(original) if *original != item => {
                    replaced.insert(item.session_id);
                    arrived.push(item);
                }
                Some(_) => {}
            }
        }

        let mut remaining: Vec<QueuedSession> =
            failed.into_iter().filter(|item| !replaced.contains(&item.session_id)).collect();
        remaining.extend(arrived);
        self.enforce_cap(&mut remaining);
        self.save(&remaining).await?;

        report.remaining = remaining.len();
        if report.failed > 0 {
            warn!(
                sent = report.sent,
                failed = report.failed,
                remaining = report.remaining,
                "Some sessions could not be uploaded; kept for next flush"
            );
        } else {
            info!(sent = report.sent, remaining = report.remaining, "Session queue flushed");
        }

        Ok(report)
    }

    async fn load(&self) -> Result<Vec<QueuedSession>, QueueError> {
        let items = match self.store.get(SESSION_QUEUE_KEY).await? {
            None | Some(Value::Null) => return Ok(Vec::new()),
            Some(Value::Array(items)) => items,
            Some(_) => {
                warn!("Stored session queue is not a list; starting empty");
                return Ok(Vec::new());
            }
        };

        let mut sessions = Vec::with_capacity(items.len());
        for value in items {
            match serde_json::from_value::<QueuedSession>(value) {
                Ok(session) => sessions.push(session),
                Err(e) => warn!(error = %e, "Dropping unreadable queued session"),
            }
        }
        Ok(sessions)
    }

    async fn save(&self, items: &[QueuedSession]) -> Result<(), QueueError> {
        let value = serde_json::to_value(items)?;
        self.store.set(SESSION_QUEUE_KEY, value).await?;
        Ok(())
    }

    fn enforce_cap(&self, items: &mut Vec<QueuedSession>) {
        let max = self.config.max_items;
        if items.len() > max {
            let evicted = items.len() - max;
            items.drain(..evicted);
            debug!(evicted, max, "Session queue full; dropped oldest items");
        }
    }
}

fn truncate_error(message: &str) -> String {
    if message.chars().count() <= MAX_LAST_ERROR_LEN {
        message.to_string()
    } else {
        message.chars().take(MAX_LAST_ERROR_LEN).collect()
    }
}
