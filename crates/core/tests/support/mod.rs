//! Shared helpers for session queue integration tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use distrack_common::testing::{MemoryStateStore, MockClock};
use distrack_core::{SessionQueue, SessionQueueConfig, SessionUploader, UploadError};
use distrack_domain::{SessionPayload, StreakData};
use parking_lot::Mutex;
use tokio::sync::Notify;
use uuid::Uuid;

/// Uploader that records payloads and fails for selected session ids.
#[derive(Default)]
pub struct ScriptedUploader {
    failing: Mutex<HashSet<Uuid>>,
    fail_all: Mutex<bool>,
    uploaded: Mutex<Vec<SessionPayload>>,
    gate: Mutex<Option<Arc<Notify>>>,
    started: Notify,
}

impl ScriptedUploader {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_for(&self, session_id: Uuid) {
        self.failing.lock().insert(session_id);
    }

    pub fn set_fail_all(&self, fail: bool) {
        *self.fail_all.lock() = fail;
    }

    /// Block every upload until the returned notify is signalled.
    pub fn hold(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock() = Some(Arc::clone(&gate));
        gate
    }

    /// Resolves once an upload has begun.
    pub async fn wait_started(&self) {
        self.started.notified().await;
    }

    pub fn uploaded(&self) -> Vec<SessionPayload> {
        self.uploaded.lock().clone()
    }

    pub fn upload_count(&self) -> usize {
        self.uploaded.lock().len()
    }
}

#[async_trait]
impl SessionUploader for ScriptedUploader {
    async fn upload(&self, session: &SessionPayload) -> Result<(), UploadError> {
        self.started.notify_one();
        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        self.uploaded.lock().push(session.clone());

        let id = session.session_id.unwrap_or_default();
        if *self.fail_all.lock() || self.failing.lock().contains(&id) {
            return Err(UploadError::Rejected { status: 503, message: "unavailable".into() });
        }
        Ok(())
    }
}

pub struct QueueHarness {
    pub queue: SessionQueue,
    pub store: Arc<MemoryStateStore>,
    pub uploader: Arc<ScriptedUploader>,
    pub clock: Arc<MockClock>,
}

pub fn manual_config() -> SessionQueueConfig {
    SessionQueueConfig { flush_on_enqueue: false, ..SessionQueueConfig::default() }
}

pub fn harness(config: SessionQueueConfig) -> QueueHarness {
    let store = Arc::new(MemoryStateStore::new());
    let uploader = ScriptedUploader::new();
    let clock = Arc::new(MockClock::at_millis(1_740_823_200_000));
    let queue = SessionQueue::with_clock(store.clone(), uploader.clone(), config, clock.clone());
    QueueHarness { queue, store, uploader, clock }
}

pub fn reopen(h: &QueueHarness, config: SessionQueueConfig) -> SessionQueue {
    SessionQueue::with_clock(h.store.clone(), h.uploader.clone(), config, h.clock.clone())
}

pub fn session(minutes: u32) -> SessionPayload {
    SessionPayload {
        session_id: None,
        duration: f64::from(minutes) * 60.0,
        session_date: "2025-03-01T10:00:00Z".to_string(),
        languages: BTreeMap::from([("rust".to_string(), f64::from(minutes) * 60.0)]),
        streak_data: StreakData { current_streak: 2, longest_streak: 5 },
    }
}

pub fn session_with_id(id: Uuid, minutes: u32) -> SessionPayload {
    SessionPayload { session_id: Some(id), ..session(minutes) }
}

/// Poll `check` until it holds or a second passes.
pub async fn eventually<F>(mut check: F) -> bool
where
    F: FnMut() -> bool,
{
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
