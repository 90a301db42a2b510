//! Test utilities and fake implementations of the relay's collaborators
//!
//! These fakes stand in for the ledger's query side, the ledger's write side,
//! the notification channel and time, so that builds and watches can be driven
//! through adversarial scenarios without a running ledger.

use alloy_primitives::B256;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::error::{LedgerError, QueryError};
use crate::notify::CctxEvent;
use crate::protocol::{Cctx, Status};
use crate::providers::MemoryLedger;
use crate::traits::{CctxQueryClient, CctxStore, Clock, NotificationSink};

// ============================================================================
// Scripted Query Client
// ============================================================================

/// One scripted ledger reply.
#[derive(Clone, Debug)]
pub enum Reply<T> {
    Found(T),
    NotFound,
    Unavailable(String),
}

impl<T: Clone> Reply<T> {
    fn to_result(&self, key: B256) -> Result<T, QueryError> {
        match self {
            Self::Found(value) => Ok(value.clone()),
            Self::NotFound => Err(QueryError::NotFound { key }),
            Self::Unavailable(reason) => Err(QueryError::Unavailable(reason.clone())),
        }
    }
}

#[derive(Debug)]
struct Script<T> {
    replies: Vec<Reply<T>>,
    calls: usize,
}

impl<T: Clone> Script<T> {
    /// Replays the replies in order, repeating the last one forever.
    fn next(&mut self, key: B256) -> Result<T, QueryError> {
        let position = self.calls.min(self.replies.len().saturating_sub(1));
        self.calls += 1;
        match self.replies.get(position) {
            Some(reply) => reply.to_result(key),
            None => Err(QueryError::NotFound { key }),
        }
    }
}

/// A query client that replays per-key reply sequences.
///
/// This allows testing scenarios like:
/// - Inbound hash not indexed for the first few lookups
/// - Ledger unreachable between successful replies
/// - PendingOutbound → OutboundMined / Aborted / Reverted progressions
/// - A CCTX that never leaves PendingOutbound
///
/// Keys without a script reply [`QueryError::NotFound`].
#[derive(Clone, Debug, Default)]
pub struct ScriptedQueryClient {
    indexes: Arc<Mutex<HashMap<B256, Script<Vec<B256>>>>>,
    cctxs: Arc<Mutex<HashMap<B256, Script<Cctx>>>>,
}

impl ScriptedQueryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the replies for successive lookups of an inbound hash.
    pub fn add_index_sequence(&self, inbound_hash: B256, replies: Vec<Reply<Vec<B256>>>) {
        self.indexes
            .lock()
            .unwrap()
            .insert(inbound_hash, Script { replies, calls: 0 });
    }

    /// Configure an inbound hash that resolves on the first lookup
    pub fn add_index(&self, inbound_hash: B256, indexes: Vec<B256>) {
        self.add_index_sequence(inbound_hash, vec![Reply::Found(indexes)]);
    }

    /// Configure the replies for successive queries of a CCTX index.
    pub fn add_cctx_sequence(&self, index: B256, replies: Vec<Reply<Cctx>>) {
        self.cctxs
            .lock()
            .unwrap()
            .insert(index, Script { replies, calls: 0 });
    }

    /// Configure a CCTX that reports each status in turn.
    ///
    /// `cctx` is the pending record; every listed status is applied to a copy
    /// of it. The last status repeats forever.
    pub fn add_status_progression(&self, cctx: &Cctx, statuses: &[Status]) {
        let replies = statuses
            .iter()
            .map(|status| {
                let mut reply = cctx.clone();
                if *status != Status::PendingOutbound {
                    reply.transition(*status, status.to_string()).unwrap();
                }
                Reply::Found(reply)
            })
            .collect();
        self.add_cctx_sequence(cctx.index(), replies);
    }

    /// Configure a CCTX that stays pending (for timeout testing)
    pub fn add_always_pending(&self, cctx: &Cctx) {
        self.add_status_progression(cctx, &[Status::PendingOutbound]);
    }

    /// Get the number of lookups of an inbound hash so far
    pub fn index_calls(&self, inbound_hash: B256) -> usize {
        self.indexes
            .lock()
            .unwrap()
            .get(&inbound_hash)
            .map_or(0, |script| script.calls)
    }

    /// Get the number of queries of a CCTX index so far
    pub fn cctx_calls(&self, index: B256) -> usize {
        self.cctxs
            .lock()
            .unwrap()
            .get(&index)
            .map_or(0, |script| script.calls)
    }
}

#[async_trait]
impl CctxQueryClient for ScriptedQueryClient {
    async fn cctx(&self, index: B256) -> Result<Cctx, QueryError> {
        match self.cctxs.lock().unwrap().get_mut(&index) {
            Some(script) => script.next(index),
            None => Err(QueryError::NotFound { key: index }),
        }
    }

    async fn inbound_hash_to_cctx(&self, inbound_hash: B256) -> Result<Vec<B256>, QueryError> {
        match self.indexes.lock().unwrap().get_mut(&inbound_hash) {
            Some(script) => script.next(inbound_hash),
            None => Err(QueryError::NotFound { key: inbound_hash }),
        }
    }
}

// ============================================================================
// Recording Sink
// ============================================================================

/// A notification sink that keeps every event it receives.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<CctxEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<CctxEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NotificationSink for RecordingSink {
    fn emit(&self, event: CctxEvent) {
        self.events.lock().unwrap().push(event);
    }
}

// ============================================================================
// Flaky Store
// ============================================================================

/// A ledger whose inserts can be made to fail.
///
/// Reads and successful writes go to an inner [`MemoryLedger`].
#[derive(Clone, Debug, Default)]
pub struct FlakyStore {
    inner: MemoryLedger,
    failing_inserts: Arc<Mutex<usize>>,
    insert_attempts: Arc<Mutex<usize>>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` inserts fail with [`LedgerError::Unavailable`]
    pub fn fail_next_inserts(&self, count: usize) {
        *self.failing_inserts.lock().unwrap() = count;
    }

    pub fn insert_attempts(&self) -> usize {
        *self.insert_attempts.lock().unwrap()
    }

    pub fn ledger(&self) -> &MemoryLedger {
        &self.inner
    }
}

impl CctxStore for FlakyStore {
    fn get(&self, index: &B256) -> Option<Cctx> {
        self.inner.get(index)
    }

    fn insert_with_index(&self, cctx: &Cctx) -> Result<(), LedgerError> {
        *self.insert_attempts.lock().unwrap() += 1;

        let mut failing = self.failing_inserts.lock().unwrap();
        if *failing > 0 {
            *failing -= 1;
            return Err(LedgerError::Unavailable("Simulated ledger outage".to_string()));
        }
        drop(failing);

        self.inner.insert_with_index(cctx)
    }
}

// ============================================================================
// Fake Clock
// ============================================================================

/// A fake clock that allows fast-forwarding time in tests.
///
/// Every sleep advances the shared time by its full duration and then yields
/// to the runtime, so concurrent pollers interleave without real waiting.
/// Concurrent sleepers each advance the clock, so time moves faster than any
/// single task's schedule suggests.
#[derive(Clone, Debug)]
pub struct FakeClock {
    current_time: Arc<Mutex<Instant>>,
    sleep_log: Arc<Mutex<Vec<Duration>>>,
}

impl Default for FakeClock {
    fn default() -> Self {
        Self {
            current_time: Arc::new(Mutex::new(Instant::now())),
            sleep_log: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl FakeClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fast-forward the clock by the given duration
    pub fn advance(&self, duration: Duration) {
        let mut time = self.current_time.lock().unwrap();
        *time += duration;
    }

    /// Get the total time "slept" by this clock
    pub fn total_sleep_time(&self) -> Duration {
        self.sleep_log.lock().unwrap().iter().sum()
    }

    /// Get the number of times sleep was called
    pub fn sleep_count(&self) -> usize {
        self.sleep_log.lock().unwrap().len()
    }

    /// Clear the sleep log
    pub fn clear_sleep_log(&self) {
        self.sleep_log.lock().unwrap().clear();
    }
}

#[async_trait]
impl Clock for FakeClock {
    async fn sleep(&self, duration: Duration) {
        self.sleep_log.lock().unwrap().push(duration);
        self.advance(duration);
        tokio::task::yield_now().await;
    }

    fn now(&self) -> Instant {
        *self.current_time.lock().unwrap()
    }
}
