//! Registry of in-flight computations, one per key
//!
//! The first caller for a key starts the computation and registers a shared
//! handle to it; everyone arriving while it runs awaits that same handle. The
//! slot is released by a [`SlotGuard`] owned by the computation itself, so it
//! is freed on success, failure, timeout or panic alike, and a caller that
//! stops waiting never strands it.

use crate::analysis::AnalysisResult;
use crate::cache::CacheKey;
use crate::error::OrchestratorError;
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Outcome every waiter of one computation receives
pub type ComputationOutput = Result<AnalysisResult, OrchestratorError>;

/// Cloneable handle to a running computation
pub type SharedComputation = Shared<BoxFuture<'static, ComputationOutput>>;

/// Whether the caller started the computation or joined an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Leader,
    Follower,
}

struct Slot {
    generation: u64,
    computation: SharedComputation,
}

/// Per-key coordination point shared by all callers
///
/// Keys are independent: the map lock is only held to look up or swap a slot,
/// never while a computation runs.
#[derive(Default)]
pub struct InflightRegistry {
    slots: Mutex<HashMap<CacheKey, Slot>>,
    next_generation: AtomicU64,
}

impl InflightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the computation running for `key`, or start one with `start`
    ///
    /// `start` runs under the registry lock and must not block: it is expected
    /// to spawn the work and return a handle to it. It receives the guard that
    /// releases the slot; the spawned work must own it until it finishes. The
    /// guard must not be moved into the returned future itself, which the
    /// registry keeps alive for as long as the slot exists.
    pub fn join_or_start<F>(self: &Arc<Self>, key: &CacheKey, start: F) -> (SharedComputation, Role)
    where
        F: FnOnce(SlotGuard) -> BoxFuture<'static, ComputationOutput>,
    {
        let mut slots = self.lock();

        if let Some(slot) = slots.get(key) {
            debug!("Joining in-flight computation for {}", key);
            return (slot.computation.clone(), Role::Follower);
        }

        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let guard = SlotGuard {
            registry: Arc::clone(self),
            key: key.clone(),
            generation,
        };

        let computation = start(guard).shared();
        slots.insert(
            key.clone(),
            Slot {
                generation,
                computation: computation.clone(),
            },
        );

        debug!("Started computation for {} (generation {})", key, generation);
        (computation, Role::Leader)
    }

    /// Number of keys with a computation currently running
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.lock().contains_key(key)
    }

    fn release(&self, key: &CacheKey, generation: u64) {
        let mut slots = self.lock();
        if slots.get(key).is_some_and(|slot| slot.generation == generation) {
            slots.remove(key);
            debug!("Released in-flight slot for {}", key);
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, Slot>> {
        // slots hold no invariant a panicking holder could break
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Frees a registry slot when dropped
pub struct SlotGuard {
    registry: Arc<InflightRegistry>,
    key: CacheKey,
    generation: u64,
}

impl SlotGuard {
    pub fn key(&self) -> &CacheKey {
        &self.key
    }
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.registry.release(&self.key, self.generation);
    }
}
