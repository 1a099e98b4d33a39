//! Result caching and call coalescing for asynchronous rules.
//!
//! Each async rule attachment owns one [`AsyncCache`] keyed by the string
//! coercion of the validated value, and one [`Debouncer`] that keeps at most
//! one pending timer alive. The cache is unbounded for the lifetime of the
//! field; keys are bounded by distinct user-entered values.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use dashmap::DashMap;
use log::trace;
use tokio::task::JoinHandle;

/// State of one value's asynchronous check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheEntry {
    /// `None` while the check is in flight, the verdict once resolved.
    pub is_valid: Option<bool>,
    /// Message delivered with the verdict, if any.
    pub message: Option<String>,
}

impl CacheEntry {
    /// Placeholder written when a dispatch fires.
    pub fn pending() -> Self {
        Self::default()
    }

    /// Entry holding a resolved verdict.
    pub fn resolved(is_valid: bool, message: Option<String>) -> Self {
        Self {
            is_valid: Some(is_valid),
            message,
        }
    }

    /// `true` once a verdict has been stored.
    pub fn is_resolved(&self) -> bool {
        self.is_valid.is_some()
    }
}

/// Concurrent map from value keys to check states.
///
/// Cheap to clone; all clones share the same store, so the dispatch task and
/// the validation pass see the same entries.
#[derive(Debug, Clone, Default)]
pub struct AsyncCache {
    store: Arc<DashMap<String, CacheEntry>>,
}

impl AsyncCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the entry for a value key.
    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        self.store.get(key).map(|entry| entry.value().clone())
    }

    /// Store an entry for a value key.
    pub fn insert(&self, key: impl Into<String>, entry: CacheEntry) {
        self.store.insert(key.into(), entry);
    }

    /// Drop the entry for a value key.
    pub fn remove(&self, key: &str) {
        self.store.remove(key);
    }

    /// Number of entries, pending ones included.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// `true` when no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.store.clear();
    }
}

/// Coalesces rapid validation triggers into a single deferred dispatch.
///
/// Scheduling aborts and replaces any prior pending timer, so only the last
/// call within the delay window actually fires, carrying that call's value.
/// Must be used inside a Tokio runtime.
#[derive(Debug, Default)]
pub struct Debouncer {
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    /// Create a debouncer with no pending timer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the pending timer with one that runs `dispatch` after `delay`.
    pub fn schedule<F>(&self, delay: Duration, dispatch: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = pending.take() {
            trace!("debounce: superseding pending dispatch");
            handle.abort();
        }
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            dispatch();
        }));
    }

    /// Abort the pending timer, if any.
    pub fn cancel(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = pending.take() {
            handle.abort();
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
