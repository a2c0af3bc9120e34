//! Listener registry
//!
//! The registry is shared between one or more receive threads and any
//! thread that registers or removes listeners. Writers rebuild the entry
//! list and swap it in atomically; a dispatch in progress keeps iterating
//! the snapshot it started with and never takes a lock per listener, so
//! unrelated dispatches are never serialized against each other.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use oscine_core::{Pattern, Result};
use parking_lot::RwLock;

use crate::dispatcher::MessageListener;

/// Handle identifying one registration, returned by
/// [`ListenerRegistry::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// One (selector, listener) pair.
pub(crate) struct Registration {
    pub(crate) id: ListenerId,
    pub(crate) pattern: Pattern,
    pub(crate) listener: Arc<dyn MessageListener>,
}

/// Insertion-ordered listener registry with snapshot-swap concurrency.
pub struct ListenerRegistry {
    entries: RwLock<Arc<Vec<Registration>>>,
    next_id: AtomicU64,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Arc::new(Vec::new())),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a listener under a pattern. The pattern is compiled here;
    /// malformed syntax is rejected now, never during a later dispatch.
    pub fn add(&self, pattern: &str, listener: Arc<dyn MessageListener>) -> Result<ListenerId> {
        let pattern = Pattern::compile(pattern)?;
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));

        let mut entries = self.entries.write();
        let mut next: Vec<Registration> = Vec::with_capacity(entries.len() + 1);
        next.extend(entries.iter().map(Registration::clone_entry));
        next.push(Registration {
            id,
            pattern,
            listener,
        });
        *entries = Arc::new(next);
        Ok(id)
    }

    /// Remove one registration by handle. No-op if absent.
    pub fn remove(&self, id: ListenerId) -> bool {
        self.retain(|entry| entry.id != id)
    }

    /// Remove every registration under the given pattern string, returning
    /// how many were dropped. No-op if none match.
    pub fn remove_pattern(&self, pattern: &str) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        let next: Vec<Registration> = entries
            .iter()
            .filter(|e| e.pattern.as_str() != pattern)
            .map(Registration::clone_entry)
            .collect();
        let removed = before - next.len();
        if removed > 0 {
            *entries = Arc::new(next);
        }
        removed
    }

    /// Drop all registrations.
    pub fn clear(&self) {
        *self.entries.write() = Arc::new(Vec::new());
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// The current consistent view, in registration order.
    pub(crate) fn snapshot(&self) -> Arc<Vec<Registration>> {
        self.entries.read().clone()
    }

    fn retain(&self, keep: impl Fn(&Registration) -> bool) -> bool {
        let mut entries = self.entries.write();
        let next: Vec<Registration> = entries
            .iter()
            .filter(|e| keep(e))
            .map(Registration::clone_entry)
            .collect();
        let changed = next.len() != entries.len();
        if changed {
            *entries = Arc::new(next);
        }
        changed
    }
}

impl Registration {
    fn clone_entry(&self) -> Self {
        Self {
            id: self.id,
            pattern: self.pattern.clone(),
            listener: Arc::clone(&self.listener),
        }
    }
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
