//! Ordered container of one client's scheduled requests

use std::collections::{BTreeMap, HashMap};

use super::priority::Priority;
use super::request::RequestId;

/// Sort key for queued requests
///
/// Orders by priority (most urgent first), then intra-priority descending,
/// then insertion sequence ascending so equal-priority requests drain FIFO.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct QueueKey {
    priority: Priority,
    intra_priority: i32,
    seq: u64,
}

impl QueueKey {
    pub fn new(priority: Priority, intra_priority: i32, seq: u64) -> Self {
        Self {
            priority,
            intra_priority,
            seq,
        }
    }
}

impl Ord for QueueKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Priority's discriminant is already "lower = more urgent"
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.intra_priority.cmp(&self.intra_priority))
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for QueueKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Ordered multiset of requests belonging to one client
///
/// Holds both deferred and admitted requests; admission state lives on the
/// request itself. Removal is keyed by request id so it stays cheap during
/// re-scans.
#[derive(Debug, Default)]
pub(crate) struct RequestQueue {
    entries: BTreeMap<QueueKey, RequestId>,
    keys: HashMap<RequestId, QueueKey>,
}

impl RequestQueue {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            keys: HashMap::new(),
        }
    }

    /// Insert a request under its sort key
    pub fn insert(&mut self, id: RequestId, key: QueueKey) {
        self.entries.insert(key, id);
        self.keys.insert(id, key);
    }

    /// Remove a request; returns false if it was not queued
    pub fn remove(&mut self, id: RequestId) -> bool {
        match self.keys.remove(&id) {
            Some(key) => {
                self.entries.remove(&key);
                true
            }
            None => false,
        }
    }

    /// Move a request to a new sort key (priority change)
    pub fn reinsert(&mut self, id: RequestId, key: QueueKey) {
        self.remove(id);
        self.insert(id, key);
    }

    pub fn contains(&self, id: RequestId) -> bool {
        self.keys.contains_key(&id)
    }

    /// Request ids in admission order
    pub fn ids(&self) -> impl Iterator<Item = RequestId> + '_ {
        self.entries.values().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
