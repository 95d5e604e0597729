use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

use crate::broker::task::{Task, TaskId};

/// A task handed to a worker, awaiting acknowledgment.
#[derive(Debug, Clone)]
pub struct Lease {
    pub task: Task,
    pub assigned_at: Instant,
    pub expires_at: Instant,
}

impl Lease {
    pub fn new(task: Task, assigned_at: Instant, ttl: Duration) -> Self {
        Self {
            task,
            assigned_at,
            expires_at: assigned_at + ttl,
        }
    }

    /// Whether the lease has run out at `now`. Expiry is inclusive: a lease
    /// inspected exactly at its deadline is already reclaimable.
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// In-flight leases in assignment order.
///
/// Keyed by a monotonically increasing sequence number, so iteration order is
/// assignment order. Every lease carries the same TTL, which makes assignment
/// order also expiry order: the front entry is always the next to expire, and
/// an expiry scan can stop at the first live lease it meets. Removal by task
/// id goes through a secondary index and works the same for the head, an
/// interior entry, or the tail.
#[derive(Debug, Default)]
pub struct LeaseTable {
    leases: BTreeMap<u64, Lease>,
    index: HashMap<TaskId, u64>,
    next_seq: u64,
}

impl LeaseTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new lease at the tail of the table. The id must not hold a
    /// lease already; a duplicate would strand the older entry.
    pub fn add(&mut self, task: Task, assigned_at: Instant, ttl: Duration) {
        debug_assert!(
            !self.index.contains_key(&task.id),
            "task {} already holds a lease",
            task.id
        );
        let seq = self.next_seq;
        self.next_seq += 1;
        self.index.insert(task.id, seq);
        self.leases.insert(seq, Lease::new(task, assigned_at, ttl));
    }

    /// Unlink and return the lease for `id`, wherever it sits in the table.
    pub fn remove(&mut self, id: TaskId) -> Option<Lease> {
        let seq = self.index.remove(&id)?;
        self.leases.remove(&seq)
    }

    pub fn get(&self, id: TaskId) -> Option<&Lease> {
        let seq = self.index.get(&id)?;
        self.leases.get(seq)
    }

    /// The oldest lease, i.e. the next one to expire.
    pub fn front(&self) -> Option<&Lease> {
        self.leases.first_key_value().map(|(_, lease)| lease)
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.index.contains_key(&id)
    }

    /// Iterate leases in assignment order.
    pub fn iter(&self) -> impl Iterator<Item = &Lease> {
        self.leases.values()
    }

    pub fn len(&self) -> usize {
        self.leases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leases.is_empty()
    }
}
