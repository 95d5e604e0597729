use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::broker::lease::{Lease, LeaseTable};
use crate::broker::queue::ReadyQueue;
use crate::broker::task::{Task, TaskId};

/// Where a known task currently lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Waiting in the ready queue.
    Queued,
    /// Handed to a worker, lease running.
    Leased,
    /// Acknowledged; the task will never be handed out again.
    Done,
}

/// Queue depth snapshot for logging and status output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerStatus {
    pub ready: usize,
    pub leased: usize,
    pub completed: usize,
}

/// Hands out tasks under time-limited leases and takes them back.
///
/// The broker exclusively owns one [`ReadyQueue`] and one [`LeaseTable`];
/// a task id lives in at most one of them at a time, tracked by the state
/// registry. All operations are synchronous and in-memory. Callers share the
/// broker behind a lock and pass in the current instant, so expiry behavior
/// is fully deterministic under test.
#[derive(Debug)]
pub struct TaskBroker {
    ready: ReadyQueue,
    leases: LeaseTable,
    states: HashMap<TaskId, TaskState>,
    lease_ttl: Duration,
}

impl TaskBroker {
    pub fn new(lease_ttl: Duration) -> Self {
        Self {
            ready: ReadyQueue::new(),
            leases: LeaseTable::new(),
            states: HashMap::new(),
            lease_ttl,
        }
    }

    /// Append a task to the ready queue. Returns false when the id is
    /// already known (queued, leased, or done); duplicates are dropped,
    /// not merged.
    pub fn enqueue(&mut self, task: Task) -> bool {
        if self.states.contains_key(&task.id) {
            tracing::warn!(task_id = %task.id, "Duplicate task id rejected");
            return false;
        }
        self.states.insert(task.id, TaskState::Queued);
        self.ready.push_back(task);
        true
    }

    /// Move the head of the ready queue into a lease stamped at `now` and
    /// hand the task out. `None` when no work is waiting.
    pub fn dequeue(&mut self, now: Instant) -> Option<Task> {
        let task = self.ready.take_head()?;
        self.states.insert(task.id, TaskState::Leased);
        self.leases.add(task.clone(), now, self.lease_ttl);
        tracing::debug!(task_id = %task.id, "Task leased");
        Some(task)
    }

    /// Permanently retire a leased task. Returns false when `id` holds no
    /// lease: a late or duplicate acknowledgment, expected whenever a slow
    /// worker finishes after the sweeper already reclaimed its task.
    pub fn acknowledge(&mut self, id: TaskId) -> bool {
        match self.leases.remove(id) {
            Some(_) => {
                self.states.insert(id, TaskState::Done);
                tracing::debug!(task_id = %id, "Task acknowledged");
                true
            }
            None => {
                tracing::warn!(task_id = %id, "Acknowledge for task with no active lease");
                false
            }
        }
    }

    /// Take a leased task back and put it at the head of the ready queue.
    /// Returns false when `id` holds no lease; nothing is mutated then.
    pub fn requeue(&mut self, id: TaskId) -> bool {
        match self.leases.remove(id) {
            Some(lease) => {
                self.states.insert(id, TaskState::Queued);
                self.ready.push_front(lease.task);
                tracing::debug!(task_id = %id, "Task requeued");
                true
            }
            None => {
                tracing::warn!(task_id = %id, "Requeue for task with no active lease");
                false
            }
        }
    }

    /// Reclaim every lease that has expired at `now`.
    ///
    /// Leases expire in assignment order, so the scan pops the front of the
    /// table until it meets a live lease. Reclaimed tasks go back to the head
    /// of the ready queue one at a time; no task is dropped or duplicated
    /// here. Returns the number reclaimed.
    pub fn recover_expired(&mut self, now: Instant) -> usize {
        let mut recovered = 0;
        while let Some(front) = self.leases.front() {
            if !front.is_expired(now) {
                break;
            }
            let id = front.task.id;
            tracing::debug!(task_id = %id, "Lease expired, reclaiming");
            if !self.requeue(id) {
                break;
            }
            recovered += 1;
        }
        if recovered > 0 {
            tracing::info!(recovered, "Recovered expired leases");
        }
        recovered
    }

    pub fn status(&self) -> BrokerStatus {
        BrokerStatus {
            ready: self.ready.len(),
            leased: self.leases.len(),
            completed: self
                .states
                .values()
                .filter(|s| **s == TaskState::Done)
                .count(),
        }
    }

    /// True once no task is queued or leased. Completed work stays in the
    /// registry, so a drained broker still answers `state_of` queries.
    pub fn is_drained(&self) -> bool {
        self.ready.is_empty() && self.leases.is_empty()
    }

    pub fn state_of(&self, id: TaskId) -> Option<TaskState> {
        self.states.get(&id).copied()
    }

    pub fn lease_of(&self, id: TaskId) -> Option<&Lease> {
        self.leases.get(id)
    }

    pub fn ready(&self) -> &ReadyQueue {
        &self.ready
    }

    pub fn leases(&self) -> &LeaseTable {
        &self.leases
    }

    pub fn lease_ttl(&self) -> Duration {
        self.lease_ttl
    }
}
