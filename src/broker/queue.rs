use std::collections::VecDeque;

use crate::broker::task::{Task, TaskId};

/// FIFO of tasks awaiting assignment.
///
/// New work enters at the tail and leaves from the head. `push_front` exists
/// only for lease recovery: a reclaimed task has already waited out a full
/// lease, so it outranks everything still queued.
#[derive(Debug, Default)]
pub struct ReadyQueue {
    tasks: VecDeque<Task>,
}

impl ReadyQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a task at the tail.
    pub fn push_back(&mut self, task: Task) {
        self.tasks.push_back(task);
    }

    /// Remove and return the head task. `None` means no work is waiting,
    /// the normal steady state once the backlog drains.
    pub fn take_head(&mut self) -> Option<Task> {
        self.tasks.pop_front()
    }

    /// Insert a task at the head, ahead of never-assigned work.
    pub fn push_front(&mut self, task: Task) {
        self.tasks.push_front(task);
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.tasks.iter().any(|t| t.id == id)
    }

    /// Iterate front to back, i.e. in assignment order.
    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
