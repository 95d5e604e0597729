use serde::{Deserialize, Serialize};

/// Ordinal task identifier, assigned in source order at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(u64);

impl TaskId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A unit of work handed out to volunteer workers.
///
/// The payload is opaque to the broker; only the worker edge interprets it.
/// For Mersenne candidate checks the loader produces `{"exponent": p}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub payload: serde_json::Value,
}

impl Task {
    pub fn new(id: TaskId, payload: serde_json::Value) -> Self {
        Self { id, payload }
    }
}
