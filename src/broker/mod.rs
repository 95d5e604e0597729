//! Lease-based task distribution core.
//!
//! Three pieces cooperate here:
//! - [`ReadyQueue`]: FIFO of tasks awaiting assignment
//! - [`LeaseTable`]: in-flight tasks with expiry deadlines, in assignment order
//! - [`TaskBroker`]: the facade owning both and enforcing their invariants
//!
//! Tasks move ready -> leased on [`TaskBroker::dequeue`], leased -> done on
//! [`TaskBroker::acknowledge`], and leased -> ready (at the head) on
//! [`TaskBroker::requeue`] or lease expiry.

pub mod dispatch;
pub mod lease;
pub mod queue;
pub mod task;

pub use dispatch::{BrokerStatus, TaskBroker, TaskState};
pub use lease::{Lease, LeaseTable};
pub use queue::ReadyQueue;
pub use task::{Task, TaskId};
