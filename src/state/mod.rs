//! Task state model.
//!
//! Types describing remote tasks and the observable state a poller exposes
//! about the one it is tracking.

mod poll;
mod task;

pub use poll::PollState;
pub use task::{StatusSnapshot, TaskId, TaskInit, TaskStatus};
