//! Monitoring components for tracking remote prediction tasks.
//!
//! This module provides the polling engine that follows one task through its
//! lifecycle, along with the capabilities it needs from a backend:
//!
//! - Fetching a task's current status ([`StatusTransport`])
//! - Starting a new task ([`TaskSubmitter`])
//! - A simulated backend for offline runs ([`DemoBackend`])

pub mod demo;
pub mod poller;

pub use demo::DemoBackend;
pub use poller::TaskPoller;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{SubmissionError, TransportError};
use crate::state::{StatusSnapshot, TaskId, TaskInit};

/// Default polling interval for task status.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(3000);

/// Fetches the current status of a task.
///
/// Implementations may be slow or fail; the poller turns any failure into a
/// poll error and tries again on the next tick.
#[async_trait]
pub trait StatusTransport: Send + Sync + 'static {
    /// Result payload carried by snapshots of this kind of task.
    type Payload: Clone + Send + Sync + 'static;

    async fn fetch_status(
        &self,
        task_id: &TaskId,
    ) -> Result<StatusSnapshot<Self::Payload>, TransportError>;
}

/// Starts new tasks on a backend that can also report their status.
#[async_trait]
pub trait TaskSubmitter: StatusTransport {
    type Request: Send + Sync;

    async fn submit(&self, request: &Self::Request) -> Result<TaskInit, SubmissionError>;
}
