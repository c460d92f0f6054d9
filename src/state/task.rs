//! Task status and snapshot types.
//!
//! Describes a remote task the way the prediction service reports it.

use serde::{Deserialize, Serialize};

/// Opaque identifier naming one remote task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Task status.
///
/// Statuses the service may add later land in [`TaskStatus::Other`] and are
/// treated as non-terminal: polling keeps going rather than stopping on a
/// value it cannot classify.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskStatus {
    Queued,
    Running,
    Done,
    Failed,
    NotFound,
    Other(String),
}

impl TaskStatus {
    const TERMINAL: [TaskStatus; 3] = [TaskStatus::Done, TaskStatus::Failed, TaskStatus::NotFound];

    pub fn is_terminal(&self) -> bool {
        Self::TERMINAL.contains(self)
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, TaskStatus::Other(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            TaskStatus::Queued => "queued",
            TaskStatus::Running => "running",
            TaskStatus::Done => "done",
            TaskStatus::Failed => "failed",
            TaskStatus::NotFound => "not found",
            TaskStatus::Other(status) => status,
        }
    }
}

impl From<String> for TaskStatus {
    fn from(status: String) -> Self {
        match status.as_str() {
            "queued" => TaskStatus::Queued,
            "running" => TaskStatus::Running,
            "done" => TaskStatus::Done,
            "failed" => TaskStatus::Failed,
            "not found" | "not_found" => TaskStatus::NotFound,
            _ => TaskStatus::Other(status),
        }
    }
}

impl From<TaskStatus> for String {
    fn from(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Other(status) => status,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response to a successful submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskInit {
    pub task_id: TaskId,
    pub status: TaskStatus,
}

/// Latest known state of a task.
///
/// The payload's fields sit next to `task_id` and `status` in the response
/// body, so it is flattened on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot<R> {
    pub task_id: TaskId,
    pub status: TaskStatus,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(flatten)]
    pub payload: R,
}

impl<R: Default> StatusSnapshot<R> {
    /// Snapshot shown between submission and the first poll.
    pub fn initial(init: TaskInit) -> Self {
        Self {
            task_id: init.task_id,
            status: init.status,
            error: None,
            payload: R::default(),
        }
    }
}

impl<R> StatusSnapshot<R> {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
