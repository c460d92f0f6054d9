//! Observable state of one polling session.

use chrono::{DateTime, Utc};

use super::task::{StatusSnapshot, TaskId};

/// What the poller currently knows about its task.
#[derive(Debug, Clone, PartialEq)]
pub struct PollState<R> {
    /// Session generation this state belongs to
    pub(crate) generation: u64,
    /// Identifier being observed, if any
    pub task_id: Option<TaskId>,
    /// Latest snapshot from a successful fetch (or the submission seed)
    pub snapshot: Option<StatusSnapshot<R>>,
    /// Latest transport failure, cleared by the next successful fetch
    pub poll_error: Option<String>,
    /// Whether the session loop is still scheduling fetches
    pub active: bool,
    /// Time of the last applied update
    pub last_update: Option<DateTime<Utc>>,
}

impl<R> PollState<R> {
    pub(crate) fn idle(generation: u64) -> Self {
        Self {
            generation,
            task_id: None,
            snapshot: None,
            poll_error: None,
            active: false,
            last_update: None,
        }
    }

    pub(crate) fn started(generation: u64, task_id: TaskId, seed: Option<StatusSnapshot<R>>) -> Self {
        Self {
            generation,
            task_id: Some(task_id),
            snapshot: seed,
            poll_error: None,
            active: true,
            last_update: Some(Utc::now()),
        }
    }

    /// Whether the last snapshot carries a terminal status.
    pub fn is_finished(&self) -> bool {
        self.snapshot.as_ref().is_some_and(StatusSnapshot::is_terminal)
    }

    pub(crate) fn apply_snapshot(&mut self, snapshot: StatusSnapshot<R>) -> bool {
        let terminal = snapshot.is_terminal();
        self.snapshot = Some(snapshot);
        self.poll_error = None;
        self.last_update = Some(Utc::now());
        if terminal {
            self.active = false;
        }
        terminal
    }

    pub(crate) fn apply_error(&mut self, message: String) {
        self.poll_error = Some(message);
        self.last_update = Some(Utc::now());
    }
}

impl<R> Default for PollState<R> {
    fn default() -> Self {
        Self::idle(0)
    }
}
