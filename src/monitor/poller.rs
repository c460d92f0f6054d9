//! Task status polling.
//!
//! A [`TaskPoller`] follows at most one task at a time. Every start opens a
//! new session with its own generation number and cancellation token; the
//! session loop fetches immediately, then once per interval until it sees a
//! terminal status or is cancelled. Results are applied under the state lock
//! and only when the state still belongs to the session's generation, so a
//! fetch that resolves after a retarget never touches the new session.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration};
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{StatusTransport, DEFAULT_POLL_INTERVAL};
use crate::error::TransportError;
use crate::state::{PollState, StatusSnapshot, TaskId, TaskStatus};

const FALLBACK_POLL_ERROR: &str = "Failed to fetch task status.";

type StateSender<R> = Arc<watch::Sender<PollState<R>>>;

/// A live polling session.
struct Session {
    task_id: TaskId,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Polls a [`StatusTransport`] for one task at a time.
///
/// Must be used from within a tokio runtime. Dropping the poller cancels
/// its session.
pub struct TaskPoller<T: StatusTransport> {
    /// Status source
    transport: Arc<T>,
    /// Delay between the end of one fetch and the start of the next
    interval: Duration,
    /// Observable state
    state: StateSender<T::Payload>,
    /// Generation of the current state
    generation: u64,
    /// Current session, if one was started
    session: Option<Session>,
}

impl<T: StatusTransport> TaskPoller<T> {
    /// Create a poller with the default interval.
    pub fn new(transport: Arc<T>) -> Self {
        Self::with_interval(transport, DEFAULT_POLL_INTERVAL)
    }

    /// Create a poller with a custom interval. The interval must be non-zero.
    pub fn with_interval(transport: Arc<T>, interval: Duration) -> Self {
        let (tx, _rx) = watch::channel(PollState::default());

        Self {
            transport,
            interval,
            state: Arc::new(tx),
            generation: 0,
            session: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Point the poller at a task, or at nothing.
    ///
    /// `None` stops polling and clears the snapshot and poll error. Passing
    /// the identifier of the current session keeps that session as it is.
    pub fn set_active(&mut self, task_id: Option<TaskId>) {
        match task_id {
            Some(id) if self.session_task_id() == Some(&id) => {}
            Some(id) => self.start(id),
            None => self.clear(),
        }
    }

    /// Start polling `task_id`, replacing any current session.
    ///
    /// Always fetches again, even when `task_id` already reached a terminal
    /// status in the current session. Use [`set_active`](Self::set_active)
    /// to leave a finished task alone.
    pub fn start(&mut self, task_id: TaskId) {
        self.launch(task_id, None);
    }

    /// Start polling the task described by `seed`, showing `seed` as the
    /// snapshot until the first fetch completes.
    pub fn start_seeded(&mut self, seed: StatusSnapshot<T::Payload>) {
        let task_id = seed.task_id.clone();
        self.launch(task_id, Some(seed));
    }

    /// Stop polling. The last snapshot and poll error stay observable.
    pub fn stop(&mut self) {
        if let Some(task_id) = self.session_task_id() {
            info!(%task_id, "stopped polling");
        }
        self.cancel_session();
        let generation = self.next_generation();
        self.state.send_if_modified(|state| {
            state.generation = generation;
            std::mem::replace(&mut state.active, false)
        });
    }

    /// Current state.
    pub fn state(&self) -> PollState<T::Payload> {
        self.state.borrow().clone()
    }

    pub fn latest_snapshot(&self) -> Option<StatusSnapshot<T::Payload>> {
        self.state.borrow().snapshot.clone()
    }

    pub fn latest_poll_error(&self) -> Option<String> {
        self.state.borrow().poll_error.clone()
    }

    pub fn task_id(&self) -> Option<TaskId> {
        self.state.borrow().task_id.clone()
    }

    /// Whether the current session is still scheduling fetches.
    pub fn is_active(&self) -> bool {
        self.state.borrow().active
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<PollState<T::Payload>> {
        self.state.subscribe()
    }

    /// Stream of states, starting with the current one.
    pub fn updates(&self) -> WatchStream<PollState<T::Payload>> {
        WatchStream::new(self.subscribe())
    }

    fn session_task_id(&self) -> Option<&TaskId> {
        self.session.as_ref().map(|session| &session.task_id)
    }

    fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    fn launch(&mut self, task_id: TaskId, seed: Option<StatusSnapshot<T::Payload>>) {
        self.cancel_session();
        let generation = self.next_generation();
        self.state
            .send_replace(PollState::started(generation, task_id.clone(), seed));

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_session(
            Arc::clone(&self.transport),
            Arc::clone(&self.state),
            generation,
            task_id.clone(),
            self.interval,
            cancel.clone(),
        ));

        info!(%task_id, generation, "started polling");
        self.session = Some(Session {
            task_id,
            cancel,
            handle,
        });
    }

    fn clear(&mut self) {
        if let Some(task_id) = self.session_task_id() {
            info!(%task_id, "stopped polling, state cleared");
        }
        self.cancel_session();
        let generation = self.next_generation();
        self.state.send_replace(PollState::idle(generation));
    }

    fn cancel_session(&mut self) {
        if let Some(session) = self.session.take() {
            if !session.handle.is_finished() {
                debug!(task_id = %session.task_id, "cancelling polling session");
            }
            session.cancel.cancel();
        }
    }
}

impl<T: StatusTransport> Drop for TaskPoller<T> {
    fn drop(&mut self) {
        if let Some(session) = &self.session {
            session.cancel.cancel();
        }
    }
}

/// What happened to a fetch result.
#[derive(Debug, PartialEq)]
enum Applied {
    /// The session was superseded; nothing changed
    Stale,
    /// Snapshot applied, keep polling
    Pending(TaskStatus),
    /// Snapshot applied, the task is finished
    Terminal(TaskStatus),
    /// Poll error recorded
    Failed(String),
}

async fn run_session<T: StatusTransport>(
    transport: Arc<T>,
    state: StateSender<T::Payload>,
    generation: u64,
    task_id: TaskId,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut warned_unknown = false;

    loop {
        debug!(%task_id, "fetching task status");
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            outcome = transport.fetch_status(&task_id) => outcome,
        };

        match apply_outcome(&state, generation, outcome) {
            Applied::Stale => {
                debug!(%task_id, generation, "discarding stale status");
                break;
            }
            Applied::Terminal(status) => {
                info!(%task_id, %status, "task reached terminal status");
                break;
            }
            Applied::Pending(status) => {
                if !status.is_recognized() && !warned_unknown {
                    warn!(%task_id, %status, "unrecognized task status, continuing to poll");
                    warned_unknown = true;
                }
            }
            Applied::Failed(message) => {
                warn!(%task_id, error = %message, "status fetch failed, retrying next tick");
            }
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = time::sleep(interval) => {}
        }
    }

    debug!(%task_id, generation, "polling session ended");
}

fn apply_outcome<R>(
    state: &watch::Sender<PollState<R>>,
    generation: u64,
    outcome: Result<StatusSnapshot<R>, TransportError>,
) -> Applied {
    let mut applied = Applied::Stale;

    state.send_if_modified(|current| {
        if current.generation != generation {
            return false;
        }
        applied = match outcome {
            Ok(snapshot) => {
                let status = snapshot.status.clone();
                if current.apply_snapshot(snapshot) {
                    Applied::Terminal(status)
                } else {
                    Applied::Pending(status)
                }
            }
            Err(err) => {
                let message = match err.message().trim() {
                    "" => FALLBACK_POLL_ERROR.to_string(),
                    _ => err.message().to_string(),
                };
                current.apply_error(message.clone());
                Applied::Failed(message)
            }
        };
        true
    });

    applied
}
