//! Submission flow.
//!
//! Ties a [`TaskSubmitter`] to a [`TaskPoller`]: a successful submission
//! hands its task to the poller, seeded with the status the service returned
//! so there is something to show before the first fetch lands.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::error::SubmissionError;
use crate::monitor::{TaskPoller, TaskSubmitter};
use crate::state::{StatusSnapshot, TaskId};

/// Submits tasks and tracks the latest one.
pub struct Tracker<T: TaskSubmitter> {
    /// Backend used for submissions
    submitter: Arc<T>,
    /// Poller for the latest submitted task
    poller: TaskPoller<T>,
    /// Message of the last failed submission
    submission_error: Option<String>,
    /// Set while a submission is in flight
    submitting: watch::Sender<bool>,
}

/// Clears the submitting flag when dropped, including when the submit
/// future is dropped mid-flight.
struct SubmittingGuard<'a>(&'a watch::Sender<bool>);

impl<'a> SubmittingGuard<'a> {
    fn raise(flag: &'a watch::Sender<bool>) -> Self {
        flag.send_replace(true);
        Self(flag)
    }
}

impl Drop for SubmittingGuard<'_> {
    fn drop(&mut self) {
        self.0.send_replace(false);
    }
}

impl<T: TaskSubmitter> Tracker<T> {
    pub fn new(submitter: Arc<T>, poll_interval: Duration) -> Self {
        let poller = TaskPoller::with_interval(Arc::clone(&submitter), poll_interval);

        Self {
            submitter,
            poller,
            submission_error: None,
            submitting: watch::Sender::new(false),
        }
    }

    /// Follow an already running task.
    pub fn watch(&mut self, task_id: TaskId) {
        self.poller.set_active(Some(task_id));
    }

    /// Drop the current task and any submission error.
    pub fn reset(&mut self) {
        self.submission_error = None;
        self.poller.set_active(None);
    }

    pub fn poller(&self) -> &TaskPoller<T> {
        &self.poller
    }

    pub fn submission_error(&self) -> Option<&str> {
        self.submission_error.as_deref()
    }

    /// Whether a submission is waiting for the service.
    pub fn is_submitting(&self) -> bool {
        *self.submitting.borrow()
    }

    /// Receiver for the submitting flag, usable while `submit` runs.
    pub fn watch_submitting(&self) -> watch::Receiver<bool> {
        self.submitting.subscribe()
    }
}

impl<T> Tracker<T>
where
    T: TaskSubmitter,
    T::Payload: Default,
{
    /// Submit a request and start tracking the task it creates.
    ///
    /// On failure the previous task, if any, keeps being tracked.
    pub async fn submit(&mut self, request: &T::Request) -> Result<TaskId, SubmissionError> {
        self.submission_error = None;

        let guard = SubmittingGuard::raise(&self.submitting);
        let submitted = self.submitter.submit(request).await;
        drop(guard);

        match submitted {
            Ok(init) => {
                let task_id = init.task_id.clone();
                info!(%task_id, status = %init.status, "task submitted");
                self.poller.start_seeded(StatusSnapshot::initial(init));
                Ok(task_id)
            }
            Err(err) => {
                warn!(error = %err, "submission failed");
                self.submission_error = Some(err.to_string());
                Err(err)
            }
        }
    }
}
