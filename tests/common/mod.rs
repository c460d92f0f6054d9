//! Shared test fixtures.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::time::{self, Duration, Instant};

use predict_tracker::error::TransportError;
use predict_tracker::monitor::StatusTransport;
use predict_tracker::state::{StatusSnapshot, TaskId, TaskStatus};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestResults {
    pub results: Vec<String>,
}

pub fn snapshot(task_id: &str, status: TaskStatus) -> StatusSnapshot<TestResults> {
    StatusSnapshot {
        task_id: TaskId::new(task_id),
        status,
        error: None,
        payload: TestResults::default(),
    }
}

pub fn done(task_id: &str, results: &[&str]) -> StatusSnapshot<TestResults> {
    StatusSnapshot {
        payload: TestResults {
            results: results.iter().map(|r| r.to_string()).collect(),
        },
        ..snapshot(task_id, TaskStatus::Done)
    }
}

/// One scripted response.
#[derive(Debug, Clone)]
pub enum Step {
    Reply(StatusSnapshot<TestResults>),
    Fail(String),
    /// Wait before producing the inner step
    Delayed(Duration, Box<Step>),
}

impl Step {
    pub fn status(task_id: &str, status: TaskStatus) -> Self {
        Step::Reply(snapshot(task_id, status))
    }

    pub fn after(self, delay: Duration) -> Self {
        Step::Delayed(delay, Box::new(self))
    }
}

/// Transport answering from per-task scripts. The last step of a script
/// repeats once the others are used up.
#[derive(Default)]
pub struct ScriptedTransport {
    scripts: Mutex<HashMap<TaskId, VecDeque<Step>>>,
    calls: Mutex<Vec<(TaskId, Instant)>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, task_id: &str, steps: Vec<Step>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(TaskId::new(task_id), steps.into());
        self
    }

    pub fn calls(&self) -> Vec<(TaskId, Instant)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, task_id: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| id.as_str() == task_id)
            .count()
    }

    fn next_step(&self, task_id: &TaskId) -> Step {
        let mut scripts = self.scripts.lock().unwrap();
        match scripts.get_mut(task_id) {
            Some(steps) if steps.len() > 1 => steps.pop_front().unwrap(),
            Some(steps) => steps.front().cloned().unwrap(),
            None => Step::Fail(format!("no script for {task_id}")),
        }
    }
}

#[async_trait]
impl StatusTransport for ScriptedTransport {
    type Payload = TestResults;

    async fn fetch_status(
        &self,
        task_id: &TaskId,
    ) -> Result<StatusSnapshot<TestResults>, TransportError> {
        self.calls
            .lock()
            .unwrap()
            .push((task_id.clone(), Instant::now()));

        let mut step = self.next_step(task_id);
        loop {
            match step {
                Step::Reply(snapshot) => return Ok(snapshot),
                Step::Fail(message) => return Err(TransportError::new(message)),
                Step::Delayed(delay, inner) => {
                    time::sleep(delay).await;
                    step = *inner;
                }
            }
        }
    }
}
