//! Simulated prediction backend.
//!
//! Keeps submitted tasks in memory and walks each one through
//! queued → running → done (or failed) over a random number of status
//! fetches, so the tracker can be exercised without a live service.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::Mutex;
use tokio::time::{self, Duration};
use tracing::debug;

use super::{StatusTransport, TaskSubmitter};
use crate::api::{Metrics, PlayerModelResult, PredictRequest, PredictResults};
use crate::error::{SubmissionError, TransportError};
use crate::state::{StatusSnapshot, TaskId, TaskInit, TaskStatus};

/// A task known to the simulated backend.
#[derive(Debug, Clone)]
struct DemoTask {
    request: PredictRequest,
    status: TaskStatus,
    /// Fetches left before the next status transition
    polls_left: u32,
    results: Vec<PlayerModelResult>,
    error: Option<String>,
}

#[derive(Debug)]
struct DemoState {
    tasks: HashMap<TaskId, DemoTask>,
    next_task_id: u64,
    rng: StdRng,
}

/// In-memory stand-in for the prediction service.
#[derive(Debug, Clone)]
pub struct DemoBackend {
    state: Arc<Mutex<DemoState>>,
    /// Simulated round-trip time per request
    latency: Duration,
    /// Chance that a finished task fails instead of completing
    failure_rate: f64,
}

impl DemoBackend {
    /// Create a demo backend with entropy-seeded randomness.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Create a demo backend with reproducible randomness.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            state: Arc::new(Mutex::new(DemoState {
                tasks: HashMap::new(),
                next_task_id: 1,
                rng,
            })),
            latency: Duration::from_millis(150),
            failure_rate: 0.1,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_failure_rate(mut self, failure_rate: f64) -> Self {
        self.failure_rate = failure_rate.clamp(0.0, 1.0);
        self
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            time::sleep(self.latency).await;
        }
    }
}

impl Default for DemoBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StatusTransport for DemoBackend {
    type Payload = PredictResults;

    async fn fetch_status(
        &self,
        task_id: &TaskId,
    ) -> Result<StatusSnapshot<PredictResults>, TransportError> {
        self.simulate_latency().await;

        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let Some(task) = state.tasks.get_mut(task_id) else {
            return Ok(StatusSnapshot {
                task_id: task_id.clone(),
                status: TaskStatus::NotFound,
                error: Some(format!("Task {task_id} not found")),
                payload: PredictResults::default(),
            });
        };

        advance(task, &mut state.rng, self.failure_rate);
        debug!(%task_id, status = %task.status, "demo task polled");

        Ok(StatusSnapshot {
            task_id: task_id.clone(),
            status: task.status.clone(),
            error: task.error.clone(),
            payload: PredictResults {
                results: task.results.clone(),
            },
        })
    }
}

#[async_trait]
impl TaskSubmitter for DemoBackend {
    type Request = PredictRequest;

    async fn submit(&self, request: &PredictRequest) -> Result<TaskInit, SubmissionError> {
        self.simulate_latency().await;

        if request.players.is_empty() || request.models.is_empty() {
            return Err(SubmissionError::Rejected(
                "at least one player and one model are required".to_string(),
            ));
        }

        let mut state = self.state.lock().await;
        let task_id = TaskId::new(format!("demo-{}", state.next_task_id));
        state.next_task_id += 1;

        let polls_left = state.rng.gen_range(1..3);
        state.tasks.insert(
            task_id.clone(),
            DemoTask {
                request: request.clone(),
                status: TaskStatus::Queued,
                polls_left,
                results: Vec::new(),
                error: None,
            },
        );

        Ok(TaskInit {
            task_id,
            status: TaskStatus::Queued,
        })
    }
}

/// Move a task one fetch further along its lifecycle.
fn advance(task: &mut DemoTask, rng: &mut StdRng, failure_rate: f64) {
    if task.status.is_terminal() {
        return;
    }
    if task.polls_left > 0 {
        task.polls_left -= 1;
        return;
    }

    match task.status {
        TaskStatus::Queued => {
            task.status = TaskStatus::Running;
            task.polls_left = rng.gen_range(2..5);
        }
        _ if rng.gen_bool(failure_rate) => {
            task.status = TaskStatus::Failed;
            task.error = Some("Model training failed: not enough games in training seasons".into());
        }
        _ => {
            task.results = simulated_results(&task.request, rng);
            task.status = TaskStatus::Done;
        }
    }
}

fn simulated_results(request: &PredictRequest, rng: &mut StdRng) -> Vec<PlayerModelResult> {
    let mut results = Vec::with_capacity(request.players.len() * request.models.len());

    for player in &request.players {
        let baseline_mae = rng.gen_range(4.5..7.5);
        for model in &request.models {
            let mae: f64 = baseline_mae - rng.gen_range(0.2..1.5);
            results.push(PlayerModelResult {
                player: player.clone(),
                model: model.to_string(),
                train_seasons: request.train_seasons.clone(),
                test_season: request.test_season.clone(),
                metrics: Metrics {
                    mae,
                    r2: rng.gen_range(0.2..0.8),
                    baseline_mae,
                },
            });
        }
    }

    results
}
