use std::sync::Arc;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use tokio::time::{self, Duration};

use predict_tracker::api::{ModelName, PredictRequest, PredictResults};
use predict_tracker::app::Tracker;
use predict_tracker::error::{SubmissionError, TransportError};
use predict_tracker::form::build_predict_payload;
use predict_tracker::monitor::{DemoBackend, StatusTransport, TaskSubmitter};
use predict_tracker::state::{StatusSnapshot, TaskId, TaskInit, TaskStatus};

const INTERVAL: Duration = Duration::from_millis(3000);

fn request() -> PredictRequest {
    build_predict_payload(
        "LeBron James, Stephen Curry",
        "2021-22, 2022-23",
        "2023-24",
        &[ModelName::RandomForest, ModelName::XGBoost],
    )
}

fn demo() -> Arc<DemoBackend> {
    Arc::new(
        DemoBackend::seeded(42)
            .with_latency(Duration::from_millis(50))
            .with_failure_rate(0.0),
    )
}

#[tokio::test(start_paused = true)]
async fn submission_seeds_snapshot_and_polls_to_completion() {
    let mut tracker = Tracker::new(demo(), INTERVAL);

    let task_id = tracker.submit(&request()).await.unwrap();

    let seeded = tracker.poller().latest_snapshot().unwrap();
    assert_eq!(seeded.task_id, task_id);
    assert_eq!(seeded.status, TaskStatus::Queued);
    assert!(seeded.payload.results.is_empty());
    assert_eq!(tracker.submission_error(), None);

    let mut rx = tracker.poller().subscribe();
    let finished = time::timeout(Duration::from_secs(120), rx.wait_for(|state| !state.active))
        .await
        .expect("task should finish")
        .unwrap()
        .clone();

    let snapshot = finished.snapshot.unwrap();
    assert_eq!(snapshot.status, TaskStatus::Done);
    assert_eq!(snapshot.payload.results.len(), 4);
    assert_eq!(finished.poll_error, None);
}

#[tokio::test(start_paused = true)]
async fn submitting_flag_covers_the_request() {
    let mut tracker = Tracker::new(demo(), INTERVAL);
    let mut submitting = tracker.watch_submitting();
    assert!(!tracker.is_submitting());

    let request = request();
    let (submitted, seen_in_flight) = tokio::join!(tracker.submit(&request), async {
        submitting.wait_for(|flag| *flag).await.is_ok()
    });

    submitted.unwrap();
    assert!(seen_in_flight);
    assert!(!tracker.is_submitting());
}

#[tokio::test(start_paused = true)]
async fn submitting_flag_drops_after_rejection() {
    let backend = Arc::new(DemoBackend::seeded(1).with_latency(Duration::ZERO));
    let mut tracker = Tracker::new(backend, INTERVAL);

    let empty = build_predict_payload("", "2022-23", "2023-24", &[ModelName::XGBoost]);
    assert!(tracker.submit(&empty).await.is_err());

    assert!(!tracker.is_submitting());
    assert_eq!(tracker.poller().task_id(), None);
}

#[tokio::test(start_paused = true)]
async fn watching_unknown_task_ends_not_found() {
    let mut tracker = Tracker::new(demo(), INTERVAL);

    tracker.watch(TaskId::new("never-submitted"));
    time::sleep(Duration::from_secs(1)).await;

    let state = tracker.poller().state();
    assert!(!state.active);
    assert_eq!(state.snapshot.unwrap().status, TaskStatus::NotFound);
}

#[tokio::test(start_paused = true)]
async fn reset_clears_everything() {
    let mut tracker = Tracker::new(demo(), INTERVAL);
    tracker.submit(&request()).await.unwrap();

    tracker.reset();

    let state = tracker.poller().state();
    assert_eq!(state.task_id, None);
    assert_eq!(state.snapshot, None);
    assert!(!tracker.poller().is_active());
}

/// Accepts the first submission, rejects every later one.
struct FlakySubmitter {
    inner: DemoBackend,
    accepted: std::sync::atomic::AtomicBool,
}

#[async_trait]
impl StatusTransport for FlakySubmitter {
    type Payload = PredictResults;

    async fn fetch_status(
        &self,
        task_id: &TaskId,
    ) -> Result<StatusSnapshot<PredictResults>, TransportError> {
        self.inner.fetch_status(task_id).await
    }
}

#[async_trait]
impl TaskSubmitter for FlakySubmitter {
    type Request = PredictRequest;

    async fn submit(&self, request: &PredictRequest) -> Result<TaskInit, SubmissionError> {
        if self
            .accepted
            .swap(true, std::sync::atomic::Ordering::SeqCst)
        {
            return Err(SubmissionError::Rejected("server busy".into()));
        }
        self.inner.submit(request).await
    }
}

#[tokio::test(start_paused = true)]
async fn failed_submission_keeps_previous_task() {
    let submitter = Arc::new(FlakySubmitter {
        inner: DemoBackend::seeded(5).with_latency(Duration::ZERO),
        accepted: Default::default(),
    });
    let mut tracker = Tracker::new(submitter, INTERVAL);

    let first = tracker.submit(&request()).await.unwrap();
    let err = tracker.submit(&request()).await.unwrap_err();

    assert!(matches!(err, SubmissionError::Rejected(_)));
    assert_eq!(tracker.submission_error(), Some("submission rejected: server busy"));
    assert_eq!(tracker.poller().task_id(), Some(first));
    assert!(tracker.poller().is_active());
}
