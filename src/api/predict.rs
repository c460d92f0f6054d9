//! Season-level model comparison: `POST /predict`, `GET /results/{id}`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{ApiClient, ModelName};
use crate::error::{SubmissionError, TransportError};
use crate::monitor::{StatusTransport, TaskSubmitter};
use crate::state::{StatusSnapshot, TaskId, TaskInit};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictRequest {
    pub players: Vec<String>,
    pub train_seasons: Vec<String>,
    pub test_season: String,
    pub models: Vec<ModelName>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    #[serde(rename = "MAE")]
    pub mae: f64,
    #[serde(rename = "R2")]
    pub r2: f64,
    #[serde(rename = "Baseline_MAE")]
    pub baseline_mae: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerModelResult {
    pub player: String,
    pub model: String,
    pub train_seasons: Vec<String>,
    pub test_season: String,
    pub metrics: Metrics,
}

/// Result payload of a `/results` snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictResults {
    #[serde(default)]
    pub results: Vec<PlayerModelResult>,
}

/// `/predict` endpoints of the service.
#[derive(Debug, Clone)]
pub struct PredictApi {
    client: ApiClient,
}

impl PredictApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StatusTransport for PredictApi {
    type Payload = PredictResults;

    async fn fetch_status(
        &self,
        task_id: &TaskId,
    ) -> Result<StatusSnapshot<PredictResults>, TransportError> {
        Ok(self.client.get_json(&format!("/results/{task_id}")).await?)
    }
}

#[async_trait]
impl TaskSubmitter for PredictApi {
    type Request = PredictRequest;

    async fn submit(&self, request: &PredictRequest) -> Result<TaskInit, SubmissionError> {
        Ok(self.client.post_json("/predict", request).await?)
    }
}
