//! Next-game point predictions: `POST /predict-next`, `GET /next-results/{id}`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{ApiClient, ModelName};
use crate::error::{SubmissionError, TransportError};
use crate::monitor::{StatusTransport, TaskSubmitter};
use crate::state::{StatusSnapshot, TaskId, TaskInit};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HomeAway {
    Home,
    Away,
}

/// One upcoming game. Optional fields are left out of the body entirely
/// when unset; the service treats an absent field differently from `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextGameInput {
    pub player: String,
    pub opponent: String,
    pub game_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_away: Option<HomeAway>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vegas_total: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vegas_spread: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictNextRequest {
    pub train_seasons: Vec<String>,
    pub season: String,
    pub models: Vec<ModelName>,
    pub games: Vec<NextGameInput>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextGamePrediction {
    pub player: String,
    pub model: String,
    #[serde(default)]
    pub opponent: Option<String>,
    #[serde(default)]
    pub game_date: Option<String>,
    #[serde(default)]
    pub predicted_pts: Option<f64>,
    #[serde(default)]
    pub model_predicted_pts: Option<f64>,
    #[serde(default)]
    pub vegas_total: Option<f64>,
    #[serde(default)]
    pub vegas_spread: Option<f64>,
    #[serde(default)]
    pub used_baseline: Option<bool>,
    #[serde(default)]
    pub validated: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestModel {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub predicted_pts: Option<f64>,
}

/// Result payload of a `/next-results` snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictNextResults {
    #[serde(default)]
    pub predictions: Vec<NextGamePrediction>,
    /// Best pick per player
    #[serde(default)]
    pub best_models: Option<BTreeMap<String, BestModel>>,
}

/// `/predict-next` endpoints of the service.
#[derive(Debug, Clone)]
pub struct PredictNextApi {
    client: ApiClient,
}

impl PredictNextApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StatusTransport for PredictNextApi {
    type Payload = PredictNextResults;

    async fn fetch_status(
        &self,
        task_id: &TaskId,
    ) -> Result<StatusSnapshot<PredictNextResults>, TransportError> {
        Ok(self
            .client
            .get_json(&format!("/next-results/{task_id}"))
            .await?)
    }
}

#[async_trait]
impl TaskSubmitter for PredictNextApi {
    type Request = PredictNextRequest;

    async fn submit(&self, request: &PredictNextRequest) -> Result<TaskInit, SubmissionError> {
        Ok(self.client.post_json("/predict-next", request).await?)
    }
}
