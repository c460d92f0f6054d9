//! Client for the prediction service.
//!
//! Wraps the service's HTTP endpoints and adapts them to the monitor
//! capabilities: [`PredictApi`] for season-level model comparisons and
//! [`PredictNextApi`] for next-game point predictions.

pub mod predict;
pub mod predict_next;

pub use predict::{Metrics, PlayerModelResult, PredictApi, PredictRequest, PredictResults};
pub use predict_next::{
    BestModel, HomeAway, NextGameInput, NextGamePrediction, PredictNextApi, PredictNextRequest,
    PredictNextResults,
};

use std::str::FromStr;

use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{ApiError, ConfigError};

/// Models the service can train.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelName {
    RandomForest,
    XGBoost,
}

impl ModelName {
    pub const ALL: [ModelName; 2] = [ModelName::RandomForest, ModelName::XGBoost];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelName::RandomForest => "RandomForest",
            ModelName::XGBoost => "XGBoost",
        }
    }
}

impl std::fmt::Display for ModelName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|model| model.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown model {s:?}, expected RandomForest or XGBoost"))
    }
}

/// HTTP client bound to one service base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientBuildError> {
        let base_url = config.base_url()?.to_string();
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(ApiError::from)?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(self.http.get(self.url(path))).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(self.http.post(self.url(path)).json(body)).await
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        let body = parse_response_body(&text);

        if !status.is_success() {
            debug!(status = status.as_u16(), "service returned error status");
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: extract_error_message(&body, status.as_u16()),
                details: body,
            });
        }

        Ok(serde_json::from_value(body)?)
    }
}

/// Building an [`ApiClient`] failed.
#[derive(Debug, thiserror::Error)]
pub enum ClientBuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Parse a response body: empty is `null`, non-JSON text is kept as a string.
pub fn parse_response_body(text: &str) -> Value {
    if text.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// Pick the most useful message out of an error response body.
pub fn extract_error_message(body: &Value, status: u16) -> String {
    if let Value::String(text) = body {
        if !text.trim().is_empty() {
            return text.clone();
        }
    }
    if let Some(Value::String(detail)) = body.get("detail") {
        if !detail.trim().is_empty() {
            return detail.clone();
        }
    }
    format!("API request failed with status {status}")
}
