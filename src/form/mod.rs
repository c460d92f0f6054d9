//! Request payload construction.
//!
//! Turns raw, user-entered text into typed request bodies. Input is assumed
//! to have passed the caller's validation; only conversions that can fail
//! on their own (numbers, enumerations) report errors here.

mod predict_next;

pub use predict_next::{build_predict_next_payload, GameRowInput};

use crate::api::{ModelName, PredictRequest};

/// Split a comma separated list, trimming items and dropping empty ones.
pub fn parse_csv_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Build a `/predict` request from raw form fields.
pub fn build_predict_payload(
    players: &str,
    train_seasons: &str,
    test_season: &str,
    models: &[ModelName],
) -> PredictRequest {
    PredictRequest {
        players: parse_csv_list(players),
        train_seasons: parse_csv_list(train_seasons),
        test_season: test_season.trim().to_string(),
        models: models.to_vec(),
    }
}
