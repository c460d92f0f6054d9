use std::str::FromStr;

use super::parse_csv_list;
use crate::api::{HomeAway, ModelName, NextGameInput, PredictNextRequest};
use crate::error::PayloadError;

/// One game row as entered, every field still raw text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameRowInput {
    pub player: String,
    pub opponent: String,
    pub game_date: String,
    pub home_away: String,
    pub vegas_total: String,
    pub vegas_spread: String,
}

impl GameRowInput {
    /// Normalize the row into a request entry, leaving blank optionals unset.
    pub fn to_game(&self) -> Result<NextGameInput, PayloadError> {
        Ok(NextGameInput {
            player: self.player.trim().to_string(),
            opponent: self.opponent.trim().to_uppercase(),
            game_date: self.game_date.trim().to_string(),
            home_away: parse_home_away(&self.home_away)?,
            vegas_total: parse_optional_number("vegas_total", &self.vegas_total)?,
            vegas_spread: parse_optional_number("vegas_spread", &self.vegas_spread)?,
        })
    }
}

/// Parses `player;opponent;date[;home|away[;total[;spread]]]`. Empty slots
/// are allowed for the optional fields.
impl FromStr for GameRowInput {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split(';').collect();
        if fields.len() < 3 || fields.len() > 6 {
            return Err(format!(
                "expected player;opponent;date[;home_away[;vegas_total[;vegas_spread]]], got {s:?}"
            ));
        }
        let field = |i: usize| fields.get(i).map(|f| f.to_string()).unwrap_or_default();

        Ok(Self {
            player: field(0),
            opponent: field(1),
            game_date: field(2),
            home_away: field(3),
            vegas_total: field(4),
            vegas_spread: field(5),
        })
    }
}

/// Build a `/predict-next` request from raw form fields.
pub fn build_predict_next_payload(
    rows: &[GameRowInput],
    train_seasons: &str,
    season: &str,
    models: &[ModelName],
) -> Result<PredictNextRequest, PayloadError> {
    Ok(PredictNextRequest {
        train_seasons: parse_csv_list(train_seasons),
        season: season.trim().to_string(),
        models: models.to_vec(),
        games: rows
            .iter()
            .map(GameRowInput::to_game)
            .collect::<Result<_, _>>()?,
    })
}

fn parse_home_away(raw: &str) -> Result<Option<HomeAway>, PayloadError> {
    match raw.trim() {
        "" => Ok(None),
        "home" => Ok(Some(HomeAway::Home)),
        "away" => Ok(Some(HomeAway::Away)),
        other => Err(PayloadError::HomeAway(other.to_string())),
    }
}

fn parse_optional_number(field: &'static str, raw: &str) -> Result<Option<f64>, PayloadError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Some(value)),
        _ => Err(PayloadError::NotANumber {
            field,
            value: raw.to_string(),
        }),
    }
}
