//! Prediction tracker - submit prediction jobs and follow them to completion
//!
//! Submits a request to the prediction service (or a simulated one with
//! `--demo`), polls the task until it reaches a terminal status, and prints
//! the final snapshot as JSON.

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::Result;
use eyre::{bail, WrapErr};
use futures::StreamExt;
use itertools::Itertools;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use predict_tracker::api::{ApiClient, ModelName, PredictApi, PredictNextApi};
use predict_tracker::app::Tracker;
use predict_tracker::config::{ClientConfig, API_BASE_URL_VAR, POLL_INTERVAL_VAR};
use predict_tracker::form::{build_predict_next_payload, build_predict_payload, GameRowInput};
use predict_tracker::monitor::{DemoBackend, TaskSubmitter};
use predict_tracker::state::{PollState, TaskId};

#[derive(Parser)]
#[command(name = "predict-tracker")]
#[command(about = "Submit NBA prediction jobs and track them to completion", long_about = None)]
#[command(version)]
struct Cli {
    /// Base URL of the prediction service
    #[arg(long, global = true, env = API_BASE_URL_VAR)]
    api_url: Option<String>,

    /// Milliseconds between status fetches
    #[arg(long, global = true, env = POLL_INTERVAL_VAR)]
    interval_ms: Option<u64>,

    /// Use a simulated backend instead of the real service
    #[arg(long, global = true)]
    demo: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare models on past seasons for a set of players
    Predict {
        /// Comma separated player names
        #[arg(long)]
        players: String,
        /// Comma separated training seasons (YYYY-YY)
        #[arg(long)]
        train_seasons: String,
        /// Season to evaluate on (YYYY-YY)
        #[arg(long)]
        test_season: String,
        /// Models to train
        #[arg(long, value_delimiter = ',', default_value = "RandomForest")]
        models: Vec<ModelName>,
    },
    /// Predict points for upcoming games
    PredictNext {
        /// Comma separated training seasons (YYYY-YY)
        #[arg(long)]
        train_seasons: String,
        /// Season the games belong to (YYYY-YY)
        #[arg(long)]
        season: String,
        /// Models to train
        #[arg(long, value_delimiter = ',', default_value = "RandomForest")]
        models: Vec<ModelName>,
        /// Game row: player;opponent;date[;home|away[;vegas_total[;vegas_spread]]]
        #[arg(long = "game", required = true)]
        games: Vec<GameRowInput>,
    },
    /// Follow a task that was already submitted
    Watch {
        #[arg(value_enum)]
        kind: TaskKind,
        task_id: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum TaskKind {
    Predict,
    PredictNext,
}

/// What to do once the tracker is set up.
enum Start<R> {
    Submit(R),
    Watch(TaskId),
}

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let interval = config.poll_interval();

    match cli.command {
        Commands::Predict {
            players,
            train_seasons,
            test_season,
            models,
        } => {
            info!(models = %models.iter().join(", "), "submitting prediction");
            let request = build_predict_payload(&players, &train_seasons, &test_season, &models);
            if cli.demo {
                track(Arc::new(DemoBackend::new()), interval, Start::Submit(request)).await
            } else {
                let api = PredictApi::new(ApiClient::new(&config)?);
                track(Arc::new(api), interval, Start::Submit(request)).await
            }
        }
        Commands::PredictNext {
            train_seasons,
            season,
            models,
            games,
        } => {
            if cli.demo {
                bail!("--demo only simulates the predict endpoint");
            }
            let request = build_predict_next_payload(&games, &train_seasons, &season, &models)
                .wrap_err("invalid game row")?;
            info!(games = request.games.len(), "submitting next-game prediction");
            let api = PredictNextApi::new(ApiClient::new(&config)?);
            track(Arc::new(api), interval, Start::Submit(request)).await
        }
        Commands::Watch { kind, task_id } => {
            let task_id = TaskId::new(task_id);
            match (kind, cli.demo) {
                (TaskKind::Predict, true) => {
                    track(Arc::new(DemoBackend::new()), interval, Start::Watch(task_id)).await
                }
                (TaskKind::PredictNext, true) => {
                    bail!("--demo only simulates the predict endpoint")
                }
                (TaskKind::Predict, false) => {
                    let api = PredictApi::new(ApiClient::new(&config)?);
                    track(Arc::new(api), interval, Start::Watch(task_id)).await
                }
                (TaskKind::PredictNext, false) => {
                    let api = PredictNextApi::new(ApiClient::new(&config)?);
                    track(Arc::new(api), interval, Start::Watch(task_id)).await
                }
            }
        }
    }
}

fn setup() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

fn load_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = ClientConfig::from_env().wrap_err("failed to load configuration")?;

    if let Some(url) = &cli.api_url {
        config = config.with_base_url(url.as_str());
    }
    if let Some(ms) = cli.interval_ms {
        if ms == 0 {
            bail!("--interval-ms must be positive");
        }
        config = config.with_poll_interval(Duration::from_millis(ms));
    }

    Ok(config)
}

/// Submit or attach, then report state changes until polling stops.
async fn track<T>(backend: Arc<T>, interval: Duration, start: Start<T::Request>) -> Result<()>
where
    T: TaskSubmitter,
    T::Payload: Default + Serialize,
{
    let mut tracker = Tracker::new(backend, interval);

    match start {
        Start::Submit(request) => {
            tracker
                .submit(&request)
                .await
                .wrap_err("failed to start prediction")?;
        }
        Start::Watch(task_id) => tracker.watch(task_id),
    }

    let mut updates = tracker.poller().updates();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                warn!("interrupted, stopping");
                tracker.reset();
                return Ok(());
            }
            next = updates.next() => {
                let Some(state) = next else { break };
                report(&state);
                if !state.active {
                    break;
                }
            }
        }
    }

    if let Some(snapshot) = tracker.poller().latest_snapshot() {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    }

    Ok(())
}

fn report<R>(state: &PollState<R>) {
    if let Some(error) = &state.poll_error {
        warn!(%error, "could not fetch task status");
    }
    if let Some(snapshot) = &state.snapshot {
        match &snapshot.error {
            Some(error) => info!(task_id = %snapshot.task_id, status = %snapshot.status, %error, "task status"),
            None => info!(task_id = %snapshot.task_id, status = %snapshot.status, "task status"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn connection_flags_read_service_env_vars() {
        let command = Cli::command();
        let env_of = |id: &str| {
            command
                .get_arguments()
                .find(|arg| arg.get_id() == id)
                .and_then(|arg| arg.get_env())
                .map(|env| env.to_string_lossy().into_owned())
        };

        assert_eq!(env_of("api_url").as_deref(), Some(API_BASE_URL_VAR));
        assert_eq!(env_of("interval_ms").as_deref(), Some(POLL_INTERVAL_VAR));
    }

    #[test]
    fn explicit_flags_override_config() {
        let cli = Cli::try_parse_from([
            "predict-tracker",
            "--api-url",
            "http://localhost:9000/",
            "--interval-ms",
            "500",
            "watch",
            "predict",
            "abc123",
        ])
        .unwrap();

        let config = load_config(&cli).unwrap();
        assert_eq!(config.base_url().unwrap(), "http://localhost:9000");
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
    }
}
