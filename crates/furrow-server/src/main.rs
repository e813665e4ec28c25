//! Furrow headless host
//!
//! Runs one game against an in-memory store: the host seat is played by an
//! autopilot, a fixed plan read from a JSON file, or left idle so the deadline
//! sweep decides for it. AI seats fill themselves in and the final standings
//! are printed as JSON.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use furrow_core::{ai_seed, AiDecisionMaker};
use furrow_protocol::{wire, AiLevel, GameStatus, PlayerUid, RoundDecision};
use serde::Serialize;
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use furrow_server::{
    CoordinatorConfig, DeadlineSweeper, GameConfig, InMemoryStore, RoundCoordinator,
    SubmitOutcome, SystemClock,
};

#[derive(Parser)]
#[command(name = "furrow-server")]
#[command(about = "Headless Furrow game host", version)]
struct Cli {
    /// Coordinator config (YAML)
    #[arg(short, long, default_value = "furrow.yaml")]
    config: PathBuf,

    /// Rounds to play
    #[arg(short, long, default_value_t = 10)]
    rounds: u32,

    /// Comma-separated levels of the AI seats
    #[arg(long, value_delimiter = ',', default_value = "elementary,middle,high,perfect")]
    ai: Vec<String>,

    /// Level the host autopilot plays at
    #[arg(long, default_value = "high")]
    host_level: String,

    /// Never submit for the host; rounds advance on the deadline sweep only
    #[arg(long)]
    idle_host: bool,

    /// JSON `RoundDecision` the host plants every round instead of the autopilot
    #[arg(long)]
    plan: Option<PathBuf>,

    #[arg(long)]
    dynamic_pricing: bool,

    #[arg(long)]
    seed: Option<u64>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Serialize)]
struct Standing {
    uid: String,
    level: Option<AiLevel>,
    capital: f64,
    defaulted_rounds: Vec<u32>,
}

fn parse_level(name: &str) -> Result<AiLevel> {
    AiLevel::from_name(name.trim()).with_context(|| format!("unknown AI level `{name}`"))
}

fn load_plan(path: &Path) -> Result<RoundDecision> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read plan {}", path.display()))?;
    let plan = wire::decision_from_json(&json)
        .with_context(|| format!("failed to parse plan {}", path.display()))?;
    plan.validate()
        .with_context(|| format!("invalid plan {}", path.display()))?;
    Ok(plan)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("furrow_server=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("furrow_server=info"))
    };
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let mut config = CoordinatorConfig::load_or_default(&cli.config)?;
    if cli.idle_host {
        // Keep idle runs short: every round waits out its deadline.
        config.round_timeout_secs = config.round_timeout_secs.min(1);
        config.sweep_interval_secs = config.sweep_interval_secs.min(1);
    }
    let sweep_interval = config.sweep_interval();

    let ai_levels = cli
        .ai
        .iter()
        .map(|name| parse_level(name))
        .collect::<Result<Vec<_>>>()?;
    let host_level = parse_level(&cli.host_level)?;
    let plan = cli.plan.as_deref().map(load_plan).transpose()?;

    let coordinator = Arc::new(RoundCoordinator::new(
        Arc::new(InMemoryStore::new()),
        config,
        Arc::new(SystemClock),
    ));
    let sweeper = DeadlineSweeper::new(Arc::clone(&coordinator)).spawn(sweep_interval);

    let host = PlayerUid::new("host");
    let created = coordinator
        .create_game(
            host.clone(),
            GameConfig {
                num_players: 1,
                num_ai: ai_levels.len() as u32,
                num_rounds: cli.rounds,
                ai_levels,
                dynamic_pricing: cli.dynamic_pricing,
                seed: cli.seed,
                ..Default::default()
            },
        )
        .await
        .context("failed to create game")?;
    let game_id = created.game_id;
    info!(%game_id, "hosting game");

    loop {
        let view = coordinator.get_game_state(game_id, &host).await?;
        match view.summary.status {
            GameStatus::Finished => break,
            GameStatus::InProgress => {}
            other => bail!("game ended in unexpected state {other:?}"),
        }

        if cli.idle_host || view.player.has_submitted(view.summary.current_round_number + 1) {
            tokio::time::sleep(Duration::from_millis(200)).await;
            continue;
        }

        let round = view.summary.current_round_number + 1;
        let decision = match &plan {
            Some(plan) => plan.clone(),
            None => AiDecisionMaker::new(ai_seed(cli.seed.unwrap_or(0), round, usize::MAX))
                .decide(host_level, Some(&view.last_round.parcels), None),
        };
        debug!(round, decision = %wire::decision_to_json(&decision)?, "host decision");
        match coordinator.submit_decision(game_id, host.clone(), decision).await {
            Ok(SubmitOutcome::Calculated { next_round }) => {
                if let Some(result) = &next_round.result {
                    info!(
                        round = next_round.number,
                        profit = result.profit,
                        capital = result.capital,
                        "host round"
                    );
                }
                debug!(round = %wire::round_to_json(&next_round)?, "host round data");
            }
            Ok(SubmitOutcome::Submitted) => {}
            Err(err) => warn!(kind = %err.kind(), error = %err, "host submission rejected"),
        }
    }
    sweeper.abort();

    let game = coordinator.store().read_game(game_id).await?.value;
    let mut standings: Vec<Standing> = game
        .players
        .values()
        .map(|p| Standing {
            uid: p.uid.to_string(),
            level: p.ai_level,
            capital: p.capital,
            defaulted_rounds: p.defaulted_rounds.clone(),
        })
        .collect();
    standings.sort_by(|a, b| b.capital.total_cmp(&a.capital));
    println!("{}", serde_json::to_string_pretty(&standings)?);
    Ok(())
}
