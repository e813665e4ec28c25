//! Runs headless all-AI games and prints per-player metrics as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use furrow_core::{run_selfplay, SelfPlayConfig};
use furrow_protocol::AiLevel;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "furrow-selfplay")]
#[command(about = "Headless AI-vs-AI Furrow games", version)]
struct Cli {
    /// Rounds per game
    #[arg(short, long, default_value_t = 20)]
    rounds: u32,

    /// Comma-separated AI levels, one player each
    #[arg(short, long, value_delimiter = ',', default_value = "elementary,middle,high,perfect")]
    levels: Vec<String>,

    /// Base seed; game i uses seed + i
    #[arg(short, long, default_value_t = 42)]
    seed: u64,

    /// Number of games
    #[arg(short, long, default_value_t = 1)]
    games: u32,

    /// Enable aggregate-yield price feedback
    #[arg(long)]
    dynamic_pricing: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let levels = cli
        .levels
        .iter()
        .map(|name| {
            AiLevel::from_name(name.trim()).with_context(|| format!("unknown AI level `{name}`"))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut results = Vec::with_capacity(cli.games as usize);
    for game in 0..cli.games {
        let config = SelfPlayConfig {
            rounds: cli.rounds,
            levels: levels.clone(),
            seed: cli.seed.wrapping_add(u64::from(game)),
            dynamic_pricing: cli.dynamic_pricing,
            ..Default::default()
        };
        let result = run_selfplay(&config)
            .with_context(|| format!("self-play game with seed {} failed", config.seed))?;
        for player in &result.players {
            info!(
                seed = result.seed,
                level = %player.level,
                capital = player.final_capital,
                soil = player.final_soil(),
                "game finished"
            );
        }
        results.push(result);
    }

    let json = if cli.pretty {
        serde_json::to_string_pretty(&results)?
    } else {
        serde_json::to_string(&results)?
    };
    println!("{json}");
    Ok(())
}
