//! Headless self-play harness for AI tiers and balance checks.
//!
//! Runs an all-AI game round by round with the same event draws, seeding and
//! two-pass pricing a hosted game uses, and collects per-player metrics.

use std::collections::BTreeMap;

use furrow_protocol::{mean_soil, AiLevel, CropType, MarketPrices, Parcel, Round, RoundDecision};
use serde::{Deserialize, Serialize};

use crate::ai::AiDecisionMaker;
use crate::constants::STARTING_CAPITAL;
use crate::engine::{calculate_round, initial_field};
use crate::error::EngineResult;
use crate::market::{adjust_prices, aggregate_harvest, expected_yields};
use crate::rng::{ai_seed, event_seed, roll_events};

/// Configuration for self-play simulation.
#[derive(Clone, Debug)]
pub struct SelfPlayConfig {
    /// Rounds to play.
    pub rounds: u32,
    /// One AI player per entry.
    pub levels: Vec<AiLevel>,
    /// Random seed for determinism.
    pub seed: u64,
    pub dynamic_pricing: bool,
    pub starting_capital: f64,
}

impl Default for SelfPlayConfig {
    fn default() -> Self {
        Self {
            rounds: 20,
            levels: AiLevel::ALL.to_vec(),
            seed: 42,
            dynamic_pricing: false,
            starting_capital: STARTING_CAPITAL,
        }
    }
}

/// Per-player statistics.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlayerMetrics {
    pub level: AiLevel,
    pub final_capital: f64,
    /// Mean field soil after each round; index 0 is the starting field.
    pub soil_history: Vec<f64>,
    /// Parcels planted per crop over the whole game.
    pub crop_counts: BTreeMap<CropType, usize>,
    /// Rounds with a negative profit.
    pub losing_rounds: u32,
}

impl PlayerMetrics {
    pub fn mean_soil(&self) -> f64 {
        if self.soil_history.is_empty() {
            return 0.0;
        }
        self.soil_history.iter().sum::<f64>() / self.soil_history.len() as f64
    }

    pub fn final_soil(&self) -> f64 {
        self.soil_history.last().copied().unwrap_or(0.0)
    }
}

/// Result of a self-play game.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SelfPlayResult {
    pub seed: u64,
    pub rounds_played: u32,
    pub players: Vec<PlayerMetrics>,
    /// Prices per round when dynamic pricing was on.
    pub prices: Vec<MarketPrices>,
}

struct Seat {
    level: AiLevel,
    field: Option<Vec<Parcel>>,
    capital: f64,
    metrics: PlayerMetrics,
}

/// Run a single self-play game.
pub fn run_selfplay(config: &SelfPlayConfig) -> EngineResult<SelfPlayResult> {
    let start_soil = mean_soil(&initial_field());
    let mut seats: Vec<Seat> = config
        .levels
        .iter()
        .map(|&level| Seat {
            level,
            field: None,
            capital: config.starting_capital,
            metrics: PlayerMetrics {
                level,
                final_capital: config.starting_capital,
                soil_history: vec![start_soil],
                crop_counts: BTreeMap::new(),
                losing_rounds: 0,
            },
        })
        .collect();

    let mut last_prices: Option<MarketPrices> = None;
    let mut price_history = Vec::new();

    for round in 1..=config.rounds {
        let events = roll_events(event_seed(config.seed, round));

        let decisions: Vec<RoundDecision> = seats
            .iter()
            .enumerate()
            .map(|(index, seat)| {
                AiDecisionMaker::new(ai_seed(config.seed, round, index)).decide(
                    seat.level,
                    seat.field.as_deref(),
                    last_prices.as_ref(),
                )
            })
            .collect();

        let run_pass = |prices: Option<&MarketPrices>| -> EngineResult<Vec<Round>> {
            seats
                .iter()
                .zip(&decisions)
                .map(|(seat, decision)| {
                    calculate_round(
                        round,
                        seat.field.as_deref(),
                        decision,
                        &events,
                        seat.capital,
                        config.rounds,
                        prices,
                    )
                })
                .collect()
        };

        let mut rounds = run_pass(None)?;
        if config.dynamic_pricing {
            let actual = aggregate_harvest(rounds.iter().filter_map(|r| r.result.as_ref()));
            let prices = adjust_prices(&actual, &expected_yields(&decisions));
            rounds = run_pass(Some(&prices))?;
            price_history.push(prices.clone());
            last_prices = Some(prices);
        }

        for (seat, outcome) in seats.iter_mut().zip(rounds) {
            for (crop, count) in outcome.decision.crop_counts() {
                *seat.metrics.crop_counts.entry(crop).or_insert(0) += count;
            }
            if let Some(result) = &outcome.result {
                seat.capital = result.capital;
                if result.profit < 0.0 {
                    seat.metrics.losing_rounds += 1;
                }
            }
            seat.metrics.soil_history.push(mean_soil(&outcome.parcels));
            seat.field = Some(outcome.parcels);
        }
    }

    Ok(SelfPlayResult {
        seed: config.seed,
        rounds_played: config.rounds,
        players: seats
            .into_iter()
            .map(|seat| PlayerMetrics {
                final_capital: seat.capital,
                ..seat.metrics
            })
            .collect(),
        prices: price_history,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selfplay_is_deterministic() {
        let config = SelfPlayConfig {
            rounds: 10,
            dynamic_pricing: true,
            ..Default::default()
        };
        let a = run_selfplay(&config).unwrap();
        let b = run_selfplay(&config).unwrap();
        for (x, y) in a.players.iter().zip(&b.players) {
            assert_eq!(x.final_capital, y.final_capital);
            assert_eq!(x.soil_history, y.soil_history);
        }
        assert_eq!(a.prices, b.prices);
        assert_eq!(a.prices.len(), 10);
    }

    #[test]
    fn static_pricing_records_no_prices() {
        let config = SelfPlayConfig {
            rounds: 10,
            levels: vec![AiLevel::Middle],
            ..Default::default()
        };
        let result = run_selfplay(&config).unwrap();
        assert!(result.prices.is_empty());
        assert_eq!(result.players[0].soil_history.len(), 11);
    }
}
