//! Long-horizon behaviour of the AI tiers, measured with the self-play harness.

use furrow_core::constants::STARTING_CAPITAL;
use furrow_core::{run_selfplay, SelfPlayConfig};
use furrow_protocol::{AiLevel, CropType};

#[test]
fn high_keeps_more_soil_than_middle() {
    for seed in [1, 2, 3] {
        let result = run_selfplay(&SelfPlayConfig {
            rounds: 20,
            levels: vec![AiLevel::Middle, AiLevel::High],
            seed,
            ..Default::default()
        })
        .unwrap();
        let middle = &result.players[0];
        let high = &result.players[1];
        assert!(
            high.mean_soil() > middle.mean_soil(),
            "seed {seed}: high {} <= middle {}",
            high.mean_soil(),
            middle.mean_soil()
        );
        assert!(high.final_soil() > middle.final_soil());
    }
}

#[test]
fn perfect_stays_profitable_with_variety() {
    let result = run_selfplay(&SelfPlayConfig {
        rounds: 30,
        levels: vec![AiLevel::Perfect],
        seed: 9,
        ..Default::default()
    })
    .unwrap();
    let perfect = &result.players[0];
    assert!(perfect.final_capital > STARTING_CAPITAL);
    let harvested = perfect
        .crop_counts
        .keys()
        .filter(|c| c.is_harvested())
        .count();
    assert!(harvested >= 3, "{:?}", perfect.crop_counts);
    assert!(perfect.crop_counts.get(&CropType::Fieldbean).copied().unwrap_or(0) > 0);
}

#[test]
fn perfect_survives_dynamic_pricing() {
    let result = run_selfplay(&SelfPlayConfig {
        rounds: 15,
        levels: vec![AiLevel::Perfect, AiLevel::Perfect, AiLevel::Middle],
        seed: 4,
        dynamic_pricing: true,
        ..Default::default()
    })
    .unwrap();
    assert_eq!(result.prices.len(), 15);
    assert!(result.players[0].final_capital > STARTING_CAPITAL);
}

#[test]
fn every_tier_completes_a_full_game() {
    let result = run_selfplay(&SelfPlayConfig {
        rounds: 50,
        ..Default::default()
    })
    .unwrap();
    assert_eq!(result.players.len(), AiLevel::ALL.len());
    for player in &result.players {
        assert_eq!(player.soil_history.len(), 51);
        assert!(player.final_capital.is_finite());
    }
}
