//! Property-based tests for the round engine.

#![allow(clippy::unwrap_used)]

use proptest::prelude::*;

use furrow_core::constants::{NUTRITION_MAX, SOIL_MAX};
use furrow_core::{calculate_round, event_seed, initial_field, roll_events, EngineError};
use furrow_protocol::{wire, CropType, Parcel, RoundDecision, RoundEvents, FIELD_SIZE};

fn decision_strategy() -> impl Strategy<Value = RoundDecision> {
    (
        proptest::collection::vec(0usize..CropType::ALL.len(), FIELD_SIZE),
        0u8..=4,
        any::<[bool; 4]>(),
    )
        .prop_map(|(crops, machine_level, [organic, fertilizer, pesticide, bio])| {
            let mut decision = RoundDecision::uniform(CropType::Fallow);
            for (i, c) in crops.into_iter().enumerate() {
                decision.parcels.insert(i as u8, CropType::ALL[c]);
            }
            decision.machine_level = machine_level;
            decision.organic = organic;
            decision.fertilizer = fertilizer;
            decision.pesticide = pesticide;
            decision.biological_control = bio;
            decision
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Soil and nutrition stay in bounds and the ledger identities hold over a whole game.
    #[test]
    fn prop_bounds_and_identities(
        decisions in proptest::collection::vec(decision_strategy(), 1..12),
        seed in any::<u64>()
    ) {
        let limit = decisions.len() as u32;
        let mut field: Option<Vec<Parcel>> = None;
        let mut capital = 100_000.0;
        for (i, decision) in decisions.iter().enumerate() {
            let number = i as u32 + 1;
            let events = roll_events(event_seed(seed, number));
            let round = calculate_round(
                number, field.as_deref(), decision, &events, capital, limit, None,
            ).unwrap();

            prop_assert_eq!(round.parcels.len(), FIELD_SIZE);
            for parcel in &round.parcels {
                prop_assert!(parcel.soil >= 0.0 && parcel.soil <= SOIL_MAX);
                prop_assert!(parcel.nutrition >= 0.0 && parcel.nutrition <= NUTRITION_MAX);
                prop_assert!(parcel.harvest_yield >= 0.0);
            }
            let result = round.result.clone().unwrap();
            prop_assert_eq!(result.profit, result.income - result.expenses.total);
            prop_assert_eq!(result.capital, capital + result.profit);
            capital = result.capital;
            field = Some(round.parcels);
        }
    }

    /// Recomputing a round from the same inputs gives byte-identical output.
    #[test]
    fn prop_round_is_deterministic(decision in decision_strategy(), seed in any::<u64>()) {
        let events = roll_events(seed);
        let a = calculate_round(1, None, &decision, &events, 0.0, 10, None).unwrap();
        let b = calculate_round(1, None, &decision, &events, 0.0, 10, None).unwrap();
        prop_assert_eq!(wire::round_hash(&a).unwrap(), wire::round_hash(&b).unwrap());
    }

    /// Decisions that skip a parcel are always rejected.
    #[test]
    fn prop_incomplete_decision_rejected(decision in decision_strategy(), missing in 0u8..40) {
        let mut decision = decision;
        decision.parcels.remove(&missing);
        let err = calculate_round(1, None, &decision, &RoundEvents::calm(), 0.0, 10, None)
            .unwrap_err();
        prop_assert!(matches!(err, EngineError::InvalidDecision(_)));
    }
}

#[test]
fn wheat_monoculture_exhausts_soil() {
    let mut decision = RoundDecision::uniform(CropType::Wheat);
    decision.machine_level = 4;
    let events = RoundEvents::calm();

    let mut field = initial_field();
    let mut last = field[0].soil;
    for number in 1..=20 {
        let round = calculate_round(number, Some(&field), &decision, &events, 0.0, 20, None)
            .unwrap();
        let soil = round.parcels[0].soil;
        assert!(soil < last, "round {number}: {soil} >= {last}");
        assert!(soil >= 0.0);
        last = soil;
        field = round.parcels;
    }
    assert!(last < 20.0, "soil after 20 rounds: {last}");
}

#[test]
fn extra_parcel_index_rejected() {
    let mut decision = RoundDecision::uniform(CropType::Oat);
    decision.parcels.insert(40, CropType::Oat);
    let err =
        calculate_round(1, None, &decision, &RoundEvents::calm(), 0.0, 10, None).unwrap_err();
    assert!(matches!(err, EngineError::InvalidDecision(_)));
}

#[test]
fn machine_level_above_four_rejected() {
    let mut decision = RoundDecision::uniform(CropType::Oat);
    decision.machine_level = 5;
    let err =
        calculate_round(1, None, &decision, &RoundEvents::calm(), 0.0, 10, None).unwrap_err();
    assert!(matches!(err, EngineError::InvalidDecision(_)));
}
