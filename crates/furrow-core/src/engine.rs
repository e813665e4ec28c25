//! Round simulation engine.
//!
//! `calculate_round` is a pure function of its inputs: the previous field, the
//! player's decision, the round's (already drawn) events and the prices. It does
//! no I/O and draws no randomness, so it can run on any thread and recomputing a
//! round always reproduces the same bytes.
//!
//! Per parcel, in order:
//! 1. soil: `soil + soil × Σ factors`, clamped to `0..=200`
//! 2. nutrition: fertilizer/manure intake, legume fixation, drawdown, clamped
//! 3. harvest: base yield scaled by soil, nutrition, weather and vermin

use std::collections::BTreeMap;

use furrow_protocol::{
    CropType, Expenses, MarketPrices, Parcel, ParcelIndex, Round, RoundDecision, RoundEvents,
    RoundResult, FIELD_SIZE,
};

use crate::constants::{
    self, crop_profile, sequence_rating, FALLOW_BASE_RECOVERY, FALLOW_NUTRIENT_RESET_RATE,
    FALLOW_RECOVERY_RATE, FALLOW_SOIL_CEILING, FERTILIZER_SOIL_FACTOR, LEGUME_NITROGEN_BONUS,
    MANURE_FULL_SHARE, MANURE_GAIN, MIN_INTAKE_SOIL_EFFICIENCY, MONOCULTURE_PENALTY,
    MONOCULTURE_STREAK_PENALTY, NUTRIENT_BASELINE, NUTRITION_MAX, NUTRITION_START,
    PESTICIDE_SOIL_FACTOR, SOIL_BASELINE, SOIL_MAX, SOIL_START, SYNTHETIC_FERTILIZER_GAIN,
    YIELD_RATIO_MAX,
};
use crate::error::{EngineError, EngineResult};
use crate::invariants::check_round;

/// The field every player starts with: all Fallow at starting soil and nutrition.
pub fn initial_field() -> Vec<Parcel> {
    (0..FIELD_SIZE as ParcelIndex)
        .map(|i| Parcel::new(i, CropType::Fallow, SOIL_START, NUTRITION_START))
        .collect()
}

/// Round 0 for a fresh player.
pub fn initial_round() -> Round {
    Round {
        number: 0,
        decision: RoundDecision::uniform(CropType::Fallow),
        parcels: initial_field(),
        result: None,
    }
}

/// Simulate one round for one player.
///
/// `previous` is the field after the prior round; `None` means a fresh field.
/// `market_prices` replaces the static price tables when given.
pub fn calculate_round(
    round_number: u32,
    previous: Option<&[Parcel]>,
    decision: &RoundDecision,
    events: &RoundEvents,
    capital: f64,
    round_limit: u32,
    market_prices: Option<&MarketPrices>,
) -> EngineResult<Round> {
    if round_number == 0 || round_number > round_limit {
        return Err(EngineError::InvalidRound {
            round: round_number,
            limit: round_limit,
        });
    }
    decision.validate()?;

    let initial;
    let previous: &[Parcel] = match previous {
        Some(parcels) => parcels,
        None => {
            initial = initial_field();
            &initial
        }
    };
    validate_field(previous)?;

    let manure = manure_supply(decision);
    let mut parcels = Vec::with_capacity(FIELD_SIZE);
    for old in previous {
        let crop = decision
            .crop_at(old.index)
            .ok_or_else(|| {
                EngineError::InvalidField(format!("no crop assigned to parcel {}", old.index))
            })?;
        parcels.push(update_parcel(old, crop, decision, events, manure));
    }

    let result = settle_finances(&parcels, decision, events, capital, market_prices);
    let round = Round {
        number: round_number,
        decision: decision.clone(),
        parcels,
        result: Some(result),
    };
    check_round(&round, capital)?;
    Ok(round)
}

fn validate_field(parcels: &[Parcel]) -> EngineResult<()> {
    if parcels.len() != FIELD_SIZE {
        return Err(EngineError::InvalidField(format!(
            "field has {} parcels, expected {FIELD_SIZE}",
            parcels.len()
        )));
    }
    for (i, parcel) in parcels.iter().enumerate() {
        if usize::from(parcel.index) != i {
            return Err(EngineError::InvalidField(format!(
                "parcel at position {i} carries index {}",
                parcel.index
            )));
        }
        if !parcel.soil.is_finite() || !parcel.nutrition.is_finite() {
            return Err(EngineError::InvalidField(format!(
                "parcel {i} has non-finite soil or nutrition"
            )));
        }
    }
    Ok(())
}

fn update_parcel(
    old: &Parcel,
    crop: CropType,
    decision: &RoundDecision,
    events: &RoundEvents,
    manure: f64,
) -> Parcel {
    let factors = soil_factor_sum(old, crop, decision, events);
    let mut soil = clamp_soil(old.soil + old.soil * factors);
    if crop == CropType::Fallow {
        soil = soil.min(old.soil.max(FALLOW_SOIL_CEILING));
    }
    let nutrition = next_nutrition(old.nutrition, soil, crop, decision, manure);
    let harvest_yield = potential_yield(crop, soil, nutrition)
        * constants::weather_yield_factor(events.weather)
        * vermin_factor(crop, events, decision);

    Parcel {
        index: old.index,
        crop,
        previous_crop: Some(old.crop),
        soil,
        nutrition,
        harvest_yield,
    }
}

/// Sum of all multiplicative soil factors for planting `crop` on `old`.
pub fn soil_factor_sum(
    old: &Parcel,
    crop: CropType,
    decision: &RoundDecision,
    events: &RoundEvents,
) -> f64 {
    let mut sum = match crop {
        CropType::Fallow => fallow_recovery(old.soil),
        _ => crop_profile(crop).soil_factor,
    };

    let worked = crop.is_harvested();
    if worked && decision.fertilizer {
        sum += FERTILIZER_SOIL_FACTOR;
    }
    if worked && decision.pesticide {
        sum += PESTICIDE_SOIL_FACTOR;
    }

    sum += sequence_rating(old.crop, crop).soil_factor();

    if !crop.is_recovery() && old.crop == crop {
        sum += if old.previous_crop == Some(crop) {
            MONOCULTURE_STREAK_PENALTY
        } else {
            MONOCULTURE_PENALTY
        };
    }

    if crop != CropType::Fallow {
        sum += constants::machine_soil_penalty(decision.machine_level);
    }

    sum += constants::weather_soil_factor(events.weather);
    if crop == CropType::Fallow {
        sum = sum.min(fallow_cap(old.soil));
    }
    sum
}

/// Largest factor that keeps a Fallow parcel at or below the recovery ceiling.
fn fallow_cap(soil: f64) -> f64 {
    if soil <= 0.0 {
        return 0.0;
    }
    ((FALLOW_SOIL_CEILING - soil) / soil).max(0.0)
}

/// Fallow rebuilds soil in proportion to the shortfall from the starting value.
fn fallow_recovery(soil: f64) -> f64 {
    if soil >= FALLOW_SOIL_CEILING {
        return 0.0;
    }
    if soil <= 0.0 {
        // Factors scale current soil, so a parcel at zero stays there.
        return 0.0;
    }
    let shortfall = (SOIL_START - soil).max(0.0);
    FALLOW_BASE_RECOVERY + FALLOW_RECOVERY_RATE * shortfall / soil
}

fn next_nutrition(
    nutrition: f64,
    soil: f64,
    crop: CropType,
    decision: &RoundDecision,
    manure: f64,
) -> f64 {
    let next = match crop {
        CropType::Fallow | CropType::Grass => {
            if nutrition > NUTRIENT_BASELINE {
                nutrition - (nutrition - NUTRIENT_BASELINE) * FALLOW_NUTRIENT_RESET_RATE
            } else {
                nutrition
            }
        }
        _ => {
            let synthetic = if decision.fertilizer {
                SYNTHETIC_FERTILIZER_GAIN
            } else {
                0.0
            };
            let mut n = nutrition + (synthetic + manure) * intake_efficiency(soil, nutrition);
            if crop.is_legume() {
                n += LEGUME_NITROGEN_BONUS;
            }
            let profile = crop_profile(crop);
            let ratio = if profile.base_yield > 0.0 {
                (potential_yield(crop, soil, clamp_nutrition(n)) / profile.base_yield)
                    .clamp(0.0, YIELD_RATIO_MAX)
            } else {
                0.0
            };
            n - profile.nutrient_draw * ratio
        }
    };
    clamp_nutrition(next)
}

/// How much of an applied nutrient gain the parcel takes up.
fn intake_efficiency(soil: f64, nutrition: f64) -> f64 {
    let soil_efficiency = (soil / SOIL_BASELINE).clamp(MIN_INTAKE_SOIL_EFFICIENCY, 1.0);
    let headroom = ((NUTRITION_MAX - nutrition) / NUTRITION_MAX).clamp(0.0, 1.0);
    soil_efficiency * headroom
}

/// Organic manure available per crop parcel, from the player's pasture share.
fn manure_supply(decision: &RoundDecision) -> f64 {
    let grass = decision
        .parcels
        .values()
        .filter(|&&c| c == CropType::Grass)
        .count() as f64;
    let share = grass / FIELD_SIZE as f64;
    MANURE_GAIN * (share / MANURE_FULL_SHARE).min(1.0)
}

/// Yield before weather and vermin; zero for crops without a harvest.
pub fn potential_yield(crop: CropType, soil: f64, nutrition: f64) -> f64 {
    if !crop.is_harvested() {
        return 0.0;
    }
    let profile = crop_profile(crop);
    let soil_ratio = (soil / SOIL_BASELINE).max(0.0);
    let nutrient_ratio = (nutrition / NUTRIENT_BASELINE).max(0.0);
    profile.base_yield
        * soil_ratio.powf(profile.soil_sensitivity)
        * nutrient_ratio.powf(profile.nutrient_sensitivity)
}

fn vermin_factor(crop: CropType, events: &RoundEvents, decision: &RoundDecision) -> f64 {
    let loss = constants::vermin_loss(decision.pesticide, decision.biological_control);
    events
        .vermin
        .iter()
        .filter(|&&v| constants::vermin_attacks(v, crop))
        .fold(1.0, |factor, _| factor * (1.0 - loss))
}

fn settle_finances(
    parcels: &[Parcel],
    decision: &RoundDecision,
    events: &RoundEvents,
    capital: f64,
    market_prices: Option<&MarketPrices>,
) -> RoundResult {
    let organic_certified = is_organic_certified(decision);

    let seeds: f64 = parcels
        .iter()
        .map(|p| constants::seed_cost(p.crop, decision.organic))
        .sum();
    let running = running_cost(decision);
    let investment = constants::machine_investment_cost(decision.machine_level);
    let expenses = Expenses::new(seeds, running, investment);

    let mut harvest_summary: BTreeMap<CropType, f64> = BTreeMap::new();
    for parcel in parcels.iter().filter(|p| p.crop.is_harvested()) {
        *harvest_summary.entry(parcel.crop).or_insert(0.0) += parcel.harvest_yield;
    }

    let income: f64 = harvest_summary
        .iter()
        .map(|(&crop, &amount)| {
            let price = match market_prices {
                Some(prices) => prices.price(crop, organic_certified),
                None => constants::base_price(crop, organic_certified),
            };
            amount * price
        })
        .sum();

    let profit = income - expenses.total;
    RoundResult {
        income,
        expenses,
        profit,
        capital: capital + profit,
        harvest_summary,
        events: events.clone(),
        organic_certified,
    }
}

fn running_cost(decision: &RoundDecision) -> f64 {
    let mut cost = if decision.organic {
        constants::RUNNING_BASE_ORGANIC
    } else {
        constants::RUNNING_BASE_CONVENTIONAL
    };
    if decision.fertilizer {
        cost += constants::FERTILIZER_COST;
    }
    if decision.pesticide {
        cost += constants::PESTICIDE_COST;
    }
    if decision.biological_control {
        cost += constants::BIOLOGICAL_CONTROL_COST;
    }
    cost
}

/// Organic rounds are certified when no synthetic inputs were used.
pub fn is_organic_certified(decision: &RoundDecision) -> bool {
    decision.organic && !decision.fertilizer && !decision.pesticide
}

fn clamp_soil(value: f64) -> f64 {
    value.clamp(0.0, SOIL_MAX)
}

fn clamp_nutrition(value: f64) -> f64 {
    value.clamp(0.0, NUTRITION_MAX)
}

#[cfg(test)]
mod tests {
    use furrow_protocol::{Vermin, Weather};

    use super::*;
    use crate::constants::{RUNNING_BASE_CONVENTIONAL, STARTING_CAPITAL};

    fn field_of(crop: CropType, previous_crop: Option<CropType>, soil: f64) -> Vec<Parcel> {
        initial_field()
            .into_iter()
            .map(|mut p| {
                p.crop = crop;
                p.previous_crop = previous_crop;
                p.soil = soil;
                p
            })
            .collect()
    }

    #[test]
    fn first_round_fallow_has_no_income() {
        let round = calculate_round(
            1,
            None,
            &RoundDecision::uniform(CropType::Fallow),
            &RoundEvents::calm(),
            STARTING_CAPITAL,
            10,
            None,
        )
        .unwrap();
        let result = round.result.unwrap();
        assert_eq!(result.income, 0.0);
        assert_eq!(result.expenses.seeds, 0.0);
        assert_eq!(result.expenses.investment, 0.0);
        assert_eq!(result.expenses.running, RUNNING_BASE_CONVENTIONAL);
        assert_eq!(result.profit, -RUNNING_BASE_CONVENTIONAL);
        assert!(result.harvest_summary.is_empty());
    }

    #[test]
    fn fallow_recovers_but_stays_below_ceiling() {
        let round = calculate_round(
            1,
            None,
            &RoundDecision::uniform(CropType::Fallow),
            &RoundEvents::calm(),
            STARTING_CAPITAL,
            10,
            None,
        )
        .unwrap();
        for parcel in &round.parcels {
            assert!(parcel.soil > SOIL_START);
            assert!(parcel.soil <= FALLOW_SOIL_CEILING);
            assert_eq!(parcel.nutrition, NUTRITION_START);
        }
    }

    #[test]
    fn depleted_fallow_recovers_faster() {
        let low = field_of(CropType::Fallow, None, 40.0);
        let round = calculate_round(
            2,
            Some(&low),
            &RoundDecision::uniform(CropType::Fallow),
            &RoundEvents::calm(),
            0.0,
            10,
            None,
        )
        .unwrap();
        // 40 + 40 * (0.01 + 0.5 * 40 / 40)
        assert!((round.parcels[0].soil - 60.4).abs() < 1e-9);
    }

    #[test]
    fn fallow_just_below_ceiling_stops_at_ceiling() {
        let near = field_of(CropType::Fallow, Some(CropType::Fallow), 119.5);
        let round = calculate_round(
            2,
            Some(&near),
            &RoundDecision::uniform(CropType::Fallow),
            &RoundEvents::calm(),
            0.0,
            10,
            None,
        )
        .unwrap();
        for parcel in &round.parcels {
            assert!(parcel.soil >= 119.5);
            assert!(parcel.soil <= FALLOW_SOIL_CEILING, "soil {}", parcel.soil);
        }
    }

    #[test]
    fn long_fallow_never_passes_ceiling() {
        let decision = RoundDecision::uniform(CropType::Fallow);
        let mut field = initial_field();
        for number in 1..=50 {
            let round = calculate_round(
                number,
                Some(&field),
                &decision,
                &RoundEvents::calm(),
                0.0,
                50,
                None,
            )
            .unwrap();
            field = round.parcels;
            assert!(field.iter().all(|p| p.soil <= FALLOW_SOIL_CEILING));
        }
        assert!(field[0].soil > 110.0);
    }

    #[test]
    fn rich_parcels_clamp_at_maximum() {
        let mut rich = field_of(CropType::Fallow, None, 199.0);
        for parcel in &mut rich {
            parcel.nutrition = 199.0;
        }
        let mut decision = RoundDecision::uniform(CropType::Fieldbean);
        decision.fertilizer = true;
        let events = RoundEvents::calm();
        let round = calculate_round(2, Some(&rich), &decision, &events, 0.0, 10, None).unwrap();
        for parcel in &round.parcels {
            assert_eq!(parcel.soil, SOIL_MAX);
            assert_eq!(parcel.nutrition, NUTRITION_MAX);
        }
    }

    #[test]
    fn barren_soil_stays_barren() {
        let barren = field_of(CropType::Wheat, Some(CropType::Barley), 0.0);
        for crop in [CropType::Fallow, CropType::Wheat, CropType::Fieldbean] {
            let round = calculate_round(
                2,
                Some(&barren),
                &RoundDecision::uniform(crop),
                &RoundEvents::calm(),
                0.0,
                10,
                None,
            )
            .unwrap();
            assert!(round.parcels.iter().all(|p| p.soil == 0.0), "{crop}");
            assert!(round.parcels.iter().all(|p| p.harvest_yield == 0.0), "{crop}");
        }
    }

    #[test]
    fn missing_parcel_is_rejected() {
        let mut decision = RoundDecision::uniform(CropType::Wheat);
        decision.parcels.remove(&39);
        let err = calculate_round(1, None, &decision, &RoundEvents::calm(), 0.0, 10, None)
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidDecision(_)));
    }

    #[test]
    fn round_outside_limit_is_rejected() {
        let decision = RoundDecision::uniform(CropType::Wheat);
        for round in [0, 11] {
            let err = calculate_round(round, None, &decision, &RoundEvents::calm(), 0.0, 10, None)
                .unwrap_err();
            assert!(matches!(err, EngineError::InvalidRound { .. }));
        }
    }

    #[test]
    fn short_field_is_rejected() {
        let mut field = initial_field();
        field.pop();
        let err = calculate_round(
            1,
            Some(&field),
            &RoundDecision::uniform(CropType::Wheat),
            &RoundEvents::calm(),
            0.0,
            10,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidField(_)));
    }

    #[test]
    fn monoculture_loses_more_soil_than_rotation() {
        let decision = RoundDecision::uniform(CropType::Wheat);
        let events = RoundEvents::calm();
        let after_wheat = field_of(CropType::Wheat, Some(CropType::Fieldbean), 80.0);
        let after_bean = field_of(CropType::Fieldbean, Some(CropType::Wheat), 80.0);

        let mono = calculate_round(3, Some(&after_wheat), &decision, &events, 0.0, 10, None)
            .unwrap();
        let rotated = calculate_round(3, Some(&after_bean), &decision, &events, 0.0, 10, None)
            .unwrap();
        assert!(mono.parcels[0].soil < rotated.parcels[0].soil);
    }

    #[test]
    fn monoculture_streak_is_harsher() {
        let decision = RoundDecision::uniform(CropType::Corn);
        let events = RoundEvents::calm();
        let once = field_of(CropType::Corn, Some(CropType::Fieldbean), 80.0);
        let twice = field_of(CropType::Corn, Some(CropType::Corn), 80.0);

        let a = calculate_round(3, Some(&once), &decision, &events, 0.0, 10, None).unwrap();
        let b = calculate_round(3, Some(&twice), &decision, &events, 0.0, 10, None).unwrap();
        assert!(b.parcels[0].soil < a.parcels[0].soil);
    }

    #[test]
    fn soil_sensitive_crops_react_more() {
        // Below baseline soil, a sensitivity above 1 loses proportionally more.
        let robust =
            potential_yield(CropType::Rye, 40.0, 80.0) / crop_profile(CropType::Rye).base_yield;
        let hungry =
            potential_yield(CropType::Beet, 40.0, 80.0) / crop_profile(CropType::Beet).base_yield;
        assert!(hungry < robust);
        assert_eq!(potential_yield(CropType::Grass, 100.0, 100.0), 0.0);
    }

    #[test]
    fn pesticide_limits_vermin_losses() {
        let events = RoundEvents::new(Weather::Normal, [Vermin::PotatoBeetle]);
        let mut plain = RoundDecision::uniform(CropType::Potato);
        let unprotected = calculate_round(1, None, &plain, &events, 0.0, 10, None).unwrap();
        plain.pesticide = true;
        let protected = calculate_round(1, None, &plain, &events, 0.0, 10, None).unwrap();
        let calm = calculate_round(
            1,
            None,
            &RoundDecision::uniform(CropType::Potato),
            &RoundEvents::calm(),
            0.0,
            10,
            None,
        )
        .unwrap();

        let harvest = |r: &Round| r.result.as_ref().unwrap().harvest_summary[&CropType::Potato];
        assert!(harvest(&unprotected) < harvest(&calm));
        assert!(harvest(&protected) > harvest(&unprotected));
    }

    #[test]
    fn legumes_fix_nitrogen() {
        let round = calculate_round(
            1,
            None,
            &RoundDecision::uniform(CropType::Fieldbean),
            &RoundEvents::calm(),
            0.0,
            10,
            None,
        )
        .unwrap();
        assert!(round.parcels[0].nutrition > NUTRITION_START);
    }

    #[test]
    fn grass_share_supplies_manure() {
        let mut decision = RoundDecision::uniform(CropType::Wheat);
        for i in 0..10 {
            decision.parcels.insert(i, CropType::Grass);
        }
        let with_grass =
            calculate_round(1, None, &decision, &RoundEvents::calm(), 0.0, 10, None).unwrap();
        let plain = calculate_round(
            1,
            None,
            &RoundDecision::uniform(CropType::Wheat),
            &RoundEvents::calm(),
            0.0,
            10,
            None,
        )
        .unwrap();
        assert!(with_grass.parcels[39].nutrition > plain.parcels[39].nutrition);
    }

    #[test]
    fn organic_certification_requires_no_synthetics() {
        let mut decision = RoundDecision::uniform(CropType::Oat);
        decision.organic = true;
        assert!(is_organic_certified(&decision));
        decision.fertilizer = true;
        assert!(!is_organic_certified(&decision));
        decision.fertilizer = false;
        decision.pesticide = true;
        assert!(!is_organic_certified(&decision));
    }

    #[test]
    fn market_override_replaces_static_prices() {
        let decision = RoundDecision::uniform(CropType::Wheat);
        let free = MarketPrices::default();
        let round =
            calculate_round(1, None, &decision, &RoundEvents::calm(), 0.0, 10, Some(&free))
                .unwrap();
        assert_eq!(round.result.unwrap().income, 0.0);
    }
}
