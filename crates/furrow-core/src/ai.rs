//! AI farmers standing in for absent human players.
//!
//! Four tiers of increasing sophistication. Every tier returns a plan for all
//! 40 parcels; the only randomness comes from the seed passed to
//! [`AiDecisionMaker::new`], so the same seed and field give the same plan.

use furrow_protocol::{
    mean_nutrition, AiLevel, CropType, MarketPrices, Parcel, RoundDecision, RoundEvents,
    MAX_MACHINE_LEVEL,
};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::constants::{
    base_price, crop_profile, seed_cost, sequence_rating, SequenceRating, SOIL_MAX,
};
use crate::engine::{initial_field, potential_yield, soil_factor_sum};

/// Parcels below either threshold count as depleted for the High tier.
const DEPLETED_SOIL: f64 = 80.0;
const DEPLETED_NUTRITION: f64 = 60.0;
/// Soil below this goes to Fallow instead of a cover crop.
const BADLY_DEPLETED_SOIL: f64 = 60.0;
/// Healthy parcels avoid crops that take more soil than this.
const GENTLE_SOIL_FACTOR: f64 = -0.02;
const HIGH_FERTILIZE_BELOW: f64 = 90.0;

/// Money value of one projected soil point.
const SOIL_VALUE: f64 = 60.0;
/// Extra utility for legumes on hungry parcels.
const LEGUME_BONUS: f64 = 150.0;
const LEGUME_HUNGRY_NUTRITION: f64 = 50.0;
/// Utility lost per parcel already given the same crop this round.
const VARIETY_PENALTY: f64 = 40.0;
const PERFECT_FERTILIZE_BELOW: f64 = 100.0;

pub struct AiDecisionMaker {
    rng: ChaCha8Rng,
}

impl AiDecisionMaker {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Plan the next round on top of `previous` (a fresh field when `None`).
    pub fn decide(
        &mut self,
        level: AiLevel,
        previous: Option<&[Parcel]>,
        market: Option<&MarketPrices>,
    ) -> RoundDecision {
        let initial;
        let field: &[Parcel] = match previous {
            Some(parcels) => parcels,
            None => {
                initial = initial_field();
                &initial
            }
        };

        match level {
            AiLevel::Elementary => self.elementary(field),
            AiLevel::Middle => self.middle(field),
            AiLevel::High => self.high(field),
            AiLevel::Perfect => self.perfect(field, market),
        }
    }

    fn elementary(&mut self, field: &[Parcel]) -> RoundDecision {
        let mut decision = plan_template();
        decision.machine_level = self.rng.gen_range(0..=MAX_MACHINE_LEVEL);
        decision.organic = self.rng.gen_bool(0.5);
        decision.fertilizer = self.rng.gen_bool(0.5);
        decision.pesticide = self.rng.gen_bool(0.5);
        decision.biological_control = self.rng.gen_bool(0.5);
        for parcel in field {
            let crop = CropType::ALL
                .choose(&mut self.rng)
                .copied()
                .unwrap_or(CropType::Fallow);
            decision.parcels.insert(parcel.index, crop);
        }
        decision
    }

    fn middle(&mut self, field: &[Parcel]) -> RoundDecision {
        let mut decision = plan_template();
        decision.machine_level = 2;
        decision.fertilizer = true;
        decision.pesticide = true;
        for parcel in field {
            let crop = self.good_successor(parcel.crop, |_| true);
            decision.parcels.insert(parcel.index, crop);
        }
        decision
    }

    fn high(&mut self, field: &[Parcel]) -> RoundDecision {
        let mut decision = plan_template();
        decision.machine_level = 1;
        decision.biological_control = true;
        decision.fertilizer = mean_nutrition(field) < HIGH_FERTILIZE_BELOW;
        for parcel in field {
            let crop = if parcel.soil < DEPLETED_SOIL || parcel.nutrition < DEPLETED_NUTRITION {
                recovery_crop(parcel)
            } else {
                let gentle = self.good_successor(parcel.crop, |c| {
                    crop_profile(c).soil_factor >= GENTLE_SOIL_FACTOR
                });
                if gentle == CropType::Fallow {
                    self.good_successor(parcel.crop, |_| true)
                } else {
                    gentle
                }
            };
            decision.parcels.insert(parcel.index, crop);
        }
        decision
    }

    fn perfect(&mut self, field: &[Parcel], market: Option<&MarketPrices>) -> RoundDecision {
        let mut decision = plan_template();
        decision.machine_level = 1;
        decision.biological_control = true;
        decision.fertilizer = mean_nutrition(field) < PERFECT_FERTILIZE_BELOW;

        let calm = RoundEvents::calm();
        let mut chosen = [0usize; CropType::ALL.len()];
        for parcel in field {
            let mut best = CropType::Fallow;
            let mut best_score = f64::NEG_INFINITY;
            for crop in CropType::ALL {
                let jitter = self.rng.gen::<f64>();
                let score = score_crop(parcel, crop, &decision, &calm, market)
                    - VARIETY_PENALTY * chosen[crop.index()] as f64
                    + jitter;
                let score = if score.is_nan() {
                    f64::NEG_INFINITY
                } else {
                    score
                };
                if score > best_score {
                    best_score = score;
                    best = crop;
                }
            }
            chosen[best.index()] += 1;
            decision.parcels.insert(parcel.index, best);
        }
        decision
    }

    /// A random harvested crop rated Good after `previous` that passes `allow`,
    /// or Fallow when there is none.
    fn good_successor(
        &mut self,
        previous: CropType,
        allow: impl Fn(CropType) -> bool,
    ) -> CropType {
        let candidates: Vec<CropType> = CropType::HARVESTED
            .into_iter()
            .filter(|&c| sequence_rating(previous, c) == SequenceRating::Good && allow(c))
            .collect();
        candidates
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(CropType::Fallow)
    }
}

fn plan_template() -> RoundDecision {
    let mut decision = RoundDecision::uniform(CropType::Fallow);
    decision.parcels.clear();
    decision
}

fn recovery_crop(parcel: &Parcel) -> CropType {
    if parcel.soil < BADLY_DEPLETED_SOIL {
        CropType::Fallow
    } else if sequence_rating(parcel.crop, CropType::Fieldbean) == SequenceRating::Good {
        CropType::Fieldbean
    } else {
        CropType::Grass
    }
}

/// Expected one-round value of planting `crop` on `parcel` under calm weather.
fn score_crop(
    parcel: &Parcel,
    crop: CropType,
    decision: &RoundDecision,
    calm: &RoundEvents,
    market: Option<&MarketPrices>,
) -> f64 {
    let factors = soil_factor_sum(parcel, crop, decision, calm);
    let soil_delta = parcel.soil * factors;
    let projected_soil = (parcel.soil + soil_delta).clamp(0.0, SOIL_MAX);
    let price = match market {
        Some(prices) => prices.price(crop, false),
        None => base_price(crop, false),
    };
    let revenue = potential_yield(crop, projected_soil, parcel.nutrition) * price;

    let mut score = revenue - seed_cost(crop, false) + SOIL_VALUE * soil_delta;
    if crop.is_legume() && parcel.nutrition < LEGUME_HUNGRY_NUTRITION {
        score += LEGUME_BONUS;
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;

    fn every_parcel_assigned(decision: &RoundDecision) {
        assert!(decision.validate().is_ok(), "{decision:?}");
    }

    #[test]
    fn every_tier_plans_the_whole_field() {
        for level in AiLevel::ALL {
            let mut ai = AiDecisionMaker::new(11);
            every_parcel_assigned(&ai.decide(level, None, None));
        }
    }

    #[test]
    fn same_seed_same_plan() {
        for level in AiLevel::ALL {
            let a = AiDecisionMaker::new(3).decide(level, None, None);
            let b = AiDecisionMaker::new(3).decide(level, None, None);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn middle_follows_good_sequences() {
        let field = initial_field();
        let decision = AiDecisionMaker::new(1).decide(AiLevel::Middle, Some(&field), None);
        assert!(decision.fertilizer && decision.pesticide);
        for (&i, &crop) in &decision.parcels {
            assert!(crop.is_harvested());
            assert_eq!(
                sequence_rating(field[usize::from(i)].crop, crop),
                SequenceRating::Good
            );
        }
    }

    #[test]
    fn high_rests_depleted_parcels() {
        let mut field = initial_field();
        for parcel in &mut field {
            parcel.crop = CropType::Wheat;
        }
        field[0].soil = 40.0;
        field[1].soil = 70.0;
        field[2].nutrition = 30.0;
        let decision = AiDecisionMaker::new(1).decide(AiLevel::High, Some(&field), None);
        assert_eq!(decision.crop_at(0), Some(CropType::Fallow));
        assert_eq!(decision.crop_at(1), Some(CropType::Fieldbean));
        assert_eq!(decision.crop_at(2), Some(CropType::Fieldbean));
        assert!(!decision.pesticide);
        assert!(decision.biological_control);
    }

    #[test]
    fn perfect_spreads_crops() {
        let decision = AiDecisionMaker::new(5).decide(AiLevel::Perfect, None, None);
        let counts = decision.crop_counts();
        assert!(counts.len() >= 3, "{counts:?}");
        assert!(!decision.organic);
    }

    #[test]
    fn perfect_follows_market_prices() {
        let mut prices = MarketPrices::default();
        prices.conventional.insert(CropType::Rye, 1_000.0);
        let decision = AiDecisionMaker::new(5).decide(AiLevel::Perfect, None, Some(&prices));
        assert!(decision.crop_counts()[&CropType::Rye] > 20);
    }
}
