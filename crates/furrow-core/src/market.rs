//! Aggregate-yield price feedback.
//!
//! When a game uses dynamic pricing, every crop's price moves against the
//! surplus or shortfall of the combined harvest relative to what the planted
//! area would produce at base yield.

use std::collections::BTreeMap;

use furrow_protocol::{CropType, MarketPrices, RoundDecision, RoundResult};

use crate::constants::{
    base_price, crop_profile, MARKET_ELASTICITY, MARKET_PRICE_CEILING, MARKET_PRICE_FLOOR,
};

/// The static price tables as a `MarketPrices` value.
pub fn static_prices() -> MarketPrices {
    let mut prices = MarketPrices::default();
    for crop in CropType::HARVESTED {
        prices.conventional.insert(crop, base_price(crop, false));
        prices.organic.insert(crop, base_price(crop, true));
    }
    prices
}

/// Planted parcels × base yield, summed over every decision.
pub fn expected_yields<'a>(
    decisions: impl IntoIterator<Item = &'a RoundDecision>,
) -> BTreeMap<CropType, f64> {
    let mut expected = BTreeMap::new();
    for decision in decisions {
        for &crop in decision.parcels.values().filter(|c| c.is_harvested()) {
            *expected.entry(crop).or_insert(0.0) += crop_profile(crop).base_yield;
        }
    }
    expected
}

/// Sums the per-crop harvest of every player's result.
pub fn aggregate_harvest<'a>(
    results: impl IntoIterator<Item = &'a RoundResult>,
) -> BTreeMap<CropType, f64> {
    let mut actual = BTreeMap::new();
    for result in results {
        for (&crop, &amount) in &result.harvest_summary {
            *actual.entry(crop).or_insert(0.0) += amount;
        }
    }
    actual
}

/// Price multiplier for one crop; 1 when nothing was expected.
pub fn price_factor(actual: f64, expected: f64) -> f64 {
    if expected <= 0.0 {
        return 1.0;
    }
    let ratio = actual / expected;
    if !ratio.is_finite() {
        return 1.0;
    }
    (1.0 + MARKET_ELASTICITY * (1.0 - ratio)).clamp(MARKET_PRICE_FLOOR, MARKET_PRICE_CEILING)
}

pub fn adjust_prices(
    actual: &BTreeMap<CropType, f64>,
    expected: &BTreeMap<CropType, f64>,
) -> MarketPrices {
    let mut prices = MarketPrices::default();
    for crop in CropType::HARVESTED {
        let factor = price_factor(
            actual.get(&crop).copied().unwrap_or(0.0),
            expected.get(&crop).copied().unwrap_or(0.0),
        );
        prices
            .conventional
            .insert(crop, base_price(crop, false) * factor);
        prices.organic.insert(crop, base_price(crop, true) * factor);
    }
    prices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shortfall_raises_price_within_band() {
        assert!((price_factor(50.0, 100.0) - 1.25).abs() < 1e-12);
        assert_eq!(price_factor(0.0, 100.0), MARKET_PRICE_CEILING);
    }

    #[test]
    fn surplus_lowers_price_within_band() {
        assert!((price_factor(120.0, 100.0) - 0.9).abs() < 1e-12);
        assert_eq!(price_factor(500.0, 100.0), MARKET_PRICE_FLOOR);
    }

    #[test]
    fn nothing_expected_keeps_base_price() {
        let prices = adjust_prices(&BTreeMap::new(), &BTreeMap::new());
        assert_eq!(prices, static_prices());
    }

    #[test]
    fn expected_counts_planted_parcels() {
        let a = RoundDecision::uniform(CropType::Wheat);
        let b = RoundDecision::uniform(CropType::Fallow);
        let expected = expected_yields([&a, &b]);
        assert_eq!(expected.len(), 1);
        assert_eq!(
            expected[&CropType::Wheat],
            40.0 * crop_profile(CropType::Wheat).base_yield
        );
    }
}
