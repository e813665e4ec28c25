//! Static tuning data for the round simulation.
//!
//! Every per-crop table is an exhaustive `match`, so adding a crop fails to
//! compile until each table has an entry for it.

use furrow_protocol::{CropType, Vermin, Weather, MAX_MACHINE_LEVEL, PARCEL_VALUE_MAX};

pub const SOIL_START: f64 = 80.0;
pub const NUTRITION_START: f64 = 80.0;
/// Soil level at which a crop yields exactly its base yield.
pub const SOIL_BASELINE: f64 = 80.0;
/// Nutrition level at which a crop yields exactly its base yield.
pub const NUTRIENT_BASELINE: f64 = 80.0;
pub const SOIL_MAX: f64 = PARCEL_VALUE_MAX;
pub const NUTRITION_MAX: f64 = PARCEL_VALUE_MAX;

pub const STARTING_CAPITAL: f64 = 100_000.0;

// Soil factors (fractions of current soil per round).
pub const FALLOW_BASE_RECOVERY: f64 = 0.01;
pub const FALLOW_RECOVERY_RATE: f64 = 0.5;
/// Fallow stops rebuilding soil above this level.
pub const FALLOW_SOIL_CEILING: f64 = 120.0;
pub const FERTILIZER_SOIL_FACTOR: f64 = -0.01;
pub const PESTICIDE_SOIL_FACTOR: f64 = -0.01;
pub const MONOCULTURE_PENALTY: f64 = -0.02;
/// Replaces [`MONOCULTURE_PENALTY`] on the third consecutive round of one crop.
pub const MONOCULTURE_STREAK_PENALTY: f64 = -0.04;

// Nutrients (absolute points).
pub const SYNTHETIC_FERTILIZER_GAIN: f64 = 40.0;
pub const MANURE_GAIN: f64 = 30.0;
/// Share of Grass parcels at which manure supply is at its maximum.
pub const MANURE_FULL_SHARE: f64 = 0.25;
pub const LEGUME_NITROGEN_BONUS: f64 = 15.0;
pub const FALLOW_NUTRIENT_RESET_RATE: f64 = 0.5;
pub const MIN_INTAKE_SOIL_EFFICIENCY: f64 = 0.25;
pub const YIELD_RATIO_MAX: f64 = 2.0;

// Running costs per round.
pub const RUNNING_BASE_CONVENTIONAL: f64 = 2_000.0;
pub const RUNNING_BASE_ORGANIC: f64 = 2_500.0;
pub const FERTILIZER_COST: f64 = 1_500.0;
pub const PESTICIDE_COST: f64 = 1_200.0;
pub const BIOLOGICAL_CONTROL_COST: f64 = 1_000.0;

// Market feedback.
pub const MARKET_PRICE_FLOOR: f64 = 0.7;
pub const MARKET_PRICE_CEILING: f64 = 1.3;
pub const MARKET_ELASTICITY: f64 = 0.5;

// Vermin losses (fraction of yield lost per matching pest).
pub const VERMIN_LOSS: f64 = 0.3;
pub const VERMIN_LOSS_PESTICIDE: f64 = 0.05;
pub const VERMIN_LOSS_BIOLOGICAL: f64 = 0.15;
pub const VERMIN_LOSS_BOTH: f64 = 0.03;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CropProfile {
    /// Decitonnes per parcel at baseline soil and nutrition.
    pub base_yield: f64,
    pub soil_sensitivity: f64,
    pub nutrient_sensitivity: f64,
    /// Soil gain (+) or loss (-) as a fraction of current soil.
    pub soil_factor: f64,
    /// Nutrient points drawn at a yield ratio of 1.
    pub nutrient_draw: f64,
    pub price_conventional: f64,
    pub price_organic: f64,
    pub seed_conventional: f64,
    pub seed_organic: f64,
}

const NO_HARVEST: CropProfile = CropProfile {
    base_yield: 0.0,
    soil_sensitivity: 0.0,
    nutrient_sensitivity: 0.0,
    soil_factor: 0.0,
    nutrient_draw: 0.0,
    price_conventional: 0.0,
    price_organic: 0.0,
    seed_conventional: 0.0,
    seed_organic: 0.0,
};

pub const fn crop_profile(crop: CropType) -> CropProfile {
    match crop {
        CropType::Fieldbean => CropProfile {
            base_yield: 35.0,
            soil_sensitivity: 0.6,
            nutrient_sensitivity: 0.3,
            soil_factor: 0.02,
            nutrient_draw: 4.0,
            price_conventional: 22.0,
            price_organic: 40.0,
            seed_conventional: 140.0,
            seed_organic: 190.0,
        },
        CropType::Barley => CropProfile {
            base_yield: 60.0,
            soil_sensitivity: 0.9,
            nutrient_sensitivity: 0.8,
            soil_factor: -0.01,
            nutrient_draw: 12.0,
            price_conventional: 15.0,
            price_organic: 30.0,
            seed_conventional: 100.0,
            seed_organic: 140.0,
        },
        CropType::Oat => CropProfile {
            base_yield: 55.0,
            soil_sensitivity: 0.7,
            nutrient_sensitivity: 0.6,
            soil_factor: -0.005,
            nutrient_draw: 10.0,
            price_conventional: 14.0,
            price_organic: 28.0,
            seed_conventional: 90.0,
            seed_organic: 125.0,
        },
        CropType::Potato => CropProfile {
            base_yield: 400.0,
            soil_sensitivity: 1.3,
            nutrient_sensitivity: 1.2,
            soil_factor: -0.03,
            nutrient_draw: 18.0,
            price_conventional: 4.0,
            price_organic: 8.0,
            seed_conventional: 450.0,
            seed_organic: 600.0,
        },
        CropType::Corn => CropProfile {
            base_yield: 90.0,
            soil_sensitivity: 1.2,
            nutrient_sensitivity: 1.3,
            soil_factor: -0.035,
            nutrient_draw: 20.0,
            price_conventional: 16.0,
            price_organic: 30.0,
            seed_conventional: 200.0,
            seed_organic: 260.0,
        },
        CropType::Rye => CropProfile {
            base_yield: 55.0,
            soil_sensitivity: 0.5,
            nutrient_sensitivity: 0.5,
            soil_factor: -0.01,
            nutrient_draw: 8.0,
            price_conventional: 14.0,
            price_organic: 27.0,
            seed_conventional: 90.0,
            seed_organic: 120.0,
        },
        CropType::Wheat => CropProfile {
            base_yield: 75.0,
            soil_sensitivity: 1.1,
            nutrient_sensitivity: 1.1,
            soil_factor: -0.02,
            nutrient_draw: 15.0,
            price_conventional: 17.0,
            price_organic: 34.0,
            seed_conventional: 120.0,
            seed_organic: 165.0,
        },
        CropType::Beet => CropProfile {
            base_yield: 600.0,
            soil_sensitivity: 1.4,
            nutrient_sensitivity: 1.2,
            soil_factor: -0.03,
            nutrient_draw: 20.0,
            price_conventional: 1.2,
            price_organic: 2.4,
            seed_conventional: 250.0,
            seed_organic: 330.0,
        },
        CropType::Fallow => NO_HARVEST,
        CropType::Grass => CropProfile {
            soil_factor: 0.02,
            ..NO_HARVEST
        },
    }
}

pub fn base_price(crop: CropType, organic: bool) -> f64 {
    let profile = crop_profile(crop);
    if organic {
        profile.price_organic
    } else {
        profile.price_conventional
    }
}

pub fn seed_cost(crop: CropType, organic: bool) -> f64 {
    let profile = crop_profile(crop);
    if organic {
        profile.seed_organic
    } else {
        profile.seed_conventional
    }
}

/// How well a crop follows the previous crop on the same parcel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SequenceRating {
    Good,
    Ok,
    Bad,
}

impl SequenceRating {
    pub const fn soil_factor(self) -> f64 {
        match self {
            SequenceRating::Good => 0.02,
            SequenceRating::Ok => 0.0,
            SequenceRating::Bad => -0.02,
        }
    }
}

use SequenceRating::{Bad as B, Good as G, Ok as O};

/// Rows: previous crop, columns: next crop, both in `CropType::ALL` order.
const SEQUENCE_MATRIX: [[SequenceRating; 10]; 10] = [
    //  Fb Ba Oa Po Co Ry Wh Be Fa Gr
    [B, G, G, G, G, G, G, G, O, O], // Fieldbean
    [G, B, O, G, O, O, B, G, O, O], // Barley
    [G, O, B, G, O, O, O, G, O, O], // Oat
    [O, G, G, B, O, G, G, B, O, O], // Potato
    [G, O, O, O, B, O, B, O, O, O], // Corn
    [G, O, O, G, G, B, B, G, O, O], // Rye
    [G, O, O, G, G, B, B, G, O, O], // Wheat
    [O, G, O, B, O, O, G, B, O, O], // Beet
    [G, G, G, G, G, G, G, G, O, O], // Fallow
    [O, O, G, G, G, O, O, O, O, O], // Grass
];

pub const fn sequence_rating(previous: CropType, next: CropType) -> SequenceRating {
    SEQUENCE_MATRIX[previous.index()][next.index()]
}

pub const fn weather_yield_factor(weather: Weather) -> f64 {
    match weather {
        Weather::Normal => 1.0,
        Weather::Drought => 0.75,
        Weather::Flood => 0.8,
        Weather::Frost => 0.85,
        Weather::Storm => 0.9,
    }
}

pub const fn weather_soil_factor(weather: Weather) -> f64 {
    match weather {
        Weather::Normal => 0.0,
        Weather::Drought => -0.01,
        Weather::Flood => -0.02,
        Weather::Frost => -0.005,
        Weather::Storm => -0.01,
    }
}

/// Probability weights for weather draws, in `Weather::ALL` order.
pub const WEATHER_WEIGHTS: [u32; 5] = [55, 12, 10, 10, 13];

/// Per-round probability that each vermin appears.
pub const VERMIN_PROBABILITY: f64 = 0.15;

pub const fn vermin_attacks(vermin: Vermin, crop: CropType) -> bool {
    match vermin {
        Vermin::Aphid => matches!(
            crop,
            CropType::Wheat
                | CropType::Barley
                | CropType::Oat
                | CropType::Rye
                | CropType::Fieldbean
        ),
        Vermin::PotatoBeetle => matches!(crop, CropType::Potato),
        Vermin::CornBorer => matches!(crop, CropType::Corn),
        Vermin::FritFly => matches!(crop, CropType::Oat | CropType::Corn),
        Vermin::Nematode => matches!(crop, CropType::Beet | CropType::Potato),
    }
}

pub const fn vermin_loss(pesticide: bool, biological_control: bool) -> f64 {
    match (pesticide, biological_control) {
        (false, false) => VERMIN_LOSS,
        (true, false) => VERMIN_LOSS_PESTICIDE,
        (false, true) => VERMIN_LOSS_BIOLOGICAL,
        (true, true) => VERMIN_LOSS_BOTH,
    }
}

const MACHINE_SOIL_PENALTY: [f64; MAX_MACHINE_LEVEL as usize + 1] =
    [0.0, -0.005, -0.01, -0.02, -0.03];
const MACHINE_INVESTMENT_COST: [f64; MAX_MACHINE_LEVEL as usize + 1] =
    [0.0, 1_000.0, 2_500.0, 4_500.0, 7_000.0];

/// Soil factor for a machine level; levels above the maximum use the maximum.
pub fn machine_soil_penalty(level: u8) -> f64 {
    MACHINE_SOIL_PENALTY[usize::from(level.min(MAX_MACHINE_LEVEL))]
}

pub fn machine_investment_cost(level: u8) -> f64 {
    MACHINE_INVESTMENT_COST[usize::from(level.min(MAX_MACHINE_LEVEL))]
}
