use serde::{Deserialize, Serialize};

use crate::{CropType, ParcelIndex};

/// Number of parcels in every player's field.
pub const FIELD_SIZE: usize = 40;

/// Upper bound for both soil quality and nutrition.
pub const PARCEL_VALUE_MAX: f64 = 200.0;

/// One independently tracked cell of a field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Parcel {
    pub index: ParcelIndex,
    /// Crop planted in this round.
    pub crop: CropType,
    /// Crop planted one round earlier; omitted by older records.
    #[serde(default)]
    pub previous_crop: Option<CropType>,
    /// Soil quality, always within `0..=200`.
    pub soil: f64,
    /// Nutrient level, always within `0..=200`.
    pub nutrition: f64,
    /// Harvested quantity in decitonnes.
    pub harvest_yield: f64,
}

impl Parcel {
    pub fn new(index: ParcelIndex, crop: CropType, soil: f64, nutrition: f64) -> Self {
        Self {
            index,
            crop,
            previous_crop: None,
            soil,
            nutrition,
            harvest_yield: 0.0,
        }
    }

    pub fn in_bounds(&self) -> bool {
        (0.0..=PARCEL_VALUE_MAX).contains(&self.soil)
            && (0.0..=PARCEL_VALUE_MAX).contains(&self.nutrition)
    }
}

/// Mean soil quality across a field (0 for an empty slice).
pub fn mean_soil(parcels: &[Parcel]) -> f64 {
    if parcels.is_empty() {
        return 0.0;
    }
    parcels.iter().map(|p| p.soil).sum::<f64>() / parcels.len() as f64
}

/// Mean nutrition across a field (0 for an empty slice).
pub fn mean_nutrition(parcels: &[Parcel]) -> f64 {
    if parcels.is_empty() {
        return 0.0;
    }
    parcels.iter().map(|p| p.nutrition).sum::<f64>() / parcels.len() as f64
}
