use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{CropType, ParcelIndex, FIELD_SIZE};

/// Highest machine investment level a player can choose.
pub const MAX_MACHINE_LEVEL: u8 = 4;

/// Everything a player chooses for one round.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundDecision {
    /// Machine investment level (0..=4).
    pub machine_level: u8,
    /// Farm organically this round (attempt certification).
    pub organic: bool,
    /// Apply synthetic fertilizer.
    pub fertilizer: bool,
    /// Apply chemical pesticide.
    pub pesticide: bool,
    /// Release beneficial insects against vermin.
    pub biological_control: bool,
    /// Crop per parcel; must cover every index exactly once.
    pub parcels: BTreeMap<ParcelIndex, CropType>,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DecisionError {
    #[error("decision assigns {found} parcels, expected {expected}")]
    WrongParcelCount { expected: usize, found: usize },
    #[error("parcel index {0} is outside the field")]
    ParcelOutOfRange(ParcelIndex),
    #[error("machine level {0} exceeds maximum {MAX_MACHINE_LEVEL}")]
    MachineLevelOutOfRange(u8),
}

impl RoundDecision {
    /// A plan that plants `crop` on every parcel with no inputs.
    pub fn uniform(crop: CropType) -> Self {
        Self {
            machine_level: 0,
            organic: false,
            fertilizer: false,
            pesticide: false,
            biological_control: false,
            parcels: (0..FIELD_SIZE as ParcelIndex).map(|i| (i, crop)).collect(),
        }
    }

    pub fn validate(&self) -> Result<(), DecisionError> {
        if self.machine_level > MAX_MACHINE_LEVEL {
            return Err(DecisionError::MachineLevelOutOfRange(self.machine_level));
        }
        if let Some(&index) = self
            .parcels
            .keys()
            .find(|&&i| usize::from(i) >= FIELD_SIZE)
        {
            return Err(DecisionError::ParcelOutOfRange(index));
        }
        if self.parcels.len() != FIELD_SIZE {
            return Err(DecisionError::WrongParcelCount {
                expected: FIELD_SIZE,
                found: self.parcels.len(),
            });
        }
        Ok(())
    }

    pub fn crop_at(&self, index: ParcelIndex) -> Option<CropType> {
        self.parcels.get(&index).copied()
    }

    /// Number of parcels planted with each crop.
    pub fn crop_counts(&self) -> BTreeMap<CropType, usize> {
        let mut counts = BTreeMap::new();
        for crop in self.parcels.values() {
            *counts.entry(*crop).or_insert(0) += 1;
        }
        counts
    }
}
