use std::fmt;

use serde::{Deserialize, Serialize};

/// Every crop a parcel can carry in a round.
///
/// `Fallow` and `Grass` never produce harvest income; `Grass` parcels stand
/// for pasture and feed the organic manure supply.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CropType {
    Fieldbean,
    Barley,
    Oat,
    Potato,
    Corn,
    Rye,
    Wheat,
    Beet,
    Fallow,
    Grass,
}

impl CropType {
    pub const ALL: [CropType; 10] = [
        CropType::Fieldbean,
        CropType::Barley,
        CropType::Oat,
        CropType::Potato,
        CropType::Corn,
        CropType::Rye,
        CropType::Wheat,
        CropType::Beet,
        CropType::Fallow,
        CropType::Grass,
    ];

    /// Crops that produce a saleable harvest.
    pub const HARVESTED: [CropType; 8] = [
        CropType::Fieldbean,
        CropType::Barley,
        CropType::Oat,
        CropType::Potato,
        CropType::Corn,
        CropType::Rye,
        CropType::Wheat,
        CropType::Beet,
    ];

    pub fn is_harvested(self) -> bool {
        !matches!(self, CropType::Fallow | CropType::Grass)
    }

    /// Nitrogen-fixing crops.
    pub fn is_legume(self) -> bool {
        matches!(self, CropType::Fieldbean)
    }

    /// Crops used to rebuild soil and nutrients; exempt from the monoculture penalty.
    pub fn is_recovery(self) -> bool {
        matches!(self, CropType::Fallow | CropType::Grass | CropType::Fieldbean)
    }

    /// Stable position in [`CropType::ALL`], used to index constant tables.
    pub const fn index(self) -> usize {
        match self {
            CropType::Fieldbean => 0,
            CropType::Barley => 1,
            CropType::Oat => 2,
            CropType::Potato => 3,
            CropType::Corn => 4,
            CropType::Rye => 5,
            CropType::Wheat => 6,
            CropType::Beet => 7,
            CropType::Fallow => 8,
            CropType::Grass => 9,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CropType::Fieldbean => "fieldbean",
            CropType::Barley => "barley",
            CropType::Oat => "oat",
            CropType::Potato => "potato",
            CropType::Corn => "corn",
            CropType::Rye => "rye",
            CropType::Wheat => "wheat",
            CropType::Beet => "beet",
            CropType::Fallow => "fallow",
            CropType::Grass => "grass",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let lowered = name.to_lowercase();
        CropType::ALL.into_iter().find(|c| c.name() == lowered)
    }
}

impl fmt::Display for CropType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_matches_all_order() {
        for (i, crop) in CropType::ALL.iter().enumerate() {
            assert_eq!(crop.index(), i);
        }
    }

    #[test]
    fn harvested_excludes_fallow_and_grass() {
        assert_eq!(
            CropType::ALL.iter().filter(|c| c.is_harvested()).count(),
            CropType::HARVESTED.len()
        );
        assert!(!CropType::Fallow.is_harvested());
        assert!(!CropType::Grass.is_harvested());
    }

    #[test]
    fn names_round_trip() {
        for crop in CropType::ALL {
            assert_eq!(CropType::from_name(crop.name()), Some(crop));
        }
        assert_eq!(CropType::from_name("Wheat"), Some(CropType::Wheat));
        assert_eq!(CropType::from_name("tulip"), None);
    }
}
