use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::CropType;

/// Per-crop sale prices (per decitonne) for one round.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketPrices {
    pub conventional: BTreeMap<CropType, f64>,
    pub organic: BTreeMap<CropType, f64>,
}

impl MarketPrices {
    /// Price for `crop`; crops missing from the table sell for nothing.
    pub fn price(&self, crop: CropType, organic: bool) -> f64 {
        let table = if organic {
            &self.organic
        } else {
            &self.conventional
        };
        table.get(&crop).copied().unwrap_or(0.0)
    }
}
