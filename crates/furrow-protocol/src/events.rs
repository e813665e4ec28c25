use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Weather {
    #[default]
    Normal,
    Drought,
    Flood,
    Frost,
    Storm,
}

impl Weather {
    pub const ALL: [Weather; 5] = [
        Weather::Normal,
        Weather::Drought,
        Weather::Flood,
        Weather::Frost,
        Weather::Storm,
    ];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Vermin {
    Aphid,
    PotatoBeetle,
    CornBorer,
    FritFly,
    Nematode,
}

impl Vermin {
    pub const ALL: [Vermin; 5] = [
        Vermin::Aphid,
        Vermin::PotatoBeetle,
        Vermin::CornBorer,
        Vermin::FritFly,
        Vermin::Nematode,
    ];
}

/// Exogenous conditions for one round, shared by every player of a game.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundEvents {
    pub weather: Weather,
    #[serde(default)]
    pub vermin: BTreeSet<Vermin>,
}

impl RoundEvents {
    pub fn calm() -> Self {
        Self::default()
    }

    pub fn new(weather: Weather, vermin: impl IntoIterator<Item = Vermin>) -> Self {
        Self {
            weather,
            vermin: vermin.into_iter().collect(),
        }
    }
}
