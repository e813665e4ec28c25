use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{CropType, Parcel, RoundDecision, RoundEvents};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Expenses {
    pub seeds: f64,
    pub running: f64,
    pub investment: f64,
    pub total: f64,
}

impl Expenses {
    pub fn new(seeds: f64, running: f64, investment: f64) -> Self {
        Self {
            seeds,
            running,
            investment,
            total: seeds + running + investment,
        }
    }
}

/// Financial and harvest outcome of one round for one player.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundResult {
    pub income: f64,
    pub expenses: Expenses,
    /// Always `income - expenses.total`.
    pub profit: f64,
    /// Capital after this round: previous capital plus `profit`.
    pub capital: f64,
    pub harvest_summary: BTreeMap<CropType, f64>,
    pub events: RoundEvents,
    pub organic_certified: bool,
}

/// One player's complete round: decision, resulting field, and result.
///
/// Round 0 is the initial field and has no result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Round {
    pub number: u32,
    pub decision: RoundDecision,
    pub parcels: Vec<Parcel>,
    #[serde(default)]
    pub result: Option<RoundResult>,
}

impl Round {
    pub fn lightweight(&self) -> LightweightRound {
        LightweightRound {
            number: self.number,
            decision: self.decision.clone(),
            result: self.result.clone(),
        }
    }
}

/// History entry kept on the player record; the field snapshot lives in the round record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LightweightRound {
    pub number: u32,
    pub decision: RoundDecision,
    #[serde(default)]
    pub result: Option<RoundResult>,
}
