use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{GameId, LightweightRound, MarketPrices, PlayerUid, Round, RoundDecision, RoundEvents};

/// Skill tier of an AI farmer, in increasing sophistication.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AiLevel {
    Elementary,
    #[default]
    Middle,
    High,
    Perfect,
}

impl AiLevel {
    pub const ALL: [AiLevel; 4] = [
        AiLevel::Elementary,
        AiLevel::Middle,
        AiLevel::High,
        AiLevel::Perfect,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AiLevel::Elementary => "elementary",
            AiLevel::Middle => "middle",
            AiLevel::High => "high",
            AiLevel::Perfect => "perfect",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let lowered = name.to_lowercase();
        AiLevel::ALL.into_iter().find(|l| l.name() == lowered)
    }
}

impl fmt::Display for AiLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub uid: PlayerUid,
    pub is_ai: bool,
    #[serde(default)]
    pub ai_level: Option<AiLevel>,
    pub capital: f64,
    /// Last round calculated for this player.
    pub current_round: u32,
    /// Round the pending decision was submitted for.
    #[serde(default)]
    pub submitted_round: Option<u32>,
    #[serde(default)]
    pub pending_decision: Option<RoundDecision>,
    /// Rounds in which the deadline sweep decided on this player's behalf.
    #[serde(default)]
    pub defaulted_rounds: Vec<u32>,
    #[serde(default)]
    pub history: Vec<LightweightRound>,
}

impl PlayerState {
    pub fn human(uid: PlayerUid, capital: f64) -> Self {
        Self {
            uid,
            is_ai: false,
            ai_level: None,
            capital,
            current_round: 0,
            submitted_round: None,
            pending_decision: None,
            defaulted_rounds: Vec::new(),
            history: Vec::new(),
        }
    }

    pub fn ai(uid: PlayerUid, level: AiLevel, capital: f64) -> Self {
        Self {
            is_ai: true,
            ai_level: Some(level),
            ..Self::human(uid, capital)
        }
    }

    pub fn has_submitted(&self, round: u32) -> bool {
        self.submitted_round == Some(round) && self.pending_decision.is_some()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameStatus {
    /// Waiting for human seats to fill.
    Waiting,
    InProgress,
    Finished,
    /// Lobby timed out before the game started.
    Expired,
    Deleted,
}

impl GameStatus {
    /// Terminal states: the game can be read but no longer changed.
    pub fn is_read_only(self) -> bool {
        matches!(
            self,
            GameStatus::Finished | GameStatus::Expired | GameStatus::Deleted
        )
    }
}

/// The single mutable record per game.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub id: GameId,
    pub host_uid: PlayerUid,
    pub host_secret_hash: u64,
    pub status: GameStatus,
    pub created_at: DateTime<Utc>,
    /// Seed from which every round's events and AI choices are derived.
    pub seed: u64,
    /// Last calculated round; players submit for `current_round_number + 1`.
    pub current_round_number: u32,
    pub round_limit: u32,
    /// Number of human seats, including the host.
    pub human_slots: u32,
    pub ai_level_default: AiLevel,
    #[serde(default)]
    pub dynamic_pricing: bool,
    pub players: BTreeMap<PlayerUid, PlayerState>,
    /// Events for the open round, drawn once when the round opened.
    pub pending_events: RoundEvents,
    #[serde(default)]
    pub last_market_prices: Option<MarketPrices>,
    #[serde(default)]
    pub round_deadlines: BTreeMap<u32, DateTime<Utc>>,
}

impl GameState {
    /// The round currently collecting decisions.
    pub fn open_round(&self) -> u32 {
        self.current_round_number + 1
    }

    pub fn humans(&self) -> impl Iterator<Item = &PlayerState> {
        self.players.values().filter(|p| !p.is_ai)
    }

    pub fn free_human_slots(&self) -> u32 {
        self.human_slots
            .saturating_sub(self.humans().count() as u32)
    }

    pub fn all_submitted(&self) -> bool {
        let round = self.open_round();
        !self.players.is_empty() && self.players.values().all(|p| p.has_submitted(round))
    }

    /// Stable position of a player, used to derive per-player seeds.
    pub fn player_index(&self, uid: &PlayerUid) -> Option<usize> {
        self.players.keys().position(|k| k == uid)
    }

    pub fn deadline_for_open_round(&self) -> Option<DateTime<Utc>> {
        self.round_deadlines.get(&self.open_round()).copied()
    }

    pub fn summary(&self) -> GameSummary {
        GameSummary {
            status: self.status,
            current_round_number: self.current_round_number,
            round_limit: self.round_limit,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSummary {
    pub status: GameStatus,
    pub current_round_number: u32,
    pub round_limit: u32,
}

/// Append-only record of one calculated round for every player of a game.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    pub game_id: GameId,
    pub number: u32,
    pub events: RoundEvents,
    /// Prices used for the round when dynamic pricing applied.
    #[serde(default)]
    pub market_prices: Option<MarketPrices>,
    pub rounds: BTreeMap<PlayerUid, Round>,
}
