//! Furrow simulation core: constants, the round engine, market pricing and AI farmers.
//!
//! Nothing in this crate performs I/O. The server crate decides when rounds run;
//! this crate only decides what a round produces.

pub mod ai;
pub mod constants;
pub mod engine;
pub mod error;
pub mod invariants;
pub mod market;
pub mod rng;
pub mod selfplay;

pub use ai::AiDecisionMaker;
pub use engine::{calculate_round, initial_field, initial_round};
pub use error::{EngineError, EngineResult};
pub use invariants::check_round;
pub use market::{adjust_prices, aggregate_harvest, expected_yields, static_prices};
pub use rng::{ai_seed, derive_seed, event_seed, mix64, roll_events};
pub use selfplay::{run_selfplay, PlayerMetrics, SelfPlayConfig, SelfPlayResult};
