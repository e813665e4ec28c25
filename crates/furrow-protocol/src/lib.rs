//! Shared data model for Furrow games: fields, decisions, rounds, players and games.
//!
//! Everything here is plain serde data; the simulation lives in `furrow-core` and
//! the round coordination in `furrow-server`.

mod crop;
mod decision;
mod events;
mod field;
mod game;
mod ids;
mod market;
mod round;
pub mod wire;

pub use crop::*;
pub use decision::*;
pub use events::*;
pub use field::*;
pub use game::*;
pub use ids::*;
pub use market::*;
pub use round::*;
