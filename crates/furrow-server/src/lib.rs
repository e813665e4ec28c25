//! Furrow round coordination
//!
//! Collects player decisions, fills in AI seats, and calculates each round
//! exactly once against a transactional store.

pub mod clock;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod store;
pub mod sweep;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CoordinatorConfig;
pub use coordinator::{
    CreatedGame, ForceOutcome, GameConfig, GameView, RoundCoordinator, SubmitOutcome,
};
pub use error::{CoordinatorError, CoordinatorResult, ErrorKind, StoreError};
pub use store::{InMemoryStore, StoreResult, TransactionalStore, Versioned};
pub use sweep::{DeadlineSweeper, SweepReport};
