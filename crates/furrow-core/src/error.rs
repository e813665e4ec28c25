use furrow_protocol::DecisionError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("invalid decision: {0}")]
    InvalidDecision(#[from] DecisionError),
    #[error("invalid field: {0}")]
    InvalidField(String),
    #[error("round {round} is outside 1..={limit}")]
    InvalidRound { round: u32, limit: u32 },
    /// The engine produced a state that breaks a simulation invariant.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
