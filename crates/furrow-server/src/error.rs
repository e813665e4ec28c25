//! Error taxonomy for the coordinator and its store.

use std::fmt;

use furrow_core::EngineError;
use furrow_protocol::{GameId, GameStatus, PlayerUid};
use thiserror::Error;

/// Errors from a [`TransactionalStore`](crate::store::TransactionalStore).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("game {0} not found")]
    NotFound(GameId),
    #[error("record already exists: {0}")]
    AlreadyExists(String),
    /// The game changed since it was read.
    #[error("version conflict: expected {expected}, found {found}")]
    Conflict { expected: u64, found: u64 },
    #[error("store backend failure: {0}")]
    Backend(String),
}

/// Transport-neutral classification of a coordinator failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    PermissionDenied,
    FailedPrecondition,
    Aborted,
    Internal,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::NotFound => "not_found",
            ErrorKind::PermissionDenied => "permission_denied",
            ErrorKind::FailedPrecondition => "failed_precondition",
            ErrorKind::Aborted => "aborted",
            ErrorKind::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Error)]
pub enum CoordinatorError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("game {0} not found")]
    GameNotFound(GameId),
    #[error("round {round} of game {game_id} not found")]
    RoundNotFound { game_id: GameId, round: u32 },
    #[error("player {uid} is not part of game {game_id}")]
    PlayerNotFound { game_id: GameId, uid: PlayerUid },
    #[error("player {0} is AI-controlled")]
    AiSeat(PlayerUid),
    #[error("host secret does not match")]
    WrongSecret,
    #[error("game is {0:?}")]
    WrongStatus(GameStatus),
    #[error("player {uid} already submitted for round {round}")]
    AlreadySubmitted { uid: PlayerUid, round: u32 },
    #[error("player {0} already joined")]
    AlreadyJoined(PlayerUid),
    #[error("no free human seat")]
    GameFull,
    #[error("game record changed concurrently")]
    Aborted,
    #[error("gave up after {attempts} conflicting attempts")]
    RetriesExhausted { attempts: u32 },
    #[error("engine failure: {0}")]
    Engine(#[from] EngineError),
    #[error("store failure: {0}")]
    Store(StoreError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl CoordinatorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoordinatorError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            CoordinatorError::Engine(EngineError::InvalidDecision(_)) => ErrorKind::InvalidArgument,
            CoordinatorError::GameNotFound(_)
            | CoordinatorError::RoundNotFound { .. }
            | CoordinatorError::PlayerNotFound { .. } => ErrorKind::NotFound,
            CoordinatorError::AiSeat(_) | CoordinatorError::WrongSecret => {
                ErrorKind::PermissionDenied
            }
            CoordinatorError::WrongStatus(_)
            | CoordinatorError::AlreadySubmitted { .. }
            | CoordinatorError::AlreadyJoined(_)
            | CoordinatorError::GameFull => ErrorKind::FailedPrecondition,
            CoordinatorError::Aborted => ErrorKind::Aborted,
            CoordinatorError::RetriesExhausted { .. }
            | CoordinatorError::Engine(_)
            | CoordinatorError::Store(_)
            | CoordinatorError::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl From<StoreError> for CoordinatorError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => CoordinatorError::GameNotFound(id),
            StoreError::Conflict { .. } => CoordinatorError::Aborted,
            other => CoordinatorError::Store(other),
        }
    }
}

pub type CoordinatorResult<T> = Result<T, CoordinatorError>;
