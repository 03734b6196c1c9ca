use game_core::{SessionStatus, ValidationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GameError {
    #[error("game {0} not found")]
    SessionNotFound(String),
    #[error("team {0} not found")]
    TeamNotFound(String),
    #[error("team code required for this game")]
    TeamCodeRequired,
    #[error("invalid team code")]
    InvalidTeamCode,
    #[error("this team code has already been used")]
    TeamCodeUsed,
    #[error("team name {0} already taken")]
    DuplicateTeamName(String),
    #[error("game is full ({max} teams)")]
    TooManyTeams { max: u32 },
    #[error("need at least {min} teams to start")]
    NotEnoughTeams { min: u32 },
    #[error("round is locked")]
    RoundLocked,
    #[error("decision already saved for round {0}")]
    DecisionAlreadySaved(u32),
    #[error("game is not running")]
    NotRunning,
    #[error("game has finished")]
    GameFinished,
    #[error("cannot move game from {from} to {to}")]
    InvalidTransition {
        from: SessionStatus,
        to: SessionStatus,
    },
    #[error("wrong admin password")]
    Unauthorized,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

pub type GameResult<T> = Result<T, GameError>;
