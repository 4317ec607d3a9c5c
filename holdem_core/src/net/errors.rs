//! Error codes surfaced to clients. Every code maps to exactly one
//! `ERROR` frame scoped to the originating request; broadcasts never carry
//! errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    #[error("room not found")]
    RoomNotFound,
    #[error("you are not in a room")]
    NotInRoom,
    #[error("only the host can do that")]
    NotHost,
    #[error("the game has already started")]
    GameAlreadyStarted,
    #[error("need at least 2 seated players with chips")]
    NotEnoughPlayers,
    #[error("not possible while a game is in progress")]
    GameInProgress,
    #[error("seat is occupied")]
    SeatOccupied,
    #[error("you are already seated")]
    AlreadySeated,
    #[error("seat index out of range")]
    InvalidSeatIndex,
    #[error("you are not seated")]
    NotSeated,
    #[error("you can't kick yourself")]
    CannotKickSelf,
    #[error("target player not found")]
    TargetNotFound,
    #[error("duplicate request")]
    DuplicateRequest,
    #[error("request targets a finished betting round")]
    StaleRequest,
    #[error("not your turn")]
    NotYourTurn,
    #[error("you can't act right now")]
    CannotAct,
    #[error("there is a bet to you, call or fold")]
    CannotCheckMustCall,
    #[error("nothing to call, check instead")]
    NothingToCall,
    #[error("raise is below the minimum")]
    RaiseTooSmall,
    #[error("not enough chips")]
    NotEnoughChips,
    #[error("seated players are not all ready")]
    PlayersNotReady,
    #[error("malformed request")]
    BadRequest,
}

/// The wire payload of an `ERROR` frame.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEvent {
    pub code: ErrorCode,
    pub message: String,
    /// Instructs the client to drop its stored `{roomId, playerId}`
    /// session. Set on reconnects into dead rooms and on kicks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub should_clear_session: Option<bool>,
}

impl ErrorEvent {
    #[must_use]
    pub fn new(code: ErrorCode) -> Self {
        Self {
            code,
            message: code.to_string(),
            should_clear_session: None,
        }
    }

    #[must_use]
    pub fn clearing_session(code: ErrorCode) -> Self {
        Self {
            code,
            message: code.to_string(),
            should_clear_session: Some(true),
        }
    }

    #[must_use]
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            should_clear_session: None,
        }
    }
}

impl From<ErrorCode> for ErrorEvent {
    fn from(code: ErrorCode) -> Self {
        Self::new(code)
    }
}
