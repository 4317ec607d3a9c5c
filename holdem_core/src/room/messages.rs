//! Commands accepted by a room's actor. Responses that matter for gateway
//! control flow use oneshot channels; everything else is fire-and-forget,
//! with outcomes (including errors) delivered as frames on the
//! connection's outbound channel so per-room ordering is preserved.

use tokio::sync::{mpsc, oneshot};

use crate::game::entities::{ActionRequest, ConnectionId, PlayerId, SeatIndex};
use crate::net::errors::ErrorEvent;

use super::RoomId;

/// Pre-serialized frames bound for one connection. Sends to dead
/// connections are dropped silently.
pub type OutboundSender = mpsc::UnboundedSender<String>;

/// Successful room binding, returned to the gateway so it can route
/// subsequent commands.
#[derive(Clone, Debug)]
pub struct JoinAck {
    pub room_id: RoomId,
    pub player_id: PlayerId,
    pub is_reconnect: bool,
}

#[derive(Debug)]
pub enum RoomCommand {
    /// Bind a connection to the room: fresh spectator join, or a
    /// reconnect when `existing` is known. `require_existing` makes an
    /// unknown `existing` an error instead of a fresh join (the strict
    /// RECONNECT path).
    Join {
        nickname: String,
        existing: Option<PlayerId>,
        require_existing: bool,
        connection: ConnectionId,
        sender: OutboundSender,
        response: oneshot::Sender<Result<JoinAck, ErrorEvent>>,
    },
    SitDown {
        player_id: PlayerId,
        connection: ConnectionId,
        seat_index: SeatIndex,
    },
    StandUp {
        player_id: PlayerId,
        connection: ConnectionId,
    },
    StartGame {
        player_id: PlayerId,
        connection: ConnectionId,
    },
    Action {
        player_id: PlayerId,
        connection: ConnectionId,
        request: ActionRequest,
    },
    Ready {
        player_id: PlayerId,
        connection: ConnectionId,
    },
    Kick {
        player_id: PlayerId,
        connection: ConnectionId,
        target: PlayerId,
    },
    /// Leave the room for good. The gateway unbinds on `Ok`.
    Leave {
        player_id: PlayerId,
        connection: ConnectionId,
        response: oneshot::Sender<Result<(), ErrorEvent>>,
    },
    /// The socket closed. Seated players are kept (their timers keep
    /// running); unseated spectators are removed.
    Detach { connection: ConnectionId },
}
