//! # holdem_core
//!
//! The authoritative server core of a multi-room Texas Hold'em game: the
//! state machine that owns every room's ground truth, serializes player
//! actions against a versioned snapshot, drives betting rounds and
//! side-pot settlement, and produces typed, privacy-projected events for
//! the gateway to fan out.
//!
//! ## Architecture
//!
//! - [`game`]: pure poker logic (deck, evaluation, side pots) and the
//!   per-room hand controller.
//! - [`room`]: room lifecycle, seating, host transfer, and the per-room
//!   actor that serializes every mutation.
//! - [`net`]: wire messages, public projections, and error codes.
//!
//! Each room is owned by exactly one actor task consuming a command
//! channel; multiple rooms run concurrently but no two mutations of the
//! same room ever interleave. Every outbound event carries the room's
//! monotonic `stateVersion`.

pub mod game;
pub mod net;
pub mod room;

pub use game::{
    constants,
    entities::{self, ActionKind, ActionRequest, Card, Chips, Deck, Player, PlayerId, Suit},
    eval,
    state::{GamePhase, GameState, HandResult},
};
pub use net::{
    errors::{ErrorCode, ErrorEvent},
    messages::{ClientCommand, Envelope, RoomSnapshot, ServerEvent},
};
pub use room::{
    actor::{RoomActor, RoomHandle},
    config::{RoomConfig, RoomConfigOverrides},
    manager::RoomManager,
    messages::{JoinAck, OutboundSender, RoomCommand},
    Room, RoomId,
};
