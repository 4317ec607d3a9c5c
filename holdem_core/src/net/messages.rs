//! Typed wire messages and the server-authoritative projection.
//!
//! Outbound events are wrapped in an [`Envelope`] carrying the room's
//! monotonic `stateVersion`; clients drop events at or below the last
//! version they saw. `ERROR` frames are request-scoped, exempt from that
//! stale-drop rule, and stamped with version 0 when no room is bound yet.
//!
//! The projection rule is structural: [`PlayerPublic`] has no hole-card
//! field at all, so no broadcast can leak a hand. Private cards travel
//! only in `DEAL_CARDS`, in `RECONNECTED`/`SYNC_STATE` `myCards` aimed at
//! one connection, and in `HAND_RESULT` showdown disclosure.

use serde::{Deserialize, Serialize};

use crate::game::entities::{
    ActionKind, Card, Chips, Player, PlayerId, PlayerStatus, SeatIndex,
};
use crate::game::state::{GamePhase, GameState, HandId, HandResult, RoundId};
use crate::room::config::{RoomConfig, RoomConfigOverrides};
use crate::room::{Room, RoomId};

use super::errors::{ErrorCode, ErrorEvent};

/// Inbound client commands. The `type` tag uses the event-name style of
/// the outbound side.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientCommand {
    #[serde(rename_all = "camelCase")]
    CreateRoom {
        host_nickname: String,
        #[serde(default)]
        config: RoomConfigOverrides,
    },
    #[serde(rename_all = "camelCase")]
    JoinRoom {
        room_id: String,
        nickname: String,
        /// When present and known, the join is a reconnect binding.
        #[serde(default)]
        player_id: Option<PlayerId>,
    },
    #[serde(rename_all = "camelCase")]
    SitDown { seat_index: SeatIndex },
    StandUp,
    StartGame,
    #[serde(rename_all = "camelCase")]
    PlayerAction {
        action: ActionKind,
        #[serde(default)]
        amount: Option<Chips>,
        round_index: u32,
        request_id: String,
    },
    PlayerReady,
    #[serde(rename_all = "camelCase")]
    KickPlayer { target_player_id: PlayerId },
    LeaveRoom,
    #[serde(rename_all = "camelCase")]
    Reconnect {
        room_id: String,
        player_id: PlayerId,
    },
}

/// The public view of a player. Deliberately has no hole-card field.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerPublic {
    pub id: PlayerId,
    pub nickname: String,
    pub chips: Chips,
    pub current_bet: Chips,
    pub total_bet_this_hand: Chips,
    pub status: PlayerStatus,
    pub seat_index: Option<SeatIndex>,
    pub has_acted: bool,
    pub is_current_turn: bool,
    pub is_dealer: bool,
    pub is_host: bool,
    pub is_ready: bool,
    pub is_connected: bool,
    /// How many cards the player holds, never which.
    pub hole_card_count: usize,
}

impl PlayerPublic {
    #[must_use]
    pub fn project(player: &Player) -> Self {
        Self {
            id: player.id,
            nickname: player.nickname.clone(),
            chips: player.chips,
            current_bet: player.current_bet,
            total_bet_this_hand: player.total_bet_this_hand,
            status: player.status,
            seat_index: player.seat,
            has_acted: player.has_acted,
            is_current_turn: player.is_current_turn,
            is_dealer: player.is_dealer,
            is_host: player.is_host,
            is_ready: player.is_ready,
            is_connected: player.connection.is_some(),
            hole_card_count: player.hole_cards.len(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PotPublic {
    pub amount: Chips,
    pub eligible_player_ids: Vec<PlayerId>,
}

/// The public view of a hand in progress. The deck is absent by
/// construction.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GamePublic {
    pub phase: GamePhase,
    pub community_cards: Vec<Card>,
    pub pots: Vec<PotPublic>,
    /// Running total including the current round's bets.
    pub pot_total: Chips,
    pub current_player_seat: Option<SeatIndex>,
    pub dealer_seat: SeatIndex,
    pub small_blind_seat: SeatIndex,
    pub big_blind_seat: SeatIndex,
    pub current_bet: Chips,
    pub min_raise: Chips,
    pub round_index: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn_deadline_ms: Option<u64>,
    pub hand_id: HandId,
    pub round_id: RoundId,
    pub hand_number: u64,
}

impl GamePublic {
    fn project(game: &GameState, players: &[Player]) -> Self {
        let pot_total = players
            .iter()
            .filter(|p| p.in_hand())
            .map(|p| p.total_bet_this_hand)
            .sum();
        Self {
            phase: game.phase,
            community_cards: game.community.clone(),
            pots: game
                .pots
                .iter()
                .map(|pot| PotPublic {
                    amount: pot.amount,
                    eligible_player_ids: pot.eligible.clone(),
                })
                .collect(),
            pot_total,
            current_player_seat: game.current_seat,
            dealer_seat: game.dealer_seat,
            small_blind_seat: game.small_blind_seat,
            big_blind_seat: game.big_blind_seat,
            current_bet: game.current_bet,
            min_raise: game.min_raise,
            round_index: game.round_index,
            turn_deadline_ms: game.turn_deadline_ms,
            hand_id: game.hand_id,
            round_id: game.round_id,
            hand_number: game.hand_number,
        }
    }
}

/// The full public snapshot of a room, safe to send to any client.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub room_id: RoomId,
    pub host_id: PlayerId,
    pub config: RoomConfig,
    pub is_playing: bool,
    pub players: Vec<PlayerPublic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game: Option<GamePublic>,
}

impl RoomSnapshot {
    #[must_use]
    pub fn project(room: &Room) -> Self {
        Self {
            room_id: room.id.clone(),
            host_id: room.host_id,
            config: room.config.clone(),
            is_playing: room.is_playing,
            players: room.players.iter().map(PlayerPublic::project).collect(),
            game: room
                .game
                .as_ref()
                .map(|game| GamePublic::project(game, &room.players)),
        }
    }
}

/// Outbound events. Tag names are the protocol's event names.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerEvent {
    #[serde(rename_all = "camelCase")]
    RoomCreated {
        room_id: RoomId,
        player_id: PlayerId,
        snapshot: RoomSnapshot,
    },
    #[serde(rename_all = "camelCase")]
    RoomJoined {
        room_id: RoomId,
        player_id: PlayerId,
        snapshot: RoomSnapshot,
    },
    #[serde(rename_all = "camelCase")]
    RoomUpdated { snapshot: RoomSnapshot },
    #[serde(rename_all = "camelCase")]
    PlayerJoined { player: PlayerPublic },
    #[serde(rename_all = "camelCase")]
    PlayerLeft { player_id: PlayerId },
    #[serde(rename_all = "camelCase")]
    PlayerSat {
        player_id: PlayerId,
        seat_index: SeatIndex,
    },
    #[serde(rename_all = "camelCase")]
    PlayerStood { player_id: PlayerId },
    #[serde(rename_all = "camelCase")]
    PlayerKicked {
        player_id: PlayerId,
        #[serde(skip_serializing_if = "Option::is_none")]
        should_clear_session: Option<bool>,
    },
    #[serde(rename_all = "camelCase")]
    HostTransferred { new_host_id: PlayerId },
    #[serde(rename_all = "camelCase")]
    GameStarted {
        hand_id: HandId,
        hand_number: u64,
        dealer_seat: SeatIndex,
        small_blind_seat: SeatIndex,
        big_blind_seat: SeatIndex,
        snapshot: RoomSnapshot,
    },
    #[serde(rename_all = "camelCase")]
    SyncState {
        snapshot: RoomSnapshot,
        /// Present only on the copy aimed at one connection.
        #[serde(skip_serializing_if = "Option::is_none")]
        my_cards: Option<Vec<Card>>,
    },
    /// Private: one player's hole cards.
    #[serde(rename_all = "camelCase")]
    DealCards {
        hand_id: HandId,
        cards: Vec<Card>,
    },
    #[serde(rename_all = "camelCase")]
    PlayerTurn {
        player_id: PlayerId,
        seat_index: SeatIndex,
        deadline_ms: u64,
        hand_id: HandId,
        round_id: RoundId,
    },
    #[serde(rename_all = "camelCase")]
    PlayerActed {
        player_id: PlayerId,
        seat_index: SeatIndex,
        action: ActionKind,
        paid: Chips,
        bet_to: Chips,
        pot_total: Chips,
        auto: bool,
        hand_id: HandId,
        round_id: RoundId,
    },
    #[serde(rename_all = "camelCase")]
    ReadyStateChanged {
        player_id: PlayerId,
        is_ready: bool,
    },
    #[serde(rename_all = "camelCase")]
    HandResult { result: HandResult },
    #[serde(rename_all = "camelCase")]
    GameEnded { winner_id: PlayerId },
    /// Private: reconnect snapshot including the player's own cards.
    #[serde(rename_all = "camelCase")]
    Reconnected {
        room_id: RoomId,
        player_id: PlayerId,
        snapshot: RoomSnapshot,
        #[serde(skip_serializing_if = "Option::is_none")]
        my_cards: Option<Vec<Card>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        hand_id: Option<HandId>,
        #[serde(skip_serializing_if = "Option::is_none")]
        round_id: Option<RoundId>,
    },
    #[serde(rename_all = "camelCase")]
    Error {
        code: ErrorCode,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        should_clear_session: Option<bool>,
    },
}

impl ServerEvent {
    #[must_use]
    pub fn error(event: &ErrorEvent) -> Self {
        Self::Error {
            code: event.code,
            message: event.message.clone(),
            should_clear_session: event.should_clear_session,
        }
    }
}

/// Every outbound frame: the event plus the room's state version.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Envelope {
    #[serde(rename = "stateVersion")]
    pub state_version: u64,
    #[serde(flatten)]
    pub event: ServerEvent,
}
