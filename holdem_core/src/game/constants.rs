//! Game-wide constants and default room configuration values.

use super::entities::Chips;

/// Number of cards in a standard deck.
pub const DECK_SIZE: usize = 52;

/// Minimum seated players with chips required to start a hand.
pub const MIN_PLAYERS_TO_START: usize = 2;

/// Hard cap on seats per room.
pub const MAX_SEATS: usize = 9;

/// Minimum configurable seats per room.
pub const MIN_SEATS: usize = 2;

/// Player count at which heads-up blind rules apply.
pub const HEADS_UP: usize = 2;

/// Hole cards dealt to each playing seat.
pub const HOLE_CARDS_PER_PLAYER: usize = 2;

/// Community cards dealt on the flop.
pub const FLOP_CARDS: usize = 3;

/// Full community board size.
pub const BOARD_SIZE: usize = 5;

/// Capacity of the per-room processed-request buffer.
pub const REQUEST_LOG_CAPACITY: usize = 500;

/// Number of decimal digits in a room id.
pub const ROOM_ID_DIGITS: u32 = 6;

pub const DEFAULT_INITIAL_CHIPS: Chips = 1000;
pub const DEFAULT_SMALL_BLIND: Chips = 10;
pub const DEFAULT_BIG_BLIND: Chips = 20;
pub const DEFAULT_MAX_PLAYERS: usize = 6;
pub const DEFAULT_TURN_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_INTER_HAND_DELAY_SECS: u64 = 3;
