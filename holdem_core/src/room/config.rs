//! Per-room configuration with validated overrides.

use serde::{Deserialize, Serialize};

use crate::game::constants;
use crate::game::entities::Chips;
use crate::net::errors::{ErrorCode, ErrorEvent};

/// Room settings fixed at creation time.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomConfig {
    pub initial_chips: Chips,
    pub small_blind: Chips,
    pub big_blind: Chips,
    pub max_players: usize,
    pub turn_timeout_seconds: u64,
    pub inter_hand_delay_seconds: u64,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            initial_chips: constants::DEFAULT_INITIAL_CHIPS,
            small_blind: constants::DEFAULT_SMALL_BLIND,
            big_blind: constants::DEFAULT_BIG_BLIND,
            max_players: constants::DEFAULT_MAX_PLAYERS,
            turn_timeout_seconds: constants::DEFAULT_TURN_TIMEOUT_SECS,
            inter_hand_delay_seconds: constants::DEFAULT_INTER_HAND_DELAY_SECS,
        }
    }
}

impl RoomConfig {
    /// Apply client-supplied overrides on top of this config, validating
    /// the result.
    pub fn with_overrides(&self, overrides: &RoomConfigOverrides) -> Result<Self, ErrorEvent> {
        let config = Self {
            initial_chips: overrides.initial_chips.unwrap_or(self.initial_chips),
            small_blind: overrides.small_blind.unwrap_or(self.small_blind),
            big_blind: overrides.big_blind.unwrap_or(self.big_blind),
            max_players: overrides.max_players.unwrap_or(self.max_players),
            turn_timeout_seconds: overrides
                .turn_timeout_seconds
                .unwrap_or(self.turn_timeout_seconds),
            inter_hand_delay_seconds: overrides
                .inter_hand_delay_seconds
                .unwrap_or(self.inter_hand_delay_seconds),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ErrorEvent> {
        if self.initial_chips == 0 {
            return Err(ErrorEvent::with_message(
                ErrorCode::BadRequest,
                "initialChips must be positive",
            ));
        }
        if self.small_blind == 0 || self.big_blind == 0 {
            return Err(ErrorEvent::with_message(
                ErrorCode::BadRequest,
                "blinds must be positive",
            ));
        }
        if self.big_blind < self.small_blind {
            return Err(ErrorEvent::with_message(
                ErrorCode::BadRequest,
                "bigBlind must be at least the smallBlind",
            ));
        }
        if self.big_blind > self.initial_chips {
            return Err(ErrorEvent::with_message(
                ErrorCode::BadRequest,
                "initialChips must cover the big blind",
            ));
        }
        if !(constants::MIN_SEATS..=constants::MAX_SEATS).contains(&self.max_players) {
            return Err(ErrorEvent::with_message(
                ErrorCode::BadRequest,
                format!(
                    "maxPlayers must be within [{}, {}]",
                    constants::MIN_SEATS,
                    constants::MAX_SEATS
                ),
            ));
        }
        if self.turn_timeout_seconds == 0 {
            return Err(ErrorEvent::with_message(
                ErrorCode::BadRequest,
                "turnTimeoutSeconds must be positive",
            ));
        }
        Ok(())
    }
}

/// Optional per-field overrides accepted on `CREATE_ROOM`.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoomConfigOverrides {
    pub initial_chips: Option<Chips>,
    pub small_blind: Option<Chips>,
    pub big_blind: Option<Chips>,
    pub max_players: Option<usize>,
    pub turn_timeout_seconds: Option<u64>,
    pub inter_hand_delay_seconds: Option<u64>,
}
