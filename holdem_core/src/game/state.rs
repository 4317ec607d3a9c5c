//! Per-hand game state and the typed outcomes the controller produces.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::entities::{ActionKind, Card, Chips, Deck, PlayerId, Pot, SeatIndex};
use super::eval::HandCategory;

/// Opaque per-hand identifier.
pub type HandId = Uuid;

/// Opaque per-betting-round identifier.
pub type RoundId = Uuid;

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GamePhase {
    Idle,
    PreFlop,
    Flop,
    Turn,
    River,
    Showdown,
}

impl GamePhase {
    /// The betting phase that follows this one.
    #[must_use]
    pub fn next(self) -> GamePhase {
        match self {
            Self::Idle => Self::PreFlop,
            Self::PreFlop => Self::Flop,
            Self::Flop => Self::Turn,
            Self::Turn => Self::River,
            Self::River | Self::Showdown => Self::Showdown,
        }
    }

    /// Community card count once this phase's cards are dealt.
    #[must_use]
    pub fn community_target(self) -> usize {
        match self {
            Self::Idle | Self::PreFlop => 0,
            Self::Flop => 3,
            Self::Turn => 4,
            Self::River | Self::Showdown => 5,
        }
    }
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Idle => "idle",
            Self::PreFlop => "pre-flop",
            Self::Flop => "flop",
            Self::Turn => "turn",
            Self::River => "river",
            Self::Showdown => "showdown",
        };
        write!(f, "{repr}")
    }
}

/// One entry of the append-only per-hand action log.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ActionRecord {
    pub player_id: PlayerId,
    pub seat: SeatIndex,
    pub kind: ActionKind,
    /// Chips actually paid by this action.
    pub paid: Chips,
    /// The player's round bet after the action.
    pub bet_to: Chips,
    pub phase: GamePhase,
    pub round_index: u32,
    /// Set when the action was synthesized by the turn timer.
    pub auto: bool,
}

/// The state of one hand in progress. Owned exclusively by its room; the
/// deck never leaves the server.
#[derive(Clone, Debug)]
pub struct GameState {
    pub phase: GamePhase,
    pub community: Vec<Card>,
    /// Pot structure as of the last betting-round boundary.
    pub pots: Vec<Pot>,
    pub current_seat: Option<SeatIndex>,
    pub dealer_seat: SeatIndex,
    pub small_blind_seat: SeatIndex,
    pub big_blind_seat: SeatIndex,
    /// The round's bet level every active player must match.
    pub current_bet: Chips,
    /// Minimum increment for the next full raise.
    pub min_raise: Chips,
    /// Per-hand betting-round counter, used to reject stale requests.
    pub round_index: u32,
    /// Absolute turn deadline in unix milliseconds, if a turn is live.
    pub turn_deadline_ms: Option<u64>,
    pub hand_id: HandId,
    pub round_id: RoundId,
    pub deck: Deck,
    /// 1-based counter across the room's lifetime.
    pub hand_number: u64,
    /// Seats dealt into this hand, ascending.
    pub participants: Vec<SeatIndex>,
    pub history: Vec<ActionRecord>,
}

impl GameState {
    #[must_use]
    pub fn new(
        deck: Deck,
        hand_number: u64,
        participants: Vec<SeatIndex>,
        dealer_seat: SeatIndex,
        small_blind_seat: SeatIndex,
        big_blind_seat: SeatIndex,
    ) -> Self {
        Self {
            phase: GamePhase::PreFlop,
            community: Vec::with_capacity(5),
            pots: Vec::new(),
            current_seat: None,
            dealer_seat,
            small_blind_seat,
            big_blind_seat,
            current_bet: 0,
            min_raise: 0,
            round_index: 0,
            turn_deadline_ms: None,
            hand_id: Uuid::new_v4(),
            round_id: Uuid::new_v4(),
            deck,
            hand_number,
            participants,
            history: Vec::new(),
        }
    }

    /// Total chips across the current pot structure.
    #[must_use]
    pub fn pot_total(&self) -> Chips {
        self.pots.iter().map(|pot| pot.amount).sum()
    }

    /// Begin a new betting round: fresh round id, bumped round index, bet
    /// level reset.
    pub fn begin_round(&mut self, min_raise: Chips) {
        self.round_index += 1;
        self.round_id = Uuid::new_v4();
        self.current_bet = 0;
        self.min_raise = min_raise;
        self.current_seat = None;
        self.turn_deadline_ms = None;
    }
}

/// Winnings from a single pot.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PotAward {
    pub amount: Chips,
    pub winners: Vec<WinnerShare>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WinnerShare {
    pub player_id: PlayerId,
    pub amount: Chips,
}

/// Hole cards disclosed at showdown.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowdownReveal {
    pub player_id: PlayerId,
    pub seat: SeatIndex,
    pub cards: Vec<Card>,
    pub category: HandCategory,
}

/// Post-hand chip count, broadcast so clients need no bookkeeping.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChipCount {
    pub player_id: PlayerId,
    pub chips: Chips,
}

/// The settlement of one hand.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandResult {
    pub hand_id: HandId,
    pub hand_number: u64,
    pub community: Vec<Card>,
    pub pot_awards: Vec<PotAward>,
    /// Empty when the hand ended with a single survivor (no reveal).
    pub showdown_cards: Vec<ShowdownReveal>,
    pub chip_counts: Vec<ChipCount>,
}

/// Typed outcomes of a controller step, turned into wire events and timer
/// decisions by the room actor.
#[derive(Clone, Debug)]
pub enum HandEvent {
    HandStarted {
        hand_id: HandId,
        hand_number: u64,
        dealer_seat: SeatIndex,
        small_blind_seat: SeatIndex,
        big_blind_seat: SeatIndex,
    },
    /// Hole cards are ready; the actor delivers each player's privately.
    HoleCardsDealt {
        hand_id: HandId,
    },
    PlayerActed {
        record: ActionRecord,
        pot_total: Chips,
        hand_id: HandId,
        round_id: RoundId,
    },
    /// A betting round closed and the table moved to `phase`.
    PhaseAdvanced {
        phase: GamePhase,
        community: Vec<Card>,
        pots: Vec<Pot>,
    },
    TurnMoved {
        player_id: PlayerId,
        seat: SeatIndex,
        deadline_ms: u64,
        hand_id: HandId,
        round_id: RoundId,
    },
    HandEnded {
        result: HandResult,
    },
    HostTransferred {
        new_host_id: PlayerId,
    },
    /// Only one stack remains; the table goes idle.
    GameEnded {
        winner_id: PlayerId,
    },
}
