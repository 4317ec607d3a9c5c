//! Core table entities: cards, the deck, chips, players, and pots.

use rand::{seq::SliceRandom, thread_rng};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::constants;

/// Type alias for chip counts. All bets and stacks are whole chips.
pub type Chips = u32;

/// Type alias for seat positions at the table.
pub type SeatIndex = usize;

/// Opaque player identifier handed to clients for session persistence.
pub type PlayerId = Uuid;

/// Identifier of a live gateway connection bound to a player.
pub type ConnectionId = Uuid;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Suit {
    Club,
    Spade,
    Diamond,
    Heart,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Club, Suit::Spade, Suit::Diamond, Suit::Heart];
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Club => "♣",
            Self::Spade => "♠",
            Self::Diamond => "♦",
            Self::Heart => "♥",
        };
        write!(f, "{repr}")
    }
}

/// Card rank. 2..=14 with the ace always high (14); the wheel straight is
/// the only place an ace plays low and the evaluator handles that case.
pub type Rank = u8;

pub const RANK_MIN: Rank = 2;
pub const RANK_ACE: Rank = 14;

/// A card is a tuple of a rank (2..=14) and a suit.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Card(pub Rank, pub Suit);

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let rank = match self.0 {
            14 => "A".to_string(),
            13 => "K".to_string(),
            12 => "Q".to_string(),
            11 => "J".to_string(),
            v => v.to_string(),
        };
        write!(f, "{rank}{}", self.1)
    }
}

/// The shoe for a single hand. Cards are drawn front to back; the deck is
/// never exposed to clients.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Deck {
    cards: Vec<Card>,
    next: usize,
}

impl Deck {
    /// The canonical 52-card deck in a fixed order.
    #[must_use]
    pub fn standard() -> Self {
        let mut cards = Vec::with_capacity(constants::DECK_SIZE);
        for rank in RANK_MIN..=RANK_ACE {
            for suit in Suit::ALL {
                cards.push(Card(rank, suit));
            }
        }
        Self { cards, next: 0 }
    }

    /// A fresh deck shuffled with a uniform in-place permutation.
    #[must_use]
    pub fn shuffled() -> Self {
        let mut deck = Self::standard();
        deck.cards.shuffle(&mut thread_rng());
        deck
    }

    /// A deck with an exact, caller-chosen order. Used by tests to make
    /// dealing deterministic.
    #[must_use]
    pub fn stacked(cards: Vec<Card>) -> Self {
        Self { cards, next: 0 }
    }

    /// Draw the next card. Callers guarantee the deck cannot run dry: a
    /// full hand consumes at most 2×9 hole cards plus 3 burns and 5 board
    /// cards.
    pub fn draw(&mut self) -> Card {
        let card = self.cards[self.next];
        self.next += 1;
        card
    }

    /// Discard the next card face down.
    pub fn burn(&mut self) {
        self.next += 1;
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.cards.len() - self.next
    }

    /// All cards in shoe order, including already-drawn ones. Test-facing.
    #[must_use]
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }
}

/// Seat lifecycle of a room member.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlayerStatus {
    /// In the room, not seated.
    Spectating,
    /// Seated, waiting for the next hand to start.
    Waiting,
    /// Dealt into the current hand and still able to act.
    Active,
    /// Folded out of the current hand.
    Folded,
    /// Committed their whole stack this hand.
    AllIn,
    /// Seated with zero chips; skipped when hands are dealt.
    Eliminated,
}

impl fmt::Display for PlayerStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Spectating => "spectating",
            Self::Waiting => "waiting",
            Self::Active => "active",
            Self::Folded => "folded",
            Self::AllIn => "all-in",
            Self::Eliminated => "eliminated",
        };
        write!(f, "{repr}")
    }
}

/// Per-seat state container. Mutators are atomic and unvalidated; the room
/// and game controller pre-validate every call.
#[derive(Clone, Debug)]
pub struct Player {
    pub id: PlayerId,
    pub nickname: String,
    pub chips: Chips,
    /// Chips committed in the current betting round.
    pub current_bet: Chips,
    /// Chips committed across all rounds of the current hand.
    pub total_bet_this_hand: Chips,
    pub status: PlayerStatus,
    pub seat: Option<SeatIndex>,
    pub has_acted: bool,
    pub is_current_turn: bool,
    pub is_dealer: bool,
    pub is_host: bool,
    pub is_ready: bool,
    /// Whether the one-time initial chip grant was already made.
    pub bought_in: bool,
    pub hole_cards: Vec<Card>,
    pub connection: Option<ConnectionId>,
}

impl Player {
    #[must_use]
    pub fn new(nickname: String, connection: ConnectionId) -> Self {
        Self {
            id: Uuid::new_v4(),
            nickname,
            chips: 0,
            current_bet: 0,
            total_bet_this_hand: 0,
            status: PlayerStatus::Spectating,
            seat: None,
            has_acted: false,
            is_current_turn: false,
            is_dealer: false,
            is_host: false,
            is_ready: false,
            bought_in: false,
            hole_cards: Vec::with_capacity(constants::HOLE_CARDS_PER_PLAYER),
            connection: Some(connection),
        }
    }

    #[must_use]
    pub fn is_seated(&self) -> bool {
        self.seat.is_some()
    }

    #[must_use]
    pub fn is_folded(&self) -> bool {
        self.status == PlayerStatus::Folded
    }

    #[must_use]
    pub fn is_all_in(&self) -> bool {
        self.status == PlayerStatus::AllIn
    }

    /// Whether the player is dealt into the current hand (holding live or
    /// dead cards).
    #[must_use]
    pub fn in_hand(&self) -> bool {
        matches!(
            self.status,
            PlayerStatus::Active | PlayerStatus::Folded | PlayerStatus::AllIn
        )
    }

    /// Whether the player may be given the turn.
    #[must_use]
    pub fn can_act(&self) -> bool {
        self.status == PlayerStatus::Active && self.is_seated()
    }

    /// Move chips from the stack into the current bet, clamping to the
    /// available stack. Returns the amount actually paid. Reaching zero
    /// chips mid-hand transitions the player to all-in.
    pub fn deduct_chips(&mut self, amount: Chips) -> Chips {
        let paid = amount.min(self.chips);
        self.chips -= paid;
        self.current_bet += paid;
        self.total_bet_this_hand += paid;
        if self.chips == 0 && self.in_hand() {
            self.status = PlayerStatus::AllIn;
        }
        paid
    }

    /// Credit winnings. Used only by pot awarding.
    pub fn add_chips(&mut self, amount: Chips) {
        self.chips += amount;
    }

    /// Bind to a free seat. The caller has verified the seat is free.
    pub fn sit_down(&mut self, seat: SeatIndex) {
        self.seat = Some(seat);
        self.status = PlayerStatus::Waiting;
    }

    /// Release the seat and return to spectating.
    pub fn stand_up(&mut self) {
        self.seat = None;
        self.clear_hand_state();
        self.status = PlayerStatus::Spectating;
    }

    pub fn fold(&mut self) {
        self.status = PlayerStatus::Folded;
        self.has_acted = true;
        self.is_current_turn = false;
    }

    /// Commit the whole stack.
    pub fn all_in(&mut self) -> Chips {
        let stack = self.chips;
        self.deduct_chips(stack)
    }

    /// Reset per-hand state at hand start. Seated players become ACTIVE
    /// when they have chips and ELIMINATED otherwise; spectators are left
    /// alone.
    pub fn reset_for_new_hand(&mut self) {
        self.clear_hand_state();
        self.is_ready = false;
        if self.is_seated() {
            self.status = if self.chips > 0 {
                PlayerStatus::Active
            } else {
                PlayerStatus::Eliminated
            };
        }
    }

    /// Reset per-round state at a betting-round boundary. Folded and
    /// all-in players keep their status.
    pub fn reset_for_new_round(&mut self) {
        self.current_bet = 0;
        self.has_acted = false;
        self.is_current_turn = false;
    }

    fn clear_hand_state(&mut self) {
        self.current_bet = 0;
        self.total_bet_this_hand = 0;
        self.has_acted = false;
        self.is_current_turn = false;
        self.is_dealer = false;
        self.hole_cards.clear();
    }
}

/// A pot or side pot: an amount and the players eligible to win it. The
/// main pot is the first element of the pot list; side pots follow in
/// increasing contribution order.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Pot {
    pub amount: Chips,
    /// Eligible players ordered by seat index.
    pub eligible: Vec<PlayerId>,
}

impl fmt::Display for Pot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({} eligible)", self.amount, self.eligible.len())
    }
}

/// The kind of action a player submits.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    Fold,
    Check,
    Call,
    Raise,
    AllIn,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Fold => "fold",
            Self::Check => "check",
            Self::Call => "call",
            Self::Raise => "raise",
            Self::AllIn => "all-in",
        };
        write!(f, "{repr}")
    }
}

/// An inbound player action, carrying the idempotency key and the betting
/// round it was aimed at.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ActionRequest {
    pub kind: ActionKind,
    /// For raises: the new total bet target for the round.
    pub amount: Option<Chips>,
    pub round_index: u32,
    pub request_id: String,
}
