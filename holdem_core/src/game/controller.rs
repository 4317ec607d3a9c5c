//! Hand orchestration: hand start, action validation and execution,
//! betting-round progression, phase advancement, and settlement. All of it
//! runs inside the room's serial executor; these methods mutate the room
//! synchronously and return typed outcomes for the actor to project.

use log::{debug, info};
use std::collections::HashMap;

use crate::net::errors::ErrorCode;
use crate::room::Room;

use super::constants::MIN_PLAYERS_TO_START;
use super::engine::{
    self, blind_seats, build_pots, dealing_order, next_dealer, preflop_opener, Contribution,
};
use super::entities::{
    ActionKind, ActionRequest, Chips, Deck, Player, PlayerId, PlayerStatus, SeatIndex,
};
use super::eval::evaluate_best;
use super::state::{
    ActionRecord, ChipCount, GamePhase, GameState, HandEvent, HandResult, PotAward,
    ShowdownReveal, WinnerShare,
};

/// Resolve a seat to its player.
fn seat_player<'a>(
    players: &'a [Player],
    seats: &[Option<PlayerId>],
    seat: SeatIndex,
) -> Option<&'a Player> {
    let id = (*seats.get(seat)?)?;
    players.iter().find(|p| p.id == id)
}

fn seat_player_mut<'a>(
    players: &'a mut [Player],
    seats: &[Option<PlayerId>],
    seat: SeatIndex,
) -> Option<&'a mut Player> {
    let id = (*seats.get(seat)?)?;
    players.iter_mut().find(|p| p.id == id)
}

fn player_by_id_mut(players: &mut [Player], id: PlayerId) -> Option<&mut Player> {
    players.iter_mut().find(|p| p.id == id)
}

/// Per-hand contributions of every participant, the side-pot input.
fn contributions(
    players: &[Player],
    seats: &[Option<PlayerId>],
    participants: &[SeatIndex],
) -> Vec<Contribution> {
    participants
        .iter()
        .filter_map(|&seat| {
            let player = seat_player(players, seats, seat)?;
            Some(Contribution {
                player_id: player.id,
                seat,
                total: player.total_bet_this_hand,
                folded: player.is_folded(),
            })
        })
        .collect()
}

/// Whether a player owes a response in the current round. A lone
/// non-all-in player with a matched bet has nobody to bet against, so a
/// fresh `has_acted` flag alone only matters while two or more players can
/// still act.
fn needs_action(player: &Player, table_bet: Chips, active_count: usize) -> bool {
    player.can_act()
        && (player.current_bet < table_bet || (!player.has_acted && active_count >= 2))
}

/// Participants in cyclic order starting at the first seat `>= start`
/// (inclusive) or `> start` (exclusive), wrapping.
fn cyclic_order(participants: &[SeatIndex], start: SeatIndex, inclusive: bool) -> Vec<SeatIndex> {
    if participants.is_empty() {
        return Vec::new();
    }
    let pos = if inclusive {
        participants.iter().position(|&s| s >= start)
    } else {
        participants.iter().position(|&s| s > start)
    }
    .unwrap_or(0);
    participants[pos..]
        .iter()
        .chain(&participants[..pos])
        .copied()
        .collect()
}

/// Deal the next street's community cards, burning one first.
fn deal_street(game: &mut GameState) {
    let target = game.phase.community_target();
    if game.community.len() >= target {
        return;
    }
    game.deck.burn();
    while game.community.len() < target {
        let card = game.deck.draw();
        game.community.push(card);
    }
}

/// Run the board out to five cards for showdown, keeping the per-street
/// burn discipline.
fn complete_board(game: &mut GameState) {
    while game.community.len() < 5 {
        game.phase = match game.community.len() {
            0 => GamePhase::Flop,
            3 => GamePhase::Turn,
            _ => GamePhase::River,
        };
        deal_street(game);
    }
    game.phase = GamePhase::Showdown;
}

/// A control-flow decision taken with the room state read-only, applied
/// afterwards to keep borrows short.
enum Step {
    Settle,
    Turn(SeatIndex),
    Advance,
}

impl Room {
    /// Start a hand with a freshly shuffled deck.
    pub fn start_hand(&mut self, now_ms: u64) -> Result<Vec<HandEvent>, ErrorCode> {
        self.start_hand_with_deck(Deck::shuffled(), now_ms)
    }

    /// Start a hand with a caller-supplied deck (tests stack the shoe).
    pub fn start_hand_with_deck(
        &mut self,
        deck: Deck,
        now_ms: u64,
    ) -> Result<Vec<HandEvent>, ErrorCode> {
        let participants = self.eligible_seats();
        if participants.len() < MIN_PLAYERS_TO_START {
            return Err(ErrorCode::NotEnoughPlayers);
        }
        let dealer = next_dealer(&participants, self.last_dealer_seat).unwrap_or(participants[0]);
        let blinds = blind_seats(&participants, dealer);

        for player in &mut self.players {
            if player.is_seated() {
                player.reset_for_new_hand();
            }
        }
        if let Some(player) = seat_player_mut(&mut self.players, &self.seats, dealer) {
            player.is_dealer = true;
        }

        self.hands_played += 1;
        let mut game = GameState::new(
            deck,
            self.hands_played,
            participants.clone(),
            dealer,
            blinds.small_blind,
            blinds.big_blind,
        );
        game.current_bet = self.config.big_blind;
        game.min_raise = self.config.big_blind;

        // Post blinds. Short stacks post what they have and are all-in.
        let small = self.config.small_blind;
        let big = self.config.big_blind;
        for (seat, blind) in [(blinds.small_blind, small), (blinds.big_blind, big)] {
            if let Some(player) = seat_player_mut(&mut self.players, &self.seats, seat) {
                let _ = player.deduct_chips(blind);
            }
        }

        // Two passes of one card each, starting left of the button.
        let order = dealing_order(&participants, dealer);
        for _ in 0..2 {
            for &seat in &order {
                let card = game.deck.draw();
                if let Some(player) = seat_player_mut(&mut self.players, &self.seats, seat) {
                    player.hole_cards.push(card);
                }
            }
        }

        let contribs = contributions(&self.players, &self.seats, &participants);
        game.pots = build_pots(&contribs);

        info!(
            "room {}: hand {} started, dealer seat {}, blinds {}/{}",
            self.id, game.hand_number, dealer, small, big
        );

        let hand_id = game.hand_id;
        let hand_number = game.hand_number;
        self.game = Some(game);
        self.is_playing = true;

        let mut events = vec![
            HandEvent::HandStarted {
                hand_id,
                hand_number,
                dealer_seat: dealer,
                small_blind_seat: blinds.small_blind,
                big_blind_seat: blinds.big_blind,
            },
            HandEvent::HoleCardsDealt { hand_id },
        ];
        events.extend(self.progress(now_ms));
        Ok(events)
    }

    /// Validate and execute one player action. The pipeline is ordered and
    /// the first failure returns with no state mutated.
    pub fn apply_action(
        &mut self,
        player_id: PlayerId,
        request: &ActionRequest,
        now_ms: u64,
    ) -> Result<Vec<HandEvent>, ErrorCode> {
        if self.processed_requests.contains(&request.request_id) {
            return Err(ErrorCode::DuplicateRequest);
        }
        let game = self.game.as_ref().ok_or(ErrorCode::CannotAct)?;
        if request.round_index != game.round_index {
            return Err(ErrorCode::StaleRequest);
        }
        let player = self.player(player_id).ok_or(ErrorCode::NotInRoom)?;
        let seat = player.seat.ok_or(ErrorCode::NotSeated)?;
        if game.current_seat != Some(seat) {
            return Err(ErrorCode::NotYourTurn);
        }
        if !(player.can_act() && player.is_current_turn) {
            return Err(ErrorCode::CannotAct);
        }

        let record = self.execute_action(seat, request.kind, request.amount, false)?;
        self.processed_requests.insert(request.request_id.clone());
        Ok(self.commit_action(record, now_ms))
    }

    /// The turn timer fired: synthesize a CHECK when nothing is owed,
    /// otherwise a FOLD. Deterministic and idempotent with respect to late
    /// client retries (they fail the turn or round-index checks).
    pub fn apply_timeout(&mut self, now_ms: u64) -> Vec<HandEvent> {
        let Some(game) = self.game.as_ref() else {
            return Vec::new();
        };
        let Some(seat) = game.current_seat else {
            return Vec::new();
        };
        let table_bet = game.current_bet;
        let kind = match seat_player(&self.players, &self.seats, seat) {
            Some(player) if player.current_bet == table_bet => ActionKind::Check,
            Some(_) => ActionKind::Fold,
            None => return Vec::new(),
        };
        debug!("room {}: seat {seat} timed out, auto-{kind}", self.id);
        match self.execute_action(seat, kind, None, true) {
            Ok(record) => self.commit_action(record, now_ms),
            Err(_) => Vec::new(),
        }
    }

    /// Append the record, emit the acted event, and drive the state
    /// machine forward.
    fn commit_action(&mut self, record: ActionRecord, now_ms: u64) -> Vec<HandEvent> {
        let pot_total = self
            .players
            .iter()
            .filter(|p| p.in_hand())
            .map(|p| p.total_bet_this_hand)
            .sum();
        let mut events = Vec::new();
        let Some(game) = self.game.as_mut() else {
            return events;
        };
        game.turn_deadline_ms = None;
        let hand_id = game.hand_id;
        let round_id = game.round_id;
        game.history.push(record.clone());
        events.push(HandEvent::PlayerActed {
            record,
            pot_total,
            hand_id,
            round_id,
        });
        events.extend(self.progress(now_ms));
        events
    }

    /// Apply one action's semantics. Turn-level checks are already done;
    /// everything here validates before it mutates.
    fn execute_action(
        &mut self,
        seat: SeatIndex,
        kind: ActionKind,
        amount: Option<Chips>,
        auto: bool,
    ) -> Result<ActionRecord, ErrorCode> {
        let game = self.game.as_mut().ok_or(ErrorCode::CannotAct)?;
        let table_bet = game.current_bet;
        let min_raise = game.min_raise;
        let phase = game.phase;
        let round_index = game.round_index;

        let (player_id, paid, bet_to, table_update) = {
            let player =
                seat_player_mut(&mut self.players, &self.seats, seat).ok_or(ErrorCode::CannotAct)?;
            match kind {
                ActionKind::Fold => {
                    player.fold();
                    (player.id, 0, player.current_bet, None)
                }
                ActionKind::Check => {
                    if player.current_bet != table_bet {
                        return Err(ErrorCode::CannotCheckMustCall);
                    }
                    player.has_acted = true;
                    player.is_current_turn = false;
                    (player.id, 0, player.current_bet, None)
                }
                ActionKind::Call => {
                    let owed = table_bet - player.current_bet;
                    if owed == 0 {
                        return Err(ErrorCode::NothingToCall);
                    }
                    // A short call is an implicit all-in.
                    let paid = player.deduct_chips(owed);
                    player.has_acted = true;
                    player.is_current_turn = false;
                    (player.id, paid, player.current_bet, None)
                }
                ActionKind::Raise => {
                    let target = amount.ok_or(ErrorCode::RaiseTooSmall)?;
                    if target <= table_bet {
                        return Err(ErrorCode::RaiseTooSmall);
                    }
                    if player.has_acted {
                        // Betting was never reopened for this player: the
                        // only way to face a higher bet after acting is a
                        // short all-in, which does not reopen the round.
                        return Err(ErrorCode::RaiseTooSmall);
                    }
                    let increment = target - player.current_bet;
                    if increment > player.chips {
                        return Err(ErrorCode::NotEnoughChips);
                    }
                    let whole_stack = increment == player.chips;
                    if target < table_bet + min_raise && !whole_stack {
                        return Err(ErrorCode::RaiseTooSmall);
                    }
                    let paid = player.deduct_chips(increment);
                    player.has_acted = true;
                    player.is_current_turn = false;
                    (player.id, paid, player.current_bet, Some(target))
                }
                ActionKind::AllIn => {
                    let paid = player.all_in();
                    player.has_acted = true;
                    player.is_current_turn = false;
                    let total = player.current_bet;
                    (player.id, paid, total, (total > table_bet).then_some(total))
                }
            }
        };

        if let Some(target) = table_update {
            game.current_bet = target;
            // A full raise reopens the betting; a short all-in only lifts
            // the amount to call.
            if target >= table_bet + min_raise {
                game.min_raise = min_raise.max(target - table_bet);
                for other in self.players.iter_mut() {
                    if other.id != player_id && other.can_act() {
                        other.has_acted = false;
                    }
                }
            }
        }

        Ok(ActionRecord {
            player_id,
            seat,
            kind,
            paid,
            bet_to,
            phase,
            round_index,
            auto,
        })
    }

    /// Drive the hand forward until it needs outside input again: either a
    /// player's turn is set, or the hand settles.
    fn progress(&mut self, now_ms: u64) -> Vec<HandEvent> {
        let mut events = Vec::new();
        loop {
            let step = {
                let Some(game) = self.game.as_ref() else {
                    break;
                };
                let participants = &game.participants;
                let in_hand: Vec<&Player> = participants
                    .iter()
                    .filter_map(|&s| seat_player(&self.players, &self.seats, s))
                    .collect();
                let non_folded = in_hand
                    .iter()
                    .filter(|p| p.in_hand() && !p.is_folded())
                    .count();
                if non_folded <= 1 {
                    Step::Settle
                } else {
                    let active_count = in_hand.iter().filter(|p| p.can_act()).count();
                    let table_bet = game.current_bet;
                    let search = match game.current_seat {
                        Some(current) => cyclic_order(participants, current, false),
                        None => {
                            let blinds = engine::BlindSeats {
                                dealer: game.dealer_seat,
                                small_blind: game.small_blind_seat,
                                big_blind: game.big_blind_seat,
                            };
                            let start = if game.phase == GamePhase::PreFlop {
                                preflop_opener(participants, &blinds)
                            } else {
                                engine::next_seat_after(participants, game.dealer_seat)
                            };
                            match start {
                                Some(seat) => cyclic_order(participants, seat, true),
                                None => Vec::new(),
                            }
                        }
                    };
                    let next = search.into_iter().find(|&seat| {
                        seat_player(&self.players, &self.seats, seat)
                            .is_some_and(|p| needs_action(p, table_bet, active_count))
                    });
                    match next {
                        Some(seat) => Step::Turn(seat),
                        None if game.phase == GamePhase::River => Step::Settle,
                        None => Step::Advance,
                    }
                }
            };
            match step {
                Step::Settle => {
                    events.extend(self.settle());
                    break;
                }
                Step::Turn(seat) => {
                    events.push(self.set_turn(seat, now_ms));
                    break;
                }
                Step::Advance => {
                    events.extend(self.advance_phase());
                }
            }
        }
        events
    }

    /// Hand the turn to a seat and arm the deadline.
    fn set_turn(&mut self, seat: SeatIndex, now_ms: u64) -> HandEvent {
        for player in &mut self.players {
            player.is_current_turn = false;
        }
        let player_id = match seat_player_mut(&mut self.players, &self.seats, seat) {
            Some(player) => {
                player.is_current_turn = true;
                player.id
            }
            None => unreachable!("turn assigned to an empty seat"),
        };
        let deadline_ms = now_ms + self.config.turn_timeout_seconds * 1000;
        let game = self
            .game
            .as_mut()
            .expect("turns are only assigned during a hand");
        game.current_seat = Some(seat);
        game.turn_deadline_ms = Some(deadline_ms);
        HandEvent::TurnMoved {
            player_id,
            seat,
            deadline_ms,
            hand_id: game.hand_id,
            round_id: game.round_id,
        }
    }

    /// Close the betting round: roll bets into the pot structure, reset
    /// round state, and deal the next street.
    fn advance_phase(&mut self) -> Vec<HandEvent> {
        let big_blind = self.config.big_blind;
        let Some(game) = self.game.as_mut() else {
            return Vec::new();
        };
        let participants = game.participants.clone();
        let contribs = contributions(&self.players, &self.seats, &participants);
        game.pots = build_pots(&contribs);
        for &seat in &participants {
            if let Some(player) = seat_player_mut(&mut self.players, &self.seats, seat) {
                if player.in_hand() {
                    player.reset_for_new_round();
                }
            }
        }
        game.phase = game.phase.next();
        deal_street(game);
        game.begin_round(big_blind);
        debug!(
            "room {}: advanced to {} with {} community cards",
            self.id,
            game.phase,
            game.community.len()
        );
        vec![HandEvent::PhaseAdvanced {
            phase: game.phase,
            community: game.community.clone(),
            pots: game.pots.clone(),
        }]
    }

    /// Terminate the hand: single-survivor scoop or full showdown, then
    /// eliminations, host transfer, and the game-over check.
    fn settle(&mut self) -> Vec<HandEvent> {
        let mut events = Vec::new();
        let Some(game) = self.game.as_mut() else {
            return events;
        };
        let participants = game.participants.clone();
        let contribs = contributions(&self.players, &self.seats, &participants);
        game.pots = build_pots(&contribs);

        let non_folded: Vec<(SeatIndex, PlayerId)> = participants
            .iter()
            .filter_map(|&seat| {
                seat_player(&self.players, &self.seats, seat)
                    .filter(|p| p.in_hand() && !p.is_folded())
                    .map(|p| (seat, p.id))
            })
            .collect();

        let mut pot_awards = Vec::new();
        let mut reveals = Vec::new();
        if non_folded.len() == 1 {
            // Everyone else folded: the survivor scoops without a reveal.
            let total: Chips = game.pots.iter().map(|p| p.amount).sum();
            let (_, winner) = non_folded[0];
            if let Some(player) = player_by_id_mut(&mut self.players, winner) {
                player.add_chips(total);
            }
            pot_awards.push(PotAward {
                amount: total,
                winners: vec![WinnerShare {
                    player_id: winner,
                    amount: total,
                }],
            });
        } else {
            complete_board(game);
            let mut scores: HashMap<PlayerId, u64> = HashMap::new();
            let mut seat_map: HashMap<PlayerId, SeatIndex> = HashMap::new();
            for &(seat, id) in &non_folded {
                if let Some(player) = seat_player(&self.players, &self.seats, seat) {
                    let mut cards = player.hole_cards.clone();
                    cards.extend_from_slice(&game.community);
                    let score = evaluate_best(&cards);
                    reveals.push(ShowdownReveal {
                        player_id: id,
                        seat,
                        cards: player.hole_cards.clone(),
                        category: score.category,
                    });
                    scores.insert(id, score.score);
                    seat_map.insert(id, seat);
                }
            }
            for pot in &game.pots {
                let awards = engine::award_pot(pot, &scores, &seat_map);
                for &(id, amount) in &awards {
                    if let Some(player) = player_by_id_mut(&mut self.players, id) {
                        player.add_chips(amount);
                    }
                }
                pot_awards.push(PotAward {
                    amount: pot.amount,
                    winners: awards
                        .into_iter()
                        .map(|(player_id, amount)| WinnerShare { player_id, amount })
                        .collect(),
                });
            }
        }

        let hand_id = game.hand_id;
        let hand_number = game.hand_number;
        let community = game.community.clone();
        let dealer_seat = game.dealer_seat;

        self.last_dealer_seat = Some(dealer_seat);
        self.game = None;
        for player in &mut self.players {
            player.is_current_turn = false;
            player.is_dealer = false;
            player.has_acted = false;
            player.current_bet = 0;
            player.total_bet_this_hand = 0;
            player.hole_cards.clear();
            if player.is_seated() {
                player.status = if player.chips == 0 {
                    PlayerStatus::Eliminated
                } else {
                    PlayerStatus::Waiting
                };
            }
        }

        let chip_counts = self
            .players
            .iter()
            .filter(|p| p.is_seated())
            .map(|p| ChipCount {
                player_id: p.id,
                chips: p.chips,
            })
            .collect();

        info!(
            "room {}: hand {} settled, {} pot(s), {} reveal(s)",
            self.id,
            hand_number,
            pot_awards.len(),
            reveals.len()
        );

        events.push(HandEvent::HandEnded {
            result: HandResult {
                hand_id,
                hand_number,
                community,
                pot_awards,
                showdown_cards: reveals,
                chip_counts,
            },
        });

        // A busted host hands the room to a live seated player.
        let host_busted = self
            .player(self.host_id)
            .is_some_and(|p| p.status == PlayerStatus::Eliminated);
        if host_busted {
            if let Some(successor) = self.host_successor_by_seat() {
                self.transfer_host_to(successor);
                events.push(HandEvent::HostTransferred {
                    new_host_id: successor,
                });
            }
        }

        let funded: Vec<PlayerId> = self
            .players
            .iter()
            .filter(|p| p.is_seated() && p.chips > 0)
            .map(|p| p.id)
            .collect();
        if funded.len() <= 1 {
            self.is_playing = false;
            if let Some(&winner_id) = funded.first() {
                events.push(HandEvent::GameEnded { winner_id });
            }
        }
        events
    }
}
