//! Multi-hand flows driven through the room controller: chip
//! conservation across hands, dealer rotation, eliminations, host
//! transfer, and end-of-game detection.

use holdem_core::entities::{ActionKind, ActionRequest, Card, Chips, Deck, PlayerId, Suit};
use holdem_core::game::state::HandEvent;
use holdem_core::room::config::RoomConfig;
use holdem_core::{Room, RoomConfigOverrides};
use uuid::Uuid;

use Suit::{Club as C, Diamond as D, Heart as H, Spade as S};

const NOW: u64 = 1_700_000_000_000;

fn build_room(stacks: &[Chips]) -> (Room, Vec<PlayerId>) {
    let config = RoomConfig::default()
        .with_overrides(&RoomConfigOverrides::default())
        .unwrap();
    let mut room = Room::new("424242".into(), "p0".into(), config, Uuid::new_v4());
    let mut ids = vec![room.host_id];
    for i in 1..stacks.len() {
        ids.push(room.join(format!("p{i}"), Uuid::new_v4()));
    }
    for (seat, &id) in ids.iter().enumerate() {
        room.sit_down(id, seat).unwrap();
        room.player_mut(id).unwrap().chips = stacks[seat];
    }
    (room, ids)
}

fn request(kind: ActionKind, amount: Option<Chips>, round_index: u32) -> ActionRequest {
    ActionRequest {
        kind,
        amount,
        round_index,
        request_id: Uuid::new_v4().to_string(),
    }
}

/// Whoever holds the turn calls when owed, checks otherwise, until the
/// hand settles. Returns every event produced along the way.
fn play_out_hand(room: &mut Room) -> Vec<HandEvent> {
    let mut events = Vec::new();
    let mut guard = 0;
    while let Some(game) = room.game.as_ref() {
        guard += 1;
        assert!(guard < 64, "hand failed to terminate");
        let seat = game.current_seat.expect("a live hand always has an actor");
        let round = game.round_index;
        let player = room
            .players
            .iter()
            .find(|p| p.seat == Some(seat))
            .expect("actor is seated");
        let kind = if player.current_bet < game.current_bet {
            ActionKind::Call
        } else {
            ActionKind::Check
        };
        let id = player.id;
        events.extend(
            room.apply_action(id, &request(kind, None, round), NOW)
                .expect("scripted action is valid"),
        );
    }
    events
}

fn total_chips(room: &Room) -> Chips {
    let stacks: Chips = room.players.iter().map(|p| p.chips).sum();
    let bets: Chips = room.players.iter().map(|p| p.total_bet_this_hand).sum();
    stacks + bets
}

#[test]
fn chips_are_conserved_across_many_hands() {
    let (mut room, _ids) = build_room(&[1000, 1000, 1000, 1000]);
    for hand in 1..=5 {
        room.start_hand(NOW).unwrap();
        assert_eq!(room.game.as_ref().unwrap().hand_number, hand);
        assert_eq!(total_chips(&room), 4000);
        let events = play_out_hand(&mut room);
        assert!(events
            .iter()
            .any(|e| matches!(e, HandEvent::HandEnded { .. })));
        assert_eq!(total_chips(&room), 4000);
    }
}

#[test]
fn dealer_button_rotates_each_hand() {
    let (mut room, _ids) = build_room(&[1000, 1000, 1000]);
    let mut dealers = Vec::new();
    for _ in 0..4 {
        room.start_hand(NOW).unwrap();
        dealers.push(room.game.as_ref().unwrap().dealer_seat);
        play_out_hand(&mut room);
    }
    assert_eq!(dealers, vec![0, 1, 2, 0]);
}

#[test]
fn action_history_is_append_only_within_a_hand() {
    let (mut room, ids) = build_room(&[1000, 1000, 1000]);
    room.start_hand(NOW).unwrap();
    let seat = room.game.as_ref().unwrap().current_seat.unwrap();
    room.apply_action(ids[seat], &request(ActionKind::Call, None, 0), NOW)
        .unwrap();
    let after_one = room.game.as_ref().unwrap().history.len();
    assert_eq!(after_one, 1);
    let seat = room.game.as_ref().unwrap().current_seat.unwrap();
    room.apply_action(ids[seat], &request(ActionKind::Call, None, 0), NOW)
        .unwrap();
    assert_eq!(room.game.as_ref().unwrap().history.len(), 2);
}

#[test]
fn busted_host_hands_the_room_over() {
    // The host has a short stack and loses an all-in against two covered
    // opponents.
    let (mut room, ids) = build_room(&[50, 1000, 1000]);
    let host = ids[0];
    assert_eq!(room.host_id, host);

    // Dealer 0 (the host), SB 1, BB 2, host opens.
    let mut cards = Vec::new();
    let hole = [
        [Card(2, S), Card(3, H)],   // host: rags
        [Card(14, S), Card(14, H)], // seat 1: aces
        [Card(13, S), Card(13, H)], // seat 2: kings
    ];
    for pass in 0..2 {
        for i in 0..3 {
            let seat = (1 + i) % 3;
            cards.push(hole[seat][pass]);
        }
    }
    cards.push(Card(4, C)); // burn
    cards.extend([Card(7, D), Card(8, D), Card(9, C)]);
    cards.push(Card(4, D)); // burn
    cards.push(Card(11, S));
    cards.push(Card(4, H)); // burn
    cards.push(Card(5, D));
    room.start_hand_with_deck(Deck::stacked(cards), NOW).unwrap();

    room.apply_action(host, &request(ActionKind::AllIn, None, 0), NOW)
        .unwrap();
    let seat = room.game.as_ref().unwrap().current_seat.unwrap();
    room.apply_action(ids[seat], &request(ActionKind::Call, None, 0), NOW)
        .unwrap();
    let seat = room.game.as_ref().unwrap().current_seat.unwrap();
    room.apply_action(ids[seat], &request(ActionKind::Call, None, 0), NOW)
        .unwrap();
    let events = play_out_hand(&mut room);

    let transferred = events.iter().find_map(|e| match e {
        HandEvent::HostTransferred { new_host_id } => Some(*new_host_id),
        _ => None,
    });
    assert_eq!(transferred, Some(ids[1]));
    assert_eq!(room.host_id, ids[1]);
    assert!(room.player(ids[1]).unwrap().is_host);
    assert!(!room.player(host).unwrap().is_host);
    assert_eq!(room.player(host).unwrap().chips, 0);
    // Two funded players remain, so the game itself continues.
    assert!(room.is_playing);
    assert!(!events.iter().any(|e| matches!(e, HandEvent::GameEnded { .. })));
}

#[test]
fn eliminated_players_are_skipped_next_hand() {
    let (mut room, ids) = build_room(&[50, 1000, 1000]);
    let mut cards = Vec::new();
    let hole = [
        [Card(2, S), Card(3, H)],
        [Card(14, S), Card(14, H)],
        [Card(13, S), Card(13, H)],
    ];
    for pass in 0..2 {
        for i in 0..3 {
            let seat = (1 + i) % 3;
            cards.push(hole[seat][pass]);
        }
    }
    cards.push(Card(4, C));
    cards.extend([Card(7, D), Card(8, D), Card(9, C)]);
    cards.push(Card(4, D));
    cards.push(Card(11, S));
    cards.push(Card(4, H));
    cards.push(Card(5, D));
    room.start_hand_with_deck(Deck::stacked(cards), NOW).unwrap();

    room.apply_action(ids[0], &request(ActionKind::AllIn, None, 0), NOW)
        .unwrap();
    let seat = room.game.as_ref().unwrap().current_seat.unwrap();
    room.apply_action(ids[seat], &request(ActionKind::Call, None, 0), NOW)
        .unwrap();
    let seat = room.game.as_ref().unwrap().current_seat.unwrap();
    room.apply_action(ids[seat], &request(ActionKind::Call, None, 0), NOW)
        .unwrap();
    play_out_hand(&mut room);

    // Seat 0 busted; the next hand deals only seats 1 and 2.
    room.start_hand(NOW).unwrap();
    let game = room.game.as_ref().unwrap();
    assert_eq!(game.participants, vec![1, 2]);
    assert!(room.player(ids[0]).unwrap().hole_cards.is_empty());
}

#[test]
fn heads_up_blind_seats_follow_the_dealer() {
    let (mut room, _ids) = build_room(&[500, 500]);
    room.start_hand(NOW).unwrap();
    let game = room.game.as_ref().unwrap();
    assert_eq!(game.dealer_seat, 0);
    assert_eq!(game.small_blind_seat, 0);
    assert_eq!(game.big_blind_seat, 1);
    play_out_hand(&mut room);

    room.start_hand(NOW).unwrap();
    let game = room.game.as_ref().unwrap();
    assert_eq!(game.dealer_seat, 1);
    assert_eq!(game.small_blind_seat, 1);
    assert_eq!(game.big_blind_seat, 0);
}

#[test]
fn fresh_round_ids_per_betting_round() {
    let (mut room, ids) = build_room(&[1000, 1000]);
    room.start_hand(NOW).unwrap();
    let first_round = room.game.as_ref().unwrap().round_id;
    assert_eq!(room.game.as_ref().unwrap().round_index, 0);

    // Call + check closes pre-flop.
    let seat = room.game.as_ref().unwrap().current_seat.unwrap();
    room.apply_action(ids[seat], &request(ActionKind::Call, None, 0), NOW)
        .unwrap();
    let seat = room.game.as_ref().unwrap().current_seat.unwrap();
    room.apply_action(ids[seat], &request(ActionKind::Check, None, 0), NOW)
        .unwrap();

    let game = room.game.as_ref().unwrap();
    assert_eq!(game.round_index, 1);
    assert_ne!(game.round_id, first_round);
    assert_eq!(game.community.len(), 3);
}
