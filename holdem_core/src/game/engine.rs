//! Pure table combinatorics: acting order around the button, blind seats,
//! dealer rotation, side-pot construction, and pot awarding. Everything
//! here operates on values passed in and owns nothing.

use std::collections::HashMap;

use super::constants::HEADS_UP;
use super::entities::{Chips, PlayerId, Pot, SeatIndex};

/// The first seat in `seats` strictly after `anchor`, wrapping around the
/// table. `seats` must be sorted ascending. Returns `None` when empty.
#[must_use]
pub fn next_seat_after(seats: &[SeatIndex], anchor: SeatIndex) -> Option<SeatIndex> {
    if seats.is_empty() {
        return None;
    }
    seats
        .iter()
        .copied()
        .find(|&seat| seat > anchor)
        .or_else(|| seats.first().copied())
}

/// Blind positions derived from the dealer seat. Heads-up is special: the
/// dealer posts the small blind and the other player the big blind.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BlindSeats {
    pub dealer: SeatIndex,
    pub small_blind: SeatIndex,
    pub big_blind: SeatIndex,
}

/// Compute blind seats for the hand's participants (sorted ascending).
#[must_use]
pub fn blind_seats(participants: &[SeatIndex], dealer: SeatIndex) -> BlindSeats {
    if participants.len() == HEADS_UP {
        let other = next_seat_after(participants, dealer).unwrap_or(dealer);
        BlindSeats {
            dealer,
            small_blind: dealer,
            big_blind: other,
        }
    } else {
        let small_blind = next_seat_after(participants, dealer).unwrap_or(dealer);
        let big_blind = next_seat_after(participants, small_blind).unwrap_or(small_blind);
        BlindSeats {
            dealer,
            small_blind,
            big_blind,
        }
    }
}

/// The seat that opens the pre-flop betting round. Heads-up the dealer
/// (small blind) opens; otherwise the seat after the big blind.
#[must_use]
pub fn preflop_opener(participants: &[SeatIndex], blinds: &BlindSeats) -> Option<SeatIndex> {
    if participants.len() == HEADS_UP {
        Some(blinds.dealer)
    } else {
        next_seat_after(participants, blinds.big_blind)
    }
}

/// Cyclic dealing order: every participant starting at the seat after the
/// dealer.
#[must_use]
pub fn dealing_order(participants: &[SeatIndex], dealer: SeatIndex) -> Vec<SeatIndex> {
    let mut order = Vec::with_capacity(participants.len());
    let mut seat = dealer;
    for _ in 0..participants.len() {
        match next_seat_after(participants, seat) {
            Some(next) => {
                order.push(next);
                seat = next;
            }
            None => break,
        }
    }
    order
}

/// The next dealer seat: the first eligible seat after the previous
/// dealer, wrapping and skipping empty or busted seats (the caller passes
/// only eligible seats). `None` previous dealer picks the lowest seat,
/// making the first hand deterministic.
#[must_use]
pub fn next_dealer(eligible: &[SeatIndex], previous: Option<SeatIndex>) -> Option<SeatIndex> {
    match previous {
        None => eligible.first().copied(),
        Some(prev) => next_seat_after(eligible, prev),
    }
}

/// One player's contribution to the hand, the input to side-pot
/// construction.
#[derive(Clone, Debug)]
pub struct Contribution {
    pub player_id: PlayerId,
    pub seat: SeatIndex,
    pub total: Chips,
    pub folded: bool,
}

/// Build the pot list from per-hand contributions.
///
/// Contribution tiers are walked in ascending order; each tier layer holds
/// `(tier − previous) × players at or above the tier` chips and is
/// eligible to the non-folded players at or above the tier. Adjacent
/// layers with identical eligibility collapse into one pot, so equal
/// contributions produce a single main pot. A layer whose contributors all
/// folded is awarded to the surviving contributor with the smallest seat.
#[must_use]
pub fn build_pots(contributions: &[Contribution]) -> Vec<Pot> {
    let mut live: Vec<&Contribution> = contributions.iter().filter(|c| c.total > 0).collect();
    if live.is_empty() {
        return Vec::new();
    }
    live.sort_by_key(|c| (c.total, c.seat));

    let mut tiers: Vec<Chips> = live.iter().map(|c| c.total).collect();
    tiers.dedup();

    // Fallback recipient for layers where everyone at the tier folded.
    let survivor = live
        .iter()
        .filter(|c| !c.folded)
        .min_by_key(|c| c.seat)
        .map(|c| c.player_id);

    let mut pots: Vec<Pot> = Vec::new();
    let mut previous_tier: Chips = 0;
    for tier in tiers {
        let at_or_above: Vec<&&Contribution> =
            live.iter().filter(|c| c.total >= tier).collect();
        let amount = (tier - previous_tier) * at_or_above.len() as Chips;
        previous_tier = tier;

        let mut eligible: Vec<(SeatIndex, PlayerId)> = at_or_above
            .iter()
            .filter(|c| !c.folded)
            .map(|c| (c.seat, c.player_id))
            .collect();
        eligible.sort_unstable();
        let eligible: Vec<PlayerId> = if eligible.is_empty() {
            survivor.into_iter().collect()
        } else {
            eligible.into_iter().map(|(_, id)| id).collect()
        };

        let merge = pots
            .last()
            .is_some_and(|last| last.eligible == eligible);
        if merge {
            if let Some(last) = pots.last_mut() {
                last.amount += amount;
            }
        } else {
            pots.push(Pot { amount, eligible });
        }
    }
    pots
}

/// Award a single pot: the eligible players tied at the maximum score
/// split it evenly, and the remainder is handed out one chip at a time in
/// ascending seat order.
#[must_use]
pub fn award_pot(
    pot: &Pot,
    scores: &HashMap<PlayerId, u64>,
    seats: &HashMap<PlayerId, SeatIndex>,
) -> Vec<(PlayerId, Chips)> {
    let mut candidates: Vec<(SeatIndex, PlayerId, u64)> = pot
        .eligible
        .iter()
        .filter_map(|id| {
            let score = scores.get(id)?;
            let seat = seats.get(id)?;
            Some((*seat, *id, *score))
        })
        .collect();
    if candidates.is_empty() {
        return Vec::new();
    }
    let best = candidates.iter().map(|(_, _, s)| *s).max().unwrap_or(0);
    candidates.retain(|(_, _, score)| *score == best);
    candidates.sort_unstable_by_key(|(seat, _, _)| *seat);

    let winners = candidates.len() as Chips;
    let share = pot.amount / winners;
    let remainder = pot.amount % winners;
    candidates
        .iter()
        .enumerate()
        .map(|(i, (_, id, _))| {
            let extra = u32::from((i as Chips) < remainder);
            (*id, share + extra)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn contribution(seat: SeatIndex, total: Chips, folded: bool) -> Contribution {
        Contribution {
            player_id: Uuid::new_v4(),
            seat,
            total,
            folded,
        }
    }

    #[test]
    fn next_seat_wraps_around() {
        let seats = [0, 2, 5];
        assert_eq!(next_seat_after(&seats, 0), Some(2));
        assert_eq!(next_seat_after(&seats, 2), Some(5));
        assert_eq!(next_seat_after(&seats, 5), Some(0));
        assert_eq!(next_seat_after(&seats, 3), Some(5));
        assert_eq!(next_seat_after(&[], 0), None);
    }

    #[test]
    fn heads_up_dealer_posts_small_blind() {
        let blinds = blind_seats(&[1, 4], 1);
        assert_eq!(blinds.small_blind, 1);
        assert_eq!(blinds.big_blind, 4);
        assert_eq!(preflop_opener(&[1, 4], &blinds), Some(1));
    }

    #[test]
    fn three_handed_blinds_trail_the_dealer() {
        let seats = [0, 1, 2];
        let blinds = blind_seats(&seats, 0);
        assert_eq!(blinds.small_blind, 1);
        assert_eq!(blinds.big_blind, 2);
        assert_eq!(preflop_opener(&seats, &blinds), Some(0));
    }

    #[test]
    fn dealing_starts_left_of_the_dealer() {
        assert_eq!(dealing_order(&[0, 2, 5], 2), vec![5, 0, 2]);
        assert_eq!(dealing_order(&[3, 7], 7), vec![3, 7]);
    }

    #[test]
    fn dealer_rotation_skips_to_next_eligible() {
        assert_eq!(next_dealer(&[1, 3, 6], None), Some(1));
        assert_eq!(next_dealer(&[1, 3, 6], Some(1)), Some(3));
        assert_eq!(next_dealer(&[1, 3, 6], Some(6)), Some(1));
        // Previous dealer busted out and their seat is gone.
        assert_eq!(next_dealer(&[1, 6], Some(3)), Some(6));
    }

    #[test]
    fn equal_contributions_build_one_main_pot() {
        let contributions = vec![
            contribution(0, 100, false),
            contribution(1, 100, false),
            contribution(2, 100, false),
        ];
        let pots = build_pots(&contributions);
        assert_eq!(pots.len(), 1);
        assert_eq!(pots[0].amount, 300);
        assert_eq!(pots[0].eligible.len(), 3);
    }

    #[test]
    fn short_all_in_creates_a_side_pot() {
        let contributions = vec![
            contribution(0, 100, false),
            contribution(1, 200, false),
            contribution(2, 200, false),
        ];
        let pots = build_pots(&contributions);
        assert_eq!(pots.len(), 2);
        assert_eq!(pots[0].amount, 300);
        assert_eq!(pots[0].eligible.len(), 3);
        assert_eq!(pots[1].amount, 200);
        assert_eq!(pots[1].eligible.len(), 2);
    }

    #[test]
    fn folded_contributions_stay_in_the_pot_but_not_eligible() {
        let folder = contribution(0, 50, true);
        let folder_id = folder.player_id;
        let contributions = vec![
            folder,
            contribution(1, 100, false),
            contribution(2, 100, false),
        ];
        let pots = build_pots(&contributions);
        let total: Chips = pots.iter().map(|p| p.amount).sum();
        assert_eq!(total, 250);
        for pot in &pots {
            assert!(!pot.eligible.contains(&folder_id));
        }
    }

    #[test]
    fn layer_with_all_folded_goes_to_the_survivor() {
        // Big stack folded after over-contributing; the surviving short
        // stack collects the orphaned layer.
        let survivor = contribution(2, 20, false);
        let survivor_id = survivor.player_id;
        let contributions = vec![contribution(1, 80, true), survivor];
        let pots = build_pots(&contributions);
        let total: Chips = pots.iter().map(|p| p.amount).sum();
        assert_eq!(total, 100);
        for pot in &pots {
            assert_eq!(pot.eligible, vec![survivor_id]);
        }
    }

    #[test]
    fn pot_sum_always_matches_contributions() {
        let contributions = vec![
            contribution(0, 25, false),
            contribution(1, 75, true),
            contribution(2, 150, false),
            contribution(3, 150, false),
        ];
        let pots = build_pots(&contributions);
        let total: Chips = pots.iter().map(|p| p.amount).sum();
        assert_eq!(total, 400);
    }

    #[test]
    fn remainder_chips_go_to_the_lowest_seats() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        let pot = Pot {
            amount: 100,
            eligible: vec![a, b, c],
        };
        let scores = HashMap::from([(a, 500u64), (b, 500), (c, 500)]);
        let seats = HashMap::from([(a, 4usize), (b, 0), (c, 2)]);
        let mut awards = award_pot(&pot, &scores, &seats);
        awards.sort_by_key(|(id, _)| seats[id]);
        assert_eq!(awards[0], (b, 34));
        assert_eq!(awards[1], (c, 33));
        assert_eq!(awards[2], (a, 33));
    }

    #[test]
    fn award_restricts_to_pot_eligibility() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let pot = Pot {
            amount: 60,
            eligible: vec![a],
        };
        // b has the best hand overall but is not eligible for this pot.
        let scores = HashMap::from([(a, 100u64), (b, 900)]);
        let seats = HashMap::from([(a, 0usize), (b, 1)]);
        let awards = award_pot(&pot, &scores, &seats);
        assert_eq!(awards, vec![(a, 60)]);
    }
}
