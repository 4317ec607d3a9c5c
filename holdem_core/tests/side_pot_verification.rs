//! Side-pot construction and awarding, verified against randomly
//! generated contribution profiles.

use holdem_core::game::engine::{award_pot, build_pots, Contribution};
use holdem_core::game::entities::{Chips, Pot};
use proptest::prelude::*;
use std::collections::HashMap;
use uuid::Uuid;

fn profile_strategy() -> impl Strategy<Value = Vec<Contribution>> {
    (2usize..=9)
        .prop_flat_map(|n| {
            (
                prop::collection::vec(0u32..=1000, n..=n),
                prop::collection::vec(any::<bool>(), n..=n),
            )
        })
        .prop_map(|(totals, folds)| {
            totals
                .into_iter()
                .zip(folds)
                .enumerate()
                .map(|(seat, (total, folded))| Contribution {
                    player_id: Uuid::new_v4(),
                    seat,
                    total,
                    folded,
                })
                .collect::<Vec<_>>()
        })
        // Keep at least one live contributor, as any real hand does.
        .prop_filter("need a surviving contributor", |profile| {
            profile.iter().any(|c| !c.folded && c.total > 0)
        })
}

proptest! {
    /// The pot layers account for every contributed chip.
    #[test]
    fn pots_sum_to_contributions(profile in profile_strategy()) {
        let pots = build_pots(&profile);
        let contributed: Chips = profile.iter().map(|c| c.total).sum();
        let potted: Chips = pots.iter().map(|p| p.amount).sum();
        prop_assert_eq!(contributed, potted);
    }

    /// Folded players never appear in any pot's eligibility.
    #[test]
    fn folded_players_are_never_eligible(profile in profile_strategy()) {
        let folded: Vec<_> = profile
            .iter()
            .filter(|c| c.folded)
            .map(|c| c.player_id)
            .collect();
        for pot in build_pots(&profile) {
            for id in &folded {
                prop_assert!(!pot.eligible.contains(id));
            }
        }
    }

    /// Every pot is winnable by someone.
    #[test]
    fn every_pot_has_an_eligible_player(profile in profile_strategy()) {
        for pot in build_pots(&profile) {
            prop_assert!(!pot.eligible.is_empty());
        }
    }

    /// The main pot is open to every live contributor, so every side
    /// pot's eligibility is a subset of the main pot's.
    #[test]
    fn main_pot_has_the_widest_eligibility(profile in profile_strategy()) {
        let pots = build_pots(&profile);
        if let Some((main, side_pots)) = pots.split_first() {
            for pot in side_pots {
                for id in &pot.eligible {
                    prop_assert!(main.eligible.contains(id));
                }
            }
        }
    }

    /// Awarding a pot hands out exactly the pot, with shares differing by
    /// at most one chip, extra chips at the lowest seats.
    #[test]
    fn awards_split_evenly_with_low_seat_remainder(
        amount in 1u32..=10_000,
        winner_count in 1usize..=9,
    ) {
        let ids: Vec<Uuid> = (0..winner_count).map(|_| Uuid::new_v4()).collect();
        let pot = Pot { amount, eligible: ids.clone() };
        let scores: HashMap<Uuid, u64> = ids.iter().map(|&id| (id, 77u64)).collect();
        let seats: HashMap<Uuid, usize> =
            ids.iter().enumerate().map(|(seat, &id)| (id, seat)).collect();

        let awards = award_pot(&pot, &scores, &seats);
        prop_assert_eq!(awards.len(), winner_count);
        let distributed: Chips = awards.iter().map(|(_, chips)| *chips).sum();
        prop_assert_eq!(distributed, amount);

        let shares: Vec<Chips> = {
            let mut by_seat = awards.clone();
            by_seat.sort_by_key(|(id, _)| seats[id]);
            by_seat.into_iter().map(|(_, chips)| chips).collect()
        };
        let max = *shares.iter().max().unwrap();
        let min = *shares.iter().min().unwrap();
        prop_assert!(max - min <= 1);
        // Remainder chips go to the earliest seats.
        for pair in shares.windows(2) {
            prop_assert!(pair[0] >= pair[1]);
        }
    }

    /// Only the best score among the eligible collects.
    #[test]
    fn best_eligible_hand_takes_the_pot(profile in profile_strategy()) {
        let pots = build_pots(&profile);
        let scores: HashMap<Uuid, u64> = profile
            .iter()
            .map(|c| (c.player_id, 100 + c.seat as u64))
            .collect();
        let seats: HashMap<Uuid, usize> =
            profile.iter().map(|c| (c.player_id, c.seat)).collect();
        for pot in &pots {
            let awards = award_pot(pot, &scores, &seats);
            prop_assert_eq!(awards.len(), 1);
            let best = pot
                .eligible
                .iter()
                .max_by_key(|id| scores[id])
                .copied()
                .unwrap();
            prop_assert_eq!(awards[0].0, best);
        }
    }
}

#[test]
fn four_way_all_in_ladder_builds_three_pots() {
    // Stacks 25 / 75 / 150 / 150, everyone all-in and live.
    let ids: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
    let profile: Vec<Contribution> = [25u32, 75, 150, 150]
        .iter()
        .enumerate()
        .map(|(seat, &total)| Contribution {
            player_id: ids[seat],
            seat,
            total,
            folded: false,
        })
        .collect();

    let pots = build_pots(&profile);
    assert_eq!(pots.len(), 3);
    assert_eq!(pots[0].amount, 100);
    assert_eq!(pots[0].eligible.len(), 4);
    assert_eq!(pots[1].amount, 150);
    assert_eq!(pots[1].eligible.len(), 3);
    assert_eq!(pots[2].amount, 150);
    assert_eq!(pots[2].eligible.len(), 2);
}

#[test]
fn big_blind_walk_keeps_a_single_pot() {
    let sb = Uuid::new_v4();
    let bb = Uuid::new_v4();
    let profile = vec![
        Contribution {
            player_id: sb,
            seat: 0,
            total: 10,
            folded: true,
        },
        Contribution {
            player_id: bb,
            seat: 1,
            total: 20,
            folded: false,
        },
    ];
    let pots = build_pots(&profile);
    // The folder's chips and the orphaned layer both belong to the blind.
    assert_eq!(pots.len(), 1);
    assert_eq!(pots[0].amount, 30);
    assert_eq!(pots[0].eligible, vec![bb]);
}
