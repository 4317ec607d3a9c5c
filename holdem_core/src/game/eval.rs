//! Hand evaluation: best five of seven, category plus kicker vector,
//! collapsed into a single totally-ordered score.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use super::entities::{Card, Rank, RANK_ACE};

/// Hand categories, weakest first. The discriminant is the leading digit
/// pair of the encoded score.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HandCategory {
    HighCard,
    OnePair,
    TwoPair,
    ThreeOfAKind,
    Straight,
    Flush,
    FullHouse,
    FourOfAKind,
    StraightFlush,
    RoyalFlush,
}

impl fmt::Display for HandCategory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::HighCard => "high card",
            Self::OnePair => "one pair",
            Self::TwoPair => "two pair",
            Self::ThreeOfAKind => "three of a kind",
            Self::Straight => "straight",
            Self::Flush => "flush",
            Self::FullHouse => "full house",
            Self::FourOfAKind => "four of a kind",
            Self::StraightFlush => "straight flush",
            Self::RoyalFlush => "royal flush",
        };
        write!(f, "{repr}")
    }
}

/// An evaluated five-card hand. `score` is the positional encoding
/// `category × 10^10 + k0 × 10^8 + k1 × 10^6 + …`, so comparing scores
/// compares hands.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct HandScore {
    pub category: HandCategory,
    pub kickers: Vec<Rank>,
    pub score: u64,
}

impl Ord for HandScore {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score.cmp(&other.score)
    }
}

impl PartialOrd for HandScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn encode(category: HandCategory, kickers: &[Rank]) -> u64 {
    let mut score = category as u64 * 10_000_000_000;
    let mut place = 100_000_000u64;
    for &kicker in kickers.iter().take(5) {
        score += u64::from(kicker) * place;
        place /= 100;
    }
    score
}

/// The high card of a straight formed by five distinct descending ranks,
/// if any. The wheel A-2-3-4-5 ranks with 5 high.
fn straight_high(ranks_desc: &[Rank]) -> Option<Rank> {
    let mut unique = ranks_desc.to_vec();
    unique.dedup();
    if unique.len() != 5 {
        return None;
    }
    if unique[0] - unique[4] == 4 {
        return Some(unique[0]);
    }
    if unique == [RANK_ACE, 5, 4, 3, 2] {
        return Some(5);
    }
    None
}

/// Evaluate exactly five cards.
#[must_use]
pub fn evaluate_five(cards: &[Card; 5]) -> HandScore {
    let mut ranks: Vec<Rank> = cards.iter().map(|c| c.0).collect();
    ranks.sort_unstable_by(|a, b| b.cmp(a));

    let is_flush = cards.iter().all(|c| c.1 == cards[0].1);
    let straight = straight_high(&ranks);

    let mut counts = [0u8; 15];
    for &rank in &ranks {
        counts[rank as usize] += 1;
    }
    // Rank groups ordered by multiplicity, then rank, both descending.
    let mut groups: Vec<(u8, Rank)> = (2..=RANK_ACE)
        .filter(|&rank| counts[rank as usize] > 0)
        .map(|rank| (counts[rank as usize], rank))
        .collect();
    groups.sort_unstable_by(|a, b| b.cmp(a));

    let (category, kickers) = if is_flush && straight == Some(RANK_ACE) {
        (HandCategory::RoyalFlush, vec![RANK_ACE])
    } else if is_flush && straight.is_some() {
        (HandCategory::StraightFlush, vec![straight.unwrap_or(0)])
    } else if groups[0].0 == 4 {
        (HandCategory::FourOfAKind, vec![groups[0].1, groups[1].1])
    } else if groups[0].0 == 3 && groups[1].0 == 2 {
        (HandCategory::FullHouse, vec![groups[0].1, groups[1].1])
    } else if is_flush {
        (HandCategory::Flush, ranks.clone())
    } else if let Some(high) = straight {
        (HandCategory::Straight, vec![high])
    } else if groups[0].0 == 3 {
        (
            HandCategory::ThreeOfAKind,
            vec![groups[0].1, groups[1].1, groups[2].1],
        )
    } else if groups[0].0 == 2 && groups[1].0 == 2 {
        (
            HandCategory::TwoPair,
            vec![groups[0].1, groups[1].1, groups[2].1],
        )
    } else if groups[0].0 == 2 {
        (
            HandCategory::OnePair,
            vec![groups[0].1, groups[1].1, groups[2].1, groups[3].1],
        )
    } else {
        (HandCategory::HighCard, ranks.clone())
    };

    let score = encode(category, &kickers);
    HandScore {
        category,
        kickers,
        score,
    }
}

/// Evaluate the best five-card hand out of five to seven cards by
/// enumerating every five-card subset (21 subsets for seven cards).
#[must_use]
pub fn evaluate_best(cards: &[Card]) -> HandScore {
    let n = cards.len();
    debug_assert!((5..=7).contains(&n), "evaluate_best takes 5..=7 cards");
    let mut best: Option<HandScore> = None;
    for a in 0..n - 4 {
        for b in a + 1..n - 3 {
            for c in b + 1..n - 2 {
                for d in c + 1..n - 1 {
                    for e in d + 1..n {
                        let hand = [cards[a], cards[b], cards[c], cards[d], cards[e]];
                        let score = evaluate_five(&hand);
                        if best.as_ref().map_or(true, |s| score.score > s.score) {
                            best = Some(score);
                        }
                    }
                }
            }
        }
    }
    best.expect("a five-card subset always exists")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::Suit;

    fn hand(cards: [(Rank, Suit); 5]) -> [Card; 5] {
        cards.map(|(rank, suit)| Card(rank, suit))
    }

    use Suit::{Club as C, Diamond as D, Heart as H, Spade as S};

    #[test]
    fn category_ordering_is_total() {
        assert!(HandCategory::HighCard < HandCategory::OnePair);
        assert!(HandCategory::OnePair < HandCategory::TwoPair);
        assert!(HandCategory::TwoPair < HandCategory::ThreeOfAKind);
        assert!(HandCategory::ThreeOfAKind < HandCategory::Straight);
        assert!(HandCategory::Straight < HandCategory::Flush);
        assert!(HandCategory::Flush < HandCategory::FullHouse);
        assert!(HandCategory::FullHouse < HandCategory::FourOfAKind);
        assert!(HandCategory::FourOfAKind < HandCategory::StraightFlush);
        assert!(HandCategory::StraightFlush < HandCategory::RoyalFlush);
    }

    #[test]
    fn wheel_straight_ranks_below_six_high() {
        let wheel = evaluate_five(&hand([(14, S), (2, H), (3, D), (4, C), (5, S)]));
        let six_high = evaluate_five(&hand([(2, H), (3, D), (4, C), (5, S), (6, H)]));
        assert_eq!(wheel.category, HandCategory::Straight);
        assert_eq!(wheel.kickers, vec![5]);
        assert_eq!(six_high.category, HandCategory::Straight);
        assert!(wheel.score < six_high.score);
    }

    #[test]
    fn royal_flush_is_its_own_category() {
        let royal = evaluate_five(&hand([(14, S), (13, S), (12, S), (11, S), (10, S)]));
        assert_eq!(royal.category, HandCategory::RoyalFlush);
        let king_high = evaluate_five(&hand([(13, S), (12, S), (11, S), (10, S), (9, S)]));
        assert_eq!(king_high.category, HandCategory::StraightFlush);
        assert!(royal.score > king_high.score);
    }

    #[test]
    fn wheel_straight_flush_uses_five_high() {
        let steel_wheel = evaluate_five(&hand([(14, H), (2, H), (3, H), (4, H), (5, H)]));
        assert_eq!(steel_wheel.category, HandCategory::StraightFlush);
        assert_eq!(steel_wheel.kickers, vec![5]);
    }

    #[test]
    fn kickers_break_pair_ties() {
        let aces_king = evaluate_five(&hand([(14, S), (14, H), (13, D), (7, C), (3, S)]));
        let aces_queen = evaluate_five(&hand([(14, D), (14, C), (12, S), (7, H), (3, D)]));
        assert_eq!(aces_king.category, HandCategory::OnePair);
        assert!(aces_king.score > aces_queen.score);
    }

    #[test]
    fn two_pair_orders_high_pair_first() {
        let score = evaluate_five(&hand([(9, S), (9, H), (4, D), (4, C), (13, S)]));
        assert_eq!(score.category, HandCategory::TwoPair);
        assert_eq!(score.kickers, vec![9, 4, 13]);
    }

    #[test]
    fn full_house_beats_flush() {
        let boat = evaluate_five(&hand([(6, S), (6, H), (6, D), (2, C), (2, S)]));
        let flush = evaluate_five(&hand([(14, H), (12, H), (9, H), (7, H), (3, H)]));
        assert!(boat.score > flush.score);
    }

    #[test]
    fn best_of_seven_finds_the_flush() {
        let cards = vec![
            Card(14, H),
            Card(9, H),
            Card(2, S),
            Card(5, H),
            Card(11, H),
            Card(3, C),
            Card(7, H),
        ];
        let best = evaluate_best(&cards);
        assert_eq!(best.category, HandCategory::Flush);
        assert_eq!(best.kickers, vec![14, 11, 9, 7, 5]);
    }

    #[test]
    fn best_of_seven_matches_exhaustive_five_card_max() {
        let cards = vec![
            Card(10, S),
            Card(10, H),
            Card(4, D),
            Card(4, S),
            Card(10, D),
            Card(13, C),
            Card(2, H),
        ];
        let best = evaluate_best(&cards);
        // Tens full of fours.
        assert_eq!(best.category, HandCategory::FullHouse);
        assert_eq!(best.kickers, vec![10, 4]);
    }

    #[test]
    fn evaluation_is_deterministic() {
        let cards = vec![
            Card(8, S),
            Card(9, D),
            Card(10, C),
            Card(11, H),
            Card(12, S),
            Card(2, D),
            Card(2, C),
        ];
        assert_eq!(evaluate_best(&cards), evaluate_best(&cards));
    }
}
