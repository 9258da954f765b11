use super::card::Card;
use super::hand::Hand;
use super::ranking::Ranking;
use super::strength::Strength;

/// Evaluates the best 5-card poker hand obtainable from a pool of cards.
///
/// Hand evaluation internals are treated as a primitive here: given hole
/// cards and a board, return a comparable [`Strength`]. This implementation
/// enumerates every 5-card subset of the pool rather than using a
/// perfect-hash lookup table, trading evaluation speed for simplicity.
pub struct Evaluator;

impl Evaluator {
    /// Evaluates the strongest 5-card hand from all cards in `pool`
    /// (typically a player's hole cards unioned with the board).
    pub fn evaluate(pool: Hand) -> Strength {
        let cards: Vec<Card> = pool.iter().collect();
        assert!(cards.len() >= 5, "need at least 5 cards to evaluate");
        Self::combinations(&cards, 5)
            .into_iter()
            .map(|hand| Self::rank5(&hand))
            .max()
            .expect("at least one 5-card combination")
    }

    fn combinations(cards: &[Card], k: usize) -> Vec<Vec<Card>> {
        if k == 0 {
            return vec![vec![]];
        }
        if cards.len() < k {
            return vec![];
        }
        let mut out = Vec::new();
        for i in 0..=(cards.len() - k) {
            for mut rest in Self::combinations(&cards[i + 1..], k - 1) {
                rest.insert(0, cards[i]);
                out.push(rest);
            }
        }
        out
    }

    fn rank5(hand: &[Card]) -> Strength {
        let mut ranks: Vec<u8> = hand.iter().map(|c| u8::from(c.rank())).collect();
        ranks.sort_unstable();
        let flush = hand.windows(2).all(|w| w[0].suit() == w[1].suit());
        let straight_high = Self::straight_high(&ranks);

        let mut counts = [0u8; 13];
        for &r in &ranks {
            counts[r as usize] += 1;
        }
        let mut by_count: Vec<(u8, u8)> = (0u8..13)
            .filter(|&r| counts[r as usize] > 0)
            .map(|r| (counts[r as usize], r))
            .collect();
        by_count.sort_unstable_by(|a, b| b.cmp(a));
        let pattern: Vec<u8> = by_count.iter().map(|(c, _)| *c).collect();
        let kickers: Vec<u8> = by_count.iter().map(|(_, r)| *r).collect();

        if let Some(high) = straight_high {
            if flush {
                return Strength::new(Ranking::StraightFlush, vec![high]);
            }
        }
        match pattern.as_slice() {
            [4, 1] => Strength::new(Ranking::FourOfAKind, kickers),
            [3, 2] => Strength::new(Ranking::FullHouse, kickers),
            _ if flush => Strength::new(Ranking::Flush, kickers),
            _ if straight_high.is_some() => {
                Strength::new(Ranking::Straight, vec![straight_high.unwrap()])
            }
            [3, 1, 1] => Strength::new(Ranking::ThreeOfAKind, kickers),
            [2, 2, 1] => Strength::new(Ranking::TwoPair, kickers),
            [2, 1, 1, 1] => Strength::new(Ranking::OnePair, kickers),
            _ => Strength::new(Ranking::HighCard, kickers),
        }
    }

    /// Returns the high card of a straight among the given sorted, unique-ish
    /// ranks, treating Ace low for the wheel (A-2-3-4-5). `None` if no 5
    /// consecutive ranks exist.
    fn straight_high(sorted_ranks: &[u8]) -> Option<u8> {
        let mut uniq: Vec<u8> = sorted_ranks.to_vec();
        uniq.dedup();
        if uniq.len() < 5 {
            return None;
        }
        // wheel: A(12),2(0),3(1),4(2),5(3)
        if uniq.contains(&12) && uniq[0..4] == [0, 1, 2, 3] {
            return Some(3);
        }
        for w in uniq.windows(5) {
            if w[4] - w[0] == 4 {
                return Some(w[4]);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::card::Card;

    fn hand(cards: &str) -> Hand {
        Card::parse(cards).unwrap().into_iter().collect()
    }

    #[test]
    fn flush_beats_straight() {
        let flush = Evaluator::evaluate(hand("2h 4h 6h 8h Th 3c 9d"));
        let straight = Evaluator::evaluate(hand("2c 3d 4h 5s 6c 9d Td"));
        assert!(flush.ranking() > straight.ranking());
    }

    #[test]
    fn wheel_is_a_straight() {
        let wheel = Evaluator::evaluate(hand("Ac 2d 3h 4s 5c 9d Td"));
        assert_eq!(wheel.ranking(), Ranking::Straight);
    }

    #[test]
    fn quads_beats_full_house() {
        let quads = Evaluator::evaluate(hand("2c 2d 2h 2s 9d Th Jc"));
        let boat = Evaluator::evaluate(hand("3c 3d 3h 9s 9d Th Jc"));
        assert!(quads.ranking() > boat.ranking());
    }
}
