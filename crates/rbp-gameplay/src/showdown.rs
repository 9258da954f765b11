use rbp_core::Chips;
use rbp_core::Position;
use rbp_cards::Strength;

/// Layered side-pot construction and awarding.
///
/// Built directly from spec.md §4.1's algorithm: sort contributions, build a
/// pot per distinct contribution level, award each pot to the best hand among
/// its eligible (non-folded) contributors, splitting ties evenly with the
/// remainder going to the seat closest clockwise from the dealer.
pub struct Showdown;

/// One seat's contribution and contest status for a single hand's settlement.
pub struct Contribution {
    pub position: Position,
    pub spent: Chips,
    pub folded: bool,
}

impl Showdown {
    /// Computes each contending seat's winnings from `spent` contributions
    /// and (for non-folded seats) relative `strength`.
    ///
    /// `dealer` and `seats` (total seat count) resolve clockwise tie-breaks.
    /// Returns `(position, amount)` pairs for every seat that won at least
    /// one chip; seats that contributed but won nothing are omitted.
    pub fn settle(
        contributions: &[Contribution],
        strengths: &std::collections::HashMap<Position, Strength>,
        dealer: Position,
        seats: usize,
    ) -> Vec<(Position, Chips)> {
        let mut levels: Vec<Chips> = contributions
            .iter()
            .map(|c| c.spent)
            .filter(|&c| c > 0)
            .collect();
        levels.sort_unstable();
        levels.dedup();

        let mut winnings: std::collections::HashMap<Position, Chips> = std::collections::HashMap::new();
        let mut floor = 0;
        for level in levels {
            let contributors: Vec<&Contribution> = contributions
                .iter()
                .filter(|c| c.spent >= level)
                .collect();
            let layer = (level - floor) * contributors.len() as Chips;
            floor = level;
            if layer <= 0 {
                continue;
            }
            let eligible: Vec<Position> = contributors
                .iter()
                .filter(|c| !c.folded)
                .map(|c| c.position)
                .collect();
            if eligible.is_empty() {
                continue;
            }
            let best = eligible
                .iter()
                .filter_map(|p| strengths.get(p).map(|s| (p, s)))
                .max_by_key(|(_, s)| (*s).clone())
                .map(|(_, s)| s.clone());
            let Some(best) = best else { continue };
            let mut winners: Vec<Position> = eligible
                .into_iter()
                .filter(|p| strengths.get(p) == Some(&best))
                .collect();
            winners.sort_unstable_by_key(|&p| Self::clockwise_distance(dealer, p, seats));

            let share = layer / winners.len() as Chips;
            let mut remainder = layer % winners.len() as Chips;
            for position in winners {
                let mut amount = share;
                if remainder > 0 {
                    amount += 1;
                    remainder -= 1;
                }
                *winnings.entry(position).or_insert(0) += amount;
            }
        }
        winnings.into_iter().collect()
    }

    /// Distance travelling clockwise from the seat immediately after `dealer`.
    fn clockwise_distance(dealer: Position, position: Position, seats: usize) -> usize {
        (position + seats - dealer - 1) % seats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rbp_cards::Ranking;

    fn strength(ranking: Ranking) -> Strength {
        Strength::new(ranking, vec![])
    }

    #[test]
    fn single_pot_single_winner() {
        let contributions = vec![
            Contribution { position: 0, spent: 100, folded: false },
            Contribution { position: 1, spent: 100, folded: false },
        ];
        let mut strengths = std::collections::HashMap::new();
        strengths.insert(0, strength(Ranking::Flush));
        strengths.insert(1, strength(Ranking::OnePair));
        let winnings = Showdown::settle(&contributions, &strengths, 0, 2);
        assert_eq!(winnings, vec![(0, 200)]);
    }

    #[test]
    fn side_pot_excludes_short_stack_from_overlay() {
        // A all-in for 100, B and C cover to 500 each with the best hand.
        let contributions = vec![
            Contribution { position: 0, spent: 100, folded: false },
            Contribution { position: 1, spent: 500, folded: false },
            Contribution { position: 2, spent: 500, folded: false },
        ];
        let mut strengths = std::collections::HashMap::new();
        strengths.insert(0, strength(Ranking::HighCard));
        strengths.insert(1, strength(Ranking::OnePair));
        strengths.insert(2, strength(Ranking::Flush));
        let winnings = Showdown::settle(&contributions, &strengths, 0, 3);
        // main pot (300) goes to best overall hand (C); side pot (800) is
        // only between B and C since A capped out, also C.
        let total: Chips = winnings.iter().map(|(_, a)| a).sum();
        assert_eq!(total, 1100);
        assert_eq!(winnings.iter().find(|(p, _)| *p == 2).unwrap().1, 1100);
    }

    #[test]
    fn tie_splits_with_remainder_clockwise_from_dealer() {
        let contributions = vec![
            Contribution { position: 0, spent: 101, folded: false },
            Contribution { position: 1, spent: 101, folded: false },
            Contribution { position: 2, spent: 101, folded: false },
        ];
        let mut strengths = std::collections::HashMap::new();
        strengths.insert(0, strength(Ranking::Flush));
        strengths.insert(1, strength(Ranking::Flush));
        strengths.insert(2, strength(Ranking::Flush));
        let winnings = Showdown::settle(&contributions, &strengths, 0, 3);
        // 303 split 3 ways = 101 each, no remainder.
        for (_, amount) in &winnings {
            assert_eq!(*amount, 101);
        }
    }

    #[test]
    fn folded_contributor_stays_in_pot_but_not_eligible() {
        let contributions = vec![
            Contribution { position: 0, spent: 50, folded: true },
            Contribution { position: 1, spent: 50, folded: false },
        ];
        let mut strengths = std::collections::HashMap::new();
        strengths.insert(1, strength(Ranking::HighCard));
        let winnings = Showdown::settle(&contributions, &strengths, 0, 2);
        assert_eq!(winnings, vec![(1, 100)]);
    }
}
