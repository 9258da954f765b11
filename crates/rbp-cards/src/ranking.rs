/// Hand category, from weakest to strongest. Derives `Ord` in declaration
/// order so a higher-ranked category always compares greater.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub enum Ranking {
    HighCard,
    OnePair,
    TwoPair,
    ThreeOfAKind,
    Straight,
    Flush,
    FullHouse,
    FourOfAKind,
    StraightFlush,
}

impl std::fmt::Display for Ranking {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Ranking::HighCard => "high card",
                Ranking::OnePair => "one pair",
                Ranking::TwoPair => "two pair",
                Ranking::ThreeOfAKind => "three of a kind",
                Ranking::Straight => "straight",
                Ranking::Flush => "flush",
                Ranking::FullHouse => "full house",
                Ranking::FourOfAKind => "four of a kind",
                Ranking::StraightFlush => "straight flush",
            }
        )
    }
}
