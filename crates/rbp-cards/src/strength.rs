use super::ranking::Ranking;

/// A fully-resolved hand strength: category plus tiebreak kickers, in
/// descending order of significance. Comparable end-to-end, so two
/// `Strength`s can be ordered directly to settle a showdown.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub struct Strength {
    ranking: Ranking,
    kickers: Vec<u8>,
}

impl Strength {
    pub fn new(ranking: Ranking, kickers: Vec<u8>) -> Self {
        Self { ranking, kickers }
    }
    pub fn ranking(&self) -> Ranking {
        self.ranking
    }
}

impl std::fmt::Display for Strength {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.ranking)
    }
}
