use super::card::Card;
use super::hand::Hand;

/// A player's two private cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub struct Hole(Card, Card);

impl From<(Card, Card)> for Hole {
    fn from((a, b): (Card, Card)) -> Self {
        Self(a, b)
    }
}
impl From<Hole> for Hand {
    fn from(hole: Hole) -> Self {
        Hand::from(hole.0).add(Hand::from(hole.1))
    }
}

impl std::fmt::Display for Hole {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}{}", self.0, self.1)
    }
}
