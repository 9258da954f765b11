/// A card suit: clubs, diamonds, hearts, spades.
///
/// Encoded `0..4` so it can be used directly as a bit offset in [`super::card::Card`]'s
/// `u32` representation.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub enum Suit {
    C,
    D,
    H,
    S,
}

impl From<u8> for Suit {
    fn from(n: u8) -> Self {
        match n {
            0 => Suit::C,
            1 => Suit::D,
            2 => Suit::H,
            3 => Suit::S,
            _ => panic!("invalid suit {n}"),
        }
    }
}
impl From<Suit> for u8 {
    fn from(s: Suit) -> u8 {
        match s {
            Suit::C => 0,
            Suit::D => 1,
            Suit::H => 2,
            Suit::S => 3,
        }
    }
}

impl std::fmt::Display for Suit {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Suit::C => "c",
                Suit::D => "d",
                Suit::H => "h",
                Suit::S => "s",
            }
        )
    }
}

impl TryFrom<&str> for Suit {
    type Error = String;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.trim().to_lowercase().as_str() {
            "c" => Ok(Suit::C),
            "d" => Ok(Suit::D),
            "h" => Ok(Suit::H),
            "s" => Ok(Suit::S),
            other => Err(format!("invalid suit '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bijective_u8() {
        for n in 0..4u8 {
            assert_eq!(n, u8::from(Suit::from(n)));
        }
    }
}
