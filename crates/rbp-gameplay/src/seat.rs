use rbp_core::Chips;
use rbp_core::ID;
use rbp_cards::*;

/// A player's state at the table.
///
/// Tracks chips, betting status, and hole cards. The `cards` field is private
/// information -- in a real game, opponents can't see it until showdown or a
/// voluntary reveal.
///
/// # Fields
///
/// - `state` -- Betting, Shoving (all-in), Folding, or Waiting (sitting out)
/// - `stack` -- Chips behind (not yet committed)
/// - `stake` -- Chips committed this street
/// - `spent` -- Total chips committed this hand
/// - `cards` -- Hole cards (private), `None` before a hand deals or once mucked
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Seat {
    user: ID<crate::Player>,
    name: String,
    state: State,
    stack: Chips,
    stake: Chips,
    spent: Chips,
    cards: Option<Hole>,
    last_action: Option<String>,
    last_amount: Chips,
}

impl Seat {
    pub fn new(user: ID<crate::Player>, name: String, stack: Chips) -> Self {
        Self {
            user,
            name,
            stack,
            spent: 0,
            stake: 0,
            state: State::Waiting,
            cards: None,
            last_action: None,
            last_amount: 0,
        }
    }
    pub fn user(&self) -> ID<crate::Player> {
        self.user
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    /// Chips behind (not committed to pot).
    pub fn stack(&self) -> Chips {
        self.stack
    }
    /// Chips committed this street.
    pub fn stake(&self) -> Chips {
        self.stake
    }
    /// Current betting status.
    pub fn state(&self) -> State {
        self.state
    }
    /// Total chips committed this hand.
    pub fn spent(&self) -> Chips {
        self.spent
    }
    /// Hole cards (private information), if dealt in.
    pub fn cards(&self) -> Option<Hole> {
        self.cards
    }
    pub fn last_action(&self) -> Option<&str> {
        self.last_action.as_deref()
    }
    pub fn last_amount(&self) -> Chips {
        self.last_amount
    }
    pub fn record(&mut self, action: &str, amount: Chips) {
        self.last_action = Some(action.to_string());
        self.last_amount = amount;
    }
    /// Adds winnings to stack.
    pub fn win(&mut self, win: Chips) {
        self.stack += win;
    }
    /// Adds to the stack directly (buy-in / top-up), outside of hand settlement.
    pub fn credit(&mut self, amount: Chips) {
        self.stack += amount;
    }
    /// Commits chips from stack to pot, going all-in if it exceeds the stack.
    pub fn bet(&mut self, bet: Chips) {
        let bet = bet.min(self.stack);
        self.stack -= bet;
        self.stake += bet;
        self.spent += bet;
        if self.stack == 0 && self.state == State::Betting {
            self.state = State::Shoving;
        }
    }
    pub fn fold(&mut self) {
        self.state = State::Folding;
    }
    /// Posts an ante: straight into the pot, unlike [`Seat::bet`] it does
    /// not touch `stake` (antes aren't part of the current-bet comparison
    /// used for check/call validation). Returns the amount actually posted.
    pub fn ante(&mut self, amount: Chips) -> Chips {
        let amount = amount.min(self.stack);
        self.stack -= amount;
        self.spent += amount;
        if self.stack == 0 && self.state == State::Betting {
            self.state = State::Shoving;
        }
        amount
    }
    pub fn deal(&mut self, cards: Hole) {
        self.cards = Some(cards);
        self.stake = 0;
        self.spent = 0;
        self.last_action = None;
        self.last_amount = 0;
        self.state = if self.stack > 0 {
            State::Betting
        } else {
            State::Waiting
        };
    }
    pub fn muck(&mut self) {
        self.cards = None;
    }
    pub fn reset_stake(&mut self) {
        self.stake = 0;
    }
    pub fn sit_out(&mut self) {
        self.state = State::Waiting;
    }
}

impl std::fmt::Display for Seat {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:<10}{} ${:>6}", self.name, self.state, self.stack)
    }
}

/// Player betting status within a hand.
///
/// - `Betting` -- Active and can still make decisions
/// - `Shoving` -- All-in, no more decisions but still in the pot
/// - `Folding` -- Out of the hand
/// - `Waiting` -- Sitting out, not dealt into the current hand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    Betting,
    Shoving,
    Folding,
    Waiting,
}

impl State {
    /// True if player is still competing for the pot this hand.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Betting | Self::Shoving)
    }
    /// True if player can still be asked to act.
    pub fn can_act(&self) -> bool {
        matches!(self, Self::Betting)
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            State::Betting => write!(f, "active"),
            State::Shoving => write!(f, "all-in"),
            State::Folding => write!(f, "folded"),
            State::Waiting => write!(f, "sitting-out"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seat() -> Seat {
        Seat::new(ID::default(), "alice".to_string(), 1000)
    }

    #[test]
    fn bet_moves_chips_from_stack_to_stake() {
        let mut s = seat();
        s.state = State::Betting;
        s.bet(200);
        assert_eq!(s.stack(), 800);
        assert_eq!(s.stake(), 200);
        assert_eq!(s.spent(), 200);
    }

    #[test]
    fn bet_beyond_stack_goes_all_in() {
        let mut s = seat();
        s.state = State::Betting;
        s.bet(5000);
        assert_eq!(s.stack(), 0);
        assert_eq!(s.stake(), 1000);
        assert_eq!(s.state(), State::Shoving);
    }

    #[test]
    fn fold_marks_inactive() {
        let mut s = seat();
        s.fold();
        assert!(!s.state().is_active());
    }
}
