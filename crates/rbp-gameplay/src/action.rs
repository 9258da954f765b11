use rbp_core::Chips;

/// A player's decision at their turn to act.
///
/// `Raise` and the `AllIn` shorthand both carry the *new total* a seat
/// commits this street (matching spec.md's `raise(new_total)` semantics),
/// not a delta on top of the current bet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "client", serde(tag = "kind", rename_all = "snake_case"))]
pub enum Action {
    Fold,
    Check,
    Call,
    Raise { to: Chips },
    AllIn,
}

impl Action {
    /// The wire/history kind string, independent of amount.
    pub fn kind(&self) -> &'static str {
        match self {
            Action::Fold => "fold",
            Action::Check => "check",
            Action::Call => "call",
            Action::Raise { .. } => "raise",
            Action::AllIn => "allin",
        }
    }
    /// The amount carried by this action (0 for fold/check/call).
    pub fn amount(&self) -> Chips {
        match self {
            Action::Raise { to } => *to,
            _ => 0,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Action::Raise { to } => write!(f, "raise to {to}"),
            other => write!(f, "{}", other.kind()),
        }
    }
}

/// Validation failures for `ProcessAction` and `StartNewHand`.
///
/// Reported to the offending client only; state is left unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionError {
    NotYourTurn,
    CannotCheck,
    InsufficientChips,
    RaiseTooSmall { min: Chips },
    TableFull,
    NotEnoughPlayers,
    HandNotInProgress,
    SeatNotFound,
    TablePaused,
}

impl ActionError {
    /// Stable wire error code (`error.code`), matching spec.md §7's taxonomy.
    pub fn code(&self) -> &'static str {
        match self {
            ActionError::NotYourTurn => "not_your_turn",
            ActionError::CannotCheck => "cannot_check",
            ActionError::InsufficientChips => "insufficient_chips",
            ActionError::RaiseTooSmall { .. } => "raise_too_small",
            ActionError::TableFull => "table_full",
            ActionError::NotEnoughPlayers => "not_enough_players",
            ActionError::HandNotInProgress => "hand_not_in_progress",
            ActionError::SeatNotFound => "seat_not_found",
            ActionError::TablePaused => "table_paused",
        }
    }
}

impl std::fmt::Display for ActionError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ActionError::NotYourTurn => write!(f, "it is not your turn to act"),
            ActionError::CannotCheck => write!(f, "cannot check facing a bet"),
            ActionError::InsufficientChips => write!(f, "insufficient chips for this action"),
            ActionError::RaiseTooSmall { min } => write!(f, "raise must be at least {min}"),
            ActionError::TableFull => write!(f, "table has no open seats"),
            ActionError::NotEnoughPlayers => write!(f, "need at least two seated players with chips"),
            ActionError::HandNotInProgress => write!(f, "no hand is currently in progress"),
            ActionError::SeatNotFound => write!(f, "seat not found at this table"),
            ActionError::TablePaused => write!(f, "table is paused, no new hands may start"),
        }
    }
}

impl std::error::Error for ActionError {}
