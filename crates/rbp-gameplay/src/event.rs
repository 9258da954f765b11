use rbp_core::Chips;
use rbp_core::Position;
use rbp_cards::Board;
use rbp_cards::Hole;
use rbp_cards::Street;
use rbp_cards::Strength;

use crate::Action;

/// Something the engine produced while processing one operation.
///
/// Captured inside the table's critical section and returned to the caller,
/// who dispatches (broadcast/persist) only after releasing the lock.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "client", serde(tag = "kind", rename_all = "snake_case"))]
pub enum Event {
    HandStarted {
        hand_number: u64,
        dealer: Position,
        sb_seat: Position,
        bb_seat: Position,
        sb_amount: Chips,
        bb_amount: Chips,
        starting_chips: Vec<(Position, Chips)>,
    },
    PlayerAction {
        actor: Position,
        action: Action,
        timeout: bool,
    },
    RoundAdvanced {
        street: Street,
        community: Board,
    },
    Showdown {
        reveals: Vec<(Position, Hole, Strength)>,
    },
    HandComplete {
        winners: Vec<(Position, Chips)>,
        final_pot: Chips,
        community: Board,
        /// Seats whose stack hit zero when this hand settled, paired with
        /// the user who held them -- the table has already vacated these
        /// seats by the time this event is dispatched, so the user id is
        /// captured here rather than looked up afterward (spec.md §4.4
        /// "Elimination handler").
        busted: Vec<(Position, uuid::Uuid)>,
        /// Every active seat's stack as this hand was dealt, for breaking
        /// ties among same-hand busts (spec.md §4.4 "the seat with the
        /// larger stack at the start of that hand finishes higher").
        starting_stacks: Vec<(Position, Chips)>,
    },
    GameComplete {
        winner: Position,
    },
}

impl Event {
    /// The stable wire/history kind string, matching spec.md's event kind
    /// taxonomy (`hand_started`, `player_action`, `round_advanced`,
    /// `showdown`, `hand_complete`, `game_complete`).
    pub fn kind(&self) -> &'static str {
        match self {
            Event::HandStarted { .. } => "hand_started",
            Event::PlayerAction { .. } => "player_action",
            Event::RoundAdvanced { .. } => "round_advanced",
            Event::Showdown { .. } => "showdown",
            Event::HandComplete { .. } => "hand_complete",
            Event::GameComplete { .. } => "game_complete",
        }
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Event::HandStarted { hand_number, dealer, .. } => {
                write!(f, "hand #{hand_number} started, dealer seat {dealer}")
            }
            Event::PlayerAction { actor, action, timeout } => {
                if *timeout {
                    write!(f, "seat {actor} timed out -> {action}")
                } else {
                    write!(f, "seat {actor} {action}")
                }
            }
            Event::RoundAdvanced { street, .. } => write!(f, "round advanced to {street}"),
            Event::Showdown { reveals } => write!(f, "showdown, {} hands revealed", reveals.len()),
            Event::HandComplete { final_pot, .. } => write!(f, "hand complete, pot {final_pot}"),
            Event::GameComplete { winner } => write!(f, "game complete, seat {winner} remains"),
        }
    }
}
