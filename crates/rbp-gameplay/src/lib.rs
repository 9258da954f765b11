//! Pure, in-memory hand-level state machine for one poker table.
//!
//! This is the Game Engine of the platform: given a table configuration and
//! a sequence of seat joins/leaves and player actions, it produces the
//! authoritative sequence of hands dealt, bets placed, and chips won. It
//! performs no I/O and holds no lock of its own -- the caller (the session
//! bridge, `rbp-gameroom::Room`) is responsible for serializing access and
//! for dispatching the [`Event`]s this crate returns only after releasing
//! whatever mutex guards the table.
//!
//! ## Core Types
//!
//! - [`Table`] -- the state machine: seats, the in-progress [`Hand`] (if
//!   any), and the table-level status
//! - [`Seat`] -- one player's chips, cards, and betting status
//! - [`Action`] -- a player's decision (fold/check/call/raise/all-in)
//! - [`Event`] -- something the engine produced, to be persisted/broadcast
//! - [`Showdown`] -- layered side-pot construction and awarding

mod action;
mod config;
mod event;
mod pnl;
mod seat;
mod settlement;
mod showdown;
mod table;

pub use action::*;
pub use config::*;
pub use event::*;
pub use pnl::*;
pub use seat::*;
pub use settlement::*;
pub use showdown::*;
pub use table::*;

/// Marker type for [`rbp_core::ID`] -- a seated user, identified the same
/// way `rbp-auth::Member` is identified. Kept separate from `Member` itself
/// so this crate does not need to depend on `rbp-auth`.
pub struct Player;
