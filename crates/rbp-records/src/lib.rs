//! History Recorder, table/tournament/matchmaking persistence.
//!
//! Kept separate from `rbp-gameplay`: the Game Engine owns authoritative
//! in-memory state and never touches the database directly, so a query here
//! never blocks a hand in progress.
#![allow(dead_code)]

mod action;
mod event;
mod hand;
mod matchmaking;
mod recorder;
mod table;
mod tournament;
mod tournament_player;

#[cfg(feature = "database")]
mod repository;

pub use action::HandAction;
pub use event::GameEvent;
pub use hand::Hand;
pub use matchmaking::MatchmakingEntry;
pub use recorder::Recorder;
pub use table::TableRecord;
pub use tournament::BlindLevel;
pub use tournament::Tournament;
pub use tournament::TournamentStatus;
pub use tournament_player::PlayerStatus;
pub use tournament_player::TournamentPlayer;

#[cfg(feature = "database")]
pub use recorder::get_hand_events;
#[cfg(feature = "database")]
pub use recorder::get_table_hands;
#[cfg(feature = "database")]
pub use recorder::record;
#[cfg(feature = "database")]
pub use repository::MatchmakingRepository;
#[cfg(feature = "database")]
pub use repository::RecordRepository;
#[cfg(feature = "database")]
pub use repository::RegistrationError;
#[cfg(feature = "database")]
pub use repository::TournamentRepository;
