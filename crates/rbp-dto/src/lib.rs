//! Data transfer objects for the platform's HTTP surface.
//!
//! Kept deliberately decoupled from the domain crates (`rbp-records`,
//! `rbp-gameplay`): these are wire shapes for `rbp-server`'s REST handlers,
//! not persistence or engine types, so a DTO field rename never forces a
//! schema migration and vice versa.

mod history;
mod tournament;

pub use history::*;
pub use tournament::*;
