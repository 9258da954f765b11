//! Matchmaking Queue: per-mode FIFO pairing of anonymous players into cash
//! tables (spec.md §4.5).
//!
//! Sits alongside `rbp-tournament` as a second consumer of `rbp-hosting`'s
//! `Casino` and the shared `LockManager` abstraction -- a match is nothing
//! more than a cash table created and seated on the players' behalf, so
//! this crate never touches a `Table` or `Room` directly.

mod coordinator;
mod error;

pub use coordinator::Coordinator;
pub use coordinator::MatchingHandle;
pub use coordinator::QueueSpec;
pub use coordinator::QUEUE_TYPES;
pub use error::MatchmakingError;
