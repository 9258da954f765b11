//! Tournament Coordinator: registration, blind progression, elimination,
//! consolidation, and prize distribution for multi-table tournaments
//! (spec.md §4.4).
//!
//! Sits above `rbp-gameroom`/`rbp-hosting` the same way `rbp-records` sits
//! above `tokio-postgres`: it never touches a `Table`'s mutex directly,
//! driving everything through `Room`'s public API and the shared
//! `Casino::subscribe()` hook channel.

mod coordinator;
mod error;
mod lock;

pub use coordinator::Coordinator;
pub use coordinator::BlindProgressionHandle;
pub use coordinator::EliminationHandle;
pub use coordinator::StarterHandle;
pub use error::TournamentError;
pub use lock::LockManager;
pub use lock::MutexMap;
