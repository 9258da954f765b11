//! Session Bridge: the async runtime that turns one in-memory
//! [`rbp_gameplay::Table`] into a live, multi-subscriber poker table.
//!
//! Owns the table behind a lock, enforces per-user rate limiting and
//! request idempotency on the way in, and persists/broadcasts the engine's
//! output on the way out -- never touching the engine and the network
//! inside the same critical section.

mod hooks;
mod idempotency;
mod limiter;
mod message;
mod room;

pub use hooks::TableEvent;
pub use hooks::HOOK_CHANNEL_CAPACITY;
pub use message::ClientMessage;
pub use message::SeatView;
pub use message::ServerMessage;
pub use message::TableSnapshot;
pub use room::Room;
