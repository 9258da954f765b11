use rbp_core::ID;
use rbp_gameplay::Event;
use rbp_gameplay::Table as LiveTable;

/// One engine event, tagged with the table it came from.
///
/// Broadcast on a [`tokio::sync::broadcast`] channel shared by every
/// [`crate::Room`] in a process (spec.md §2 "events ⇢ SB (persist +
/// fan-out) ⇢ subscribed clients + HR + TC hooks") -- the Tournament
/// Coordinator's elimination handler and the Matchmaking Queue's table
/// lifecycle bookkeeping both subscribe to this instead of the engine
/// directly, so neither ever touches a `Room`'s table lock.
#[derive(Debug, Clone)]
pub struct TableEvent {
    pub table: ID<LiveTable>,
    pub event: Event,
}

/// Capacity of the shared hook channel. A slow subscriber (e.g. a
/// Tournament Coordinator tick that's mid-transaction) can fall behind by
/// this many events across *all* tables before `RecvError::Lagged` forces
/// it to skip forward; generous because hand-complete events -- the only
/// ones TC cares about -- are a small fraction of total traffic.
pub const HOOK_CHANNEL_CAPACITY: usize = 4096;
