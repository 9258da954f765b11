use rbp_auth::Member;
use rbp_core::ID;
use rbp_gameplay::Config;
use rbp_gameplay::Mode;
use rbp_gameplay::Table as LiveTable;
use rbp_gameroom::Room;
use rbp_gameroom::TableEvent;
use rbp_gameroom::HOOK_CHANNEL_CAPACITY;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::sync::RwLock;
use tokio_postgres::Client;
use uuid::Uuid;

/// Registry of every live [`Room`] the process currently hosts.
///
/// A table outlives its creator (a matchmaking match, a tournament seating,
/// or a direct HTTP create) -- the Casino is the one place that can look a
/// table up by id regardless of who made it, so a WebSocket connection for
/// any table_id can always find its Room.
///
/// Also owns the process-wide [`TableEvent`] hook channel: every `Room` it
/// creates is handed a clone of the same sender, so the Tournament
/// Coordinator and Matchmaking Queue can watch every table's engine events
/// through one [`Casino::subscribe`] receiver rather than reaching into
/// each `Room` individually.
pub struct Casino {
    db: Arc<Client>,
    rooms: RwLock<HashMap<ID<LiveTable>, Arc<Room>>>,
    hooks: broadcast::Sender<TableEvent>,
}

impl Casino {
    pub fn new(db: Arc<Client>) -> Self {
        let (hooks, _) = broadcast::channel(HOOK_CHANNEL_CAPACITY);
        Self { db, rooms: RwLock::new(HashMap::new()), hooks }
    }

    /// Subscribes to every engine event emitted by every table this Casino
    /// hosts, present and future. Used by the Tournament Coordinator's
    /// elimination handler and the Matchmaking Queue's bookkeeping.
    pub fn subscribe(&self) -> broadcast::Receiver<TableEvent> {
        self.hooks.subscribe()
    }

    /// Creates a standalone cash table and registers it.
    ///
    /// Returns `anyhow::Result`: table creation only fails on a database or
    /// connection-pool outage, not on anything a caller branches on by kind.
    pub async fn create_table(&self, config: Config) -> anyhow::Result<Arc<Room>> {
        let room = Room::create(config, None, self.db.clone(), self.hooks.clone()).await?;
        self.rooms.write().await.insert(room.id(), room.clone());
        log::info!("[casino] opened table {}", room.id());
        Ok(room)
    }

    /// Creates a table seated inside a tournament bracket (spec.md §4.4),
    /// tagging its `tables` row with the tournament id and table number so
    /// the Tournament Coordinator's consolidation logic can find it again.
    pub async fn create_tournament_table(&self, config: Config, tournament: Uuid, number: u32) -> anyhow::Result<Arc<Room>> {
        let room = Room::create(config, Some((tournament, number)), self.db.clone(), self.hooks.clone()).await?;
        self.rooms.write().await.insert(room.id(), room.clone());
        log::info!("[casino] opened tournament table {} (tournament {})", room.id(), tournament);
        Ok(room)
    }

    /// Registers a table created by another component (Tournament
    /// Coordinator, Matchmaking Queue) so it becomes reachable over
    /// WebSocket through this same registry.
    pub async fn adopt(&self, room: Arc<Room>) {
        self.rooms.write().await.insert(room.id(), room);
    }

    pub async fn get(&self, id: ID<LiveTable>) -> Option<Arc<Room>> {
        self.rooms.read().await.get(&id).cloned()
    }

    /// Drops a completed table from the registry. The `Room` itself lives
    /// on as long as any `Arc` clone (e.g. an in-flight bridge task) holds
    /// it; this only stops new connections from finding it.
    pub async fn close(&self, id: ID<LiveTable>) -> Option<Arc<Room>> {
        let room = self.rooms.write().await.remove(&id);
        if room.is_some() {
            log::info!("[casino] closed table {}", id);
        }
        room
    }

    pub async fn table_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    /// Whether `user` already occupies a seat at any live cash table
    /// (spec.md §4.5 "reject if user already in any queue or seated at an
    /// active cash table"). Tournament tables don't count -- a registrant
    /// is allowed to also queue for matchmaking while their bracket plays
    /// out elsewhere.
    pub async fn user_seated_in_cash_table(&self, user: ID<Member>) -> bool {
        let rooms: Vec<Arc<Room>> = self.rooms.read().await.values().cloned().collect();
        for room in rooms {
            if room.mode().await != Mode::Cash {
                continue;
            }
            if room.occupied().await.iter().any(|(_, occupant, _, _)| *occupant == user) {
                return true;
            }
        }
        false
    }
}
