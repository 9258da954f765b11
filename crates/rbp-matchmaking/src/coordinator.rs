use crate::error::MatchmakingError;
use rbp_auth::AuthRepository;
use rbp_auth::Member;
use rbp_core::Chips;
use rbp_core::ID;
use rbp_gameplay::Config;
use rbp_gameroom::ServerMessage;
use rbp_hosting::Casino;
use rbp_records::MatchmakingEntry;
use rbp_records::MatchmakingRepository;
use rbp_tournament::LockManager;
use std::sync::Arc;
use std::time::Duration;
use tokio_postgres::Client;

/// How often the matching loop checks every queue's size against its
/// required count (spec.md §4.5 "a background coordinator, per queue
/// type, checks size vs required").
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);
const LOCK_TTL: Duration = Duration::from_secs(30);
const LOCK_WAIT: Duration = Duration::from_secs(10);

/// One matchable mode: how many entries it takes to fire a match, and the
/// cash-table terms the matched players are seated at.
#[derive(Debug, Clone, Copy)]
pub struct QueueSpec {
    pub required: usize,
    pub small_blind: Chips,
    pub big_blind: Chips,
    pub buy_in: Chips,
}

/// Every queue type this process matches (spec.md §4.5 "e.g. headsup=2,
/// 3player=3"). Fixed at compile time -- there's no admin surface to
/// register new modes at runtime, matching the rest of the platform's
/// configuration-by-deploy style.
pub const QUEUE_TYPES: &[(&str, QueueSpec)] = &[
    ("headsup", QueueSpec { required: 2, small_blind: 5, big_blind: 10, buy_in: 500 }),
    ("3player", QueueSpec { required: 3, small_blind: 5, big_blind: 10, buy_in: 500 }),
];

fn spec_for(queue_type: &str) -> Option<QueueSpec> {
    QUEUE_TYPES.iter().find(|(name, _)| *name == queue_type).map(|(_, spec)| *spec)
}

pub type MatchingHandle = tokio::task::JoinHandle<()>;

/// Matchmaking Queue (spec.md §4.5): pairs anonymous players into cash
/// tables of a specific mode. Shares `Casino` with the Tournament
/// Coordinator and Session Bridge -- a matched table is just another cash
/// table once seated, indistinguishable to `rbp-hosting` from one created
/// through the HTTP `create_table` route.
pub struct Coordinator<L: LockManager> {
    db: Arc<Client>,
    casino: Arc<Casino>,
    locks: Arc<L>,
}

impl<L: LockManager> Coordinator<L> {
    pub fn new(db: Arc<Client>, casino: Arc<Casino>, locks: Arc<L>) -> Self {
        Self { db, casino, locks }
    }

    fn key(queue_type: &str) -> String {
        format!("queue:{queue_type}")
    }

    /// `Enqueue(userId, queueType)` (spec.md §4.5).
    pub async fn enqueue(&self, user: ID<Member>, queue_type: &str) -> Result<(), MatchmakingError> {
        spec_for(queue_type).ok_or(MatchmakingError::UnknownQueue)?;
        let key = Self::key(queue_type);
        if !self.locks.acquire(&key, LOCK_TTL, LOCK_WAIT).await {
            return Err(MatchmakingError::LockTimeout);
        }
        let result = self.enqueue_locked(user, queue_type).await;
        self.locks.release(&key).await;
        result
    }

    async fn enqueue_locked(&self, user: ID<Member>, queue_type: &str) -> Result<(), MatchmakingError> {
        if self.already_queued(user).await? {
            return Err(MatchmakingError::AlreadyQueued);
        }
        if self.casino.user_seated_in_cash_table(user).await {
            return Err(MatchmakingError::SeatedElsewhere);
        }
        self.db.enqueue(&MatchmakingEntry::new(user, queue_type)).await?;
        Ok(())
    }

    /// spec.md §4.5 "reject if user already in any queue" -- scans every
    /// known queue type since a user's current queue isn't indexed by
    /// anything but `(user_id, queue_type)`.
    async fn already_queued(&self, user: ID<Member>) -> Result<bool, MatchmakingError> {
        for &(queue_type, _) in QUEUE_TYPES {
            let entries = self.db.queue(queue_type).await?;
            if entries.iter().any(|e| e.user() == user) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// `Leave(userId)` (spec.md §4.5). Removes `user` from whichever queue
    /// they're in; a no-op query across the fixed, small set of queue
    /// types rather than a dedicated by-user index.
    pub async fn leave(&self, user: ID<Member>) -> Result<(), MatchmakingError> {
        for &(queue_type, _) in QUEUE_TYPES {
            let key = Self::key(queue_type);
            if !self.locks.acquire(&key, LOCK_TTL, LOCK_WAIT).await {
                continue;
            }
            let found = self.db.queue(queue_type).await?.iter().any(|e| e.user() == user);
            if found {
                self.db.dequeue(user, queue_type).await?;
                self.locks.release(&key).await;
                return Ok(());
            }
            self.locks.release(&key).await;
        }
        Err(MatchmakingError::NotQueued)
    }

    /// Spawns the background task that matches every queue type once it
    /// reaches its required size (spec.md §4.5 "a background coordinator").
    pub fn spawn_matching_loop(self: &Arc<Self>) -> MatchingHandle
    where
        L: 'static,
    {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                for &(queue_type, spec) in QUEUE_TYPES {
                    this.tick(queue_type, spec).await;
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        })
    }

    async fn tick(&self, queue_type: &str, spec: QueueSpec) {
        let entries = match self.db.queue(queue_type).await {
            Ok(entries) => entries,
            Err(err) => {
                log::error!("[matchmaking {queue_type}] failed to list queue: {err}");
                return;
            }
        };
        if entries.len() < spec.required {
            return;
        }
        if let Err(err) = self.make_match(queue_type, spec).await {
            log::error!("[matchmaking {queue_type}] failed to form a match: {err}");
        }
    }

    /// Under the queue-wide lock: selects the oldest `spec.required`
    /// entries by `joined_at`, dequeues them, deducts each buy-in, seats
    /// them at randomized positions of a freshly created cash table, and
    /// broadcasts `match_found` (spec.md §4.5). Any step failing past the
    /// dequeue refunds and re-enqueues every entry already pulled, so a
    /// transient table-creation failure never strands a debited player.
    async fn make_match(&self, queue_type: &str, spec: QueueSpec) -> Result<(), MatchmakingError> {
        let key = Self::key(queue_type);
        if !self.locks.acquire(&key, LOCK_TTL, LOCK_WAIT).await {
            return Err(MatchmakingError::LockTimeout);
        }
        let result = self.make_match_locked(queue_type, spec).await;
        self.locks.release(&key).await;
        result
    }

    async fn make_match_locked(&self, queue_type: &str, spec: QueueSpec) -> Result<(), MatchmakingError> {
        let mut entries = self.db.queue(queue_type).await?;
        if entries.len() < spec.required {
            return Ok(());
        }
        entries.sort_by_key(|e| e.joined_at());
        let selected: Vec<MatchmakingEntry> = entries.into_iter().take(spec.required).collect();

        for entry in &selected {
            self.db.dequeue(entry.user(), queue_type).await?;
        }

        if let Err(err) = self.seat_match(queue_type, spec, &selected).await {
            for entry in &selected {
                let _ = self.db.enqueue(entry).await;
            }
            return Err(err);
        }
        Ok(())
    }

    async fn seat_match(&self, queue_type: &str, spec: QueueSpec, selected: &[MatchmakingEntry]) -> Result<(), MatchmakingError> {
        use rand::seq::SliceRandom;

        let mut debited = Vec::with_capacity(selected.len());
        for entry in selected {
            if let Err(err) = self.db.adjust_chips(entry.user(), -spec.buy_in).await {
                for user in &debited {
                    let _ = self.db.adjust_chips(*user, spec.buy_in).await;
                }
                return Err(err.into());
            }
            debited.push(entry.user());
        }

        let config = Config::cash(spec.required, spec.small_blind, spec.big_blind, spec.buy_in);
        let room = match self.casino.create_table(config).await {
            Ok(room) => room,
            Err(err) => {
                for user in &debited {
                    let _ = self.db.adjust_chips(*user, spec.buy_in).await;
                }
                return Err(err.into());
            }
        };

        let mut positions: Vec<_> = room.open_seats().await;
        positions.shuffle(&mut rand::rng());
        for (index, entry) in selected.iter().enumerate() {
            let Some(member) = self.db.find(entry.user()).await? else {
                continue;
            };
            let Some(&position) = positions.get(index) else {
                log::error!("[matchmaking {queue_type}] ran out of seats for a matched player");
                continue;
            };
            if room.seat(position, entry.user(), member.username().to_string(), spec.buy_in).await.is_err() {
                log::error!("[matchmaking {queue_type}] failed to seat a matched player");
            }
        }
        room.broadcast_message(&ServerMessage::MatchFound {
            table_id: room.id().inner(),
            game_mode: queue_type.to_string(),
            timestamp: ServerMessage::now(),
        })
        .await;
        log::info!("[matchmaking {queue_type}] matched {} players onto table {}", selected.len(), room.id());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_lookup_finds_known_modes() {
        assert_eq!(spec_for("headsup").unwrap().required, 2);
        assert_eq!(spec_for("3player").unwrap().required, 3);
        assert!(spec_for("nonsense").is_none());
    }
}
