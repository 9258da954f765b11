use crate::error::TournamentError;
use crate::lock::LockManager;
use rbp_auth::AuthRepository;
use rbp_auth::Member;
use rbp_core::Chips;
use rbp_core::Position;
use rbp_core::Unique;
use rbp_core::ID;
use rbp_gameplay::Config;
use rbp_gameplay::Event;
use rbp_gameplay::Table as LiveTable;
use rbp_gameroom::Room;
use rbp_gameroom::ServerMessage;
use rbp_gameroom::TableEvent;
use rbp_hosting::Casino;
use rbp_records::BlindLevel;
use rbp_records::PlayerStatus;
use rbp_records::RecordRepository;
use rbp_records::Tournament;
use rbp_records::TournamentPlayer;
use rbp_records::TournamentRepository;
use rbp_records::TournamentStatus;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use std::time::SystemTime;
use tokio::sync::broadcast;
use tokio_postgres::Client;

/// How often the starter and blind-progression loops check every open
/// tournament (spec.md §4.4 "polls every few seconds").
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);
/// TTL handed to [`LockManager::acquire`] for every tournament-scoped lock
/// (spec.md §5 "distributed lock... TTL ~30s").
const LOCK_TTL: Duration = Duration::from_secs(30);
/// How long a caller is willing to wait for a contended tournament lock
/// before giving up with [`TournamentError::LockTimeout`].
const LOCK_WAIT: Duration = Duration::from_secs(10);
/// Lower bound of a freshly dealt tournament table's size (spec.md §4.4
/// "target band 6-9, chosen to allow balancing").
const TARGET_MIN_TABLE: usize = 6;
/// Upper bound of a tournament table's size, and the seat count every
/// tournament table is created with regardless of initial occupancy, so
/// consolidation always has somewhere to seat an incoming player.
const TARGET_MAX_TABLE: usize = 9;

pub type StarterHandle = tokio::task::JoinHandle<()>;
pub type BlindProgressionHandle = tokio::task::JoinHandle<()>;
pub type EliminationHandle = tokio::task::JoinHandle<()>;

/// Drives every tournament through registration, the three cooperating
/// background loops, and the event-triggered elimination/consolidation/prize
/// handlers (spec.md §4.4). One instance is shared by the whole process --
/// registration HTTP handlers call it directly, and its own background
/// tasks call it by spawning a clone of the surrounding `Arc`.
pub struct Coordinator<L: LockManager> {
    db: Arc<Client>,
    casino: Arc<Casino>,
    locks: Arc<L>,
}

impl<L: LockManager> Coordinator<L> {
    pub fn new(db: Arc<Client>, casino: Arc<Casino>, locks: Arc<L>) -> Self {
        Self { db, casino, locks }
    }

    fn key(tournament: ID<Tournament>) -> String {
        format!("tournament:{tournament}")
    }

    /// Creates a new tournament row in `registering` status. Does not touch
    /// any player's chip balance -- that happens one registrant at a time
    /// through [`Coordinator::register`].
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        name: String,
        creator: ID<Member>,
        buy_in: Chips,
        starting_chips: Chips,
        min_players: u32,
        max_players: u32,
        auto_start_delay: Duration,
        blind_schedule: Vec<BlindLevel>,
        prize_structure: Vec<(u32, f64)>,
    ) -> Result<Tournament, TournamentError> {
        let tournament = Tournament::new(
            name,
            creator,
            buy_in,
            starting_chips,
            min_players,
            max_players,
            auto_start_delay,
            blind_schedule,
            prize_structure,
        );
        self.db.create_tournament(&tournament).await?;
        Ok(tournament)
    }

    /// `Register(tournamentId, userId)` (spec.md §4.4). Debits the buy-in
    /// before inserting the tournament-player row and refunds it if the
    /// insert is rejected -- the closest this codebase's `Arc<Client>`
    /// connection gets to "one transaction" across the `users` and
    /// `tournament_players` tables, with the per-tournament lock standing in
    /// for true cross-table atomicity (see DESIGN.md).
    pub async fn register(&self, tournament: ID<Tournament>, user: ID<Member>) -> Result<u32, TournamentError> {
        let key = Self::key(tournament);
        if !self.locks.acquire(&key, LOCK_TTL, LOCK_WAIT).await {
            return Err(TournamentError::LockTimeout);
        }
        let result = self.register_locked(tournament, user).await;
        self.locks.release(&key).await;
        result
    }

    async fn register_locked(&self, tournament: ID<Tournament>, user: ID<Member>) -> Result<u32, TournamentError> {
        let t = self.db.find_tournament(tournament).await?.ok_or(TournamentError::NotFound)?;
        if t.status() != TournamentStatus::Registering {
            return Err(TournamentError::InvalidState("tournament is not accepting registrations"));
        }
        self.db.adjust_chips(user, -t.buy_in()).await?;
        if let Err(err) = self.db.register_player(tournament, user).await {
            let _ = self.db.adjust_chips(user, t.buy_in()).await;
            return Err(err.into());
        }
        // no live table exists yet at this point in the lifecycle, so
        // `tournament_player_registered` has nobody to broadcast to; the
        // HTTP response to this call is the only delivery surface until
        // `Start` seats the field.
        let t = self.db.find_tournament(tournament).await?.ok_or(TournamentError::NotFound)?;
        Ok(t.current_players())
    }

    /// Inverse of `register` while registration is still open.
    pub async fn unregister(&self, tournament: ID<Tournament>, user: ID<Member>) -> Result<(), TournamentError> {
        let key = Self::key(tournament);
        if !self.locks.acquire(&key, LOCK_TTL, LOCK_WAIT).await {
            return Err(TournamentError::LockTimeout);
        }
        let result = self.unregister_locked(tournament, user).await;
        self.locks.release(&key).await;
        result
    }

    async fn unregister_locked(&self, tournament: ID<Tournament>, user: ID<Member>) -> Result<(), TournamentError> {
        let t = self.db.find_tournament(tournament).await?.ok_or(TournamentError::NotFound)?;
        self.db.unregister_player(tournament, user).await?;
        self.db.adjust_chips(user, t.buy_in()).await?;
        Ok(())
    }

    /// `Cancel` (creator only, status=registering): refunds every
    /// registrant's buy-in and marks the tournament cancelled.
    pub async fn cancel(&self, tournament: ID<Tournament>, requester: ID<Member>) -> Result<(), TournamentError> {
        let key = Self::key(tournament);
        if !self.locks.acquire(&key, LOCK_TTL, LOCK_WAIT).await {
            return Err(TournamentError::LockTimeout);
        }
        let result = self.cancel_locked(tournament, requester).await;
        self.locks.release(&key).await;
        result
    }

    async fn cancel_locked(&self, tournament: ID<Tournament>, requester: ID<Member>) -> Result<(), TournamentError> {
        let mut t = self.db.find_tournament(tournament).await?.ok_or(TournamentError::NotFound)?;
        if t.creator() != requester {
            return Err(TournamentError::Forbidden);
        }
        if t.status() != TournamentStatus::Registering {
            return Err(TournamentError::InvalidState("only a tournament still registering can be cancelled"));
        }
        let players = self.db.tournament_players(tournament).await?;
        for player in &players {
            self.db.adjust_chips(player.user(), t.buy_in()).await?;
        }
        t.cancel();
        self.db.save_tournament(&t).await?;
        Ok(())
    }

    /// Splits `total` registrants into tables sized within
    /// `[TARGET_MIN_TABLE, TARGET_MAX_TABLE]`, as evenly as possible
    /// (spec.md §4.4 "distribute into tables of size in [target_min,
    /// target_max]").
    fn distribute(total: usize) -> Vec<usize> {
        if total == 0 {
            return Vec::new();
        }
        if total <= TARGET_MAX_TABLE {
            return vec![total];
        }
        let tables = total.div_ceil(TARGET_MAX_TABLE);
        let base = total / tables;
        let remainder = total % tables;
        (0..tables).map(|i| if i < remainder { base + 1 } else { base }).collect()
    }

    /// `Start`: shuffles the field, deals it into freshly created tournament
    /// tables at the current blind level, and flips the tournament to
    /// `in_progress` (spec.md §4.4 "Start").
    pub async fn start(&self, tournament: ID<Tournament>) -> Result<(), TournamentError> {
        let key = Self::key(tournament);
        if !self.locks.acquire(&key, LOCK_TTL, LOCK_WAIT).await {
            return Err(TournamentError::LockTimeout);
        }
        let result = self.start_locked(tournament).await;
        self.locks.release(&key).await;
        result?;
        self.broadcast_to_tournament(
            tournament,
            &ServerMessage::TournamentStarted { tournament_id: tournament.inner(), timestamp: ServerMessage::now() },
        )
        .await;
        Ok(())
    }

    async fn start_locked(&self, tournament: ID<Tournament>) -> Result<(), TournamentError> {
        use rand::seq::SliceRandom;

        let mut t = self.db.find_tournament(tournament).await?.ok_or(TournamentError::NotFound)?;
        if t.status() != TournamentStatus::Registering {
            return Err(TournamentError::InvalidState("tournament has already started"));
        }
        t.set_status(TournamentStatus::Starting);
        self.db.save_tournament(&t).await?;

        let mut players = self.db.tournament_players(tournament).await?;
        players.shuffle(&mut rand::rng());

        let level = t.level().copied().unwrap_or(BlindLevel {
            small_blind: 0,
            big_blind: 0,
            ante: 0,
            duration: Duration::from_secs(0),
        });

        let mut cursor = 0;
        for (number, size) in Self::distribute(players.len()).into_iter().enumerate() {
            let config = Config::tournament(TARGET_MAX_TABLE, level.small_blind, level.big_blind, level.ante, t.starting_chips());
            let room = self.casino.create_tournament_table(config, tournament.inner(), number as u32).await?;

            let mut open: Vec<Position> = (0..TARGET_MAX_TABLE).collect();
            open.shuffle(&mut rand::rng());
            for (seat_index, player) in players[cursor..cursor + size].iter_mut().enumerate() {
                let member = self.db.find(player.user()).await?.ok_or(TournamentError::NotFound)?;
                room.seat(open[seat_index], player.user(), member.username().to_string(), t.starting_chips())
                    .await
                    .map_err(|_| TournamentError::InvalidState("failed to seat a registrant at a freshly created table"))?;
                player.seat_at(room.id());
                self.db.save_player(player).await?;
            }
            cursor += size;
        }

        t.start();
        self.db.save_tournament(&t).await?;
        Ok(())
    }

    /// Sends `msg` to every table currently live for `tournament`, derived
    /// on demand from `tournament_players.current_table` rather than kept
    /// as separate in-process state.
    async fn broadcast_to_tournament(&self, tournament: ID<Tournament>, msg: &ServerMessage) {
        let Ok(players) = self.db.tournament_players(tournament).await else {
            return;
        };
        let mut seen = HashSet::new();
        for player in players {
            let Some(table) = player.current_table() else {
                continue;
            };
            if !seen.insert(table) {
                continue;
            }
            if let Some(room) = self.casino.get(table).await {
                room.broadcast_message(msg).await;
            }
        }
    }

    // ----------------------------------------------------------------
    // Starter loop
    // ----------------------------------------------------------------

    /// Spawns the background task that auto-starts every `registering`
    /// tournament once its conditions are met (spec.md §4.4 "Starter
    /// loop").
    pub fn spawn_starter_loop(self: &Arc<Self>) -> StarterHandle
    where
        L: 'static,
    {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                this.tick_starter().await;
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        })
    }

    async fn tick_starter(&self) {
        let tournaments = match self.db.list_tournaments(Some(TournamentStatus::Registering.as_str())).await {
            Ok(tournaments) => tournaments,
            Err(err) => {
                log::error!("[tournament] failed to list registering tournaments: {err}");
                return;
            }
        };
        let now = SystemTime::now();
        for tournament in tournaments {
            if !tournament.ready_to_start(now) {
                continue;
            }
            if let Err(err) = self.start(tournament.id()).await {
                log::error!("[tournament {}] failed to start: {}", tournament.id(), err);
            }
        }
    }

    // ----------------------------------------------------------------
    // Blind progression loop
    // ----------------------------------------------------------------

    /// Spawns the background task that advances every `in_progress`
    /// tournament's blind level once its current level's duration elapses
    /// (spec.md §4.4 "Blind progression loop").
    pub fn spawn_blind_progression_loop(self: &Arc<Self>) -> BlindProgressionHandle
    where
        L: 'static,
    {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                this.tick_blinds().await;
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        })
    }

    async fn tick_blinds(&self) {
        let tournaments = match self.db.list_tournaments(Some(TournamentStatus::InProgress.as_str())).await {
            Ok(tournaments) => tournaments,
            Err(err) => {
                log::error!("[tournament] failed to list in-progress tournaments: {err}");
                return;
            }
        };
        let now = SystemTime::now();
        for tournament in tournaments {
            let Some(started) = tournament.level_started_at() else {
                continue;
            };
            let Some(level) = tournament.level() else {
                continue;
            };
            if now.duration_since(started).unwrap_or_default() >= level.duration {
                if let Err(err) = self.advance_level(tournament.id()).await {
                    log::error!("[tournament {}] failed to advance blind level: {}", tournament.id(), err);
                }
            }
        }
    }

    async fn advance_level(&self, tournament: ID<Tournament>) -> Result<(), TournamentError> {
        let key = Self::key(tournament);
        if !self.locks.acquire(&key, LOCK_TTL, LOCK_WAIT).await {
            return Err(TournamentError::LockTimeout);
        }
        let result = self.advance_level_locked(tournament).await;
        self.locks.release(&key).await;
        let Some(level) = result? else {
            return Ok(());
        };

        let mut seen = HashSet::new();
        let players = self.db.tournament_players(tournament).await?;
        for player in players {
            let Some(table) = player.current_table() else {
                continue;
            };
            if !seen.insert(table) {
                continue;
            }
            if let Some(room) = self.casino.get(table).await {
                room.set_blinds(level.small_blind, level.big_blind, level.ante).await;
            }
        }
        self.broadcast_to_tournament(
            tournament,
            &ServerMessage::BlindLevelIncreased {
                tournament_id: tournament.inner(),
                level: level.index,
                small_blind: level.small_blind,
                big_blind: level.big_blind,
                ante: level.ante,
                timestamp: ServerMessage::now(),
            },
        )
        .await;
        Ok(())
    }

    async fn advance_level_locked(&self, tournament: ID<Tournament>) -> Result<Option<IndexedLevel>, TournamentError> {
        let mut t = self.db.find_tournament(tournament).await?.ok_or(TournamentError::NotFound)?;
        if t.status() != TournamentStatus::InProgress {
            return Ok(None);
        }
        let level_index = t.advance_level();
        self.db.save_tournament(&t).await?;
        Ok(t.level().map(|level| IndexedLevel {
            index: level_index,
            small_blind: level.small_blind,
            big_blind: level.big_blind,
            ante: level.ante,
        }))
    }

    // ----------------------------------------------------------------
    // Pause / resume
    // ----------------------------------------------------------------

    pub async fn pause(&self, tournament: ID<Tournament>, requester: ID<Member>) -> Result<(), TournamentError> {
        let key = Self::key(tournament);
        if !self.locks.acquire(&key, LOCK_TTL, LOCK_WAIT).await {
            return Err(TournamentError::LockTimeout);
        }
        let result = self.pause_locked(tournament, requester).await;
        self.locks.release(&key).await;
        result?;
        self.broadcast_to_tournament(
            tournament,
            &ServerMessage::TournamentPaused { tournament_id: tournament.inner(), timestamp: ServerMessage::now() },
        )
        .await;
        Ok(())
    }

    async fn pause_locked(&self, tournament: ID<Tournament>, requester: ID<Member>) -> Result<(), TournamentError> {
        let mut t = self.db.find_tournament(tournament).await?.ok_or(TournamentError::NotFound)?;
        if t.creator() != requester {
            return Err(TournamentError::Forbidden);
        }
        if t.status() != TournamentStatus::InProgress {
            return Err(TournamentError::InvalidState("only an in-progress tournament can be paused"));
        }
        t.pause();
        self.db.save_tournament(&t).await?;
        self.for_each_live_table(tournament, |room| async move { room.pause().await }).await?;
        Ok(())
    }

    pub async fn resume(&self, tournament: ID<Tournament>, requester: ID<Member>) -> Result<(), TournamentError> {
        let key = Self::key(tournament);
        if !self.locks.acquire(&key, LOCK_TTL, LOCK_WAIT).await {
            return Err(TournamentError::LockTimeout);
        }
        let result = self.resume_locked(tournament, requester).await;
        self.locks.release(&key).await;
        result?;
        self.broadcast_to_tournament(
            tournament,
            &ServerMessage::TournamentResumed { tournament_id: tournament.inner(), timestamp: ServerMessage::now() },
        )
        .await;
        Ok(())
    }

    async fn resume_locked(&self, tournament: ID<Tournament>, requester: ID<Member>) -> Result<(), TournamentError> {
        let mut t = self.db.find_tournament(tournament).await?.ok_or(TournamentError::NotFound)?;
        if t.creator() != requester {
            return Err(TournamentError::Forbidden);
        }
        if t.status() != TournamentStatus::Paused {
            return Err(TournamentError::InvalidState("tournament is not paused"));
        }
        let paused_for = t
            .level_started_at()
            .and_then(|started| SystemTime::now().duration_since(started).ok())
            .unwrap_or_default();
        t.resume_after_pause(paused_for);
        self.db.save_tournament(&t).await?;
        self.for_each_live_table(tournament, |room| async move { room.resume().await }).await?;
        Ok(())
    }

    async fn for_each_live_table<F, Fut>(&self, tournament: ID<Tournament>, f: F) -> Result<(), TournamentError>
    where
        F: Fn(Arc<Room>) -> Fut,
        Fut: std::future::Future<Output = ()>,
    {
        let players = self.db.tournament_players(tournament).await?;
        let mut seen = HashSet::new();
        for player in players {
            let Some(table) = player.current_table() else {
                continue;
            };
            if !seen.insert(table) {
                continue;
            }
            if let Some(room) = self.casino.get(table).await {
                f(room).await;
            }
        }
        Ok(())
    }

    // ----------------------------------------------------------------
    // Elimination handler (event-triggered, not polled)
    // ----------------------------------------------------------------

    /// Spawns the task that watches every table's engine events for
    /// `HandComplete` and drives elimination, consolidation, and (at the
    /// tournament's final hand) prize distribution (spec.md §4.4
    /// "Elimination handler").
    pub fn spawn_elimination_handler(self: &Arc<Self>) -> EliminationHandle
    where
        L: 'static,
    {
        let this = Arc::clone(self);
        let mut hooks = this.casino.subscribe();
        tokio::spawn(async move {
            loop {
                match hooks.recv().await {
                    Ok(event) => this.on_table_event(event).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        log::warn!("[tournament] elimination handler dropped {skipped} events under load");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    async fn on_table_event(&self, event: TableEvent) {
        let Event::HandComplete { busted, starting_stacks, .. } = &event.event else {
            return;
        };
        if busted.is_empty() {
            return;
        }
        let Some(room) = self.casino.get(event.table).await else {
            return;
        };
        let Some((tournament, _number)) = room.tournament().await else {
            return;
        };
        let tournament = ID::from(tournament);
        let dealer = room.dealer().await;
        if let Err(err) = self.eliminate(tournament, busted, starting_stacks, dealer).await {
            log::error!("[tournament {tournament}] elimination handling failed: {err}");
        }
    }

    /// Marks every seat that busted on one hand eliminated (in the spec's
    /// tie-break order), then checks whether the field just converged onto
    /// one table/one survivor (completion) or needs consolidating/balancing.
    async fn eliminate(
        &self,
        tournament: ID<Tournament>,
        busted: &[(Position, uuid::Uuid)],
        starting_stacks: &[(Position, Chips)],
        dealer: Position,
    ) -> Result<(), TournamentError> {
        let key = Self::key(tournament);
        if !self.locks.acquire(&key, LOCK_TTL, LOCK_WAIT).await {
            return Err(TournamentError::LockTimeout);
        }
        let result = self.eliminate_locked(tournament, busted, starting_stacks, dealer).await;
        self.locks.release(&key).await;
        let (eliminated, consolidations, completed) = result?;

        for (user, finish_position) in eliminated {
            self.broadcast_to_tournament(
                tournament,
                &ServerMessage::PlayerEliminated { tournament_id: tournament.inner(), user_id: user, finish_position, timestamp: ServerMessage::now() },
            )
            .await;
        }
        for (source, target) in consolidations {
            self.broadcast_to_tournament(
                tournament,
                &ServerMessage::TableConsolidation {
                    tournament_id: tournament.inner(),
                    source_table: source.inner(),
                    target_table: target.inner(),
                    timestamp: ServerMessage::now(),
                },
            )
            .await;
        }
        if completed {
            if let Err(err) = self.distribute_prizes(tournament).await {
                log::error!("[tournament {tournament}] prize distribution failed: {err}");
            }
        }
        Ok(())
    }

    #[allow(clippy::type_complexity)]
    async fn eliminate_locked(
        &self,
        tournament: ID<Tournament>,
        busted: &[(Position, uuid::Uuid)],
        starting_stacks: &[(Position, Chips)],
        dealer: Position,
    ) -> Result<(Vec<(uuid::Uuid, u32)>, Vec<(ID<LiveTable>, ID<LiveTable>)>, bool), TournamentError> {
        let mut players = self.db.tournament_players(tournament).await?;
        let active_before = players.iter().filter(|p| p.status() != PlayerStatus::Eliminated).count() as u32;

        let mut ordered = busted.to_vec();
        ordered.sort_by(|(a_pos, _), (b_pos, _)| {
            let a_stack = starting_stacks.iter().find(|(p, _)| p == a_pos).map(|(_, c)| *c).unwrap_or(0);
            let b_stack = starting_stacks.iter().find(|(p, _)| p == b_pos).map(|(_, c)| *c).unwrap_or(0);
            b_stack.cmp(&a_stack).then_with(|| clockwise_distance(*b_pos, dealer, TARGET_MAX_TABLE).cmp(&clockwise_distance(*a_pos, dealer, TARGET_MAX_TABLE)))
        });

        let batch = ordered.len() as u32;
        let mut eliminated = Vec::new();
        for (offset, (_, user)) in ordered.iter().enumerate() {
            let finish_position = active_before - batch + 1 + offset as u32;
            if let Some(player) = players.iter_mut().find(|p| p.user().inner() == *user) {
                player.eliminate(finish_position);
                self.db.save_player(player).await?;
                eliminated.push((*user, finish_position));
            }
        }

        let live: Vec<ID<LiveTable>> = players
            .iter()
            .filter_map(|p| p.current_table())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let mut occupancy = Vec::with_capacity(live.len());
        for table in &live {
            if let Some(room) = self.casino.get(*table).await {
                occupancy.push((*table, room.occupied_seats().await));
            }
        }

        let mut consolidations = Vec::new();
        let mut completed = false;
        if occupancy.len() <= 1 {
            if occupancy.first().is_none_or(|(_, n)| *n <= 1) {
                completed = true;
            }
        } else {
            consolidations = self.rebalance(&mut players, &mut occupancy).await?;
        }

        Ok((eliminated, consolidations, completed))
    }

    /// Merges undersized tables into others when the field no longer needs
    /// as many tables, then levels out any remaining one-table imbalance
    /// (spec.md §4.4 "Consolidation & balancing"). Runs only from inside
    /// `eliminate_locked`, i.e. only between hands, never mid-hand.
    async fn rebalance(
        &self,
        players: &mut [TournamentPlayer],
        occupancy: &mut Vec<(ID<LiveTable>, usize)>,
    ) -> Result<Vec<(ID<LiveTable>, ID<LiveTable>)>, TournamentError> {
        let mut moves = Vec::new();

        while occupancy.len() > 1 {
            let total: usize = occupancy.iter().map(|(_, n)| n).sum();
            if (occupancy.len() as u64) * (TARGET_MIN_TABLE as u64) <= total as u64 {
                break;
            }
            occupancy.sort_by_key(|(_, n)| *n);
            let (source, _) = occupancy.remove(0);
            occupancy.sort_by_key(|(_, n)| std::cmp::Reverse(*n));
            let Some(&(target, _)) = occupancy.first() else {
                break;
            };
            let (Some(source_room), Some(target_room)) = (self.casino.get(source).await, self.casino.get(target).await) else {
                continue;
            };
            self.move_all(&source_room, &target_room, players).await?;
            self.casino.close(source).await;
            self.db.complete_table(source).await?;
            if let Some(entry) = occupancy.iter_mut().find(|(t, _)| *t == target) {
                entry.1 = target_room.occupied_seats().await;
            }
            moves.push((source, target));
        }

        if occupancy.len() > 1 {
            occupancy.sort_by_key(|(_, n)| *n);
            let (smallest, smallest_n) = occupancy[0];
            let (largest, largest_n) = occupancy[occupancy.len() - 1];
            if largest_n > smallest_n + 1 {
                if let (Some(source_room), Some(target_room)) = (self.casino.get(largest).await, self.casino.get(smallest).await) {
                    self.move_one(&source_room, &target_room, players).await?;
                }
            }
        }

        Ok(moves)
    }

    /// Moves every occupant of `source` into randomized open seats at
    /// `target`, then closes `source` (spec.md §4.4 "move their players
    /// into others... seat assignment is randomized among open seats").
    async fn move_all(&self, source: &Arc<Room>, target: &Arc<Room>, players: &mut [TournamentPlayer]) -> Result<(), TournamentError> {
        use rand::seq::SliceRandom;
        let occupants = source.occupied().await;
        let mut open = target.open_seats().await;
        open.shuffle(&mut rand::rng());
        for (index, (position, user, name, stack)) in occupants.into_iter().enumerate() {
            source.vacate(position).await;
            let Some(&destination) = open.get(index) else {
                log::error!("[tournament] consolidation target table ran out of open seats for {user}");
                continue;
            };
            target
                .seat(destination, user, name, stack)
                .await
                .map_err(|_| TournamentError::InvalidState("failed to reseat a player during consolidation"))?;
            if let Some(player) = players.iter_mut().find(|p| p.user() == user) {
                player.move_to(target.id());
                self.db.save_player(player).await?;
            }
        }
        source.broadcast_state().await;
        Ok(())
    }

    /// Moves one randomly chosen occupant from `source` to `target`
    /// (spec.md §4.4 "if imbalance between any two tables exceeds 1 player,
    /// move one player from larger to smaller").
    async fn move_one(&self, source: &Arc<Room>, target: &Arc<Room>, players: &mut [TournamentPlayer]) -> Result<(), TournamentError> {
        use rand::seq::SliceRandom;
        let mut occupants = source.occupied().await;
        occupants.shuffle(&mut rand::rng());
        let Some((position, user, name, stack)) = occupants.into_iter().next() else {
            return Ok(());
        };
        let mut open = target.open_seats().await;
        open.shuffle(&mut rand::rng());
        let Some(&destination) = open.first() else {
            return Ok(());
        };
        source.vacate(position).await;
        source.broadcast_state().await;
        target
            .seat(destination, user, name, stack)
            .await
            .map_err(|_| TournamentError::InvalidState("failed to reseat a player during balancing"))?;
        if let Some(player) = players.iter_mut().find(|p| p.user() == user) {
            player.move_to(target.id());
            self.db.save_player(player).await?;
        }
        Ok(())
    }

    // ----------------------------------------------------------------
    // Prize distribution
    // ----------------------------------------------------------------

    /// `Prize distribution`: runs once, when the elimination handler sees
    /// the field converge to a single survivor (spec.md §4.4 "On
    /// status->completed").
    async fn distribute_prizes(&self, tournament: ID<Tournament>) -> Result<(), TournamentError> {
        let key = Self::key(tournament);
        if !self.locks.acquire(&key, LOCK_TTL, LOCK_WAIT).await {
            return Err(TournamentError::LockTimeout);
        }
        let result = self.distribute_prizes_locked(tournament).await;
        self.locks.release(&key).await;
        let Some((winner, standings, prizes)) = result? else {
            return Ok(());
        };

        for (user, amount, finish_position) in prizes {
            self.broadcast_to_tournament(
                tournament,
                &ServerMessage::PrizeAwarded { tournament_id: tournament.inner(), user_id: user, amount, finish_position, timestamp: ServerMessage::now() },
            )
            .await;
        }
        self.broadcast_to_tournament(
            tournament,
            &ServerMessage::TournamentComplete { tournament_id: tournament.inner(), winner, final_standings: standings, timestamp: ServerMessage::now() },
        )
        .await;
        Ok(())
    }

    #[allow(clippy::type_complexity)]
    async fn distribute_prizes_locked(
        &self,
        tournament: ID<Tournament>,
    ) -> Result<Option<(uuid::Uuid, Vec<(uuid::Uuid, u32)>, Vec<(uuid::Uuid, Chips, u32)>)>, TournamentError> {
        let mut t = self.db.find_tournament(tournament).await?.ok_or(TournamentError::NotFound)?;
        if t.prizes_distributed() {
            return Ok(None);
        }

        let mut players = self.db.tournament_players(tournament).await?;
        // the lone survivor, if the field hasn't already been fully
        // resolved by a prior call, is the champion -- finish position 1.
        // There is no distinct "won" status in this schema, so the winner
        // is recorded the same way every other finisher is: eliminated,
        // with finish_position 1 (see DESIGN.md).
        if let Some(champion) = players.iter_mut().find(|p| p.status() != PlayerStatus::Eliminated) {
            champion.eliminate(1);
            self.db.save_player(champion).await?;
        }
        let mut players = self.db.tournament_players(tournament).await?;

        let paid: Chips = t
            .prize_structure()
            .iter()
            .filter(|(position, _)| *position != 1)
            .filter_map(|(position, share)| {
                players
                    .iter()
                    .any(|p| p.finish_position() == Some(*position))
                    .then(|| (t.prize_pool() as f64 * share).floor() as Chips)
            })
            .sum();

        let mut prizes = Vec::new();
        for &(position, share) in t.prize_structure() {
            let Some(player) = players.iter_mut().find(|p| p.finish_position() == Some(position)) else {
                continue;
            };
            let mut amount = (t.prize_pool() as f64 * share).floor() as Chips;
            if position == 1 {
                // any rounding remainder goes to the 1st-place finisher
                // (spec.md §4.4 "rule chosen to avoid ambiguity").
                amount += t.prize_pool() - paid - amount;
            }
            if amount > 0 {
                self.db.adjust_chips(player.user(), amount).await?;
            }
            player.award_prize(amount);
            self.db.save_player(player).await?;
            prizes.push((player.user().inner(), amount, position));
        }

        let mut standings: Vec<(uuid::Uuid, u32)> =
            players.iter().map(|p| (p.user().inner(), p.finish_position().unwrap_or(0))).collect();
        standings.sort_by_key(|(_, position)| *position);
        let winner = players
            .iter()
            .find(|p| p.finish_position() == Some(1))
            .map(|p| p.user().inner())
            .unwrap_or_default();

        t.complete();
        t.mark_prizes_distributed();
        self.db.save_tournament(&t).await?;

        Ok(Some((winner, standings, prizes)))
    }
}

struct IndexedLevel {
    index: u32,
    small_blind: Chips,
    big_blind: Chips,
    ante: Chips,
}

/// Distance, walking clockwise from `dealer`, to `position` (modulo a fixed
/// seat count). Used only to compare two busted seats against each other,
/// so the exact modulus just needs to be at least the table's seat count.
fn clockwise_distance(position: Position, dealer: Position, seats: usize) -> usize {
    (position + seats - dealer % seats) % seats
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distribute_keeps_a_small_field_on_one_table() {
        assert_eq!(Coordinator::<crate::lock::MutexMap>::distribute(6), vec![6]);
        assert_eq!(Coordinator::<crate::lock::MutexMap>::distribute(9), vec![9]);
    }

    #[test]
    fn distribute_splits_a_large_field_evenly() {
        assert_eq!(Coordinator::<crate::lock::MutexMap>::distribute(18), vec![9, 9]);
        assert_eq!(Coordinator::<crate::lock::MutexMap>::distribute(20), vec![7, 7, 6]);
    }

    #[test]
    fn clockwise_distance_wraps_around_the_table() {
        assert_eq!(clockwise_distance(0, 0, 9), 0);
        assert_eq!(clockwise_distance(1, 8, 9), 2);
        assert_eq!(clockwise_distance(8, 0, 9), 8);
    }
}
