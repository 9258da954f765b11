use crate::hooks::TableEvent;
use crate::idempotency::RequestCache;
use crate::limiter::TokenBucket;
use crate::message::SeatView;
use crate::message::ServerMessage;
use crate::message::TableSnapshot;
use rbp_auth::Member;
use rbp_core::Chips;
use rbp_core::Position;
use rbp_core::Unique;
use rbp_core::ID;
use rbp_gameplay::Action;
use rbp_gameplay::ActionError;
use rbp_gameplay::Event;
use rbp_gameplay::Outcome;
use rbp_gameplay::Table as LiveTable;
use rbp_records::record;
use rbp_records::Hand as HandRecord;
use rbp_records::HandAction;
use rbp_records::RecordRepository;
use rbp_records::Recorder;
use rbp_records::TableRecord;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use tokio::sync::broadcast;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::Mutex;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_postgres::Client;
use uuid::Uuid;

/// One subscriber's outbound channel, keyed by a per-connection id so a
/// user who opens two tabs gets two independent slots.
struct Subscriber {
    user: Option<ID<Member>>,
    tx: UnboundedSender<String>,
}

/// Session Bridge's live handle on one table: owns the authoritative
/// [`LiveTable`] behind a lock, fans its events out to every subscribed
/// connection, and persists everything through the History Recorder.
///
/// Mutation follows spec.md §4.1/§5/§9 throughout: the table lock is held
/// only long enough to produce an [`Outcome`], and every broadcast or
/// database write happens after the guard is dropped.
pub struct Room {
    id: ID<LiveTable>,
    table: Mutex<LiveTable>,
    current_hand: Mutex<Option<ID<HandRecord>>>,
    subscribers: RwLock<HashMap<Uuid, Subscriber>>,
    limiters: StdMutex<HashMap<ID<Member>, TokenBucket>>,
    requests: StdMutex<HashMap<ID<Member>, RequestCache<Outcome>>>,
    recorder: Recorder,
    db: Arc<Client>,
    deadline: Mutex<Option<JoinHandle<()>>>,
    hooks: broadcast::Sender<TableEvent>,
}

impl Room {
    /// Creates a new table, writes its `tables` row, and returns it ready
    /// to accept seats. `tournament` is `Some` when the Tournament
    /// Coordinator is spinning this table up as part of a bracket. `hooks`
    /// is the process-wide event channel (see [`crate::TableEvent`]) that
    /// every engine event gets republished on, after persistence and
    /// client fan-out, for components outside the Session Bridge to watch.
    pub async fn create(
        config: rbp_gameplay::Config,
        tournament: Option<(Uuid, u32)>,
        db: Arc<Client>,
        hooks: broadcast::Sender<TableEvent>,
    ) -> Result<Arc<Self>, tokio_postgres::Error> {
        let mut table = LiveTable::new(config.clone());
        if let Some((tournament, number)) = tournament {
            table.assign_tournament(tournament, number);
        }
        let id = table.id();
        let record = TableRecord::new(
            id,
            tournament.map(|(t, _)| ID::from(t)),
            serde_json::to_value(&config).unwrap_or_default(),
        );
        db.create_table(&record).await?;
        Ok(Arc::new(Self {
            id,
            table: Mutex::new(table),
            current_hand: Mutex::new(None),
            subscribers: RwLock::new(HashMap::new()),
            limiters: StdMutex::new(HashMap::new()),
            requests: StdMutex::new(HashMap::new()),
            recorder: Recorder::new(),
            db,
            deadline: Mutex::new(None),
            hooks,
        }))
    }

    pub fn id(&self) -> ID<LiveTable> {
        self.id
    }

    pub async fn status(&self) -> rbp_gameplay::Status {
        self.table.lock().await.status()
    }

    pub async fn open_seats(&self) -> Vec<Position> {
        self.table.lock().await.open_seats()
    }

    pub async fn occupied_seats(&self) -> usize {
        self.table.lock().await.occupied_seats()
    }

    /// Every occupied seat's (position, user, display name, stack) -- used
    /// by the Tournament Coordinator to move players between tables during
    /// consolidation (spec.md §4.4 "move their players into others").
    pub async fn occupied(&self) -> Vec<(Position, ID<Member>, String, Chips)> {
        let table = self.table.lock().await;
        (0..table.config().seats())
            .filter_map(|position| {
                let seat = table.seat_at(position)?;
                Some((position, seat.user().cast(), seat.name().to_string(), seat.stack()))
            })
            .collect()
    }

    pub async fn mode(&self) -> rbp_gameplay::Mode {
        self.table.lock().await.config().mode()
    }

    /// The tournament and table-number this table was created under, if
    /// any (spec.md §4.4 "store tournament_id and table_number on each
    /// table"). `None` for a standalone cash table.
    pub async fn tournament(&self) -> Option<(Uuid, u32)> {
        self.table.lock().await.tournament()
    }

    /// The seat that dealt the most recently completed (or current) hand --
    /// used by the Tournament Coordinator's same-hand bust tie-break
    /// (spec.md §4.4 "clockwise from dealer finishes higher").
    pub async fn dealer(&self) -> Position {
        self.table.lock().await.dealer()
    }

    /// Removes a seat without a broadcast of its own -- callers that need
    /// one (e.g. direct "leave table") should follow with
    /// [`Room::broadcast_state`]; the Tournament Coordinator's elimination
    /// and consolidation handlers batch several seat changes and broadcast
    /// once at the end (spec.md §4.4).
    pub async fn vacate(&self, position: Position) -> Option<rbp_gameplay::Seat> {
        self.table.lock().await.vacate(position)
    }

    /// Re-applies the current blind/ante level to hands dealt from now on
    /// (spec.md §4.4 "patch each live table's GE config"). Takes effect at
    /// the next `StartNewHand`; an in-flight hand is untouched.
    pub async fn set_blinds(&self, small_blind: Chips, big_blind: Chips, ante: Chips) {
        self.table.lock().await.set_blinds(small_blind, big_blind, ante);
    }

    /// Freezes the table for client display and blind progression (spec.md
    /// §4.4 "every table's status is set to paused").
    pub async fn pause(&self) {
        self.table.lock().await.pause();
        self.broadcast_state().await;
    }
    pub async fn resume(&self) {
        self.table.lock().await.resume();
        self.broadcast_state().await;
    }

    /// Sends an arbitrary message to every subscriber of this table.
    /// Exposed for the Tournament Coordinator and Matchmaking Queue, whose
    /// events (`tournament_started`, `match_found`, etc.) originate outside
    /// the engine but still need to reach this table's subscribers.
    pub async fn broadcast_message(&self, msg: &ServerMessage) {
        self.broadcast(msg).await;
    }

    /// Seats `user` and broadcasts a refreshed `table_state` so every
    /// subscriber's view reflects the new occupant.
    pub async fn seat(&self, position: Position, user: ID<Member>, name: String, stack: Chips) -> Result<(), ActionError> {
        {
            let mut table = self.table.lock().await;
            table.seat(position, user.cast(), name, stack)?;
        }
        self.broadcast_state().await;
        Ok(())
    }

    /// Snapshot-copies the subscriber list before iterating (spec.md §5
    /// "copy the list before iterating to avoid holding the lock across
    /// network writes") -- a slow or dead socket write can never stall a
    /// second subscriber's delivery, nor the `subscribers` lock itself.
    async fn fan_out(&self, msg: &ServerMessage, to: Option<ID<Member>>) {
        let json = msg.to_json();
        let recipients: Vec<UnboundedSender<String>> = {
            let subscribers = self.subscribers.read().await;
            subscribers
                .values()
                .filter(|s| to.is_none_or(|user| s.user == Some(user)))
                .map(|s| s.tx.clone())
                .collect()
        };
        for tx in recipients {
            let _ = tx.send(json.clone());
        }
    }

    async fn broadcast(&self, msg: &ServerMessage) {
        self.fan_out(msg, None).await;
    }

    async fn unicast(&self, user: ID<Member>, msg: &ServerMessage) {
        self.fan_out(msg, Some(user)).await;
    }

    /// Re-sends `table_state` to every subscriber. Public so batched
    /// mutations that don't go through [`Room::seat`] (the Tournament
    /// Coordinator's elimination and consolidation handlers, which call
    /// [`Room::vacate`] directly) can broadcast once after several seat
    /// changes rather than once per seat.
    pub async fn broadcast_state(&self) {
        let snapshot = self.public_snapshot().await;
        self.broadcast(&ServerMessage::TableState { snapshot, timestamp: ServerMessage::now() }).await;
    }

    /// Builds the public view of the table: every seat's hole cards are
    /// hidden since no single subscriber is being addressed. Used on
    /// `subscribe_table` before a viewer's identity is relevant to the
    /// snapshot shape, and whenever a table-wide resync broadcast fires.
    async fn public_snapshot(&self) -> TableSnapshot {
        self.snapshot(None).await
    }

    fn seat_view(table: &LiveTable, position: Position) -> Option<SeatView> {
        table.seat_at(position).map(|seat| SeatView {
            position,
            user: seat.user().inner(),
            name: seat.name().to_string(),
            stack: seat.stack(),
            stake: seat.stake(),
            state: seat.state().into(),
            hole_cards: None,
        })
    }

    async fn snapshot(&self, viewer: Option<ID<Member>>) -> TableSnapshot {
        let table = self.table.lock().await;
        let seats = (0..table.config().seats())
            .filter_map(|position| {
                let seat = table.seat_at(position)?;
                let mut view = Self::seat_view(&table, position)?;
                if viewer.is_some_and(|v| v.cast() == seat.user()) {
                    view.hole_cards = seat.cards().map(|h| h.to_string());
                }
                Some(view)
            })
            .collect();
        TableSnapshot {
            table_id: self.id.inner(),
            status: table.status(),
            seats,
            dealer: table.dealer(),
            hand_number: table.hand_number(),
            street: table.street().map(|s| s.to_string()),
            community: table.community().to_string(),
            pot: table.pot(),
            action_on: table.action_on(),
            action_sequence: table.action_sequence(),
        }
    }

    /// Registers a connection and immediately sends it a `table_state`
    /// snapshot, so a client never has to wait for the next game event to
    /// learn where things stand (spec.md §4.2 `subscribe_table`).
    pub async fn subscribe(self: &Arc<Self>, conn_id: Uuid, user: Option<ID<Member>>, tx: UnboundedSender<String>) {
        let snapshot = self.snapshot(user).await;
        let _ = tx.send(ServerMessage::TableState { snapshot, timestamp: ServerMessage::now() }.to_json());
        self.subscribers.write().await.insert(conn_id, Subscriber { user, tx });
    }

    pub async fn unsubscribe(&self, conn_id: Uuid) {
        self.subscribers.write().await.remove(&conn_id);
    }

    /// Re-sends a fresh `table_state` snapshot to one user, e.g. in answer
    /// to a repeated `subscribe_table` mid-connection (spec.md §5 "a gap
    /// triggers a state resync").
    pub async fn resync(&self, user: ID<Member>) {
        let snapshot = self.snapshot(Some(user)).await;
        self.unicast(user, &ServerMessage::TableState { snapshot, timestamp: ServerMessage::now() }).await;
    }

    /// Reports a validation failure to the offending client only (spec.md
    /// §4.2); table state is left unchanged.
    pub async fn reject(&self, user: ID<Member>, code: &str, message: &str, request_id: String) {
        self.unicast(user, &ServerMessage::error(code, message, Some(request_id))).await;
    }

    pub async fn relay_chat(&self, user: Option<ID<Member>>, text: String) {
        self.broadcast(&ServerMessage::ChatMessage {
            table_id: self.id.inner(),
            user: user.map(|u| u.inner()),
            text,
            timestamp: ServerMessage::now(),
        })
        .await;
    }

    /// Starts a new hand, persists the `hands` row, broadcasts the
    /// resulting events, and arms the action-deadline timer.
    pub async fn start_hand(self: &Arc<Self>) -> Result<(), ActionError> {
        let events = {
            let mut table = self.table.lock().await;
            table.start_new_hand()?
        };
        self.after_events(events).await;
        Ok(())
    }

    /// Applies one player action. Duplicate `request_id`s for the same
    /// user are answered from the bounded LRU without re-entering the
    /// table lock (spec.md §4.2); everything else follows the
    /// lock-then-release-then-dispatch discipline.
    pub async fn handle_action(self: &Arc<Self>, user: ID<Member>, action: Action, request_id: String) -> Result<(), ActionError> {
        if let Some(outcome) = self.cached_outcome(user, &request_id) {
            self.unicast(
                user,
                &ServerMessage::ActionConfirmed {
                    table_id: self.id.inner(),
                    request_id,
                    success: true,
                    action_sequence: outcome.sequence,
                    timestamp: ServerMessage::now(),
                },
            )
            .await;
            return Ok(());
        }
        if !self.allow(user) {
            self.unicast(user, &ServerMessage::error("rate_limited", "too many actions, slow down", Some(request_id))).await;
            return Ok(());
        }

        let outcome = {
            let mut table = self.table.lock().await;
            table.process_action(user.cast(), action, &request_id)?
        };
        self.cache_outcome(user, request_id.clone(), outcome.clone());
        self.unicast(
            user,
            &ServerMessage::ActionConfirmed {
                table_id: self.id.inner(),
                request_id,
                success: true,
                action_sequence: outcome.sequence,
                timestamp: ServerMessage::now(),
            },
        )
        .await;
        self.after_events(outcome.events).await;
        Ok(())
    }

    /// Fires when a player's decision deadline expires without an action
    /// arriving; forces a check-or-fold on their behalf.
    async fn fire_timeout(self: &Arc<Self>) {
        let user = {
            let table = self.table.lock().await;
            match table.action_on().and_then(|p| table.seat_at(p)).map(|s| s.user()) {
                Some(user) => user,
                None => return,
            }
        };
        let outcome = {
            let mut table = self.table.lock().await;
            table.timeout(user)
        };
        match outcome {
            Ok(outcome) => self.after_events(outcome.events).await,
            Err(_) => {}
        }
    }

    /// Shared tail of `start_hand`/`handle_action`/timeout firing:
    /// persists, broadcasts, and re-arms the deadline for whatever
    /// [`Event`]s the engine just produced. Always runs after the table
    /// lock has been released.
    async fn after_events(self: &Arc<Self>, events: Vec<Event>) {
        for event in &events {
            self.persist(event).await;
            self.announce(event).await;
            // No receivers is the common case outside a tournament; a send
            // error here just means nobody's listening right now.
            let _ = self.hooks.send(TableEvent { table: self.id, event: event.clone() });
        }
        self.rearm_deadline().await;
    }

    async fn persist(&self, event: &Event) {
        if let Event::HandStarted { hand_number, dealer, .. } = event {
            let hand = HandRecord::started(self.id, *hand_number, *dealer);
            let hand_id = hand.id();
            if let Err(err) = self.db.start_hand(&hand).await {
                log::error!("[room {}] failed to persist hand #{}: {}", self.id, hand_number, err);
            }
            *self.current_hand.lock().await = Some(hand_id);
        }

        let Some(hand_id) = *self.current_hand.lock().await else {
            log::error!("[room {}] event {} with no open hand to attribute it to", self.id, event.kind());
            return;
        };

        if let Event::PlayerAction { actor, action, .. } = event {
            let actor_and_street = {
                let table = self.table.lock().await;
                table.seat_at(*actor).map(|s| s.user()).map(|user| (user, table.street().unwrap_or(rbp_cards::Street::Pref)))
            };
            if let Some((user, street)) = actor_and_street {
                let row = HandAction::new(hand_id, user.cast(), action.kind(), action.amount(), street);
                if let Err(err) = self.db.record_action(&row).await {
                    log::error!("[room {}] failed to record action: {}", self.id, err);
                }
            }
        }

        if let Err(err) = record(&self.db, &self.recorder, hand_id, self.id, event).await {
            log::error!("[room {}] failed to record event {}: {}", self.id, event.kind(), err);
        }

        if let Event::HandComplete { winners, final_pot, community, .. } = event {
            if let Err(err) = self.db.complete_hand(hand_id, *community, *final_pot, winners).await {
                log::error!("[room {}] failed to complete hand row: {}", self.id, err);
            }
            self.recorder.release(hand_id);
            *self.current_hand.lock().await = None;
        }

        if let Event::GameComplete { .. } = event {
            if let Err(err) = self.db.complete_table(self.id).await {
                log::error!("[room {}] failed to complete table row: {}", self.id, err);
            }
        }
    }

    async fn announce(&self, event: &Event) {
        let action_sequence = self.table.lock().await.action_sequence();
        match event {
            Event::PlayerAction { actor, action, timeout } => {
                self.broadcast(&ServerMessage::PlayerActionBroadcast {
                    table_id: self.id.inner(),
                    actor: *actor,
                    action: action.clone(),
                    timeout: *timeout,
                    action_sequence,
                    timestamp: ServerMessage::now(),
                })
                .await;
            }
            Event::GameComplete { winner } => {
                self.broadcast(&ServerMessage::GameComplete { table_id: self.id.inner(), winner: *winner, timestamp: ServerMessage::now() }).await;
            }
            other => {
                self.broadcast(&ServerMessage::GameUpdate {
                    table_id: self.id.inner(),
                    event: other.clone(),
                    action_sequence,
                    timestamp: ServerMessage::now(),
                })
                .await;
            }
        }
        self.broadcast_state().await;
    }

    /// Cancels any pending deadline and, if a hand is still in progress,
    /// arms a new one for whoever is on the action now.
    async fn rearm_deadline(self: &Arc<Self>) {
        if let Some(handle) = self.deadline.lock().await.take() {
            handle.abort();
        }
        let timeout = {
            let table = self.table.lock().await;
            if table.action_on().is_none() {
                return;
            }
            table.config().action_timeout()
        };
        let room = Arc::clone(self);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_secs(timeout)).await;
            room.fire_timeout().await;
        });
        *self.deadline.lock().await = Some(handle);
    }

    fn allow(&self, user: ID<Member>) -> bool {
        self.limiters.lock().expect("limiter mutex poisoned").entry(user).or_default().try_acquire()
    }

    fn cached_outcome(&self, user: ID<Member>, request_id: &str) -> Option<Outcome> {
        self.requests.lock().expect("request cache mutex poisoned").get(&user).and_then(|cache| cache.get(request_id))
    }

    fn cache_outcome(&self, user: ID<Member>, request_id: String, outcome: Outcome) {
        self.requests
            .lock()
            .expect("request cache mutex poisoned")
            .entry(user)
            .or_insert_with(|| RequestCache::new(64))
            .insert(request_id, outcome);
    }
}

impl Drop for Room {
    fn drop(&mut self) {
        if let Ok(mut deadline) = self.deadline.try_lock() {
            if let Some(handle) = deadline.take() {
                handle.abort();
            }
        }
    }
}

impl From<rbp_gameplay::State> for &'static str {
    fn from(state: rbp_gameplay::State) -> Self {
        match state {
            rbp_gameplay::State::Betting => "betting",
            rbp_gameplay::State::Shoving => "shoving",
            rbp_gameplay::State::Folding => "folding",
            rbp_gameplay::State::Waiting => "waiting",
        }
    }
}
