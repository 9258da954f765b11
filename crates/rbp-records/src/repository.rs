use super::*;
use rbp_auth::Member;
use rbp_core::Chips;
use rbp_core::ID;
use rbp_core::Position;
use rbp_core::Unique;
use rbp_gameplay::Table as LiveTable;
use rbp_pg::*;
use std::sync::Arc;
use tokio_postgres::Client;

/// Persistence for tables, hands, and their legacy action rows (spec.md
/// §4.2 "Session Bridge" and §4.3 "History Recorder"). Abstracts SQL from
/// `rbp-gameroom` and `rbp-hosting`.
#[allow(async_fn_in_trait)]
pub trait RecordRepository {
    async fn create_table(&self, table: &TableRecord) -> Result<(), PgErr>;
    async fn set_table_status(&self, table: ID<LiveTable>, status: &str) -> Result<(), PgErr>;
    async fn complete_table(&self, table: ID<LiveTable>) -> Result<(), PgErr>;
    async fn start_hand(&self, hand: &Hand) -> Result<(), PgErr>;
    async fn complete_hand(&self, hand: ID<Hand>, community: rbp_cards::Board, pot: Chips, winners: &[(Position, Chips)]) -> Result<(), PgErr>;
    async fn record_action(&self, action: &HandAction) -> Result<(), PgErr>;
    async fn table_hands(&self, table: ID<LiveTable>, limit: i64) -> Result<Vec<Hand>, PgErr>;
    async fn hand_actions(&self, hand: ID<Hand>) -> Result<Vec<HandAction>, PgErr>;
}

impl RecordRepository for Arc<Client> {
    async fn create_table(&self, table: &TableRecord) -> Result<(), PgErr> {
        self.execute(
            const_format::concatcp!(
                "INSERT INTO ",
                TABLES,
                " (id, tournament_id, status, config, created_at, completed_at) VALUES ($1, $2, $3, $4, $5, $6)"
            ),
            &[
                &table.id().inner(),
                &table.tournament().map(|t| t.inner()),
                &table.status(),
                &table.config(),
                &table.created_at(),
                &table.completed_at(),
            ],
        )
        .await
        .map(|_| ())
    }

    async fn set_table_status(&self, table: ID<LiveTable>, status: &str) -> Result<(), PgErr> {
        self.execute(
            const_format::concatcp!("UPDATE ", TABLES, " SET status = $2 WHERE id = $1"),
            &[&table.inner(), &status],
        )
        .await
        .map(|_| ())
    }

    async fn complete_table(&self, table: ID<LiveTable>) -> Result<(), PgErr> {
        self.execute(
            const_format::concatcp!(
                "UPDATE ",
                TABLES,
                " SET status = 'completed', completed_at = now() WHERE id = $1"
            ),
            &[&table.inner()],
        )
        .await
        .map(|_| ())
    }

    async fn start_hand(&self, hand: &Hand) -> Result<(), PgErr> {
        self.execute(
            const_format::concatcp!(
                "INSERT INTO ",
                HANDS,
                " (id, table_id, number, dealer, community, pot, winners, started_at, completed_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
            ),
            &[
                &hand.id().inner(),
                &hand.table().inner(),
                &(hand.number() as i64),
                &(hand.dealer() as i16),
                &(u64::from(hand.community().cards()) as i64),
                &hand.pot(),
                &serde_json::to_value(hand.winners()).unwrap_or_default(),
                &hand.started_at(),
                &hand.completed_at(),
            ],
        )
        .await
        .map(|_| ())
    }

    async fn complete_hand(&self, hand: ID<Hand>, community: rbp_cards::Board, pot: Chips, winners: &[(Position, Chips)]) -> Result<(), PgErr> {
        self.execute(
            const_format::concatcp!(
                "UPDATE ",
                HANDS,
                " SET community = $2, pot = $3, winners = $4, completed_at = now() WHERE id = $1"
            ),
            &[
                &hand.inner(),
                &(u64::from(community.cards()) as i64),
                &pot,
                &serde_json::to_value(winners).unwrap_or_default(),
            ],
        )
        .await
        .map(|_| ())
    }

    async fn record_action(&self, action: &HandAction) -> Result<(), PgErr> {
        self.execute(
            const_format::concatcp!(
                "INSERT INTO ",
                HAND_ACTIONS,
                " (id, hand_id, user_id, action, amount, round, recorded_at) VALUES ($1, $2, $3, $4, $5, $6, $7)"
            ),
            &[
                &action.id().inner(),
                &action.hand().inner(),
                &action.user().inner(),
                &action.action(),
                &action.amount(),
                &action.round().to_string(),
                &action.recorded_at(),
            ],
        )
        .await
        .map(|_| ())
    }

    async fn table_hands(&self, table: ID<LiveTable>, limit: i64) -> Result<Vec<Hand>, PgErr> {
        crate::recorder::get_table_hands(self, table, limit).await
    }

    async fn hand_actions(&self, hand: ID<Hand>) -> Result<Vec<HandAction>, PgErr> {
        let rows = self
            .query(
                const_format::concatcp!(
                    "SELECT id, hand_id, user_id, action, amount, round, recorded_at FROM ",
                    HAND_ACTIONS,
                    " WHERE hand_id = $1 ORDER BY recorded_at ASC"
                ),
                &[&hand.inner()],
            )
            .await?;
        Ok(rows
            .iter()
            .map(|row| {
                let round: String = row.get(5);
                HandAction::new(
                    ID::from(row.get::<_, uuid::Uuid>(1)),
                    ID::from(row.get::<_, uuid::Uuid>(2)),
                    row.get(3),
                    row.get(4),
                    street_from_str(&round),
                )
            })
            .collect())
    }
}

/// Persistence and registration operations for the Tournament Coordinator
/// (spec.md §4.4).
#[allow(async_fn_in_trait)]
pub trait TournamentRepository {
    async fn create_tournament(&self, tournament: &Tournament) -> Result<(), PgErr>;
    async fn find_tournament(&self, id: ID<Tournament>) -> Result<Option<Tournament>, PgErr>;
    async fn find_tournament_by_code(&self, short_code: &str) -> Result<Option<Tournament>, PgErr>;
    async fn list_tournaments(&self, status: Option<&str>) -> Result<Vec<Tournament>, PgErr>;
    async fn save_tournament(&self, tournament: &Tournament) -> Result<(), PgErr>;
    /// Registers `user` for `tournament`, rejecting if the field is already
    /// full (spec.md §4.4 "Register" edge case). The chip debit for the
    /// buy-in is the caller's responsibility via `AuthRepository::adjust_chips`
    /// inside the same transaction boundary as this insert.
    async fn register_player(&self, tournament: ID<Tournament>, user: ID<Member>) -> Result<(), RegistrationError>;
    async fn unregister_player(&self, tournament: ID<Tournament>, user: ID<Member>) -> Result<(), RegistrationError>;
    async fn tournament_players(&self, tournament: ID<Tournament>) -> Result<Vec<TournamentPlayer>, PgErr>;
    async fn save_player(&self, player: &TournamentPlayer) -> Result<(), PgErr>;
}

/// Failure mode of a tournament registration mutation.
#[derive(Debug)]
pub enum RegistrationError {
    TournamentNotFound,
    TournamentFull,
    NotRegistering,
    AlreadyRegistered,
    NotRegistered,
    Database(PgErr),
}

impl From<PgErr> for RegistrationError {
    fn from(err: PgErr) -> Self {
        Self::Database(err)
    }
}

impl std::fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::TournamentNotFound => write!(f, "tournament not found"),
            Self::TournamentFull => write!(f, "tournament has no open registration slots"),
            Self::NotRegistering => write!(f, "tournament is not accepting registrations"),
            Self::AlreadyRegistered => write!(f, "user is already registered for this tournament"),
            Self::NotRegistered => write!(f, "user is not registered for this tournament"),
            Self::Database(e) => write!(f, "database error: {e}"),
        }
    }
}
impl std::error::Error for RegistrationError {}

impl TournamentRepository for Arc<Client> {
    async fn create_tournament(&self, tournament: &Tournament) -> Result<(), PgErr> {
        self.execute(
            const_format::concatcp!(
                "INSERT INTO ",
                TOURNAMENTS,
                " (id, short_code, name, creator, status, buy_in, starting_chips, min_players, max_players,
                   current_players, prize_pool, prize_structure, blind_schedule, current_level,
                   level_started_at, auto_start_delay_secs, registration_completed_at, prizes_distributed)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)"
            ),
            &[
                &tournament.id().inner(),
                &tournament.short_code(),
                &tournament.name(),
                &tournament.creator().inner(),
                &tournament.status().as_str(),
                &tournament.buy_in(),
                &tournament.starting_chips(),
                &(tournament.min_players() as i32),
                &(tournament.max_players() as i32),
                &(tournament.current_players() as i32),
                &tournament.prize_pool(),
                &serde_json::to_value(tournament.prize_structure()).unwrap_or_default(),
                &serde_json::to_value(
                    tournament
                        .blind_schedule()
                        .iter()
                        .map(|l| serde_json::json!({
                            "small_blind": l.small_blind,
                            "big_blind": l.big_blind,
                            "ante": l.ante,
                            "duration_secs": l.duration.as_secs(),
                        }))
                        .collect::<Vec<_>>(),
                )
                .unwrap_or_default(),
                &(tournament.current_level() as i32),
                &tournament.level_started_at(),
                &(tournament.auto_start_delay().as_secs() as i64),
                &tournament.registration_completed_at(),
                &tournament.prizes_distributed(),
            ],
        )
        .await
        .map(|_| ())
    }

    async fn find_tournament(&self, id: ID<Tournament>) -> Result<Option<Tournament>, PgErr> {
        let row = self
            .query_opt(
                const_format::concatcp!(
                    "SELECT id, short_code, name, creator, status, buy_in, starting_chips, min_players, max_players,
                            current_players, prize_pool, prize_structure, blind_schedule, current_level,
                            level_started_at, auto_start_delay_secs, registration_completed_at, prizes_distributed FROM ",
                    TOURNAMENTS,
                    " WHERE id = $1"
                ),
                &[&id.inner()],
            )
            .await?;
        Ok(row.map(tournament_from_row))
    }

    async fn find_tournament_by_code(&self, short_code: &str) -> Result<Option<Tournament>, PgErr> {
        let row = self
            .query_opt(
                const_format::concatcp!(
                    "SELECT id, short_code, name, creator, status, buy_in, starting_chips, min_players, max_players,
                            current_players, prize_pool, prize_structure, blind_schedule, current_level,
                            level_started_at, auto_start_delay_secs, registration_completed_at, prizes_distributed FROM ",
                    TOURNAMENTS,
                    " WHERE short_code = $1"
                ),
                &[&short_code],
            )
            .await?;
        Ok(row.map(tournament_from_row))
    }

    async fn list_tournaments(&self, status: Option<&str>) -> Result<Vec<Tournament>, PgErr> {
        let rows = match status {
            Some(status) => {
                self.query(
                    const_format::concatcp!(
                        "SELECT id, short_code, name, creator, status, buy_in, starting_chips, min_players, max_players,
                                current_players, prize_pool, prize_structure, blind_schedule, current_level,
                                level_started_at, auto_start_delay_secs, registration_completed_at, prizes_distributed FROM ",
                        TOURNAMENTS,
                        " WHERE status = $1 ORDER BY level_started_at DESC NULLS FIRST"
                    ),
                    &[&status],
                )
                .await?
            }
            None => {
                self.query(
                    const_format::concatcp!(
                        "SELECT id, short_code, name, creator, status, buy_in, starting_chips, min_players, max_players,
                                current_players, prize_pool, prize_structure, blind_schedule, current_level,
                                level_started_at, auto_start_delay_secs, registration_completed_at, prizes_distributed FROM ",
                        TOURNAMENTS,
                        " ORDER BY level_started_at DESC NULLS FIRST"
                    ),
                    &[],
                )
                .await?
            }
        };
        Ok(rows.iter().map(tournament_from_row).collect())
    }

    async fn save_tournament(&self, tournament: &Tournament) -> Result<(), PgErr> {
        self.execute(
            const_format::concatcp!(
                "UPDATE ",
                TOURNAMENTS,
                " SET status = $2, current_players = $3, prize_pool = $4, current_level = $5,
                     level_started_at = $6, registration_completed_at = $7, prizes_distributed = $8
                 WHERE id = $1"
            ),
            &[
                &tournament.id().inner(),
                &tournament.status().as_str(),
                &(tournament.current_players() as i32),
                &tournament.prize_pool(),
                &(tournament.current_level() as i32),
                &tournament.level_started_at(),
                &tournament.registration_completed_at(),
                &tournament.prizes_distributed(),
            ],
        )
        .await
        .map(|_| ())
    }

    async fn register_player(&self, tournament: ID<Tournament>, user: ID<Member>) -> Result<(), RegistrationError> {
        // single CTE so the capacity check, the players-row insert, and the
        // prize-pool bump commit atomically without an explicit transaction
        // block over a connection shared by Arc (same discipline as
        // `AuthRepository::transfer_chips`) -- two concurrent registrants
        // can never both win the tournament's last seat (spec.md §4.4
        // "Register" edge case).
        let claimed = self
            .query_opt(
                const_format::concatcp!(
                    "WITH slot AS (",
                    "    UPDATE ", TOURNAMENTS, " SET current_players = current_players + 1,",
                    "        prize_pool = prize_pool + buy_in,",
                    "        registration_completed_at = CASE",
                    "            WHEN current_players + 1 >= min_players AND registration_completed_at IS NULL",
                    "            THEN now() ELSE registration_completed_at END",
                    "    WHERE id = $1 AND status = 'registering' AND current_players < max_players",
                    "        AND NOT EXISTS (",
                    "            SELECT 1 FROM ", TOURNAMENT_PLAYERS, " WHERE tournament_id = $1 AND user_id = $2",
                    "        )",
                    "    RETURNING id",
                    ") INSERT INTO ", TOURNAMENT_PLAYERS, " (tournament_id, user_id, registered_at, status)",
                    " SELECT $1, $2, now(), 'registered' FROM slot",
                    " ON CONFLICT (tournament_id, user_id) DO NOTHING",
                    " RETURNING tournament_id"
                ),
                &[&tournament.inner(), &user.inner()],
            )
            .await?;
        if claimed.is_some() {
            return Ok(());
        }
        // the atomic path didn't apply; look the tournament up read-only to
        // report the specific reason.
        match self.find_tournament(tournament).await? {
            None => Err(RegistrationError::TournamentNotFound),
            Some(t) if t.status() != TournamentStatus::Registering => Err(RegistrationError::NotRegistering),
            Some(t) if t.current_players() >= t.max_players() => Err(RegistrationError::TournamentFull),
            _ => Err(RegistrationError::AlreadyRegistered),
        }
    }

    async fn unregister_player(&self, tournament: ID<Tournament>, user: ID<Member>) -> Result<(), RegistrationError> {
        let removed = self
            .execute(
                const_format::concatcp!(
                    "DELETE FROM ",
                    TOURNAMENT_PLAYERS,
                    " WHERE tournament_id = $1 AND user_id = $2 AND status = 'registered'"
                ),
                &[&tournament.inner(), &user.inner()],
            )
            .await?;
        if removed == 0 {
            return Err(RegistrationError::NotRegistered);
        }
        self.execute(
            const_format::concatcp!(
                "UPDATE ",
                TOURNAMENTS,
                " SET current_players = current_players - 1, prize_pool = prize_pool - buy_in WHERE id = $1"
            ),
            &[&tournament.inner()],
        )
        .await?;
        Ok(())
    }

    async fn tournament_players(&self, tournament: ID<Tournament>) -> Result<Vec<TournamentPlayer>, PgErr> {
        let rows = self
            .query(
                const_format::concatcp!(
                    "SELECT tournament_id, user_id, registered_at, status, finish_position, prize_amount, current_table FROM ",
                    TOURNAMENT_PLAYERS,
                    " WHERE tournament_id = $1"
                ),
                &[&tournament.inner()],
            )
            .await?;
        Ok(rows.iter().map(player_from_row).collect())
    }

    async fn save_player(&self, player: &TournamentPlayer) -> Result<(), PgErr> {
        self.execute(
            const_format::concatcp!(
                "UPDATE ",
                TOURNAMENT_PLAYERS,
                " SET status = $3, finish_position = $4, prize_amount = $5, current_table = $6
                 WHERE tournament_id = $1 AND user_id = $2"
            ),
            &[
                &player.tournament().inner(),
                &player.user().inner(),
                &player.status().as_str(),
                &player.finish_position().map(|p| p as i32),
                &player.prize_amount(),
                &player.current_table().map(|t| t.inner()),
            ],
        )
        .await
        .map(|_| ())
    }
}

fn street_from_str(s: &str) -> rbp_cards::Street {
    match s {
        "flop" => rbp_cards::Street::Flop,
        "turn" => rbp_cards::Street::Turn,
        "river" => rbp_cards::Street::River,
        "showdown" => rbp_cards::Street::Showdown,
        _ => rbp_cards::Street::Pref,
    }
}

fn tournament_from_row(row: tokio_postgres::Row) -> Tournament {
    let prize_structure: serde_json::Value = row.get(11);
    let prize_structure: Vec<(u32, f64)> = serde_json::from_value(prize_structure).unwrap_or_default();
    let blind_schedule: serde_json::Value = row.get(12);
    let blind_schedule: Vec<BlindLevel> = blind_schedule
        .as_array()
        .map(|levels| {
            levels
                .iter()
                .map(|level| BlindLevel {
                    small_blind: level["small_blind"].as_i64().unwrap_or(0),
                    big_blind: level["big_blind"].as_i64().unwrap_or(0),
                    ante: level["ante"].as_i64().unwrap_or(0),
                    duration: std::time::Duration::from_secs(level["duration_secs"].as_u64().unwrap_or(0)),
                })
                .collect()
        })
        .unwrap_or_default();
    let auto_start_delay = std::time::Duration::from_secs(row.get::<_, i64>(15) as u64);
    let mut tournament = Tournament::new(
        row.get(2),
        ID::from(row.get::<_, uuid::Uuid>(3)),
        row.get(5),
        row.get(6),
        row.get::<_, i32>(7) as u32,
        row.get::<_, i32>(8) as u32,
        auto_start_delay,
        blind_schedule,
        prize_structure,
    );
    for _ in 0..row.get::<_, i32>(9) {
        tournament.add_player();
    }
    tournament.set_status(row.get::<_, String>(4).parse().unwrap_or(TournamentStatus::Registering));
    for _ in 0..row.get::<_, i32>(13) {
        tournament.advance_level();
    }
    // `add_player`/`advance_level` each stamp these with `SystemTime::now()`
    // as a live side effect; overwrite with the persisted values so a
    // re-hydration from the DB doesn't reset the blind/registration clocks
    // on every poll (spec.md §4.4 scenarios S4/S5).
    tournament.set_level_started_at(row.get::<_, Option<std::time::SystemTime>>(14));
    tournament.set_registration_completed_at(row.get::<_, Option<std::time::SystemTime>>(16));
    if row.get::<_, bool>(17) {
        tournament.mark_prizes_distributed();
    }
    tournament
}

fn player_from_row(row: &tokio_postgres::Row) -> TournamentPlayer {
    let mut player = TournamentPlayer::register(
        ID::from(row.get::<_, uuid::Uuid>(0)),
        ID::from(row.get::<_, uuid::Uuid>(1)),
    );
    let status: String = row.get(3);
    if let Ok(status) = status.parse() {
        match status {
            PlayerStatus::Eliminated => {
                if let Some(position) = row.get::<_, Option<i32>>(4) {
                    player.eliminate(position as u32);
                }
            }
            PlayerStatus::Playing => {
                if let Some(table) = row.get::<_, Option<uuid::Uuid>>(6) {
                    player.seat_at(ID::from(table));
                }
            }
            PlayerStatus::Registered => {}
        }
    }
    if let Some(amount) = row.get::<_, Option<Chips>>(5) {
        player.award_prize(amount);
    }
    player
}

/// Persistence for the matchmaking queue (spec.md §4.5).
#[allow(async_fn_in_trait)]
pub trait MatchmakingRepository {
    async fn enqueue(&self, entry: &MatchmakingEntry) -> Result<(), PgErr>;
    async fn dequeue(&self, user: ID<Member>, queue_type: &str) -> Result<(), PgErr>;
    async fn queue(&self, queue_type: &str) -> Result<Vec<MatchmakingEntry>, PgErr>;
}

impl MatchmakingRepository for Arc<Client> {
    async fn enqueue(&self, entry: &MatchmakingEntry) -> Result<(), PgErr> {
        self.execute(
            const_format::concatcp!(
                "INSERT INTO ",
                MATCHMAKING_QUEUE,
                " (user_id, queue_type, joined_at) VALUES ($1, $2, $3)
                 ON CONFLICT (user_id, queue_type) DO NOTHING"
            ),
            &[&entry.user().inner(), &entry.queue_type(), &entry.joined_at()],
        )
        .await
        .map(|_| ())
    }

    async fn dequeue(&self, user: ID<Member>, queue_type: &str) -> Result<(), PgErr> {
        self.execute(
            const_format::concatcp!(
                "DELETE FROM ",
                MATCHMAKING_QUEUE,
                " WHERE user_id = $1 AND queue_type = $2"
            ),
            &[&user.inner(), &queue_type],
        )
        .await
        .map(|_| ())
    }

    async fn queue(&self, queue_type: &str) -> Result<Vec<MatchmakingEntry>, PgErr> {
        let rows = self
            .query(
                const_format::concatcp!(
                    "SELECT user_id, queue_type, joined_at FROM ",
                    MATCHMAKING_QUEUE,
                    " WHERE queue_type = $1 ORDER BY joined_at ASC"
                ),
                &[&queue_type],
            )
            .await?;
        Ok(rows
            .iter()
            .map(|row| MatchmakingEntry::new(ID::from(row.get::<_, uuid::Uuid>(0)), row.get(1)))
            .collect())
    }
}
