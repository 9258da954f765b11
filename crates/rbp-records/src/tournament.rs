use super::*;
use rbp_auth::Member;
use rbp_core::Chips;
use rbp_core::ID;
use rbp_core::Unique;

/// A tournament's lifecycle status (spec.md §3 "Tournament.status").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TournamentStatus {
    Registering,
    Starting,
    InProgress,
    Paused,
    Completed,
    Cancelled,
}

impl TournamentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Registering => "registering",
            Self::Starting => "starting",
            Self::InProgress => "in_progress",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::str::FromStr for TournamentStatus {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, ()> {
        Ok(match s {
            "registering" => Self::Registering,
            "starting" => Self::Starting,
            "in_progress" => Self::InProgress,
            "paused" => Self::Paused,
            "completed" => Self::Completed,
            "cancelled" => Self::Cancelled,
            _ => return Err(()),
        })
    }
}

/// One level of a tournament's blind schedule (spec.md §3 "Blind level").
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlindLevel {
    pub small_blind: Chips,
    pub big_blind: Chips,
    pub ante: Chips,
    pub duration: std::time::Duration,
}

/// A tournament (spec.md §3 "Tournament").
#[derive(Debug, Clone)]
pub struct Tournament {
    id: ID<Self>,
    short_code: String,
    name: String,
    creator: ID<Member>,
    status: TournamentStatus,
    buy_in: Chips,
    starting_chips: Chips,
    min_players: u32,
    max_players: u32,
    current_players: u32,
    prize_pool: Chips,
    /// Finish position (1-indexed) -> share of `prize_pool`, ordered.
    prize_structure: Vec<(u32, f64)>,
    blind_schedule: Vec<BlindLevel>,
    current_level: u32,
    level_started_at: Option<std::time::SystemTime>,
    auto_start_delay: std::time::Duration,
    registration_completed_at: Option<std::time::SystemTime>,
    prizes_distributed: bool,
}

impl Tournament {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: String,
        creator: ID<Member>,
        buy_in: Chips,
        starting_chips: Chips,
        min_players: u32,
        max_players: u32,
        auto_start_delay: std::time::Duration,
        blind_schedule: Vec<BlindLevel>,
        prize_structure: Vec<(u32, f64)>,
    ) -> Self {
        Self {
            id: ID::default(),
            short_code: Self::generate_short_code(),
            name,
            creator,
            status: TournamentStatus::Registering,
            buy_in,
            starting_chips,
            min_players,
            max_players,
            current_players: 0,
            prize_pool: 0,
            prize_structure,
            blind_schedule,
            current_level: 0,
            level_started_at: None,
            auto_start_delay,
            registration_completed_at: None,
            prizes_distributed: false,
        }
    }

    /// A 7-character, uppercase, URL-safe code (spec.md §3 "6-8 chars,
    /// unique, URL-safe"). Uniqueness is enforced at the storage layer
    /// (`UNIQUE` column), not here; a collision simply fails the insert and
    /// the caller retries with a freshly generated code.
    pub fn generate_short_code() -> String {
        use rand::Rng;
        const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
        let mut rng = rand::rng();
        (0..7).map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char).collect()
    }

    pub fn short_code(&self) -> &str {
        &self.short_code
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn creator(&self) -> ID<Member> {
        self.creator
    }
    pub fn status(&self) -> TournamentStatus {
        self.status
    }
    pub fn buy_in(&self) -> Chips {
        self.buy_in
    }
    pub fn starting_chips(&self) -> Chips {
        self.starting_chips
    }
    pub fn min_players(&self) -> u32 {
        self.min_players
    }
    pub fn max_players(&self) -> u32 {
        self.max_players
    }
    pub fn current_players(&self) -> u32 {
        self.current_players
    }
    pub fn prize_pool(&self) -> Chips {
        self.prize_pool
    }
    pub fn prize_structure(&self) -> &[(u32, f64)] {
        &self.prize_structure
    }
    pub fn blind_schedule(&self) -> &[BlindLevel] {
        &self.blind_schedule
    }
    pub fn current_level(&self) -> u32 {
        self.current_level
    }
    pub fn level(&self) -> Option<&BlindLevel> {
        self.blind_schedule.get(self.current_level as usize)
    }
    pub fn level_started_at(&self) -> Option<std::time::SystemTime> {
        self.level_started_at
    }
    pub fn auto_start_delay(&self) -> std::time::Duration {
        self.auto_start_delay
    }
    pub fn registration_completed_at(&self) -> Option<std::time::SystemTime> {
        self.registration_completed_at
    }
    pub fn prizes_distributed(&self) -> bool {
        self.prizes_distributed
    }

    pub fn set_status(&mut self, status: TournamentStatus) {
        self.status = status;
    }
    /// Overwrites the persisted `level_started_at`. Used when hydrating a
    /// `Tournament` from a database row, where `advance_level()`'s own
    /// `SystemTime::now()` side effect would otherwise discard the real
    /// timestamp on every poll (spec.md §4.4 blind-progression timing).
    pub fn set_level_started_at(&mut self, at: Option<std::time::SystemTime>) {
        self.level_started_at = at;
    }
    /// Overwrites the persisted `registration_completed_at`, for the same
    /// from-row hydration reason as `set_level_started_at`.
    pub fn set_registration_completed_at(&mut self, at: Option<std::time::SystemTime>) {
        self.registration_completed_at = at;
    }
    /// Adds one registrant; returns the new count. Caller is responsible
    /// for the `current_players == max_players` rejection (spec.md §4.4
    /// step 2) happening before this is called, under the tournament's
    /// row/distributed lock.
    pub fn add_player(&mut self) -> u32 {
        self.current_players += 1;
        self.prize_pool += self.buy_in;
        if self.current_players == self.min_players && self.registration_completed_at.is_none() {
            self.registration_completed_at = Some(std::time::SystemTime::now());
        }
        self.current_players
    }
    pub fn remove_player(&mut self) -> u32 {
        self.current_players = self.current_players.saturating_sub(1);
        self.prize_pool -= self.buy_in;
        self.current_players
    }
    pub fn start(&mut self) {
        self.status = TournamentStatus::InProgress;
        self.level_started_at = Some(std::time::SystemTime::now());
    }
    /// Advances to the next blind level if one exists, returning the new
    /// level index. A tournament at its final level stays there --
    /// blinds/antes simply stop increasing.
    pub fn advance_level(&mut self) -> u32 {
        if (self.current_level as usize + 1) < self.blind_schedule.len() {
            self.current_level += 1;
        }
        self.level_started_at = Some(std::time::SystemTime::now());
        self.current_level
    }
    /// Shifts `level_started_at` forward by `paused_for` (spec.md §4.4
    /// "level_started_at is adjusted on resume by the paused duration").
    pub fn resume_after_pause(&mut self, paused_for: std::time::Duration) {
        if let Some(started) = self.level_started_at {
            self.level_started_at = Some(started + paused_for);
        }
        self.status = TournamentStatus::InProgress;
    }
    pub fn pause(&mut self) {
        self.status = TournamentStatus::Paused;
    }
    pub fn complete(&mut self) {
        self.status = TournamentStatus::Completed;
    }
    pub fn cancel(&mut self) {
        self.status = TournamentStatus::Cancelled;
    }
    pub fn mark_prizes_distributed(&mut self) {
        self.prizes_distributed = true;
    }

    /// Whether the starter loop should fire `Start` (spec.md §4.4
    /// "Starter loop").
    pub fn ready_to_start(&self, now: std::time::SystemTime) -> bool {
        if self.status != TournamentStatus::Registering {
            return false;
        }
        if self.current_players == self.max_players {
            return true;
        }
        if self.current_players >= self.min_players {
            if let Some(completed) = self.registration_completed_at {
                return now >= completed + self.auto_start_delay;
            }
        }
        false
    }
}

impl Unique for Tournament {
    fn id(&self) -> ID<Self> {
        self.id
    }
}

#[cfg(feature = "database")]
mod schema {
    use super::*;
    use rbp_pg::*;

    impl Schema for Tournament {
        fn name() -> &'static str {
            TOURNAMENTS
        }
        fn columns() -> &'static [tokio_postgres::types::Type] {
            &[
                tokio_postgres::types::Type::UUID,
                tokio_postgres::types::Type::VARCHAR,
                tokio_postgres::types::Type::VARCHAR,
                tokio_postgres::types::Type::UUID,
                tokio_postgres::types::Type::VARCHAR,
                tokio_postgres::types::Type::INT8,
                tokio_postgres::types::Type::INT8,
                tokio_postgres::types::Type::INT4,
                tokio_postgres::types::Type::INT4,
                tokio_postgres::types::Type::INT4,
                tokio_postgres::types::Type::INT8,
                tokio_postgres::types::Type::JSONB,
                tokio_postgres::types::Type::JSONB,
                tokio_postgres::types::Type::INT4,
                tokio_postgres::types::Type::TIMESTAMPTZ,
                tokio_postgres::types::Type::INT8,
                tokio_postgres::types::Type::TIMESTAMPTZ,
                tokio_postgres::types::Type::BOOL,
            ]
        }
        fn creates() -> &'static str {
            const_format::concatcp!(
                "CREATE TABLE IF NOT EXISTS ",
                TOURNAMENTS,
                " (
                    id                         UUID PRIMARY KEY,
                    short_code                 VARCHAR(8) UNIQUE NOT NULL,
                    name                       VARCHAR(64) NOT NULL,
                    creator                    UUID NOT NULL REFERENCES ",
                USERS,
                "(id),
                    status                     VARCHAR(16) NOT NULL DEFAULT 'registering',
                    buy_in                     BIGINT NOT NULL,
                    starting_chips             BIGINT NOT NULL,
                    min_players                INT NOT NULL,
                    max_players                INT NOT NULL,
                    current_players            INT NOT NULL DEFAULT 0,
                    prize_pool                 BIGINT NOT NULL DEFAULT 0,
                    prize_structure            JSONB NOT NULL,
                    blind_schedule             JSONB NOT NULL,
                    current_level              INT NOT NULL DEFAULT 0,
                    level_started_at           TIMESTAMPTZ,
                    auto_start_delay_secs      BIGINT NOT NULL,
                    registration_completed_at  TIMESTAMPTZ,
                    prizes_distributed         BOOLEAN NOT NULL DEFAULT FALSE
                );"
            )
        }
        fn indices() -> &'static str {
            const_format::concatcp!(
                "CREATE INDEX IF NOT EXISTS idx_tournaments_status ON ",
                TOURNAMENTS,
                " (status);
                 CREATE UNIQUE INDEX IF NOT EXISTS idx_tournaments_short_code ON ",
                TOURNAMENTS,
                " (short_code);"
            )
        }
        fn copy() -> &'static str {
            unimplemented!()
        }
        fn truncates() -> &'static str {
            unimplemented!()
        }
        fn freeze() -> &'static str {
            unimplemented!()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tournament() -> Tournament {
        Tournament::new(
            "Sunday Million".to_string(),
            ID::default(),
            100,
            1000,
            4,
            6,
            std::time::Duration::from_secs(60),
            vec![BlindLevel { small_blind: 10, big_blind: 20, ante: 0, duration: std::time::Duration::from_secs(300) }],
            vec![(1, 1.0)],
        )
    }

    #[test]
    fn registration_completed_at_set_on_reaching_min() {
        let mut t = tournament();
        assert!(t.registration_completed_at().is_none());
        for _ in 0..4 {
            t.add_player();
        }
        assert!(t.registration_completed_at().is_some());
        assert_eq!(t.prize_pool(), 400);
    }

    #[test]
    fn ready_to_start_at_max_players_ignores_delay() {
        let mut t = tournament();
        for _ in 0..6 {
            t.add_player();
        }
        assert!(t.ready_to_start(std::time::SystemTime::now()));
    }

    #[test]
    fn ready_to_start_waits_out_auto_start_delay() {
        let mut t = tournament();
        for _ in 0..4 {
            t.add_player();
        }
        assert!(!t.ready_to_start(std::time::SystemTime::now()));
        let later = t.registration_completed_at().unwrap() + std::time::Duration::from_secs(61);
        assert!(t.ready_to_start(later));
    }

    #[test]
    fn short_code_is_seven_url_safe_chars() {
        let code = Tournament::generate_short_code();
        assert_eq!(code.len(), 7);
        assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
