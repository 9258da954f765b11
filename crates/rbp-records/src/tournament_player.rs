use super::*;
use rbp_auth::Member;
use rbp_core::Chips;
use rbp_core::ID;
use rbp_core::Unique;
use rbp_gameplay::Table;

/// A registrant's standing within one tournament (spec.md §3
/// "TournamentPlayer", §4.4 "Standings").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerStatus {
    Registered,
    Playing,
    Eliminated,
}

impl PlayerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Registered => "registered",
            Self::Playing => "playing",
            Self::Eliminated => "eliminated",
        }
    }
}

impl std::str::FromStr for PlayerStatus {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, ()> {
        Ok(match s {
            "registered" => Self::Registered,
            "playing" => Self::Playing,
            "eliminated" => Self::Eliminated,
            _ => return Err(()),
        })
    }
}

#[derive(Debug, Clone)]
pub struct TournamentPlayer {
    tournament: ID<Tournament>,
    user: ID<Member>,
    registered_at: std::time::SystemTime,
    status: PlayerStatus,
    finish_position: Option<u32>,
    prize_amount: Option<Chips>,
    current_table: Option<ID<Table>>,
}

impl TournamentPlayer {
    pub fn register(tournament: ID<Tournament>, user: ID<Member>) -> Self {
        Self {
            tournament,
            user,
            registered_at: std::time::SystemTime::now(),
            status: PlayerStatus::Registered,
            finish_position: None,
            prize_amount: None,
            current_table: None,
        }
    }
    pub fn tournament(&self) -> ID<Tournament> {
        self.tournament
    }
    pub fn user(&self) -> ID<Member> {
        self.user
    }
    pub fn registered_at(&self) -> std::time::SystemTime {
        self.registered_at
    }
    pub fn status(&self) -> PlayerStatus {
        self.status
    }
    pub fn finish_position(&self) -> Option<u32> {
        self.finish_position
    }
    pub fn prize_amount(&self) -> Option<Chips> {
        self.prize_amount
    }
    pub fn current_table(&self) -> Option<ID<Table>> {
        self.current_table
    }
    pub fn seat_at(&mut self, table: ID<Table>) {
        self.current_table = Some(table);
        self.status = PlayerStatus::Playing;
    }
    pub fn move_to(&mut self, table: ID<Table>) {
        self.current_table = Some(table);
    }
    /// Marks a bust-out (spec.md §4.4 "Elimination handler"). Finish
    /// position counts down from the field size as players go out, so the
    /// caller (not this type) knows the remaining count and assigns it.
    pub fn eliminate(&mut self, finish_position: u32) {
        self.status = PlayerStatus::Eliminated;
        self.finish_position = Some(finish_position);
        self.current_table = None;
    }
    pub fn award_prize(&mut self, amount: Chips) {
        self.prize_amount = Some(amount);
    }
}

#[cfg(feature = "database")]
mod schema {
    use super::*;
    use rbp_pg::*;

    impl Schema for TournamentPlayer {
        fn name() -> &'static str {
            TOURNAMENT_PLAYERS
        }
        fn columns() -> &'static [tokio_postgres::types::Type] {
            &[
                tokio_postgres::types::Type::UUID,
                tokio_postgres::types::Type::UUID,
                tokio_postgres::types::Type::TIMESTAMPTZ,
                tokio_postgres::types::Type::VARCHAR,
                tokio_postgres::types::Type::INT4,
                tokio_postgres::types::Type::INT8,
                tokio_postgres::types::Type::UUID,
            ]
        }
        fn creates() -> &'static str {
            const_format::concatcp!(
                "CREATE TABLE IF NOT EXISTS ",
                TOURNAMENT_PLAYERS,
                " (
                    tournament_id    UUID NOT NULL REFERENCES ",
                TOURNAMENTS,
                "(id) ON DELETE CASCADE,
                    user_id          UUID NOT NULL REFERENCES ",
                USERS,
                "(id),
                    registered_at    TIMESTAMPTZ NOT NULL,
                    status           VARCHAR(16) NOT NULL DEFAULT 'registered',
                    finish_position  INT,
                    prize_amount     BIGINT,
                    current_table    UUID,
                    PRIMARY KEY (tournament_id, user_id)
                );"
            )
        }
        fn indices() -> &'static str {
            const_format::concatcp!(
                "CREATE INDEX IF NOT EXISTS idx_tournament_players_table ON ",
                TOURNAMENT_PLAYERS,
                " (current_table);"
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

    #[test]
    fn eliminate_clears_table_and_sets_position() {
        let mut p = TournamentPlayer::register(ID::default(), ID::default());
        p.seat_at(ID::default());
        assert_eq!(p.status(), PlayerStatus::Playing);
        p.eliminate(5);
        assert_eq!(p.status(), PlayerStatus::Eliminated);
        assert_eq!(p.finish_position(), Some(5));
        assert!(p.current_table().is_none());
    }
}
