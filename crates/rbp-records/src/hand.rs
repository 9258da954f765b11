use super::*;
use rbp_cards::Board;
use rbp_core::Chips;
use rbp_core::ID;
use rbp_core::Position;
use rbp_core::Unique;
use rbp_gameplay::Table;

/// Persisted record of one hand (spec.md §3 "Hand", §6 `hands` table).
///
/// Written once at `handStart` (number/dealer known, community/pot/winners
/// empty) and updated once at `handComplete`.
#[derive(Debug, Clone)]
pub struct Hand {
    id: ID<Self>,
    table: ID<Table>,
    number: u64,
    dealer: Position,
    community: Board,
    pot: Chips,
    winners: Vec<(Position, Chips)>,
    started_at: std::time::SystemTime,
    completed_at: Option<std::time::SystemTime>,
}

impl Hand {
    pub fn started(table: ID<Table>, number: u64, dealer: Position) -> Self {
        Self {
            id: ID::default(),
            table,
            number,
            dealer,
            community: Board::empty(),
            pot: 0,
            winners: Vec::new(),
            started_at: std::time::SystemTime::now(),
            completed_at: None,
        }
    }
    pub fn table(&self) -> ID<Table> {
        self.table
    }
    pub fn number(&self) -> u64 {
        self.number
    }
    pub fn dealer(&self) -> Position {
        self.dealer
    }
    pub fn community(&self) -> Board {
        self.community
    }
    pub fn pot(&self) -> Chips {
        self.pot
    }
    pub fn winners(&self) -> &[(Position, Chips)] {
        &self.winners
    }
    pub fn started_at(&self) -> std::time::SystemTime {
        self.started_at
    }
    pub fn completed_at(&self) -> Option<std::time::SystemTime> {
        self.completed_at
    }
    /// Folds the `handComplete` event's payload into this row.
    pub fn complete(&mut self, community: Board, pot: Chips, winners: Vec<(Position, Chips)>) {
        self.community = community;
        self.pot = pot;
        self.winners = winners;
        self.completed_at = Some(std::time::SystemTime::now());
    }
}

impl Unique for Hand {
    fn id(&self) -> ID<Self> {
        self.id
    }
}

#[cfg(feature = "database")]
mod schema {
    use super::*;
    use rbp_pg::*;

    impl Schema for Hand {
        fn name() -> &'static str {
            HANDS
        }
        fn columns() -> &'static [tokio_postgres::types::Type] {
            &[
                tokio_postgres::types::Type::UUID,
                tokio_postgres::types::Type::UUID,
                tokio_postgres::types::Type::INT8,
                tokio_postgres::types::Type::INT2,
                tokio_postgres::types::Type::INT8,
                tokio_postgres::types::Type::INT8,
                tokio_postgres::types::Type::JSONB,
                tokio_postgres::types::Type::TIMESTAMPTZ,
                tokio_postgres::types::Type::TIMESTAMPTZ,
            ]
        }
        fn creates() -> &'static str {
            const_format::concatcp!(
                "CREATE TABLE IF NOT EXISTS ",
                HANDS,
                " (
                    id           UUID PRIMARY KEY,
                    table_id     UUID NOT NULL REFERENCES ",
                TABLES,
                "(id) ON DELETE CASCADE,
                    number       BIGINT NOT NULL,
                    dealer       SMALLINT NOT NULL,
                    community    BIGINT NOT NULL DEFAULT 0,
                    pot          BIGINT NOT NULL DEFAULT 0,
                    winners      JSONB NOT NULL DEFAULT '[]',
                    started_at   TIMESTAMPTZ NOT NULL,
                    completed_at TIMESTAMPTZ
                );"
            )
        }
        fn indices() -> &'static str {
            const_format::concatcp!(
                "CREATE INDEX IF NOT EXISTS idx_hands_table ON ",
                HANDS,
                " (table_id, number DESC);"
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
    fn complete_stamps_completed_at() {
        let mut hand = Hand::started(ID::default(), 1, 0);
        assert!(hand.completed_at().is_none());
        hand.complete(Board::empty(), 100, vec![(0, 100)]);
        assert!(hand.completed_at().is_some());
        assert_eq!(hand.pot(), 100);
    }
}
