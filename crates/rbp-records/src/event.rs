use super::*;
use rbp_auth::Member;
use rbp_core::Chips;
use rbp_core::ID;
use rbp_core::Unique;
use rbp_gameplay::Table;

/// Append-only history event row (spec.md §3 "Event (history)", §4.3).
///
/// Never updated or deleted once written. `sequence` is per-hand,
/// gap-free, monotonic from 0 -- allocated by [`crate::Recorder`], not by
/// the database (the whole point is that the counter lives in memory so
/// concurrent writers for *different* hands never contend on it).
#[derive(Debug, Clone)]
pub struct GameEvent {
    id: ID<Self>,
    hand: ID<Hand>,
    table: ID<Table>,
    kind: String,
    sequence: u64,
    actor: Option<ID<Member>>,
    action: Option<String>,
    amount: Option<Chips>,
    metadata: serde_json::Value,
    timestamp: std::time::SystemTime,
}

impl GameEvent {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        hand: ID<Hand>,
        table: ID<Table>,
        kind: &str,
        sequence: u64,
        actor: Option<ID<Member>>,
        action: Option<&str>,
        amount: Option<Chips>,
        metadata: serde_json::Value,
    ) -> Self {
        Self {
            id: ID::default(),
            hand,
            table,
            kind: kind.to_string(),
            sequence,
            actor,
            action: action.map(str::to_string),
            amount,
            metadata,
            timestamp: std::time::SystemTime::now(),
        }
    }
    pub fn hand(&self) -> ID<Hand> {
        self.hand
    }
    pub fn table(&self) -> ID<Table> {
        self.table
    }
    pub fn kind(&self) -> &str {
        &self.kind
    }
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
    pub fn actor(&self) -> Option<ID<Member>> {
        self.actor
    }
    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }
    pub fn amount(&self) -> Option<Chips> {
        self.amount
    }
    pub fn metadata(&self) -> &serde_json::Value {
        &self.metadata
    }
    pub fn timestamp(&self) -> std::time::SystemTime {
        self.timestamp
    }
}

impl Unique for GameEvent {
    fn id(&self) -> ID<Self> {
        self.id
    }
}

#[cfg(feature = "database")]
mod schema {
    use super::*;
    use rbp_pg::*;

    impl Schema for GameEvent {
        fn name() -> &'static str {
            GAME_EVENTS
        }
        fn columns() -> &'static [tokio_postgres::types::Type] {
            &[
                tokio_postgres::types::Type::UUID,
                tokio_postgres::types::Type::UUID,
                tokio_postgres::types::Type::UUID,
                tokio_postgres::types::Type::VARCHAR,
                tokio_postgres::types::Type::INT8,
                tokio_postgres::types::Type::UUID,
                tokio_postgres::types::Type::VARCHAR,
                tokio_postgres::types::Type::INT8,
                tokio_postgres::types::Type::JSONB,
                tokio_postgres::types::Type::TIMESTAMPTZ,
            ]
        }
        fn creates() -> &'static str {
            const_format::concatcp!(
                "CREATE TABLE IF NOT EXISTS ",
                GAME_EVENTS,
                " (
                    id          UUID PRIMARY KEY,
                    hand_id     UUID NOT NULL REFERENCES ",
                HANDS,
                "(id) ON DELETE CASCADE,
                    table_id    UUID NOT NULL REFERENCES ",
                TABLES,
                "(id) ON DELETE CASCADE,
                    kind        VARCHAR(32) NOT NULL,
                    sequence    BIGINT NOT NULL,
                    actor       UUID,
                    action      VARCHAR(16),
                    amount      BIGINT,
                    metadata    JSONB NOT NULL DEFAULT '{}',
                    timestamp   TIMESTAMPTZ NOT NULL,
                    UNIQUE (hand_id, sequence)
                );"
            )
        }
        fn indices() -> &'static str {
            const_format::concatcp!(
                "CREATE INDEX IF NOT EXISTS idx_game_events_hand ON ",
                GAME_EVENTS,
                " (hand_id, sequence);
                 CREATE INDEX IF NOT EXISTS idx_game_events_table ON ",
                GAME_EVENTS,
                " (table_id, timestamp DESC);"
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
