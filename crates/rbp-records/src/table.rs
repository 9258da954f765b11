use super::*;
use rbp_core::ID;
use rbp_core::Unique;
use rbp_gameplay::Table;

/// Persisted row for a live or completed table (spec.md §6 `tables`).
///
/// Deliberately thin: the authoritative in-memory state lives in
/// `rbp_gameplay::Table` behind `rbp_gameroom::Room`'s mutex. This row
/// exists so a table survives a server restart as a historical record and
/// so `hands`/`game_events` have something stable to reference.
#[derive(Debug, Clone)]
pub struct TableRecord {
    id: ID<Table>,
    tournament: Option<ID<Tournament>>,
    status: String,
    config: serde_json::Value,
    created_at: std::time::SystemTime,
    completed_at: Option<std::time::SystemTime>,
}

impl TableRecord {
    pub fn new(id: ID<Table>, tournament: Option<ID<Tournament>>, config: serde_json::Value) -> Self {
        Self {
            id,
            tournament,
            status: "waiting".to_string(),
            config,
            created_at: std::time::SystemTime::now(),
            completed_at: None,
        }
    }
    pub fn id(&self) -> ID<Table> {
        self.id
    }
    pub fn tournament(&self) -> Option<ID<Tournament>> {
        self.tournament
    }
    pub fn status(&self) -> &str {
        &self.status
    }
    pub fn config(&self) -> &serde_json::Value {
        &self.config
    }
    pub fn created_at(&self) -> std::time::SystemTime {
        self.created_at
    }
    pub fn completed_at(&self) -> Option<std::time::SystemTime> {
        self.completed_at
    }
    pub fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
    }
    pub fn complete(&mut self) {
        self.status = "completed".to_string();
        self.completed_at = Some(std::time::SystemTime::now());
    }
}

impl Unique<Table> for TableRecord {
    fn id(&self) -> ID<Table> {
        self.id
    }
}

#[cfg(feature = "database")]
mod schema {
    use super::*;
    use rbp_pg::*;

    impl Schema for TableRecord {
        fn name() -> &'static str {
            TABLES
        }
        fn columns() -> &'static [tokio_postgres::types::Type] {
            &[
                tokio_postgres::types::Type::UUID,
                tokio_postgres::types::Type::UUID,
                tokio_postgres::types::Type::VARCHAR,
                tokio_postgres::types::Type::JSONB,
                tokio_postgres::types::Type::TIMESTAMPTZ,
                tokio_postgres::types::Type::TIMESTAMPTZ,
            ]
        }
        fn creates() -> &'static str {
            const_format::concatcp!(
                "CREATE TABLE IF NOT EXISTS ",
                TABLES,
                " (
                    id            UUID PRIMARY KEY,
                    tournament_id UUID REFERENCES ",
                TOURNAMENTS,
                "(id),
                    status        VARCHAR(16) NOT NULL DEFAULT 'waiting',
                    config        JSONB NOT NULL,
                    created_at    TIMESTAMPTZ NOT NULL,
                    completed_at  TIMESTAMPTZ
                );"
            )
        }
        fn indices() -> &'static str {
            const_format::concatcp!(
                "CREATE INDEX IF NOT EXISTS idx_tables_tournament ON ",
                TABLES,
                " (tournament_id);"
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
