use super::*;
use rbp_auth::Member;
use rbp_core::ID;

/// An entry in the matchmaking queue (spec.md §3 "MatchmakingEntry", §4.5).
///
/// `queue_type` partitions the queue (e.g. stakes level or game variant);
/// the coordinator only ever matches entries that share one.
#[derive(Debug, Clone)]
pub struct MatchmakingEntry {
    user: ID<Member>,
    queue_type: String,
    joined_at: std::time::SystemTime,
}

impl MatchmakingEntry {
    pub fn new(user: ID<Member>, queue_type: &str) -> Self {
        Self { user, queue_type: queue_type.to_string(), joined_at: std::time::SystemTime::now() }
    }
    pub fn user(&self) -> ID<Member> {
        self.user
    }
    pub fn queue_type(&self) -> &str {
        &self.queue_type
    }
    pub fn joined_at(&self) -> std::time::SystemTime {
        self.joined_at
    }
    pub fn waited(&self) -> std::time::Duration {
        std::time::SystemTime::now().duration_since(self.joined_at).unwrap_or_default()
    }
}

#[cfg(feature = "database")]
mod schema {
    use super::*;
    use rbp_pg::*;

    impl Schema for MatchmakingEntry {
        fn name() -> &'static str {
            MATCHMAKING_QUEUE
        }
        fn columns() -> &'static [tokio_postgres::types::Type] {
            &[
                tokio_postgres::types::Type::UUID,
                tokio_postgres::types::Type::VARCHAR,
                tokio_postgres::types::Type::TIMESTAMPTZ,
            ]
        }
        fn creates() -> &'static str {
            const_format::concatcp!(
                "CREATE TABLE IF NOT EXISTS ",
                MATCHMAKING_QUEUE,
                " (
                    user_id     UUID NOT NULL REFERENCES ",
                USERS,
                "(id),
                    queue_type  VARCHAR(32) NOT NULL,
                    joined_at   TIMESTAMPTZ NOT NULL,
                    PRIMARY KEY (user_id, queue_type)
                );"
            )
        }
        fn indices() -> &'static str {
            const_format::concatcp!(
                "CREATE INDEX IF NOT EXISTS idx_matchmaking_queue_type ON ",
                MATCHMAKING_QUEUE,
                " (queue_type, joined_at);"
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
