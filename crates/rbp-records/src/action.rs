use super::*;
use rbp_auth::Member;
use rbp_cards::Street;
use rbp_core::Chips;
use rbp_core::ID;
use rbp_core::Unique;

/// Persisted per-player action row (spec.md §6 `hand_actions`).
///
/// Recorded alongside (not instead of) the structured `player_action`
/// [`GameEvent`] -- spec.md §4.2 calls this out explicitly as "a legacy
/// action row and a `player_action` event", kept distinct because
/// `hand_actions` is the flat shape hand-history UIs query directly while
/// `game_events` is the generic append-only audit stream.
#[derive(Debug, Clone)]
pub struct HandAction {
    id: ID<Self>,
    hand: ID<Hand>,
    user: ID<Member>,
    action: String,
    amount: Chips,
    round: Street,
    recorded_at: std::time::SystemTime,
}

impl HandAction {
    pub fn new(hand: ID<Hand>, user: ID<Member>, action: &str, amount: Chips, round: Street) -> Self {
        Self {
            id: ID::default(),
            hand,
            user,
            action: action.to_string(),
            amount,
            round,
            recorded_at: std::time::SystemTime::now(),
        }
    }
    pub fn hand(&self) -> ID<Hand> {
        self.hand
    }
    pub fn user(&self) -> ID<Member> {
        self.user
    }
    pub fn action(&self) -> &str {
        &self.action
    }
    pub fn amount(&self) -> Chips {
        self.amount
    }
    pub fn round(&self) -> Street {
        self.round
    }
}

impl Unique for HandAction {
    fn id(&self) -> ID<Self> {
        self.id
    }
}

#[cfg(feature = "database")]
mod schema {
    use super::*;
    use rbp_pg::*;

    impl Schema for HandAction {
        fn name() -> &'static str {
            HAND_ACTIONS
        }
        fn columns() -> &'static [tokio_postgres::types::Type] {
            &[
                tokio_postgres::types::Type::UUID,
                tokio_postgres::types::Type::UUID,
                tokio_postgres::types::Type::UUID,
                tokio_postgres::types::Type::VARCHAR,
                tokio_postgres::types::Type::INT8,
                tokio_postgres::types::Type::VARCHAR,
                tokio_postgres::types::Type::TIMESTAMPTZ,
            ]
        }
        fn creates() -> &'static str {
            const_format::concatcp!(
                "CREATE TABLE IF NOT EXISTS ",
                HAND_ACTIONS,
                " (
                    id          UUID PRIMARY KEY,
                    hand_id     UUID NOT NULL REFERENCES ",
                HANDS,
                "(id) ON DELETE CASCADE,
                    user_id     UUID NOT NULL REFERENCES ",
                USERS,
                "(id),
                    action      VARCHAR(16) NOT NULL,
                    amount      BIGINT NOT NULL DEFAULT 0,
                    round       VARCHAR(16) NOT NULL,
                    recorded_at TIMESTAMPTZ NOT NULL
                );"
            )
        }
        fn indices() -> &'static str {
            const_format::concatcp!(
                "CREATE INDEX IF NOT EXISTS idx_hand_actions_hand ON ",
                HAND_ACTIONS,
                " (hand_id);"
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
