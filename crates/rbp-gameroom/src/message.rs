use rbp_core::Chips;
use rbp_core::Position;
use rbp_gameplay::Action;
use rbp_gameplay::Event;
use rbp_gameplay::Status;
use uuid::Uuid;

/// One seat as shown to a subscriber. Hole cards are only populated in the
/// copy sent to the seat's own occupant -- every other subscriber (and every
/// spectator) sees `hole_cards: None` regardless of street.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SeatView {
    pub position: Position,
    pub user: Uuid,
    pub name: String,
    pub stack: Chips,
    pub stake: Chips,
    pub state: &'static str,
    pub hole_cards: Option<String>,
}

/// Public-plus-private snapshot of a table, sent on `subscribe_table` and
/// whenever a resync is needed (spec.md §5 "a gap triggers a state resync").
#[derive(Debug, Clone, serde::Serialize)]
pub struct TableSnapshot {
    pub table_id: Uuid,
    pub status: Status,
    pub seats: Vec<SeatView>,
    pub dealer: Position,
    pub hand_number: u64,
    pub street: Option<String>,
    pub community: String,
    pub pot: Chips,
    pub action_on: Option<Position>,
    pub action_sequence: u64,
}

/// Inbound client message (spec.md §4.2, §6). The wire shape is the
/// envelope `{type, payload}`; `content = "payload"` gives exactly that
/// without a separate unwrap step at every call site.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ClientMessage {
    SubscribeTable { table_id: Uuid },
    GameAction { table_id: Uuid, action: Action, request_id: String },
    ChatMessage { table_id: Uuid, text: String },
}

/// Outbound message catalogue (spec.md §6 "authoritative list for the
/// core"). Every variant carries the id(s) a client needs for scoping and a
/// server timestamp; `action_sequence` is present wherever spec.md calls for
/// client-side ordering.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ServerMessage {
    TableState {
        #[serde(flatten)]
        snapshot: TableSnapshot,
        timestamp: u64,
    },
    GameUpdate {
        table_id: Uuid,
        event: Event,
        action_sequence: u64,
        timestamp: u64,
    },
    GameComplete {
        table_id: Uuid,
        winner: Position,
        timestamp: u64,
    },
    PlayerActionBroadcast {
        table_id: Uuid,
        actor: Position,
        action: Action,
        timeout: bool,
        action_sequence: u64,
        timestamp: u64,
    },
    ActionConfirmed {
        table_id: Uuid,
        request_id: String,
        success: bool,
        action_sequence: u64,
        timestamp: u64,
    },
    ChatMessage {
        table_id: Uuid,
        user: Option<Uuid>,
        text: String,
        timestamp: u64,
    },
    Error {
        code: String,
        message: String,
        request_id: Option<String>,
        timestamp: u64,
    },
    MatchFound {
        table_id: Uuid,
        game_mode: String,
        timestamp: u64,
    },
    TournamentStarted {
        tournament_id: Uuid,
        timestamp: u64,
    },
    TournamentPaused {
        tournament_id: Uuid,
        timestamp: u64,
    },
    TournamentResumed {
        tournament_id: Uuid,
        timestamp: u64,
    },
    TournamentComplete {
        tournament_id: Uuid,
        winner: Uuid,
        final_standings: Vec<(Uuid, u32)>,
        timestamp: u64,
    },
    TournamentPlayerRegistered {
        tournament_id: Uuid,
        user_id: Uuid,
        current_players: u32,
        timestamp: u64,
    },
    BlindLevelIncreased {
        tournament_id: Uuid,
        level: u32,
        small_blind: Chips,
        big_blind: Chips,
        ante: Chips,
        timestamp: u64,
    },
    PlayerEliminated {
        tournament_id: Uuid,
        user_id: Uuid,
        finish_position: u32,
        timestamp: u64,
    },
    TableConsolidation {
        tournament_id: Uuid,
        source_table: Uuid,
        target_table: Uuid,
        timestamp: u64,
    },
    PrizeAwarded {
        tournament_id: Uuid,
        user_id: Uuid,
        amount: Chips,
        finish_position: u32,
        timestamp: u64,
    },
}

impl ServerMessage {
    /// Unix timestamp in seconds, stamped at send time.
    pub fn now() -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
    pub fn error(code: &str, message: impl Into<String>, request_id: Option<String>) -> Self {
        Self::Error { code: code.to_string(), message: message.into(), request_id, timestamp: Self::now() }
    }
    /// Serializes to the JSON text sent over the socket. Falls back to a
    /// minimal error frame on the (unreachable in practice) serialize
    /// failure rather than panicking the bridge task.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"error","payload":{"code":"internal","message":"serialize failure"}}"#.to_string())
    }
}
