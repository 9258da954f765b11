use rbp_core::Chips;
use serde::Serialize;

/// Row returned by `GET /tables/{id}/hands` (spec.md §4.3 `GetTableHands`).
#[derive(Debug, Clone, Serialize)]
pub struct HandSummary {
    pub id: String,
    pub table_id: String,
    pub number: u64,
    pub dealer: usize,
    pub community: String,
    pub pot: Chips,
    pub winners: Vec<(usize, Chips)>,
    pub started_at: i64,
    pub completed_at: Option<i64>,
}

/// One history event, in the shape `GET /hands/{id}/events`
/// (spec.md §4.3 `GetHandEvents`) returns them.
#[derive(Debug, Clone, Serialize)]
pub struct HandEventDto {
    pub sequence: u64,
    pub kind: String,
    pub actor: Option<String>,
    pub action: Option<String>,
    pub amount: Option<Chips>,
    pub metadata: serde_json::Value,
    pub timestamp: i64,
}
