use rbp_core::Chips;
use serde::Deserialize;
use serde::Serialize;

/// One level of a tournament's blind schedule (spec.md §3 "Blind level").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlindLevelDto {
    pub small_blind: Chips,
    pub big_blind: Chips,
    pub ante: Chips,
    pub duration_secs: u64,
}

/// One entry of a tournament's prize structure: finish position -> share
/// of the prize pool (spec.md §3 "prize structure").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrizeShareDto {
    pub position: u32,
    pub share: f64,
}

/// Row returned by `GET /tournaments`.
#[derive(Debug, Clone, Serialize)]
pub struct TournamentSummary {
    pub id: String,
    pub short_code: String,
    pub name: String,
    pub status: String,
    pub buy_in: Chips,
    pub prize_pool: Chips,
    pub current_players: u32,
    pub min_players: u32,
    pub max_players: u32,
}

/// Full detail returned by `GET /tournaments/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct TournamentDetail {
    #[serde(flatten)]
    pub summary: TournamentSummary,
    pub current_level: u32,
    pub blind_schedule: Vec<BlindLevelDto>,
    pub prize_structure: Vec<PrizeShareDto>,
    pub auto_start_delay_secs: u64,
    pub registration_completed_at: Option<i64>,
    pub prizes_distributed: bool,
}

/// Body of `POST /tournaments`.
#[derive(Debug, Deserialize)]
pub struct CreateTournamentRequest {
    pub name: String,
    pub buy_in: Chips,
    pub starting_chips: Chips,
    pub min_players: u32,
    pub max_players: u32,
    pub auto_start_delay_secs: u64,
    pub blind_schedule: Vec<BlindLevelDto>,
    pub prize_structure: Vec<PrizeShareDto>,
}

/// Row returned by `GET /tournaments/{id}/standings`.
#[derive(Debug, Clone, Serialize)]
pub struct StandingEntry {
    pub user_id: String,
    pub username: String,
    pub status: String,
    pub finish_position: Option<u32>,
    pub prize_amount: Chips,
    pub current_table: Option<String>,
}
