use rbp_auth::Member;
use rbp_auth::Session;
use rbp_pg::Schema;
use rbp_records::GameEvent;
use rbp_records::Hand;
use rbp_records::HandAction;
use rbp_records::MatchmakingEntry;
use rbp_records::TableRecord;
use rbp_records::Tournament;
use rbp_records::TournamentPlayer;
use tokio_postgres::Client;

/// Creates every persisted entity's table and indices, in dependency order
/// (a table referencing another via `REFERENCES` must be created after it).
///
/// Mirrors the teacher's `connect::db()` migration step, just run here
/// instead of inline in `rbp-pg::db()` -- this binary is the only one of
/// the platform's consumers that owns the schema.
pub async fn run(db: &Client) {
    log::info!("running schema migrations");
    create::<Member>(db, "users").await;
    create::<Session>(db, "sessions").await;
    create::<Tournament>(db, "tournaments").await;
    create::<TableRecord>(db, "tables").await;
    create::<Hand>(db, "hands").await;
    create::<HandAction>(db, "hand_actions").await;
    create::<GameEvent>(db, "game_events").await;
    create::<TournamentPlayer>(db, "tournament_players").await;
    create::<MatchmakingEntry>(db, "matchmaking_queue").await;
    log::info!("schema migrations complete");
}

async fn create<T: Schema>(db: &Client, label: &str) {
    db.batch_execute(T::creates()).await.unwrap_or_else(|e| panic!("create {label}: {e}"));
    db.batch_execute(T::indices()).await.unwrap_or_else(|e| panic!("index {label}: {e}"));
}
