use super::*;
use std::collections::HashMap;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;

/// Allocates gap-free, per-hand event sequence numbers (spec.md §4.3
/// "History Recorder").
///
/// Kept in-memory and process-local: two hands never contend on the same
/// counter, so a `tokio::sync::Mutex<Table>` critical section never blocks
/// on history recording, and the `GAME_EVENTS` table's `UNIQUE (hand_id,
/// sequence)` constraint is the backstop if a counter is ever lost (e.g.
/// crash mid-hand) and recreated starting from 0 -- the duplicate insert
/// simply fails and the retry logic in `record` skips it.
#[derive(Default)]
pub struct Recorder {
    counters: Mutex<HashMap<ID<Hand>, Arc<AtomicU64>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next sequence number for `hand`, starting at 0.
    pub fn next_sequence(&self, hand: ID<Hand>) -> u64 {
        let counter = self
            .counters
            .lock()
            .expect("recorder mutex poisoned")
            .entry(hand)
            .or_insert_with(|| Arc::new(AtomicU64::new(0)))
            .clone();
        counter.fetch_add(1, Ordering::SeqCst)
    }

    /// Drops the counter for a finished hand so the map doesn't grow
    /// without bound over a table's lifetime.
    pub fn release(&self, hand: ID<Hand>) {
        self.counters.lock().expect("recorder mutex poisoned").remove(&hand);
    }
}

#[cfg(feature = "database")]
pub use database::*;

#[cfg(feature = "database")]
mod database {
    use super::*;
    use rbp_core::Chips;
    use rbp_core::Position;
    use rbp_core::Unique;
    use rbp_gameplay::Event;
    use rbp_gameplay::Table as LiveTable;
    use tokio_postgres::Client;

    /// Persists one in-flight [`Event`] as a [`GameEvent`] row, allocating
    /// its sequence number from `recorder`. Does not touch `hand_actions` --
    /// callers append a [`HandAction`] separately for `PlayerAction` events,
    /// mirroring spec.md §4.2's "legacy action row and a `player_action`
    /// event" split.
    pub async fn record(
        client: &Client,
        recorder: &Recorder,
        hand: ID<Hand>,
        table: ID<LiveTable>,
        event: &Event,
    ) -> Result<GameEvent, tokio_postgres::Error> {
        let sequence = recorder.next_sequence(hand);
        let (actor, action, amount, metadata) = describe(event);
        let row = GameEvent::new(hand, table, event.kind(), sequence, actor, action, amount, metadata);
        let id = row.id().inner();
        let hand_id = row.hand().inner();
        let table_id = row.table().inner();
        let actor = row.actor().map(|a| a.inner());
        client
            .execute(
                const_format::concatcp!(
                    "INSERT INTO ",
                    rbp_pg::GAME_EVENTS,
                    " (id, hand_id, table_id, kind, sequence, actor, action, amount, metadata, timestamp)
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                     ON CONFLICT (hand_id, sequence) DO NOTHING"
                ),
                &[
                    &id,
                    &hand_id,
                    &table_id,
                    &row.kind(),
                    &(row.sequence() as i64),
                    &actor,
                    &row.action(),
                    &row.amount(),
                    &row.metadata(),
                    &row.timestamp(),
                ],
            )
            .await?;
        Ok(row)
    }

    fn describe(event: &Event) -> (Option<ID<rbp_auth::Member>>, Option<&'static str>, Option<Chips>, serde_json::Value) {
        match event {
            Event::PlayerAction { actor, action, .. } => {
                (None, Some(action.kind()), Some(action.amount()), serde_json::json!({ "seat": actor }))
            }
            Event::HandStarted { hand_number, dealer, sb_seat, bb_seat, sb_amount, bb_amount, starting_chips } => (
                None,
                None,
                None,
                serde_json::json!({
                    "hand_number": hand_number,
                    "dealer": dealer,
                    "sb_seat": sb_seat,
                    "bb_seat": bb_seat,
                    "sb_amount": sb_amount,
                    "bb_amount": bb_amount,
                    "starting_chips": starting_chips,
                }),
            ),
            Event::RoundAdvanced { street, community } => {
                (None, None, None, serde_json::json!({ "street": street.to_string(), "community": community.to_string() }))
            }
            Event::Showdown { reveals } => (
                None,
                None,
                None,
                serde_json::json!({
                    "reveals": reveals
                        .iter()
                        .map(|(seat, hole, strength)| serde_json::json!({
                            "seat": seat,
                            "hole": hole.to_string(),
                            "strength": strength.to_string(),
                        }))
                        .collect::<Vec<_>>(),
                }),
            ),
            Event::HandComplete { winners, final_pot, community, busted, starting_stacks } => (
                None,
                None,
                None,
                serde_json::json!({
                    "winners": winners,
                    "final_pot": final_pot,
                    "community": community.to_string(),
                    "busted": busted
                        .iter()
                        .map(|(seat, user)| serde_json::json!({ "seat": seat, "user": user }))
                        .collect::<Vec<_>>(),
                    "starting_stacks": starting_stacks,
                }),
            ),
            Event::GameComplete { winner } => (None, None, None, serde_json::json!({ "winner": winner })),
        }
    }

    pub async fn get_hand_events(client: &Client, hand: ID<Hand>) -> Result<Vec<GameEvent>, tokio_postgres::Error> {
        let hand_id = hand.inner();
        let rows = client
            .query(
                const_format::concatcp!(
                    "SELECT id, hand_id, table_id, kind, sequence, actor, action, amount, metadata, timestamp FROM ",
                    rbp_pg::GAME_EVENTS,
                    " WHERE hand_id = $1 ORDER BY sequence ASC"
                ),
                &[&hand_id],
            )
            .await?;
        Ok(rows.iter().map(from_row).collect())
    }

    pub async fn get_table_hands(client: &Client, table: ID<LiveTable>, limit: i64) -> Result<Vec<Hand>, tokio_postgres::Error> {
        let table_id = table.inner();
        let rows = client
            .query(
                const_format::concatcp!(
                    "SELECT id, table_id, number, dealer, community, pot, winners, started_at, completed_at FROM ",
                    rbp_pg::HANDS,
                    " WHERE table_id = $1 ORDER BY number DESC LIMIT $2"
                ),
                &[&table_id, &limit],
            )
            .await?;
        Ok(rows.iter().map(hand_from_row).collect())
    }

    fn from_row(row: &tokio_postgres::Row) -> GameEvent {
        let actor: Option<uuid::Uuid> = row.get(5);
        GameEvent::new(
            ID::from(row.get::<_, uuid::Uuid>(1)),
            ID::from(row.get::<_, uuid::Uuid>(2)),
            row.get(3),
            row.get::<_, i64>(4) as u64,
            actor.map(ID::from),
            row.get(6),
            row.get(7),
            row.get(8),
        )
    }

    fn hand_from_row(row: &tokio_postgres::Row) -> Hand {
        let winners: serde_json::Value = row.get(6);
        let winners: Vec<(Position, Chips)> = serde_json::from_value(winners).unwrap_or_default();
        let community_bits: i64 = row.get(4);
        let community = rbp_cards::Board::from(rbp_cards::Hand::from(community_bits as u64));
        let mut hand = Hand::started(
            ID::from(row.get::<_, uuid::Uuid>(1)),
            row.get::<_, i64>(2) as u64,
            row.get::<_, i16>(3) as Position,
        );
        hand.complete(community, row.get(5), winners);
        hand
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_numbers_are_gap_free_per_hand() {
        let recorder = Recorder::new();
        let hand = ID::default();
        assert_eq!(recorder.next_sequence(hand), 0);
        assert_eq!(recorder.next_sequence(hand), 1);
        assert_eq!(recorder.next_sequence(hand), 2);
    }

    #[test]
    fn different_hands_have_independent_counters() {
        let recorder = Recorder::new();
        let a = ID::default();
        let b = ID::default();
        assert_eq!(recorder.next_sequence(a), 0);
        assert_eq!(recorder.next_sequence(b), 0);
        assert_eq!(recorder.next_sequence(a), 1);
    }

    #[test]
    fn release_resets_the_counter() {
        let recorder = Recorder::new();
        let hand = ID::default();
        recorder.next_sequence(hand);
        recorder.release(hand);
        assert_eq!(recorder.next_sequence(hand), 0);
    }
}
