use actix_web::HttpResponse;
use actix_web::Responder;
use actix_web::web;
use rbp_core::ID;
use rbp_core::Unique;
use rbp_dto::HandEventDto;
use rbp_dto::HandSummary;
use rbp_gameplay::Table;
use rbp_records::get_hand_events;
use rbp_records::get_table_hands;
use std::sync::Arc;
use tokio_postgres::Client;

fn unix_secs(t: std::time::SystemTime) -> i64 {
    t.duration_since(std::time::UNIX_EPOCH).map(|d| d.as_secs() as i64).unwrap_or(0)
}

/// `GET /tables/{id}/hands` (spec.md §4.3 `GetTableHands`).
pub async fn table_hands(db: web::Data<Arc<Client>>, path: web::Path<uuid::Uuid>) -> impl Responder {
    let table: ID<Table> = ID::from(path.into_inner());
    match get_table_hands(&db, table, 50).await {
        Ok(hands) => HttpResponse::Ok().json(
            hands
                .iter()
                .map(|hand| HandSummary {
                    id: hand.id().to_string(),
                    table_id: hand.table().to_string(),
                    number: hand.number(),
                    dealer: hand.dealer(),
                    community: hand.community().to_string(),
                    pot: hand.pot(),
                    winners: hand.winners().to_vec(),
                    started_at: unix_secs(hand.started_at()),
                    completed_at: hand.completed_at().map(unix_secs),
                })
                .collect::<Vec<_>>(),
        ),
        Err(e) => HttpResponse::InternalServerError().body(e.to_string()),
    }
}

/// `GET /hands/{id}/events` (spec.md §4.3 `GetHandEvents`).
pub async fn hand_events(db: web::Data<Arc<Client>>, path: web::Path<uuid::Uuid>) -> impl Responder {
    let hand = ID::from(path.into_inner());
    match get_hand_events(&db, hand).await {
        Ok(events) => HttpResponse::Ok().json(
            events
                .iter()
                .map(|event| HandEventDto {
                    sequence: event.sequence(),
                    kind: event.kind().to_string(),
                    actor: event.actor().map(|a| a.to_string()),
                    action: event.action().map(str::to_string),
                    amount: event.amount(),
                    metadata: event.metadata().clone(),
                    timestamp: unix_secs(event.timestamp()),
                })
                .collect::<Vec<_>>(),
        ),
        Err(e) => HttpResponse::InternalServerError().body(e.to_string()),
    }
}
