use actix_web::HttpResponse;
use actix_web::Responder;
use actix_web::web;
use rbp_auth::AuthRepository;
use rbp_auth::Auth;
use rbp_core::ID;
use rbp_core::Unique;
use rbp_dto::BlindLevelDto;
use rbp_dto::CreateTournamentRequest;
use rbp_dto::PrizeShareDto;
use rbp_dto::StandingEntry;
use rbp_dto::TournamentDetail;
use rbp_dto::TournamentSummary;
use rbp_records::BlindLevel;
use rbp_records::Tournament;
use rbp_records::TournamentRepository;
use rbp_tournament::Coordinator;
use rbp_tournament::MutexMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_postgres::Client;

fn unix_secs(t: std::time::SystemTime) -> i64 {
    t.duration_since(std::time::UNIX_EPOCH).map(|d| d.as_secs() as i64).unwrap_or(0)
}

fn summary(t: &Tournament) -> TournamentSummary {
    TournamentSummary {
        id: t.id().to_string(),
        short_code: t.short_code().to_string(),
        name: t.name().to_string(),
        status: t.status().as_str().to_string(),
        buy_in: t.buy_in(),
        prize_pool: t.prize_pool(),
        current_players: t.current_players(),
        min_players: t.min_players(),
        max_players: t.max_players(),
    }
}

fn detail(t: &Tournament) -> TournamentDetail {
    TournamentDetail {
        summary: summary(t),
        current_level: t.current_level(),
        blind_schedule: t
            .blind_schedule()
            .iter()
            .map(|level| BlindLevelDto {
                small_blind: level.small_blind,
                big_blind: level.big_blind,
                ante: level.ante,
                duration_secs: level.duration.as_secs(),
            })
            .collect(),
        prize_structure: t
            .prize_structure()
            .iter()
            .map(|&(position, share)| PrizeShareDto { position, share })
            .collect(),
        auto_start_delay_secs: t.auto_start_delay().as_secs(),
        registration_completed_at: t.registration_completed_at().map(unix_secs),
        prizes_distributed: t.prizes_distributed(),
    }
}

/// `GET /tournaments`, optionally filtered by `?status=`.
pub async fn list(db: web::Data<Arc<Client>>, query: web::Query<std::collections::HashMap<String, String>>) -> impl Responder {
    let status = query.get("status").map(String::as_str);
    match db.list_tournaments(status).await {
        Ok(tournaments) => HttpResponse::Ok().json(tournaments.iter().map(summary).collect::<Vec<_>>()),
        Err(e) => HttpResponse::InternalServerError().body(e.to_string()),
    }
}

/// `GET /tournaments/{id}`.
pub async fn get(db: web::Data<Arc<Client>>, path: web::Path<uuid::Uuid>) -> impl Responder {
    let id: ID<Tournament> = ID::from(path.into_inner());
    match db.find_tournament(id).await {
        Ok(Some(t)) => HttpResponse::Ok().json(detail(&t)),
        Ok(None) => HttpResponse::NotFound().body("no such tournament"),
        Err(e) => HttpResponse::InternalServerError().body(e.to_string()),
    }
}

/// `POST /tournaments`.
pub async fn create(
    coordinator: web::Data<Arc<Coordinator<MutexMap>>>,
    auth: Auth,
    body: web::Json<CreateTournamentRequest>,
) -> impl Responder {
    let req = body.into_inner();
    let blind_schedule: Vec<BlindLevel> = req
        .blind_schedule
        .into_iter()
        .map(|lvl| BlindLevel {
            small_blind: lvl.small_blind,
            big_blind: lvl.big_blind,
            ante: lvl.ante,
            duration: Duration::from_secs(lvl.duration_secs),
        })
        .collect();
    let prize_structure = req.prize_structure.into_iter().map(|share| (share.position, share.share)).collect();
    match coordinator
        .create(
            req.name,
            auth.user(),
            req.buy_in,
            req.starting_chips,
            req.min_players,
            req.max_players,
            Duration::from_secs(req.auto_start_delay_secs),
            blind_schedule,
            prize_structure,
        )
        .await
    {
        Ok(t) => HttpResponse::Ok().json(detail(&t)),
        Err(e) => HttpResponse::InternalServerError().body(e.to_string()),
    }
}

/// `POST /tournaments/{id}/register`.
pub async fn register(
    coordinator: web::Data<Arc<Coordinator<MutexMap>>>,
    auth: Auth,
    path: web::Path<uuid::Uuid>,
) -> impl Responder {
    let id: ID<Tournament> = ID::from(path.into_inner());
    match coordinator.register(id, auth.user()).await {
        Ok(count) => HttpResponse::Ok().json(serde_json::json!({ "current_players": count })),
        Err(e) => HttpResponse::BadRequest().body(e.to_string()),
    }
}

/// `POST /tournaments/{id}/unregister`.
pub async fn unregister(
    coordinator: web::Data<Arc<Coordinator<MutexMap>>>,
    auth: Auth,
    path: web::Path<uuid::Uuid>,
) -> impl Responder {
    let id: ID<Tournament> = ID::from(path.into_inner());
    match coordinator.unregister(id, auth.user()).await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({ "status": "unregistered" })),
        Err(e) => HttpResponse::BadRequest().body(e.to_string()),
    }
}

/// `POST /tournaments/{id}/cancel` (creator only).
pub async fn cancel(
    coordinator: web::Data<Arc<Coordinator<MutexMap>>>,
    auth: Auth,
    path: web::Path<uuid::Uuid>,
) -> impl Responder {
    let id: ID<Tournament> = ID::from(path.into_inner());
    match coordinator.cancel(id, auth.user()).await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({ "status": "cancelled" })),
        Err(e) => HttpResponse::BadRequest().body(e.to_string()),
    }
}

/// `GET /tournaments/{id}/standings` (spec.md §4.4 "Standings").
pub async fn standings(db: web::Data<Arc<Client>>, path: web::Path<uuid::Uuid>) -> impl Responder {
    let id: ID<Tournament> = ID::from(path.into_inner());
    let players = match db.tournament_players(id).await {
        Ok(players) => players,
        Err(e) => return HttpResponse::InternalServerError().body(e.to_string()),
    };
    let mut rows = Vec::with_capacity(players.len());
    for player in &players {
        let username = match db.find(player.user()).await {
            Ok(Some(member)) => member.username().to_string(),
            _ => player.user().to_string(),
        };
        rows.push(StandingEntry {
            user_id: player.user().to_string(),
            username,
            status: player.status().as_str().to_string(),
            finish_position: player.finish_position(),
            prize_amount: player.prize_amount().unwrap_or(0),
            current_table: player.current_table().map(|t| t.to_string()),
        });
    }
    rows.sort_by_key(|r| r.finish_position.unwrap_or(u32::MAX));
    HttpResponse::Ok().json(rows)
}
