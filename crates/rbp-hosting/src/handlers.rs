use crate::casino::Casino;
use crate::client;
use actix_web::HttpRequest;
use actix_web::HttpResponse;
use actix_web::Responder;
use actix_web::web;
use rbp_core::ID;
use rbp_gameplay::Config;
use rbp_gameplay::Mode;
use serde::Deserialize;

#[derive(Deserialize)]
pub struct CreateTableRequest {
    mode: Mode,
    seats: usize,
    small_blind: rbp_core::Chips,
    big_blind: rbp_core::Chips,
    #[serde(default)]
    ante: rbp_core::Chips,
    starting_stack: rbp_core::Chips,
}

/// Opens a standalone cash table. Tournament tables are created by the
/// Tournament Coordinator directly through [`Casino::create_table`]; this
/// route exists for cash play and for ops/testing convenience, mirroring
/// the teacher's `/room/start`.
pub async fn create_table(casino: web::Data<Casino>, body: web::Json<CreateTableRequest>) -> impl Responder {
    let config = match body.mode {
        Mode::Cash => Config::cash(body.seats, body.small_blind, body.big_blind, body.starting_stack),
        Mode::Tournament => Config::tournament(body.seats, body.small_blind, body.big_blind, body.ante, body.starting_stack),
    };
    match casino.create_table(config).await {
        Ok(room) => HttpResponse::Ok().json(serde_json::json!({ "table_id": room.id().inner() })),
        Err(e) => HttpResponse::InternalServerError().body(e.to_string()),
    }
}

pub async fn close_table(casino: web::Data<Casino>, path: web::Path<uuid::Uuid>) -> impl Responder {
    match casino.close(ID::from(path.into_inner())).await {
        Some(_) => HttpResponse::Ok().json(serde_json::json!({ "status": "closed" })),
        None => HttpResponse::NotFound().body("no such table"),
    }
}

/// Upgrades an HTTP connection to a WebSocket bridged to one table.
///
/// The token is read from the query string rather than through the `Auth`
/// extractor: `actix_ws::handle` needs to consume `web::Payload` itself, and
/// an extractor that also consumes the request body would conflict with it.
/// An absent or invalid token still succeeds as a spectator connection --
/// `game_action`/`chat_message` from an anonymous connection are simply
/// rejected downstream once a `user` is required.
pub async fn enter(
    casino: web::Data<Casino>,
    tokens: web::Data<rbp_auth::Crypto>,
    path: web::Path<uuid::Uuid>,
    query: web::Query<std::collections::HashMap<String, String>>,
    body: web::Payload,
    req: HttpRequest,
) -> impl Responder {
    let id: ID<rbp_gameplay::Table> = ID::from(path.into_inner());
    let user = query
        .get("token")
        .and_then(|t| tokens.decode(t).ok())
        .filter(|claims| !claims.expired())
        .map(|claims| ID::from(claims.sub));

    match user {
        Some(user) => log::info!("[hosting] user {} entering table {}", user, id),
        None => log::info!("[hosting] anonymous connection entering table {}", id),
    }

    let Some(room) = casino.get(id).await else {
        return HttpResponse::NotFound().body("no such table").map_into_right_body();
    };

    match actix_ws::handle(&req, body) {
        Ok((response, session, stream)) => {
            actix_web::rt::spawn(client::serve(room, user, session, stream));
            response.map_into_left_body()
        }
        Err(e) => HttpResponse::InternalServerError().body(e.to_string()).map_into_right_body(),
    }
}
