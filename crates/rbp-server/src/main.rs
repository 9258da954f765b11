//! Unified backend binary: boots the database schema, the Casino table
//! registry, the Tournament Coordinator's three background loops, and the
//! Matchmaking Queue's matching loop, then serves the whole HTTP+WebSocket
//! surface from one actix-web process (spec.md §6).

mod history;
mod matchmaking;
mod migrations;
mod tournaments;

use actix_cors::Cors;
use actix_web::App;
use actix_web::HttpServer;
use actix_web::middleware::Logger;
use actix_web::web;
use rbp_hosting::Casino;
use rbp_tournament::Coordinator as TournamentCoordinator;
use rbp_tournament::MutexMap;
use std::sync::Arc;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    rbp_core::log();
    rbp_core::kys();
    rbp_core::brb();

    if std::env::var("LOCK_SERVICE_URL").is_ok() {
        log::warn!("LOCK_SERVICE_URL is set but no distributed lock backend is wired up; falling back to an in-process MutexMap (see DESIGN.md)");
    }

    let db = rbp_pg::db().await;
    migrations::run(&db).await;

    let casino = Arc::new(Casino::new(db.clone()));
    let locks = Arc::new(MutexMap::new());
    let tokens = web::Data::new(rbp_auth::Crypto::from_env());

    let tournaments = Arc::new(TournamentCoordinator::new(db.clone(), casino.clone(), locks.clone()));
    let _starter = tournaments.spawn_starter_loop();
    let _blinds = tournaments.spawn_blind_progression_loop();
    let _eliminations = tournaments.spawn_elimination_handler();

    let matches = Arc::new(rbp_matchmaking::Coordinator::new(db.clone(), casino.clone(), locks.clone()));
    let _matching = matches.spawn_matching_loop();

    let db_data = web::Data::new(db);
    // `rbp_hosting`'s handlers take `web::Data<Casino>`, not `Arc<Casino>` --
    // `Data::from` unwraps the `Arc` this process already shares with both
    // coordinators into the shape actix-web expects.
    let casino_data = web::Data::from(casino);
    let tournaments_data = web::Data::new(tournaments);
    let matches_data = web::Data::new(matches);

    log::info!("starting rbp-server");
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::new("%r %s %Ts"))
            .wrap(Cors::default().allow_any_origin().allow_any_method().allow_any_header())
            .app_data(db_data.clone())
            .app_data(casino_data.clone())
            .app_data(tournaments_data.clone())
            .app_data(matches_data.clone())
            .app_data(tokens.clone())
            .route("/auth/register", web::post().to(rbp_auth::register))
            .route("/auth/login", web::post().to(rbp_auth::login))
            .route("/auth/logout", web::post().to(rbp_auth::logout))
            .route("/auth/me", web::get().to(rbp_auth::me))
            .route("/tables", web::post().to(rbp_hosting::handlers::create_table))
            .route("/tables/{table_id}", web::delete().to(rbp_hosting::handlers::close_table))
            .route("/tables/{table_id}/hands", web::get().to(history::table_hands))
            .route("/hands/{hand_id}/events", web::get().to(history::hand_events))
            .route("/ws/{table_id}", web::get().to(rbp_hosting::handlers::enter))
            .route("/tournaments", web::get().to(tournaments::list))
            .route("/tournaments", web::post().to(tournaments::create))
            .route("/tournaments/{tournament_id}", web::get().to(tournaments::get))
            .route("/tournaments/{tournament_id}/register", web::post().to(tournaments::register))
            .route("/tournaments/{tournament_id}/unregister", web::post().to(tournaments::unregister))
            .route("/tournaments/{tournament_id}/cancel", web::post().to(tournaments::cancel))
            .route("/tournaments/{tournament_id}/standings", web::get().to(tournaments::standings))
            .route("/matchmaking/enqueue", web::post().to(matchmaking::enqueue))
            .route("/matchmaking/leave", web::post().to(matchmaking::leave))
    })
    .workers(4)
    .bind(std::env::var("BIND_ADDR").expect("BIND_ADDR must be set"))?
    .run()
    .await
}
