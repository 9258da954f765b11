use actix_web::HttpResponse;
use actix_web::Responder;
use actix_web::web;
use rbp_auth::Auth;
use rbp_matchmaking::Coordinator;
use rbp_tournament::MutexMap;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct EnqueueRequest {
    queue_type: String,
}

/// `POST /matchmaking/enqueue` (spec.md §4.5 `Enqueue`).
pub async fn enqueue(coordinator: web::Data<Arc<Coordinator<MutexMap>>>, auth: Auth, body: web::Json<EnqueueRequest>) -> impl Responder {
    match coordinator.enqueue(auth.user(), &body.queue_type).await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({ "status": "queued" })),
        Err(e) => HttpResponse::BadRequest().body(e.to_string()),
    }
}

/// `POST /matchmaking/leave` (spec.md §4.5 `Leave`).
pub async fn leave(coordinator: web::Data<Arc<Coordinator<MutexMap>>>, auth: Auth) -> impl Responder {
    match coordinator.leave(auth.user()).await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({ "status": "left" })),
        Err(e) => HttpResponse::BadRequest().body(e.to_string()),
    }
}
