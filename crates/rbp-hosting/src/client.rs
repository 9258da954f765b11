use rbp_auth::Member;
use rbp_core::ID;
use rbp_gameroom::ClientMessage;
use rbp_gameroom::Room;
use std::sync::Arc;
use tokio::sync::mpsc::unbounded_channel;
use uuid::Uuid;

/// Bridges one WebSocket connection to a [`Room`].
///
/// Mirrors the teacher's select-loop discipline: a message from the room's
/// outbound channel and a frame from the socket are both just another
/// branch of the same `tokio::select!`, so neither direction can starve the
/// other and the task exits cleanly the moment either side closes.
pub async fn serve(room: Arc<Room>, user: Option<ID<Member>>, mut session: actix_ws::Session, mut stream: actix_ws::MessageStream) {
    use futures::StreamExt;

    let conn_id = Uuid::now_v7();
    let (tx, mut rx) = unbounded_channel::<String>();
    room.subscribe(conn_id, user, tx).await;
    log::debug!("[bridge {}] connection {} attached", room.id(), conn_id);

    'bridge: loop {
        tokio::select! {
            biased;
            outgoing = rx.recv() => match outgoing {
                Some(json) => if session.text(json).await.is_err() {
                    break 'bridge;
                },
                None => break 'bridge,
            },
            incoming = stream.next() => match incoming {
                Some(Ok(actix_ws::Message::Text(text))) => dispatch(&room, user, &text).await,
                Some(Ok(actix_ws::Message::Close(_))) => break 'bridge,
                Some(Err(_)) | None => break 'bridge,
                _ => continue 'bridge,
            },
        }
    }

    room.unsubscribe(conn_id).await;
    log::debug!("[bridge {}] connection {} detached", room.id(), conn_id);
    let _ = session.close(None).await;
}

async fn dispatch(room: &Arc<Room>, user: Option<ID<Member>>, text: &str) {
    let message: ClientMessage = match serde_json::from_str(text) {
        Ok(m) => m,
        Err(e) => {
            log::warn!("[bridge {}] malformed client message: {}", room.id(), e);
            return;
        }
    };
    match message {
        ClientMessage::SubscribeTable { .. } => {
            // Re-subscribing mid-connection is a resync request (spec.md §5
            // "a gap triggers a state resync"); the initial subscribe call
            // already delivered one snapshot, so just send another.
            if let Some(user) = user {
                room.resync(user).await;
            }
        }
        ClientMessage::GameAction { action, request_id, .. } => {
            let Some(user) = user else {
                return;
            };
            if let Err(err) = room.handle_action(user, action, request_id.clone()).await {
                room.reject(user, err.code(), &err.to_string(), request_id).await;
            }
        }
        ClientMessage::ChatMessage { text, .. } => {
            room.relay_chat(user, text).await;
        }
    }
}
