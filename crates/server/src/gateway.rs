//! WebSocket gateway to the membership notifier.
//!
//! The client passes its bearer token as `?token=`. Once connected, every
//! notifier event addressed to the session is forwarded as a JSON text
//! frame. Incoming frames are ignored until the client closes.

use axum::{
    extract::{
        Query, State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use engine::OutboundEvent;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;

use crate::server::ServerState;

#[derive(Deserialize)]
pub struct ConnectParams {
    #[serde(default)]
    token: String,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    State(state): State<ServerState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, params.token, state))
}

fn encode(event: &OutboundEvent) -> Option<Message> {
    match serde_json::to_string(event) {
        Ok(text) => Some(Message::Text(text.into())),
        Err(err) => {
            tracing::error!("cannot encode event {}: {err}", event.event);
            None
        }
    }
}

async fn handle_socket(mut socket: WebSocket, token: String, state: ServerState) {
    let mut session = match state
        .engine
        .connect_session(&token, state.jwt.as_ref())
        .await
    {
        Ok(session) => session,
        Err(err) => {
            tracing::info!("websocket connection refused: {err}");
            if let Some(message) = err.close_event().as_ref().and_then(encode) {
                let _ = socket.send(message).await;
            }
            let _ = socket.send(Message::Close(None)).await;
            return;
        }
    };

    tracing::debug!(
        "session {} connected for member {}",
        session.id(),
        session.member_id()
    );

    let (mut sender, mut receiver) = socket.split();
    loop {
        tokio::select! {
            event = session.recv() => {
                let Some(event) = event else { break };
                let Some(message) = encode(&event) else { continue };
                if sender.send(message).await.is_err() {
                    break;
                }
            }
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    state.engine.disconnect_session(&mut session);
    tracing::debug!("session {} disconnected", session.id());
}
