//! WebSocket endpoint of the realtime channel.
//!
//! Clients connect to `/ws?token=<jwt>` (or send the usual bearer header). Every connection
//! receives all hub broadcasts; `register` binds the authenticated user to the connection and
//! `get-online-users` answers with the current online list on that connection only.

use crate::{
    auth::{bearer_token, AuthError, AuthUser},
    realtime::{ClientMessage, RealtimeHub, ServerMessage, SessionId},
    AppState,
};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

/// Largest client frame accepted
pub const MAX_FRAME_SIZE: usize = 64 * 1024;

#[derive(Debug, Default, Deserialize)]
pub struct WsParams {
    pub token: Option<String>,
}

async fn ws_upgrade(
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Result<Response, AuthError> {
    let token = params
        .token
        .as_deref()
        .or_else(|| bearer_token(&headers))
        .ok_or(AuthError::MissingAuth)?;
    let user = state.auth.authenticate(token)?;
    let hub = state.hub.clone();

    Ok(ws
        .max_message_size(MAX_FRAME_SIZE)
        .on_upgrade(move |socket| handle_socket(socket, hub, user))
        .into_response())
}

fn encode(message: &ServerMessage) -> Option<Message> {
    serde_json::to_string(message).ok().map(Message::Text)
}

/// Outcome of a single client frame.
#[derive(Debug, PartialEq)]
enum Reply {
    None,
    Direct(ServerMessage),
}

fn handle_frame(hub: &RealtimeHub, session: SessionId, user: &AuthUser, text: &str) -> Reply {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(ClientMessage::Register(payload)) => {
            let own_id = user.user_id.to_string();
            if payload.user_id() != own_id {
                warn!(session = %session, claimed = payload.user_id(), "register rejected for foreign user id");
                return Reply::Direct(ServerMessage::new(
                    "error",
                    json!("A connection can only register its own user"),
                ));
            }
            hub.register(session, own_id);
            Reply::None
        }
        Ok(ClientMessage::GetOnlineUsers) => Reply::Direct(hub.online_users_message()),
        Err(e) => {
            debug!(session = %session, error = %e, "unrecognized client frame");
            Reply::Direct(ServerMessage::new("error", json!("Unrecognized message")))
        }
    }
}

async fn handle_socket(socket: WebSocket, hub: RealtimeHub, user: AuthUser) {
    let session = hub.connect();
    info!(session = %session, user_id = %user.user_id, "websocket connected");

    let (mut sink, mut stream) = socket.split();
    let mut broadcasts = hub.subscribe();
    let (direct_tx, mut direct_rx) = mpsc::channel::<ServerMessage>(16);

    let mut writer = tokio::spawn(async move {
        loop {
            let message = tokio::select! {
                direct = direct_rx.recv() => match direct {
                    Some(message) => message,
                    None => break,
                },
                broadcast = broadcasts.recv() => match broadcast {
                    Ok(message) => message,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "websocket client lagging behind broadcasts");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            };
            let Some(frame) = encode(&message) else { continue };
            if sink.send(frame).await.is_err() {
                break;
            }
        }
    });

    let reader_hub = hub.clone();
    let reader_user = user.clone();
    let mut reader = tokio::spawn(async move {
        while let Some(Ok(message)) = stream.next().await {
            let text = match message {
                Message::Text(text) => text,
                Message::Binary(data) => match String::from_utf8(data) {
                    Ok(text) => text,
                    Err(_) => continue,
                },
                Message::Close(_) => break,
                _ => continue,
            };
            if let Reply::Direct(reply) = handle_frame(&reader_hub, session, &reader_user, &text) {
                if direct_tx.send(reply).await.is_err() {
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut writer => reader.abort(),
        _ = &mut reader => writer.abort(),
    }

    hub.disconnect(session);
    info!(session = %session, user_id = %user.user_id, "websocket disconnected");
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/ws", get(ws_upgrade))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::UserRole;
    use crate::realtime::ONLINE_USERS_EVENT;
    use uuid::Uuid;

    fn staff() -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            username: "staff".into(),
            role: UserRole::Staff,
        }
    }

    #[test]
    fn register_binds_own_user() {
        let hub = RealtimeHub::new(8);
        let session = hub.connect();
        let user = staff();
        let frame = json!({"event": "register", "data": user.user_id.to_string()}).to_string();

        assert_eq!(handle_frame(&hub, session, &user, &frame), Reply::None);
        assert_eq!(hub.online_users(), vec![user.user_id.to_string()]);
    }

    #[test]
    fn register_for_other_user_is_rejected() {
        let hub = RealtimeHub::new(8);
        let session = hub.connect();
        let frame = json!({"event": "register", "data": {"userId": "someone-else"}}).to_string();

        let reply = handle_frame(&hub, session, &staff(), &frame);
        assert!(matches!(reply, Reply::Direct(ref m) if m.event == "error"));
        assert!(hub.online_users().is_empty());
    }

    #[test]
    fn get_online_users_answers_directly() {
        let hub = RealtimeHub::new(8);
        let session = hub.connect();
        let frame = json!({"event": "get-online-users"}).to_string();

        match handle_frame(&hub, session, &staff(), &frame) {
            Reply::Direct(message) => assert_eq!(message.event, ONLINE_USERS_EVENT),
            Reply::None => panic!("expected a direct reply"),
        }
    }

    #[test]
    fn garbage_frames_get_an_error() {
        let hub = RealtimeHub::new(8);
        let session = hub.connect();
        let reply = handle_frame(&hub, session, &staff(), "not json");
        assert!(matches!(reply, Reply::Direct(ref m) if m.event == "error"));
    }
}
