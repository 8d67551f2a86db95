//! Realtime push channel.
//!
//! The hub owns one broadcast channel shared by all WebSocket connections and a session table
//! mapping each live connection to the user registered on it. Online users are derived from
//! that table, so they disappear as soon as their last connection closes.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

pub const ONLINE_USERS_EVENT: &str = "online-users";

/// Frame pushed to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerMessage {
    pub event: String,
    pub data: Value,
}

impl ServerMessage {
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }
}

/// Frame sent by clients.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientMessage {
    Register(RegisterPayload),
    GetOnlineUsers,
}

/// `register` accepts either a bare user id or `{ "userId": ... }`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RegisterPayload {
    Id(String),
    Object {
        #[serde(rename = "userId")]
        user_id: String,
    },
}

impl RegisterPayload {
    pub fn user_id(&self) -> &str {
        match self {
            RegisterPayload::Id(id) => id,
            RegisterPayload::Object { user_id } => user_id,
        }
    }
}

pub type SessionId = Uuid;

#[derive(Debug, Clone, Default)]
struct Session {
    user_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RealtimeHub {
    tx: broadcast::Sender<ServerMessage>,
    sessions: Arc<DashMap<SessionId, Session>>,
}

impl RealtimeHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            sessions: Arc::new(DashMap::new()),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServerMessage> {
        self.tx.subscribe()
    }

    /// Sends to every subscriber; returns how many received it.
    pub fn publish(&self, message: ServerMessage) -> usize {
        if self.tx.receiver_count() == 0 {
            return 0;
        }
        self.tx.send(message).unwrap_or(0)
    }

    pub fn connect(&self) -> SessionId {
        let id = Uuid::new_v4();
        self.sessions.insert(id, Session::default());
        debug!(session = %id, "realtime session opened");
        id
    }

    /// Binds `user_id` to the session and rebroadcasts the online list.
    pub fn register(&self, session: SessionId, user_id: impl Into<String>) {
        if let Some(mut entry) = self.sessions.get_mut(&session) {
            entry.user_id = Some(user_id.into());
        }
        self.broadcast_online_users();
    }

    pub fn disconnect(&self, session: SessionId) {
        if self.sessions.remove(&session).is_some() {
            debug!(session = %session, "realtime session closed");
            self.broadcast_online_users();
        }
    }

    /// Distinct registered user ids, sorted.
    pub fn online_users(&self) -> Vec<String> {
        let mut users: Vec<String> = self
            .sessions
            .iter()
            .filter_map(|entry| entry.value().user_id.clone())
            .collect();
        users.sort();
        users.dedup();
        users
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn online_users_message(&self) -> ServerMessage {
        ServerMessage::new(ONLINE_USERS_EVENT, serde_json::json!(self.online_users()))
    }

    pub fn broadcast_online_users(&self) {
        self.publish(self.online_users_message());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn client_messages_parse() {
        let register: ClientMessage =
            serde_json::from_value(json!({"event": "register", "data": "u-1"})).unwrap();
        assert_eq!(
            register,
            ClientMessage::Register(RegisterPayload::Id("u-1".into()))
        );

        let object: ClientMessage =
            serde_json::from_value(json!({"event": "register", "data": {"userId": "u-2"}}))
                .unwrap();
        match object {
            ClientMessage::Register(payload) => assert_eq!(payload.user_id(), "u-2"),
            other => panic!("unexpected {other:?}"),
        }

        let online: ClientMessage =
            serde_json::from_value(json!({"event": "get-online-users"})).unwrap();
        assert_eq!(online, ClientMessage::GetOnlineUsers);
    }

    #[tokio::test]
    async fn sessions_drive_online_users() {
        let hub = RealtimeHub::new(16);
        let mut rx = hub.subscribe();

        let a = hub.connect();
        let b = hub.connect();
        hub.register(a, "alice");
        hub.register(b, "alice");
        assert_eq!(hub.online_users(), vec!["alice".to_string()]);

        let first = rx.recv().await.unwrap();
        assert_eq!(first.event, ONLINE_USERS_EVENT);

        hub.disconnect(a);
        assert_eq!(hub.online_users(), vec!["alice".to_string()]);
        hub.disconnect(b);
        assert!(hub.online_users().is_empty());
        assert_eq!(hub.session_count(), 0);
    }

    #[test]
    fn publish_without_subscribers_is_a_no_op() {
        let hub = RealtimeHub::new(4);
        assert_eq!(hub.publish(ServerMessage::new("x", Value::Null)), 0);
    }
}
