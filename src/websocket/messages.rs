//! WebSocket Message Types
//!
//! Defines all message types exchanged between live clients and the
//! Safar server.

use serde::{Deserialize, Serialize};

use crate::store::{Row, RowEvent, Table};

/// Messages sent from client to server
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Start receiving inserts on channels
    Subscribe {
        /// Channel names (`articles`, `chat_messages`, `feed_topics`)
        channels: Vec<String>,
    },
    /// Stop receiving inserts on channels
    Unsubscribe { channels: Vec<String> },
    /// Ping for keepalive
    Ping,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Connection established
    Connected {
        connection_id: String,
        /// Whether the socket carries a session
        authenticated: bool,
    },
    /// Subscription confirmed
    Subscribed { channels: Vec<Table> },
    /// Unsubscription confirmed
    Unsubscribed { channels: Vec<Table> },
    /// A row was inserted
    Insert { channel: Table, record: Row },
    /// Pong response to ping
    Pong,
    /// Error message
    Error { message: String },
}

impl From<RowEvent> for ServerMessage {
    fn from(event: RowEvent) -> Self {
        ServerMessage::Insert {
            channel: event.table,
            record: event.record,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ChatMessage;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_client_message_deserialize_subscribe() {
        let json = r#"{"type": "subscribe", "channels": ["chat_messages", "articles"]}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        match msg {
            ClientMessage::Subscribe { channels } => {
                assert_eq!(channels, vec!["chat_messages", "articles"]);
            }
            _ => panic!("Expected Subscribe"),
        }
    }

    #[test]
    fn test_client_message_deserialize_ping() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type": "ping"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Ping));
    }

    #[test]
    fn test_client_message_rejects_unknown_type() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type": "shout"}"#).is_err());
    }

    #[test]
    fn test_server_message_serialize_insert() {
        let event = RowEvent::insert(Row::ChatMessage(ChatMessage {
            id: "m1".to_string(),
            user_id: "u1".to_string(),
            user_name: "Asha".to_string(),
            message: "hello".to_string(),
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        }));

        let json = serde_json::to_value(ServerMessage::from(event)).unwrap();
        assert_eq!(json["type"], "insert");
        assert_eq!(json["channel"], "chat_messages");
        assert_eq!(json["record"]["id"], "m1");
        assert_eq!(json["record"]["user_name"], "Asha");
    }

    #[test]
    fn test_server_message_serialize_connected() {
        let msg = ServerMessage::Connected {
            connection_id: "abc-123".to_string(),
            authenticated: false,
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"connected\""));
        assert!(json.contains("\"connection_id\":\"abc-123\""));
        assert!(json.contains("\"authenticated\":false"));
    }

    #[test]
    fn test_server_message_serialize_subscribed() {
        let msg = ServerMessage::Subscribed {
            channels: vec![Table::Articles],
        };
        assert_eq!(
            serde_json::to_string(&msg).unwrap(),
            r#"{"type":"subscribed","channels":["articles"]}"#
        );
    }
}
