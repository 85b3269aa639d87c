//! WebSocket Handler
//!
//! Handles WebSocket upgrade requests and manages the connection lifecycle.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::mpsc;

use super::hub::ConnectionHub;
use super::messages::{ClientMessage, ServerMessage};
use crate::api::{ApiError, AppState};
use crate::auth::AuthUser;

/// `GET /ws` query parameters
#[derive(Debug, Default, Deserialize)]
pub struct WsParams {
    /// Bearer token; browsers cannot set headers on a WebSocket handshake
    pub token: Option<String>,
}

/// WebSocket upgrade handler
///
/// An unknown token is refused before the upgrade; no token opens an
/// anonymous socket limited to public channels.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(params): Query<WsParams>,
) -> Result<Response, ApiError> {
    let user = match params.token.as_deref() {
        Some(token) => Some(
            state
                .sessions
                .resolve(token)
                .cloned()
                .ok_or_else(|| ApiError::Unauthorized("Invalid token".to_string()))?,
        ),
        None => None,
    };

    let hub = Arc::clone(&state.ws_hub);
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, hub, user)))
}

fn encode(message: &ServerMessage) -> Option<Message> {
    match serde_json::to_string(message) {
        Ok(text) => Some(Message::Text(text)),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize message");
            None
        }
    }
}

/// Handle an established WebSocket connection
async fn handle_socket(socket: WebSocket, hub: Arc<ConnectionHub>, user: Option<AuthUser>) {
    let (mut sender, mut receiver) = socket.split();

    // Create channel for sending messages to this connection
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    let authenticated = user.is_some();

    let connection_id = match hub.register(tx, user).await {
        Ok(id) => id,
        Err(e) => {
            tracing::error!(error = %e, "Failed to register WebSocket connection");
            let error_msg = ServerMessage::Error {
                message: e.to_string(),
            };
            if let Some(msg) = encode(&error_msg) {
                let _ = sender.send(msg).await;
            }
            return;
        }
    };

    let connected_msg = ServerMessage::Connected {
        connection_id: connection_id.clone(),
        authenticated,
    };
    let sent = match encode(&connected_msg) {
        Some(msg) => sender.send(msg).await.is_ok(),
        None => false,
    };
    if !sent {
        tracing::error!(connection_id = %connection_id, "Failed to send connected message");
        hub.unregister(&connection_id).await;
        return;
    }

    let conn_id_for_send = connection_id.clone();

    // Task to forward messages from channel to WebSocket
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let Some(frame) = encode(&msg) else {
                continue;
            };
            if sender.send(frame).await.is_err() {
                tracing::debug!(
                    connection_id = %conn_id_for_send,
                    "WebSocket send failed, closing connection"
                );
                break;
            }
        }
    });

    let hub_for_recv = Arc::clone(&hub);
    let conn_id_for_recv = connection_id.clone();

    // Task to receive messages from WebSocket and handle them
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(msg) => {
                    if !handle_ws_message(&hub_for_recv, &conn_id_for_recv, msg).await {
                        break;
                    }
                }
                Err(e) => {
                    tracing::debug!(
                        connection_id = %conn_id_for_recv,
                        error = %e,
                        "WebSocket receive error"
                    );
                    break;
                }
            }
        }
    });

    // Wait for either task to complete
    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
        }
        _ = &mut recv_task => {
            send_task.abort();
        }
    }

    // Cleanup: unregister releases every channel subscription
    hub.unregister(&connection_id).await;
}

/// Handle a received WebSocket message
///
/// Returns false if the connection should be closed.
async fn handle_ws_message(hub: &ConnectionHub, connection_id: &str, message: Message) -> bool {
    match message {
        Message::Text(text) => {
            match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_msg) => {
                    let reply = handle_client_message(hub, connection_id, client_msg).await;
                    let _ = hub.send_to(connection_id, reply).await;
                }
                Err(e) => {
                    tracing::debug!(
                        connection_id = %connection_id,
                        error = %e,
                        "Invalid client message"
                    );
                    let error_msg = ServerMessage::Error {
                        message: format!("Invalid message format: {}", e),
                    };
                    let _ = hub.send_to(connection_id, error_msg).await;
                }
            }
            true
        }
        Message::Binary(_) => {
            let error_msg = ServerMessage::Error {
                message: "Binary messages not supported".to_string(),
            };
            let _ = hub.send_to(connection_id, error_msg).await;
            true
        }
        // Axum answers pings itself
        Message::Ping(_) | Message::Pong(_) => true,
        Message::Close(_) => {
            tracing::debug!(connection_id = %connection_id, "Client requested close");
            false
        }
    }
}

/// Handle a parsed client message, returning the reply
async fn handle_client_message(
    hub: &ConnectionHub,
    connection_id: &str,
    message: ClientMessage,
) -> ServerMessage {
    let result = match message {
        ClientMessage::Subscribe { channels } => hub
            .subscribe(connection_id, &channels)
            .await
            .map(|channels| ServerMessage::Subscribed { channels }),
        ClientMessage::Unsubscribe { channels } => hub
            .unsubscribe(connection_id, &channels)
            .await
            .map(|channels| ServerMessage::Unsubscribed { channels }),
        ClientMessage::Ping => Ok(ServerMessage::Pong),
    };

    result.unwrap_or_else(|e| {
        tracing::warn!(connection_id = %connection_id, error = %e, "WebSocket request rejected");
        ServerMessage::Error {
            message: e.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DataStore, Table};
    use crate::websocket::hub::HubConfig;

    async fn connected() -> (ConnectionHub, String, mpsc::UnboundedReceiver<ServerMessage>) {
        let store = Arc::new(DataStore::in_memory().unwrap());
        let hub = ConnectionHub::new(HubConfig::default(), store);
        let (tx, rx) = mpsc::unbounded_channel();
        let id = hub.register(tx, None).await.unwrap();
        (hub, id, rx)
    }

    #[tokio::test]
    async fn test_ping_pong() {
        let (hub, id, mut rx) = connected().await;

        assert!(handle_ws_message(&hub, &id, Message::Text(r#"{"type":"ping"}"#.into())).await);
        assert!(matches!(rx.recv().await, Some(ServerMessage::Pong)));
    }

    #[tokio::test]
    async fn test_subscribe_reply() {
        let (hub, id, mut rx) = connected().await;

        let text = r#"{"type":"subscribe","channels":["feed_topics"]}"#;
        handle_ws_message(&hub, &id, Message::Text(text.into())).await;

        match rx.recv().await {
            Some(ServerMessage::Subscribed { channels }) => {
                assert_eq!(channels, vec![Table::FeedTopics])
            }
            other => panic!("Expected Subscribed, got {:?}", other),
        }
        hub.unregister(&id).await;
    }

    #[tokio::test]
    async fn test_anonymous_chat_subscribe_gets_error() {
        let (hub, id, mut rx) = connected().await;

        let text = r#"{"type":"subscribe","channels":["chat_messages"]}"#;
        handle_ws_message(&hub, &id, Message::Text(text.into())).await;

        match rx.recv().await {
            Some(ServerMessage::Error { message }) => {
                assert_eq!(message, "Please login to subscribe to chat_messages")
            }
            other => panic!("Expected Error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_json_keeps_connection() {
        let (hub, id, mut rx) = connected().await;

        assert!(handle_ws_message(&hub, &id, Message::Text("not json".into())).await);
        assert!(matches!(rx.recv().await, Some(ServerMessage::Error { .. })));
    }

    #[tokio::test]
    async fn test_close_ends_connection() {
        let (hub, id, _rx) = connected().await;
        assert!(!handle_ws_message(&hub, &id, Message::Close(None)).await);
    }
}
