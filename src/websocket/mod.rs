//! WebSocket Live Channels
//!
//! Streams row inserts to remote clients.
//!
//! ## Architecture
//!
//! - **ConnectionHub**: Manages connections and their channel subscriptions
//! - **Handler**: Handles WebSocket upgrade and message processing
//! - **Messages**: Defines client and server message formats
//!
//! ## Usage
//!
//! Clients connect to `/api/v1/ws?token=...` and subscribe to channels:
//! - `articles` - New articles
//! - `feed_topics` - New topics
//! - `chat_messages` - New chat messages (needs a token)
//!
//! ## Example
//!
//! ```javascript
//! // Browser
//! const ws = new WebSocket('ws://localhost:8082/api/v1/ws?token=secret');
//!
//! ws.onopen = () => {
//!   ws.send(JSON.stringify({type: 'subscribe', channels: ['chat_messages']}));
//! };
//!
//! ws.onmessage = (event) => {
//!   const msg = JSON.parse(event.data);
//!   if (msg.type === 'insert') console.log(msg.channel, msg.record);
//! };
//! ```

mod handler;
mod hub;
mod messages;

pub use handler::{websocket_handler, WsParams};
pub use hub::{ConnectionHub, ConnectionId, HubConfig, HubError};
pub use messages::{ClientMessage, ServerMessage};
