//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use std::sync::Arc;
use std::time::Instant;

use crate::analytics::Dataset;
use crate::auth::SessionRegistry;
use crate::config::{ApiConfig, ChatConfig, Config};
use crate::store::DataStore;
use crate::websocket::{ConnectionHub, HubConfig};

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Tables and live channels
    pub store: Arc<DataStore>,
    /// Read-only deals dataset for the analytics routes
    pub dataset: Arc<Dataset>,
    /// Bearer token lookup
    pub sessions: Arc<SessionRegistry>,
    /// API configuration
    pub config: Arc<ApiConfig>,
    pub chat: Arc<ChatConfig>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
    /// WebSocket connection hub for live channels
    pub ws_hub: Arc<ConnectionHub>,
}

impl AppState {
    pub fn new(
        store: Arc<DataStore>,
        dataset: Arc<Dataset>,
        sessions: SessionRegistry,
        config: ApiConfig,
        chat: ChatConfig,
    ) -> Self {
        let hub_config = HubConfig {
            max_connections: config.max_ws_connections,
        };

        Self {
            ws_hub: Arc::new(ConnectionHub::new(hub_config, Arc::clone(&store))),
            store,
            dataset,
            sessions: Arc::new(sessions),
            config: Arc::new(config),
            chat: Arc::new(chat),
            start_time: Instant::now(),
        }
    }

    /// Build state from the loaded configuration
    pub fn from_config(store: Arc<DataStore>, dataset: Arc<Dataset>, config: &Config) -> Self {
        Self::new(
            store,
            dataset,
            SessionRegistry::from_entries(&config.auth.users),
            config.api.clone(),
            config.chat.clone(),
        )
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Get WebSocket connection count
    pub async fn ws_connection_count(&self) -> usize {
        self.ws_hub.connection_count().await
    }
}
