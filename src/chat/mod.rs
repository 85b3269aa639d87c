//! Real-time chat
//!
//! - [`ChatPanel`]: the sidebar state machine (open/close, live inserts, send)
//! - [`ChatRoom`] / [`ChatPreview`]: the one owned message list and its read-only views
//! - [`format_age`]: timestamp labels

mod format;
mod panel;
mod room;

pub use format::format_age;
pub use panel::{compose_message, ChatPanel, DEFAULT_HISTORY_LIMIT};
pub use room::{ChatPreview, ChatRoom};

use crate::store::StoreError;
use thiserror::Error;

/// Chat errors
#[derive(Debug, Error)]
pub enum ChatError {
    /// The action needs a signed-in user
    #[error("{0}")]
    LoginRequired(&'static str),

    #[error("Message cannot be empty")]
    EmptyMessage,

    #[error(transparent)]
    Store(#[from] StoreError),
}
