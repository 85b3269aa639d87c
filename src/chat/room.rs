//! Shared chat state
//!
//! A [`ChatRoom`] owns the message list and publishes every change over a
//! `tokio::sync::watch` channel. [`ChatPreview`] handles read the same list,
//! so the sidebar and any preview never diverge.

use tokio::sync::watch;

use crate::store::ChatMessage;

/// The single owned chat message list
#[derive(Debug)]
pub struct ChatRoom {
    tx: watch::Sender<Vec<ChatMessage>>,
}

impl Default for ChatRoom {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatRoom {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Vec::new());
        Self { tx }
    }

    /// Insert one message in creation-time order
    ///
    /// Returns `false` when a message with the same id is already present.
    pub fn insert(&self, message: ChatMessage) -> bool {
        let mut inserted = false;
        self.tx.send_modify(|messages| {
            inserted = insert_ordered(messages, message);
        });
        inserted
    }

    /// Merge a batch, skipping ids already present; returns how many were new
    pub fn merge(&self, batch: Vec<ChatMessage>) -> usize {
        let mut added = 0;
        self.tx.send_modify(|messages| {
            for message in batch {
                if insert_ordered(messages, message) {
                    added += 1;
                }
            }
        });
        added
    }

    /// Replace the whole list
    pub fn replace(&self, mut messages: Vec<ChatMessage>) {
        messages.sort_by_key(|m| m.created_at);
        messages.dedup_by(|a, b| a.id == b.id);
        self.tx.send_replace(messages);
    }

    pub fn clear(&self) {
        self.tx.send_replace(Vec::new());
    }

    /// Copy of the current list, oldest first
    pub fn snapshot(&self) -> Vec<ChatMessage> {
        self.tx.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.tx.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.borrow().is_empty()
    }

    /// A read-only view that follows this room
    pub fn preview(&self) -> ChatPreview {
        ChatPreview {
            rx: self.tx.subscribe(),
        }
    }
}

fn insert_ordered(messages: &mut Vec<ChatMessage>, message: ChatMessage) -> bool {
    if messages.iter().any(|m| m.id == message.id) {
        return false;
    }
    // Equal timestamps keep arrival order
    let at = messages.partition_point(|m| m.created_at <= message.created_at);
    messages.insert(at, message);
    true
}

/// Read-only handle on a [`ChatRoom`]
#[derive(Debug, Clone)]
pub struct ChatPreview {
    rx: watch::Receiver<Vec<ChatMessage>>,
}

impl ChatPreview {
    /// The newest `n` messages, oldest first
    pub fn latest(&self, n: usize) -> Vec<ChatMessage> {
        let messages = self.rx.borrow();
        let start = messages.len().saturating_sub(n);
        messages[start..].to_vec()
    }

    pub fn len(&self) -> usize {
        self.rx.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.borrow().is_empty()
    }

    /// Wait until the room changes
    ///
    /// Returns `false` once the room has been dropped.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}
