//! Live insert notifications
//!
//! One broadcast channel per table. A [`Subscription`] is the only way to
//! listen; it counts itself in the active-subscription gauge on creation and
//! removes itself on drop, so every exit path releases it exactly once.

use crate::store::types::{RowEvent, Table};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;

/// Fan-out of row inserts to channel subscribers
pub struct Realtime {
    senders: HashMap<Table, broadcast::Sender<RowEvent>>,
    active: Arc<AtomicUsize>,
}

impl Realtime {
    /// Create channels for every table, each buffering `capacity` events
    pub fn new(capacity: usize) -> Self {
        let senders = Table::all()
            .iter()
            .map(|table| (*table, broadcast::channel(capacity.max(1)).0))
            .collect();

        Self {
            senders,
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Start listening for inserts into `table`
    pub fn subscribe(&self, table: Table) -> Subscription {
        let rx = self.sender(table).subscribe();
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;

        tracing::debug!(channel = %table, active, "Subscription opened");

        Subscription {
            table,
            rx,
            _guard: ActiveGuard {
                table,
                active: Arc::clone(&self.active),
            },
        }
    }

    /// Deliver an event to every current subscriber of its table
    ///
    /// Returns the number of subscribers reached.
    pub fn publish(&self, event: RowEvent) -> usize {
        let table = event.table;
        match self.sender(table).send(event) {
            Ok(receivers) => {
                tracing::trace!(channel = %table, receivers, "Published insert");
                receivers
            }
            // No subscribers is not an error
            Err(_) => 0,
        }
    }

    /// Number of subscriptions currently alive across all channels
    pub fn active_subscriptions(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Number of receivers attached to one channel
    pub fn subscriber_count(&self, table: Table) -> usize {
        self.sender(table).receiver_count()
    }

    fn sender(&self, table: Table) -> &broadcast::Sender<RowEvent> {
        // Every table gets a sender in `new`
        &self.senders[&table]
    }
}

/// A live subscription to one channel
pub struct Subscription {
    table: Table,
    rx: broadcast::Receiver<RowEvent>,
    _guard: ActiveGuard,
}

impl Subscription {
    pub fn table(&self) -> Table {
        self.table
    }

    /// Wait for the next insert
    pub async fn recv(&mut self) -> Result<RowEvent, SubscriptionError> {
        self.rx.recv().await.map_err(|e| match e {
            broadcast::error::RecvError::Lagged(n) => SubscriptionError::Lagged(n),
            broadcast::error::RecvError::Closed => SubscriptionError::Closed,
        })
    }

    /// Take the next insert if one is already buffered
    pub fn try_recv(&mut self) -> Result<Option<RowEvent>, SubscriptionError> {
        match self.rx.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(broadcast::error::TryRecvError::Empty) => Ok(None),
            Err(broadcast::error::TryRecvError::Lagged(n)) => Err(SubscriptionError::Lagged(n)),
            Err(broadcast::error::TryRecvError::Closed) => Err(SubscriptionError::Closed),
        }
    }
}

struct ActiveGuard {
    table: Table,
    active: Arc<AtomicUsize>,
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        let remaining = self.active.fetch_sub(1, Ordering::SeqCst) - 1;
        tracing::debug!(channel = %self.table, active = remaining, "Subscription released");
    }
}

/// Errors surfaced while reading a subscription
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The subscriber fell behind and missed events
    #[error("Subscriber lagged behind by {0} events")]
    Lagged(u64),

    /// The channel has shut down
    #[error("Channel closed")]
    Closed,
}
