//! In-process fan-out of notifications to WebSocket connections.
//!
//! Each connection owns an unbounded receiver; the hub keeps the matching
//! senders grouped by channel name (`user_<id>`). Senders whose receiver has
//! gone away are dropped on the next publish to that channel.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use serde::Serialize;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::debug;
use uuid::Uuid;

use crate::domain::Notification;
use crate::domain::UserId;
use crate::domain::ports::{NotificationPublisher, PublishError, user_channel};

/// Identifies one WebSocket connection across all of its channels.
pub type ConnectionId = Uuid;

#[derive(Serialize)]
struct NotificationFrame<'a> {
    event: &'static str,
    notification: &'a Notification,
}

type Members = Vec<(ConnectionId, UnboundedSender<String>)>;

/// Channel registry shared by every connection.
#[derive(Default)]
pub struct NotificationHub {
    channels: Mutex<HashMap<String, Members>>,
}

impl NotificationHub {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Members>> {
        match self.channels.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Open the outbound queue for a new connection.
    #[must_use]
    pub fn connect() -> (ConnectionId, UnboundedSender<String>, UnboundedReceiver<String>) {
        let (tx, rx) = unbounded_channel();
        (Uuid::new_v4(), tx, rx)
    }

    /// Add a connection to a channel. Joining twice is a no-op.
    pub fn join(&self, channel: &str, connection: ConnectionId, sender: UnboundedSender<String>) {
        let mut channels = self.lock();
        let members = channels.entry(channel.to_owned()).or_default();
        if !members.iter().any(|(id, _)| *id == connection) {
            members.push((connection, sender));
            debug!(channel, %connection, "joined channel");
        }
    }

    /// Remove a connection from every channel it joined.
    pub fn leave(&self, connection: ConnectionId) {
        let mut channels = self.lock();
        channels.retain(|_, members| {
            members.retain(|(id, _)| *id != connection);
            !members.is_empty()
        });
    }

    /// Deliver a text frame to every live member; returns the delivery count.
    pub fn send(&self, channel: &str, frame: &str) -> usize {
        let mut channels = self.lock();
        let Some(members) = channels.get_mut(channel) else {
            return 0;
        };
        members.retain(|(_, sender)| sender.send(frame.to_owned()).is_ok());
        let delivered = members.len();
        if members.is_empty() {
            channels.remove(channel);
        }
        delivered
    }

    /// Live member count for a channel.
    #[must_use]
    pub fn members(&self, channel: &str) -> usize {
        self.lock().get(channel).map_or(0, Vec::len)
    }
}

impl NotificationPublisher for NotificationHub {
    fn publish(&self, user_id: &UserId, notification: &Notification) -> Result<usize, PublishError> {
        let frame = serde_json::to_string(&NotificationFrame {
            event: "notification",
            notification,
        })
        .map_err(|err| PublishError::encode(err.to_string()))?;
        Ok(self.send(&user_channel(user_id), &frame))
    }
}
