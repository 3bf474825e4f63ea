//! Port for pushing notifications to connected clients.

use crate::domain::{Notification, UserId};

use super::define_port_error;

define_port_error! {
    /// Push failures.
    pub enum PublishError {
        /// The notification could not be encoded.
        Encode { message: String } => "notification encoding failed: {message}",
    }
}

/// Fan a notification out to the `user_<id>` channel.
#[cfg_attr(test, mockall::automock)]
pub trait NotificationPublisher: Send + Sync {
    /// Returns how many live connections received the event.
    fn publish(&self, user_id: &UserId, notification: &Notification) -> Result<usize, PublishError>;
}

/// Channel name for a user.
#[must_use]
pub fn user_channel(user_id: &UserId) -> String {
    format!("user_{user_id}")
}
