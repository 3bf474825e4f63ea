//! Port for outbound email delivery.

use async_trait::async_trait;

use crate::domain::Email;

use super::define_port_error;

define_port_error! {
    /// Delivery failures.
    pub enum MailError {
        /// No delivery credentials are configured.
        NotConfigured => "email delivery is not configured",
        /// The provider could not be reached.
        Transport { message: String } => "email transport failed: {message}",
        /// The provider refused the message.
        Rejected { status: u16, message: String } => "email provider rejected message ({status}): {message}",
    }
}

/// A plain-text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub to: Email,
    pub subject: String,
    pub body: String,
}

/// Deliver email. Absence of credentials fails the send rather than
/// dropping it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &OutboundEmail) -> Result<(), MailError>;
}
