//! Port abstraction for one-time passcode storage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Email, OtpPurpose, OtpRecord};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by OTP repository adapters.
    pub enum OtpRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "otp repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "otp repository query failed: {message}",
    }
}

/// Storage for issued codes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OtpRepository: Send + Sync {
    /// Delete every code for the record's (email, purpose) pair, then store
    /// the record.
    async fn replace(&self, record: &OtpRecord) -> Result<(), OtpRepositoryError>;

    /// The unexpired code for a pair, if one exists.
    async fn find_live(
        &self,
        email: &Email,
        purpose: OtpPurpose,
        now: DateTime<Utc>,
    ) -> Result<Option<OtpRecord>, OtpRepositoryError>;

    /// Bump the failed-attempt counter and return the new value.
    async fn increment_attempts(&self, id: &Uuid) -> Result<u32, OtpRepositoryError>;

    /// Remove a code.
    async fn delete(&self, id: &Uuid) -> Result<(), OtpRepositoryError>;
}
