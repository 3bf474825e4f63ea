//! Conversions from port errors into the API-facing [`Error`].
//!
//! Connection failures surface as 503 so clients may retry; anything else
//! from a store is an internal fault.

use tracing::debug;

use super::Error;
use super::ports::{
    OtpRepositoryError, RecordRepositoryError, UserRepositoryError, VerificationRepositoryError,
};

impl From<UserRepositoryError> for Error {
    fn from(err: UserRepositoryError) -> Self {
        debug!(error = %err, "user repository failure");
        match err {
            UserRepositoryError::Connection { .. } => {
                Self::service_unavailable("user store unavailable")
            }
            UserRepositoryError::Query { .. } => Self::internal("user store query failed"),
            UserRepositoryError::EmailTaken { .. } => {
                Self::invalid_request("Email is already registered")
            }
        }
    }
}

impl From<OtpRepositoryError> for Error {
    fn from(err: OtpRepositoryError) -> Self {
        debug!(error = %err, "otp repository failure");
        match err {
            OtpRepositoryError::Connection { .. } => {
                Self::service_unavailable("otp store unavailable")
            }
            OtpRepositoryError::Query { .. } => Self::internal("otp store query failed"),
        }
    }
}

impl From<RecordRepositoryError> for Error {
    fn from(err: RecordRepositoryError) -> Self {
        debug!(error = %err, "record repository failure");
        match err {
            RecordRepositoryError::Connection { .. } => {
                Self::service_unavailable("record store unavailable")
            }
            RecordRepositoryError::Query { .. } => Self::internal("record store query failed"),
        }
    }
}

impl From<VerificationRepositoryError> for Error {
    fn from(err: VerificationRepositoryError) -> Self {
        debug!(error = %err, "verification repository failure");
        match err {
            VerificationRepositoryError::Connection { .. } => {
                Self::service_unavailable("verification store unavailable")
            }
            VerificationRepositoryError::Query { .. } => {
                Self::internal("verification store query failed")
            }
            VerificationRepositoryError::NotFound { .. } => {
                Self::not_found("Verification request not found")
            }
            VerificationRepositoryError::AlreadyProcessed { .. } => {
                Self::invalid_request("This verification has already been processed")
            }
            VerificationRepositoryError::EmailTaken { .. } => {
                Self::invalid_request("Email is already registered")
            }
        }
    }
}
