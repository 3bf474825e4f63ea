//! Issue and check one-time passcodes.

use std::sync::Arc;

use mockable::Clock;
use serde_json::json;
use tracing::{info, warn};

use super::emails::otp_email;
use super::ports::{MailError, Mailer, OtpRepository, OtpRepositoryError};
use super::{Email, Error, OtpCode, OtpPolicy, OtpPurpose, OtpRecord};

/// OTP workflow failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OtpError {
    #[error("OTP expired or not found")]
    ExpiredOrMissing,
    #[error("Invalid OTP")]
    Mismatch { attempts: u32, max_attempts: u32 },
    #[error("Too many failed attempts. Please request a new OTP")]
    AttemptsExceeded,
    #[error("failed to deliver OTP: {0}")]
    Delivery(#[from] MailError),
    #[error(transparent)]
    Store(#[from] OtpRepositoryError),
}

impl From<OtpError> for Error {
    fn from(err: OtpError) -> Self {
        match err {
            OtpError::ExpiredOrMissing => Self::invalid_request(err.to_string())
                .with_details(json!({ "reason": "otp_expired_or_missing" })),
            OtpError::Mismatch {
                attempts,
                max_attempts,
            } => Self::invalid_request("Invalid OTP").with_details(json!({
                "reason": "otp_mismatch",
                "attemptsRemaining": max_attempts.saturating_sub(attempts),
            })),
            OtpError::AttemptsExceeded => Self::invalid_request(err.to_string())
                .with_details(json!({ "reason": "otp_attempts_exceeded" })),
            OtpError::Delivery(_) => Self::service_unavailable("Failed to send OTP email"),
            OtpError::Store(inner) => inner.into(),
        }
    }
}

/// Issues codes, mails them and validates submissions.
#[derive(Clone)]
pub struct OtpService {
    repo: Arc<dyn OtpRepository>,
    mailer: Arc<dyn Mailer>,
    clock: Arc<dyn Clock>,
    policy: OtpPolicy,
}

impl OtpService {
    pub fn new(
        repo: Arc<dyn OtpRepository>,
        mailer: Arc<dyn Mailer>,
        clock: Arc<dyn Clock>,
        policy: OtpPolicy,
    ) -> Self {
        Self {
            repo,
            mailer,
            clock,
            policy,
        }
    }

    /// Replace any outstanding code for the pair and mail a fresh one.
    ///
    /// The stored record survives a delivery failure; the caller sees the
    /// failure and can ask again, which supersedes it.
    pub async fn issue(&self, email: &Email, purpose: OtpPurpose) -> Result<OtpRecord, OtpError> {
        let code = OtpCode::generate(&mut rand::thread_rng());
        let record = self
            .policy
            .record(email.clone(), code, purpose, self.clock.utc());
        self.repo.replace(&record).await?;

        let message = otp_email(email, &record.code, purpose, self.policy.ttl.num_minutes());
        if let Err(err) = self.mailer.send(&message).await {
            warn!(%email, %purpose, error = %err, "otp email delivery failed");
            return Err(err.into());
        }
        info!(%email, %purpose, "otp issued");
        Ok(record)
    }

    /// Consume a code. Only a matching, live, non-exhausted code succeeds.
    pub async fn verify(
        &self,
        email: &Email,
        code: &OtpCode,
        purpose: OtpPurpose,
    ) -> Result<(), OtpError> {
        let now = self.clock.utc();
        let Some(record) = self.repo.find_live(email, purpose, now).await? else {
            return Err(OtpError::ExpiredOrMissing);
        };

        if record.attempts_exhausted() {
            self.repo.delete(&record.id).await?;
            return Err(OtpError::AttemptsExceeded);
        }

        if record.code != *code {
            let attempts = self.repo.increment_attempts(&record.id).await?;
            return Err(OtpError::Mismatch {
                attempts,
                max_attempts: record.max_attempts,
            });
        }

        self.repo.delete(&record.id).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "otp_service_tests.rs"]
mod tests;
