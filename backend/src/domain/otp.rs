//! One-time passcodes for signup and password reset.

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use rand::Rng;
use uuid::Uuid;

use super::Email;
use super::labels::labelled_enum;

/// Number of digits in an issued code.
pub const OTP_DIGITS: usize = 6;

labelled_enum! {
    /// Flow an OTP belongs to. Codes are never valid across purposes.
    pub enum OtpPurpose {
        Signup => "signup",
        PasswordReset => "password-reset",
    }
}

/// Numeric one-time code.
#[derive(Clone, PartialEq, Eq)]
pub struct OtpCode(String);

impl OtpCode {
    /// Draw a uniformly random code of [`OTP_DIGITS`] digits.
    #[must_use]
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let code = (0..OTP_DIGITS)
            .map(|_| char::from(b'0' + rng.gen_range(0..10_u8)))
            .collect();
        Self(code)
    }

    /// Wrap a code read from storage or submitted by a client.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().trim().to_owned())
    }

    /// Digits as text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for OtpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OtpCode(******)")
    }
}

/// Stored OTP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpRecord {
    pub id: Uuid,
    pub email: Email,
    pub code: OtpCode,
    pub purpose: OtpPurpose,
    pub expires_at: DateTime<Utc>,
    pub attempts: u32,
    pub max_attempts: u32,
    pub created_at: DateTime<Utc>,
}

impl OtpRecord {
    /// A record is live until `expires_at`; expired rows are inert.
    #[must_use]
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }

    /// Whether the attempt budget is spent.
    #[must_use]
    pub fn attempts_exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }
}

/// Validity window and attempt budget for issued codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OtpPolicy {
    pub ttl: TimeDelta,
    pub max_attempts: u32,
}

impl OtpPolicy {
    /// Policy from configured minutes and attempt budget.
    #[must_use]
    pub fn new(ttl_minutes: u32, max_attempts: u32) -> Self {
        Self {
            ttl: TimeDelta::minutes(i64::from(ttl_minutes)),
            max_attempts,
        }
    }

    /// Stamp a fresh record for `email` and `purpose`.
    #[must_use]
    pub fn record(
        &self,
        email: Email,
        code: OtpCode,
        purpose: OtpPurpose,
        now: DateTime<Utc>,
    ) -> OtpRecord {
        OtpRecord {
            id: Uuid::new_v4(),
            email,
            code,
            purpose,
            expires_at: now + self.ttl,
            attempts: 0,
            max_attempts: self.max_attempts,
            created_at: now,
        }
    }
}

impl Default for OtpPolicy {
    fn default() -> Self {
        Self::new(10, 5)
    }
}
