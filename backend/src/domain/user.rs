//! User accounts and their identity primitives.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::labels::labelled_enum;

/// Validation failures for identity primitives.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    #[error("user id must be a valid UUID")]
    InvalidId,
    #[error("email must not be empty")]
    EmptyEmail,
    #[error("email address is malformed")]
    MalformedEmail,
}

/// Stable user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = String, format = Uuid)]
pub struct UserId(Uuid);

impl UserId {
    /// Parse a textual UUID.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let raw = raw.as_ref();
        if raw.trim() != raw {
            return Err(UserValidationError::InvalidId);
        }
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| UserValidationError::InvalidId)
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Generate a new random identifier.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for UserId {
    type Err = UserValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Normalised email address: trimmed and lower-cased.
///
/// ```
/// use estate_backend::domain::Email;
///
/// let email = Email::new("  A@X.com ").expect("valid");
/// assert_eq!(email.as_ref(), "a@x.com");
/// assert!(Email::new("nope").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String)]
pub struct Email(String);

impl Email {
    /// Validate and normalise an address.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyEmail);
        }
        let mut parts = trimmed.split('@');
        let well_formed = matches!(
            (parts.next(), parts.next(), parts.next()),
            (Some(local), Some(domain), None)
                if !local.is_empty() && !domain.is_empty() && !domain.contains(char::is_whitespace)
        );
        if !well_formed {
            return Err(UserValidationError::MalformedEmail);
        }
        Ok(Self(trimmed.to_lowercase()))
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Email {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

/// Opaque one-way password digest. Never serialised.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wrap a digest produced by a hasher or read from storage.
    #[must_use]
    pub fn new(digest: impl Into<String>) -> Self {
        Self(digest.into())
    }

    /// Encoded digest.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(..)")
    }
}

labelled_enum! {
    /// Account role. Decides which route tiers accept the account.
    pub enum Role {
        SuperAdmin => "superadmin",
        Admin => "admin",
        Customer => "customer",
        Investor => "investor",
        Vendor => "vendor",
        Broker => "broker",
        User => "user",
        Partner => "partner",
    }
}

impl Role {
    /// Vendors and brokers need a RERA id and an admin-approved application.
    #[must_use]
    pub const fn requires_verification(self) -> bool {
        matches!(self, Self::Vendor | Self::Broker)
    }

    /// Roles that only an existing administrator can grant.
    #[must_use]
    pub const fn is_administrative(self) -> bool {
        matches!(self, Self::Admin | Self::SuperAdmin)
    }
}

impl Default for Role {
    fn default() -> Self {
        Self::Customer
    }
}

labelled_enum! {
    /// Account lifecycle status.
    pub enum UserStatus {
        Active => "active",
        Inactive => "inactive",
        Pending => "pending",
    }
}

impl Default for UserStatus {
    fn default() -> Self {
        Self::Pending
    }
}

/// Stored user account. The password hash is never part of the JSON form.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    #[serde(skip)]
    pub password_hash: PasswordHash,
    pub role: Role,
    pub status: UserStatus,
    pub verified: bool,
    pub is_email_verified: bool,
    pub is_rera_verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rera_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields needed to materialise a user account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: Email,
    pub password_hash: PasswordHash,
    pub role: Role,
    pub status: UserStatus,
    pub verified: bool,
    pub is_email_verified: bool,
    pub is_rera_verified: bool,
    pub rera_id: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
}

impl NewUser {
    /// Stamp identity and timestamps onto the new account.
    #[must_use]
    pub fn into_user(self, id: UserId, now: DateTime<Utc>) -> User {
        User {
            id,
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            role: self.role,
            status: self.status,
            verified: self.verified,
            is_email_verified: self.is_email_verified,
            is_rera_verified: self.is_rera_verified,
            rera_id: self.rera_id,
            avatar: None,
            phone: self.phone,
            company: self.company,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update applied by administrators or by the account holder.
///
/// Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPatch {
    pub role: Option<Role>,
    pub status: Option<UserStatus>,
    pub verified: Option<bool>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub avatar: Option<String>,
    pub password_hash: Option<PasswordHash>,
}

impl UserPatch {
    /// True when no field would change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply the present fields to `user`.
    pub fn apply(self, user: &mut User, now: DateTime<Utc>) {
        if let Some(role) = self.role {
            user.role = role;
        }
        if let Some(status) = self.status {
            user.status = status;
        }
        if let Some(verified) = self.verified {
            user.verified = verified;
        }
        if let Some(name) = self.name {
            user.name = name;
        }
        if let Some(phone) = self.phone {
            user.phone = Some(phone);
        }
        if let Some(company) = self.company {
            user.company = Some(company);
        }
        if let Some(avatar) = self.avatar {
            user.avatar = Some(avatar);
        }
        if let Some(hash) = self.password_hash {
            user.password_hash = hash;
        }
        user.updated_at = now;
    }
}
