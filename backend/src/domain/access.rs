//! Role-tier authorisation and ownership checks.
//!
//! Routes are guarded by one of three tiers. Which tiers a role satisfies is
//! decided by [`Role::tiers`] alone so that adding a role is a single edit.
//! Ownership-scoped resources apply a second, narrower rule through
//! [`Principal::can_access_owned`].

use tracing::debug;

use super::ports::UserRepository;
use super::{Error, Role, UserId};

/// Route guard tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessTier {
    /// Any signed-in account.
    Authenticated,
    /// Administrators and super administrators.
    Admin,
    /// Super administrators only.
    SuperAdmin,
}

impl AccessTier {
    /// Whether `role` passes this tier.
    #[must_use]
    pub fn admits(self, role: Role) -> bool {
        role.tiers().contains(&self)
    }

    /// Message returned when an authenticated caller falls short.
    #[must_use]
    pub const fn denial_message(self) -> &'static str {
        match self {
            Self::Authenticated => "Authentication required",
            Self::Admin => "Admin access required",
            Self::SuperAdmin => "Super Admin access required",
        }
    }
}

impl Role {
    /// Capability table.
    #[must_use]
    pub const fn tiers(self) -> &'static [AccessTier] {
        match self {
            Self::SuperAdmin => &[
                AccessTier::Authenticated,
                AccessTier::Admin,
                AccessTier::SuperAdmin,
            ],
            Self::Admin => &[AccessTier::Authenticated, AccessTier::Admin],
            Self::Customer
            | Self::Investor
            | Self::Vendor
            | Self::Broker
            | Self::User
            | Self::Partner => &[AccessTier::Authenticated],
        }
    }
}

/// Outcome of a failed guard.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    #[error("Authentication required")]
    AuthenticationRequired,
    #[error("{0}")]
    AuthorizationDenied(&'static str),
}

impl From<AccessError> for Error {
    fn from(value: AccessError) -> Self {
        match value {
            AccessError::AuthenticationRequired => Self::unauthorized("Authentication required"),
            AccessError::AuthorizationDenied(message) => Self::forbidden(message),
        }
    }
}

/// Caller identity resolved for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub role: Role,
}

impl Principal {
    #[must_use]
    pub const fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    /// Owner or a plain `admin` may touch a user's records.
    ///
    /// `superadmin` deliberately does not pass this rule; it is evaluated
    /// separately from the role tiers.
    #[must_use]
    pub fn can_access_owned(&self, owner: &UserId) -> bool {
        self.user_id == *owner || self.role == Role::Admin
    }

    /// [`Self::can_access_owned`] as a `Result`.
    pub fn ensure_owns(&self, owner: &UserId) -> Result<(), AccessError> {
        if self.can_access_owned(owner) {
            Ok(())
        } else {
            Err(AccessError::AuthorizationDenied("Access denied"))
        }
    }
}

/// Resolve the caller for a route guarded by `tier`.
///
/// `session` is what the session cookie claims. The authenticated tier trusts
/// it; the admin tiers re-read the account on every request so demotions and
/// deletions take effect immediately.
pub async fn authorize(
    users: &dyn UserRepository,
    session: Option<Principal>,
    tier: AccessTier,
) -> Result<Principal, Error> {
    let claimed = session.ok_or(AccessError::AuthenticationRequired)?;
    if tier == AccessTier::Authenticated {
        return Ok(claimed);
    }
    let Some(user) = users.find_by_id(&claimed.user_id).await? else {
        debug!(user_id = %claimed.user_id, "session user no longer exists");
        return Err(AccessError::AuthorizationDenied(tier.denial_message()).into());
    };
    if !tier.admits(user.role) {
        return Err(AccessError::AuthorizationDenied(tier.denial_message()).into());
    }
    Ok(Principal::new(user.id, user.role))
}
