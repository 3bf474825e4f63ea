//! Administrator operations over user accounts.

use std::sync::Arc;

use mockable::Clock;
use tracing::info;

use super::ports::UserRepository;
use super::{Email, Error, Principal, Role, User, UserId, UserPatch, UserStatus};

/// Partial update accepted from administrators.
#[derive(Debug, Clone, Default)]
pub struct AdminUserUpdate {
    pub role: Option<Role>,
    pub status: Option<UserStatus>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
}

impl AdminUserUpdate {
    fn into_patch(self) -> UserPatch {
        let keep = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        UserPatch {
            role: self.role,
            status: self.status,
            name: keep(self.name),
            phone: keep(self.phone),
            company: keep(self.company),
            ..UserPatch::default()
        }
    }
}

const MUST_SIGN_UP: &str = "User not found. User must sign up first.";

/// Account administration.
#[derive(Clone)]
pub struct UsersService {
    users: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
}

impl UsersService {
    pub fn new(users: Arc<dyn UserRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { users, clock }
    }

    pub async fn list(&self, role: Option<Role>) -> Result<Vec<User>, Error> {
        Ok(self.users.list(role).await?)
    }

    /// Existence is checked before ownership, so strangers learn that an id
    /// exists but not its contents.
    pub async fn get(&self, caller: &Principal, id: &UserId) -> Result<User, Error> {
        let user = self
            .users
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::not_found("User not found"))?;
        caller.ensure_owns(id)?;
        Ok(user)
    }

    pub async fn update(&self, id: &UserId, update: AdminUserUpdate) -> Result<User, Error> {
        self.users
            .update(id, update.into_patch(), self.clock.utc())
            .await?
            .ok_or_else(|| Error::not_found("User not found"))
    }

    pub async fn delete(&self, id: &UserId) -> Result<(), Error> {
        if self.users.delete(id).await? {
            info!(user_id = %id, "user deleted");
            Ok(())
        } else {
            Err(Error::not_found("User not found"))
        }
    }

    /// Give an existing account a new role.
    pub async fn assign_role(&self, email: &Email, role: Role) -> Result<User, Error> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or_else(|| Error::not_found(MUST_SIGN_UP))?;
        let patch = UserPatch {
            role: Some(role),
            ..UserPatch::default()
        };
        let updated = self
            .users
            .update(&user.id, patch, self.clock.utc())
            .await?
            .ok_or_else(|| Error::not_found(MUST_SIGN_UP))?;
        info!(user_id = %updated.id, %role, "role assigned");
        Ok(updated)
    }

    /// Promote an existing account to an administrative role and activate it.
    pub async fn create_admin(&self, email: &Email, role: Role) -> Result<User, Error> {
        if !role.is_administrative() {
            return Err(Error::invalid_request(
                "Invalid role. Must be admin or superadmin",
            ));
        }
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or_else(|| Error::not_found(MUST_SIGN_UP))?;
        let patch = UserPatch {
            role: Some(role),
            status: Some(UserStatus::Active),
            verified: Some(true),
            ..UserPatch::default()
        };
        let updated = self
            .users
            .update(&user.id, patch, self.clock.utc())
            .await?
            .ok_or_else(|| Error::not_found(MUST_SIGN_UP))?;
        info!(user_id = %updated.id, %role, "administrator created");
        Ok(updated)
    }
}
