//! Port abstraction for user account persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Email, Role, User, UserId, UserPatch};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// Another account already owns the address.
        EmailTaken { email: String } => "email {email} is already registered",
    }
}

/// Storage for user accounts. The store is the single writer of users.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new account. Fails with `EmailTaken` on a duplicate address.
    async fn create(&self, user: &User) -> Result<(), UserRepositoryError>;

    /// Fetch an account by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError>;

    /// Fetch an account by normalised email.
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, UserRepositoryError>;

    /// List accounts, optionally restricted to one role, oldest first.
    async fn list(&self, role: Option<Role>) -> Result<Vec<User>, UserRepositoryError>;

    /// Apply a partial update, returning the stored result or `None` when
    /// the account does not exist.
    async fn update(
        &self,
        id: &UserId,
        patch: UserPatch,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, UserRepositoryError>;

    /// Hard delete. Returns whether a row was removed.
    async fn delete(&self, id: &UserId) -> Result<bool, UserRepositoryError>;
}
