//! Port abstraction for territory map registrations.

use async_trait::async_trait;

use crate::domain::{MapRegistration, Pincode, UserId};

use super::RecordRepositoryError;

/// Storage for map markers, keyed by owner.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MapRegistrationRepository: Send + Sync {
    /// Insert or replace the registration for `registration.user_id`.
    /// The stored row keeps its original `id` and `created_at` on replace.
    async fn upsert(
        &self,
        registration: &MapRegistration,
    ) -> Result<MapRegistration, RecordRepositoryError>;

    async fn find_by_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<MapRegistration>, RecordRepositoryError>;

    /// All registrations, optionally restricted to one pincode.
    async fn list(
        &self,
        pincode: Option<Pincode>,
    ) -> Result<Vec<MapRegistration>, RecordRepositoryError>;

    /// Remove the user's registration. Returns whether one existed.
    async fn delete_by_user(&self, user_id: &UserId) -> Result<bool, RecordRepositoryError>;
}
