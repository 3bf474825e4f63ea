//! Ports for per-user owned records: documents, transactions and
//! notifications.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Document, DocumentStatus, Notification, Transaction, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors shared by the owned-record repositories.
    pub enum RecordRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "record repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "record repository query failed: {message}",
    }
}

/// Uploaded document metadata.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Documents owned by `user_id`, newest upload first.
    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<Document>, RecordRepositoryError>;

    async fn insert(&self, document: &Document) -> Result<(), RecordRepositoryError>;

    /// Set the review status. `None` when the document does not exist.
    async fn set_status(
        &self,
        id: &Uuid,
        status: DocumentStatus,
    ) -> Result<Option<Document>, RecordRepositoryError>;
}

/// Payment history.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    /// Transactions owned by `user_id`, newest first.
    async fn list_by_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Transaction>, RecordRepositoryError>;

    async fn insert(&self, transaction: &Transaction) -> Result<(), RecordRepositoryError>;

    /// Every stored transaction. Used by aggregate reporting.
    async fn list_all(&self) -> Result<Vec<Transaction>, RecordRepositoryError>;
}

/// Per-user notification inbox.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Notifications for `user_id`, newest first.
    async fn list_by_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Notification>, RecordRepositoryError>;

    async fn insert(&self, notification: &Notification) -> Result<(), RecordRepositoryError>;

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Notification>, RecordRepositoryError>;

    /// Flag one notification read, returning the updated row.
    async fn mark_read(&self, id: &Uuid) -> Result<Option<Notification>, RecordRepositoryError>;

    /// Flag every unread notification for a user; returns how many changed.
    async fn mark_all_read(&self, user_id: &UserId) -> Result<u64, RecordRepositoryError>;
}
