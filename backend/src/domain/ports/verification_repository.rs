//! Port abstraction for staged vendor and broker applications.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    DecisionOutcome, Email, Verification, VerificationDecision, VerificationStatus,
};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by verification repository adapters.
    pub enum VerificationRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "verification repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "verification repository query failed: {message}",
        /// No application has the identifier.
        NotFound { id: Uuid } => "verification {id} not found",
        /// The application already left `pending`.
        AlreadyProcessed { id: Uuid } => "verification {id} is already processed",
        /// Approval collided with an existing account.
        EmailTaken { email: String } => "email {email} is already registered",
    }
}

/// Storage for applications.
///
/// `decide` must be atomic: the status moves out of `pending` only when the
/// record is still pending at write time, and an approval inserts the
/// resulting account in the same unit of work.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VerificationRepository: Send + Sync {
    /// Store a new pending application.
    async fn insert(&self, record: &Verification) -> Result<(), VerificationRepositoryError>;

    /// Fetch by identifier.
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Verification>, VerificationRepositoryError>;

    /// Fetch the pending application for an address, if any.
    async fn find_pending_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<Verification>, VerificationRepositoryError>;

    /// List applications, newest submission first.
    async fn list(
        &self,
        status: Option<VerificationStatus>,
    ) -> Result<Vec<Verification>, VerificationRepositoryError>;

    /// Apply an administrator decision to a pending application.
    async fn decide(
        &self,
        id: &Uuid,
        decision: VerificationDecision,
    ) -> Result<DecisionOutcome, VerificationRepositoryError>;
}
