//! Vendor and broker application workflow.
//!
//! Applications are staged as [`Verification`] records and become accounts
//! only on approval. Guards are checked in a fixed order (not found, already
//! processed, email taken) before the store's atomic decision runs, and the
//! decision itself re-checks all three so concurrent reviewers cannot both
//! win.

use std::sync::Arc;

use mockable::Clock;
use tracing::{info, warn};
use uuid::Uuid;

use super::emails::{approval_email, rejection_email};
use super::ports::{
    Mailer, OutboundEmail, PasswordHashError, PasswordHasher, UserRepository,
    UserRepositoryError, VerificationRepository, VerificationRepositoryError,
};
use super::{
    DecisionOutcome, Email, Error, NewNotification, NotificationKind, NotificationService, Role,
    User, UserId, Verification, VerificationDecision, VerificationStatus,
};

/// Applicant-supplied data.
#[derive(Debug, Clone)]
pub struct Application {
    pub name: String,
    pub email: Email,
    pub password: String,
    pub role: Role,
    pub rera_id: String,
    pub phone: Option<String>,
    pub company: Option<String>,
}

/// Workflow failures.
#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    #[error("Only vendor and broker accounts require verification")]
    RoleNotVerifiable,
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("A verification request for this email is already pending")]
    DuplicateApplication,
    #[error("Email is already registered")]
    EmailAlreadyRegistered,
    #[error("Verification request not found")]
    NotFound,
    #[error("This verification has already been processed")]
    AlreadyProcessed,
    #[error(transparent)]
    Hashing(#[from] PasswordHashError),
    #[error(transparent)]
    Store(VerificationRepositoryError),
    #[error(transparent)]
    Users(#[from] UserRepositoryError),
}

impl From<VerificationRepositoryError> for VerificationError {
    fn from(err: VerificationRepositoryError) -> Self {
        match err {
            VerificationRepositoryError::NotFound { .. } => Self::NotFound,
            VerificationRepositoryError::AlreadyProcessed { .. } => Self::AlreadyProcessed,
            VerificationRepositoryError::EmailTaken { .. } => Self::EmailAlreadyRegistered,
            other => Self::Store(other),
        }
    }
}

impl From<VerificationError> for Error {
    fn from(err: VerificationError) -> Self {
        match err {
            VerificationError::RoleNotVerifiable
            | VerificationError::MissingField(_)
            | VerificationError::EmailAlreadyRegistered
            | VerificationError::AlreadyProcessed => Self::invalid_request(err.to_string()),
            VerificationError::DuplicateApplication => Self::conflict(err.to_string()),
            VerificationError::NotFound => Self::not_found(err.to_string()),
            VerificationError::Hashing(inner) => {
                warn!(error = %inner, "password hashing failed");
                Self::internal("password hashing failed")
            }
            VerificationError::Store(inner) => inner.into(),
            VerificationError::Users(inner) => inner.into(),
        }
    }
}

fn required(value: &str, field: &'static str) -> Result<(), VerificationError> {
    if value.trim().is_empty() {
        Err(VerificationError::MissingField(field))
    } else {
        Ok(())
    }
}

/// Submission, review and account materialisation.
#[derive(Clone)]
pub struct VerificationService {
    verifications: Arc<dyn VerificationRepository>,
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    mailer: Arc<dyn Mailer>,
    notifications: NotificationService,
    clock: Arc<dyn Clock>,
}

impl VerificationService {
    pub fn new(
        verifications: Arc<dyn VerificationRepository>,
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        mailer: Arc<dyn Mailer>,
        notifications: NotificationService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            verifications,
            users,
            hasher,
            mailer,
            notifications,
            clock,
        }
    }

    /// Fails when `email` already has an account or a pending application.
    ///
    /// Signup calls this before spending the applicant's one-time code.
    pub async fn ensure_accepting(&self, email: &Email) -> Result<(), VerificationError> {
        if self.users.find_by_email(email).await?.is_some() {
            return Err(VerificationError::EmailAlreadyRegistered);
        }
        if self.verifications.find_pending_by_email(email).await?.is_some() {
            return Err(VerificationError::DuplicateApplication);
        }
        Ok(())
    }

    /// Stage an application. The raw password is hashed before storage.
    pub async fn submit(&self, application: Application) -> Result<Verification, VerificationError> {
        if !application.role.requires_verification() {
            return Err(VerificationError::RoleNotVerifiable);
        }
        required(&application.name, "Name")?;
        required(&application.password, "Password")?;
        required(&application.rera_id, "RERA ID")?;

        self.ensure_accepting(&application.email).await?;

        let password_hash = self.hasher.hash(&application.password)?;
        let record = Verification {
            id: Uuid::new_v4(),
            name: application.name.trim().to_owned(),
            email: application.email,
            password_hash,
            role: application.role,
            rera_id: application.rera_id.trim().to_owned(),
            phone: application.phone,
            company: application.company,
            status: VerificationStatus::Pending,
            rejection_reason: None,
            submitted_at: self.clock.utc(),
            reviewed_at: None,
            reviewed_by: None,
        };
        self.verifications.insert(&record).await?;
        info!(verification_id = %record.id, role = %record.role, "verification submitted");
        Ok(record)
    }

    /// Newest first, optionally filtered.
    pub async fn list(
        &self,
        status: Option<VerificationStatus>,
    ) -> Result<Vec<Verification>, VerificationError> {
        Ok(self.verifications.list(status).await?)
    }

    async fn load_pending(&self, id: &Uuid) -> Result<Verification, VerificationError> {
        let record = self
            .verifications
            .find_by_id(id)
            .await?
            .ok_or(VerificationError::NotFound)?;
        if record.status != VerificationStatus::Pending {
            return Err(VerificationError::AlreadyProcessed);
        }
        Ok(record)
    }

    /// Approve and create the account. Email and push failures are logged;
    /// the account stands regardless.
    pub async fn approve(
        &self,
        id: &Uuid,
        reviewer: &UserId,
    ) -> Result<(Verification, User), VerificationError> {
        let pending = self.load_pending(id).await?;
        if self.users.find_by_email(&pending.email).await?.is_some() {
            return Err(VerificationError::EmailAlreadyRegistered);
        }

        let decision = VerificationDecision::Approve {
            reviewer: *reviewer,
            at: self.clock.utc(),
            user_id: UserId::random(),
        };
        let DecisionOutcome::Approved { verification, user } =
            self.verifications.decide(id, decision).await?
        else {
            return Err(VerificationError::Store(VerificationRepositoryError::query(
                "approval produced a rejection outcome",
            )));
        };
        info!(verification_id = %id, user_id = %user.id, reviewer = %reviewer, "verification approved");

        let welcome = NewNotification {
            user_id: user.id,
            title: "Account approved".to_owned(),
            message: format!(
                "Your {} account has been verified. Welcome aboard!",
                user.role
            ),
            kind: NotificationKind::Success,
        };
        if let Err(err) = self.notifications.notify(welcome).await {
            warn!(user_id = %user.id, error = %err, "approval notification failed");
        }
        self.send_best_effort(approval_email(&verification)).await;
        Ok((verification, user))
    }

    /// Reject with a mandatory reason.
    pub async fn reject(
        &self,
        id: &Uuid,
        reviewer: &UserId,
        reason: &str,
    ) -> Result<Verification, VerificationError> {
        let reason = reason.trim();
        required(reason, "Rejection reason")?;
        self.load_pending(id).await?;

        let decision = VerificationDecision::Reject {
            reviewer: *reviewer,
            at: self.clock.utc(),
            reason: reason.to_owned(),
        };
        let verification = match self.verifications.decide(id, decision).await? {
            DecisionOutcome::Rejected { verification }
            | DecisionOutcome::Approved { verification, .. } => verification,
        };
        info!(verification_id = %id, reviewer = %reviewer, "verification rejected");
        self.send_best_effort(rejection_email(&verification, reason))
            .await;
        Ok(verification)
    }

    async fn send_best_effort(&self, message: OutboundEmail) {
        if let Err(err) = self.mailer.send(&message).await {
            warn!(to = %message.to, subject = %message.subject, error = %err, "email delivery failed");
        }
    }
}

#[cfg(test)]
#[path = "verification_service_tests.rs"]
mod tests;
