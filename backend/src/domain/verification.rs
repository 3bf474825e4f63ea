//! Vendor and broker applications awaiting administrator review.
//!
//! A verification is a staged account. It moves `pending -> approved` or
//! `pending -> rejected` exactly once; terminal records are kept as an audit
//! trail.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::labels::labelled_enum;
use super::{Email, NewUser, PasswordHash, Role, UserId, UserStatus};

labelled_enum! {
    /// Review state of an application.
    pub enum VerificationStatus {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
    }
}

/// Stored application.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Verification {
    pub id: Uuid,
    pub name: String,
    pub email: Email,
    #[serde(skip)]
    pub password_hash: PasswordHash,
    pub role: Role,
    pub rera_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub status: VerificationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    pub submitted_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<UserId>,
}

impl Verification {
    /// Account materialised on approval. The stored hash carries over as is.
    #[must_use]
    pub fn approved_account(&self) -> NewUser {
        NewUser {
            name: self.name.clone(),
            email: self.email.clone(),
            password_hash: self.password_hash.clone(),
            role: self.role,
            status: UserStatus::Active,
            verified: true,
            is_email_verified: true,
            is_rera_verified: true,
            rera_id: Some(self.rera_id.clone()),
            phone: self.phone.clone(),
            company: self.company.clone(),
        }
    }
}

/// Administrator decision on a pending application.
#[derive(Debug, Clone)]
pub enum VerificationDecision {
    /// Accept and create the account in the same atomic step.
    Approve {
        reviewer: UserId,
        at: DateTime<Utc>,
        user_id: UserId,
    },
    /// Decline with a reason shown to the applicant.
    Reject {
        reviewer: UserId,
        at: DateTime<Utc>,
        reason: String,
    },
}

impl VerificationDecision {
    /// Status the record moves to.
    #[must_use]
    pub const fn target_status(&self) -> VerificationStatus {
        match self {
            Self::Approve { .. } => VerificationStatus::Approved,
            Self::Reject { .. } => VerificationStatus::Rejected,
        }
    }

    /// Stamp the decision onto a record.
    pub fn apply_to(&self, record: &mut Verification) {
        record.status = self.target_status();
        match self {
            Self::Approve { reviewer, at, .. } => {
                record.reviewed_by = Some(*reviewer);
                record.reviewed_at = Some(*at);
            }
            Self::Reject {
                reviewer,
                at,
                reason,
            } => {
                record.reviewed_by = Some(*reviewer);
                record.reviewed_at = Some(*at);
                record.rejection_reason = Some(reason.clone());
            }
        }
    }
}

/// Result of a decision that won the race for a pending record.
#[derive(Debug, Clone)]
pub enum DecisionOutcome {
    Approved {
        verification: Verification,
        user: super::User,
    },
    Rejected {
        verification: Verification,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending() -> Verification {
        Verification {
            id: Uuid::new_v4(),
            name: "A".to_owned(),
            email: Email::new("a@x.com").expect("email"),
            password_hash: PasswordHash::new("hash"),
            role: Role::Broker,
            rera_id: "RERA123".to_owned(),
            phone: None,
            company: Some("Acme Realty".to_owned()),
            status: VerificationStatus::Pending,
            rejection_reason: None,
            submitted_at: Utc::now(),
            reviewed_at: None,
            reviewed_by: None,
        }
    }

    #[test]
    fn approved_account_is_fully_verified() {
        let account = pending().approved_account();
        assert_eq!(account.status, UserStatus::Active);
        assert!(account.verified && account.is_email_verified && account.is_rera_verified);
        assert_eq!(account.rera_id.as_deref(), Some("RERA123"));
        assert_eq!(account.password_hash, PasswordHash::new("hash"));
    }

    #[test]
    fn rejection_records_reason_and_reviewer() {
        let mut record = pending();
        let reviewer = UserId::random();
        VerificationDecision::Reject {
            reviewer,
            at: Utc::now(),
            reason: "expired licence".to_owned(),
        }
        .apply_to(&mut record);
        assert_eq!(record.status, VerificationStatus::Rejected);
        assert_eq!(record.reviewed_by, Some(reviewer));
        assert_eq!(record.rejection_reason.as_deref(), Some("expired licence"));
    }

    #[test]
    fn json_never_exposes_password() {
        let value = serde_json::to_value(pending()).expect("serialise");
        assert!(value.get("passwordHash").is_none());
        assert_eq!(value["reraId"], "RERA123");
        assert_eq!(value["status"], "pending");
    }
}
