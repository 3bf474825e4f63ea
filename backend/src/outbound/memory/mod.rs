//! In-process store implementing every repository port.
//!
//! Selected when no database URL is configured, and used by tests. All state
//! sits behind one mutex so compound operations (the verification decision
//! in particular) are atomic exactly as the PostgreSQL adapter's transactions
//! are.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::ports::{
    DocumentRepository, MapRegistrationRepository, NotificationRepository, OtpRepository,
    OtpRepositoryError, RecordRepositoryError, TransactionRepository, UserRepository,
    UserRepositoryError, VerificationRepository, VerificationRepositoryError,
};
use crate::domain::{
    DecisionOutcome, Document, DocumentStatus, Email, MapRegistration, Notification, OtpPurpose,
    OtpRecord, Pincode, Role, Transaction, User, UserId, UserPatch, Verification,
    VerificationDecision, VerificationStatus,
};

#[derive(Default)]
struct State {
    users: Vec<User>,
    verifications: Vec<Verification>,
    otps: Vec<OtpRecord>,
    documents: Vec<Document>,
    transactions: Vec<Transaction>,
    notifications: Vec<Notification>,
    map_registrations: HashMap<UserId, MapRegistration>,
}

impl State {
    fn email_taken(&self, email: &Email) -> bool {
        self.users.iter().any(|u| u.email == *email)
    }
}

/// Mutex-guarded store.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // Every mutation is a single push or replace.
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Number of stored OTP records, live or not.
    #[must_use]
    pub fn otp_count(&self) -> usize {
        self.lock().otps.len()
    }
}

fn newest_first<T>(mut rows: Vec<T>, key: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    rows.sort_by_key(|row| std::cmp::Reverse(key(row)));
    rows
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: &User) -> Result<(), UserRepositoryError> {
        let mut state = self.lock();
        if state.email_taken(&user.email) {
            return Err(UserRepositoryError::email_taken(user.email.to_string()));
        }
        state.users.push(user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError> {
        Ok(self.lock().users.iter().find(|u| u.id == *id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, UserRepositoryError> {
        Ok(self.lock().users.iter().find(|u| u.email == *email).cloned())
    }

    async fn list(&self, role: Option<Role>) -> Result<Vec<User>, UserRepositoryError> {
        Ok(self
            .lock()
            .users
            .iter()
            .filter(|u| role.is_none_or(|r| u.role == r))
            .cloned()
            .collect())
    }

    async fn update(
        &self,
        id: &UserId,
        patch: UserPatch,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, UserRepositoryError> {
        let mut state = self.lock();
        let Some(user) = state.users.iter_mut().find(|u| u.id == *id) else {
            return Ok(None);
        };
        patch.apply(user, now);
        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: &UserId) -> Result<bool, UserRepositoryError> {
        let mut state = self.lock();
        let before = state.users.len();
        state.users.retain(|u| u.id != *id);
        Ok(state.users.len() != before)
    }
}

#[async_trait]
impl VerificationRepository for MemoryStore {
    async fn insert(&self, record: &Verification) -> Result<(), VerificationRepositoryError> {
        self.lock().verifications.push(record.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &Uuid,
    ) -> Result<Option<Verification>, VerificationRepositoryError> {
        Ok(self.lock().verifications.iter().find(|v| v.id == *id).cloned())
    }

    async fn find_pending_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<Verification>, VerificationRepositoryError> {
        Ok(self
            .lock()
            .verifications
            .iter()
            .find(|v| v.email == *email && v.status == VerificationStatus::Pending)
            .cloned())
    }

    async fn list(
        &self,
        status: Option<VerificationStatus>,
    ) -> Result<Vec<Verification>, VerificationRepositoryError> {
        let rows = self
            .lock()
            .verifications
            .iter()
            .filter(|v| status.is_none_or(|s| v.status == s))
            .cloned()
            .collect();
        Ok(newest_first(rows, |v: &Verification| v.submitted_at))
    }

    async fn decide(
        &self,
        id: &Uuid,
        decision: VerificationDecision,
    ) -> Result<DecisionOutcome, VerificationRepositoryError> {
        let mut state = self.lock();
        let index = state
            .verifications
            .iter()
            .position(|v| v.id == *id)
            .ok_or_else(|| VerificationRepositoryError::not_found(*id))?;

        let mut record = state.verifications.get(index).cloned().ok_or_else(|| {
            VerificationRepositoryError::query("verification vanished under lock")
        })?;
        if record.status != VerificationStatus::Pending {
            return Err(VerificationRepositoryError::already_processed(*id));
        }

        decision.apply_to(&mut record);
        let outcome = match decision {
            VerificationDecision::Approve { user_id, at, .. } => {
                if state.email_taken(&record.email) {
                    return Err(VerificationRepositoryError::email_taken(
                        record.email.to_string(),
                    ));
                }
                let user = record.approved_account().into_user(user_id, at);
                state.users.push(user.clone());
                DecisionOutcome::Approved {
                    verification: record.clone(),
                    user,
                }
            }
            VerificationDecision::Reject { .. } => DecisionOutcome::Rejected {
                verification: record.clone(),
            },
        };
        if let Some(slot) = state.verifications.get_mut(index) {
            *slot = record;
        }
        Ok(outcome)
    }
}

#[async_trait]
impl OtpRepository for MemoryStore {
    async fn replace(&self, record: &OtpRecord) -> Result<(), OtpRepositoryError> {
        let mut state = self.lock();
        state
            .otps
            .retain(|o| !(o.email == record.email && o.purpose == record.purpose));
        state.otps.push(record.clone());
        Ok(())
    }

    async fn find_live(
        &self,
        email: &Email,
        purpose: OtpPurpose,
        now: DateTime<Utc>,
    ) -> Result<Option<OtpRecord>, OtpRepositoryError> {
        Ok(self
            .lock()
            .otps
            .iter()
            .filter(|o| o.email == *email && o.purpose == purpose && o.is_live(now))
            .max_by_key(|o| o.created_at)
            .cloned())
    }

    async fn increment_attempts(&self, id: &Uuid) -> Result<u32, OtpRepositoryError> {
        let mut state = self.lock();
        let record = state
            .otps
            .iter_mut()
            .find(|o| o.id == *id)
            .ok_or_else(|| OtpRepositoryError::query(format!("otp {id} not found")))?;
        record.attempts = record.attempts.saturating_add(1);
        Ok(record.attempts)
    }

    async fn delete(&self, id: &Uuid) -> Result<(), OtpRepositoryError> {
        self.lock().otps.retain(|o| o.id != *id);
        Ok(())
    }
}

#[async_trait]
impl DocumentRepository for MemoryStore {
    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<Document>, RecordRepositoryError> {
        let rows = self
            .lock()
            .documents
            .iter()
            .filter(|d| d.user_id == *user_id)
            .cloned()
            .collect();
        Ok(newest_first(rows, |d: &Document| d.uploaded_at))
    }

    async fn insert(&self, document: &Document) -> Result<(), RecordRepositoryError> {
        self.lock().documents.push(document.clone());
        Ok(())
    }

    async fn set_status(
        &self,
        id: &Uuid,
        status: DocumentStatus,
    ) -> Result<Option<Document>, RecordRepositoryError> {
        let mut state = self.lock();
        Ok(state.documents.iter_mut().find(|d| d.id == *id).map(|d| {
            d.status = status;
            d.clone()
        }))
    }
}

#[async_trait]
impl TransactionRepository for MemoryStore {
    async fn list_by_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Transaction>, RecordRepositoryError> {
        let rows = self
            .lock()
            .transactions
            .iter()
            .filter(|t| t.user_id == *user_id)
            .cloned()
            .collect();
        Ok(newest_first(rows, |t: &Transaction| t.created_at))
    }

    async fn insert(&self, transaction: &Transaction) -> Result<(), RecordRepositoryError> {
        self.lock().transactions.push(transaction.clone());
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Transaction>, RecordRepositoryError> {
        Ok(self.lock().transactions.clone())
    }
}

#[async_trait]
impl NotificationRepository for MemoryStore {
    async fn list_by_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Notification>, RecordRepositoryError> {
        let rows = self
            .lock()
            .notifications
            .iter()
            .filter(|n| n.user_id == *user_id)
            .cloned()
            .collect();
        Ok(newest_first(rows, |n: &Notification| n.created_at))
    }

    async fn insert(&self, notification: &Notification) -> Result<(), RecordRepositoryError> {
        self.lock().notifications.push(notification.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Notification>, RecordRepositoryError> {
        Ok(self.lock().notifications.iter().find(|n| n.id == *id).cloned())
    }

    async fn mark_read(&self, id: &Uuid) -> Result<Option<Notification>, RecordRepositoryError> {
        let mut state = self.lock();
        Ok(state.notifications.iter_mut().find(|n| n.id == *id).map(|n| {
            n.read = true;
            n.clone()
        }))
    }

    async fn mark_all_read(&self, user_id: &UserId) -> Result<u64, RecordRepositoryError> {
        let mut state = self.lock();
        let mut changed = 0_u64;
        for n in state
            .notifications
            .iter_mut()
            .filter(|n| n.user_id == *user_id && !n.read)
        {
            n.read = true;
            changed += 1;
        }
        Ok(changed)
    }
}

#[async_trait]
impl MapRegistrationRepository for MemoryStore {
    async fn upsert(
        &self,
        registration: &MapRegistration,
    ) -> Result<MapRegistration, RecordRepositoryError> {
        let mut state = self.lock();
        let stored = match state.map_registrations.get(&registration.user_id) {
            Some(existing) => MapRegistration {
                id: existing.id,
                created_at: existing.created_at,
                ..registration.clone()
            },
            None => registration.clone(),
        };
        state
            .map_registrations
            .insert(stored.user_id, stored.clone());
        Ok(stored)
    }

    async fn find_by_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<MapRegistration>, RecordRepositoryError> {
        Ok(self.lock().map_registrations.get(user_id).cloned())
    }

    async fn list(
        &self,
        pincode: Option<Pincode>,
    ) -> Result<Vec<MapRegistration>, RecordRepositoryError> {
        let rows: Vec<MapRegistration> = self
            .lock()
            .map_registrations
            .values()
            .filter(|r| pincode.as_ref().is_none_or(|p| r.pincode == *p))
            .cloned()
            .collect();
        Ok(newest_first(rows, |r: &MapRegistration| r.updated_at))
    }

    async fn delete_by_user(&self, user_id: &UserId) -> Result<bool, RecordRepositoryError> {
        Ok(self.lock().map_registrations.remove(user_id).is_some())
    }
}
