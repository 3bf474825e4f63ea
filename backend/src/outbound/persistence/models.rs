//! Internal Diesel row structs and their domain conversions.
//!
//! Row types never leave the persistence layer. Reading a row back into the
//! domain can fail when a stored label or email no longer parses; that is
//! reported as [`CorruptRow`] and surfaced by repositories as a query error.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use tracing::warn;
use uuid::Uuid;

use crate::domain::{
    Document, DocumentStatus, Email, MapRegistration, Notification, NotificationKind, OtpCode,
    OtpPurpose, OtpRecord, PasswordHash, PaymentMethod, Pincode, Role, Transaction,
    TransactionStatus, User, UserId, UserPatch, UserStatus, Verification, VerificationStatus,
};

use super::schema::{
    documents, map_registrations, notifications, otps, transactions, users, verifications,
};

/// A stored row that no longer satisfies domain validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("corrupt {table} row {id}: {reason}")]
pub(crate) struct CorruptRow {
    table: &'static str,
    id: Uuid,
    reason: String,
}

impl CorruptRow {
    fn new(table: &'static str, id: Uuid, reason: impl ToString) -> Self {
        let reason = reason.to_string();
        warn!(table, %id, %reason, "stored row failed domain validation");
        Self { table, id, reason }
    }
}

fn label<T>(table: &'static str, id: Uuid, raw: &str) -> Result<T, CorruptRow>
where
    T: FromStr,
    T::Err: ToString,
{
    T::from_str(raw).map_err(|err| CorruptRow::new(table, id, err))
}

fn email(table: &'static str, id: Uuid, raw: &str) -> Result<Email, CorruptRow> {
    Email::new(raw).map_err(|err| CorruptRow::new(table, id, err))
}

pub(crate) fn attempts_to_db(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn attempts_from_db(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub status: String,
    pub verified: bool,
    pub is_email_verified: bool,
    pub is_rera_verified: bool,
    pub rera_id: Option<String>,
    pub avatar: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = CorruptRow;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: UserId::from_uuid(row.id),
            name: row.name,
            email: email("users", row.id, &row.email)?,
            password_hash: PasswordHash::new(row.password_hash),
            role: label::<Role>("users", row.id, &row.role)?,
            status: label::<UserStatus>("users", row.id, &row.status)?,
            verified: row.verified,
            is_email_verified: row.is_email_verified,
            is_rera_verified: row.is_rera_verified,
            rera_id: row.rera_id,
            avatar: row.avatar,
            phone: row.phone,
            company: row.company,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: &'static str,
    pub status: &'static str,
    pub verified: bool,
    pub is_email_verified: bool,
    pub is_rera_verified: bool,
    pub rera_id: Option<&'a str>,
    pub avatar: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub company: Option<&'a str>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> From<&'a User> for NewUserRow<'a> {
    fn from(user: &'a User) -> Self {
        Self {
            id: *user.id.as_uuid(),
            name: &user.name,
            email: user.email.as_ref(),
            password_hash: user.password_hash.as_str(),
            role: user.role.as_str(),
            status: user.status.as_str(),
            verified: user.verified,
            is_email_verified: user.is_email_verified,
            is_rera_verified: user.is_rera_verified,
            rera_id: user.rera_id.as_deref(),
            avatar: user.avatar.as_deref(),
            phone: user.phone.as_deref(),
            company: user.company.as_deref(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Partial user update. `None` fields are left out of the `SET` clause.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = users)]
pub(crate) struct UserChangeset {
    pub role: Option<&'static str>,
    pub status: Option<&'static str>,
    pub verified: Option<bool>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub avatar: Option<String>,
    pub password_hash: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl UserChangeset {
    pub(crate) fn from_patch(patch: UserPatch, now: DateTime<Utc>) -> Self {
        Self {
            role: patch.role.map(Role::as_str),
            status: patch.status.map(UserStatus::as_str),
            verified: patch.verified,
            name: patch.name,
            phone: patch.phone,
            company: patch.company,
            avatar: patch.avatar,
            password_hash: patch.password_hash.map(|h| h.as_str().to_owned()),
            updated_at: now,
        }
    }
}

// ---------------------------------------------------------------------------
// Verifications
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = verifications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct VerificationRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub rera_id: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub status: String,
    pub rejection_reason: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<Uuid>,
}

impl From<&Verification> for VerificationRow {
    fn from(record: &Verification) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            email: record.email.to_string(),
            password_hash: record.password_hash.as_str().to_owned(),
            role: record.role.as_str().to_owned(),
            rera_id: record.rera_id.clone(),
            phone: record.phone.clone(),
            company: record.company.clone(),
            status: record.status.as_str().to_owned(),
            rejection_reason: record.rejection_reason.clone(),
            submitted_at: record.submitted_at,
            reviewed_at: record.reviewed_at,
            reviewed_by: record.reviewed_by.map(|id| *id.as_uuid()),
        }
    }
}

impl TryFrom<VerificationRow> for Verification {
    type Error = CorruptRow;

    fn try_from(row: VerificationRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            name: row.name,
            email: email("verifications", row.id, &row.email)?,
            password_hash: PasswordHash::new(row.password_hash),
            role: label::<Role>("verifications", row.id, &row.role)?,
            rera_id: row.rera_id,
            phone: row.phone,
            company: row.company,
            status: label::<VerificationStatus>("verifications", row.id, &row.status)?,
            rejection_reason: row.rejection_reason,
            submitted_at: row.submitted_at,
            reviewed_at: row.reviewed_at,
            reviewed_by: row.reviewed_by.map(UserId::from_uuid),
        })
    }
}

/// Fields written when a decision moves a record out of `pending`.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = verifications)]
pub(crate) struct DecisionChangeset<'a> {
    pub status: &'static str,
    pub rejection_reason: Option<&'a str>,
    pub reviewed_at: DateTime<Utc>,
    pub reviewed_by: Uuid,
}

// ---------------------------------------------------------------------------
// OTPs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = otps)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct OtpRow {
    pub id: Uuid,
    pub email: String,
    pub code: String,
    pub purpose: String,
    pub expires_at: DateTime<Utc>,
    pub attempts: i32,
    pub max_attempts: i32,
    pub created_at: DateTime<Utc>,
}

impl From<&OtpRecord> for OtpRow {
    fn from(record: &OtpRecord) -> Self {
        Self {
            id: record.id,
            email: record.email.to_string(),
            code: record.code.as_str().to_owned(),
            purpose: record.purpose.as_str().to_owned(),
            expires_at: record.expires_at,
            attempts: attempts_to_db(record.attempts),
            max_attempts: attempts_to_db(record.max_attempts),
            created_at: record.created_at,
        }
    }
}

impl TryFrom<OtpRow> for OtpRecord {
    type Error = CorruptRow;

    fn try_from(row: OtpRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            email: email("otps", row.id, &row.email)?,
            code: OtpCode::new(row.code),
            purpose: label::<OtpPurpose>("otps", row.id, &row.purpose)?,
            expires_at: row.expires_at,
            attempts: attempts_from_db(row.attempts),
            max_attempts: attempts_from_db(row.max_attempts),
            created_at: row.created_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Owned records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = documents)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct DocumentRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub kind: String,
    pub size: i64,
    pub status: String,
    pub url: String,
    pub uploaded_at: DateTime<Utc>,
}

impl From<&Document> for DocumentRow {
    fn from(document: &Document) -> Self {
        Self {
            id: document.id,
            user_id: *document.user_id.as_uuid(),
            name: document.name.clone(),
            kind: document.kind.clone(),
            size: document.size,
            status: document.status.as_str().to_owned(),
            url: document.url.clone(),
            uploaded_at: document.uploaded_at,
        }
    }
}

impl TryFrom<DocumentRow> for Document {
    type Error = CorruptRow;

    fn try_from(row: DocumentRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            user_id: UserId::from_uuid(row.user_id),
            name: row.name,
            kind: row.kind,
            size: row.size,
            status: label::<DocumentStatus>("documents", row.id, &row.status)?,
            url: row.url,
            uploaded_at: row.uploaded_at,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = transactions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TransactionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: f64,
    pub status: String,
    pub method: String,
    pub description: String,
    pub transaction_id: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Transaction> for TransactionRow {
    fn from(txn: &Transaction) -> Self {
        Self {
            id: txn.id,
            user_id: *txn.user_id.as_uuid(),
            amount: txn.amount,
            status: txn.status.as_str().to_owned(),
            method: txn.method.as_str().to_owned(),
            description: txn.description.clone(),
            transaction_id: txn.transaction_id.clone(),
            created_at: txn.created_at,
        }
    }
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = CorruptRow;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            user_id: UserId::from_uuid(row.user_id),
            amount: row.amount,
            status: label::<TransactionStatus>("transactions", row.id, &row.status)?,
            method: label::<PaymentMethod>("transactions", row.id, &row.method)?,
            description: row.description,
            transaction_id: row.transaction_id,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = notifications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct NotificationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    pub kind: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Notification> for NotificationRow {
    fn from(notification: &Notification) -> Self {
        Self {
            id: notification.id,
            user_id: *notification.user_id.as_uuid(),
            title: notification.title.clone(),
            message: notification.message.clone(),
            kind: notification.kind.as_str().to_owned(),
            read: notification.read,
            created_at: notification.created_at,
        }
    }
}

impl TryFrom<NotificationRow> for Notification {
    type Error = CorruptRow;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            user_id: UserId::from_uuid(row.user_id),
            title: row.title,
            message: row.message,
            kind: label::<NotificationKind>("notifications", row.id, &row.kind)?,
            read: row.read,
            created_at: row.created_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Map registrations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = map_registrations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct MapRegistrationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub address: String,
    pub pincode: String,
    pub locality: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&MapRegistration> for MapRegistrationRow {
    fn from(reg: &MapRegistration) -> Self {
        Self {
            id: reg.id,
            user_id: *reg.user_id.as_uuid(),
            name: reg.name.clone(),
            email: reg.email.to_string(),
            role: reg.role.as_str().to_owned(),
            address: reg.address.clone(),
            pincode: reg.pincode.as_str().to_owned(),
            locality: reg.locality.clone(),
            latitude: reg.latitude,
            longitude: reg.longitude,
            created_at: reg.created_at,
            updated_at: reg.updated_at,
        }
    }
}

impl TryFrom<MapRegistrationRow> for MapRegistration {
    type Error = CorruptRow;

    fn try_from(row: MapRegistrationRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            user_id: UserId::from_uuid(row.user_id),
            name: row.name,
            email: email("map_registrations", row.id, &row.email)?,
            role: label::<Role>("map_registrations", row.id, &row.role)?,
            address: row.address,
            pincode: Pincode::new(&row.pincode)
                .map_err(|err| CorruptRow::new("map_registrations", row.id, err))?,
            locality: row.locality,
            latitude: row.latitude,
            longitude: row.longitude,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
