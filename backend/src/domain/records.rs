//! Per-user owned records: documents, transactions and notifications.
//!
//! Each record belongs to exactly one user through `user_id`. Apart from
//! ownership there are no cross-entity invariants.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::UserId;
use super::labels::labelled_enum;

labelled_enum! {
    /// Review state of an uploaded document.
    pub enum DocumentStatus {
        Pending => "pending",
        Verified => "verified",
        Rejected => "rejected",
    }
}

/// Metadata for a document a user uploaded.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: Uuid,
    pub user_id: UserId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub size: i64,
    pub status: DocumentStatus,
    pub url: String,
    pub uploaded_at: DateTime<Utc>,
}

/// Input for recording a new document.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub user_id: UserId,
    pub name: String,
    pub kind: String,
    pub size: i64,
    pub url: String,
}

labelled_enum! {
    /// Settlement state of a payment.
    pub enum TransactionStatus {
        Completed => "completed",
        Pending => "pending",
        Failed => "failed",
    }
}

labelled_enum! {
    /// Payment channel used for a transaction.
    pub enum PaymentMethod {
        PayPal => "PayPal",
        CreditCard => "Credit Card",
        Razorpay => "Razorpay",
    }
}

/// A payment made by a user.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: UserId,
    pub amount: f64,
    pub status: TransactionStatus,
    pub method: PaymentMethod,
    pub description: String,
    pub transaction_id: String,
    pub created_at: DateTime<Utc>,
}

/// Input for recording a payment.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub user_id: UserId,
    pub amount: f64,
    pub status: TransactionStatus,
    pub method: PaymentMethod,
    pub description: String,
    pub transaction_id: String,
}

labelled_enum! {
    /// Presentation severity of a notification.
    pub enum NotificationKind {
        Info => "info",
        Success => "success",
        Warning => "warning",
        Error => "error",
    }
}

/// A message addressed to one user.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub user_id: UserId,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a notification.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: UserId,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
}
