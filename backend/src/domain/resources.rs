//! Ownership-scoped documents, transactions and notifications.
//!
//! Reads and per-record mutations check [`Principal::can_access_owned`]
//! against the record's owner before touching the store.

use std::sync::Arc;

use mockable::Clock;
use tracing::{debug, warn};
use uuid::Uuid;

use super::ports::{
    DocumentRepository, NotificationPublisher, NotificationRepository, TransactionRepository,
};
use super::{
    Document, DocumentStatus, Error, NewDocument, NewNotification, NewTransaction, Notification,
    Principal, Transaction, UserId,
};

/// Creates notifications and pushes them to connected clients.
#[derive(Clone)]
pub struct NotificationService {
    repo: Arc<dyn NotificationRepository>,
    publisher: Arc<dyn NotificationPublisher>,
    clock: Arc<dyn Clock>,
}

impl NotificationService {
    pub fn new(
        repo: Arc<dyn NotificationRepository>,
        publisher: Arc<dyn NotificationPublisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repo,
            publisher,
            clock,
        }
    }

    /// Persist, then publish on `user_<id>`. Push failures are logged only;
    /// the stored row is the source of truth.
    pub async fn notify(&self, input: NewNotification) -> Result<Notification, Error> {
        let notification = Notification {
            id: Uuid::new_v4(),
            user_id: input.user_id,
            title: input.title,
            message: input.message,
            kind: input.kind,
            read: false,
            created_at: self.clock.utc(),
        };
        self.repo.insert(&notification).await?;
        match self.publisher.publish(&notification.user_id, &notification) {
            Ok(delivered) => debug!(user_id = %notification.user_id, delivered, "notification published"),
            Err(err) => warn!(user_id = %notification.user_id, error = %err, "notification publish failed"),
        }
        Ok(notification)
    }

    pub async fn list(&self, caller: &Principal, owner: &UserId) -> Result<Vec<Notification>, Error> {
        caller.ensure_owns(owner)?;
        Ok(self.repo.list_by_user(owner).await?)
    }

    /// Mark one notification read. Missing ids are 404 before any
    /// ownership decision.
    pub async fn mark_read(&self, caller: &Principal, id: &Uuid) -> Result<Notification, Error> {
        let existing = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::not_found("Notification not found"))?;
        if !caller.can_access_owned(&existing.user_id) {
            return Err(Error::forbidden(
                "Access denied. You can only mark your own notifications as read.",
            ));
        }
        self.repo
            .mark_read(id)
            .await?
            .ok_or_else(|| Error::not_found("Notification not found"))
    }

    /// Returns how many notifications changed.
    pub async fn mark_all_read(&self, caller: &Principal, owner: &UserId) -> Result<u64, Error> {
        caller.ensure_owns(owner)?;
        Ok(self.repo.mark_all_read(owner).await?)
    }
}

/// Documents and transactions.
#[derive(Clone)]
pub struct ResourcesService {
    documents: Arc<dyn DocumentRepository>,
    transactions: Arc<dyn TransactionRepository>,
    clock: Arc<dyn Clock>,
}

impl ResourcesService {
    pub fn new(
        documents: Arc<dyn DocumentRepository>,
        transactions: Arc<dyn TransactionRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            documents,
            transactions,
            clock,
        }
    }

    pub async fn list_documents(
        &self,
        caller: &Principal,
        owner: &UserId,
    ) -> Result<Vec<Document>, Error> {
        caller.ensure_owns(owner)?;
        Ok(self.documents.list_by_user(owner).await?)
    }

    /// Record metadata for a document the caller uploaded. New documents
    /// always start `pending`.
    pub async fn add_document(&self, input: NewDocument) -> Result<Document, Error> {
        if input.name.trim().is_empty() || input.url.trim().is_empty() {
            return Err(Error::invalid_request("Document name and url are required"));
        }
        if input.size < 0 {
            return Err(Error::invalid_request("Document size must not be negative"));
        }
        let document = Document {
            id: Uuid::new_v4(),
            user_id: input.user_id,
            name: input.name,
            kind: input.kind,
            size: input.size,
            status: DocumentStatus::Pending,
            url: input.url,
            uploaded_at: self.clock.utc(),
        };
        self.documents.insert(&document).await?;
        Ok(document)
    }

    /// Review outcome set by an administrator.
    pub async fn set_document_status(
        &self,
        id: &Uuid,
        status: DocumentStatus,
    ) -> Result<Document, Error> {
        if status == DocumentStatus::Pending {
            return Err(Error::invalid_request(
                "Status must be verified or rejected",
            ));
        }
        self.documents
            .set_status(id, status)
            .await?
            .ok_or_else(|| Error::not_found("Document not found"))
    }

    pub async fn list_transactions(
        &self,
        caller: &Principal,
        owner: &UserId,
    ) -> Result<Vec<Transaction>, Error> {
        caller.ensure_owns(owner)?;
        Ok(self.transactions.list_by_user(owner).await?)
    }

    pub async fn record_transaction(&self, input: NewTransaction) -> Result<Transaction, Error> {
        if !input.amount.is_finite() || input.amount <= 0.0 {
            return Err(Error::invalid_request("Amount must be a positive number"));
        }
        if input.transaction_id.trim().is_empty() {
            return Err(Error::invalid_request("Transaction id is required"));
        }
        let transaction = Transaction {
            id: Uuid::new_v4(),
            user_id: input.user_id,
            amount: input.amount,
            status: input.status,
            method: input.method,
            description: input.description,
            transaction_id: input.transaction_id,
            created_at: self.clock.utc(),
        };
        self.transactions.insert(&transaction).await?;
        Ok(transaction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ErrorCode, NotificationKind, PaymentMethod, Role, TransactionStatus};
    use crate::outbound::memory::MemoryStore;
    use crate::test_support::{MutableClock, RecordingPublisher};
    use rstest::rstest;

    fn notifications() -> (NotificationService, Arc<RecordingPublisher>) {
        let publisher = Arc::new(RecordingPublisher::default());
        let service = NotificationService::new(
            Arc::new(MemoryStore::new()),
            publisher.clone(),
            MutableClock::fixed(),
        );
        (service, publisher)
    }

    fn resources() -> ResourcesService {
        let store = Arc::new(MemoryStore::new());
        ResourcesService::new(store.clone(), store, MutableClock::fixed())
    }

    fn note_for(user_id: UserId) -> NewNotification {
        NewNotification {
            user_id,
            title: "Hello".to_owned(),
            message: "World".to_owned(),
            kind: NotificationKind::Info,
        }
    }

    #[tokio::test]
    async fn notify_persists_then_publishes() {
        let (service, publisher) = notifications();
        let owner = UserId::random();
        let created = service.notify(note_for(owner)).await.expect("notify");
        let published = publisher.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, owner);
        assert_eq!(published[0].1.id, created.id);

        let caller = Principal::new(owner, Role::Customer);
        let listed = service.list(&caller, &owner).await.expect("list");
        assert_eq!(listed, vec![created]);
    }

    #[rstest]
    #[case(Role::Customer, false, Some(ErrorCode::Forbidden))]
    #[case(Role::Customer, true, None)]
    #[case(Role::Admin, false, None)]
    #[case(Role::SuperAdmin, false, Some(ErrorCode::Forbidden))]
    #[tokio::test]
    async fn mark_read_enforces_ownership(
        #[case] role: Role,
        #[case] own: bool,
        #[case] expected: Option<ErrorCode>,
    ) {
        let (service, _) = notifications();
        let owner = UserId::random();
        let created = service.notify(note_for(owner)).await.expect("notify");
        let caller = Principal::new(if own { owner } else { UserId::random() }, role);
        let result = service.mark_read(&caller, &created.id).await;
        match expected {
            None => assert!(result.expect("allowed").read),
            Some(code) => assert_eq!(result.expect_err("denied").code(), code),
        }
    }

    #[tokio::test]
    async fn mark_read_reports_missing_before_ownership() {
        let (service, _) = notifications();
        let caller = Principal::new(UserId::random(), Role::Customer);
        let err = service
            .mark_read(&caller, &Uuid::new_v4())
            .await
            .expect_err("missing");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn strangers_cannot_list_documents() {
        let service = resources();
        let caller = Principal::new(UserId::random(), Role::Broker);
        let err = service
            .list_documents(&caller, &UserId::random())
            .await
            .expect_err("denied");
        assert_eq!(err.code(), ErrorCode::Forbidden);
        assert_eq!(err.message(), "Access denied");
    }

    #[tokio::test]
    async fn documents_start_pending_and_can_be_verified() {
        let service = resources();
        let owner = UserId::random();
        let document = service
            .add_document(NewDocument {
                user_id: owner,
                name: "RERA certificate".to_owned(),
                kind: "application/pdf".to_owned(),
                size: 2048,
                url: "https://files.example.com/rera.pdf".to_owned(),
            })
            .await
            .expect("add");
        assert_eq!(document.status, DocumentStatus::Pending);

        let updated = service
            .set_document_status(&document.id, DocumentStatus::Verified)
            .await
            .expect("verify");
        assert_eq!(updated.status, DocumentStatus::Verified);
    }

    #[rstest]
    #[case(0.0)]
    #[case(-5.0)]
    #[case(f64::NAN)]
    #[tokio::test]
    async fn transactions_need_positive_amounts(#[case] amount: f64) {
        let err = resources()
            .record_transaction(NewTransaction {
                user_id: UserId::random(),
                amount,
                status: TransactionStatus::Completed,
                method: PaymentMethod::Razorpay,
                description: "Listing fee".to_owned(),
                transaction_id: "TXN-1".to_owned(),
            })
            .await
            .expect_err("invalid amount");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }
}
