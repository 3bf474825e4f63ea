//! Documents, transactions and notifications.
//!
//! Reads by owner pass when the caller is the owner or holds the `admin`
//! role; that rule lives in the domain services, these handlers only resolve
//! the caller.
//!
//! ```text
//! GET   /api/documents/{userId}
//! POST  /api/documents                      {"name","type","size","url"}
//! PATCH /api/documents/{id}/status          (admin) {"status":"verified"}
//! GET   /api/transactions/{userId}
//! POST  /api/transactions                   {"amount","method","transactionId",...}
//! GET   /api/notifications/{userId}
//! PATCH /api/notifications/{id}/read
//! PATCH /api/notifications/{userId}/read-all
//! ```

use actix_web::{HttpResponse, get, patch, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    AccessTier, Document, DocumentStatus, Error, NewDocument, NewTransaction, Notification,
    PaymentMethod, Transaction, TransactionStatus,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, parse_label, parse_user_id, parse_uuid, required,
};

const USER_ID: FieldName = FieldName::new("userId");
const ID: FieldName = FieldName::new("id");

/// Metadata for an uploaded document.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct DocumentRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub size: i64,
    #[serde(default)]
    pub url: String,
}

/// Review outcome for a document.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct DocumentStatusRequest {
    #[serde(default)]
    pub status: Option<String>,
}

/// A payment to record against the caller.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    #[serde(default)]
    pub amount: f64,
    /// Defaults to `completed`.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub transaction_id: String,
}

/// Bulk read acknowledgement.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadAllResponse {
    pub message: String,
    pub updated: u64,
}

/// Documents owned by a user.
#[utoipa::path(
    get,
    path = "/api/documents/{userId}",
    params(("userId" = String, Path, description = "Owner id")),
    responses(
        (status = 200, description = "Documents", body = [Document]),
        (status = 401, description = "Not signed in", body = Error),
        (status = 403, description = "Access denied", body = Error)
    ),
    tags = ["documents"],
    operation_id = "listDocuments"
)]
#[get("/documents/{userId}")]
pub async fn list_documents(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<Document>>> {
    let caller = state.require(&session, AccessTier::Authenticated).await?;
    let owner = parse_user_id(&path.into_inner(), USER_ID)?;
    Ok(web::Json(
        state.resources.list_documents(&caller, &owner).await?,
    ))
}

/// Record a document for the caller.
#[utoipa::path(
    post,
    path = "/api/documents",
    request_body = DocumentRequest,
    responses(
        (status = 201, description = "Document recorded", body = Document),
        (status = 400, description = "Invalid document", body = Error),
        (status = 401, description = "Not signed in", body = Error)
    ),
    tags = ["documents"],
    operation_id = "addDocument"
)]
#[post("/documents")]
pub async fn add_document(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<DocumentRequest>,
) -> ApiResult<HttpResponse> {
    let caller = state.require(&session, AccessTier::Authenticated).await?;
    let DocumentRequest {
        name,
        kind,
        size,
        url,
    } = payload.into_inner();
    let document = state
        .resources
        .add_document(NewDocument {
            user_id: caller.user_id,
            name,
            kind,
            size,
            url,
        })
        .await?;
    Ok(HttpResponse::Created().json(document))
}

/// Mark a document verified or rejected.
#[utoipa::path(
    patch,
    path = "/api/documents/{id}/status",
    params(("id" = String, Path, description = "Document id")),
    request_body = DocumentStatusRequest,
    responses(
        (status = 200, description = "Updated document", body = Document),
        (status = 400, description = "Invalid status", body = Error),
        (status = 403, description = "Admin access required", body = Error),
        (status = 404, description = "Document not found", body = Error)
    ),
    tags = ["documents"],
    operation_id = "setDocumentStatus"
)]
#[patch("/documents/{id}/status")]
pub async fn set_document_status(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<DocumentStatusRequest>,
) -> ApiResult<web::Json<Document>> {
    state.require(&session, AccessTier::Admin).await?;
    let id = parse_uuid(&path.into_inner(), ID)?;
    let field = FieldName::new("status");
    let raw = required(payload.into_inner().status, field, "Status is required")?;
    let status = parse_label::<DocumentStatus>(&raw, field)?;
    Ok(web::Json(
        state.resources.set_document_status(&id, status).await?,
    ))
}

/// Transactions owned by a user, newest first.
#[utoipa::path(
    get,
    path = "/api/transactions/{userId}",
    params(("userId" = String, Path, description = "Owner id")),
    responses(
        (status = 200, description = "Transactions", body = [Transaction]),
        (status = 401, description = "Not signed in", body = Error),
        (status = 403, description = "Access denied", body = Error)
    ),
    tags = ["transactions"],
    operation_id = "listTransactions"
)]
#[get("/transactions/{userId}")]
pub async fn list_transactions(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<Transaction>>> {
    let caller = state.require(&session, AccessTier::Authenticated).await?;
    let owner = parse_user_id(&path.into_inner(), USER_ID)?;
    Ok(web::Json(
        state.resources.list_transactions(&caller, &owner).await?,
    ))
}

/// Record a payment made by the caller.
#[utoipa::path(
    post,
    path = "/api/transactions",
    request_body = TransactionRequest,
    responses(
        (status = 201, description = "Transaction recorded", body = Transaction),
        (status = 400, description = "Invalid transaction", body = Error),
        (status = 401, description = "Not signed in", body = Error)
    ),
    tags = ["transactions"],
    operation_id = "recordTransaction"
)]
#[post("/transactions")]
pub async fn record_transaction(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<TransactionRequest>,
) -> ApiResult<HttpResponse> {
    let caller = state.require(&session, AccessTier::Authenticated).await?;
    let TransactionRequest {
        amount,
        status,
        method,
        description,
        transaction_id,
    } = payload.into_inner();
    let method_field = FieldName::new("method");
    let method = required(method, method_field, "Payment method is required")?;
    let status = status
        .filter(|s| !s.trim().is_empty())
        .map(|raw| parse_label::<TransactionStatus>(&raw, FieldName::new("status")))
        .transpose()?
        .unwrap_or(TransactionStatus::Completed);
    let transaction = state
        .resources
        .record_transaction(NewTransaction {
            user_id: caller.user_id,
            amount,
            status,
            method: parse_label::<PaymentMethod>(&method, method_field)?,
            description,
            transaction_id,
        })
        .await?;
    Ok(HttpResponse::Created().json(transaction))
}

/// Notifications addressed to a user, newest first.
#[utoipa::path(
    get,
    path = "/api/notifications/{userId}",
    params(("userId" = String, Path, description = "Owner id")),
    responses(
        (status = 200, description = "Notifications", body = [Notification]),
        (status = 401, description = "Not signed in", body = Error),
        (status = 403, description = "Access denied", body = Error)
    ),
    tags = ["notifications"],
    operation_id = "listNotifications"
)]
#[get("/notifications/{userId}")]
pub async fn list_notifications(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<Notification>>> {
    let caller = state.require(&session, AccessTier::Authenticated).await?;
    let owner = parse_user_id(&path.into_inner(), USER_ID)?;
    Ok(web::Json(state.notifications.list(&caller, &owner).await?))
}

/// Mark one notification read.
#[utoipa::path(
    patch,
    path = "/api/notifications/{id}/read",
    params(("id" = String, Path, description = "Notification id")),
    responses(
        (status = 200, description = "Updated notification", body = Notification),
        (status = 403, description = "Access denied", body = Error),
        (status = 404, description = "Notification not found", body = Error)
    ),
    tags = ["notifications"],
    operation_id = "markNotificationRead"
)]
#[patch("/notifications/{id}/read")]
pub async fn mark_notification_read(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<Notification>> {
    let caller = state.require(&session, AccessTier::Authenticated).await?;
    let id = parse_uuid(&path.into_inner(), ID)?;
    Ok(web::Json(state.notifications.mark_read(&caller, &id).await?))
}

/// Mark every notification of a user read.
#[utoipa::path(
    patch,
    path = "/api/notifications/{userId}/read-all",
    params(("userId" = String, Path, description = "Owner id")),
    responses(
        (status = 200, description = "Notifications updated", body = ReadAllResponse),
        (status = 403, description = "Access denied", body = Error)
    ),
    tags = ["notifications"],
    operation_id = "markAllNotificationsRead"
)]
#[patch("/notifications/{userId}/read-all")]
pub async fn mark_all_notifications_read(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<ReadAllResponse>> {
    let caller = state.require(&session, AccessTier::Authenticated).await?;
    let owner = parse_user_id(&path.into_inner(), USER_ID)?;
    let updated = state.notifications.mark_all_read(&caller, &owner).await?;
    Ok(web::Json(ReadAllResponse {
        message: "All notifications marked as read".to_owned(),
        updated,
    }))
}
