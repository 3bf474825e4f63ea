//! Vendor and broker verification handlers.
//!
//! ```text
//! POST /api/verifications                 (public)
//! GET  /api/verifications?status=pending  (admin)
//! POST /api/verifications/{id}/approve    (admin)
//! POST /api/verifications/{id}/reject     (admin) {"reason":"..."}
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    AccessTier, Application, Email, Error, Role, User, UserId, Verification, VerificationStatus,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::{MessageResponse, PendingSignupResponse};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_email, parse_label, parse_uuid, required};

const ID: FieldName = FieldName::new("id");

/// Application submitted without an account.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub rera_id: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
}

impl ApplicationRequest {
    fn into_application(self) -> Result<Application, Error> {
        let email = required(self.email, FieldName::new("email"), "Email is required")?;
        let role = required(self.role, FieldName::new("role"), "Role is required")?;
        Ok(Application {
            name: self.name,
            email: parse_email(&email, FieldName::new("email"))?,
            password: self.password,
            role: parse_label(&role, FieldName::new("role"))?,
            rera_id: self.rera_id,
            phone: self.phone,
            company: self.company,
        })
    }
}

/// Optional status filter.
#[derive(Debug, Deserialize, IntoParams)]
pub struct StatusQuery {
    pub status: Option<String>,
}

/// Rejection body.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct RejectRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

/// Summary of the account created by an approval.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApprovedUser {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rera_id: Option<String>,
}

impl From<User> for ApprovedUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            rera_id: user.rera_id,
        }
    }
}

/// Approval response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApprovalResponse {
    pub message: String,
    pub user: ApprovedUser,
}

/// Stage an application for review.
#[utoipa::path(
    post,
    path = "/api/verifications",
    request_body = ApplicationRequest,
    responses(
        (status = 201, description = "Application submitted", body = PendingSignupResponse),
        (status = 400, description = "Invalid application", body = Error),
        (status = 409, description = "Application already pending", body = Error)
    ),
    tags = ["verifications"],
    operation_id = "submitVerification",
    security([])
)]
#[post("/verifications")]
pub async fn submit_verification(
    state: web::Data<HttpState>,
    payload: web::Json<ApplicationRequest>,
) -> ApiResult<HttpResponse> {
    let application = payload.into_inner().into_application()?;
    let record = state.verifications.submit(application).await?;
    Ok(HttpResponse::Created().json(PendingSignupResponse {
        message: "Verification request submitted".to_owned(),
        verification_id: record.id.to_string(),
    }))
}

/// Applications, newest first.
#[utoipa::path(
    get,
    path = "/api/verifications",
    params(StatusQuery),
    responses(
        (status = 200, description = "Applications", body = [Verification]),
        (status = 400, description = "Unknown status", body = Error),
        (status = 403, description = "Admin access required", body = Error)
    ),
    tags = ["verifications"],
    operation_id = "listVerifications"
)]
#[get("/verifications")]
pub async fn list_verifications(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<StatusQuery>,
) -> ApiResult<web::Json<Vec<Verification>>> {
    state.require(&session, AccessTier::Admin).await?;
    let status = query
        .into_inner()
        .status
        .filter(|s| !s.trim().is_empty())
        .map(|raw| parse_label::<VerificationStatus>(&raw, FieldName::new("status")))
        .transpose()?;
    Ok(web::Json(state.verifications.list(status).await?))
}

/// Approve an application and create its account.
#[utoipa::path(
    post,
    path = "/api/verifications/{id}/approve",
    params(("id" = String, Path, description = "Verification id")),
    responses(
        (status = 200, description = "Approved", body = ApprovalResponse),
        (status = 400, description = "Already processed or email registered", body = Error),
        (status = 403, description = "Admin access required", body = Error),
        (status = 404, description = "Verification not found", body = Error)
    ),
    tags = ["verifications"],
    operation_id = "approveVerification"
)]
#[post("/verifications/{id}/approve")]
pub async fn approve_verification(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<ApprovalResponse>> {
    let reviewer = state.require(&session, AccessTier::Admin).await?;
    let id = parse_uuid(&path.into_inner(), ID)?;
    let (_, user) = state.verifications.approve(&id, &reviewer.user_id).await?;
    Ok(web::Json(ApprovalResponse {
        message: "User approved and account created".to_owned(),
        user: user.into(),
    }))
}

/// Reject an application with a reason.
#[utoipa::path(
    post,
    path = "/api/verifications/{id}/reject",
    params(("id" = String, Path, description = "Verification id")),
    request_body = RejectRequest,
    responses(
        (status = 200, description = "Rejected", body = MessageResponse),
        (status = 400, description = "Missing reason or already processed", body = Error),
        (status = 403, description = "Admin access required", body = Error),
        (status = 404, description = "Verification not found", body = Error)
    ),
    tags = ["verifications"],
    operation_id = "rejectVerification"
)]
#[post("/verifications/{id}/reject")]
pub async fn reject_verification(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<RejectRequest>,
) -> ApiResult<web::Json<MessageResponse>> {
    let reviewer = state.require(&session, AccessTier::Admin).await?;
    let id = parse_uuid(&path.into_inner(), ID)?;
    let reason = required(
        payload.into_inner().reason,
        FieldName::new("reason"),
        "Rejection reason is required",
    )?;
    state
        .verifications
        .reject(&id, &reviewer.user_id, &reason)
        .await?;
    Ok(web::Json(MessageResponse::new("Verification rejected")))
}
