//! Authentication handlers.
//!
//! ```text
//! POST /api/auth/signup/request-otp   {"email":"a@x.com"}
//! POST /api/auth/signup               {"name","email","password","role","otp",...}
//! POST /api/auth/login                {"email","password"}
//! POST /api/auth/logout
//! GET  /api/auth/me
//! POST /api/auth/password-reset/request  {"email"}
//! POST /api/auth/password-reset/confirm  {"email","otp","newPassword"}
//! PUT  /api/auth/profile              {"name","phone","company","avatar"}
//! ```

use actix_web::{HttpResponse, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    AccessTier, Error, OtpCode, Principal, ProfileUpdate, Role, SignupOutcome, SignupRequest, User,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_email, parse_label, required};

const EMAIL: FieldName = FieldName::new("email");
const PASSWORD: FieldName = FieldName::new("password");
const OTP: FieldName = FieldName::new("otp");

/// Body carrying only an email address.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmailRequest {
    #[serde(default)]
    pub email: Option<String>,
}

/// Signup form.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupBody {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Defaults to `customer`.
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub otp: Option<String>,
    #[serde(default)]
    pub rera_id: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
}

/// Login form.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Password reset completion form.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetConfirmRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub otp: Option<String>,
    #[serde(default)]
    pub new_password: Option<String>,
}

/// Self-service profile edit.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// Plain acknowledgement.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Response for a signup that created an account.
#[derive(Debug, Serialize, ToSchema)]
pub struct SignupResponse {
    pub message: String,
    pub user: User,
}

/// Response for a signup staged for review.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PendingSignupResponse {
    pub message: String,
    pub verification_id: String,
}

impl SignupBody {
    fn into_request(self) -> Result<SignupRequest, Error> {
        let email = required(self.email, EMAIL, "Email is required")?;
        let role = match self.role.filter(|r| !r.trim().is_empty()) {
            Some(raw) => parse_label::<Role>(&raw, FieldName::new("role"))?,
            None => Role::default(),
        };
        Ok(SignupRequest {
            name: required(self.name, FieldName::new("name"), "Name is required")?,
            email: parse_email(&email, EMAIL)?,
            password: required(self.password, PASSWORD, "Password is required")?,
            role,
            otp: OtpCode::new(required(self.otp, OTP, "OTP is required")?),
            rera_id: self.rera_id,
            phone: self.phone,
            company: self.company,
        })
    }
}

/// Mail a signup code.
#[utoipa::path(
    post,
    path = "/api/auth/signup/request-otp",
    request_body = EmailRequest,
    responses(
        (status = 200, description = "Code sent", body = MessageResponse),
        (status = 400, description = "Invalid or registered email", body = Error),
        (status = 503, description = "Mail delivery failed", body = Error)
    ),
    tags = ["auth"],
    operation_id = "requestSignupOtp",
    security([])
)]
#[post("/auth/signup/request-otp")]
pub async fn request_signup_otp(
    state: web::Data<HttpState>,
    payload: web::Json<EmailRequest>,
) -> ApiResult<web::Json<MessageResponse>> {
    let raw = required(payload.into_inner().email, EMAIL, "Email is required")?;
    let email = parse_email(&raw, EMAIL)?;
    state.auth.request_signup_otp(&email).await?;
    Ok(web::Json(MessageResponse::new("OTP sent to your email")))
}

/// Register an account.
///
/// Vendors and brokers are staged for review and receive `202`; every other
/// self-assignable role is created immediately and signed in.
#[utoipa::path(
    post,
    path = "/api/auth/signup",
    request_body = SignupBody,
    responses(
        (status = 201, description = "Account created", body = SignupResponse,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 202, description = "Submitted for verification", body = PendingSignupResponse),
        (status = 400, description = "Invalid request or OTP", body = Error),
        (status = 409, description = "Application already pending", body = Error)
    ),
    tags = ["auth"],
    operation_id = "signup",
    security([])
)]
#[post("/auth/signup")]
pub async fn signup(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<SignupBody>,
) -> ApiResult<HttpResponse> {
    let request = payload.into_inner().into_request()?;
    match state.auth.signup(request).await? {
        SignupOutcome::Registered(user) => {
            session.persist_principal(&Principal::new(user.id, user.role))?;
            Ok(HttpResponse::Created().json(SignupResponse {
                message: "Account created successfully".to_owned(),
                user,
            }))
        }
        SignupOutcome::PendingVerification(record) => {
            Ok(HttpResponse::Accepted().json(PendingSignupResponse {
                message: "Your application has been submitted for verification".to_owned(),
                verification_id: record.id.to_string(),
            }))
        }
    }
}

/// Authenticate and establish a session.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = User,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Invalid credentials", body = Error),
        (status = 403, description = "Account inactive", body = Error)
    ),
    tags = ["auth"],
    operation_id = "login",
    security([])
)]
#[post("/auth/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<User>> {
    let LoginRequest { email, password } = payload.into_inner();
    let email = required(email, EMAIL, "Email and password are required")?;
    let password = required(password, PASSWORD, "Email and password are required")?;
    let email = parse_email(&email, EMAIL)?;
    let user = state.auth.login(&email, &password).await?;
    session.persist_principal(&Principal::new(user.id, user.role))?;
    Ok(web::Json(user))
}

/// End the session.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses((status = 200, description = "Signed out", body = MessageResponse)),
    tags = ["auth"],
    operation_id = "logout",
    security([])
)]
#[post("/auth/logout")]
pub async fn logout(session: SessionContext) -> web::Json<MessageResponse> {
    session.purge();
    web::Json(MessageResponse::new("Logged out successfully"))
}

/// The signed-in account.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Not signed in", body = Error)
    ),
    tags = ["auth"],
    operation_id = "currentUser"
)]
#[get("/auth/me")]
pub async fn me(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<User>> {
    let principal = state.require(&session, AccessTier::Authenticated).await?;
    Ok(web::Json(state.auth.current_user(&principal.user_id).await?))
}

/// Start a password reset. The answer is identical whether or not the
/// address is registered.
#[utoipa::path(
    post,
    path = "/api/auth/password-reset/request",
    request_body = EmailRequest,
    responses(
        (status = 200, description = "Request accepted", body = MessageResponse),
        (status = 400, description = "Invalid email", body = Error)
    ),
    tags = ["auth"],
    operation_id = "requestPasswordReset",
    security([])
)]
#[post("/auth/password-reset/request")]
pub async fn request_password_reset(
    state: web::Data<HttpState>,
    payload: web::Json<EmailRequest>,
) -> ApiResult<web::Json<MessageResponse>> {
    let raw = required(payload.into_inner().email, EMAIL, "Email is required")?;
    let email = parse_email(&raw, EMAIL)?;
    state.auth.request_password_reset(&email).await?;
    Ok(web::Json(MessageResponse::new(
        "If the email is registered, a reset code has been sent",
    )))
}

/// Finish a password reset.
#[utoipa::path(
    post,
    path = "/api/auth/password-reset/confirm",
    request_body = ResetConfirmRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Invalid request or OTP", body = Error)
    ),
    tags = ["auth"],
    operation_id = "confirmPasswordReset",
    security([])
)]
#[post("/auth/password-reset/confirm")]
pub async fn confirm_password_reset(
    state: web::Data<HttpState>,
    payload: web::Json<ResetConfirmRequest>,
) -> ApiResult<web::Json<MessageResponse>> {
    let ResetConfirmRequest {
        email,
        otp,
        new_password,
    } = payload.into_inner();
    let email = parse_email(&required(email, EMAIL, "Email is required")?, EMAIL)?;
    let otp = OtpCode::new(required(otp, OTP, "OTP is required")?);
    let new_password = required(
        new_password,
        FieldName::new("newPassword"),
        "New password is required",
    )?;
    state
        .auth
        .confirm_password_reset(&email, &otp, &new_password)
        .await?;
    Ok(web::Json(MessageResponse::new("Password reset successfully")))
}

/// Edit the caller's own profile.
#[utoipa::path(
    put,
    path = "/api/auth/profile",
    request_body = ProfileRequest,
    responses(
        (status = 200, description = "Updated user", body = User),
        (status = 401, description = "Not signed in", body = Error)
    ),
    tags = ["auth"],
    operation_id = "updateProfile"
)]
#[put("/auth/profile")]
pub async fn update_profile(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<ProfileRequest>,
) -> ApiResult<web::Json<User>> {
    let principal = state.require(&session, AccessTier::Authenticated).await?;
    let ProfileRequest {
        name,
        phone,
        company,
        avatar,
    } = payload.into_inner();
    let user = state
        .auth
        .update_profile(
            &principal.user_id,
            ProfileUpdate {
                name,
                phone,
                company,
                avatar,
            },
        )
        .await?;
    Ok(web::Json(user))
}
