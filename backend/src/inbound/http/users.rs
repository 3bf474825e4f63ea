//! User administration handlers.
//!
//! ```text
//! GET    /api/users                       (admin)
//! POST   /api/users/admin                 (admin)  {"email","role"}
//! GET    /api/users/{id}                  (self or admin)
//! PUT    /api/users/{id}                  (admin)  {"role","status","name","phone","company"}
//! DELETE /api/users/{id}                  (admin)
//! GET    /api/superadmin/users/by-role    (superadmin) ?role=
//! POST   /api/superadmin/create-admin     (superadmin) {"email","role"}
//! ```

use actix_web::{delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{AccessTier, AdminUserUpdate, Email, Error, Role, User, UserStatus};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::MessageResponse;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, missing_field_error, parse_email, parse_label, parse_user_id,
};

const ID: FieldName = FieldName::new("id");
const ROLE: FieldName = FieldName::new("role");
const EMAIL: FieldName = FieldName::new("email");

/// Body for role assignment and admin creation.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct RoleAssignment {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl RoleAssignment {
    fn parse(self) -> Result<(Email, Role), Error> {
        const MESSAGE: &str = "Email and role are required";
        let present = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        let Some(email) = present(self.email) else {
            return Err(missing_field_error(EMAIL, MESSAGE));
        };
        let Some(role) = present(self.role) else {
            return Err(missing_field_error(ROLE, MESSAGE));
        };
        Ok((parse_email(&email, EMAIL)?, parse_label(&role, ROLE)?))
    }
}

/// Partial update accepted by `PUT /api/users/{id}`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct UserUpdateRequest {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
}

impl TryFrom<UserUpdateRequest> for AdminUserUpdate {
    type Error = Error;

    fn try_from(value: UserUpdateRequest) -> Result<Self, Self::Error> {
        let present = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        Ok(Self {
            role: present(value.role)
                .map(|raw| parse_label::<Role>(&raw, ROLE))
                .transpose()?,
            status: present(value.status)
                .map(|raw| parse_label::<UserStatus>(&raw, FieldName::new("status")))
                .transpose()?,
            name: value.name,
            phone: value.phone,
            company: value.company,
        })
    }
}

/// Role change acknowledgement.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserChangeResponse {
    pub message: String,
    pub user: User,
}

/// Optional role filter.
#[derive(Debug, Deserialize, IntoParams)]
pub struct RoleQuery {
    pub role: Option<String>,
}

/// List every account.
#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "Users", body = [User]),
        (status = 401, description = "Not signed in", body = Error),
        (status = 403, description = "Admin access required", body = Error)
    ),
    tags = ["users"],
    operation_id = "listUsers"
)]
#[get("/users")]
pub async fn list_users(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<User>>> {
    state.require(&session, AccessTier::Admin).await?;
    Ok(web::Json(state.users.list(None).await?))
}

/// Assign a role to an existing account.
#[utoipa::path(
    post,
    path = "/api/users/admin",
    request_body = RoleAssignment,
    responses(
        (status = 200, description = "Role assigned", body = UserChangeResponse),
        (status = 400, description = "Missing email or role", body = Error),
        (status = 403, description = "Admin access required", body = Error),
        (status = 404, description = "User must sign up first", body = Error)
    ),
    tags = ["users"],
    operation_id = "assignRole"
)]
#[post("/users/admin")]
pub async fn assign_role(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<RoleAssignment>,
) -> ApiResult<web::Json<UserChangeResponse>> {
    state.require(&session, AccessTier::Admin).await?;
    let (email, role) = payload.into_inner().parse()?;
    let user = state.users.assign_role(&email, role).await?;
    Ok(web::Json(UserChangeResponse {
        message: format!("Role updated to {role}"),
        user,
    }))
}

/// Fetch one account. Callers other than the owner need the `admin` role.
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "User", body = User),
        (status = 403, description = "Access denied", body = Error),
        (status = 404, description = "User not found", body = Error)
    ),
    tags = ["users"],
    operation_id = "getUser"
)]
#[get("/users/{id}")]
pub async fn get_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<User>> {
    let caller = state.require(&session, AccessTier::Authenticated).await?;
    let id = parse_user_id(&path.into_inner(), ID)?;
    Ok(web::Json(state.users.get(&caller, &id).await?))
}

/// Apply an administrator's partial update.
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = String, Path, description = "User id")),
    request_body = UserUpdateRequest,
    responses(
        (status = 200, description = "Updated user", body = User),
        (status = 400, description = "Unknown role or status", body = Error),
        (status = 403, description = "Admin access required", body = Error),
        (status = 404, description = "User not found", body = Error)
    ),
    tags = ["users"],
    operation_id = "updateUser"
)]
#[put("/users/{id}")]
pub async fn update_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<UserUpdateRequest>,
) -> ApiResult<web::Json<User>> {
    state.require(&session, AccessTier::Admin).await?;
    let id = parse_user_id(&path.into_inner(), ID)?;
    let update = AdminUserUpdate::try_from(payload.into_inner())?;
    Ok(web::Json(state.users.update(&id, update).await?))
}

/// Hard-delete an account.
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 403, description = "Admin access required", body = Error),
        (status = 404, description = "User not found", body = Error)
    ),
    tags = ["users"],
    operation_id = "deleteUser"
)]
#[delete("/users/{id}")]
pub async fn delete_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<MessageResponse>> {
    state.require(&session, AccessTier::Admin).await?;
    let id = parse_user_id(&path.into_inner(), ID)?;
    state.users.delete(&id).await?;
    Ok(web::Json(MessageResponse::new("User deleted successfully")))
}

/// Accounts filtered by role; every account when no role is given.
#[utoipa::path(
    get,
    path = "/api/superadmin/users/by-role",
    params(RoleQuery),
    responses(
        (status = 200, description = "Users", body = [User]),
        (status = 400, description = "Unknown role", body = Error),
        (status = 403, description = "Super Admin access required", body = Error)
    ),
    tags = ["superadmin"],
    operation_id = "usersByRole"
)]
#[get("/superadmin/users/by-role")]
pub async fn users_by_role(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<RoleQuery>,
) -> ApiResult<web::Json<Vec<User>>> {
    state.require(&session, AccessTier::SuperAdmin).await?;
    let role = query
        .into_inner()
        .role
        .filter(|r| !r.trim().is_empty())
        .map(|raw| parse_label::<Role>(&raw, ROLE))
        .transpose()?;
    Ok(web::Json(state.users.list(role).await?))
}

/// Promote an existing account to admin or superadmin.
#[utoipa::path(
    post,
    path = "/api/superadmin/create-admin",
    request_body = RoleAssignment,
    responses(
        (status = 200, description = "Administrator created", body = UserChangeResponse),
        (status = 400, description = "Invalid role", body = Error),
        (status = 403, description = "Super Admin access required", body = Error),
        (status = 404, description = "User must sign up first", body = Error)
    ),
    tags = ["superadmin"],
    operation_id = "createAdmin"
)]
#[post("/superadmin/create-admin")]
pub async fn create_admin(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<RoleAssignment>,
) -> ApiResult<web::Json<UserChangeResponse>> {
    state.require(&session, AccessTier::SuperAdmin).await?;
    let (email, role) = payload.into_inner().parse()?;
    let user = state.users.create_admin(&email, role).await?;
    Ok(web::Json(UserChangeResponse {
        message: format!("{role} account created"),
        user,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inbound::http::test_utils::{Harness, json_body, login_cookie, test_app};
    use actix_web::http::StatusCode;
    use actix_web::test;
    use rstest::rstest;
    use serde_json::json;

    #[actix_web::test]
    async fn listing_users_needs_an_admin() {
        let harness = Harness::new();
        harness.seed(Role::Customer, "c@x.com", "pw").await;
        harness.seed(Role::Admin, "a@x.com", "pw").await;
        let app = test::init_service(test_app(harness.state.clone())).await;

        let res = test::call_service(&app, test::TestRequest::get().uri("/api/users").to_request())
            .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let customer = login_cookie(&app, "c@x.com", "pw").await;
        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/users")
                .cookie(customer)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert_eq!(json_body(res).await["message"], "Admin access required");

        let admin = login_cookie(&app, "a@x.com", "pw").await;
        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/users").cookie(admin).to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = json_body(res).await;
        let users = body.as_array().expect("array");
        assert_eq!(users.len(), 2);
        assert!(users.iter().all(|u| u.get("passwordHash").is_none()));
    }

    #[rstest]
    #[case::owner("self@x.com", StatusCode::OK)]
    #[case::admin("admin@x.com", StatusCode::OK)]
    #[case::stranger("other@x.com", StatusCode::FORBIDDEN)]
    #[case::superadmin("root@x.com", StatusCode::FORBIDDEN)]
    #[actix_web::test]
    async fn single_user_is_visible_to_owner_and_admin(
        #[case] caller: &str,
        #[case] expected: StatusCode,
    ) {
        let harness = Harness::new();
        let target = harness.seed(Role::Customer, "self@x.com", "pw").await;
        harness.seed(Role::Admin, "admin@x.com", "pw").await;
        harness.seed(Role::Investor, "other@x.com", "pw").await;
        harness.seed(Role::SuperAdmin, "root@x.com", "pw").await;
        let app = test::init_service(test_app(harness.state.clone())).await;
        let cookie = login_cookie(&app, caller, "pw").await;

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri(&format!("/api/users/{}", target.id))
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), expected);
    }

    #[actix_web::test]
    async fn missing_user_is_404_before_ownership() {
        let harness = Harness::new();
        harness.seed(Role::Customer, "c@x.com", "pw").await;
        let app = test::init_service(test_app(harness.state.clone())).await;
        let cookie = login_cookie(&app, "c@x.com", "pw").await;
        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri(&format!("/api/users/{}", crate::domain::UserId::random()))
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn admin_updates_and_deletes() {
        let harness = Harness::new();
        let target = harness.seed(Role::Customer, "c@x.com", "pw").await;
        harness.seed(Role::Admin, "a@x.com", "pw").await;
        let app = test::init_service(test_app(harness.state.clone())).await;
        let admin = login_cookie(&app, "a@x.com", "pw").await;
        let uri = format!("/api/users/{}", target.id);

        let res = test::call_service(
            &app,
            test::TestRequest::put()
                .uri(&uri)
                .cookie(admin.clone())
                .set_json(json!({ "status": "inactive", "company": "" }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = json_body(res).await;
        assert_eq!(body["status"], "inactive");
        assert_eq!(body["role"], "customer");

        let res = test::call_service(
            &app,
            test::TestRequest::put()
                .uri(&uri)
                .cookie(admin.clone())
                .set_json(json!({ "role": "landlord" }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let res = test::call_service(
            &app,
            test::TestRequest::delete()
                .uri(&uri)
                .cookie(admin.clone())
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(json_body(res).await["message"], "User deleted successfully");

        let res = test::call_service(
            &app,
            test::TestRequest::delete().uri(&uri).cookie(admin).to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[rstest]
    #[case(json!({ "role": "vendor" }), StatusCode::BAD_REQUEST)]
    #[case(json!({ "email": "ghost@x.com", "role": "vendor" }), StatusCode::NOT_FOUND)]
    #[case(json!({ "email": "c@x.com", "role": "vendor" }), StatusCode::OK)]
    #[actix_web::test]
    async fn role_assignment_requires_a_signed_up_user(
        #[case] body: serde_json::Value,
        #[case] expected: StatusCode,
    ) {
        let harness = Harness::new();
        harness.seed(Role::Customer, "c@x.com", "pw").await;
        harness.seed(Role::Admin, "a@x.com", "pw").await;
        let app = test::init_service(test_app(harness.state.clone())).await;
        let admin = login_cookie(&app, "a@x.com", "pw").await;
        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/users/admin")
                .cookie(admin)
                .set_json(body)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), expected);
    }

    #[actix_web::test]
    async fn superadmin_routes_reject_plain_admins() {
        let harness = Harness::new();
        harness.seed(Role::Admin, "a@x.com", "pw").await;
        let app = test::init_service(test_app(harness.state.clone())).await;
        let admin = login_cookie(&app, "a@x.com", "pw").await;
        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/superadmin/users/by-role?role=admin")
                .cookie(admin)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert_eq!(json_body(res).await["message"], "Super Admin access required");
    }

    #[actix_web::test]
    async fn superadmin_creates_admins_and_filters_by_role() {
        let harness = Harness::new();
        harness.seed(Role::SuperAdmin, "root@x.com", "pw").await;
        harness.seed(Role::Customer, "c@x.com", "pw").await;
        let app = test::init_service(test_app(harness.state.clone())).await;
        let root = login_cookie(&app, "root@x.com", "pw").await;

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/superadmin/create-admin")
                .cookie(root.clone())
                .set_json(json!({ "email": "c@x.com", "role": "broker" }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(res).await["message"],
            "Invalid role. Must be admin or superadmin"
        );

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/superadmin/create-admin")
                .cookie(root.clone())
                .set_json(json!({ "email": "c@x.com", "role": "admin" }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = json_body(res).await;
        assert_eq!(body["user"]["role"], "admin");
        assert_eq!(body["user"]["status"], "active");

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/superadmin/users/by-role?role=admin")
                .cookie(root)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = json_body(res).await;
        assert_eq!(body.as_array().map(Vec::len), Some(1));
    }
}
