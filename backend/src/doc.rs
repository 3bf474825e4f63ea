//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every REST handler under `/api`, the health checks
//! and the session cookie security scheme. Request and response bodies are
//! collected from the handler annotations; the shared error payload and the
//! user record are listed explicitly because most handlers only reference
//! them indirectly.
//!
//! The document backs Swagger UI in debug builds.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{Error, ErrorCode, User};
use crate::inbound::http::{auth, health, map, resources, stats, users, verifications};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/auth/login or POST /api/auth/signup.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Estate platform API",
        description = "Accounts, verification, owned records, map registrations and admin statistics."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        auth::request_signup_otp,
        auth::signup,
        auth::login,
        auth::logout,
        auth::me,
        auth::request_password_reset,
        auth::confirm_password_reset,
        auth::update_profile,
        users::list_users,
        users::assign_role,
        users::get_user,
        users::update_user,
        users::delete_user,
        users::users_by_role,
        users::create_admin,
        verifications::submit_verification,
        verifications::list_verifications,
        verifications::approve_verification,
        verifications::reject_verification,
        resources::list_documents,
        resources::add_document,
        resources::set_document_status,
        resources::list_transactions,
        resources::record_transaction,
        resources::list_notifications,
        resources::mark_notification_read,
        resources::mark_all_notifications_read,
        map::check_registration,
        map::register,
        map::list_registrations,
        map::unregister,
        map::boundary,
        map::geocode,
        stats::admin_stats,
        stats::admin_analytics,
        stats::superadmin_stats,
        health::api_health,
        health::ready,
        health::live,
    ),
    components(schemas(Error, ErrorCode, User)),
    tags(
        (name = "auth", description = "Sign-up, sign-in and profile"),
        (name = "users", description = "User administration"),
        (name = "verifications", description = "Vendor and broker applications"),
        (name = "documents", description = "Owned documents"),
        (name = "transactions", description = "Owned payment records"),
        (name = "notifications", description = "Owned notifications"),
        (name = "map", description = "Map registrations and geocoding"),
        (name = "admin", description = "Admin statistics"),
        (name = "superadmin", description = "Super admin statistics"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
