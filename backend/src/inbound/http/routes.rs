//! Route table for everything under `/api`.
//!
//! The server mounts this inside a scope wrapped by the session middleware;
//! tests mount the same table so handlers are exercised exactly as served.

use actix_web::web;

use super::error::{json_error_handler, query_error_handler};
use super::{auth, health, map, resources, stats, users, verifications};

/// Register every `/api` handler on `cfg`.
///
/// Literal segments come before parameterised siblings (`/users/admin`
/// ahead of `/users/{id}`).
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .service(health::api_health)
        // auth
        .service(auth::request_signup_otp)
        .service(auth::signup)
        .service(auth::login)
        .service(auth::logout)
        .service(auth::me)
        .service(auth::request_password_reset)
        .service(auth::confirm_password_reset)
        .service(auth::update_profile)
        // users
        .service(users::list_users)
        .service(users::assign_role)
        .service(users::get_user)
        .service(users::update_user)
        .service(users::delete_user)
        .service(users::users_by_role)
        .service(users::create_admin)
        // verifications
        .service(verifications::submit_verification)
        .service(verifications::list_verifications)
        .service(verifications::approve_verification)
        .service(verifications::reject_verification)
        // owned resources
        .service(resources::add_document)
        .service(resources::set_document_status)
        .service(resources::list_documents)
        .service(resources::record_transaction)
        .service(resources::list_transactions)
        .service(resources::mark_notification_read)
        .service(resources::mark_all_notifications_read)
        .service(resources::list_notifications)
        // map
        .service(map::check_registration)
        .service(map::register)
        .service(map::list_registrations)
        .service(map::unregister)
        .service(map::boundary)
        .service(map::geocode)
        // stats
        .service(stats::admin_stats)
        .service(stats::admin_analytics)
        .service(stats::superadmin_stats);
}
