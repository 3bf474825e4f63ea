//! Aggregate reporting for the admin dashboards.
//!
//! ```text
//! GET /api/admin/stats         (admin)
//! GET /api/admin/analytics     (admin)
//! GET /api/superadmin/stats    (superadmin)
//! ```

use actix_web::{get, web};

use crate::domain::{AccessTier, Analytics, Error, PlatformStats, SuperAdminStats};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Headline user and revenue figures.
#[utoipa::path(
    get,
    path = "/api/admin/stats",
    responses(
        (status = 200, description = "Platform stats", body = PlatformStats),
        (status = 401, description = "Not signed in", body = Error),
        (status = 403, description = "Admin access required", body = Error)
    ),
    tags = ["admin"],
    operation_id = "adminStats"
)]
#[get("/admin/stats")]
pub async fn admin_stats(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<PlatformStats>> {
    state.require(&session, AccessTier::Admin).await?;
    Ok(web::Json(state.stats.platform_stats().await?))
}

/// Distribution and trailing twelve-month trends.
#[utoipa::path(
    get,
    path = "/api/admin/analytics",
    responses(
        (status = 200, description = "Analytics", body = Analytics),
        (status = 403, description = "Admin access required", body = Error)
    ),
    tags = ["admin"],
    operation_id = "adminAnalytics"
)]
#[get("/admin/analytics")]
pub async fn admin_analytics(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Analytics>> {
    state.require(&session, AccessTier::Admin).await?;
    Ok(web::Json(state.stats.analytics().await?))
}

/// Platform figures plus per-role head counts.
#[utoipa::path(
    get,
    path = "/api/superadmin/stats",
    responses(
        (status = 200, description = "Super admin stats", body = SuperAdminStats),
        (status = 403, description = "Super Admin access required", body = Error)
    ),
    tags = ["superadmin"],
    operation_id = "superAdminStats"
)]
#[get("/superadmin/stats")]
pub async fn superadmin_stats(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<SuperAdminStats>> {
    state.require(&session, AccessTier::SuperAdmin).await?;
    Ok(web::Json(state.stats.super_admin_stats().await?))
}

#[cfg(test)]
mod tests {
    use crate::domain::{NewTransaction, PaymentMethod, Role, TransactionStatus};
    use crate::inbound::http::test_utils::{Harness, json_body, login_cookie, test_app};
    use actix_web::http::StatusCode;
    use actix_web::test;
    use rstest::rstest;

    #[actix_web::test]
    async fn admin_stats_sum_completed_revenue() {
        let harness = Harness::new();
        harness.seed(Role::Admin, "a@x.com", "pw").await;
        let buyer = harness.seed(Role::Customer, "c@x.com", "pw").await;
        for (amount, status) in [
            (1500.0, TransactionStatus::Completed),
            (900.0, TransactionStatus::Failed),
        ] {
            harness
                .state
                .resources
                .record_transaction(NewTransaction {
                    user_id: buyer.id,
                    amount,
                    status,
                    method: PaymentMethod::Razorpay,
                    description: "Listing".to_owned(),
                    transaction_id: format!("t-{amount}"),
                })
                .await
                .expect("record");
        }
        let app = test::init_service(test_app(harness.state.clone())).await;
        let admin = login_cookie(&app, "a@x.com", "pw").await;

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/admin/stats")
                .cookie(admin)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = json_body(res).await;
        assert_eq!(body["totalUsers"], 2);
        assert_eq!(body["activeUsers"], 2);
        assert_eq!(body["revenue"], 1500.0);
        assert_eq!(body["growthRate"], 100.0);
    }

    #[actix_web::test]
    async fn analytics_cover_twelve_months() {
        let harness = Harness::new();
        harness.seed(Role::Admin, "a@x.com", "pw").await;
        let app = test::init_service(test_app(harness.state.clone())).await;
        let admin = login_cookie(&app, "a@x.com", "pw").await;
        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/admin/analytics")
                .cookie(admin)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = json_body(res).await;
        assert_eq!(body["userGrowth"].as_array().map(Vec::len), Some(12));
        assert_eq!(body["revenueTrends"].as_array().map(Vec::len), Some(12));
        assert_eq!(body["userDistribution"]["admin"], 1);
        assert_eq!(body["userGrowth"][11]["month"], "Mar 2026");
    }

    #[rstest]
    #[case::admin(Role::Admin, StatusCode::FORBIDDEN)]
    #[case::superadmin(Role::SuperAdmin, StatusCode::OK)]
    #[actix_web::test]
    async fn superadmin_stats_are_tiered(#[case] role: Role, #[case] expected: StatusCode) {
        let harness = Harness::new();
        harness.seed(role, "x@x.com", "pw").await;
        harness.seed(Role::Broker, "b@x.com", "pw").await;
        let app = test::init_service(test_app(harness.state.clone())).await;
        let cookie = login_cookie(&app, "x@x.com", "pw").await;
        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/superadmin/stats")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), expected);
        if expected == StatusCode::OK {
            let body = json_body(res).await;
            assert_eq!(body["usersByRole"]["brokers"], 1);
            assert_eq!(body["totalUsers"], 2);
        }
    }

    #[actix_web::test]
    async fn demoted_admins_lose_access_immediately() {
        let harness = Harness::new();
        let admin_user = harness.seed(Role::Admin, "a@x.com", "pw").await;
        let app = test::init_service(test_app(harness.state.clone())).await;
        let cookie = login_cookie(&app, "a@x.com", "pw").await;
        harness
            .state
            .users
            .update(
                &admin_user.id,
                crate::domain::AdminUserUpdate {
                    role: Some(Role::Customer),
                    ..Default::default()
                },
            )
            .await
            .expect("demote");
        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/admin/stats")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }
}
