//! Server construction and middleware wiring.

mod config;
mod state_builders;

pub use config::{CookiePolicy, ServerConfig};
pub use state_builders::ExternalAdapters;

use state_builders::{build_http_state, build_repositories};

use actix_session::{
    SessionMiddleware,
    config::{CookieContentSecurity, PersistentSession},
    storage::CookieSessionStore,
};
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

use estate_backend::Trace;
#[cfg(debug_assertions)]
use estate_backend::doc::ApiDoc;
use estate_backend::inbound::http::health::{HealthState, live, ready};
use estate_backend::inbound::http::routes;
use estate_backend::inbound::http::state::HttpState;
use estate_backend::inbound::ws;
use estate_backend::inbound::ws::state::WsState;
use estate_backend::outbound::realtime::NotificationHub;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

use std::sync::Arc;

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    ws_state: web::Data<WsState>,
    cookies: CookiePolicy,
}

/// One cookie session spans `/api` and `/ws`.
fn session_middleware(cookies: CookiePolicy) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), cookies.key)
        .cookie_name("session".into())
        .cookie_path("/".into())
        .cookie_secure(cookies.secure)
        .cookie_http_only(true)
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_same_site(cookies.same_site)
        .session_lifecycle(
            PersistentSession::default().session_ttl(actix_web::cookie::time::Duration::hours(2)),
        )
        .build()
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        ws_state,
        cookies,
    } = deps;

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .app_data(ws_state)
        .wrap(session_middleware(cookies))
        .wrap(Trace)
        .service(web::scope("/api").configure(routes::configure))
        .service(ws::ws_entry)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Construct an Actix HTTP server using the provided health state and configuration.
///
/// The notification hub built here is both the publisher behind the
/// notification service and the registry the WebSocket connections join.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let server_health_state = health_state.clone();
    let ServerConfig {
        cookies,
        bind_addr,
        db_pool,
        allowed_origins,
        adapters,
    } = config;

    let hub = Arc::new(NotificationHub::new());
    let http_state = build_http_state(build_repositories(&db_pool), adapters, hub.clone());
    let ws_state = web::Data::new(WsState::new(hub, allowed_origins));

    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
            ws_state: ws_state.clone(),
            cookies: cookies.clone(),
        })
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}
