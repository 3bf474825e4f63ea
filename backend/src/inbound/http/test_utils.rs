//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_http::Request;
use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, test, web};
use mockable::Clock;
use serde_json::{Value, json};

use crate::domain::ports::{NotificationPublisher, OtpRepository, UserRepository};
use crate::domain::{
    Email, NewUser, OtpCode, OtpPolicy, OtpPurpose, PasswordHash, Role, User, UserId, UserStatus,
};
use crate::inbound::http::routes;
use crate::inbound::http::state::{HttpState, HttpStatePorts};
use crate::outbound::geocoding::UnconfiguredGeocoder;
use crate::outbound::memory::MemoryStore;
use crate::test_support::{MutableClock, RecordingMailer, RecordingPublisher};

/// Session middleware with a fresh key and the `Secure` flag off so plain
/// HTTP test requests keep their cookie.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    test_session_middleware_with(Key::generate())
}

/// As [`test_session_middleware`], sharing `key` across several wraps.
pub fn test_session_middleware_with(key: Key) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// In-memory wiring with observable collaborators.
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub mailer: Arc<RecordingMailer>,
    pub publisher: Arc<RecordingPublisher>,
    pub clock: Arc<MutableClock>,
    pub state: HttpState,
}

impl Harness {
    pub fn new() -> Self {
        let publisher = Arc::new(RecordingPublisher::default());
        Self::build(publisher.clone(), publisher)
    }

    /// Deliver notifications through `live` instead of the recorder.
    pub fn with_publisher(live: Arc<dyn NotificationPublisher>) -> Self {
        Self::build(Arc::new(RecordingPublisher::default()), live)
    }

    fn build(publisher: Arc<RecordingPublisher>, live: Arc<dyn NotificationPublisher>) -> Self {
        let store = Arc::new(MemoryStore::new());
        let mailer = Arc::new(RecordingMailer::default());
        let clock = MutableClock::fixed();
        let state = HttpState::new(HttpStatePorts {
            users: store.clone(),
            verifications: store.clone(),
            otps: store.clone(),
            documents: store.clone(),
            transactions: store.clone(),
            notifications: store.clone(),
            map_registrations: store.clone(),
            hasher: Arc::new(crate::test_support::PlainHasher),
            mailer: mailer.clone(),
            geocoder: Arc::new(UnconfiguredGeocoder),
            publisher: live,
            clock: clock.clone(),
            otp_policy: OtpPolicy::new(10, 5),
        });
        Self {
            store,
            mailer,
            publisher,
            clock,
            state,
        }
    }

    /// Store an active account whose password is `password`.
    pub async fn seed(&self, role: Role, email: &str, password: &str) -> User {
        let user = NewUser {
            name: format!("{role} user"),
            email: Email::new(email).expect("fixture email"),
            password_hash: PasswordHash::new(format!("plain:{password}")),
            role,
            status: UserStatus::Active,
            verified: true,
            is_email_verified: true,
            is_rera_verified: role.requires_verification(),
            rera_id: role.requires_verification().then(|| "RERA-FIXTURE".to_owned()),
            phone: None,
            company: None,
        }
        .into_user(UserId::random(), self.clock.utc());
        UserRepository::create(self.store.as_ref(), &user)
            .await
            .expect("seed user");
        user
    }

    /// The code currently outstanding for the pair.
    pub async fn live_code(&self, email: &str, purpose: OtpPurpose) -> OtpCode {
        let email = Email::new(email).expect("fixture email");
        OtpRepository::find_live(self.store.as_ref(), &email, purpose, self.clock.utc())
            .await
            .expect("otp lookup")
            .expect("live otp")
            .code
    }
}

/// The full `/api` surface over `state`, behind a test session middleware.
pub fn test_app(
    state: HttpState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new().app_data(web::Data::new(state)).service(
        web::scope("/api")
            .wrap(test_session_middleware())
            .configure(routes::configure),
    )
}

/// Decode a JSON response body.
pub async fn json_body(res: ServiceResponse) -> Value {
    let body = test::read_body(res).await;
    serde_json::from_slice(&body).expect("json body")
}

/// The `session` cookie set on a response.
pub fn session_cookie(res: &ServiceResponse) -> Cookie<'static> {
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .expect("session cookie set")
        .into_owned()
}

/// Sign in through `POST /api/auth/login` and return the session cookie.
pub async fn login_cookie<S>(app: &S, email: &str, password: &str) -> Cookie<'static>
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let res = test::call_service(
        app,
        test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "email": email, "password": password }))
            .to_request(),
    )
    .await;
    assert!(res.status().is_success(), "login failed: {}", res.status());
    session_cookie(&res)
}
