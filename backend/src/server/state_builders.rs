//! Builders for the repositories and shared HTTP state.

use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};

use estate_backend::domain::OtpPolicy;
use estate_backend::domain::ports::{
    DocumentRepository, GeocodingSource, MapRegistrationRepository, Mailer,
    NotificationPublisher, NotificationRepository, OtpRepository, PasswordHasher,
    TransactionRepository, UserRepository, VerificationRepository,
};
use estate_backend::inbound::http::state::{HttpState, HttpStatePorts};
use estate_backend::outbound::memory::MemoryStore;
use estate_backend::outbound::persistence::{
    DbPool, DieselMapRegistrationRepository, DieselOtpRepository, DieselRecordRepository,
    DieselUserRepository, DieselVerificationRepository,
};

/// Provider-facing adapters chosen from configuration at startup.
#[derive(Clone)]
pub struct ExternalAdapters {
    pub mailer: Arc<dyn Mailer>,
    pub geocoder: Arc<dyn GeocodingSource>,
    pub hasher: Arc<dyn PasswordHasher>,
    pub otp_policy: OtpPolicy,
}

/// Every storage port, from one backing store.
#[derive(Clone)]
pub(super) struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub verifications: Arc<dyn VerificationRepository>,
    pub otps: Arc<dyn OtpRepository>,
    pub documents: Arc<dyn DocumentRepository>,
    pub transactions: Arc<dyn TransactionRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
    pub map_registrations: Arc<dyn MapRegistrationRepository>,
}

impl Repositories {
    fn diesel(pool: &DbPool) -> Self {
        let records = Arc::new(DieselRecordRepository::new(pool.clone()));
        Self {
            users: Arc::new(DieselUserRepository::new(pool.clone())),
            verifications: Arc::new(DieselVerificationRepository::new(pool.clone())),
            otps: Arc::new(DieselOtpRepository::new(pool.clone())),
            documents: records.clone(),
            transactions: records.clone(),
            notifications: records,
            map_registrations: Arc::new(DieselMapRegistrationRepository::new(pool.clone())),
        }
    }

    pub(super) fn memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            users: store.clone(),
            verifications: store.clone(),
            otps: store.clone(),
            documents: store.clone(),
            transactions: store.clone(),
            notifications: store.clone(),
            map_registrations: store,
        }
    }
}

/// Use the pool-backed repositories when a pool is available, otherwise a
/// fresh in-memory store.
fn select_repositories<Pool, Make>(pool: &Option<Pool>, make: Make) -> Repositories
where
    Make: FnOnce(&Pool) -> Repositories,
{
    match pool {
        Some(pool) => make(pool),
        None => Repositories::memory(),
    }
}

pub(super) fn build_repositories(pool: &Option<DbPool>) -> Repositories {
    select_repositories(pool, Repositories::diesel)
}

/// Build the shared HTTP state. `publisher` is the notification hub that
/// also feeds the WebSocket connections.
pub(super) fn build_http_state(
    repositories: Repositories,
    adapters: ExternalAdapters,
    publisher: Arc<dyn NotificationPublisher>,
) -> web::Data<HttpState> {
    let Repositories {
        users,
        verifications,
        otps,
        documents,
        transactions,
        notifications,
        map_registrations,
    } = repositories;
    let ExternalAdapters {
        mailer,
        geocoder,
        hasher,
        otp_policy,
    } = adapters;
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);

    web::Data::new(HttpState::new(HttpStatePorts {
        users,
        verifications,
        otps,
        documents,
        transactions,
        notifications,
        map_registrations,
        hasher,
        mailer,
        geocoder,
        publisher,
        clock,
        otp_policy,
    }))
}
