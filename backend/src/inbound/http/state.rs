//! Shared HTTP adapter state.
//!
//! Handlers receive this through `web::Data` and only ever talk to domain
//! services, so the same wiring serves PostgreSQL, the in-memory store and
//! tests.

use std::sync::Arc;

use mockable::Clock;

use crate::domain::ports::{
    DocumentRepository, GeocodingSource, MapRegistrationRepository, Mailer,
    NotificationPublisher, NotificationRepository, OtpRepository, PasswordHasher,
    TransactionRepository, UserRepository, VerificationRepository,
};
use crate::domain::{
    AuthService, MapService, NotificationService, OtpPolicy, OtpService, ResourcesService,
    StatsService, UsersService, VerificationService,
};

/// Parameter object bundling every port implementation.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub users: Arc<dyn UserRepository>,
    pub verifications: Arc<dyn VerificationRepository>,
    pub otps: Arc<dyn OtpRepository>,
    pub documents: Arc<dyn DocumentRepository>,
    pub transactions: Arc<dyn TransactionRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
    pub map_registrations: Arc<dyn MapRegistrationRepository>,
    pub hasher: Arc<dyn PasswordHasher>,
    pub mailer: Arc<dyn Mailer>,
    pub geocoder: Arc<dyn GeocodingSource>,
    pub publisher: Arc<dyn NotificationPublisher>,
    pub clock: Arc<dyn Clock>,
    pub otp_policy: OtpPolicy,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub auth: AuthService,
    pub verifications: VerificationService,
    pub users: UsersService,
    pub resources: ResourcesService,
    pub notifications: NotificationService,
    pub map: MapService,
    pub stats: StatsService,
    pub(super) accounts: Arc<dyn UserRepository>,
}

impl HttpState {
    /// Assemble every service from the given ports.
    pub fn new(ports: HttpStatePorts) -> Self {
        let HttpStatePorts {
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
        } = ports;

        let notification_service =
            NotificationService::new(notifications, publisher, clock.clone());
        let verification_service = VerificationService::new(
            verifications,
            users.clone(),
            hasher.clone(),
            mailer.clone(),
            notification_service.clone(),
            clock.clone(),
        );
        let otp = OtpService::new(otps, mailer, clock.clone(), otp_policy);
        Self {
            auth: AuthService::new(
                users.clone(),
                hasher,
                otp,
                verification_service.clone(),
                clock.clone(),
            ),
            verifications: verification_service,
            users: UsersService::new(users.clone(), clock.clone()),
            resources: ResourcesService::new(documents, transactions.clone(), clock.clone()),
            notifications: notification_service,
            map: MapService::new(map_registrations, users.clone(), geocoder, clock.clone()),
            stats: StatsService::new(users.clone(), transactions, clock),
            accounts: users,
        }
    }
}
