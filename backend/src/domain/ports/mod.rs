//! Domain ports for the hexagonal boundary.
//!
//! Driven adapters (PostgreSQL, the in-memory store, the mail and geocoding
//! providers, the WebSocket hub) implement these traits. Each exposes a
//! typed error so services can map failures without string matching.

mod macros;
pub(crate) use macros::define_port_error;

mod geocoding_source;
mod mailer;
mod map_registration_repository;
mod notification_publisher;
mod otp_repository;
mod password_hasher;
mod record_repositories;
mod user_repository;
mod verification_repository;

#[cfg(test)]
pub use geocoding_source::MockGeocodingSource;
pub use geocoding_source::{GeocodingError, GeocodingSource};
#[cfg(test)]
pub use mailer::MockMailer;
pub use mailer::{MailError, Mailer, OutboundEmail};
#[cfg(test)]
pub use map_registration_repository::MockMapRegistrationRepository;
pub use map_registration_repository::MapRegistrationRepository;
#[cfg(test)]
pub use notification_publisher::MockNotificationPublisher;
pub use notification_publisher::{NotificationPublisher, PublishError, user_channel};
#[cfg(test)]
pub use otp_repository::MockOtpRepository;
pub use otp_repository::{OtpRepository, OtpRepositoryError};
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::{PasswordHashError, PasswordHasher};
#[cfg(test)]
pub use record_repositories::{
    MockDocumentRepository, MockNotificationRepository, MockTransactionRepository,
};
pub use record_repositories::{
    DocumentRepository, NotificationRepository, RecordRepositoryError, TransactionRepository,
};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserRepository, UserRepositoryError};
#[cfg(test)]
pub use verification_repository::MockVerificationRepository;
pub use verification_repository::{VerificationRepository, VerificationRepositoryError};
