//! PostgreSQL persistence adapters using Diesel.
//!
//! Repositories translate between Diesel rows (`models.rs`, `schema.rs`) and
//! domain types; no business rules live here. Every repository shares one
//! [`DbPool`] and maps failures through `error_mapping`.
//!
//! ```ignore
//! use estate_backend::outbound::persistence::{DbPool, DieselUserRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/estate")).await?;
//! let users = DieselUserRepository::new(pool);
//! ```

mod diesel_map_registration_repository;
mod diesel_otp_repository;
mod diesel_record_repositories;
mod diesel_user_repository;
mod diesel_verification_repository;
mod error_mapping;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_map_registration_repository::DieselMapRegistrationRepository;
pub use diesel_otp_repository::DieselOtpRepository;
pub use diesel_record_repositories::DieselRecordRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use diesel_verification_repository::DieselVerificationRepository;
pub use migrations::{MigrationError, run_migrations};
pub use pool::{DbPool, PoolConfig, PoolError, PoolState};
