//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//! - **memory**: in-process store used without a database and in tests
//! - **password**: Argon2id credential hashing
//! - **mail**: HTTP mail provider client
//! - **geocoding**: HTTP geocoding provider client
//! - **realtime**: channel registry feeding WebSocket connections
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod geocoding;
pub mod mail;
pub mod memory;
pub mod password;
pub mod persistence;
pub mod realtime;
