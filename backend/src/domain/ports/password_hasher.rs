//! Port for the one-way password function.

use crate::domain::PasswordHash;

use super::define_port_error;

define_port_error! {
    /// Failures raised while producing a digest.
    pub enum PasswordHashError {
        /// The hashing primitive rejected its input or parameters.
        Hashing { message: String } => "password hashing failed: {message}",
    }
}

/// Hash and compare credentials. Implementations are CPU bound and
/// synchronous.
#[cfg_attr(test, mockall::automock)]
pub trait PasswordHasher: Send + Sync {
    /// Produce a salted digest of `raw`.
    fn hash(&self, raw: &str) -> Result<PasswordHash, PasswordHashError>;

    /// Whether `raw` matches `hash`. Malformed digests never match.
    fn verify(&self, raw: &str, hash: &PasswordHash) -> bool;
}
