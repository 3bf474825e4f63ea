//! Port for the external geocoding provider.

use async_trait::async_trait;

use crate::domain::{Coordinates, Pincode};

use super::define_port_error;

define_port_error! {
    /// Provider failures. All of them are treated as the provider being
    /// unavailable and trigger the static fallback.
    pub enum GeocodingError {
        /// No API key is configured.
        NotConfigured => "geocoding provider is not configured",
        /// Request timed out.
        Timeout { message: String } => "geocoding request timed out: {message}",
        /// Network failure.
        Transport { message: String } => "geocoding transport failed: {message}",
        /// Non-success HTTP status.
        Status { status: u16, message: String } => "geocoding provider returned {status}: {message}",
        /// Response could not be decoded.
        Decode { message: String } => "geocoding response malformed: {message}",
    }
}

/// Resolve a postal address to a point.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GeocodingSource: Send + Sync {
    /// `Ok(None)` when the provider answered but found nothing.
    async fn geocode(
        &self,
        address: &str,
        pincode: &Pincode,
    ) -> Result<Option<Coordinates>, GeocodingError>;
}
