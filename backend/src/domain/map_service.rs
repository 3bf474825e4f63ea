//! Map registration and location look-ups.
//!
//! Geocoding tries the external provider first and falls back to the static
//! locality table whenever the provider is unavailable or has no answer.

use std::sync::Arc;

use mockable::Clock;
use serde::Serialize;
use tracing::{debug, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use super::labels::labelled_enum;
use super::ports::{GeocodingSource, MapRegistrationRepository, UserRepository};
use super::{
    Boundary, Coordinates, Error, MapRegistration, Pincode, RegistrationRequest, UserId,
    locality_for,
};

labelled_enum! {
    /// Where a resolved location came from.
    pub enum LocationSource {
        Provider => "provider",
        Fallback => "fallback",
    }
}

/// A resolved point and its origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct ResolvedLocation {
    pub lat: f64,
    pub lng: f64,
    pub source: LocationSource,
}

/// Territory map operations.
#[derive(Clone)]
pub struct MapService {
    registrations: Arc<dyn MapRegistrationRepository>,
    users: Arc<dyn UserRepository>,
    geocoder: Arc<dyn GeocodingSource>,
    clock: Arc<dyn Clock>,
}

impl MapService {
    pub fn new(
        registrations: Arc<dyn MapRegistrationRepository>,
        users: Arc<dyn UserRepository>,
        geocoder: Arc<dyn GeocodingSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registrations,
            users,
            geocoder,
            clock,
        }
    }

    pub async fn registration_for(
        &self,
        user_id: &UserId,
    ) -> Result<Option<MapRegistration>, Error> {
        Ok(self.registrations.find_by_user(user_id).await?)
    }

    /// Create or replace the caller's marker. The name, email and role are
    /// snapshotted from the stored account.
    pub async fn register(
        &self,
        user_id: &UserId,
        request: RegistrationRequest,
    ) -> Result<MapRegistration, Error> {
        let address = request.address.trim();
        if address.is_empty() {
            return Err(Error::invalid_request("Address and pincode are required"));
        }
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| Error::not_found("User not found"))?;

        let point = match request.coordinates {
            Some(point) if point.is_valid() => point,
            Some(_) => return Err(Error::invalid_request("Invalid coordinates")),
            None => {
                let resolved = self
                    .resolve(address, &request.pincode)
                    .await
                    .ok_or_else(|| Error::invalid_request("Unable to locate address"))?;
                Coordinates::new(resolved.lat, resolved.lng)
            }
        };
        let locality = request
            .locality
            .map(|l| l.trim().to_owned())
            .filter(|l| !l.is_empty())
            .or_else(|| locality_for(&request.pincode).map(|l| l.name.to_owned()));

        let now = self.clock.utc();
        let candidate = MapRegistration {
            id: Uuid::new_v4(),
            user_id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            address: address.to_owned(),
            pincode: request.pincode,
            locality,
            latitude: point.lat,
            longitude: point.lng,
            created_at: now,
            updated_at: now,
        };
        let stored = self.registrations.upsert(&candidate).await?;
        info!(user_id = %stored.user_id, pincode = %stored.pincode, "map registration saved");
        Ok(stored)
    }

    pub async fn list(&self, pincode: Option<Pincode>) -> Result<Vec<MapRegistration>, Error> {
        Ok(self.registrations.list(pincode).await?)
    }

    pub async fn unregister(&self, user_id: &UserId) -> Result<(), Error> {
        if self.registrations.delete_by_user(user_id).await? {
            Ok(())
        } else {
            Err(Error::not_found("Registration not found"))
        }
    }

    /// Outline for a pincode from the static table.
    pub fn boundary(&self, pincode: &Pincode) -> Result<Boundary, Error> {
        locality_for(pincode)
            .map(|l| l.boundary())
            .ok_or_else(|| Error::not_found(format!("No boundary data for pincode {pincode}")))
    }

    /// Resolve an address, or 404 when neither the provider nor the static
    /// table knows it.
    pub async fn geocode(&self, address: &str, pincode: &Pincode) -> Result<ResolvedLocation, Error> {
        self.resolve(address.trim(), pincode)
            .await
            .ok_or_else(|| Error::not_found("Location not found"))
    }

    async fn resolve(&self, address: &str, pincode: &Pincode) -> Option<ResolvedLocation> {
        match self.geocoder.geocode(address, pincode).await {
            Ok(Some(point)) if point.is_valid() => {
                return Some(ResolvedLocation {
                    lat: point.lat,
                    lng: point.lng,
                    source: LocationSource::Provider,
                });
            }
            Ok(_) => debug!(%pincode, "provider had no match; using static table"),
            Err(err) => warn!(%pincode, error = %err, "geocoding provider unavailable; using static table"),
        }
        locality_for(pincode).map(|l| ResolvedLocation {
            lat: l.center.lat,
            lng: l.center.lng,
            source: LocationSource::Fallback,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{GeocodingError, MockGeocodingSource};
    use crate::domain::{Email, ErrorCode, NewUser, PasswordHash, Role, UserStatus};
    use crate::outbound::memory::MemoryStore;
    use crate::test_support::MutableClock;

    async fn service_with(geocoder: MockGeocodingSource) -> (MapService, UserId) {
        let store = Arc::new(MemoryStore::new());
        let user = NewUser {
            name: "Meera".to_owned(),
            email: Email::new("meera@x.com").expect("email"),
            password_hash: PasswordHash::new("h"),
            role: Role::Vendor,
            status: UserStatus::Active,
            verified: true,
            is_email_verified: true,
            is_rera_verified: true,
            rera_id: Some("R1".to_owned()),
            phone: None,
            company: None,
        }
        .into_user(UserId::random(), chrono::Utc::now());
        let id = user.id;
        UserRepository::create(store.as_ref(), &user)
            .await
            .expect("seed");
        let service = MapService::new(
            store.clone(),
            store,
            Arc::new(geocoder),
            MutableClock::fixed(),
        );
        (service, id)
    }

    fn pin(raw: &str) -> Pincode {
        Pincode::new(raw).expect("pincode")
    }

    fn request(lat: f64, lng: f64) -> RegistrationRequest {
        RegistrationRequest {
            address: "12 CG Road".to_owned(),
            pincode: pin("380009"),
            locality: None,
            coordinates: Some(Coordinates::new(lat, lng)),
        }
    }

    #[tokio::test]
    async fn re_registering_replaces_the_marker() {
        let (service, user_id) = service_with(MockGeocodingSource::new()).await;
        let first = service
            .register(&user_id, request(23.03, 72.56))
            .await
            .expect("first");
        let second = service
            .register(&user_id, request(23.05, 72.58))
            .await
            .expect("second");
        assert_eq!(first.id, second.id);

        let all = service.list(None).await.expect("list");
        assert_eq!(all.len(), 1);
        assert!((all[0].latitude - 23.05).abs() < f64::EPSILON);
        assert_eq!(all[0].locality.as_deref(), Some("Navrangpura"));
        assert_eq!(all[0].role, Role::Vendor);
    }

    #[tokio::test]
    async fn list_filters_by_exact_pincode() {
        let (service, user_id) = service_with(MockGeocodingSource::new()).await;
        service
            .register(&user_id, request(23.03, 72.56))
            .await
            .expect("register");
        assert_eq!(service.list(Some(pin("380009"))).await.expect("hit").len(), 1);
        assert!(service.list(Some(pin("380015"))).await.expect("miss").is_empty());
    }

    #[tokio::test]
    async fn provider_failure_falls_back_to_static_table() {
        let mut geocoder = MockGeocodingSource::new();
        geocoder
            .expect_geocode()
            .returning(|_, _| Err(GeocodingError::timeout("5s elapsed")));
        let (service, _) = service_with(geocoder).await;
        let resolved = service
            .geocode("Satellite Road", &pin("380015"))
            .await
            .expect("fallback");
        assert_eq!(resolved.source, LocationSource::Fallback);
        assert!((resolved.lat - 23.03).abs() < 1e-9);
    }

    #[tokio::test]
    async fn provider_answer_wins() {
        let mut geocoder = MockGeocodingSource::new();
        geocoder
            .expect_geocode()
            .returning(|_, _| Ok(Some(Coordinates::new(23.1, 72.6))));
        let (service, _) = service_with(geocoder).await;
        let resolved = service
            .geocode("Anywhere", &pin("380015"))
            .await
            .expect("provider");
        assert_eq!(resolved.source, LocationSource::Provider);
    }

    #[tokio::test]
    async fn unknown_everywhere_is_not_found_or_bad_request() {
        let mut geocoder = MockGeocodingSource::new();
        geocoder
            .expect_geocode()
            .returning(|_, _| Err(GeocodingError::not_configured()));
        let (service, user_id) = service_with(geocoder).await;

        let err = service
            .geocode("Nowhere", &pin("110001"))
            .await
            .expect_err("unknown");
        assert_eq!(err.code(), ErrorCode::NotFound);

        let mut without_point = request(0.0, 0.0);
        without_point.coordinates = None;
        without_point.pincode = pin("110001");
        let err = service
            .register(&user_id, without_point)
            .await
            .expect_err("unlocatable");
        assert_eq!(err.message(), "Unable to locate address");
    }

    #[tokio::test]
    async fn boundary_is_static_only() {
        let (service, _) = service_with(MockGeocodingSource::new()).await;
        assert_eq!(
            service.boundary(&pin("380054")).expect("known").locality,
            "Bodakdev"
        );
        assert_eq!(
            service.boundary(&pin("999999")).expect_err("unknown").code(),
            ErrorCode::NotFound
        );
    }
}
