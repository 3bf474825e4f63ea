//! Territory map handlers.
//!
//! ```text
//! GET    /api/map/check-registration
//! POST   /api/map/register          {"address","pincode","locality","latitude","longitude"}
//! GET    /api/map/registrations?pincode=380015
//! DELETE /api/map/registration
//! GET    /api/map/boundary/{pincode}
//! GET    /api/map/geocode?address=...&pincode=...
//! ```

use actix_web::{delete, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    AccessTier, Boundary, Coordinates, Error, MapRegistration, RegistrationRequest,
    ResolvedLocation,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::MessageResponse;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_pincode, required};

const PINCODE: FieldName = FieldName::new("pincode");
const ADDRESS: FieldName = FieldName::new("address");

/// Registration status for the caller.
#[derive(Debug, Serialize, ToSchema)]
pub struct RegistrationStatus {
    pub registered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration: Option<MapRegistration>,
}

/// Marker placement. Coordinates are geocoded when either is missing.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct RegisterRequest {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub pincode: Option<String>,
    #[serde(default)]
    pub locality: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl RegisterRequest {
    fn into_domain(self) -> Result<RegistrationRequest, Error> {
        const MESSAGE: &str = "Address and pincode are required";
        let address = required(self.address, ADDRESS, MESSAGE)?;
        let pincode = required(self.pincode, PINCODE, MESSAGE)?;
        Ok(RegistrationRequest {
            address,
            pincode: parse_pincode(&pincode, PINCODE)?,
            locality: self.locality,
            coordinates: self
                .latitude
                .zip(self.longitude)
                .map(|(lat, lng)| Coordinates::new(lat, lng)),
        })
    }
}

/// Optional pincode filter.
#[derive(Debug, Deserialize, IntoParams)]
pub struct PincodeQuery {
    pub pincode: Option<String>,
}

/// Address to resolve.
#[derive(Debug, Deserialize, IntoParams)]
pub struct GeocodeQuery {
    pub address: Option<String>,
    pub pincode: Option<String>,
}

/// Whether the caller has a marker, and the marker itself.
#[utoipa::path(
    get,
    path = "/api/map/check-registration",
    responses(
        (status = 200, description = "Registration status", body = RegistrationStatus),
        (status = 401, description = "Not signed in", body = Error)
    ),
    tags = ["map"],
    operation_id = "checkRegistration"
)]
#[get("/map/check-registration")]
pub async fn check_registration(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<RegistrationStatus>> {
    let caller = state.require(&session, AccessTier::Authenticated).await?;
    let registration = state.map.registration_for(&caller.user_id).await?;
    Ok(web::Json(RegistrationStatus {
        registered: registration.is_some(),
        registration,
    }))
}

/// Create or replace the caller's marker.
#[utoipa::path(
    post,
    path = "/api/map/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Stored registration", body = MapRegistration),
        (status = 400, description = "Invalid or unlocatable address", body = Error),
        (status = 401, description = "Not signed in", body = Error)
    ),
    tags = ["map"],
    operation_id = "registerOnMap"
)]
#[post("/map/register")]
pub async fn register(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<web::Json<MapRegistration>> {
    let caller = state.require(&session, AccessTier::Authenticated).await?;
    let request = payload.into_inner().into_domain()?;
    Ok(web::Json(state.map.register(&caller.user_id, request).await?))
}

/// Markers, optionally restricted to one pincode.
#[utoipa::path(
    get,
    path = "/api/map/registrations",
    params(PincodeQuery),
    responses(
        (status = 200, description = "Registrations", body = [MapRegistration]),
        (status = 400, description = "Invalid pincode", body = Error),
        (status = 401, description = "Not signed in", body = Error)
    ),
    tags = ["map"],
    operation_id = "listRegistrations"
)]
#[get("/map/registrations")]
pub async fn list_registrations(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<PincodeQuery>,
) -> ApiResult<web::Json<Vec<MapRegistration>>> {
    state.require(&session, AccessTier::Authenticated).await?;
    let pincode = query
        .into_inner()
        .pincode
        .filter(|p| !p.trim().is_empty())
        .map(|raw| parse_pincode(&raw, PINCODE))
        .transpose()?;
    Ok(web::Json(state.map.list(pincode).await?))
}

/// Remove the caller's marker.
#[utoipa::path(
    delete,
    path = "/api/map/registration",
    responses(
        (status = 200, description = "Removed", body = MessageResponse),
        (status = 404, description = "No registration", body = Error)
    ),
    tags = ["map"],
    operation_id = "unregisterFromMap"
)]
#[delete("/map/registration")]
pub async fn unregister(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<MessageResponse>> {
    let caller = state.require(&session, AccessTier::Authenticated).await?;
    state.map.unregister(&caller.user_id).await?;
    Ok(web::Json(MessageResponse::new("Registration removed")))
}

/// Outline of a known locality.
#[utoipa::path(
    get,
    path = "/api/map/boundary/{pincode}",
    params(("pincode" = String, Path, description = "Six-digit pincode")),
    responses(
        (status = 200, description = "Boundary", body = Boundary),
        (status = 400, description = "Invalid pincode", body = Error),
        (status = 404, description = "Unknown pincode", body = Error)
    ),
    tags = ["map"],
    operation_id = "boundary"
)]
#[get("/map/boundary/{pincode}")]
pub async fn boundary(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<Boundary>> {
    state.require(&session, AccessTier::Authenticated).await?;
    let pincode = parse_pincode(&path.into_inner(), PINCODE)?;
    Ok(web::Json(state.map.boundary(&pincode)?))
}

/// Resolve an address to coordinates.
#[utoipa::path(
    get,
    path = "/api/map/geocode",
    params(GeocodeQuery),
    responses(
        (status = 200, description = "Location", body = ResolvedLocation),
        (status = 400, description = "Missing address or pincode", body = Error),
        (status = 404, description = "Location not found", body = Error)
    ),
    tags = ["map"],
    operation_id = "geocode"
)]
#[get("/map/geocode")]
pub async fn geocode(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<GeocodeQuery>,
) -> ApiResult<web::Json<ResolvedLocation>> {
    state.require(&session, AccessTier::Authenticated).await?;
    const MESSAGE: &str = "Address and pincode are required";
    let GeocodeQuery { address, pincode } = query.into_inner();
    let address = required(address, ADDRESS, MESSAGE)?;
    let pincode = parse_pincode(&required(pincode, PINCODE, MESSAGE)?, PINCODE)?;
    Ok(web::Json(state.map.geocode(&address, &pincode).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;
    use crate::inbound::http::test_utils::{Harness, json_body, login_cookie, test_app};
    use actix_web::http::StatusCode;
    use actix_web::test;
    use rstest::rstest;
    use serde_json::json;

    #[actix_web::test]
    async fn registering_twice_keeps_one_marker() {
        let harness = Harness::new();
        harness.seed(Role::Broker, "b@x.com", "pw").await;
        let app = test::init_service(test_app(harness.state.clone())).await;
        let cookie = login_cookie(&app, "b@x.com", "pw").await;

        for (lat, lng) in [(23.03, 72.52), (23.05, 72.53)] {
            let res = test::call_service(
                &app,
                test::TestRequest::post()
                    .uri("/api/map/register")
                    .cookie(cookie.clone())
                    .set_json(json!({
                        "address": "12 Ring Road",
                        "pincode": "380015",
                        "latitude": lat,
                        "longitude": lng,
                    }))
                    .to_request(),
            )
            .await;
            assert_eq!(res.status(), StatusCode::OK);
        }

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/map/registrations?pincode=380015")
                .cookie(cookie.clone())
                .to_request(),
        )
        .await;
        let list = json_body(res).await;
        assert_eq!(list.as_array().map(Vec::len), Some(1));
        assert_eq!(list[0]["latitude"], 23.05);
        assert_eq!(list[0]["role"], "broker");
        assert_eq!(list[0]["locality"], "Satellite");

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/map/registrations?pincode=380009")
                .cookie(cookie.clone())
                .to_request(),
        )
        .await;
        assert_eq!(json_body(res).await.as_array().map(Vec::len), Some(0));

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/map/check-registration")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(json_body(res).await["registered"], true);
    }

    #[actix_web::test]
    async fn missing_coordinates_fall_back_to_the_locality_centre() {
        let harness = Harness::new();
        harness.seed(Role::Vendor, "v@x.com", "pw").await;
        let app = test::init_service(test_app(harness.state.clone())).await;
        let cookie = login_cookie(&app, "v@x.com", "pw").await;

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/map/register")
                .cookie(cookie.clone())
                .set_json(json!({ "address": "CG Road", "pincode": "380009" }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(json_body(res).await["latitude"], 23.0365);

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/map/register")
                .cookie(cookie)
                .set_json(json!({ "address": "Somewhere", "pincode": "110001" }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(res).await["message"], "Unable to locate address");
    }

    #[actix_web::test]
    async fn unregister_removes_the_marker() {
        let harness = Harness::new();
        harness.seed(Role::Customer, "c@x.com", "pw").await;
        let app = test::init_service(test_app(harness.state.clone())).await;
        let cookie = login_cookie(&app, "c@x.com", "pw").await;
        let delete = || {
            test::TestRequest::delete()
                .uri("/api/map/registration")
                .cookie(cookie.clone())
                .to_request()
        };

        assert_eq!(
            test::call_service(&app, delete()).await.status(),
            StatusCode::NOT_FOUND
        );
        test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/map/register")
                .cookie(cookie.clone())
                .set_json(json!({ "address": "Law Garden", "pincode": "380006" }))
                .to_request(),
        )
        .await;
        assert_eq!(
            test::call_service(&app, delete()).await.status(),
            StatusCode::OK
        );
    }

    #[rstest]
    #[case("380054", StatusCode::OK)]
    #[case("110001", StatusCode::NOT_FOUND)]
    #[case("38001", StatusCode::BAD_REQUEST)]
    #[actix_web::test]
    async fn boundary_lookup(#[case] pincode: &str, #[case] expected: StatusCode) {
        let harness = Harness::new();
        harness.seed(Role::Customer, "c@x.com", "pw").await;
        let app = test::init_service(test_app(harness.state.clone())).await;
        let cookie = login_cookie(&app, "c@x.com", "pw").await;
        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri(&format!("/api/map/boundary/{pincode}"))
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), expected);
        if expected == StatusCode::OK {
            let body = json_body(res).await;
            assert_eq!(body["locality"], "Bodakdev");
            assert_eq!(body["polygon"].as_array().map(Vec::len), Some(5));
        }
    }

    #[actix_web::test]
    async fn geocode_without_provider_uses_static_table() {
        let harness = Harness::new();
        harness.seed(Role::Customer, "c@x.com", "pw").await;
        let app = test::init_service(test_app(harness.state.clone())).await;
        let cookie = login_cookie(&app, "c@x.com", "pw").await;

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/map/geocode?address=Paldi%20Cross&pincode=380007")
                .cookie(cookie.clone())
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = json_body(res).await;
        assert_eq!(body["source"], "fallback");
        assert_eq!(body["lat"], 23.012);

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/map/geocode?address=Nowhere&pincode=110001")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}
