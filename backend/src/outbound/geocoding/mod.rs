//! Geocoding provider adapters.
//!
//! [`HttpGeocoder`] owns transport details only: request building, timeout
//! and HTTP error mapping, and JSON decoding. The static fallback lives in
//! the domain, so every error here simply means "provider unavailable".

mod dto;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};

use self::dto::GeocodeResponseDto;
use crate::domain::ports::{GeocodingError, GeocodingSource};
use crate::domain::{Coordinates, Pincode};

const PREVIEW_CHAR_LIMIT: usize = 160;
const REGION_SUFFIX: &str = "Ahmedabad, Gujarat, India";

/// Provider adapter issuing `GET {base}?address=..&key=..` requests.
pub struct HttpGeocoder {
    client: Client,
    endpoint: Url,
    api_key: String,
}

impl HttpGeocoder {
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(endpoint: Url, api_key: String, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }

    fn request_url(&self, address: &str, pincode: &Pincode) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("address", &query_address(address, pincode))
            .append_pair("key", &self.api_key);
        url
    }
}

#[async_trait]
impl GeocodingSource for HttpGeocoder {
    async fn geocode(
        &self,
        address: &str,
        pincode: &Pincode,
    ) -> Result<Option<Coordinates>, GeocodingError> {
        let response = self
            .client
            .get(self.request_url(address, pincode))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        parse_point(body.as_ref())
    }
}

/// Stand-in used when no API key is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredGeocoder;

#[async_trait]
impl GeocodingSource for UnconfiguredGeocoder {
    async fn geocode(
        &self,
        _address: &str,
        _pincode: &Pincode,
    ) -> Result<Option<Coordinates>, GeocodingError> {
        Err(GeocodingError::not_configured())
    }
}

fn query_address(address: &str, pincode: &Pincode) -> String {
    if address.is_empty() {
        format!("{pincode}, {REGION_SUFFIX}")
    } else {
        format!("{address}, {pincode}, {REGION_SUFFIX}")
    }
}

fn parse_point(body: &[u8]) -> Result<Option<Coordinates>, GeocodingError> {
    let decoded: GeocodeResponseDto = serde_json::from_slice(body)
        .map_err(|error| GeocodingError::decode(format!("invalid geocoding JSON: {error}")))?;
    decoded.into_first_point().map_err(GeocodingError::decode)
}

fn map_transport_error(error: reqwest::Error) -> GeocodingError {
    if error.is_timeout() {
        GeocodingError::timeout(error.to_string())
    } else {
        GeocodingError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> GeocodingError {
    match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            GeocodingError::timeout(format!("status {}", status.as_u16()))
        }
        _ => GeocodingError::status(status.as_u16(), body_preview(body)),
    }
}

fn body_preview(body: &[u8]) -> String {
    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    //! Non-network coverage for request building and response mapping.

    use super::*;
    use rstest::rstest;

    fn pin() -> Pincode {
        Pincode::new("380009").expect("pincode")
    }

    #[test]
    fn request_url_carries_address_and_key() {
        let geocoder = HttpGeocoder::new(
            Url::parse("https://geo.example/json").expect("url"),
            "secret".to_owned(),
            Duration::from_secs(5),
        )
        .expect("client");
        let url = geocoder.request_url("12 CG Road", &pin());
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                (
                    "address".to_owned(),
                    "12 CG Road, 380009, Ahmedabad, Gujarat, India".to_owned()
                ),
                ("key".to_owned(), "secret".to_owned()),
            ]
        );
    }

    #[test]
    fn decodes_first_result() {
        let body = r#"{
            "status": "OK",
            "results": [
                { "geometry": { "location": { "lat": 23.03, "lng": 72.56 } } },
                { "geometry": { "location": { "lat": 1.0, "lng": 1.0 } } }
            ]
        }"#;
        let point = parse_point(body.as_bytes())
            .expect("decode")
            .expect("point");
        assert!((point.lat - 23.03).abs() < 1e-9);
        assert!((point.lng - 72.56).abs() < 1e-9);
    }

    #[test]
    fn zero_results_is_an_empty_answer() {
        let body = r#"{ "status": "ZERO_RESULTS", "results": [] }"#;
        assert_eq!(parse_point(body.as_bytes()).expect("decode"), None);
    }

    #[rstest]
    #[case::denied(r#"{ "status": "REQUEST_DENIED", "error_message": "bad key" }"#)]
    #[case::not_json("<html>oops</html>")]
    #[case::out_of_range(r#"{ "status": "OK", "results": [ { "geometry": { "location": { "lat": 95.0, "lng": 0.0 } } } ] }"#)]
    fn refusals_map_to_decode_errors(#[case] body: &str) {
        let err = parse_point(body.as_bytes()).expect_err("must fail");
        assert!(matches!(err, GeocodingError::Decode { .. }));
    }

    #[rstest]
    #[case::gateway_timeout(StatusCode::GATEWAY_TIMEOUT, true)]
    #[case::server_error(StatusCode::INTERNAL_SERVER_ERROR, false)]
    #[case::forbidden(StatusCode::FORBIDDEN, false)]
    fn maps_statuses(#[case] status: StatusCode, #[case] is_timeout: bool) {
        let err = map_status_error(status, b"denied");
        assert_eq!(matches!(err, GeocodingError::Timeout { .. }), is_timeout);
        if !is_timeout {
            assert_eq!(err, GeocodingError::status(status.as_u16(), "denied"));
        }
    }

    #[tokio::test]
    async fn unconfigured_geocoder_reports_not_configured() {
        let err = UnconfiguredGeocoder
            .geocode("x", &pin())
            .await
            .expect_err("must fail");
        assert_eq!(err, GeocodingError::NotConfigured);
    }
}
