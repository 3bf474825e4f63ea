//! DTOs for decoding geocoding provider responses.

use serde::Deserialize;

use crate::domain::Coordinates;

#[derive(Debug, Deserialize)]
pub(super) struct GeocodeResponseDto {
    pub(super) status: String,
    #[serde(default)]
    pub(super) results: Vec<GeocodeResultDto>,
    #[serde(default)]
    pub(super) error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct GeocodeResultDto {
    pub(super) geometry: GeometryDto,
}

#[derive(Debug, Deserialize)]
pub(super) struct GeometryDto {
    pub(super) location: LocationDto,
}

#[derive(Debug, Deserialize)]
pub(super) struct LocationDto {
    pub(super) lat: f64,
    pub(super) lng: f64,
}

impl GeocodeResponseDto {
    /// First result's point; `Ok(None)` for an empty answer, `Err` for a
    /// provider-side refusal.
    pub(super) fn into_first_point(self) -> Result<Option<Coordinates>, String> {
        match self.status.as_str() {
            "OK" => {
                let Some(first) = self.results.into_iter().next() else {
                    return Ok(None);
                };
                let LocationDto { lat, lng } = first.geometry.location;
                let point = Coordinates::new(lat, lng);
                if point.is_valid() {
                    Ok(Some(point))
                } else {
                    Err(format!("result has out-of-range coordinates ({lat}, {lng})"))
                }
            }
            "ZERO_RESULTS" => Ok(None),
            other => Err(match self.error_message {
                Some(detail) => format!("{other}: {detail}"),
                None => other.to_owned(),
            }),
        }
    }
}
