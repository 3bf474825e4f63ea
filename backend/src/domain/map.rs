//! Territory map registrations and the static Ahmedabad locality table.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{Email, Role, UserId};

/// Six-digit Indian postal code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String, example = "380015")]
pub struct Pincode(String);

/// Raised when a pincode is not exactly six ASCII digits.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("pincode must be exactly six digits")]
pub struct InvalidPincode;

impl Pincode {
    /// Validate a pincode after trimming surrounding whitespace.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, InvalidPincode> {
        let raw = raw.as_ref().trim();
        if raw.len() == 6 && raw.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(raw.to_owned()))
        } else {
            Err(InvalidPincode)
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Pincode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Pincode {
    type Err = InvalidPincode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Pincode {
    type Error = InvalidPincode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Pincode> for String {
    fn from(value: Pincode) -> Self {
        value.0
    }
}

/// WGS84 point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Latitude within ±90 and longitude within ±180.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// A user's opt-in marker. At most one exists per user.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MapRegistration {
    pub id: Uuid,
    pub user_id: UserId,
    pub name: String,
    pub email: Email,
    pub role: Role,
    pub address: String,
    pub pincode: Pincode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Location fields supplied by the user when registering.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationRequest {
    pub address: String,
    pub pincode: Pincode,
    pub locality: Option<String>,
    pub coordinates: Option<Coordinates>,
}

/// Known locality with an approximate centre.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Locality {
    pub pincode: &'static str,
    pub name: &'static str,
    pub center: Coordinates,
}

/// Half-width in degrees of the square drawn around a locality centre.
const BOUNDARY_HALF_SPAN: f64 = 0.01;

const LOCALITIES: &[Locality] = &[
    Locality {
        pincode: "380001",
        name: "Bhadra",
        center: Coordinates::new(23.0240, 72.5850),
    },
    Locality {
        pincode: "380006",
        name: "Ellisbridge",
        center: Coordinates::new(23.0260, 72.5600),
    },
    Locality {
        pincode: "380007",
        name: "Paldi",
        center: Coordinates::new(23.0120, 72.5620),
    },
    Locality {
        pincode: "380009",
        name: "Navrangpura",
        center: Coordinates::new(23.0365, 72.5611),
    },
    Locality {
        pincode: "380013",
        name: "Naranpura",
        center: Coordinates::new(23.0570, 72.5540),
    },
    Locality {
        pincode: "380015",
        name: "Satellite",
        center: Coordinates::new(23.0300, 72.5250),
    },
    Locality {
        pincode: "380052",
        name: "Memnagar",
        center: Coordinates::new(23.0510, 72.5330),
    },
    Locality {
        pincode: "380054",
        name: "Bodakdev",
        center: Coordinates::new(23.0395, 72.5060),
    },
];

/// Look up a pincode in the static table.
#[must_use]
pub fn locality_for(pincode: &Pincode) -> Option<&'static Locality> {
    LOCALITIES.iter().find(|l| l.pincode == pincode.as_str())
}

/// Outline of a locality served by the boundary endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Boundary {
    pub pincode: Pincode,
    pub locality: String,
    pub center: Coordinates,
    /// Closed ring, first point repeated last.
    pub polygon: Vec<Coordinates>,
}

impl Locality {
    /// Square outline around the centre.
    #[must_use]
    pub fn boundary(&self) -> Boundary {
        let Coordinates { lat, lng } = self.center;
        let d = BOUNDARY_HALF_SPAN;
        let ring = vec![
            Coordinates::new(lat + d, lng - d),
            Coordinates::new(lat + d, lng + d),
            Coordinates::new(lat - d, lng + d),
            Coordinates::new(lat - d, lng - d),
            Coordinates::new(lat + d, lng - d),
        ];
        Boundary {
            pincode: Pincode(self.pincode.to_owned()),
            locality: self.name.to_owned(),
            center: self.center,
            polygon: ring,
        }
    }
}
