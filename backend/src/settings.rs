//! Application settings loaded via OrthoConfig.
//!
//! Values come from CLI flags, `ESTATE_*` environment variables and an
//! optional config file. Everything except the listener address is optional;
//! a missing value selects the matching fallback adapter at startup.

use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Deserializer, Serialize};
use url::Url;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_MAP_API_BASE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";
const DEFAULT_MAIL_SENDER: &str = "no-reply@estate.local";
const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:3000";
const OUTBOUND_TIMEOUT: Duration = Duration::from_secs(10);

/// Invalid setting value.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid bind address '{value}': {source}")]
    BindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("invalid URL for {name} '{value}': {source}")]
    Url {
        name: &'static str,
        value: String,
        #[source]
        source: url::ParseError,
    },
}

/// Runtime configuration for the estate backend.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "ESTATE")]
pub struct AppSettings {
    /// Listener address, `host:port`.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL; absent means the in-memory store.
    pub database_url: Option<String>,
    #[ortho_config(default = 10)]
    pub database_pool_size: u32,
    /// Geocoding provider key; absent means static locality lookups only.
    pub map_api_key: Option<String>,
    pub map_api_base_url: Option<String>,
    pub mail_api_url: Option<String>,
    pub mail_api_key: Option<String>,
    pub mail_sender: Option<String>,
    #[ortho_config(default = 10)]
    pub otp_ttl_minutes: u32,
    #[ortho_config(default = 5)]
    pub otp_max_attempts: u32,
    /// WebSocket origin allow-list.
    #[ortho_config(skip_cli)]
    pub allowed_origins: Option<OriginList>,
}

/// Origins as one URL, a comma-separated string or a list.
///
/// The environment layer turns `a,b` into a sequence but leaves a single
/// value as a string, so both shapes are accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct OriginList(Vec<String>);

impl OriginList {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<'de> Deserialize<'de> for OriginList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Joined(String),
            Items(Vec<String>),
        }
        let items = match Raw::deserialize(deserializer)? {
            Raw::Joined(joined) => joined.split(',').map(str::to_owned).collect(),
            Raw::Items(items) => items,
        };
        Ok(Self(
            items
                .into_iter()
                .map(|item| item.trim().to_owned())
                .filter(|item| !item.is_empty())
                .collect(),
        ))
    }
}

/// Provider settings for the HTTP mailer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailSettings {
    pub endpoint: Url,
    pub api_key: String,
    pub sender: String,
}

/// Provider settings for the HTTP geocoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeocoderSettings {
    pub endpoint: Url,
    pub api_key: String,
}

fn parse_url(name: &'static str, value: &str) -> Result<Url, SettingsError> {
    Url::parse(value).map_err(|source| SettingsError::Url {
        name,
        value: value.to_owned(),
        source,
    })
}

fn present(value: Option<&String>) -> Option<&str> {
    value.map(|raw| raw.trim()).filter(|raw| !raw.is_empty())
}

impl AppSettings {
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let value = present(self.bind_addr.as_ref()).unwrap_or(DEFAULT_BIND_ADDR);
        value.parse().map_err(|source| SettingsError::BindAddr {
            value: value.to_owned(),
            source,
        })
    }

    pub fn database_url(&self) -> Option<&str> {
        present(self.database_url.as_ref())
    }

    /// `None` unless both the endpoint and the key are set.
    pub fn mail(&self) -> Result<Option<MailSettings>, SettingsError> {
        let (Some(url), Some(key)) = (
            present(self.mail_api_url.as_ref()),
            present(self.mail_api_key.as_ref()),
        ) else {
            return Ok(None);
        };
        Ok(Some(MailSettings {
            endpoint: parse_url("mail_api_url", url)?,
            api_key: key.to_owned(),
            sender: present(self.mail_sender.as_ref())
                .unwrap_or(DEFAULT_MAIL_SENDER)
                .to_owned(),
        }))
    }

    /// `None` without an API key.
    pub fn geocoder(&self) -> Result<Option<GeocoderSettings>, SettingsError> {
        let Some(key) = present(self.map_api_key.as_ref()) else {
            return Ok(None);
        };
        let base = present(self.map_api_base_url.as_ref()).unwrap_or(DEFAULT_MAP_API_BASE_URL);
        Ok(Some(GeocoderSettings {
            endpoint: parse_url("map_api_base_url", base)?,
            api_key: key.to_owned(),
        }))
    }

    pub fn allowed_origins(&self) -> Result<Vec<Url>, SettingsError> {
        match self.allowed_origins.as_ref().filter(|list| list.iter().next().is_some()) {
            Some(list) => list
                .iter()
                .map(|origin| parse_url("allowed_origins", origin))
                .collect(),
            None => Ok(vec![parse_url("allowed_origins", DEFAULT_ALLOWED_ORIGIN)?]),
        }
    }

    /// Request timeout for outbound provider calls.
    #[must_use]
    pub fn outbound_timeout(&self) -> Duration {
        OUTBOUND_TIMEOUT
    }
}
