//! Backend entry-point: loads settings, selects adapters and runs the server.

mod server;

use std::sync::Arc;

use actix_web::web;
use mockable::DefaultEnv;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use estate_backend::domain::OtpPolicy;
use estate_backend::domain::ports::{GeocodingSource, Mailer};
use estate_backend::inbound::http::health::HealthState;
use estate_backend::inbound::http::session_config::fingerprint::key_fingerprint;
use estate_backend::inbound::http::session_config::{BuildMode, session_settings_from_env};
use estate_backend::outbound::geocoding::{HttpGeocoder, UnconfiguredGeocoder};
use estate_backend::outbound::mail::{HttpMailer, MailCredentials, UnconfiguredMailer};
use estate_backend::outbound::password::Argon2PasswordHasher;
use estate_backend::outbound::persistence::{DbPool, PoolConfig, run_migrations};
use estate_backend::settings::AppSettings;
use ortho_config::OrthoConfig;
use server::{ExternalAdapters, ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load_from_iter(std::env::args_os())
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    let session_settings =
        session_settings_from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
            .map_err(std::io::Error::other)?;
    info!(
        fingerprint = %key_fingerprint(&session_settings.key),
        "session signing key loaded"
    );

    let adapters = ExternalAdapters {
        mailer: build_mailer(&settings)?,
        geocoder: build_geocoder(&settings)?,
        hasher: Arc::new(Argon2PasswordHasher::new()),
        otp_policy: OtpPolicy::new(settings.otp_ttl_minutes, settings.otp_max_attempts),
    };

    let mut config = ServerConfig::new(
        session_settings,
        settings.bind_addr().map_err(std::io::Error::other)?,
        adapters,
    )
    .with_allowed_origins(settings.allowed_origins().map_err(std::io::Error::other)?);

    match settings.database_url() {
        Some(url) => {
            run_migrations(url).await.map_err(std::io::Error::other)?;
            let pool = DbPool::new(PoolConfig::new(url).with_max_size(settings.database_pool_size))
                .await
                .map_err(std::io::Error::other)?;
            let state = pool.state();
            info!(connections = state.connections, idle = state.idle, "database pool ready");
            config = config.with_db_pool(pool);
        }
        None => warn!("no database_url configured; using the in-memory store"),
    }

    let health_state = web::Data::new(HealthState::new());
    create_server(health_state, config)?.await
}

fn build_mailer(settings: &AppSettings) -> std::io::Result<Arc<dyn Mailer>> {
    match settings.mail().map_err(std::io::Error::other)? {
        Some(mail) => {
            let mailer = HttpMailer::new(
                MailCredentials {
                    endpoint: mail.endpoint,
                    api_key: mail.api_key,
                    sender: mail.sender,
                },
                settings.outbound_timeout(),
            )
            .map_err(std::io::Error::other)?;
            Ok(Arc::new(mailer))
        }
        None => {
            warn!("mail provider not configured; outbound email will fail");
            Ok(Arc::new(UnconfiguredMailer))
        }
    }
}

fn build_geocoder(settings: &AppSettings) -> std::io::Result<Arc<dyn GeocodingSource>> {
    match settings.geocoder().map_err(std::io::Error::other)? {
        Some(geo) => {
            let geocoder = HttpGeocoder::new(geo.endpoint, geo.api_key, settings.outbound_timeout())
                .map_err(std::io::Error::other)?;
            Ok(Arc::new(geocoder))
        }
        None => {
            warn!("map API key not configured; geocoding uses the locality table");
            Ok(Arc::new(UnconfiguredGeocoder))
        }
    }
}
