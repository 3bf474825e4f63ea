//! Inputs for [`super::create_server`].

use std::net::SocketAddr;

use actix_web::cookie::{Key, SameSite};
use estate_backend::inbound::http::session_config::SessionSettings;
use estate_backend::outbound::persistence::DbPool;
use url::Url;

use super::state_builders::ExternalAdapters;

/// How the session cookie is sealed and scoped.
#[derive(Clone)]
pub struct CookiePolicy {
    pub key: Key,
    pub secure: bool,
    pub same_site: SameSite,
}

impl From<SessionSettings> for CookiePolicy {
    fn from(settings: SessionSettings) -> Self {
        Self {
            key: settings.key,
            secure: settings.cookie_secure,
            same_site: settings.same_site,
        }
    }
}

pub struct ServerConfig {
    pub(crate) cookies: CookiePolicy,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: Option<DbPool>,
    pub(crate) allowed_origins: Vec<Url>,
    pub(crate) adapters: ExternalAdapters,
}

impl ServerConfig {
    /// In-memory repositories and no socket origins until the `with_*`
    /// methods say otherwise.
    #[must_use]
    pub fn new(
        cookies: impl Into<CookiePolicy>,
        bind_addr: SocketAddr,
        adapters: ExternalAdapters,
    ) -> Self {
        Self {
            cookies: cookies.into(),
            bind_addr,
            db_pool: None,
            allowed_origins: Vec::new(),
            adapters,
        }
    }

    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Origins allowed to open `/ws`.
    #[must_use]
    pub fn with_allowed_origins(mut self, origins: Vec<Url>) -> Self {
        self.allowed_origins = origins;
        self
    }
}
