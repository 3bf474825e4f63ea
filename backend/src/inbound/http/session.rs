//! Session helpers to keep HTTP handlers free of framework-specific logic.
//!
//! The cookie carries the signed-in user's id and the role they had at login.
//! The role is a claim only: admin tiers re-check it against the store.

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;
use tracing::warn;

use crate::domain::{Error, Principal, Role, UserId};

pub(crate) const USER_ID_KEY: &str = "user_id";
pub(crate) const USER_ROLE_KEY: &str = "user_role";

/// Newtype wrapper that exposes higher-level session operations.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Store the signed-in identity, rotating the session id first.
    pub fn persist_principal(&self, principal: &Principal) -> Result<(), Error> {
        self.0.renew();
        self.insert(USER_ID_KEY, principal.user_id.to_string())?;
        self.insert(USER_ROLE_KEY, principal.role.as_str().to_owned())
    }

    fn insert(&self, key: &str, value: String) -> Result<(), Error> {
        self.0
            .insert(key, value)
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
    }

    fn read(&self, key: &str) -> Result<Option<String>, Error> {
        self.0
            .get::<String>(key)
            .map_err(|error| Error::internal(format!("failed to read session: {error}")))
    }

    /// Current user id, if present and well formed.
    pub fn user_id(&self) -> Result<Option<UserId>, Error> {
        Ok(self.read(USER_ID_KEY)?.and_then(|raw| match UserId::new(&raw) {
            Ok(id) => Some(id),
            Err(error) => {
                warn!(%error, "invalid user id in session cookie");
                None
            }
        }))
    }

    /// Claimed identity. A cookie missing either key, or holding an
    /// unreadable one, counts as signed out.
    pub fn principal(&self) -> Result<Option<Principal>, Error> {
        let Some(user_id) = self.user_id()? else {
            return Ok(None);
        };
        let Some(raw_role) = self.read(USER_ROLE_KEY)? else {
            return Ok(None);
        };
        match raw_role.parse::<Role>() {
            Ok(role) => Ok(Some(Principal::new(user_id, role))),
            Err(error) => {
                warn!(%error, "invalid role in session cookie");
                Ok(None)
            }
        }
    }

    /// Require an authenticated user id or return `401 Unauthorized`.
    pub fn require_user_id(&self) -> Result<UserId, Error> {
        self.user_id()?
            .ok_or_else(|| Error::unauthorized("Authentication required"))
    }

    /// Drop all session state and expire the cookie.
    pub fn purge(&self) {
        self.0.purge();
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}
