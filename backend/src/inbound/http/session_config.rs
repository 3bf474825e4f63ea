//! Cookie-session settings read from the environment.
//!
//! Release builds require `SESSION_COOKIE_SECURE`, `SESSION_SAMESITE` and
//! `SESSION_ALLOW_EPHEMERAL` to be set and valid, and load the cookie key from
//! `SESSION_KEY_FILE` (at least [`SESSION_KEY_MIN_LEN`] bytes). Debug builds
//! accept anything, warn, and mint a throwaway key when the file is missing.

mod resolve;

pub mod fingerprint;

use std::path::{Path, PathBuf};

use actix_web::cookie::{Key, SameSite};
use mockable::Env;
use tracing::warn;
use zeroize::Zeroizing;

use self::resolve::Resolver;

const SESSION_KEY_DEFAULT_PATH: &str = "/var/run/secrets/estate_session_key";
/// Minimum key file length accepted in release builds.
pub const SESSION_KEY_MIN_LEN: usize = 64;
const COOKIE_SECURE_ENV: &str = "SESSION_COOKIE_SECURE";
const SAMESITE_ENV: &str = "SESSION_SAMESITE";
const ALLOW_EPHEMERAL_ENV: &str = "SESSION_ALLOW_EPHEMERAL";
const KEY_FILE_ENV: &str = "SESSION_KEY_FILE";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    Debug,
    Release,
}

impl BuildMode {
    #[must_use]
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }

    fn default_same_site(self) -> SameSite {
        match self {
            Self::Debug => SameSite::Lax,
            Self::Release => SameSite::Strict,
        }
    }
}

/// Validated cookie settings.
pub struct SessionSettings {
    pub key: Key,
    pub cookie_secure: bool,
    pub same_site: SameSite,
}

#[derive(thiserror::Error, Debug)]
pub enum SessionConfigError {
    #[error("{name} must be set in release builds")]
    MissingEnv { name: &'static str },
    #[error("{name}='{value}' is not one of {expected}")]
    InvalidEnv {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error("cannot read session key file {path}: {source}")]
    KeyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("session key file {path} holds {length} bytes; at least {min_len} are required")]
    KeyTooShort {
        path: PathBuf,
        length: usize,
        min_len: usize,
    },
    #[error("SameSite=None cookies must also be Secure")]
    InsecureSameSiteNone,
    #[error("ephemeral session keys are refused in release builds")]
    EphemeralNotAllowed,
}

/// Resolve cookie settings for `mode`.
///
/// ```rust
/// use estate_backend::inbound::http::session_config::{BuildMode, session_settings_from_env};
/// use mockable::MockEnv;
///
/// let mut env = MockEnv::new();
/// env.expect_string().returning(|name| match name {
///     "SESSION_ALLOW_EPHEMERAL" => Some("1".to_owned()),
///     "SESSION_KEY_FILE" => Some("/nonexistent/estate-key".to_owned()),
///     _ => None,
/// });
/// let settings = session_settings_from_env(&env, BuildMode::Debug).expect("debug defaults");
/// assert!(settings.cookie_secure);
/// ```
pub fn session_settings_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
) -> Result<SessionSettings, SessionConfigError> {
    let resolver = Resolver::new(env, mode);

    let cookie_secure = resolver.flag(COOKIE_SECURE_ENV, true)?;
    let same_site = resolver.same_site(SAMESITE_ENV, mode.default_same_site())?;
    if same_site == SameSite::None && !cookie_secure {
        resolver.tolerate((), SessionConfigError::InsecureSameSiteNone)?;
    }

    let allow_ephemeral = resolver.flag(ALLOW_EPHEMERAL_ENV, false)?;
    if allow_ephemeral && mode == BuildMode::Release {
        return Err(SessionConfigError::EphemeralNotAllowed);
    }

    let key_path = resolver
        .raw(KEY_FILE_ENV)
        .map_or_else(|| PathBuf::from(SESSION_KEY_DEFAULT_PATH), PathBuf::from);
    let key = match read_key(&key_path, mode) {
        Ok(key) => key,
        Err(SessionConfigError::KeyRead { path, source })
            if allow_ephemeral || mode == BuildMode::Debug =>
        {
            warn!(path = %path.display(), error = %source, "session key unreadable; minting a temporary key");
            Key::generate()
        }
        Err(err) => return Err(err),
    };

    Ok(SessionSettings {
        key,
        cookie_secure,
        same_site,
    })
}

/// Derive the cookie key from a file. Key bytes are wiped once derived.
fn read_key(path: &Path, mode: BuildMode) -> Result<Key, SessionConfigError> {
    let bytes = Zeroizing::new(std::fs::read(path).map_err(|source| {
        SessionConfigError::KeyRead {
            path: path.to_path_buf(),
            source,
        }
    })?);
    if mode == BuildMode::Release && bytes.len() < SESSION_KEY_MIN_LEN {
        return Err(SessionConfigError::KeyTooShort {
            path: path.to_path_buf(),
            length: bytes.len(),
            min_len: SESSION_KEY_MIN_LEN,
        });
    }
    Ok(Key::derive_from(&bytes))
}

#[cfg(test)]
mod tests;
