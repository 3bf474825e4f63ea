//! `/ws` upgrade endpoint for live notifications.
//!
//! An upgrade needs exactly one `Origin` header from the allow-list and a
//! signed-in session cookie. Once upgraded, the connection loop in
//! `session` lets the client join its own `user_<id>` room.

use actix_web::http::StatusCode;
use actix_web::http::header::{HeaderMap, ORIGIN};
use actix_web::web::{self, Payload};
use actix_web::{HttpRequest, HttpResponse, ResponseError, get};
use tracing::{debug, error, warn};
use url::Url;

use crate::domain::Error;
use crate::inbound::http::session::SessionContext;

mod session;

pub mod messages;
pub mod state;

use state::WsState;

/// Why an upgrade was refused before the session was consulted.
#[derive(Debug, thiserror::Error)]
enum UpgradeRefusal {
    #[error("Origin not allowed")]
    MissingOrigin,
    #[error("Invalid Origin header")]
    DuplicateOrigin,
    #[error("Invalid Origin header")]
    MalformedOrigin,
    #[error("Origin not allowed")]
    ForeignOrigin(String),
}

impl ResponseError for UpgradeRefusal {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingOrigin | Self::ForeignOrigin(_) => StatusCode::FORBIDDEN,
            Self::DuplicateOrigin | Self::MalformedOrigin => StatusCode::BAD_REQUEST,
        }
    }
}

/// Upgrade `GET /ws` for the signed-in user.
#[get("/ws")]
pub async fn ws_entry(
    state: web::Data<WsState>,
    session: SessionContext,
    req: HttpRequest,
    stream: Payload,
) -> actix_web::Result<HttpResponse> {
    if let Err(refusal) = check_origin(&state, req.headers()) {
        warn!(reason = ?refusal, "websocket upgrade refused");
        return Err(refusal.into());
    }

    let principal = session
        .principal()?
        .ok_or_else(|| Error::unauthorized("Authentication required"))?;

    let (response, ws_session, frames) = actix_ws::handle(&req, stream).map_err(|err| {
        error!(error = %err, "websocket handshake failed");
        actix_web::error::ErrorInternalServerError("WebSocket upgrade failed")
    })?;
    debug!(user_id = %principal.user_id, "websocket connected");
    actix_web::rt::spawn(session::handle_ws_session(
        state.hub.clone(),
        principal.user_id,
        ws_session,
        frames,
    ));
    Ok(response)
}

fn check_origin(state: &WsState, headers: &HeaderMap) -> Result<(), UpgradeRefusal> {
    let mut values = headers.get_all(ORIGIN);
    let header = values.next().ok_or(UpgradeRefusal::MissingOrigin)?;
    if values.next().is_some() {
        return Err(UpgradeRefusal::DuplicateOrigin);
    }
    let raw = header.to_str().map_err(|_| UpgradeRefusal::MalformedOrigin)?;
    let origin = Url::parse(raw).map_err(|_| UpgradeRefusal::MalformedOrigin)?;
    if state.allows(&origin) {
        Ok(())
    } else {
        Err(UpgradeRefusal::ForeignOrigin(raw.to_owned()))
    }
}
