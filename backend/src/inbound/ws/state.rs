//! Shared WebSocket adapter state.

use std::sync::Arc;

use url::{Origin, Url};

use crate::outbound::realtime::NotificationHub;

/// Dependency bundle for the socket entry point and connection loops.
#[derive(Clone)]
pub struct WsState {
    pub hub: Arc<NotificationHub>,
    allowed_origins: Arc<[Origin]>,
}

impl WsState {
    /// `allowed_origins` are compared by scheme, host and port.
    pub fn new(hub: Arc<NotificationHub>, allowed_origins: impl IntoIterator<Item = Url>) -> Self {
        Self {
            hub,
            allowed_origins: allowed_origins.into_iter().map(|u| u.origin()).collect(),
        }
    }

    pub fn allows(&self, origin: &Url) -> bool {
        let origin = origin.origin();
        origin.is_tuple() && self.allowed_origins.contains(&origin)
    }
}
