//! Route guards.
//!
//! Handlers call [`HttpState::require`] first thing; the session supplies
//! the claimed identity and the domain decides whether it passes the tier.

use crate::domain::{AccessTier, Error, Principal, authorize};

use super::session::SessionContext;
use super::state::HttpState;

impl HttpState {
    /// Resolve the caller for a route guarded by `tier`.
    pub async fn require(
        &self,
        session: &SessionContext,
        tier: AccessTier,
    ) -> Result<Principal, Error> {
        authorize(self.accounts.as_ref(), session.principal()?, tier).await
    }
}
