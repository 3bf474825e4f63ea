//! Request correlation identifier.
//!
//! A request keeps the identifier its caller sent in the `trace-id` header
//! when that is a UUID, and gets a fresh one otherwise. It is held in
//! task-local storage so errors raised inside a service can read it. Spawned
//! tasks do not inherit it; wrap them in [`TraceId::scope`].

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use tokio::task_local;
use uuid::Uuid;

task_local! {
    static CURRENT: TraceId;
}

/// Header carrying the trace identifier on HTTP responses.
pub const TRACE_ID_HEADER: &str = "trace-id";

/// Correlation identifier attached to a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceId(Uuid);

impl TraceId {
    /// Fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Reuse a caller-supplied identifier, or generate one.
    ///
    /// ```
    /// use estate_backend::domain::TraceId;
    ///
    /// let kept = TraceId::adopt(Some("6f1c2d7e-0b5a-4c3e-9d21-8a7b6c5d4e3f"));
    /// assert_eq!(kept.to_string(), "6f1c2d7e-0b5a-4c3e-9d21-8a7b6c5d4e3f");
    /// assert_ne!(TraceId::adopt(Some("not-a-uuid")), TraceId::adopt(Some("not-a-uuid")));
    /// ```
    #[must_use]
    pub fn adopt(inbound: Option<&str>) -> Self {
        inbound
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or_else(Self::generate)
    }

    /// Identifier in scope for the running task, if any.
    #[must_use]
    pub fn current() -> Option<Self> {
        CURRENT.try_with(|id| *id).ok()
    }

    /// Run `fut` with `trace_id` as the current identifier.
    ///
    /// ```
    /// use estate_backend::domain::TraceId;
    ///
    /// # tokio::runtime::Runtime::new().expect("runtime").block_on(async {
    /// let id = TraceId::generate();
    /// assert_eq!(TraceId::scope(id, async { TraceId::current() }).await, Some(id));
    /// # });
    /// ```
    pub async fn scope<Fut: Future>(trace_id: Self, fut: Fut) -> Fut::Output {
        CURRENT.scope(trace_id, fut).await
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for TraceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}
