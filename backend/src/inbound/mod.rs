//! Inbound adapters translating external requests into domain service calls
//! while keeping framework details at the edge.
//!
//! REST handlers live under [`http`]; the notification socket lives under
//! [`ws`]. Both read the same cookie session.

pub mod http;
pub mod ws;
