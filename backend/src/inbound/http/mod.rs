//! REST adapter mounted under `/api`: handlers, session extraction and error rendering.

pub mod access;
pub mod auth;
pub mod error;
pub mod health;
pub mod map;
pub mod resources;
pub mod routes;
pub mod session;
pub mod session_config;
pub mod state;
pub mod stats;
#[cfg(test)]
pub mod test_utils;
pub mod users;
pub mod validation;
pub mod verifications;

pub use error::ApiResult;
