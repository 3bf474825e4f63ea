//! Shared helpers for the Diesel adapter integration tests.
//!
//! The suites run against the PostgreSQL server named by
//! `ESTATE_TEST_DATABASE_URL`. When the variable is unset the suites skip;
//! when it is set but the database cannot be reached they fail unless
//! `SKIP_TEST_DATABASE` is truthy, so CI breakage is not masked.
//!
//! Tests share one database, so each one works on fresh identifiers and
//! addresses from [`unique_email`].

use std::sync::{Mutex, OnceLock};

use estate_backend::outbound::persistence::{DbPool, PoolConfig, run_migrations};
use tokio::runtime::Runtime;
use uuid::Uuid;

/// Variable naming the database the suites write to.
pub const DATABASE_URL_VAR: &str = "ESTATE_TEST_DATABASE_URL";

static MIGRATION_LOCK: OnceLock<Mutex<bool>> = OnceLock::new();

/// Returns true when `SKIP_TEST_DATABASE` is "1", "true" or "yes".
pub fn should_skip_test_database() -> bool {
    std::env::var("SKIP_TEST_DATABASE")
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Handles database setup failures consistently across suites.
pub fn handle_database_setup_failure<T>(reason: impl std::fmt::Display) -> Option<T> {
    if should_skip_test_database() {
        eprintln!("SKIP-TEST-DATABASE: {reason}");
        None
    } else {
        panic!("Test database setup failed: {reason}. Set SKIP_TEST_DATABASE=1 to skip.");
    }
}

/// Runtime plus a migrated pool for one test. The pool drops first.
pub struct TestDatabase {
    pub pool: DbPool,
    pub runtime: Runtime,
}

fn connect(url: &str) -> Result<TestDatabase, String> {
    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    {
        let mut migrated = MIGRATION_LOCK
            .get_or_init(|| Mutex::new(false))
            .lock()
            .unwrap_or_else(|err| err.into_inner());
        if !*migrated {
            runtime
                .block_on(run_migrations(url))
                .map_err(|err| err.to_string())?;
            *migrated = true;
        }
    }
    let pool = runtime
        .block_on(DbPool::new(PoolConfig::new(url).with_max_size(2)))
        .map_err(|err| err.to_string())?;
    Ok(TestDatabase { pool, runtime })
}

/// Connects to the configured database, or returns `None` to skip.
pub fn test_database() -> Option<TestDatabase> {
    let Ok(url) = std::env::var(DATABASE_URL_VAR) else {
        eprintln!("SKIP-TEST-DATABASE: {DATABASE_URL_VAR} is not set");
        return None;
    };
    match connect(&url) {
        Ok(database) => Some(database),
        Err(reason) => handle_database_setup_failure(reason),
    }
}

/// Address no other test run has used.
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.test", Uuid::new_v4().simple())
}
