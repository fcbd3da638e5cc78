//! Shared helpers for the integration tests.

#![allow(dead_code)]

use bytes::Bytes;
use emberkv::{CommandError, CommandHandler, Config, Database, Reply};
use tracing_subscriber::EnvFilter;

/// Installs a test-friendly subscriber honoring `RUST_LOG`. Safe to call
/// from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Opens a database with lazy expiry only.
pub fn open_db() -> Database {
    init_tracing();
    Database::open(Config::new().active_expiry(false)).expect("default config is valid")
}

/// Runs a whitespace-free command line given as parts.
pub fn run(client: &CommandHandler, parts: &[&str]) -> Reply {
    client.execute_parts(parts)
}

pub fn bulk(s: &str) -> Reply {
    Reply::bulk(Bytes::copy_from_slice(s.as_bytes()))
}

pub fn wrongtype() -> Reply {
    Reply::from(CommandError::WrongType)
}
