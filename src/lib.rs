//! # EmberKV - A Typed In-Memory Keyspace
//!
//! EmberKV is the command core of a Redis-style key-value store: a sharded
//! keyspace of typed values with per-key expiry, and a dispatcher that runs
//! commands against it. A transport layer (RESP over TCP, an embedded REPL,
//! a test harness) hands it a command name plus arguments and gets back a
//! [`Reply`].
//!
//! ## Features
//!
//! - **Typed values**: strings, lists, hashes, sets and bitmaps, with
//!   WRONGTYPE enforced by the dispatcher before any handler runs
//! - **Per-key atomicity**: every read-modify-write runs under its shard's lock
//! - **TTL Support**: lazy expiry on access plus an optional background sweeper
//! - **Binary safe**: keys and values are arbitrary byte strings
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              EmberKV                                    │
//! │                                                                         │
//! │   transport ──(name, args)──> ┌─────────────┐                           │
//! │                               │  Command    │──> Reply                  │
//! │                               │  Handler    │                           │
//! │                               └──────┬──────┘                           │
//! │                                      │  read / write + kind check       │
//! │                                      ▼                                  │
//! │                     ┌──────────────────────────────────────────────┐   │
//! │                     │              StorageEngine                   │   │
//! │                     │  ┌────────┐ ┌────────┐ ┌────────┐ ┌────────┐ │   │
//! │                     │  │Shard 0 │ │Shard 1 │ │Shard 2 │ │...N    │ │   │
//! │                     │  │RwLock  │ │RwLock  │ │RwLock  │ │shards  │ │   │
//! │                     │  └────────┘ └────────┘ └────────┘ └────────┘ │   │
//! │                     └──────────────────────────────────────────────┘   │
//! │                                      ▲                                  │
//! │                     ┌────────────────┴────────────────────────────────┐ │
//! │                     │           ExpirySweeper                         │ │
//! │                     │      (Background Tokio Task)                    │ │
//! │                     └─────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use emberkv::{Config, Database, Reply};
//!
//! let db = Database::open(Config::new().active_expiry(false)).unwrap();
//! let client = db.handler();
//!
//! assert_eq!(client.execute_parts(&["APPEND", "k1", "hello"]), Reply::integer(5));
//! assert_eq!(client.execute_parts(&["APPEND", "k1", " world"]), Reply::integer(11));
//! assert_eq!(client.execute_parts(&["GET", "k1"]).as_str(), Some("hello world"));
//!
//! client.execute_parts(&["LPUSH", "list", "a"]);
//! assert!(client.execute_parts(&["APPEND", "list", "x"]).is_error());
//! ```
//!
//! ## Supported Commands
//!
//! ### String Commands
//! - `SET key value [EX seconds | PX milliseconds]`
//! - `GET key`
//! - `APPEND key value`
//! - `STRLEN key`
//!
//! ### Key Commands
//! - `DEL key [key ...]`
//! - `EXISTS key [key ...]`
//! - `EXPIRE key seconds`
//! - `TTL key` / `PTTL key`
//! - `PERSIST key`
//! - `TYPE key`
//!
//! ### Collection Commands
//! - `LPUSH key value [value ...]`
//! - `HSET key field value [field value ...]`
//! - `SADD key member [member ...]`
//! - `SETBIT key offset bit` / `GETBIT key offset`
//!
//! ### Server Commands
//! - `PING [message]`
//! - `DBSIZE`
//! - `FLUSHDB`
//!
//! ## Module Overview
//!
//! - [`storage`]: Sharded keyspace, value types and expiry
//! - [`commands`]: Command table, dispatcher and handlers
//! - [`protocol`]: Reply types handed back to the transport
//! - [`config`]: Database configuration
//!
//! ## Lazy + Active Expiry
//!
//! Keys with TTL are expired in two ways:
//! 1. **Lazy**: Every keyspace access treats an expired key as absent and
//!    purges it
//! 2. **Active**: A background task periodically scans for expired keys
//!
//! Lazy expiry alone is enough for correctness; the sweeper only reclaims
//! memory held by keys nobody touches again.

pub mod commands;
pub mod config;
pub mod database;
pub mod protocol;
pub mod storage;

// Re-export commonly used types for convenience
pub use commands::{CommandError, CommandHandler};
pub use config::{Config, ConfigError};
pub use database::Database;
pub use protocol::Reply;
pub use storage::{ExpiryConfig, ExpirySweeper, StorageEngine, Value, ValueKind};

/// Version of EmberKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
