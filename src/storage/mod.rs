//! Storage Engine Module
//!
//! This module owns the keyspace: typed values, entries with optional expiry,
//! the sharded concurrent map that holds them, and the background sweeper
//! that reclaims expired entries nobody touches.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     StorageEngine                           │
//! │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐           │
//! │  │ Shard 0 │ │ Shard 1 │ │ Shard 2 │ │...N     │           │
//! │  │ RwLock  │ │ RwLock  │ │ RwLock  │ │ shards  │           │
//! │  └─────────┘ └─────────┘ └─────────┘ └─────────┘           │
//! │        Bytes ──► Entry { Value, expires_at }               │
//! └─────────────────────────────────────────────────────────────┘
//!                            ▲
//!                            │
//!              ┌─────────────┴─────────────┐
//!              │     ExpirySweeper         │
//!              │  (optional Tokio task)    │
//!              └───────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use emberkv::storage::{StorageEngine, Ttl, Value};
//! use bytes::Bytes;
//! use std::time::{Duration, Instant};
//!
//! let engine = StorageEngine::new();
//! let key = Bytes::from("session");
//!
//! engine.set(&key, Value::string("token"), Some(Instant::now() + Duration::from_secs(60)));
//! assert!(matches!(engine.ttl(&key), Ttl::Remaining(_)));
//! assert!(engine.remove(&key));
//! assert_eq!(engine.ttl(&key), Ttl::Absent);
//! ```

pub mod engine;
pub mod expiry;
pub mod value;

pub use engine::{Entry, StorageEngine, StorageStats, Ttl, DEFAULT_SHARDS};
pub use expiry::{ExpiryConfig, ExpirySweeper};
pub use value::{Value, ValueKind};
