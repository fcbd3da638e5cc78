//! Command Handler Module
//!
//! This module implements the command processing layer for EmberKV.
//! It receives parsed commands (name + arguments), executes them against the
//! storage engine, and returns a typed [`Reply`](crate::protocol::Reply).
//!
//! ## Architecture
//!
//! ```text
//! Transport layer (name, args)
//!       │
//!       ▼
//! ┌─────────────────┐
//! │ CommandHandler  │  (this module)
//! │                 │
//! │  - Lookup       │
//! │  - Validate     │
//! │  - Type check   │
//! │  - Execute      │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ StorageEngine   │  (storage module)
//! └─────────────────┘
//! ```
//!
//! ## Supported Commands
//!
//! ### String Commands
//! - `SET`, `GET`, `APPEND`, `STRLEN`
//!
//! ### Key Commands
//! - `DEL`, `EXISTS`, `TTL`, `PTTL`, `EXPIRE`, `PERSIST`, `TYPE`
//!
//! ### Collection Commands
//! - `LPUSH`, `HSET`, `SADD`, `SETBIT`, `GETBIT`
//!
//! ### Server Commands
//! - `PING`, `DBSIZE`, `FLUSHDB`

mod collections;
pub mod error;
pub mod handler;
mod keys;
mod server;
mod strings;

pub use error::{CommandError, CommandResult};
pub use handler::{lookup, Arity, CommandHandler, CommandSpec};
