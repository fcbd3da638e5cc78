//! Command Dispatcher
//!
//! This module turns a parsed command (name + arguments) into a [`Reply`].
//! Every command is described by one entry in a static command table that
//! fixes its arity and the value kind its key must hold.
//!
//! ## Dispatch Pipeline
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     CommandHandler                          │
//! │                                                             │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐     │
//! │  │  lookup()   │───>│   arity     │───>│  handler    │     │
//! │  │ (table)     │    │   check     │    │ + kind check│     │
//! │  └─────────────┘    └─────────────┘    └──────┬──────┘     │
//! │                                               │             │
//! │                                               ▼             │
//! │                                      StorageEngine          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Type Enforcement
//!
//! Handlers never look at the key's kind themselves. They access the key
//! through [`CommandHandler::read`] and [`CommandHandler::write`], which
//! compare the live entry's kind with the table entry's kind inside the same
//! lock that guards the handler body. A mismatch fails with WRONGTYPE before
//! the handler runs, so nothing is mutated.
//!
//! ## Error Boundary
//!
//! Handlers return `Result<Reply, CommandError>`. [`CommandHandler::execute`]
//! is the only place errors become replies; no error escapes as a panic or
//! aborts the caller.

use crate::commands::error::{CommandError, CommandResult};
use crate::protocol::Reply;
use crate::storage::{Entry, StorageEngine, ValueKind};
use bytes::Bytes;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Accepted argument counts, not counting the command name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
    Between(usize, usize),
}

impl Arity {
    fn accepts(self, argc: usize) -> bool {
        match self {
            Arity::Exact(n) => argc == n,
            Arity::AtLeast(n) => argc >= n,
            Arity::Between(lo, hi) => (lo..=hi).contains(&argc),
        }
    }
}

type Handler = fn(&CommandHandler, &Invocation<'_>) -> CommandResult;

/// One command table entry.
pub struct CommandSpec {
    /// Canonical uppercase name
    pub name: &'static str,
    /// Accepted argument counts
    pub arity: Arity,
    /// Kind the first argument's key must hold, if the command cares
    pub kind: Option<ValueKind>,
    handler: Handler,
}

impl std::fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandSpec")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("kind", &self.kind)
            .finish()
    }
}

macro_rules! command {
    ($name:literal, $arity:expr, $kind:expr, $handler:path) => {
        CommandSpec {
            name: $name,
            arity: $arity,
            kind: $kind,
            handler: $handler,
        }
    };
}

static COMMANDS: &[CommandSpec] = &[
    // Strings
    command!("SET", Arity::AtLeast(2), None, CommandHandler::cmd_set),
    command!("GET", Arity::Exact(1), Some(ValueKind::String), CommandHandler::cmd_get),
    command!("APPEND", Arity::Exact(2), Some(ValueKind::String), CommandHandler::cmd_append),
    command!("STRLEN", Arity::Exact(1), Some(ValueKind::String), CommandHandler::cmd_strlen),
    // Keys
    command!("DEL", Arity::AtLeast(1), None, CommandHandler::cmd_del),
    command!("EXISTS", Arity::AtLeast(1), None, CommandHandler::cmd_exists),
    command!("TTL", Arity::Exact(1), None, CommandHandler::cmd_ttl),
    command!("PTTL", Arity::Exact(1), None, CommandHandler::cmd_pttl),
    command!("EXPIRE", Arity::Exact(2), None, CommandHandler::cmd_expire),
    command!("PERSIST", Arity::Exact(1), None, CommandHandler::cmd_persist),
    command!("TYPE", Arity::Exact(1), None, CommandHandler::cmd_type),
    // Typed collections
    command!("LPUSH", Arity::AtLeast(2), Some(ValueKind::List), CommandHandler::cmd_lpush),
    command!("HSET", Arity::AtLeast(3), Some(ValueKind::Hash), CommandHandler::cmd_hset),
    command!("SADD", Arity::AtLeast(2), Some(ValueKind::Set), CommandHandler::cmd_sadd),
    command!("SETBIT", Arity::Exact(3), Some(ValueKind::Bitmap), CommandHandler::cmd_setbit),
    command!("GETBIT", Arity::Exact(2), Some(ValueKind::Bitmap), CommandHandler::cmd_getbit),
    // Server
    command!("PING", Arity::Between(0, 1), None, CommandHandler::cmd_ping),
    command!("DBSIZE", Arity::Exact(0), None, CommandHandler::cmd_dbsize),
    command!("FLUSHDB", Arity::Exact(0), None, CommandHandler::cmd_flushdb),
];

/// Finds the table entry for a command name (case-insensitive).
pub fn lookup(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|spec| spec.name.eq_ignore_ascii_case(name))
}

/// A validated command on its way to its handler.
pub(crate) struct Invocation<'a> {
    pub(crate) spec: &'static CommandSpec,
    pub(crate) args: &'a [Bytes],
}

impl Invocation<'_> {
    /// The key argument. Arity validation guarantees it exists for every
    /// command that uses it.
    pub(crate) fn key(&self) -> &Bytes {
        &self.args[0]
    }
}

/// Executes commands against a shared [`StorageEngine`].
///
/// Cheap to clone; each connection gets its own handle.
#[derive(Clone, Debug)]
pub struct CommandHandler {
    pub(crate) storage: Arc<StorageEngine>,
}

impl CommandHandler {
    /// Creates a new command handler with the given storage engine.
    pub fn new(storage: Arc<StorageEngine>) -> Self {
        Self { storage }
    }

    /// The storage engine this handler executes against.
    pub fn storage(&self) -> &Arc<StorageEngine> {
        &self.storage
    }

    /// Executes one command and returns its reply.
    ///
    /// Errors are turned into [`Reply::Error`]; this never fails.
    ///
    /// # Example
    ///
    /// ```
    /// use emberkv::commands::CommandHandler;
    /// use emberkv::protocol::Reply;
    /// use emberkv::storage::StorageEngine;
    /// use bytes::Bytes;
    /// use std::sync::Arc;
    ///
    /// let handler = CommandHandler::new(Arc::new(StorageEngine::new()));
    /// let reply = handler.execute("APPEND", &[Bytes::from("k"), Bytes::from("value")]);
    /// assert_eq!(reply, Reply::integer(5));
    /// ```
    pub fn execute(&self, name: &str, args: &[Bytes]) -> Reply {
        match self.dispatch(name, args) {
            Ok(reply) => reply,
            Err(err) => {
                debug!(command = name, error = %err, "Command failed");
                err.into()
            }
        }
    }

    /// Executes a tokenized command line whose first part is the name.
    pub fn execute_parts<S: AsRef<[u8]>>(&self, parts: &[S]) -> Reply {
        let Some((name, rest)) = parts.split_first() else {
            return Reply::error("ERR empty command");
        };
        let name = String::from_utf8_lossy(name.as_ref());
        let args: Vec<Bytes> = rest
            .iter()
            .map(|p| Bytes::copy_from_slice(p.as_ref()))
            .collect();
        self.execute(&name, &args)
    }

    fn dispatch(&self, name: &str, args: &[Bytes]) -> CommandResult {
        let spec = lookup(name).ok_or_else(|| CommandError::UnknownCommand(name.to_string()))?;

        if !spec.arity.accepts(args.len()) {
            return Err(CommandError::arity(spec.name));
        }

        trace!(command = spec.name, argc = args.len(), "Dispatching command");
        (spec.handler)(self, &Invocation { spec, args })
    }

    // ========================================================================
    // Typed key access
    // ========================================================================

    /// Shared access to a key, after the kind check.
    pub(crate) fn read<R>(
        &self,
        inv: &Invocation<'_>,
        key: &[u8],
        f: impl FnOnce(Option<&Entry>) -> Result<R, CommandError>,
    ) -> Result<R, CommandError> {
        self.storage.view(key, |entry| {
            check_kind(entry, inv.spec.kind)?;
            f(entry)
        })
    }

    /// Exclusive read-modify-write of a key, after the kind check.
    pub(crate) fn write<R>(
        &self,
        inv: &Invocation<'_>,
        key: &Bytes,
        f: impl FnOnce(&mut Option<Entry>) -> Result<R, CommandError>,
    ) -> Result<R, CommandError> {
        self.storage.upsert(key, |slot| {
            check_kind(slot.as_ref(), inv.spec.kind)?;
            f(slot)
        })
    }
}

/// Fails with WRONGTYPE when a live entry's kind differs from the required one.
fn check_kind(entry: Option<&Entry>, required: Option<ValueKind>) -> Result<(), CommandError> {
    match (entry, required) {
        (Some(entry), Some(kind)) if entry.kind() != kind => Err(CommandError::WrongType),
        _ => Ok(()),
    }
}

/// Parses a base-10 signed integer argument.
pub(crate) fn parse_i64(arg: &[u8]) -> Result<i64, CommandError> {
    std::str::from_utf8(arg)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or(CommandError::NotInteger)
}

/// Turns a positive timeout of `amount * unit_ms` milliseconds into a
/// deadline.
///
/// The timeout must fit in an `i64` of milliseconds, which is what PTTL
/// reports.
pub(crate) fn deadline_after(
    amount: i64,
    unit_ms: i64,
    command: &'static str,
) -> Result<Instant, CommandError> {
    amount
        .checked_mul(unit_ms)
        .filter(|ms| *ms > 0)
        .and_then(|ms| Instant::now().checked_add(Duration::from_millis(ms as u64)))
        .ok_or(CommandError::InvalidExpireTime(command))
}
