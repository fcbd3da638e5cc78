//! String commands: SET, GET, APPEND, STRLEN.
//!
//! String values are raw bytes. Nothing here parses or normalizes them, so
//! `"0043"` stays `"0043"` through any number of APPENDs.

use crate::commands::error::{CommandError, CommandResult};
use crate::commands::handler::{deadline_after, parse_i64, CommandHandler, Invocation};
use crate::protocol::Reply;
use crate::storage::{Entry, Value, ValueKind};
use bytes::Bytes;
use std::time::Instant;

impl CommandHandler {
    /// SET key value [EX seconds | PX milliseconds]
    ///
    /// Replaces whatever the key held, of any kind. Without EX/PX the key
    /// loses any previous expiry.
    pub(crate) fn cmd_set(&self, inv: &Invocation<'_>) -> CommandResult {
        let value = &inv.args[1];
        let expires_at = parse_set_expiry(&inv.args[2..])?;

        self.storage.set(inv.key(), Value::string(value), expires_at);
        Ok(Reply::ok())
    }

    /// GET key
    pub(crate) fn cmd_get(&self, inv: &Invocation<'_>) -> CommandResult {
        self.read(inv, inv.key(), |entry| match entry {
            Some(entry) => {
                let buf = entry.value.as_string().ok_or(CommandError::WrongType)?;
                Ok(Reply::bulk(Bytes::copy_from_slice(buf)))
            }
            None => Ok(Reply::nil()),
        })
    }

    /// APPEND key value
    ///
    /// Creates the key when absent. An existing key keeps its expiry.
    pub(crate) fn cmd_append(&self, inv: &Invocation<'_>) -> CommandResult {
        let suffix = &inv.args[1];

        self.write(inv, inv.key(), |slot| {
            let entry = slot.get_or_insert_with(|| Entry::new(Value::empty(ValueKind::String)));
            let buf = entry.value.as_string_mut().ok_or(CommandError::WrongType)?;
            buf.extend_from_slice(suffix);
            Ok(Reply::integer(buf.len() as i64))
        })
    }

    /// STRLEN key
    pub(crate) fn cmd_strlen(&self, inv: &Invocation<'_>) -> CommandResult {
        self.read(inv, inv.key(), |entry| {
            let len = match entry {
                Some(entry) => entry.value.as_string().ok_or(CommandError::WrongType)?.len(),
                None => 0,
            };
            Ok(Reply::integer(len as i64))
        })
    }
}

/// Parses SET's trailing options into an absolute expiry.
fn parse_set_expiry(opts: &[Bytes]) -> Result<Option<Instant>, CommandError> {
    let mut expires_at = None;
    let mut rest = opts;

    while let Some((opt, tail)) = rest.split_first() {
        let unit_ms = if opt.eq_ignore_ascii_case(b"EX") {
            1000
        } else if opt.eq_ignore_ascii_case(b"PX") {
            1
        } else {
            return Err(CommandError::Syntax);
        };

        let (amount, tail) = tail.split_first().ok_or(CommandError::Syntax)?;
        if expires_at.is_some() {
            return Err(CommandError::Syntax);
        }

        let at = deadline_after(parse_i64(amount)?, unit_ms, "set")?;
        expires_at = Some(at);
        rest = tail;
    }

    Ok(expires_at)
}
