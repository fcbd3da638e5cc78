//! Key commands: DEL, EXISTS, TTL, PTTL, EXPIRE, PERSIST, TYPE.
//!
//! None of these care what kind of value a key holds.

use crate::commands::error::CommandResult;
use crate::commands::handler::{deadline_after, parse_i64, CommandHandler, Invocation};
use crate::protocol::Reply;

impl CommandHandler {
    /// DEL key [key ...]
    pub(crate) fn cmd_del(&self, inv: &Invocation<'_>) -> CommandResult {
        let deleted = self.storage.remove_many(inv.args);
        Ok(Reply::integer(deleted as i64))
    }

    /// EXISTS key [key ...]
    ///
    /// A key named twice counts twice.
    pub(crate) fn cmd_exists(&self, inv: &Invocation<'_>) -> CommandResult {
        let count = inv.args.iter().filter(|k| self.storage.exists(k)).count();
        Ok(Reply::integer(count as i64))
    }

    /// TTL key
    pub(crate) fn cmd_ttl(&self, inv: &Invocation<'_>) -> CommandResult {
        Ok(Reply::integer(self.storage.ttl(inv.key()).as_secs()))
    }

    /// PTTL key
    pub(crate) fn cmd_pttl(&self, inv: &Invocation<'_>) -> CommandResult {
        Ok(Reply::integer(self.storage.ttl(inv.key()).as_millis()))
    }

    /// EXPIRE key seconds
    ///
    /// A non-positive timeout deletes the key.
    pub(crate) fn cmd_expire(&self, inv: &Invocation<'_>) -> CommandResult {
        let seconds = parse_i64(&inv.args[1])?;

        let applied = if seconds <= 0 {
            self.storage.remove(inv.key())
        } else {
            let at = deadline_after(seconds, 1000, "expire")?;
            self.storage.expire_at(inv.key(), at)
        };

        Ok(Reply::integer(i64::from(applied)))
    }

    /// PERSIST key
    pub(crate) fn cmd_persist(&self, inv: &Invocation<'_>) -> CommandResult {
        Ok(Reply::integer(i64::from(self.storage.persist(inv.key()))))
    }

    /// TYPE key
    pub(crate) fn cmd_type(&self, inv: &Invocation<'_>) -> CommandResult {
        let name = self
            .storage
            .kind_of(inv.key())
            .map(|kind| kind.type_name())
            .unwrap_or("none");
        Ok(Reply::status(name))
    }
}
