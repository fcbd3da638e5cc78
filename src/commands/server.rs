//! Server commands: PING, DBSIZE, FLUSHDB.

use crate::commands::error::CommandResult;
use crate::commands::handler::{CommandHandler, Invocation};
use crate::protocol::Reply;

impl CommandHandler {
    /// PING [message]
    pub(crate) fn cmd_ping(&self, inv: &Invocation<'_>) -> CommandResult {
        Ok(match inv.args.first() {
            Some(msg) => Reply::bulk(msg.clone()),
            None => Reply::pong(),
        })
    }

    /// DBSIZE
    pub(crate) fn cmd_dbsize(&self, _inv: &Invocation<'_>) -> CommandResult {
        Ok(Reply::integer(self.storage.len() as i64))
    }

    /// FLUSHDB
    pub(crate) fn cmd_flushdb(&self, _inv: &Invocation<'_>) -> CommandResult {
        self.storage.flush();
        Ok(Reply::ok())
    }
}
