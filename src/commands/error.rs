//! Command Errors
//!
//! Every way a command can fail, as one enum. The `Display` text of each
//! variant is exactly the error string the client receives, so converting an
//! error into a [`Reply`] is just formatting it.

use crate::protocol::Reply;
use thiserror::Error;

/// Errors produced while dispatching or executing a command.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// No handler is registered under this name.
    #[error("ERR unknown command '{0}'")]
    UnknownCommand(String),

    /// Argument count outside the command's arity.
    #[error("ERR wrong number of arguments for '{0}' command")]
    WrongArity(String),

    /// Malformed options.
    #[error("ERR syntax error")]
    Syntax,

    /// An argument that must be an integer isn't one.
    #[error("ERR value is not an integer or out of range")]
    NotInteger,

    /// EX/PX/EXPIRE argument that isn't a positive integer.
    #[error("ERR invalid expire time in '{0}' command")]
    InvalidExpireTime(&'static str),

    #[error("ERR bit offset is not an integer or out of range")]
    InvalidBitOffset,

    #[error("ERR bit is not an integer or out of range")]
    InvalidBit,

    /// The key holds a different kind of value than the command works on.
    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,
}

impl CommandError {
    /// Builds a [`CommandError::WrongArity`] for a command name.
    pub(crate) fn arity(name: &str) -> Self {
        CommandError::WrongArity(name.to_ascii_lowercase())
    }
}

impl From<CommandError> for Reply {
    fn from(err: CommandError) -> Self {
        Reply::Error(err.to_string())
    }
}

/// Result type returned by every command handler.
pub type CommandResult = Result<Reply, CommandError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrongtype_text() {
        let reply: Reply = CommandError::WrongType.into();
        assert_eq!(
            reply,
            Reply::error("WRONGTYPE Operation against a key holding the wrong kind of value")
        );
    }

    #[test]
    fn test_arity_lowercases_name() {
        assert_eq!(
            CommandError::arity("APPEND").to_string(),
            "ERR wrong number of arguments for 'append' command"
        );
    }

    #[test]
    fn test_other_errors_use_err_prefix() {
        for err in [
            CommandError::Syntax,
            CommandError::NotInteger,
            CommandError::InvalidExpireTime("set"),
            CommandError::InvalidBitOffset,
            CommandError::InvalidBit,
            CommandError::UnknownCommand("FOO".into()),
        ] {
            assert!(err.to_string().starts_with("ERR "), "{}", err);
        }
    }
}
