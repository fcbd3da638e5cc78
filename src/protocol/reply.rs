//! Command Reply Values
//!
//! Every command produces exactly one [`Reply`]. The transport layer owns the
//! wire encoding; this module only fixes the *kinds* of reply the core can
//! emit:
//!
//! - Status string (`OK`, `PONG`, type names)
//! - Error string (`ERR ...`, `WRONGTYPE ...`)
//! - Integer
//! - Bulk string (binary safe)
//! - Nil
//!
//! The [`fmt::Display`] impl renders replies the way `redis-cli` prints them,
//! which is what log lines and test failure messages use.

use bytes::Bytes;
use std::fmt;

/// A typed reply returned by the command dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Short, non-binary status text such as `OK`.
    Status(String),

    /// An error. The text starts with an error kind such as `ERR` or `WRONGTYPE`.
    Error(String),

    /// 64-bit signed integer.
    Integer(i64),

    /// Binary-safe string.
    Bulk(Bytes),

    /// Absent value.
    Nil,
}

impl Reply {
    /// Creates a status reply.
    pub fn status(s: impl Into<String>) -> Self {
        Reply::Status(s.into())
    }

    /// Creates an error reply.
    pub fn error(s: impl Into<String>) -> Self {
        Reply::Error(s.into())
    }

    pub fn integer(n: i64) -> Self {
        Reply::Integer(n)
    }

    /// Creates a bulk reply.
    ///
    /// # Example
    /// ```
    /// use emberkv::protocol::Reply;
    /// use bytes::Bytes;
    /// let bulk = Reply::bulk(Bytes::from("hello"));
    /// assert_eq!(bulk.as_bytes(), Some(&b"hello"[..]));
    /// ```
    pub fn bulk(data: impl Into<Bytes>) -> Self {
        Reply::Bulk(data.into())
    }

    pub fn nil() -> Self {
        Reply::Nil
    }

    /// Common reply for successful writes
    pub fn ok() -> Self {
        Reply::Status("OK".to_string())
    }

    pub fn pong() -> Self {
        Reply::Status("PONG".to_string())
    }

    /// Returns true if this reply is nil.
    pub fn is_nil(&self) -> bool {
        matches!(self, Reply::Nil)
    }

    /// Returns true if this reply is an error.
    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error(_))
    }

    /// Extracts the integer payload.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Reply::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Extracts the bulk payload.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Reply::Bulk(b) => Some(b),
            _ => None,
        }
    }

    /// Extracts status, error or UTF-8 bulk text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Reply::Status(s) | Reply::Error(s) => Some(s),
            Reply::Bulk(b) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Status(s) => write!(f, "{}", s),
            Reply::Error(s) => write!(f, "(error) {}", s),
            Reply::Integer(n) => write!(f, "(integer) {}", n),
            Reply::Bulk(data) => match std::str::from_utf8(data) {
                Ok(s) => write!(f, "\"{}\"", s),
                Err(_) => write!(f, "(binary data, {} bytes)", data.len()),
            },
            Reply::Nil => write!(f, "(nil)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Reply::ok().to_string(), "OK");
        assert_eq!(Reply::integer(-2).to_string(), "(integer) -2");
        assert_eq!(Reply::bulk(Bytes::from("hi")).to_string(), "\"hi\"");
        assert_eq!(Reply::nil().to_string(), "(nil)");
        assert_eq!(Reply::error("ERR boom").to_string(), "(error) ERR boom");
        assert_eq!(
            Reply::bulk(Bytes::from_static(&[0xff, 0xfe])).to_string(),
            "(binary data, 2 bytes)"
        );
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Reply::integer(7).as_integer(), Some(7));
        assert_eq!(Reply::ok().as_integer(), None);
        assert_eq!(Reply::pong().as_str(), Some("PONG"));
        assert!(Reply::nil().is_nil());
        assert!(Reply::error("ERR x").is_error());
        assert!(!Reply::ok().is_error());
    }
}
