//! Reply Types
//!
//! The command core hands the transport layer one [`Reply`] per command.
//! Encoding replies onto the wire is the transport's job; this module only
//! defines what a reply can be.
//!
//! ## Example
//!
//! ```
//! use emberkv::protocol::Reply;
//!
//! let reply = Reply::integer(11);
//! assert_eq!(reply.to_string(), "(integer) 11");
//! ```

pub mod reply;

pub use reply::Reply;
