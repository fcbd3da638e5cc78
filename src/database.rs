//! Database Lifecycle
//!
//! A [`Database`] owns one keyspace and, when active expiry is on, the
//! background sweeper that reclaims its expired keys. Every connection gets
//! its own [`CommandHandler`] onto the same keyspace.
//!
//! ## Example
//!
//! ```
//! use emberkv::{Config, Database};
//!
//! let db = Database::open(Config::new().active_expiry(false)).unwrap();
//! let handler = db.handler();
//!
//! let reply = handler.execute_parts(&["APPEND", "greeting", "hello"]);
//! assert_eq!(reply.as_integer(), Some(5));
//! ```

use crate::commands::CommandHandler;
use crate::config::{Config, ConfigError};
use crate::storage::{ExpirySweeper, StorageEngine};
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{info, warn};

/// An open keyspace plus its background tasks.
#[derive(Debug)]
pub struct Database {
    storage: Arc<StorageEngine>,
    sweeper: Option<ExpirySweeper>,
}

impl Database {
    /// Opens a database with the given configuration.
    ///
    /// The background sweeper needs a Tokio runtime. When `active_expiry` is
    /// on but no runtime is running, the database still opens and relies on
    /// lazy expiry alone.
    pub fn open(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;

        let storage = Arc::new(StorageEngine::with_shards(config.num_shards));

        let sweeper = match (config.active_expiry, Handle::try_current()) {
            (true, Ok(_)) => Some(ExpirySweeper::start(Arc::clone(&storage), config.expiry)),
            (true, Err(_)) => {
                warn!("No Tokio runtime available, active expiry disabled");
                None
            }
            (false, _) => None,
        };

        info!(
            shards = storage.num_shards(),
            active_expiry = sweeper.is_some(),
            "Database opened"
        );

        Ok(Self { storage, sweeper })
    }

    /// A new command handler onto this database's keyspace.
    pub fn handler(&self) -> CommandHandler {
        CommandHandler::new(Arc::clone(&self.storage))
    }

    /// The underlying storage engine.
    pub fn storage(&self) -> &Arc<StorageEngine> {
        &self.storage
    }

    /// Whether the background sweeper is running.
    pub fn has_sweeper(&self) -> bool {
        self.sweeper.is_some()
    }

    /// Stops background tasks. Handlers already handed out keep working.
    pub fn shutdown(mut self) {
        // Dropping the sweeper stops it
        self.sweeper.take();
        info!(keys = self.storage.len(), "Database shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Reply;
    use std::time::Duration;

    #[test]
    fn test_open_rejects_invalid_config() {
        let err = Database::open(Config::new().num_shards(5)).unwrap_err();
        assert_eq!(err, ConfigError::InvalidShardCount(5));
    }

    #[test]
    fn test_open_without_runtime() {
        let db = Database::open(Config::default()).unwrap();
        assert!(!db.has_sweeper());
        assert_eq!(db.storage().num_shards(), 64);
    }

    #[test]
    fn test_handlers_share_keyspace() {
        let db = Database::open(Config::new().num_shards(4).active_expiry(false)).unwrap();
        let a = db.handler();
        let b = db.handler();

        a.execute_parts(&["APPEND", "k", "base "]);
        assert_eq!(b.execute_parts(&["APPEND", "k", "more"]), Reply::integer(9));
        assert_eq!(
            a.execute_parts(&["GET", "k"]),
            Reply::bulk(bytes::Bytes::from("base more"))
        );
    }

    #[tokio::test]
    async fn test_open_with_sweeper() {
        let config = Config::new().sweep_interval(Duration::from_millis(10));
        let db = Database::open(config).unwrap();
        assert!(db.has_sweeper());

        let handler = db.handler();
        handler.execute_parts(&["SET", "temp", "v", "PX", "20"]);
        handler.execute_parts(&["SET", "keep", "v"]);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(db.storage().len(), 1);

        db.shutdown();
        assert_eq!(handler.execute_parts(&["GET", "keep"]), Reply::bulk(bytes::Bytes::from("v")));
    }
}
