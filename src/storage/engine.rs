//! Thread-Safe Keyspace with Lazy Expiry
//!
//! This module implements the keyspace for EmberKV: a sharded, concurrent map
//! from key to [`Entry`], where every entry carries a typed [`Value`] and an
//! optional absolute expiry.
//!
//! ## Design Decisions
//!
//! 1. **Sharded Locks**: Keys are hashed onto independent shards. Operations
//!    on keys in different shards never contend.
//! 2. **Single Mutation Path**: Every write goes through [`StorageEngine::upsert`],
//!    which holds the shard's write lock for one key's read-modify-write.
//! 3. **Expiry as a Prefix**: Each access checks `expires_at` before exposing
//!    the entry. Expired entries are reported absent and purged in the same
//!    critical section (writes) or in an immediate re-checked follow-up (reads).
//!
//! ## Concurrency Model
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     StorageEngine                           │
//! │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐           │
//! │  │ Shard 0 │ │ Shard 1 │ │ Shard 2 │ │ Shard N │           │
//! │  │ RwLock  │ │ RwLock  │ │ RwLock  │ │ RwLock  │           │
//! │  │ HashMap │ │ HashMap │ │ HashMap │ │ HashMap │           │
//! │  └─────────┘ └─────────┘ └─────────┘ └─────────┘           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Two APPENDs to the same key serialize on that key's shard lock, so the
//! final value always contains both suffixes in some order.

use crate::storage::value::{Value, ValueKind};
use bytes::Bytes;
use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};

/// Default number of shards.
pub const DEFAULT_SHARDS: usize = 64;

/// A key's binding: its value plus an optional absolute expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// The stored value
    pub value: Value,
    /// When this entry expires (None = never expires)
    pub expires_at: Option<Instant>,
}

impl Entry {
    /// Creates a new entry without expiry.
    pub fn new(value: Value) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    /// Variant tag of the stored value.
    #[inline]
    pub fn kind(&self) -> ValueKind {
        self.value.kind()
    }

    /// Checks if this entry has expired.
    #[inline]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    #[inline]
    fn is_expired_at(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|exp| now >= exp)
    }

    /// Time left before expiry, or None if the entry never expires.
    pub fn remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|exp| exp.saturating_duration_since(Instant::now()))
    }
}

/// Result of a TTL query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// Key is absent or already expired.
    Absent,
    /// Key exists and never expires.
    NoExpiry,
    /// Key expires after this much time.
    Remaining(Duration),
}

impl Ttl {
    /// Whole seconds, rounded up, with the `-2`/`-1` sentinels.
    pub fn as_secs(self) -> i64 {
        match self {
            Ttl::Absent => -2,
            Ttl::NoExpiry => -1,
            Ttl::Remaining(d) => {
                let secs = d.as_secs().saturating_add(u64::from(d.subsec_nanos() > 0));
                i64::try_from(secs).unwrap_or(i64::MAX)
            }
        }
    }

    /// Whole milliseconds, rounded up, with the `-2`/`-1` sentinels.
    pub fn as_millis(self) -> i64 {
        match self {
            Ttl::Absent => -2,
            Ttl::NoExpiry => -1,
            Ttl::Remaining(d) => {
                let ms = d.as_millis() + u128::from(d.subsec_nanos() % 1_000_000 > 0);
                i64::try_from(ms).unwrap_or(i64::MAX)
            }
        }
    }
}

/// A single shard containing a portion of the keyspace.
#[derive(Debug, Default)]
struct Shard {
    data: RwLock<HashMap<Bytes, Entry>>,
}

impl Shard {
    // A panic inside one command must not wedge the shard for every other
    // key on it, so poisoned locks are recovered.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<Bytes, Entry>> {
        self.data.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Bytes, Entry>> {
        self.data.write().unwrap_or_else(|e| e.into_inner())
    }
}

/// A key's slot taken out of its shard for the duration of an upsert.
///
/// Dropping the guard stores the slot back and settles the key count, on
/// both the normal and the unwinding path.
struct SlotGuard<'a> {
    engine: &'a StorageEngine,
    data: RwLockWriteGuard<'a, HashMap<Bytes, Entry>>,
    key: Bytes,
    slot: Option<Entry>,
    existed: bool,
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        let key = std::mem::take(&mut self.key);
        match (self.existed, self.slot.take()) {
            (existed, Some(entry)) => {
                if !existed {
                    self.engine.key_count.fetch_add(1, Ordering::Relaxed);
                }
                self.data.insert(key, entry);
            }
            (true, None) => {
                self.engine.key_count.fetch_sub(1, Ordering::Relaxed);
            }
            (false, None) => {}
        }
    }
}

/// The keyspace shared by every connection.
///
/// This struct is designed to be wrapped in an `Arc` and shared across all
/// command handlers. All operations are thread-safe.
///
/// # Example
///
/// ```
/// use emberkv::storage::{StorageEngine, Value};
/// use bytes::Bytes;
///
/// let engine = StorageEngine::new();
/// let key = Bytes::from("greeting");
///
/// let len = engine.upsert(&key, |slot| {
///     let entry = slot.get_or_insert_with(|| emberkv::storage::Entry::new(Value::string("")));
///     let buf = entry.value.as_string_mut().unwrap();
///     buf.extend_from_slice(b"hello");
///     buf.len()
/// });
/// assert_eq!(len, 5);
/// assert!(engine.exists(&key));
/// ```
pub struct StorageEngine {
    /// Sharded storage; length is always a power of two
    shards: Vec<Shard>,

    /// Statistics: live key count (approximate, includes not-yet-purged expired keys)
    key_count: AtomicU64,

    /// Statistics: read accesses
    read_count: AtomicU64,

    /// Statistics: write accesses
    write_count: AtomicU64,

    /// Statistics: explicit deletions
    del_count: AtomicU64,

    /// Statistics: entries purged because they expired
    expired_count: AtomicU64,
}

impl std::fmt::Debug for StorageEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageEngine")
            .field("shards", &self.shards.len())
            .field("key_count", &self.key_count.load(Ordering::Relaxed))
            .field("read_count", &self.read_count.load(Ordering::Relaxed))
            .field("write_count", &self.write_count.load(Ordering::Relaxed))
            .finish()
    }
}

impl Default for StorageEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageEngine {
    /// Creates a storage engine with [`DEFAULT_SHARDS`] shards.
    pub fn new() -> Self {
        Self::with_shards(DEFAULT_SHARDS)
    }

    /// Creates a storage engine with `num_shards` shards.
    ///
    /// The count is rounded up to the next power of two (minimum 1).
    pub fn with_shards(num_shards: usize) -> Self {
        let num_shards = num_shards.max(1).next_power_of_two();
        let shards = (0..num_shards).map(|_| Shard::default()).collect();

        info!(shards = num_shards, "Storage engine initialized");

        Self {
            shards,
            key_count: AtomicU64::new(0),
            read_count: AtomicU64::new(0),
            write_count: AtomicU64::new(0),
            del_count: AtomicU64::new(0),
            expired_count: AtomicU64::new(0),
        }
    }

    /// Number of shards.
    pub fn num_shards(&self) -> usize {
        self.shards.len()
    }

    /// Determines which shard a key belongs to.
    #[inline]
    fn shard_index(&self, key: &[u8]) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() as usize) & (self.shards.len() - 1)
    }

    #[inline]
    fn shard(&self, key: &[u8]) -> &Shard {
        &self.shards[self.shard_index(key)]
    }

    fn record_expired(&self, n: u64) {
        self.key_count.fetch_sub(n, Ordering::Relaxed);
        self.expired_count.fetch_add(n, Ordering::Relaxed);
    }

    /// Runs `f` against the key's live entry under a shared lock.
    ///
    /// An expired entry is passed as `None` and purged right after the read
    /// lock is released. The purge re-checks expiry under the write lock, so
    /// a concurrent writer that replaced the entry is never clobbered.
    pub fn view<R>(&self, key: &[u8], f: impl FnOnce(Option<&Entry>) -> R) -> R {
        self.read_count.fetch_add(1, Ordering::Relaxed);
        let shard = self.shard(key);

        let (result, stale) = {
            let data = shard.read();
            match data.get(key) {
                Some(entry) if entry.is_expired() => (f(None), true),
                other => (f(other), false),
            }
        };

        if stale {
            self.purge_if_expired(key);
        }
        result
    }

    /// Removes the key if (and only if) it is still expired.
    fn purge_if_expired(&self, key: &[u8]) {
        let mut data = self.shard(key).write();
        if data.get(key).is_some_and(Entry::is_expired) {
            data.remove(key);
            self.record_expired(1);
            trace!(key_len = key.len(), "Lazily purged expired key");
        }
    }

    /// Exclusive read-modify-write of one key's slot.
    ///
    /// The slot is `None` when the key is absent or expired. Whatever `f`
    /// leaves in the slot is stored; leaving `None` deletes the key. The
    /// shard's write lock is held for the whole call, so no other command
    /// can observe or modify the key in between.
    ///
    /// If `f` panics, the slot is still written back as `f` left it.
    pub fn upsert<R>(&self, key: &Bytes, f: impl FnOnce(&mut Option<Entry>) -> R) -> R {
        self.write_count.fetch_add(1, Ordering::Relaxed);
        let mut data = self.shard(key).write();

        let (owned_key, slot) = match data.remove_entry(key.as_ref()) {
            Some((k, entry)) if entry.is_expired() => {
                self.record_expired(1);
                trace!(key_len = key.len(), "Expired key found on write");
                (k, None)
            }
            Some((k, entry)) => (k, Some(entry)),
            None => (key.clone(), None),
        };

        let mut guard = SlotGuard {
            engine: self,
            data,
            key: owned_key,
            existed: slot.is_some(),
            slot,
        };
        f(&mut guard.slot)
    }

    /// Replaces whatever the key holds with `value`.
    pub fn set(&self, key: &Bytes, value: Value, expires_at: Option<Instant>) {
        self.upsert(key, |slot| *slot = Some(Entry { value, expires_at }));
    }

    /// Deletes a key.
    ///
    /// Returns `true` if a live key was deleted. An expired key is purged but
    /// does not count as deleted.
    pub fn remove(&self, key: &[u8]) -> bool {
        self.del_count.fetch_add(1, Ordering::Relaxed);
        let mut data = self.shard(key).write();

        match data.remove(key) {
            Some(entry) if entry.is_expired() => {
                self.record_expired(1);
                false
            }
            Some(_) => {
                self.key_count.fetch_sub(1, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    /// Deletes several keys, each under its own shard lock.
    ///
    /// Returns the number of keys actually deleted.
    pub fn remove_many(&self, keys: &[Bytes]) -> u64 {
        keys.iter().filter(|k| self.remove(k)).count() as u64
    }

    /// Checks if a key exists (and is not expired).
    pub fn exists(&self, key: &[u8]) -> bool {
        self.view(key, |entry| entry.is_some())
    }

    /// Variant of the key's live value, if any.
    pub fn kind_of(&self, key: &[u8]) -> Option<ValueKind> {
        self.view(key, |entry| entry.map(Entry::kind))
    }

    /// Remaining time-to-live of a key.
    pub fn ttl(&self, key: &[u8]) -> Ttl {
        self.view(key, |entry| match entry {
            None => Ttl::Absent,
            Some(e) => e.remaining().map(Ttl::Remaining).unwrap_or(Ttl::NoExpiry),
        })
    }

    /// Sets an absolute expiry on an existing key.
    ///
    /// Returns `false` if the key doesn't exist.
    pub fn expire_at(&self, key: &Bytes, at: Instant) -> bool {
        self.upsert(key, |slot| match slot {
            Some(entry) => {
                entry.expires_at = Some(at);
                true
            }
            None => false,
        })
    }

    /// Removes the expiry from a key.
    ///
    /// Returns `true` only if the key existed and had an expiry.
    pub fn persist(&self, key: &Bytes) -> bool {
        self.upsert(key, |slot| match slot {
            Some(entry) => entry.expires_at.take().is_some(),
            None => false,
        })
    }

    /// Clears the whole keyspace.
    pub fn flush(&self) {
        for shard in &self.shards {
            let mut data = shard.write();
            let removed = data.len() as u64;
            data.clear();
            self.key_count.fetch_sub(removed, Ordering::Relaxed);
        }
        debug!("Keyspace flushed");
    }

    /// Returns the approximate number of keys.
    ///
    /// Expired keys count until they are purged.
    pub fn len(&self) -> u64 {
        self.key_count.load(Ordering::Relaxed)
    }

    /// Returns true if the keyspace is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns engine statistics.
    pub fn stats(&self) -> StorageStats {
        StorageStats {
            keys: self.key_count.load(Ordering::Relaxed),
            reads: self.read_count.load(Ordering::Relaxed),
            writes: self.write_count.load(Ordering::Relaxed),
            deletes: self.del_count.load(Ordering::Relaxed),
            expired: self.expired_count.load(Ordering::Relaxed),
        }
    }

    /// Purges every expired entry, one shard at a time.
    ///
    /// Each shard is swept under its write lock, the same lock every command
    /// on those keys takes. Returns the number of entries removed.
    pub fn cleanup_expired(&self) -> u64 {
        let mut cleaned = 0u64;
        let now = Instant::now();

        for shard in &self.shards {
            let mut data = shard.write();
            let before = data.len();
            data.retain(|_, entry| !entry.is_expired_at(now));
            cleaned += (before - data.len()) as u64;
        }

        if cleaned > 0 {
            self.record_expired(cleaned);
        }

        cleaned
    }
}

/// Engine statistics snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorageStats {
    pub keys: u64,
    pub reads: u64,
    pub writes: u64,
    pub deletes: u64,
    pub expired: u64,
}
