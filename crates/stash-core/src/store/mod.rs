//! Key-value storage abstraction for Stash.
//!
//! The [`KvStore`] trait is the only persistence surface the core needs:
//! pending captures and the list snapshot are opaque byte values under
//! string keys. Backends are pluggable (SQLite in the `stash` app crate,
//! in-memory here for tests and embedding).
//!
//! Implementations must be `Send + Sync` to work with async runtimes.
//!
//! # Concurrency
//!
//! Backends are treated as atomic per key. No cross-key lock is taken, so
//! two writers sharing one keyspace follow last-writer-wins.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

/// Abstract key-value backend.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`get`](KvStore::get) | Read one value |
/// | [`set`](KvStore::set) | Insert or overwrite one value |
/// | [`set_many`](KvStore::set_many) | Write several values, atomically where supported |
/// | [`delete`](KvStore::delete) | Remove one key (no-op if absent) |
/// | [`keys`](KvStore::keys) | List keys starting with a prefix |
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Read the value stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Insert or overwrite the value under `key`.
    async fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Write several entries.
    ///
    /// The default writes them one by one; backends with transactions
    /// override this so readers never observe a partial write.
    async fn set_many(&self, entries: &[(&str, Vec<u8>)]) -> Result<()> {
        for (key, value) in entries {
            self.set(key, value).await?;
        }
        Ok(())
    }

    /// Remove `key`. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// List all keys starting with `prefix`, in unspecified order.
    async fn keys(&self, prefix: &str) -> Result<Vec<String>>;
}
