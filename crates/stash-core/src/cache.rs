//! Read-through cache for the discoveries and notes lists.
//!
//! [`ListCache::load`] paints from the stored snapshot first, then refreshes
//! from the [`ListSource`] when online. A refresh commits only when both
//! lists were fetched; a failed refresh never blanks what is already shown.
//!
//! The snapshot lives under three fixed keys of the shared [`KvStore`]:
//!
//! | Key | Value |
//! |-----|-------|
//! | `stash-discoveries-cache` | JSON array of discoveries |
//! | `stash-notes-cache` | JSON array of notes |
//! | `stash-cache-timestamp` | fetch time, milliseconds since epoch |
//!
//! A snapshot exists only when all three keys are present and decode.
//!
//! # Local removals
//!
//! [`remove_discovery`](ListCache::remove_discovery) and
//! [`remove_note`](ListCache::remove_note) edit the in-memory lists and the
//! snapshot without calling the remote. They assume the caller has already
//! deleted or archived the record remotely; until the next refresh the cache
//! is a local projection that may disagree with the remote store.

use std::sync::{Arc, RwLock};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::connectivity::Connectivity;
use crate::models::{CachedListSnapshot, Discovery, Note};
use crate::remote::ListSource;
use crate::store::KvStore;

pub const DISCOVERIES_CACHE_KEY: &str = "stash-discoveries-cache";
pub const NOTES_CACHE_KEY: &str = "stash-notes-cache";
pub const CACHE_TIMESTAMP_KEY: &str = "stash-cache-timestamp";

/// What the cache currently shows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheView {
    pub discoveries: Vec<Discovery>,
    pub notes: Vec<Note>,
    pub is_offline: bool,
    /// Lists come from the snapshot, not from a fetch in this session.
    pub is_cached: bool,
    /// Time of the fetch the lists come from, if any.
    pub fetched_at: Option<DateTime<Utc>>,
}

pub struct ListCache {
    kv: Arc<dyn KvStore>,
    source: Arc<dyn ListSource>,
    connectivity: Arc<Connectivity>,
    state: RwLock<CacheView>,
}

impl ListCache {
    pub fn new(
        kv: Arc<dyn KvStore>,
        source: Arc<dyn ListSource>,
        connectivity: Arc<Connectivity>,
    ) -> Self {
        Self {
            kv,
            source,
            connectivity,
            state: RwLock::new(CacheView::default()),
        }
    }

    /// Current state, without I/O.
    pub fn view(&self) -> CacheView {
        match self.state.read() {
            Ok(state) => state.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn update<F: FnOnce(&mut CacheView)>(&self, f: F) {
        let mut state = match self.state.write() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut state);
    }

    /// Hydrate from the snapshot, then refresh from the remote when online.
    pub async fn load(&self) -> CacheView {
        if let Some(snapshot) = self.read_snapshot().await {
            debug!(
                discoveries = snapshot.discoveries.len(),
                notes = snapshot.notes.len(),
                "hydrated from snapshot"
            );
            self.update(|s| {
                s.discoveries = snapshot.discoveries;
                s.notes = snapshot.notes;
                s.fetched_at = Some(snapshot.timestamp);
                s.is_cached = true;
            });
        }

        if !self.connectivity.is_online() {
            self.update(|s| s.is_offline = true);
            return self.view();
        }
        self.update(|s| s.is_offline = false);

        let (discoveries, notes) = futures::join!(
            self.source.fetch_discoveries(),
            self.source.fetch_notes()
        );
        match (discoveries, notes) {
            (Ok(discoveries), Ok(notes)) => {
                let snapshot = CachedListSnapshot {
                    discoveries,
                    notes,
                    timestamp: Utc::now(),
                };
                info!(
                    discoveries = snapshot.discoveries.len(),
                    notes = snapshot.notes.len(),
                    "lists refreshed"
                );
                self.write_snapshot(&snapshot).await;
                self.update(|s| {
                    s.discoveries = snapshot.discoveries;
                    s.notes = snapshot.notes;
                    s.fetched_at = Some(snapshot.timestamp);
                    s.is_cached = false;
                });
            }
            (Err(e), _) | (_, Err(e)) => {
                warn!(error = %e, "list refresh failed, keeping current lists");
            }
        }
        self.view()
    }

    /// Flag the view offline without clearing anything.
    pub fn mark_offline(&self) {
        self.update(|s| s.is_offline = true);
    }

    /// Drop a discovery locally after it was deleted or archived remotely.
    pub async fn remove_discovery(&self, id: &str) {
        self.update(|s| s.discoveries.retain(|d| d.id != id));
        if let Some(mut snapshot) = self.read_snapshot().await {
            snapshot.discoveries.retain(|d| d.id != id);
            self.write_snapshot(&snapshot).await;
        }
    }

    /// Drop a note locally after it was deleted or archived remotely.
    pub async fn remove_note(&self, id: &str) {
        self.update(|s| s.notes.retain(|n| n.id != id));
        if let Some(mut snapshot) = self.read_snapshot().await {
            snapshot.notes.retain(|n| n.id != id);
            self.write_snapshot(&snapshot).await;
        }
    }

    /// The stored snapshot, if complete and readable.
    pub async fn read_snapshot(&self) -> Option<CachedListSnapshot> {
        match self.try_read_snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "failed to load list snapshot");
                None
            }
        }
    }

    async fn try_read_snapshot(&self) -> Result<Option<CachedListSnapshot>> {
        let (discoveries, notes, timestamp) = futures::try_join!(
            self.kv.get(DISCOVERIES_CACHE_KEY),
            self.kv.get(NOTES_CACHE_KEY),
            self.kv.get(CACHE_TIMESTAMP_KEY)
        )?;
        let (Some(discoveries), Some(notes), Some(timestamp)) = (discoveries, notes, timestamp)
        else {
            return Ok(None);
        };

        let millis: i64 = std::str::from_utf8(&timestamp)
            .context("snapshot timestamp is not UTF-8")?
            .trim()
            .parse()
            .context("snapshot timestamp is not a number")?;
        let timestamp = DateTime::<Utc>::from_timestamp_millis(millis)
            .context("snapshot timestamp out of range")?;

        Ok(Some(CachedListSnapshot {
            discoveries: serde_json::from_slice(&discoveries)
                .context("cached discoveries do not decode")?,
            notes: serde_json::from_slice(&notes).context("cached notes do not decode")?,
            timestamp,
        }))
    }

    async fn write_snapshot(&self, snapshot: &CachedListSnapshot) {
        if let Err(e) = self.try_write_snapshot(snapshot).await {
            warn!(error = %e, "failed to save list snapshot");
        }
    }

    async fn try_write_snapshot(&self, snapshot: &CachedListSnapshot) -> Result<()> {
        let discoveries = serde_json::to_vec(&snapshot.discoveries)?;
        let notes = serde_json::to_vec(&snapshot.notes)?;
        let timestamp = snapshot.timestamp.timestamp_millis().to_string().into_bytes();
        self.kv
            .set_many(&[
                (DISCOVERIES_CACHE_KEY, discoveries),
                (NOTES_CACHE_KEY, notes),
                (CACHE_TIMESTAMP_KEY, timestamp),
            ])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::InMemoryKvStore;
    use crate::testing::{discovery, note, FakeRemote};

    fn cache(
        remote: Arc<FakeRemote>,
        online: bool,
    ) -> (Arc<InMemoryKvStore>, Arc<Connectivity>, ListCache) {
        let kv = Arc::new(InMemoryKvStore::new());
        let connectivity = Arc::new(Connectivity::new(online));
        let cache = ListCache::new(kv.clone(), remote, connectivity.clone());
        (kv, connectivity, cache)
    }

    async fn seed(cache: &ListCache, discoveries: Vec<Discovery>, notes: Vec<Note>) {
        cache
            .write_snapshot(&CachedListSnapshot {
                discoveries,
                notes,
                timestamp: Utc::now(),
            })
            .await;
    }

    #[tokio::test]
    async fn test_offline_load_serves_snapshot() {
        let remote = Arc::new(FakeRemote::default());
        let (_, _, cache) = cache(remote.clone(), false);
        seed(&cache, vec![discovery("d1"), discovery("d2")], vec![note("n1")]).await;

        let view = cache.load().await;
        assert!(view.is_offline);
        assert!(view.is_cached);
        assert_eq!(view.discoveries, vec![discovery("d1"), discovery("d2")]);
        assert_eq!(view.notes, vec![note("n1")]);
        assert_eq!(remote.list_fetches(), 0);
    }

    #[tokio::test]
    async fn test_online_load_replaces_snapshot() {
        let remote = Arc::new(FakeRemote::default());
        remote.set_lists(vec![discovery("fresh")], vec![]);
        let (_, _, cache) = cache(remote.clone(), true);
        seed(&cache, vec![discovery("stale")], vec![note("n1")]).await;

        let view = cache.load().await;
        assert!(!view.is_cached);
        assert!(!view.is_offline);
        assert_eq!(view.discoveries, vec![discovery("fresh")]);
        assert!(view.notes.is_empty());

        let stored = cache.read_snapshot().await.unwrap();
        assert_eq!(stored.discoveries, vec![discovery("fresh")]);
        assert!(stored.notes.is_empty());
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_cached_lists() {
        let remote = Arc::new(FakeRemote::default());
        remote.fail_lists(true);
        let (_, _, cache) = cache(remote.clone(), true);
        seed(&cache, vec![discovery("d1")], vec![note("n1")]).await;

        let view = cache.load().await;
        assert!(view.is_cached);
        assert_eq!(view.discoveries, vec![discovery("d1")]);
        assert_eq!(view.notes, vec![note("n1")]);
        assert_eq!(
            cache.read_snapshot().await.unwrap().discoveries,
            vec![discovery("d1")]
        );
    }

    #[tokio::test]
    async fn test_failed_refresh_without_snapshot_is_empty() {
        let remote = Arc::new(FakeRemote::default());
        remote.fail_lists(true);
        let (kv, _, cache) = cache(remote, true);

        let view = cache.load().await;
        assert!(view.discoveries.is_empty() && view.notes.is_empty());
        assert!(!view.is_cached);
        assert!(kv.is_empty());
    }

    #[tokio::test]
    async fn test_partial_snapshot_is_ignored() {
        let remote = Arc::new(FakeRemote::default());
        let (kv, _, cache) = cache(remote, false);
        kv.set(DISCOVERIES_CACHE_KEY, b"[]").await.unwrap();
        kv.set(NOTES_CACHE_KEY, b"[]").await.unwrap();

        assert!(cache.read_snapshot().await.is_none());
        let view = cache.load().await;
        assert!(!view.is_cached);
        assert!(view.is_offline);
    }

    #[tokio::test]
    async fn test_remove_discovery_updates_memory_and_snapshot() {
        let remote = Arc::new(FakeRemote::default());
        let (_, _, cache) = cache(remote, false);
        seed(&cache, vec![discovery("d1"), discovery("d2")], vec![note("n1")]).await;
        cache.load().await;

        cache.remove_discovery("d1").await;

        let view = cache.view();
        assert_eq!(view.discoveries, vec![discovery("d2")]);
        assert_eq!(view.notes, vec![note("n1")]);
        let stored = cache.read_snapshot().await.unwrap();
        assert_eq!(stored.discoveries, vec![discovery("d2")]);
        assert_eq!(stored.notes, vec![note("n1")]);
    }

    #[tokio::test]
    async fn test_remove_note_without_snapshot_writes_nothing() {
        let remote = Arc::new(FakeRemote::default());
        let (kv, _, cache) = cache(remote, true);
        cache.remove_note("n1").await;
        assert!(kv.is_empty());
    }

    #[tokio::test]
    async fn test_mark_offline_keeps_lists() {
        let remote = Arc::new(FakeRemote::default());
        remote.set_lists(vec![discovery("d1")], vec![note("n1")]);
        let (_, connectivity, cache) = cache(remote, true);
        cache.load().await;

        connectivity.set(false);
        cache.mark_offline();
        let view = cache.view();
        assert!(view.is_offline);
        assert_eq!(view.discoveries.len(), 1);
        assert_eq!(view.notes.len(), 1);
    }
}
