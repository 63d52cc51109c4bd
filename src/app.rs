//! Composition root.
//!
//! [`Stash`] owns the single shared store, remote client, and connectivity
//! flag, and builds the queue and cache on top of them. Nothing in the crate
//! reaches for a global; every component receives its collaborators here.
//!
//! Connectivity transitions are dispatched from one place,
//! [`Stash::set_online`]:
//!
//! | Transition | Effect |
//! |------------|--------|
//! | offline → online | queue sweep, then cache refresh |
//! | online → offline | cache flagged offline, lists kept |

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::watch;
use tracing::info;

use stash_core::cache::ListCache;
use stash_core::capture_store::CaptureStore;
use stash_core::connectivity::{Connectivity, Transition};
use stash_core::queue::{OfflineQueue, SyncReport};
use stash_core::remote::{ListSource, RemoteSync};
use stash_core::store::KvStore;

use crate::config::Config;
use crate::db;
use crate::http_remote::HttpRemote;
use crate::sqlite_store::SqliteKvStore;

pub struct Stash {
    pub queue: OfflineQueue,
    pub cache: ListCache,
    connectivity: Arc<Connectivity>,
}

impl Stash {
    /// Wire the queue and cache to explicit collaborators.
    pub fn new(
        kv: Arc<dyn KvStore>,
        remote: Arc<dyn RemoteSync>,
        lists: Arc<dyn ListSource>,
        online: bool,
    ) -> Self {
        let connectivity = Arc::new(Connectivity::new(online));
        let queue = OfflineQueue::new(CaptureStore::new(kv.clone()), remote, connectivity.clone());
        let cache = ListCache::new(kv, lists, connectivity.clone());
        Self {
            queue,
            cache,
            connectivity,
        }
    }

    pub fn is_online(&self) -> bool {
        self.connectivity.is_online()
    }

    /// Record the connectivity state and react to a transition.
    ///
    /// Returns the sweep report when coming online.
    pub async fn set_online(&self, online: bool) -> Option<SyncReport> {
        match self.connectivity.set(online) {
            Transition::CameOnline => {
                info!("back online");
                let report = self.queue.sync_all().await;
                self.cache.load().await;
                Some(report)
            }
            Transition::WentOffline => {
                info!("gone offline");
                self.cache.mark_offline();
                None
            }
            Transition::Unchanged => None,
        }
    }

    /// Feed connectivity changes from a watch channel until the sender is dropped.
    pub async fn follow(&self, mut rx: watch::Receiver<bool>) {
        loop {
            let online = *rx.borrow_and_update();
            self.set_online(online).await;
            if rx.changed().await.is_err() {
                break;
            }
        }
    }
}

/// Everything a CLI command needs: the composed core plus the concrete
/// HTTP client for item actions and probing.
pub struct AppContext {
    pub stash: Stash,
    pub remote: Arc<HttpRemote>,
    pub store: Arc<SqliteKvStore>,
}

impl AppContext {
    /// Connect to the database and probe the remote once to seed the
    /// connectivity flag.
    pub async fn open(config: &Config) -> Result<Self> {
        Self::connect(config, true).await
    }

    /// Connect to the database only. The context starts offline, so nothing
    /// it does waits on the network.
    pub async fn open_local(config: &Config) -> Result<Self> {
        Self::connect(config, false).await
    }

    async fn connect(config: &Config, probe: bool) -> Result<Self> {
        let pool = db::connect(config).await?;
        crate::migrate::migrate_pool(&pool).await?;
        let store = Arc::new(SqliteKvStore::new(pool));
        let remote = Arc::new(
            HttpRemote::new(&config.remote)?
                .with_probe_timeout(Duration::from_secs(config.connectivity.probe_timeout_secs)),
        );
        let online = if probe {
            let online = remote.probe().await;
            info!(online, base_url = %config.remote.base_url, "connectivity probed");
            online
        } else {
            false
        };

        let stash = Stash::new(store.clone(), remote.clone(), remote.clone(), online);
        Ok(Self {
            stash,
            remote,
            store,
        })
    }

    pub async fn close(self) {
        self.store.pool().close().await;
    }
}
