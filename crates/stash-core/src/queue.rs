//! Offline capture queue.
//!
//! Bridges connectivity to the [`CaptureStore`] and drives sync attempts.
//!
//! # Capture lifecycle
//!
//! ```text
//!   add ──▶ pending ──▶ processing ──┬──▶ (deleted)   remote acknowledged
//!             ▲                      └──▶ failed      any remote failure
//!             └────────── retry ───────────┘
//! ```
//!
//! A sweep ([`OfflineQueue::sync_all`]) visits a snapshot of the `pending`
//! captures once, oldest first, one at a time. A failure only affects that
//! capture; the sweep carries on. Failed captures keep their payload and
//! wait for an explicit [`retry`](OfflineQueue::retry).
//!
//! A record still in `processing` when a sweep starts was abandoned by an
//! earlier sweep (cancelled future, killed process) and is swept again as
//! `pending`. A capture the remote accepted but that could not be removed
//! locally is counted as failed and parked as `failed`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::capture_store::CaptureStore;
use crate::connectivity::Connectivity;
use crate::models::{CaptureKind, CaptureStatus, DiscoveryType, PendingCapture};
use crate::remote::{RemoteResult, RemoteSync};

/// Outcome counts of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub attempted: usize,
    pub synced: usize,
    pub failed: usize,
}

/// Queue of captures waiting for the remote.
pub struct OfflineQueue {
    store: CaptureStore,
    remote: Arc<dyn RemoteSync>,
    connectivity: Arc<Connectivity>,
    syncing: AtomicBool,
}

/// Clears the sweep flag when the sweep ends, however it ends.
struct SweepGuard<'a>(&'a AtomicBool);

impl Drop for SweepGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl OfflineQueue {
    pub fn new(
        store: CaptureStore,
        remote: Arc<dyn RemoteSync>,
        connectivity: Arc<Connectivity>,
    ) -> Self {
        Self {
            store,
            remote,
            connectivity,
            syncing: AtomicBool::new(false),
        }
    }

    pub fn is_online(&self) -> bool {
        self.connectivity.is_online()
    }

    pub fn is_syncing(&self) -> bool {
        self.syncing.load(Ordering::SeqCst)
    }

    /// Persist a new `pending` capture and return its id.
    ///
    /// Does not touch the network; the capture is picked up by the next
    /// sweep. A storage failure is logged and the id is still returned.
    pub async fn add(
        &self,
        kind: CaptureKind,
        payload: Vec<u8>,
        selected_category: Option<String>,
    ) -> String {
        let capture = PendingCapture::new(kind, payload, selected_category);
        if self.store.save(&capture).await {
            info!(id = %capture.id, kind = %kind, "queued capture");
        }
        capture.id
    }

    /// Delete a capture regardless of its status.
    pub async fn remove(&self, id: &str) -> bool {
        self.store.delete(id).await
    }

    /// Reset a capture to `pending` for the next sweep. No-op for unknown ids.
    pub async fn retry(&self, id: &str) -> bool {
        let reset = self.store.update_status(id, CaptureStatus::Pending).await;
        if reset {
            info!(id, "capture reset to pending");
        }
        reset
    }

    /// All stored captures, newest first.
    pub async fn pending(&self) -> Vec<PendingCapture> {
        self.store.list_all().await
    }

    pub async fn pending_count(&self) -> usize {
        self.store.count().await
    }

    /// Sync every `pending` capture, serially and oldest first.
    ///
    /// Returns immediately with an empty report when offline or when
    /// another sweep is already running.
    pub async fn sync_all(&self) -> SyncReport {
        if !self.is_online() {
            debug!("offline, skipping sync");
            return SyncReport::default();
        }
        if self
            .syncing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("sync already running");
            return SyncReport::default();
        }
        let _guard = SweepGuard(&self.syncing);

        let mut batch = Vec::new();
        for mut capture in self.store.list_all().await {
            match capture.status {
                CaptureStatus::Pending => batch.push(capture),
                // Only a sweep marks `processing` and none is running, so the
                // record belongs to a sweep that was cancelled or crashed.
                CaptureStatus::Processing => {
                    warn!(id = %capture.id, "recovering capture left in processing");
                    if self
                        .store
                        .update_status(&capture.id, CaptureStatus::Pending)
                        .await
                    {
                        capture.status = CaptureStatus::Pending;
                        batch.push(capture);
                    }
                }
                CaptureStatus::Failed => {}
            }
        }
        batch.reverse();

        let mut report = SyncReport::default();
        for capture in &batch {
            report.attempted += 1;
            if self.sync_capture(capture).await {
                report.synced += 1;
            } else {
                report.failed += 1;
            }
        }

        if report.attempted > 0 {
            info!(
                attempted = report.attempted,
                synced = report.synced,
                failed = report.failed,
                "sync pass finished"
            );
        }
        report
    }

    async fn sync_capture(&self, capture: &PendingCapture) -> bool {
        self.store
            .update_status(&capture.id, CaptureStatus::Processing)
            .await;

        match self.submit(capture).await {
            Ok(()) if self.store.delete(&capture.id).await => {
                info!(id = %capture.id, kind = %capture.kind, "capture synced");
                true
            }
            Ok(()) => {
                // Accepted remotely but still stored locally. Only an
                // explicit retry may resubmit it.
                warn!(id = %capture.id, "capture synced but local record could not be removed");
                self.store
                    .update_status(&capture.id, CaptureStatus::Failed)
                    .await;
                false
            }
            Err(e) => {
                warn!(id = %capture.id, kind = %capture.kind, error = %e, "capture sync failed");
                self.store
                    .update_status(&capture.id, CaptureStatus::Failed)
                    .await;
                false
            }
        }
    }

    async fn submit(&self, capture: &PendingCapture) -> RemoteResult<()> {
        match capture.kind {
            CaptureKind::Image => {
                let category = capture
                    .selected_category
                    .as_deref()
                    .unwrap_or(DiscoveryType::Other.as_str());
                let found = self.remote.analyze_image(&capture.payload, category).await?;
                debug!(id = %capture.id, discoveries = found.len(), "image analyzed");
            }
            CaptureKind::Voice => {
                let text = self.remote.transcribe_audio(&capture.payload).await?;
                let note = self.remote.create_note(&text).await?;
                debug!(id = %capture.id, note = %note.id, "note created");
            }
        }
        Ok(())
    }
}
