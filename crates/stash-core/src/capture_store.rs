//! Local capture store: durable storage of [`PendingCapture`] records.
//!
//! Each capture is one JSON document under `pending-capture-<id>` in the
//! injected [`KvStore`]. The payload is base64-encoded next to its SHA-256
//! digest; a record that fails to decode or whose digest does not match is
//! treated as corrupted and skipped.
//!
//! No operation here returns an error. Storage failures are logged and
//! reported as an absent or empty result so callers never crash on a broken
//! local store.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::models::{CaptureKind, CaptureStatus, PendingCapture};
use crate::store::KvStore;

/// Key prefix for pending-capture records.
pub const CAPTURE_KEY_PREFIX: &str = "pending-capture-";

/// On-disk shape of a capture record.
#[derive(Serialize, Deserialize)]
struct StoredCapture {
    id: String,
    kind: CaptureKind,
    payload: String,
    payload_sha256: String,
    #[serde(default)]
    selected_category: Option<String>,
    created_at: DateTime<Utc>,
    status: CaptureStatus,
}

fn capture_key(id: &str) -> String {
    format!("{}{}", CAPTURE_KEY_PREFIX, id)
}

fn payload_digest(payload: &[u8]) -> String {
    hex::encode(Sha256::digest(payload))
}

fn encode_capture(capture: &PendingCapture) -> Result<Vec<u8>> {
    let stored = StoredCapture {
        id: capture.id.clone(),
        kind: capture.kind,
        payload: BASE64.encode(&capture.payload),
        payload_sha256: payload_digest(&capture.payload),
        selected_category: capture.selected_category.clone(),
        created_at: capture.created_at,
        status: capture.status,
    };
    Ok(serde_json::to_vec(&stored)?)
}

fn decode_capture(bytes: &[u8]) -> Result<PendingCapture> {
    let stored: StoredCapture =
        serde_json::from_slice(bytes).context("capture record is not valid JSON")?;
    let payload = BASE64
        .decode(stored.payload.as_bytes())
        .context("capture payload is not valid base64")?;
    if payload_digest(&payload) != stored.payload_sha256 {
        bail!("capture {} payload digest mismatch", stored.id);
    }
    Ok(PendingCapture {
        id: stored.id,
        kind: stored.kind,
        payload,
        selected_category: stored.selected_category,
        created_at: stored.created_at,
        status: stored.status,
    })
}

/// Persistence of pending captures over a [`KvStore`].
#[derive(Clone)]
pub struct CaptureStore {
    kv: Arc<dyn KvStore>,
}

impl CaptureStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    /// Insert or overwrite a capture by id. Returns `false` if the write failed.
    pub async fn save(&self, capture: &PendingCapture) -> bool {
        let result = match encode_capture(capture) {
            Ok(bytes) => self.kv.set(&capture_key(&capture.id), &bytes).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => {
                debug!(id = %capture.id, status = %capture.status, "saved capture");
                true
            }
            Err(e) => {
                warn!(id = %capture.id, error = %e, "failed to save capture");
                false
            }
        }
    }

    /// Fetch one capture. Missing, unreadable, and corrupted records are all `None`.
    pub async fn get(&self, id: &str) -> Option<PendingCapture> {
        match self.kv.get(&capture_key(id)).await {
            Ok(Some(bytes)) => match decode_capture(&bytes) {
                Ok(capture) => Some(capture),
                Err(e) => {
                    warn!(id, error = %e, "skipping corrupted capture record");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(id, error = %e, "failed to read capture");
                None
            }
        }
    }

    /// Remove a capture. Removing an absent id is a successful no-op.
    pub async fn delete(&self, id: &str) -> bool {
        match self.kv.delete(&capture_key(id)).await {
            Ok(()) => true,
            Err(e) => {
                warn!(id, error = %e, "failed to delete capture");
                false
            }
        }
    }

    /// All readable captures, newest first. Empty on storage failure.
    pub async fn list_all(&self) -> Vec<PendingCapture> {
        match self.try_list_all().await {
            Ok(captures) => captures,
            Err(e) => {
                warn!(error = %e, "failed to list captures");
                Vec::new()
            }
        }
    }

    async fn try_list_all(&self) -> Result<Vec<PendingCapture>> {
        let keys = self.kv.keys(CAPTURE_KEY_PREFIX).await?;
        let mut captures = Vec::with_capacity(keys.len());
        for key in keys {
            // A key can vanish between listing and reading.
            let Some(bytes) = self.kv.get(&key).await? else {
                continue;
            };
            match decode_capture(&bytes) {
                Ok(capture) => captures.push(capture),
                Err(e) => warn!(key = %key, error = %e, "skipping corrupted capture record"),
            }
        }
        captures.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(captures)
    }

    /// Number of readable captures, matching `list_all().len()`.
    ///
    /// Corrupted records are not counted. Zero on storage failure.
    pub async fn count(&self) -> usize {
        self.list_all().await.len()
    }

    /// Set the status of an existing capture.
    ///
    /// Returns `false` when the capture does not exist or the write failed.
    pub async fn update_status(&self, id: &str, status: CaptureStatus) -> bool {
        match self.get(id).await {
            Some(mut capture) => {
                capture.status = status;
                self.save(&capture).await
            }
            None => false,
        }
    }
}
