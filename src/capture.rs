//! `stash capture`: enqueue an image or voice file.
//!
//! The capture is persisted first and synced afterwards, so a capture taken
//! while the remote is unreachable is never lost.

use anyhow::{Context, Result};
use std::path::Path;

use stash_core::models::{CaptureKind, DiscoveryType};

use crate::app::AppContext;
use crate::config::Config;

pub async fn run_capture(
    config: &Config,
    kind: CaptureKind,
    path: &Path,
    category: Option<DiscoveryType>,
) -> Result<()> {
    let payload = std::fs::read(path)
        .with_context(|| format!("Failed to read capture file: {}", path.display()))?;
    if payload.is_empty() {
        anyhow::bail!("capture file is empty: {}", path.display());
    }

    let selected_category = match kind {
        CaptureKind::Image => Some(
            category
                .map(|c| c.as_str().to_string())
                .unwrap_or_else(|| config.capture.default_category.clone()),
        ),
        CaptureKind::Voice => None,
    };

    let ctx = AppContext::open(config).await?;
    let bytes = payload.len();
    let id = ctx.stash.queue.add(kind, payload, selected_category).await;
    println!("queued {} capture {} ({} bytes)", kind, id, bytes);

    if ctx.stash.is_online() {
        let report = ctx.stash.queue.sync_all().await;
        println!(
            "sync: attempted {}, synced {}, failed {}",
            report.attempted, report.synced, report.failed
        );
    } else {
        println!("offline: capture will sync when the remote is reachable");
    }

    ctx.close().await;
    Ok(())
}
