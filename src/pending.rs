//! Pending-capture commands: `pending`, `retry`, `remove`, `sync`.

use anyhow::Result;

use stash_core::models::{CaptureStatus, PendingCapture};

use crate::app::AppContext;
use crate::config::Config;

fn format_capture(c: &PendingCapture) -> String {
    let mut line = format!(
        "  {}  {:<5}  {:<10}  {}  {} bytes",
        c.id,
        c.kind,
        c.status,
        c.created_at.format("%Y-%m-%d %H:%M:%S"),
        c.payload.len()
    );
    if let Some(category) = &c.selected_category {
        line.push_str(&format!("  [{}]", category));
    }
    line
}

/// List stored captures, newest first. Never touches the network.
pub async fn run_pending(config: &Config) -> Result<()> {
    let ctx = AppContext::open_local(config).await?;
    let captures = ctx.stash.queue.pending().await;
    let by_status = |status: CaptureStatus| captures.iter().filter(|c| c.status == status).count();

    let failed = by_status(CaptureStatus::Failed);
    println!(
        "{} queued capture(s): {} pending, {} processing, {} failed",
        captures.len(),
        by_status(CaptureStatus::Pending),
        by_status(CaptureStatus::Processing),
        failed
    );
    for c in &captures {
        println!("{}", format_capture(c));
    }
    if failed > 0 {
        println!("{} failed; use `stash retry <id>` to queue again", failed);
    }

    ctx.close().await;
    Ok(())
}

/// Reset a capture to pending, then sweep when online.
pub async fn run_retry(config: &Config, id: &str) -> Result<()> {
    let ctx = AppContext::open(config).await?;
    if ctx.stash.queue.retry(id).await {
        println!("capture {} reset to pending", id);
        if ctx.stash.is_online() {
            print_report(ctx.stash.queue.sync_all().await);
        }
    } else {
        println!("no capture with id {}", id);
    }
    ctx.close().await;
    Ok(())
}

/// Delete a capture without syncing it. Never touches the network.
pub async fn run_remove(config: &Config, id: &str) -> Result<()> {
    let ctx = AppContext::open_local(config).await?;
    let existed = ctx.stash.queue.pending().await.iter().any(|c| c.id == id);
    if !existed {
        println!("no capture with id {}", id);
    } else if ctx.stash.queue.remove(id).await {
        println!("removed capture {}", id);
    } else {
        anyhow::bail!("failed to remove capture {}", id);
    }
    ctx.close().await;
    Ok(())
}

/// Run one sweep over pending captures.
pub async fn run_sync(config: &Config) -> Result<()> {
    let ctx = AppContext::open(config).await?;
    if ctx.stash.is_online() {
        print_report(ctx.stash.queue.sync_all().await);
    } else {
        println!("offline: nothing synced");
    }
    ctx.close().await;
    Ok(())
}

fn print_report(report: stash_core::queue::SyncReport) {
    println!(
        "sync: attempted {}, synced {}, failed {}",
        report.attempted, report.synced, report.failed
    );
}
