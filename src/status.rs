//! `stash status`: connectivity, queue, and snapshot overview.

use anyhow::Result;
use chrono::Utc;

use stash_core::models::CaptureStatus;

use crate::app::AppContext;
use crate::config::Config;

fn format_age(secs: i64) -> String {
    match secs {
        s if s < 60 => format!("{}s", s.max(0)),
        s if s < 3600 => format!("{}m", s / 60),
        s if s < 86_400 => format!("{}h {}m", s / 3600, (s % 3600) / 60),
        s => format!("{}d", s / 86_400),
    }
}

pub async fn run_status(config: &Config) -> Result<()> {
    let ctx = AppContext::open(config).await?;
    let captures = ctx.stash.queue.pending().await;
    let by_status = |status: CaptureStatus| captures.iter().filter(|c| c.status == status).count();

    println!("Stash Status");
    println!("============");
    println!();
    println!("  Remote:      {}", config.remote.base_url);
    println!(
        "  Connection:  {}",
        if ctx.stash.is_online() { "online" } else { "offline" }
    );
    println!("  Database:    {}", config.db.path.display());
    println!();
    println!("  Captures:    {}", captures.len());
    println!("    pending:     {}", by_status(CaptureStatus::Pending));
    println!("    processing:  {}", by_status(CaptureStatus::Processing));
    println!("    failed:      {}", by_status(CaptureStatus::Failed));
    println!();
    match ctx.stash.cache.read_snapshot().await {
        Some(snapshot) => {
            let age = (Utc::now() - snapshot.timestamp).num_seconds();
            println!(
                "  Snapshot:    {} discoveries, {} notes ({} old)",
                snapshot.discoveries.len(),
                snapshot.notes.len(),
                format_age(age)
            );
        }
        None => println!("  Snapshot:    none"),
    }

    ctx.close().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_age() {
        assert_eq!(format_age(-3), "0s");
        assert_eq!(format_age(42), "42s");
        assert_eq!(format_age(125), "2m");
        assert_eq!(format_age(3_720), "1h 2m");
        assert_eq!(format_age(200_000), "2d");
    }
}
