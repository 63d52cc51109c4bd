//! `stash watch`: follow connectivity and sync on reconnect.
//!
//! A prober task checks remote reachability every
//! `connectivity.probe_interval_secs` and publishes the result on a
//! `tokio::sync::watch` channel; [`Stash::follow`](crate::app::Stash::follow)
//! turns changes into a queue sweep plus cache refresh (online) or an
//! offline flag. Runs until Ctrl-C.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::watch;
use tracing::info;

use crate::app::AppContext;
use crate::config::Config;
use crate::http_remote::HttpRemote;

async fn probe_loop(remote: Arc<HttpRemote>, interval: Duration, tx: watch::Sender<bool>) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let online = remote.probe().await;
        tx.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });
        if tx.is_closed() {
            break;
        }
    }
}

pub async fn run_watch(config: &Config) -> Result<()> {
    let ctx = AppContext::open(config).await?;
    let interval = Duration::from_secs(config.connectivity.probe_interval_secs);
    println!(
        "watching {} (probe every {}s, Ctrl-C to stop)",
        config.remote.base_url,
        interval.as_secs()
    );

    // Drain anything left from earlier sessions before waiting for changes.
    if ctx.stash.is_online() {
        let report = ctx.stash.queue.sync_all().await;
        info!(
            attempted = report.attempted,
            synced = report.synced,
            failed = report.failed,
            "startup sync"
        );
        ctx.stash.cache.load().await;
    }

    let (tx, rx) = watch::channel(ctx.stash.is_online());
    let prober = tokio::spawn(probe_loop(ctx.remote.clone(), interval, tx));

    tokio::select! {
        _ = ctx.stash.follow(rx) => {}
        result = tokio::signal::ctrl_c() => {
            result?;
            println!("stopping");
        }
    }

    prober.abort();
    ctx.close().await;
    Ok(())
}
