//! List commands: `list`, `archived`, `discard`, `archive`, `unarchive`, `send`.
//!
//! Item actions hit the remote first and only then touch the cache, so a
//! failed remote call leaves the cache untouched. The archived lists are
//! never cached and need the remote.

use anyhow::Result;

use stash_core::cache::CacheView;
use stash_core::models::{Discovery, Note};

use crate::app::AppContext;
use crate::config::Config;
use crate::http_remote::{ItemKind, NotionItem};

/// Which list(s) `stash list` prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ListKind {
    All,
    Discoveries,
    Notes,
}

fn print_discovery(d: &Discovery) {
    println!("  {}  [{}]  {}", d.id, d.kind.label(), d.name);
    if let Some(desc) = &d.description {
        println!("      {}", desc);
    }
    if let Some(link) = &d.link {
        println!("      {}", link);
    }
}

fn print_note(n: &Note) {
    let preview: String = n.transcription.chars().take(80).collect();
    println!(
        "  {}  {}  {}",
        n.id,
        n.created_at.format("%Y-%m-%d %H:%M"),
        preview
    );
}

fn print_view(view: &CacheView, kind: ListKind) {
    if view.is_offline {
        println!("offline: showing cached lists");
    } else if view.is_cached {
        println!("refresh failed: showing cached lists");
    }
    if let Some(at) = view.fetched_at {
        println!("as of {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
    }

    if kind != ListKind::Notes {
        println!("discoveries: {}", view.discoveries.len());
        for d in &view.discoveries {
            print_discovery(d);
        }
    }
    if kind != ListKind::Discoveries {
        println!("notes: {}", view.notes.len());
        for n in &view.notes {
            print_note(n);
        }
    }
}

pub async fn run_list(config: &Config, kind: ListKind) -> Result<()> {
    let ctx = AppContext::open(config).await?;
    let view = ctx.stash.cache.load().await;
    print_view(&view, kind);
    ctx.close().await;
    Ok(())
}

/// Print the archived lists straight from the remote.
pub async fn run_archived(config: &Config, kind: ListKind) -> Result<()> {
    let ctx = AppContext::open(config).await?;
    if !ctx.stash.is_online() {
        anyhow::bail!("offline: archived items are not cached");
    }
    let (discoveries, notes) = ctx.remote.fetch_archived().await?;
    let view = CacheView {
        discoveries,
        notes,
        ..CacheView::default()
    };
    print_view(&view, kind);
    ctx.close().await;
    Ok(())
}

async fn remove_from_cache(ctx: &AppContext, kind: ItemKind, id: &str) {
    match kind {
        ItemKind::Discovery => ctx.stash.cache.remove_discovery(id).await,
        ItemKind::Note => ctx.stash.cache.remove_note(id).await,
    }
}

/// Delete remotely, then drop from the cache.
pub async fn run_discard(config: &Config, kind: ItemKind, id: &str) -> Result<()> {
    let ctx = AppContext::open(config).await?;
    if !ctx.stash.is_online() {
        anyhow::bail!("offline: cannot delete {} {}", kind, id);
    }
    ctx.remote.delete(kind, id).await?;
    remove_from_cache(&ctx, kind, id).await;
    println!("deleted {} {}", kind, id);
    ctx.close().await;
    Ok(())
}

/// Archive remotely, then drop from the cache (which only holds active items).
pub async fn run_archive(config: &Config, kind: ItemKind, id: &str) -> Result<()> {
    let ctx = AppContext::open(config).await?;
    if !ctx.stash.is_online() {
        anyhow::bail!("offline: cannot archive {} {}", kind, id);
    }
    ctx.remote.set_archived(kind, id, true).await?;
    remove_from_cache(&ctx, kind, id).await;
    println!("archived {} {}", kind, id);
    ctx.close().await;
    Ok(())
}

/// Restore an archived item, then refresh the cache so it reappears.
pub async fn run_unarchive(config: &Config, kind: ItemKind, id: &str) -> Result<()> {
    let ctx = AppContext::open(config).await?;
    if !ctx.stash.is_online() {
        anyhow::bail!("offline: cannot unarchive {} {}", kind, id);
    }
    ctx.remote.set_archived(kind, id, false).await?;
    ctx.stash.cache.load().await;
    println!("unarchived {} {}", kind, id);
    ctx.close().await;
    Ok(())
}

/// Forward a cached discovery or note to Notion.
pub async fn run_send(config: &Config, kind: ItemKind, id: &str) -> Result<()> {
    let ctx = AppContext::open(config).await?;
    if !ctx.stash.is_online() {
        anyhow::bail!("offline: cannot send {} {} to Notion", kind, id);
    }
    let view = ctx.stash.cache.load().await;
    let item = match kind {
        ItemKind::Discovery => view
            .discoveries
            .iter()
            .find(|d| d.id == id)
            .map(NotionItem::Discovery),
        ItemKind::Note => view.notes.iter().find(|n| n.id == id).map(NotionItem::Note),
    };
    let Some(item) = item else {
        anyhow::bail!("no {} with id {} in the current lists", kind, id);
    };
    ctx.remote
        .send_to_notion(item, config.notion.as_ref())
        .await?;
    println!("sent {} {} to Notion", kind, id);
    ctx.close().await;
    Ok(())
}
