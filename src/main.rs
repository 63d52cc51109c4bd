//! # Stash CLI (`stash`)
//!
//! Queue captures locally, sync them to the Stash web API, and browse the
//! discoveries and notes lists with an offline fallback.
//!
//! ## Usage
//!
//! ```bash
//! stash --config ./config/stash.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `stash init` | Create the SQLite database and schema |
//! | `stash capture image <file>` | Queue a screenshot (synced when online) |
//! | `stash capture voice <file>` | Queue a voice recording (synced when online) |
//! | `stash pending` | List captures not yet synced |
//! | `stash retry <id>` | Queue a failed capture again |
//! | `stash remove <id>` | Drop a capture without syncing |
//! | `stash sync` | Sync pending captures now |
//! | `stash list` | Show discoveries and notes (cached when offline) |
//! | `stash discard <kind> <id>` | Delete a discovery or note |
//! | `stash archive <kind> <id>` | Archive a discovery or note |
//! | `stash archived` | Show archived discoveries and notes |
//! | `stash unarchive <kind> <id>` | Restore an archived discovery or note |
//! | `stash send <kind> <id>` | Forward a discovery or note to Notion |
//! | `stash status` | Connectivity, queue, and snapshot overview |
//! | `stash watch` | Sync automatically whenever the remote comes back |

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use stash::http_remote::ItemKind;
use stash::lists::ListKind;
use stash::models::{CaptureKind, DiscoveryType};
use stash::{capture, config, lists, logging, migrate, pending, status, watch};

/// Stash CLI: offline-first capture queue and list cache.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/stash.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "stash",
    about = "Stash: offline-first capture queue and list cache",
    version,
    long_about = "Stash keeps screenshots and voice notes in a local queue until the Stash web API \
    is reachable, syncs them one at a time, and serves the discoveries and notes lists from a \
    local snapshot when offline."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/stash.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Idempotent: running it multiple times is safe.
    Init,

    /// Queue a capture and sync it when the remote is reachable.
    Capture {
        #[command(subcommand)]
        kind: CaptureCommand,
    },

    /// List captures that have not reached the remote yet.
    Pending,

    /// Reset a failed capture to pending and sync when online.
    ///
    /// Unknown ids are a no-op.
    Retry {
        /// Capture id (as printed by `stash pending`).
        id: String,
    },

    /// Delete a capture without syncing it.
    Remove {
        /// Capture id (as printed by `stash pending`).
        id: String,
    },

    /// Sync all pending captures now.
    Sync,

    /// Show discoveries and notes.
    ///
    /// Prints the local snapshot when offline or when the refresh fails.
    List {
        /// Which list to print.
        #[arg(long, value_enum, default_value = "all")]
        kind: ListKind,
    },

    /// Delete a discovery or note remotely and drop it from the cache.
    Discard {
        kind: ItemArg,
        id: String,
    },

    /// Archive a discovery or note remotely and drop it from the cache.
    Archive {
        kind: ItemArg,
        id: String,
    },

    /// Show archived discoveries and notes (requires the remote).
    Archived {
        /// Which list to print.
        #[arg(long, value_enum, default_value = "all")]
        kind: ListKind,
    },

    /// Restore an archived discovery or note and refresh the cache.
    Unarchive {
        kind: ItemArg,
        id: String,
    },

    /// Forward a cached discovery or note to the configured Notion page.
    Send {
        kind: ItemArg,
        id: String,
    },

    /// Connectivity, queue, and snapshot overview.
    Status,

    /// Follow connectivity and sync automatically on reconnect.
    Watch,
}

#[derive(Subcommand)]
enum CaptureCommand {
    /// Queue a screenshot for analysis.
    Image {
        /// Image file to upload.
        file: PathBuf,

        /// Discovery category: series, api_library, ai_tip, gadget, other.
        /// Defaults to `capture.default_category`.
        #[arg(long)]
        category: Option<DiscoveryType>,
    },
    /// Queue a voice recording for transcription into a note.
    Voice {
        /// Audio file to upload.
        file: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ItemArg {
    Discovery,
    Note,
}

impl From<ItemArg> for ItemKind {
    fn from(arg: ItemArg) -> Self {
        match arg {
            ItemArg::Discovery => ItemKind::Discovery,
            ItemArg::Note => ItemKind::Note,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init();

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Capture { kind } => match kind {
            CaptureCommand::Image { file, category } => {
                capture::run_capture(&cfg, CaptureKind::Image, &file, category).await?;
            }
            CaptureCommand::Voice { file } => {
                capture::run_capture(&cfg, CaptureKind::Voice, &file, None).await?;
            }
        },
        Commands::Pending => {
            pending::run_pending(&cfg).await?;
        }
        Commands::Retry { id } => {
            pending::run_retry(&cfg, &id).await?;
        }
        Commands::Remove { id } => {
            pending::run_remove(&cfg, &id).await?;
        }
        Commands::Sync => {
            pending::run_sync(&cfg).await?;
        }
        Commands::List { kind } => {
            lists::run_list(&cfg, kind).await?;
        }
        Commands::Discard { kind, id } => {
            lists::run_discard(&cfg, kind.into(), &id).await?;
        }
        Commands::Archive { kind, id } => {
            lists::run_archive(&cfg, kind.into(), &id).await?;
        }
        Commands::Archived { kind } => {
            lists::run_archived(&cfg, kind).await?;
        }
        Commands::Unarchive { kind, id } => {
            lists::run_unarchive(&cfg, kind.into(), &id).await?;
        }
        Commands::Send { kind, id } => {
            lists::run_send(&cfg, kind.into(), &id).await?;
        }
        Commands::Status => {
            status::run_status(&cfg).await?;
        }
        Commands::Watch => {
            watch::run_watch(&cfg).await?;
        }
    }

    Ok(())
}
