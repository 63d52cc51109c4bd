//! # Stash
//!
//! **Offline-first capture queue and list cache for the Stash
//! capture-and-discover app.**
//!
//! Screenshots and voice notes are persisted locally the moment they are
//! captured and pushed to the Stash web API when it is reachable. The
//! discoveries and notes lists are served from a local snapshot first and
//! refreshed from the API when online.
//!
//! ## Architecture
//!
//! ```text
//!  capture ──▶ ┌──────────────┐  sweep  ┌──────────────┐
//!              │ OfflineQueue │────────▶│  HttpRemote  │
//!              └──────┬───────┘         │ /api/analyze │
//!                     │                 │ /api/notes … │
//!              ┌──────▼───────┐  fetch  └──────▲───────┘
//!   list ─────▶│  ListCache   │────────────────┘
//!              └──────┬───────┘
//!              ┌──────▼───────┐
//!              │ SQLite  (kv) │
//!              └──────────────┘
//! ```
//!
//! The queue and cache live in `stash-core` and only see traits; this
//! crate supplies the SQLite backend ([`sqlite_store`]), the HTTP client
//! ([`http_remote`]), and the composition root ([`app`]).
//!
//! ## Quick Start
//!
//! ```bash
//! stash init                                  # create database
//! stash capture image shot.png --category series
//! stash capture voice memo.webm
//! stash pending                               # what is still local
//! stash list                                  # discoveries + notes (cached when offline)
//! stash watch                                 # sync automatically on reconnect
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`db`] | SQLite connection pool with WAL mode |
//! | [`migrate`] | Database schema migrations (idempotent) |
//! | [`sqlite_store`] | SQLite `KvStore` backend |
//! | [`http_remote`] | HTTP client for the Stash web API |
//! | [`app`] | Composition root and connectivity dispatch |
//! | [`logging`] | Tracing subscriber setup |
//! | [`capture`] | `stash capture` |
//! | [`pending`] | `stash pending`, `retry`, `remove`, `sync` |
//! | [`lists`] | `stash list`, `archived`, `discard`, `archive`, `unarchive`, `send` |
//! | [`status`] | `stash status` |
//! | [`watch`] | `stash watch` |

pub mod app;
pub mod capture;
pub mod config;
pub mod db;
pub mod http_remote;
pub mod lists;
pub mod logging;
pub mod migrate;
pub mod pending;
pub mod sqlite_store;
pub mod status;
pub mod watch;

pub use app::{AppContext, Stash};
pub use stash_core::{cache, capture_store, connectivity, models, queue, remote, store};
