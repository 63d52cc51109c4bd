//! # Stash Core
//!
//! Executor-agnostic logic for Stash: capture and list models, the
//! key-value store abstraction, the local capture store, the offline
//! capture queue, and the read-through list cache.
//!
//! This crate contains no tokio, sqlx, reqwest, or filesystem I/O. Storage
//! and remote access are injected through the [`store::KvStore`],
//! [`remote::RemoteSync`], and [`remote::ListSource`] traits.

pub mod cache;
pub mod capture_store;
pub mod connectivity;
pub mod models;
pub mod queue;
pub mod remote;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;
