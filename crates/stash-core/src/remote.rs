//! Remote collaborator contracts.
//!
//! The queue consumes [`RemoteSync`]; the list cache consumes
//! [`ListSource`]. Concrete HTTP implementations live in the `stash` app
//! crate.
//!
//! Every failure is a [`RemoteError`], and callers treat all variants the
//! same way: the variants exist for logging, not for branching. Calls carry
//! no idempotency key, so a retried call may duplicate a remote row when an
//! earlier attempt succeeded server-side but failed client-side.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Discovery, Note};

/// Failure of a remote call.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The request never produced a response (DNS, refused, reset, timeout).
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered with a non-success status.
    #[error("remote returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body did not have the expected shape.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The server understood the request and refused it with a message.
    #[error("rejected: {0}")]
    Rejected(String),
}

pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// Remote operations used to sync a capture.
#[async_trait]
pub trait RemoteSync: Send + Sync {
    /// Analyze an image and persist the discoveries found in it.
    async fn analyze_image(&self, payload: &[u8], category: &str) -> RemoteResult<Vec<Discovery>>;

    /// Transcribe a voice recording to text.
    async fn transcribe_audio(&self, payload: &[u8]) -> RemoteResult<String>;

    /// Persist a note from transcribed text.
    async fn create_note(&self, text: &str) -> RemoteResult<Note>;
}

/// Remote source of the active (non-archived) lists, newest first.
#[async_trait]
pub trait ListSource: Send + Sync {
    async fn fetch_discoveries(&self) -> RemoteResult<Vec<Discovery>>;

    async fn fetch_notes(&self) -> RemoteResult<Vec<Note>>;
}
