//! Test doubles shared by the unit tests of this crate.

use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Notify;

use crate::models::{
    CaptureKind, CaptureStatus, Discovery, DiscoveryType, Note, PendingCapture,
};
use crate::remote::{ListSource, RemoteError, RemoteResult, RemoteSync};
use crate::store::memory::InMemoryKvStore;
use crate::store::KvStore;

fn ts(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
}

/// A pending image capture with a fixed id and creation time.
pub fn capture_at(id: &str, secs: i64) -> PendingCapture {
    PendingCapture {
        id: id.to_string(),
        kind: CaptureKind::Image,
        payload: id.as_bytes().to_vec(),
        selected_category: None,
        created_at: ts(secs),
        status: CaptureStatus::Pending,
    }
}

pub fn discovery(id: &str) -> Discovery {
    Discovery {
        id: id.to_string(),
        kind: DiscoveryType::Series,
        name: format!("Show {}", id),
        description: None,
        link: None,
        metadata: None,
        image_url: None,
        created_at: ts(0),
        archived_at: None,
    }
}

pub fn note(id: &str) -> Note {
    Note {
        id: id.to_string(),
        transcription: format!("note {}", id),
        created_at: ts(0),
        archived_at: None,
    }
}

/// A backend where every operation fails.
pub struct FailingKvStore;

#[async_trait]
impl KvStore for FailingKvStore {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>> {
        bail!("storage unavailable")
    }
    async fn set(&self, _key: &str, _value: &[u8]) -> Result<()> {
        bail!("storage unavailable")
    }
    async fn delete(&self, _key: &str) -> Result<()> {
        bail!("storage unavailable")
    }
    async fn keys(&self, _prefix: &str) -> Result<Vec<String>> {
        bail!("storage unavailable")
    }
}

/// In-memory backend whose deletes always fail.
#[derive(Default)]
pub struct StickyKvStore {
    inner: InMemoryKvStore,
}

#[async_trait]
impl KvStore for StickyKvStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.inner.get(key).await
    }
    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        self.inner.set(key, value).await
    }
    async fn delete(&self, _key: &str) -> Result<()> {
        bail!("delete rejected")
    }
    async fn keys(&self, prefix: &str) -> Result<Vec<String>> {
        self.inner.keys(prefix).await
    }
}

#[derive(Default)]
struct FakeState {
    fail_analyze: bool,
    fail_transcribe: bool,
    fail_create_note: bool,
    fail_lists: bool,
    transcript: String,
    analyze_categories: Vec<String>,
    created_notes: Vec<String>,
    list_fetches: usize,
    discoveries: Vec<Discovery>,
    notes: Vec<Note>,
    analyze_gate: Option<Arc<Notify>>,
}

/// Scriptable remote recording every call.
#[derive(Default)]
pub struct FakeRemote {
    state: Mutex<FakeState>,
}

fn unavailable() -> RemoteError {
    RemoteError::Status {
        status: 500,
        body: "unavailable".to_string(),
    }
}

impl FakeRemote {
    pub fn fail_analyze(&self, fail: bool) {
        self.state.lock().unwrap().fail_analyze = fail;
    }
    pub fn fail_transcribe(&self, fail: bool) {
        self.state.lock().unwrap().fail_transcribe = fail;
    }
    pub fn fail_create_note(&self, fail: bool) {
        self.state.lock().unwrap().fail_create_note = fail;
    }
    pub fn fail_lists(&self, fail: bool) {
        self.state.lock().unwrap().fail_lists = fail;
    }
    pub fn set_transcript(&self, text: &str) {
        self.state.lock().unwrap().transcript = text.to_string();
    }
    pub fn set_lists(&self, discoveries: Vec<Discovery>, notes: Vec<Note>) {
        let mut state = self.state.lock().unwrap();
        state.discoveries = discoveries;
        state.notes = notes;
    }
    /// Make `analyze_image` wait until [`release_analyze`](Self::release_analyze).
    pub fn hold_analyze(&self) {
        self.state.lock().unwrap().analyze_gate = Some(Arc::new(Notify::new()));
    }
    pub fn release_analyze(&self) {
        if let Some(gate) = self.state.lock().unwrap().analyze_gate.take() {
            gate.notify_one();
        }
    }
    pub fn analyze_calls(&self) -> usize {
        self.state.lock().unwrap().analyze_categories.len()
    }
    pub fn analyze_categories(&self) -> Vec<String> {
        self.state.lock().unwrap().analyze_categories.clone()
    }
    pub fn created_notes(&self) -> Vec<String> {
        self.state.lock().unwrap().created_notes.clone()
    }
    pub fn list_fetches(&self) -> usize {
        self.state.lock().unwrap().list_fetches
    }
}

#[async_trait]
impl RemoteSync for FakeRemote {
    async fn analyze_image(&self, _payload: &[u8], category: &str) -> RemoteResult<Vec<Discovery>> {
        let gate = {
            let mut state = self.state.lock().unwrap();
            state.analyze_categories.push(category.to_string());
            state.analyze_gate.clone()
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let state = self.state.lock().unwrap();
        if state.fail_analyze {
            return Err(unavailable());
        }
        Ok(vec![discovery("analyzed")])
    }

    async fn transcribe_audio(&self, _payload: &[u8]) -> RemoteResult<String> {
        let state = self.state.lock().unwrap();
        if state.fail_transcribe {
            return Err(RemoteError::Transport("connection refused".to_string()));
        }
        Ok(state.transcript.clone())
    }

    async fn create_note(&self, text: &str) -> RemoteResult<Note> {
        let mut state = self.state.lock().unwrap();
        state.created_notes.push(text.to_string());
        if state.fail_create_note {
            return Err(unavailable());
        }
        Ok(note("created"))
    }
}

#[async_trait]
impl ListSource for FakeRemote {
    async fn fetch_discoveries(&self) -> RemoteResult<Vec<Discovery>> {
        let mut state = self.state.lock().unwrap();
        state.list_fetches += 1;
        if state.fail_lists {
            return Err(unavailable());
        }
        Ok(state.discoveries.clone())
    }

    async fn fetch_notes(&self) -> RemoteResult<Vec<Note>> {
        let mut state = self.state.lock().unwrap();
        state.list_fetches += 1;
        if state.fail_lists {
            return Err(unavailable());
        }
        Ok(state.notes.clone())
    }
}
