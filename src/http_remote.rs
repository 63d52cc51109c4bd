//! HTTP client for the Stash web API.
//!
//! Implements [`RemoteSync`] and [`ListSource`] against the app's routes,
//! plus the item actions the CLI performs before editing the cache
//! (delete, archive) and a reachability probe.
//!
//! | Call | Route |
//! |------|-------|
//! | [`RemoteSync::analyze_image`] | `POST /api/analyze` (multipart `images`, `type`) |
//! | [`RemoteSync::transcribe_audio`] | `POST /api/transcribe` (multipart `audio`) |
//! | [`RemoteSync::create_note`] | `POST /api/notes` (JSON `transcription`) |
//! | [`ListSource::fetch_discoveries`] | `GET /api/discoveries` |
//! | [`ListSource::fetch_notes`] | `GET /api/notes` |
//! | [`HttpRemote::fetch_archived`] | `GET /api/{discoveries,notes}?archived=true` |
//! | [`HttpRemote::delete`] | `DELETE /api/{discoveries,notes}/{id}` |
//! | [`HttpRemote::set_archived`] | `PATCH /api/{discoveries,notes}/{id}` |
//! | [`HttpRemote::send_to_notion`] | `POST /api/notion` |
//! | [`HttpRemote::probe`] | `GET /api/discoveries`, any status |
//!
//! Any non-2xx status, transport failure, or unexpected body is a
//! [`RemoteError`]. Nothing is retried here; retry policy belongs to the
//! queue.
//!
//! The probe has its own short timeout so a remote that accepts connections
//! but never answers reads as offline instead of stalling the caller.

use std::fmt;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use stash_core::models::{Discovery, Note};
use stash_core::remote::{ListSource, RemoteError, RemoteResult, RemoteSync};

use crate::config::{NotionConfig, RemoteConfig};

/// Probe timeout when none is configured.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Which remote collection an item action targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Discovery,
    Note,
}

impl ItemKind {
    fn collection(&self) -> &'static str {
        match self {
            ItemKind::Discovery => "discoveries",
            ItemKind::Note => "notes",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Discovery => f.write_str("discovery"),
            ItemKind::Note => f.write_str("note"),
        }
    }
}

#[derive(Deserialize)]
struct AnalyzeResponse {
    results: Vec<Discovery>,
}

#[derive(Deserialize)]
struct TranscribeResponse {
    transcription: String,
}

#[derive(Deserialize)]
struct NoteResponse {
    note: Note,
}

#[derive(Deserialize)]
struct DiscoveriesResponse {
    #[serde(default)]
    discoveries: Vec<Discovery>,
}

#[derive(Deserialize)]
struct NotesResponse {
    #[serde(default)]
    notes: Vec<Note>,
}

#[derive(Deserialize)]
struct NotionResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Body of `POST /api/notion`.
#[derive(Debug, Serialize, PartialEq)]
struct NotionRequest<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    transcription: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    link: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    credentials: Option<NotionCredentials<'a>>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct NotionCredentials<'a> {
    api_key: &'a str,
    page_id: &'a str,
}

/// An item forwarded to Notion.
#[derive(Debug, Clone, Copy)]
pub enum NotionItem<'a> {
    Discovery(&'a Discovery),
    Note(&'a Note),
}

impl<'a> NotionItem<'a> {
    fn request(self, notion: Option<&'a NotionConfig>) -> NotionRequest<'a> {
        let credentials = notion.map(|n| NotionCredentials {
            api_key: &n.api_key,
            page_id: &n.page_id,
        });
        match self {
            NotionItem::Discovery(d) => NotionRequest {
                kind: "discovery",
                name: Some(d.name.as_str()),
                description: d.description.as_deref(),
                transcription: None,
                link: d.link.as_deref(),
                credentials,
            },
            NotionItem::Note(n) => NotionRequest {
                kind: "note",
                name: None,
                description: None,
                transcription: Some(n.transcription.as_str()),
                link: None,
                credentials,
            },
        }
    }
}

/// `{"error": "..."}` bodies become [`RemoteError::Rejected`].
fn rejected_message(err: RemoteError) -> RemoteError {
    match err {
        RemoteError::Status { status, body } => {
            match serde_json::from_str::<NotionResponse>(&body) {
                Ok(NotionResponse {
                    error: Some(message),
                    ..
                }) => RemoteError::Rejected(message),
                _ => RemoteError::Status { status, body },
            }
        }
        other => other,
    }
}

/// Client for one Stash deployment.
pub struct HttpRemote {
    base_url: String,
    auth_token: Option<String>,
    probe_timeout: Duration,
    client: reqwest::Client,
}

impl HttpRemote {
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth_token: config.auth_token.clone(),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            client: builder.build()?,
        })
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> RemoteResult<Response> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> RemoteResult<T> {
        let response = self.send(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| RemoteError::Malformed(e.to_string()))
    }

    /// Delete a discovery or note on the remote.
    pub async fn delete(&self, kind: ItemKind, id: &str) -> RemoteResult<()> {
        let url = self.url(&format!("/api/{}/{}", kind.collection(), id));
        self.send(self.client.delete(url)).await?;
        debug!(%kind, id, "deleted remotely");
        Ok(())
    }

    /// Archive or unarchive a discovery or note on the remote.
    pub async fn set_archived(&self, kind: ItemKind, id: &str, archived: bool) -> RemoteResult<()> {
        let url = self.url(&format!("/api/{}/{}", kind.collection(), id));
        let body = serde_json::json!({ "archived": archived });
        self.send(self.client.patch(url).json(&body)).await?;
        debug!(%kind, id, archived, "archive flag set remotely");
        Ok(())
    }

    /// Archived discoveries and notes, newest first.
    pub async fn fetch_archived(&self) -> RemoteResult<(Vec<Discovery>, Vec<Note>)> {
        let discoveries = self.send_json::<DiscoveriesResponse>(
            self.client.get(self.url("/api/discoveries?archived=true")),
        );
        let notes = self
            .send_json::<NotesResponse>(self.client.get(self.url("/api/notes?archived=true")));
        let (discoveries, notes) = tokio::try_join!(discoveries, notes)?;
        Ok((discoveries.discoveries, notes.notes))
    }

    /// Forward a discovery or note to a Notion page.
    ///
    /// Without `notion` credentials the server uses its own, if it has any.
    pub async fn send_to_notion(
        &self,
        item: NotionItem<'_>,
        notion: Option<&NotionConfig>,
    ) -> RemoteResult<()> {
        let body = item.request(notion);
        let response: NotionResponse = self
            .send_json(self.client.post(self.url("/api/notion")).json(&body))
            .await
            .map_err(rejected_message)?;
        if !response.success {
            return Err(RemoteError::Rejected(
                response
                    .error
                    .unwrap_or_else(|| "notion send failed".to_string()),
            ));
        }
        info!(kind = body.kind, "sent to notion");
        Ok(())
    }

    /// Whether the deployment answers within the probe timeout. Any HTTP
    /// status counts as reachable.
    pub async fn probe(&self) -> bool {
        let request = self
            .authorize(self.client.get(self.url("/api/discoveries")))
            .timeout(self.probe_timeout);
        match request.send().await {
            Ok(_) => true,
            Err(e) => {
                debug!(error = %e, "remote unreachable");
                false
            }
        }
    }
}

#[async_trait]
impl RemoteSync for HttpRemote {
    async fn analyze_image(&self, payload: &[u8], category: &str) -> RemoteResult<Vec<Discovery>> {
        let part = Part::bytes(payload.to_vec())
            .file_name("offline-capture.jpg")
            .mime_str("image/jpeg")
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        let form = Form::new()
            .part("images", part)
            .text("type", category.to_string());

        let response: AnalyzeResponse = self
            .send_json(self.client.post(self.url("/api/analyze")).multipart(form))
            .await?;
        Ok(response.results)
    }

    async fn transcribe_audio(&self, payload: &[u8]) -> RemoteResult<String> {
        let part = Part::bytes(payload.to_vec())
            .file_name("recording.webm")
            .mime_str("audio/webm")
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        let form = Form::new().part("audio", part);

        let response: TranscribeResponse = self
            .send_json(self.client.post(self.url("/api/transcribe")).multipart(form))
            .await?;
        if response.transcription.trim().is_empty() {
            return Err(RemoteError::Malformed("empty transcription".to_string()));
        }
        Ok(response.transcription)
    }

    async fn create_note(&self, text: &str) -> RemoteResult<Note> {
        let body = serde_json::json!({ "transcription": text });
        let response: NoteResponse = self
            .send_json(self.client.post(self.url("/api/notes")).json(&body))
            .await?;
        Ok(response.note)
    }
}

#[async_trait]
impl ListSource for HttpRemote {
    async fn fetch_discoveries(&self) -> RemoteResult<Vec<Discovery>> {
        let response: DiscoveriesResponse = self
            .send_json(self.client.get(self.url("/api/discoveries")))
            .await?;
        Ok(response.discoveries)
    }

    async fn fetch_notes(&self) -> RemoteResult<Vec<Note>> {
        let response: NotesResponse = self
            .send_json(self.client.get(self.url("/api/notes")))
            .await?;
        Ok(response.notes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(base_url: &str) -> HttpRemote {
        HttpRemote::new(&RemoteConfig {
            base_url: base_url.to_string(),
            auth_token: None,
            timeout_secs: None,
        })
        .unwrap()
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let r = remote("http://localhost:3000/");
        assert_eq!(r.url("/api/notes"), "http://localhost:3000/api/notes");
    }

    #[test]
    fn test_missing_list_field_is_empty() {
        let parsed: DiscoveriesResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.discoveries.is_empty());
        let parsed: NotesResponse = serde_json::from_str(r#"{"error":"x"}"#).unwrap();
        assert!(parsed.notes.is_empty());
    }

    #[test]
    fn test_notion_request_bodies() {
        let discovery = Discovery {
            id: "d1".to_string(),
            kind: stash_core::models::DiscoveryType::Gadget,
            name: "Flipper".to_string(),
            description: Some("multi-tool".to_string()),
            link: None,
            metadata: None,
            image_url: None,
            created_at: chrono::Utc::now(),
            archived_at: None,
        };
        let body = serde_json::to_value(NotionItem::Discovery(&discovery).request(None)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "type": "discovery", "name": "Flipper", "description": "multi-tool" })
        );

        let note = Note {
            id: "n1".to_string(),
            transcription: "call back".to_string(),
            created_at: chrono::Utc::now(),
            archived_at: None,
        };
        let notion = NotionConfig {
            api_key: "secret".to_string(),
            page_id: "page".to_string(),
        };
        let body = serde_json::to_value(NotionItem::Note(&note).request(Some(&notion))).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "type": "note",
                "transcription": "call back",
                "credentials": { "apiKey": "secret", "pageId": "page" }
            })
        );
    }

    #[test]
    fn test_error_body_becomes_rejected() {
        let err = rejected_message(RemoteError::Status {
            status: 400,
            body: r#"{"error":"Notion credentials not configured"}"#.to_string(),
        });
        assert!(matches!(err, RemoteError::Rejected(m) if m == "Notion credentials not configured"));

        let err = rejected_message(RemoteError::Status {
            status: 502,
            body: "bad gateway".to_string(),
        });
        assert!(matches!(err, RemoteError::Status { status: 502, .. }));
    }

    #[test]
    fn test_item_kind_routes() {
        assert_eq!(ItemKind::Discovery.collection(), "discoveries");
        assert_eq!(ItemKind::Note.collection(), "notes");
        assert_eq!(ItemKind::Note.to_string(), "note");
    }
}
