//! Core data models used throughout Stash.
//!
//! [`PendingCapture`] is owned by the local capture store. [`Discovery`] and
//! [`Note`] are remote records; the cache and queue only ever hold copies.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a capture contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureKind {
    Image,
    Voice,
}

impl CaptureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptureKind::Image => "image",
            CaptureKind::Voice => "voice",
        }
    }
}

impl fmt::Display for CaptureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sync state of a capture that has not reached the remote store yet.
///
/// There is no success state: a synced capture is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureStatus {
    Pending,
    Processing,
    Failed,
}

impl CaptureStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptureStatus::Pending => "pending",
            CaptureStatus::Processing => "processing",
            CaptureStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for CaptureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An image or voice capture awaiting sync.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCapture {
    pub id: String,
    pub kind: CaptureKind,
    pub payload: Vec<u8>,
    /// Discovery category chosen at capture time (images only).
    pub selected_category: Option<String>,
    pub created_at: DateTime<Utc>,
    pub status: CaptureStatus,
}

impl PendingCapture {
    /// Create a new `pending` capture with a fresh UUID and `created_at = now`.
    pub fn new(kind: CaptureKind, payload: Vec<u8>, selected_category: Option<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            payload,
            selected_category,
            created_at: Utc::now(),
            status: CaptureStatus::Pending,
        }
    }
}

/// Category of a discovered subject.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryType {
    Series,
    ApiLibrary,
    AiTip,
    Gadget,
    #[default]
    Other,
}

impl DiscoveryType {
    pub const ALL: [DiscoveryType; 5] = [
        DiscoveryType::Series,
        DiscoveryType::ApiLibrary,
        DiscoveryType::AiTip,
        DiscoveryType::Gadget,
        DiscoveryType::Other,
    ];

    /// Wire name, as sent in the `type` form field.
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscoveryType::Series => "series",
            DiscoveryType::ApiLibrary => "api_library",
            DiscoveryType::AiTip => "ai_tip",
            DiscoveryType::Gadget => "gadget",
            DiscoveryType::Other => "other",
        }
    }

    /// Short human label.
    pub fn label(&self) -> &'static str {
        match self {
            DiscoveryType::Series => "Series",
            DiscoveryType::ApiLibrary => "API",
            DiscoveryType::AiTip => "AI Tip",
            DiscoveryType::Gadget => "Gadget",
            DiscoveryType::Other => "Other",
        }
    }
}

impl fmt::Display for DiscoveryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiscoveryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DiscoveryType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "unknown discovery type '{}'. Must be one of: series, api_library, ai_tip, gadget, other",
                    s
                )
            })
    }
}

/// An AI-enriched record naming a subject found in a capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discovery {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: DiscoveryType,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub metadata: Option<BTreeMap<String, Option<String>>>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub archived_at: Option<DateTime<Utc>>,
}

/// A transcribed voice capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub transcription: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub archived_at: Option<DateTime<Utc>>,
}

/// Last successfully fetched copy of both lists.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedListSnapshot {
    pub discoveries: Vec<Discovery>,
    pub notes: Vec<Note>,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_capture_is_pending_with_unique_id() {
        let a = PendingCapture::new(CaptureKind::Image, vec![1, 2], None);
        let b = PendingCapture::new(CaptureKind::Image, vec![1, 2], None);
        assert_eq!(a.status, CaptureStatus::Pending);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_discovery_type_parse() {
        assert_eq!(
            "api_library".parse::<DiscoveryType>().unwrap(),
            DiscoveryType::ApiLibrary
        );
        assert!("movie".parse::<DiscoveryType>().is_err());
        assert_eq!(DiscoveryType::default(), DiscoveryType::Other);
    }

    #[test]
    fn test_discovery_wire_format() {
        let json = r#"{
            "id": "d1",
            "type": "ai_tip",
            "name": "Prompt caching",
            "description": null,
            "link": "https://example.com",
            "metadata": {"author": "someone", "year": null},
            "image_url": null,
            "created_at": "2025-01-10T08:30:00.123456+00:00",
            "archived_at": null,
            "user_id": "ignored"
        }"#;
        let d: Discovery = serde_json::from_str(json).unwrap();
        assert_eq!(d.kind, DiscoveryType::AiTip);
        assert_eq!(d.link.as_deref(), Some("https://example.com"));
        let meta = d.metadata.unwrap();
        assert_eq!(meta.get("year"), Some(&None));
        assert!(d.archived_at.is_none());
    }

    #[test]
    fn test_note_optional_fields_default() {
        let n: Note = serde_json::from_str(
            r#"{"id":"n1","transcription":"hello","created_at":"2025-01-10T08:30:00Z"}"#,
        )
        .unwrap();
        assert_eq!(n.transcription, "hello");
        assert!(n.archived_at.is_none());
    }
}
