use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::range::ProtocolError;

/// Visibility of an uploaded video.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrivacyStatus {
    #[default]
    Unlisted,
    Private,
    Public,
}

impl PrivacyStatus {
    /// All accepted values, in the order shown to users.
    pub const ALL: [PrivacyStatus; 3] = [Self::Unlisted, Self::Private, Self::Public];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unlisted => "unlisted",
            Self::Private => "private",
            Self::Public => "public",
        }
    }
}

impl fmt::Display for PrivacyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrivacyStatus {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ProtocolError::InvalidPrivacyStatus(s.to_string()))
    }
}

/// Per-video metadata supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoMetadata {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub category_id: String,
    #[serde(default)]
    pub privacy_status: PrivacyStatus,
}

/// `snippet` section of the insert body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub category_id: String,
}

/// `status` section of the insert body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStatus {
    pub privacy_status: PrivacyStatus,
}

/// JSON body sent once when opening a resumable session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoInsertBody {
    pub snippet: Snippet,
    pub status: VideoStatus,
}

impl From<&VideoMetadata> for VideoInsertBody {
    fn from(meta: &VideoMetadata) -> Self {
        Self {
            snippet: Snippet {
                title: meta.title.clone(),
                description: meta.description.clone(),
                tags: meta.tags.clone(),
                category_id: meta.category_id.clone(),
            },
            status: VideoStatus {
                privacy_status: meta.privacy_status,
            },
        }
    }
}

/// Extracts the video id from a completion response.
///
/// Returns `None` when `id` is absent, not a string, or empty.
pub fn remote_id(body: &serde_json::Value) -> Option<&str> {
    body.get("id")
        .and_then(serde_json::Value::as_str)
        .filter(|id| !id.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_metadata() -> VideoMetadata {
        VideoMetadata {
            title: "Holiday".into(),
            description: "Beach day".into(),
            tags: vec!["beach".into(), "sun".into()],
            category_id: "22".into(),
            privacy_status: PrivacyStatus::Private,
        }
    }

    #[test]
    fn insert_body_groups_snippet_and_status() {
        let body = VideoInsertBody::from(&sample_metadata());
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(
            value,
            json!({
                "snippet": {
                    "title": "Holiday",
                    "description": "Beach day",
                    "tags": ["beach", "sun"],
                    "categoryId": "22"
                },
                "status": { "privacyStatus": "private" }
            })
        );
    }

    #[test]
    fn insert_body_omits_empty_tags() {
        let mut meta = sample_metadata();
        meta.tags.clear();
        let json = serde_json::to_string(&VideoInsertBody::from(&meta)).unwrap();
        assert!(!json.contains("tags"));
    }

    #[test]
    fn privacy_status_parse() {
        assert_eq!("public".parse::<PrivacyStatus>().unwrap(), PrivacyStatus::Public);
        assert_eq!(" Private ".parse::<PrivacyStatus>().unwrap(), PrivacyStatus::Private);
        assert!(matches!(
            "friends".parse::<PrivacyStatus>(),
            Err(ProtocolError::InvalidPrivacyStatus(_))
        ));
    }

    #[test]
    fn privacy_status_default_is_unlisted() {
        assert_eq!(PrivacyStatus::default(), PrivacyStatus::Unlisted);
        assert_eq!(PrivacyStatus::default().to_string(), "unlisted");
    }

    #[test]
    fn metadata_deserializes_with_defaults() {
        let meta: VideoMetadata =
            serde_json::from_str(r#"{"title":"t","categoryId":"10"}"#).unwrap();
        assert!(meta.tags.is_empty());
        assert!(meta.description.is_empty());
        assert_eq!(meta.privacy_status, PrivacyStatus::Unlisted);
    }

    #[test]
    fn remote_id_requires_non_empty_string() {
        assert_eq!(remote_id(&json!({"id": "abc123", "kind": "youtube#video"})), Some("abc123"));
        assert_eq!(remote_id(&json!({"kind": "youtube#video"})), None);
        assert_eq!(remote_id(&json!({"id": ""})), None);
        assert_eq!(remote_id(&json!({"id": 42})), None);
        assert_eq!(remote_id(&json!(null)), None);
    }
}
