//! JSON payloads exchanged with the GitHub REST API.

use serde::{Deserialize, Serialize};

use reposync_core::BypassPlaceholder;

// =============================================================================
// Contents API
// =============================================================================

/// `GET /repos/{o}/{r}/contents/{path}` for a single file.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentItem {
    pub sha: String,
    pub path: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

/// Body of `PUT /repos/{o}/{r}/contents/{path}`.
#[derive(Debug, Clone, Serialize)]
pub struct PutContentBody<'a> {
    pub message: &'a str,
    /// Base64 of the raw bytes.
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<&'a str>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PutContentResponse {
    pub content: Option<ContentRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentRef {
    pub sha: String,
}

// =============================================================================
// Secret scanning
// =============================================================================

/// Body of `POST /repos/{o}/{r}/secret-scanning/push-protection-bypasses`.
#[derive(Debug, Clone, Serialize)]
pub struct BypassBody<'a> {
    pub reason: &'a str,
    pub placeholder_id: &'a str,
}

/// Generic error body; `metadata` is present on push-protection rejections.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub metadata: Option<ErrorMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorMetadata {
    #[serde(default)]
    pub secret_scanning: Option<SecretScanningMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SecretScanningMetadata {
    #[serde(default)]
    pub bypass_placeholders: Vec<WirePlaceholder>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WirePlaceholder {
    pub placeholder_id: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

impl From<WirePlaceholder> for BypassPlaceholder {
    fn from(p: WirePlaceholder) -> Self {
        BypassPlaceholder {
            id: p.placeholder_id.into(),
            token_type: p.token_type,
        }
    }
}

const SECRET_DETECTED_MARKER: &str = "secret detected";

impl ApiErrorBody {
    /// Whether this body marks a push-protection (secret scanning) block.
    pub fn is_secret_block(&self) -> bool {
        self.metadata
            .as_ref()
            .is_some_and(|m| m.secret_scanning.is_some())
            || self.message.to_ascii_lowercase().contains(SECRET_DETECTED_MARKER)
    }

    /// Placeholders carried by a secret-scanning block; empty otherwise.
    pub fn into_placeholders(self) -> Vec<BypassPlaceholder> {
        self.metadata
            .and_then(|m| m.secret_scanning)
            .map(|s| s.bypass_placeholders.into_iter().map(Into::into).collect())
            .unwrap_or_default()
    }
}

// =============================================================================
// Users, repositories, dispatch
// =============================================================================

/// `GET /user`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Body of `POST /user/repos`.
#[derive(Debug, Clone, Serialize)]
pub struct NewRepository {
    pub name: String,
    pub private: bool,
    pub auto_init: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NewRepository {
    /// Private, initialised with a first commit.
    pub fn private(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            private: true,
            auto_init: true,
            description: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub default_branch: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
}

/// Body of `POST /repos/{o}/{r}/dispatches`.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchBody<'a> {
    pub event_type: &'a str,
    pub client_payload: &'a serde_json::Value,
}
