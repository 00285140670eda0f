//! Domain types shared by the store, sync, and manifest layers.
//!
//! Remote paths use [`RepoPath`]; never raw `String` once a value has crossed
//! the manifest boundary.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PathError, RepoRefError};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Owner + repository pair identifying the remote container.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// `owner/name`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Parse an `owner/name` string. Both halves must pass [`RepoRef::validate`].
    pub fn parse(s: &str) -> Option<Self> {
        let (owner, name) = s.split_once('/')?;
        let repo = Self::new(owner, name);
        repo.validate().ok()?;
        Some(repo)
    }

    /// Owner and name may only use `[A-Za-z0-9._-]` and may not be `.` or `..`.
    ///
    /// Both end up as path components of the local ledger.
    pub fn validate(&self) -> Result<(), RepoRefError> {
        validate_component("owner", &self.owner)?;
        validate_component("name", &self.name)
    }
}

fn validate_component(field: &'static str, value: &str) -> Result<(), RepoRefError> {
    if value.is_empty() {
        return Err(RepoRefError::Empty { field });
    }
    if value == "." || value == ".." {
        return Err(RepoRefError::Dot {
            field,
            value: value.to_string(),
        });
    }
    if let Some(ch) = value
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_')))
    {
        return Err(RepoRefError::InvalidChar {
            field,
            value: value.to_string(),
            ch,
        });
    }
    Ok(())
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// A validated, slash-separated path inside a repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepoPath(String);

impl RepoPath {
    /// Validate and wrap a repository path.
    ///
    /// Rejects empty paths, leading/trailing slashes, empty segments,
    /// `.`/`..` segments, and backslashes.
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        if raw.is_empty() {
            return Err(PathError::Empty);
        }
        if raw.contains('\\') {
            return Err(PathError::Backslash(raw.to_owned()));
        }
        if raw.starts_with('/') || raw.ends_with('/') {
            return Err(PathError::Unanchored(raw.to_owned()));
        }
        for segment in raw.split('/') {
            match segment {
                "" => return Err(PathError::EmptySegment(raw.to_owned())),
                "." | ".." => return Err(PathError::Relative(raw.to_owned())),
                _ => {}
            }
        }
        Ok(Self(raw.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RepoPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl TryFrom<String> for RepoPath {
    type Error = PathError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl TryFrom<&str> for RepoPath {
    type Error = PathError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl From<RepoPath> for String {
    fn from(p: RepoPath) -> Self {
        p.0
    }
}

/// Opaque revision marker of a remote file (GitHub: blob SHA).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionToken(pub String);

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for VersionToken {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for VersionToken {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Identifier of one detected secret occurrence that may be bypassed once.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlaceholderId(pub String);

impl fmt::Display for PlaceholderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for PlaceholderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PlaceholderId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Justification category sent with every bypass authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BypassReason {
    #[default]
    FalsePositive,
    UsedInTests,
    WillFixLater,
}

impl BypassReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            BypassReason::FalsePositive => "false_positive",
            BypassReason::UsedInTests => "used_in_tests",
            BypassReason::WillFixLater => "will_fix_later",
        }
    }
}

impl fmt::Display for BypassReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// One write to one remote path. Built fresh per call, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileWriteRequest {
    pub repo: RepoRef,
    pub path: RepoPath,
    pub content: Vec<u8>,
    pub message: String,
    /// Target branch; `None` means the repository default branch.
    pub branch: Option<String>,
}

impl FileWriteRequest {
    pub fn new(
        repo: RepoRef,
        path: RepoPath,
        content: impl Into<Vec<u8>>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            repo,
            path,
            content: content.into(),
            message: message.into(),
            branch: None,
        }
    }

    pub fn on_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }
}

/// A file that already exists remotely. Only its version token matters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingFileHandle {
    pub path: RepoPath,
    pub version: VersionToken,
}

/// A single-use bypass handle produced by a policy rejection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BypassPlaceholder {
    pub id: PlaceholderId,
    /// Kind of secret the store detected, when it says.
    pub token_type: Option<String>,
}

impl BypassPlaceholder {
    pub fn new(id: impl Into<PlaceholderId>) -> Self {
        Self {
            id: id.into(),
            token_type: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
