//! YAML manifest describing one target repository and the files to push.
//!
//! # Layout
//!
//! ```yaml
//! repository: { owner: octo, name: demo }
//! branch: main
//! settings:
//!   api_url: https://api.github.com
//!   settle_delay_ms: 1500
//!   file_delay_ms: 1000
//!   bypass_reason: false_positive
//! vars: { team: infra }
//! files:
//!   - path: README.md
//!     source: ./README.md
//!   - path: docs/about.md
//!     template: "# {{ repository.name }}"
//!     message: Update about page
//!   - path: VERSION
//!     content: "1.0.0\n"
//! ```
//!
//! `source:` paths are resolved against the directory holding the manifest.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{io_err, ManifestError};
use crate::types::{BypassReason, RepoPath, RepoRef};

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 1500;
pub const DEFAULT_FILE_DELAY_MS: u64 = 1000;

// ---------------------------------------------------------------------------
// 1. Types
// ---------------------------------------------------------------------------

/// Root of a manifest file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub repository: RepoRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub vars: BTreeMap<String, String>,
    #[serde(default)]
    pub files: Vec<FileEntry>,
}

/// Tunables. Every field is optional in YAML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_url: String,
    /// Pause between a successful bypass and the retried write.
    pub settle_delay_ms: u64,
    /// Pause between consecutive remote writes in one run.
    pub file_delay_ms: u64,
    pub bypass_reason: BypassReason,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            file_delay_ms: DEFAULT_FILE_DELAY_MS,
            bypass_reason: BypassReason::default(),
        }
    }
}

impl Settings {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn file_delay(&self) -> Duration {
        Duration::from_millis(self.file_delay_ms)
    }
}

/// One file to push. Exactly one of `source`, `template`, `content` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: RepoPath,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Where an entry's bytes come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryBody<'a> {
    Source(&'a Path),
    Template(&'a str),
    Literal(&'a str),
}

impl FileEntry {
    pub fn body(&self) -> Result<EntryBody<'_>, ManifestError> {
        match (&self.source, &self.template, &self.content) {
            (Some(source), None, None) => Ok(EntryBody::Source(source)),
            (None, Some(template), None) => Ok(EntryBody::Template(template)),
            (None, None, Some(content)) => Ok(EntryBody::Literal(content)),
            (None, None, None) => Err(ManifestError::Invalid(format!(
                "file '{}' needs one of source, template, content",
                self.path
            ))),
            _ => Err(ManifestError::Invalid(format!(
                "file '{}' sets more than one of source, template, content",
                self.path
            ))),
        }
    }

    /// Commit message for this entry, defaulting to `Update <path>`.
    pub fn commit_message(&self) -> String {
        self.message
            .clone()
            .unwrap_or_else(|| format!("Update {}", self.path))
    }
}

// ---------------------------------------------------------------------------
// 2. Load
// ---------------------------------------------------------------------------

/// Load and validate the manifest at `path`.
///
/// Returns `ManifestError::NotFound` if absent,
/// `ManifestError::Parse` (with path + line context) if malformed YAML,
/// `ManifestError::Invalid` if a manifest rule is broken.
pub fn load(path: &Path) -> Result<Manifest, ManifestError> {
    if !path.exists() {
        return Err(ManifestError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    let manifest: Manifest = serde_yaml::from_str(&contents).map_err(|e| ManifestError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;
    manifest.validate()?;
    Ok(manifest)
}

/// Directory that relative `source:` entries resolve against.
pub fn base_dir(manifest_path: &Path) -> PathBuf {
    match manifest_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

impl Manifest {
    /// Check rules that serde cannot express.
    pub fn validate(&self) -> Result<(), ManifestError> {
        self.repository
            .validate()
            .map_err(|e| ManifestError::Invalid(e.to_string()))?;
        if let Some(branch) = &self.branch {
            if branch.trim().is_empty() {
                return Err(ManifestError::Invalid("branch must be non-empty".to_string()));
            }
        }
        if self.files.is_empty() {
            return Err(ManifestError::Invalid("no files declared".to_string()));
        }
        let mut seen = HashSet::new();
        for entry in &self.files {
            entry.body()?;
            if !seen.insert(entry.path.as_str()) {
                return Err(ManifestError::Invalid(format!(
                    "duplicate file path '{}'",
                    entry.path
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// 3. Save (atomic) + scaffold
// ---------------------------------------------------------------------------

/// Atomically write `manifest` to `path` via a `.tmp` sibling + rename.
pub fn save(path: &Path, manifest: &Manifest) -> Result<(), ManifestError> {
    let yaml = serde_yaml::to_string(manifest)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, yaml).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

/// Write a starter manifest for `repository`. Never overwrites.
pub fn scaffold(
    path: &Path,
    repository: RepoRef,
    branch: Option<String>,
) -> Result<Manifest, ManifestError> {
    if path.exists() {
        return Err(ManifestError::AlreadyExists {
            path: path.to_path_buf(),
        });
    }
    let readme = RepoPath::parse("README.md")
        .map_err(|e| ManifestError::Invalid(e.to_string()))?;
    let manifest = Manifest {
        repository,
        branch,
        settings: Settings::default(),
        vars: BTreeMap::new(),
        files: vec![FileEntry {
            path: readme,
            source: None,
            template: Some(
                "# {{ repository.name }}\n\nManaged by reposync.\n".to_string(),
            ),
            content: None,
            message: Some("Update README".to_string()),
        }],
    };
    manifest.validate()?;
    save(path, &manifest)?;
    Ok(manifest)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
