//! Sync ledger: per-repository record of what was last pushed.
//!
//! Persists a [`Ledger`] JSON document at
//! `<home>/.reposync/ledger/<owner>/<repo>.json`. Entries are keyed by target
//! branch, then by remote path; writes without an explicit branch go under
//! [`DEFAULT_BRANCH_KEY`]. Saves are atomic (`.tmp` + rename).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use reposync_core::{RepoRef, VersionToken};

use crate::error::{io_err, SyncError};

/// Key for writes made without an explicit branch. Git refuses to create a
/// branch with this name, so it cannot collide with a real one.
pub const DEFAULT_BRANCH_KEY: &str = "HEAD";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerEntry {
    /// Lowercase hex SHA-256 of the content.
    pub digest: String,
    pub version: VersionToken,
    /// `generated_at` the pushed bytes were rendered with. Templates only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rendered_at: Option<DateTime<Utc>>,
}

impl LedgerEntry {
    pub fn new(digest: String, version: VersionToken) -> Self {
        Self {
            digest,
            version,
            rendered_at: None,
        }
    }
}

/// Remote path -> last push, for one branch.
pub type BranchFiles = BTreeMap<String, LedgerEntry>;

/// On-disk ledger payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ledger {
    pub synced_at: DateTime<Utc>,
    #[serde(default)]
    pub branches: BTreeMap<String, BranchFiles>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self {
            synced_at: Utc::now(),
            branches: BTreeMap::new(),
        }
    }
}

fn branch_key(branch: Option<&str>) -> &str {
    branch.unwrap_or(DEFAULT_BRANCH_KEY)
}

impl Ledger {
    pub fn entry(&self, branch: Option<&str>, path: &str) -> Option<&LedgerEntry> {
        self.branches.get(branch_key(branch))?.get(path)
    }

    /// Whether `path` on `branch` was last synced with exactly this `digest`.
    pub fn is_current(&self, branch: Option<&str>, path: &str, digest: &str) -> bool {
        self.entry(branch, path).is_some_and(|e| e.digest == digest)
    }

    pub fn record(&mut self, branch: Option<&str>, path: impl Into<String>, entry: LedgerEntry) {
        self.branches
            .entry(branch_key(branch).to_string())
            .or_default()
            .insert(path.into(), entry);
        self.synced_at = Utc::now();
    }
}

/// SHA-256 of `bytes`, lowercase hex.
pub fn digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// `<home>/.reposync/ledger/<owner>/<repo>.json`
pub fn ledger_path_at(home: &Path, repo: &RepoRef) -> PathBuf {
    home.join(".reposync")
        .join("ledger")
        .join(&repo.owner)
        .join(format!("{}.json", repo.name))
}

/// Load the ledger for `repo`. Missing file yields an empty ledger.
pub fn load_at(home: &Path, repo: &RepoRef) -> Result<Ledger, SyncError> {
    repo.validate()?;
    let path = ledger_path_at(home, repo);
    if !path.exists() {
        return Ok(Ledger::default());
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    Ok(serde_json::from_str(&contents)?)
}

/// Save the ledger for `repo` atomically.
pub fn save_at(home: &Path, repo: &RepoRef, ledger: &Ledger) -> Result<(), SyncError> {
    repo.validate()?;
    let path = ledger_path_at(home, repo);
    let Some(dir) = path.parent() else {
        return Err(io_err(path, std::io::Error::other("invalid ledger path")));
    };
    std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;

    let json = serde_json::to_string_pretty(ledger)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, &json).map_err(|e| io_err(&tmp, e))?;
    std::fs::rename(&tmp, &path).map_err(|e| io_err(&path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn repo() -> RepoRef {
        RepoRef::new("octo", "demo")
    }

    #[test]
    fn empty_ledger_when_file_missing() {
        let tmp = TempDir::new().unwrap();
        let ledger = load_at(tmp.path(), &repo()).unwrap();
        assert!(ledger.branches.is_empty());
    }

    #[test]
    fn path_is_namespaced_by_owner() {
        let path = ledger_path_at(Path::new("/home/u"), &repo());
        assert_eq!(path, Path::new("/home/u/.reposync/ledger/octo/demo.json"));
    }

    #[test]
    fn saved_entries_load_back() {
        let tmp = TempDir::new().unwrap();
        let mut ledger = Ledger::default();
        ledger.record(None, "README.md", LedgerEntry::new(digest(b"hello"), "abc".into()));

        save_at(tmp.path(), &repo(), &ledger).unwrap();
        let loaded = load_at(tmp.path(), &repo()).unwrap();
        assert_eq!(loaded.branches, ledger.branches);
        assert!(loaded.is_current(None, "README.md", &digest(b"hello")));
        assert!(!loaded.is_current(None, "README.md", &digest(b"changed")));
        assert!(!loaded.is_current(None, "other.md", &digest(b"hello")));
    }

    #[test]
    fn branches_are_tracked_separately() {
        let mut ledger = Ledger::default();
        ledger.record(Some("main"), "a.txt", LedgerEntry::new(digest(b"a"), "m1".into()));

        assert!(ledger.is_current(Some("main"), "a.txt", &digest(b"a")));
        assert!(!ledger.is_current(Some("dev"), "a.txt", &digest(b"a")));
        assert!(!ledger.is_current(None, "a.txt", &digest(b"a")));

        ledger.record(None, "a.txt", LedgerEntry::new(digest(b"a"), "d1".into()));
        assert_eq!(
            ledger.entry(None, "a.txt").map(|e| &e.version),
            Some(&VersionToken::from("d1"))
        );
        assert!(ledger.branches.contains_key(DEFAULT_BRANCH_KEY));
    }

    #[test]
    fn unsafe_repository_never_reaches_the_filesystem() {
        let tmp = TempDir::new().unwrap();
        let home = tmp.path().join("home");
        let evil = RepoRef::new("../../..", "demo");

        let err = save_at(&home, &evil, &Ledger::default()).unwrap_err();
        assert!(matches!(err, SyncError::InvalidRepository(_)), "got: {err}");
        assert!(load_at(&home, &evil).is_err());
        assert!(!tmp.path().join("demo.json").exists());
        assert!(!home.exists());
    }

    #[test]
    fn tmp_file_cleaned_up_after_save() {
        let tmp = TempDir::new().unwrap();
        save_at(tmp.path(), &repo(), &Ledger::default()).unwrap();
        let tmp_path = ledger_path_at(tmp.path(), &repo()).with_extension("json.tmp");
        assert!(!tmp_path.exists());
    }

    #[test]
    fn corrupt_ledger_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = ledger_path_at(tmp.path(), &repo());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(load_at(tmp.path(), &repo()), Err(SyncError::Json(_))));
    }

    #[test]
    fn digest_is_lowercase_sha256_hex() {
        assert_eq!(
            digest(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
