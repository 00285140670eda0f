//! Manifest pipeline: resolve every entry, gate on the ledger, push changes.
//!
//! ## `run`: per manifest
//!
//! 1. Load the ledger for the target repository.
//! 2. [`plan`]: read, render, or take literally each entry's bytes and hash them.
//! 3. Skip entries whose digest matches the ledger for the target branch
//!    (unless forced).
//! 4. Push the rest one at a time through [`RemoteFileSync::sync_file`],
//!    pausing `file_delay_ms` between remote writes. A failing file is
//!    reported and the run moves on.
//! 5. Save the ledger if anything was written.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use reposync_core::{
    ContentStore, EntryBody, FileWriteRequest, Manifest, PlaceholderId, RepoPath, RepoRef,
    VersionToken,
};
use reposync_renderer::{Renderer, TemplateContext};

use crate::error::{io_err, SyncError};
use crate::ledger::{self, Ledger, LedgerEntry};
use crate::remote::{RemoteFileSync, SyncAction};

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

/// One manifest entry with its resolved bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedFile {
    pub path: RepoPath,
    pub content: Vec<u8>,
    pub digest: String,
    pub message: String,
    /// False when the ledger already holds this digest and the plan was not forced.
    pub changed: bool,
    /// Timestamp `content` was rendered with. Templates only.
    pub rendered_at: Option<DateTime<Utc>>,
}

/// Resolve every entry of `manifest` and compare it with `ledger` on the
/// manifest's branch.
///
/// `source:` paths resolve against `base_dir`. A template already in the
/// ledger is first rendered with the `generated_at` it was pushed with, so an
/// unchanged template stays unchanged; changed templates see `generated_at`.
pub fn plan(
    manifest: &Manifest,
    base_dir: &Path,
    ledger: &Ledger,
    force: bool,
    generated_at: DateTime<Utc>,
) -> Result<Vec<PlannedFile>, SyncError> {
    let renderer = Renderer::from_manifest(manifest)?;
    let branch = manifest.branch.as_deref();
    let render = |path: &RepoPath, at: DateTime<Utc>| -> Result<Vec<u8>, SyncError> {
        let ctx = TemplateContext::from_manifest(manifest, at);
        Ok(normalize(&renderer.render(path, &ctx)?))
    };

    let mut planned = Vec::with_capacity(manifest.files.len());
    for entry in &manifest.files {
        let recorded = ledger.entry(branch, entry.path.as_str());
        let mut rendered_at = None;
        let content = match entry.body()? {
            EntryBody::Source(source) => {
                let full = base_dir.join(source);
                std::fs::read(&full).map_err(|e| io_err(&full, e))?
            }
            EntryBody::Template(_) => {
                let at = recorded.and_then(|e| e.rendered_at).unwrap_or(generated_at);
                rendered_at = Some(at);
                render(&entry.path, at)?
            }
            EntryBody::Literal(text) => normalize(text),
        };
        let mut digest = ledger::digest(&content);
        let changed = force || !recorded.is_some_and(|e| e.digest == digest);

        let content = match rendered_at {
            Some(at) if changed && at != generated_at => {
                rendered_at = Some(generated_at);
                let fresh = render(&entry.path, generated_at)?;
                digest = ledger::digest(&fresh);
                fresh
            }
            _ => content,
        };

        planned.push(PlannedFile {
            path: entry.path.clone(),
            content,
            digest,
            message: entry.commit_message(),
            changed,
            rendered_at,
        });
    }
    Ok(planned)
}

/// Generated text is pushed with LF line endings.
fn normalize(text: &str) -> Vec<u8> {
    text.replace("\r\n", "\n").into_bytes()
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Outcome of an individual manifest entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteResult {
    Created {
        path: RepoPath,
        version: VersionToken,
        bypassed: Vec<PlaceholderId>,
    },
    Updated {
        path: RepoPath,
        version: VersionToken,
        bypassed: Vec<PlaceholderId>,
    },
    /// Content matches the ledger; nothing sent.
    Unchanged { path: RepoPath },
    /// Dry-run: the file *would* have been pushed.
    WouldWrite { path: RepoPath },
    /// `kind` is [`SyncFailure::kind`](crate::SyncFailure::kind).
    Failed {
        path: RepoPath,
        kind: &'static str,
        error: String,
    },
}

impl WriteResult {
    pub fn path(&self) -> &RepoPath {
        match self {
            WriteResult::Created { path, .. }
            | WriteResult::Updated { path, .. }
            | WriteResult::Unchanged { path }
            | WriteResult::WouldWrite { path }
            | WriteResult::Failed { path, .. } => path,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, WriteResult::Failed { .. })
    }
}

/// Outcome of syncing one manifest.
#[derive(Debug)]
pub struct SyncRunResult {
    pub repo: RepoRef,
    pub writes: Vec<WriteResult>,
}

impl SyncRunResult {
    pub fn written(&self) -> usize {
        self.writes
            .iter()
            .filter(|w| matches!(w, WriteResult::Created { .. } | WriteResult::Updated { .. }))
            .count()
    }

    pub fn unchanged(&self) -> usize {
        self.writes
            .iter()
            .filter(|w| matches!(w, WriteResult::Unchanged { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.writes.iter().filter(|w| w.is_failure()).count()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}

// ---------------------------------------------------------------------------
// Dry run and status
// ---------------------------------------------------------------------------

/// What `run` would do, without contacting the store or touching the ledger.
pub fn preview(
    home: &Path,
    manifest: &Manifest,
    base_dir: &Path,
    force: bool,
) -> Result<SyncRunResult, SyncError> {
    let ledger = ledger::load_at(home, &manifest.repository)?;
    let writes = plan(manifest, base_dir, &ledger, force, Utc::now())?
        .into_iter()
        .map(|p| {
            if p.changed {
                info!("[dry-run] would push: {}", p.path);
                WriteResult::WouldWrite { path: p.path }
            } else {
                WriteResult::Unchanged { path: p.path }
            }
        })
        .collect();
    Ok(SyncRunResult {
        repo: manifest.repository.clone(),
        writes,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileState {
    /// Ledger digest matches the local content.
    Synced,
    /// Pushed before, changed locally since.
    Modified,
    /// Never pushed.
    New,
}

/// Per-entry sync state as recorded in the local ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileStatus {
    pub path: RepoPath,
    pub state: FileState,
    /// Version token from the last successful push.
    pub version: Option<VersionToken>,
}

/// Compare every manifest entry with the ledger. Offline.
pub fn status_at(
    home: &Path,
    manifest: &Manifest,
    base_dir: &Path,
) -> Result<Vec<FileStatus>, SyncError> {
    let ledger = ledger::load_at(home, &manifest.repository)?;
    let planned = plan(manifest, base_dir, &ledger, false, Utc::now())?;
    Ok(planned
        .into_iter()
        .map(|p| {
            let recorded = ledger.entry(manifest.branch.as_deref(), p.path.as_str());
            let state = match recorded {
                None => FileState::New,
                Some(_) if p.changed => FileState::Modified,
                Some(_) => FileState::Synced,
            };
            FileStatus {
                path: p.path,
                state,
                version: recorded.map(|e| e.version.clone()),
            }
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// Push every changed entry of `manifest` through `syncer`.
///
/// Per-file remote failures land in [`WriteResult::Failed`]; only local
/// problems (manifest, render, I/O, ledger) abort the run.
pub async fn run<S: ContentStore>(
    home: &Path,
    manifest: &Manifest,
    base_dir: &Path,
    syncer: &RemoteFileSync<S>,
    force: bool,
) -> Result<SyncRunResult, SyncError> {
    let repo = &manifest.repository;
    let mut ledger = ledger::load_at(home, repo)?;
    let planned = plan(manifest, base_dir, &ledger, force, Utc::now())?;
    let file_delay = manifest.settings.file_delay();

    let mut writes = Vec::with_capacity(planned.len());
    let mut dirty = false;
    let mut contacted = false;

    for file in planned {
        if !file.changed {
            tracing::debug!("unchanged: {}", file.path);
            writes.push(WriteResult::Unchanged { path: file.path });
            continue;
        }
        if contacted {
            tokio::time::sleep(file_delay).await;
        }
        contacted = true;

        let mut request =
            FileWriteRequest::new(repo.clone(), file.path.clone(), file.content, file.message);
        request.branch = manifest.branch.clone();

        match syncer.sync_file(&request).await {
            Ok(report) => {
                let entry = LedgerEntry {
                    digest: file.digest,
                    version: report.version.clone(),
                    rendered_at: file.rendered_at,
                };
                ledger.record(manifest.branch.as_deref(), file.path.as_str(), entry);
                dirty = true;
                writes.push(match report.action {
                    SyncAction::Created => WriteResult::Created {
                        path: report.path,
                        version: report.version,
                        bypassed: report.bypassed,
                    },
                    SyncAction::Updated => WriteResult::Updated {
                        path: report.path,
                        version: report.version,
                        bypassed: report.bypassed,
                    },
                });
            }
            Err(failure) => {
                warn!(repo = %repo, kind = failure.kind(), "{failure}");
                writes.push(WriteResult::Failed {
                    path: file.path,
                    kind: failure.kind(),
                    error: failure.to_string(),
                });
            }
        }
    }

    if dirty {
        ledger::save_at(home, repo, &ledger)?;
    }

    Ok(SyncRunResult {
        repo: repo.clone(),
        writes,
    })
}
