//! Error types for reposync-sync.

use std::path::PathBuf;

use thiserror::Error;

use reposync_core::{ManifestError, PlaceholderId, RepoPath, RepoRefError, StoreError};
use reposync_renderer::RenderError;

/// Terminal outcome of one failed [`RemoteFileSync::sync_file`] call.
///
/// None of these is retried by the caller; the only retry is the single
/// bypass-then-resubmit cycle inside `sync_file`.
///
/// [`RemoteFileSync::sync_file`]: crate::remote::RemoteFileSync::sync_file
#[derive(Debug, Error)]
pub enum SyncFailure {
    /// The lookup failed for a reason other than "not found".
    #[error("lookup of '{path}' failed: {source}")]
    LookupFailed {
        path: RepoPath,
        #[source]
        source: StoreError,
    },

    /// The first write failed without a policy rejection.
    #[error("write of '{path}' rejected: {source}")]
    WriteRejectedNonPolicy {
        path: RepoPath,
        #[source]
        source: StoreError,
    },

    /// Policy rejection that offered nothing to bypass.
    #[error("write of '{path}' blocked by secret scanning; no bypass placeholder offered")]
    NoBypassAvailable { path: RepoPath },

    /// One bypass authorization failed; the rest were not attempted.
    #[error("bypass of placeholder {placeholder} for '{path}' failed: {source}")]
    BypassAuthorizationFailed {
        path: RepoPath,
        placeholder: PlaceholderId,
        #[source]
        source: StoreError,
    },

    /// The single post-bypass retry did not succeed.
    #[error("write of '{path}' failed after bypass: {cause}")]
    WriteFailedAfterBypass {
        path: RepoPath,
        #[source]
        cause: RetryFailure,
    },
}

impl SyncFailure {
    /// Stable snake_case name of the failure class.
    pub fn kind(&self) -> &'static str {
        match self {
            SyncFailure::LookupFailed { .. } => "lookup_failed",
            SyncFailure::WriteRejectedNonPolicy { .. } => "write_rejected_non_policy",
            SyncFailure::NoBypassAvailable { .. } => "no_bypass_available",
            SyncFailure::BypassAuthorizationFailed { .. } => "bypass_authorization_failed",
            SyncFailure::WriteFailedAfterBypass { .. } => "write_failed_after_bypass",
        }
    }

    pub fn path(&self) -> &RepoPath {
        match self {
            SyncFailure::LookupFailed { path, .. }
            | SyncFailure::WriteRejectedNonPolicy { path, .. }
            | SyncFailure::NoBypassAvailable { path }
            | SyncFailure::BypassAuthorizationFailed { path, .. }
            | SyncFailure::WriteFailedAfterBypass { path, .. } => path,
        }
    }
}

/// Why the post-bypass retry failed.
#[derive(Debug, Error)]
pub enum RetryFailure {
    #[error(transparent)]
    Store(StoreError),

    #[error("still blocked by secret scanning ({placeholders} placeholder(s) offered)")]
    StillRejected { placeholders: usize },
}

/// Errors from the manifest pipeline itself (not per-file remote failures).
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),

    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// Owner or name unsafe to use as a ledger path component.
    #[error("invalid repository: {0}")]
    InvalidRepository(#[from] RepoRefError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error (ledger).
    #[error("ledger JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
