//! The remote content-store collaborator.
//!
//! Every call returns a tagged outcome instead of encoding expected states as
//! errors: a missing file is [`Lookup::NotFound`] and a secret-scanning refusal
//! is [`PutOutcome::PolicyRejected`]. Only genuinely failed calls are `Err`.

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{
    BypassPlaceholder, BypassReason, ExistingFileHandle, FileWriteRequest, PlaceholderId,
    RepoPath, RepoRef, VersionToken,
};

/// Result of looking a path up in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(ExistingFileHandle),
    NotFound,
}

/// Result of a write the store did not fail outright.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PutOutcome {
    /// Content accepted; `version` identifies the new revision.
    Written { version: VersionToken },
    /// Content blocked by policy. May carry zero placeholders.
    PolicyRejected { placeholders: Vec<BypassPlaceholder> },
}

/// A store call that failed for a reason other than the tagged outcomes.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store answered with an error response.
    #[error("store returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The response could not be understood.
    #[error("unexpected store response: {0}")]
    Decode(String),
}

impl StoreError {
    /// HTTP-like status code, when the store answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            StoreError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Capabilities `RemoteFileSync` needs from a remote content store.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Fetch the handle for `path`, or `NotFound`.
    async fn get_file(
        &self,
        repo: &RepoRef,
        path: &RepoPath,
        branch: Option<&str>,
    ) -> Result<Lookup, StoreError>;

    /// Create (no `expected`) or update (with `expected`) one file.
    async fn put_file(
        &self,
        request: &FileWriteRequest,
        expected: Option<&VersionToken>,
    ) -> Result<PutOutcome, StoreError>;

    /// Consume one placeholder so the blocked content may be resubmitted.
    async fn authorize_bypass(
        &self,
        repo: &RepoRef,
        placeholder: &PlaceholderId,
        reason: BypassReason,
    ) -> Result<(), StoreError>;
}

#[async_trait]
impl<S: ContentStore + ?Sized> ContentStore for &S {
    async fn get_file(
        &self,
        repo: &RepoRef,
        path: &RepoPath,
        branch: Option<&str>,
    ) -> Result<Lookup, StoreError> {
        (**self).get_file(repo, path, branch).await
    }

    async fn put_file(
        &self,
        request: &FileWriteRequest,
        expected: Option<&VersionToken>,
    ) -> Result<PutOutcome, StoreError> {
        (**self).put_file(request, expected).await
    }

    async fn authorize_bypass(
        &self,
        repo: &RepoRef,
        placeholder: &PlaceholderId,
        reason: BypassReason,
    ) -> Result<(), StoreError> {
        (**self).authorize_bypass(repo, placeholder, reason).await
    }
}
