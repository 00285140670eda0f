//! Idempotent create-or-update of one remote file, with a single
//! secret-scanning bypass cycle.
//!
//! ## `sync_file`: 5-step protocol
//!
//! 1. Look the path up; remember its version token if it exists.
//! 2. Write (attaching the token on update).
//! 3. On a policy rejection, authorize every offered placeholder in order.
//! 4. Sleep for the settle delay so the bypass propagates.
//! 5. Resubmit the identical write once. Whatever happens is final.

use std::time::Duration;

use tracing::{debug, info, warn};

use reposync_core::{
    BypassReason, ContentStore, FileWriteRequest, Lookup, PlaceholderId, PutOutcome, RepoPath,
    Settings, VersionToken,
};

use crate::error::{RetryFailure, SyncFailure};

pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(1500);

/// Whether the write created the file or replaced an existing revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    Created,
    Updated,
}

/// Outcome of a successful [`RemoteFileSync::sync_file`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub path: RepoPath,
    pub action: SyncAction,
    /// Token of the revision just written.
    pub version: VersionToken,
    /// Placeholders consumed to get the write through; usually empty.
    pub bypassed: Vec<PlaceholderId>,
}

/// Mediator over a [`ContentStore`] implementing the create-or-update flow.
#[derive(Debug)]
pub struct RemoteFileSync<S> {
    store: S,
    settle_delay: Duration,
    bypass_reason: BypassReason,
}

impl<S: ContentStore> RemoteFileSync<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            settle_delay: DEFAULT_SETTLE_DELAY,
            bypass_reason: BypassReason::default(),
        }
    }

    /// Settle delay and bypass reason taken from a manifest's settings.
    pub fn from_settings(store: S, settings: &Settings) -> Self {
        Self::new(store)
            .with_settle_delay(settings.settle_delay())
            .with_bypass_reason(settings.bypass_reason)
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn with_bypass_reason(mut self, reason: BypassReason) -> Self {
        self.bypass_reason = reason;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create `request.path` if absent, update it otherwise.
    ///
    /// At most two writes are issued: the first attempt and, only after every
    /// offered placeholder was authorized, one retry.
    pub async fn sync_file(&self, request: &FileWriteRequest) -> Result<SyncReport, SyncFailure> {
        let path = &request.path;

        // Step 1: lookup. NotFound is expected.
        let existing = match self
            .store
            .get_file(&request.repo, path, request.branch.as_deref())
            .await
        {
            Ok(Lookup::Found(handle)) => {
                debug!(path = %path, version = %handle.version, "remote file exists");
                Some(handle.version)
            }
            Ok(Lookup::NotFound) => {
                debug!(path = %path, "remote file absent");
                None
            }
            Err(source) => {
                return Err(SyncFailure::LookupFailed {
                    path: path.clone(),
                    source,
                })
            }
        };
        let action = if existing.is_some() {
            SyncAction::Updated
        } else {
            SyncAction::Created
        };

        // Step 2: first write.
        let placeholders = match self.store.put_file(request, existing.as_ref()).await {
            Ok(PutOutcome::Written { version }) => {
                info!(path = %path, ?action, version = %version, "synced");
                return Ok(SyncReport {
                    path: path.clone(),
                    action,
                    version,
                    bypassed: Vec::new(),
                });
            }
            Ok(PutOutcome::PolicyRejected { placeholders }) => placeholders,
            Err(source) => {
                return Err(SyncFailure::WriteRejectedNonPolicy {
                    path: path.clone(),
                    source,
                })
            }
        };

        // Step 3: authorize every placeholder; first failure aborts.
        if placeholders.is_empty() {
            warn!(path = %path, "blocked by policy with nothing to bypass");
            return Err(SyncFailure::NoBypassAvailable { path: path.clone() });
        }
        warn!(
            path = %path,
            placeholders = placeholders.len(),
            reason = %self.bypass_reason,
            "blocked by policy; requesting bypass"
        );
        let mut bypassed = Vec::with_capacity(placeholders.len());
        for placeholder in placeholders {
            if let Err(source) = self
                .store
                .authorize_bypass(&request.repo, &placeholder.id, self.bypass_reason)
                .await
            {
                return Err(SyncFailure::BypassAuthorizationFailed {
                    path: path.clone(),
                    placeholder: placeholder.id,
                    source,
                });
            }
            bypassed.push(placeholder.id);
        }

        // Step 4: let the bypass propagate.
        tokio::time::sleep(self.settle_delay).await;

        // Step 5: exactly one retry with the identical request.
        match self.store.put_file(request, existing.as_ref()).await {
            Ok(PutOutcome::Written { version }) => {
                info!(
                    path = %path,
                    ?action,
                    version = %version,
                    bypassed = bypassed.len(),
                    "synced after bypass"
                );
                Ok(SyncReport {
                    path: path.clone(),
                    action,
                    version,
                    bypassed,
                })
            }
            Ok(PutOutcome::PolicyRejected { placeholders }) => {
                Err(SyncFailure::WriteFailedAfterBypass {
                    path: path.clone(),
                    cause: RetryFailure::StillRejected {
                        placeholders: placeholders.len(),
                    },
                })
            }
            Err(source) => Err(SyncFailure::WriteFailedAfterBypass {
                path: path.clone(),
                cause: RetryFailure::Store(source),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{status, Call, ScriptedStore};
    use reposync_core::{RepoRef, StoreError};
    use tokio::time::Instant;

    fn request() -> FileWriteRequest {
        FileWriteRequest::new(
            RepoRef::new("octo", "demo"),
            RepoPath::parse(".github/workflows/ci.yml").unwrap(),
            "on: push\n",
            "Add workflow",
        )
    }

    fn syncer(store: ScriptedStore) -> RemoteFileSync<ScriptedStore> {
        RemoteFileSync::new(store)
    }

    #[tokio::test(start_paused = true)]
    async fn absent_file_is_created_without_token() {
        let sync = syncer(ScriptedStore::new());
        let report = sync.sync_file(&request()).await.expect("sync");

        assert_eq!(report.action, SyncAction::Created);
        assert_eq!(report.version, VersionToken::from("v1"));
        assert!(report.bypassed.is_empty());
        assert_eq!(
            sync.store().put_calls(),
            vec![Call::Put {
                path: ".github/workflows/ci.yml".into(),
                expected: None
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn existing_file_token_is_attached() {
        let sync = syncer(ScriptedStore::new().found("abc"));
        let report = sync.sync_file(&request()).await.expect("sync");

        assert_eq!(report.action, SyncAction::Updated);
        assert_eq!(
            sync.store().put_calls(),
            vec![Call::Put {
                path: ".github/workflows/ci.yml".into(),
                expected: Some("abc".into())
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn lookup_failure_is_fatal_and_skips_write() {
        let sync = syncer(ScriptedStore::new().lookup(Err(status(403, "forbidden"))));
        let err = sync.sync_file(&request()).await.unwrap_err();

        assert!(matches!(err, SyncFailure::LookupFailed { .. }), "got: {err}");
        assert_eq!(err.kind(), "lookup_failed");
        assert!(sync.store().put_calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn non_policy_rejection_is_not_retried() {
        let sync = syncer(
            ScriptedStore::new()
                .found("stale")
                .put(Err(status(409, "does not match"))),
        );
        let err = sync.sync_file(&request()).await.unwrap_err();

        let SyncFailure::WriteRejectedNonPolicy { source, .. } = &err else {
            panic!("expected WriteRejectedNonPolicy, got {err}");
        };
        assert_eq!(source.status(), Some(409));
        assert_eq!(sync.store().put_calls().len(), 1);
        assert!(sync.store().bypass_calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn empty_placeholder_set_means_no_bypass_and_no_retry() {
        let sync = syncer(ScriptedStore::new().rejected(&[]));
        let err = sync.sync_file(&request()).await.unwrap_err();

        assert!(matches!(err, SyncFailure::NoBypassAvailable { .. }), "got: {err}");
        assert_eq!(sync.store().put_calls().len(), 1);
        assert!(sync.store().bypass_calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn each_placeholder_is_authorized_once_then_one_retry() {
        let sync = syncer(ScriptedStore::new().found("abc").rejected(&["p1", "p2", "p3"]))
            .with_bypass_reason(BypassReason::UsedInTests);
        let report = sync.sync_file(&request()).await.expect("sync");

        let calls = sync.store().calls();
        let expected_put = Call::Put {
            path: ".github/workflows/ci.yml".into(),
            expected: Some("abc".into()),
        };
        let bypass = |id: &str| Call::Bypass {
            placeholder: id.into(),
            reason: BypassReason::UsedInTests,
        };
        assert_eq!(
            calls,
            vec![
                Call::Get {
                    path: ".github/workflows/ci.yml".into()
                },
                expected_put.clone(),
                bypass("p1"),
                bypass("p2"),
                bypass("p3"),
                expected_put,
            ]
        );
        assert_eq!(report.action, SyncAction::Updated);
        assert_eq!(
            report.bypassed,
            vec![
                PlaceholderId::from("p1"),
                PlaceholderId::from("p2"),
                PlaceholderId::from("p3")
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn bypass_failure_aborts_remaining_bypasses_and_retry() {
        let sync = syncer(
            ScriptedStore::new()
                .rejected(&["p1", "p2", "p3"])
                .bypass(Ok(()))
                .bypass(Err(status(404, "placeholder not found"))),
        );
        let err = sync.sync_file(&request()).await.unwrap_err();

        let SyncFailure::BypassAuthorizationFailed { placeholder, .. } = &err else {
            panic!("expected BypassAuthorizationFailed, got {err}");
        };
        assert_eq!(placeholder, &PlaceholderId::from("p2"));
        assert_eq!(sync.store().bypass_calls().len(), 2);
        assert_eq!(sync.store().put_calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_failure_is_final() {
        let sync = syncer(
            ScriptedStore::new()
                .rejected(&["p1"])
                .put(Err(status(500, "boom"))),
        );
        let err = sync.sync_file(&request()).await.unwrap_err();

        assert!(
            matches!(
                err,
                SyncFailure::WriteFailedAfterBypass {
                    cause: RetryFailure::Store(StoreError::Status { status: 500, .. }),
                    ..
                }
            ),
            "got: {err}"
        );
        assert_eq!(sync.store().put_calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_policy_rejection_is_final() {
        let sync = syncer(ScriptedStore::new().rejected(&["p1"]).rejected(&["p9"]));
        let err = sync.sync_file(&request()).await.unwrap_err();

        assert!(
            matches!(
                err,
                SyncFailure::WriteFailedAfterBypass {
                    cause: RetryFailure::StillRejected { placeholders: 1 },
                    ..
                }
            ),
            "got: {err}"
        );
        assert_eq!(sync.store().put_calls().len(), 2);
        assert_eq!(sync.store().bypass_calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_waits_for_settle_delay() {
        let delay = Duration::from_secs(2);
        let sync = syncer(ScriptedStore::new().rejected(&["p1"])).with_settle_delay(delay);

        let started = Instant::now();
        sync.sync_file(&request()).await.expect("sync");
        assert!(started.elapsed() >= delay);
    }

    #[tokio::test(start_paused = true)]
    async fn no_delay_without_rejection() {
        let sync = syncer(ScriptedStore::new()).with_settle_delay(Duration::from_secs(60));

        let started = Instant::now();
        sync.sync_file(&request()).await.expect("sync");
        assert!(started.elapsed() < Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_identical_sync_succeeds_without_bypass() {
        let sync = syncer(
            ScriptedStore::new()
                .put(Ok(PutOutcome::Written {
                    version: VersionToken::from("same"),
                }))
                .found("same")
                .put(Ok(PutOutcome::Written {
                    version: VersionToken::from("same"),
                })),
        );

        let first = sync.sync_file(&request()).await.expect("first");
        let second = sync.sync_file(&request()).await.expect("second");

        assert_eq!(first.action, SyncAction::Created);
        assert_eq!(second.action, SyncAction::Updated);
        assert_eq!(second.version, first.version);
        assert!(second.bypassed.is_empty());
        assert!(sync.store().bypass_calls().is_empty());
    }
}
