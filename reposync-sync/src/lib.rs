//! # reposync-sync
//!
//! Idempotent remote file sync with a secret-scanning bypass retry, plus the
//! ledger-gated manifest pipeline built on top of it.
//!
//! Call [`RemoteFileSync::sync_file`] to create-or-update a single file, or
//! [`pipeline::run`] to push every changed entry of a manifest.

pub mod error;
pub mod ledger;
pub mod pipeline;
pub mod remote;

#[cfg(test)]
mod testing;

pub use error::{RetryFailure, SyncError, SyncFailure};
pub use ledger::{Ledger, LedgerEntry, DEFAULT_BRANCH_KEY};
pub use pipeline::{FileState, FileStatus, SyncRunResult, WriteResult};
pub use remote::{RemoteFileSync, SyncAction, SyncReport, DEFAULT_SETTLE_DELAY};
