//! reposync core library: domain types, the content-store seam, manifests.
//!
//! - [`types`]: newtypes and request/handle structs
//! - [`store`]: [`ContentStore`] trait and its tagged outcomes
//! - [`manifest`]: load / validate / scaffold
//! - [`error`]: [`ManifestError`], [`PathError`]

pub mod error;
pub mod manifest;
pub mod store;
pub mod types;

pub use error::{ManifestError, PathError, RepoRefError};
pub use manifest::{EntryBody, FileEntry, Manifest, Settings};
pub use store::{ContentStore, Lookup, PutOutcome, StoreError};
pub use types::{
    BypassPlaceholder, BypassReason, ExistingFileHandle, FileWriteRequest, PlaceholderId,
    RepoPath, RepoRef, VersionToken,
};
