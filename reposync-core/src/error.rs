//! Error types for reposync-core.

use std::path::PathBuf;

use thiserror::Error;

/// Reasons a string is not a valid repository path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("repository path is empty")]
    Empty,

    #[error("repository path '{0}' must not start or end with '/'")]
    Unanchored(String),

    #[error("repository path '{0}' contains an empty segment")]
    EmptySegment(String),

    #[error("repository path '{0}' contains '.' or '..'")]
    Relative(String),

    #[error("repository path '{0}' contains a backslash; use '/'")]
    Backslash(String),
}

/// Reasons an owner or repository name is unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepoRefError {
    #[error("repository {field} is empty")]
    Empty { field: &'static str },

    #[error("repository {field} '{value}' cannot be '.' or '..'")]
    Dot { field: &'static str, value: String },

    #[error("repository {field} '{value}' contains '{ch}'; only letters, digits, '.', '-' and '_' are allowed")]
    InvalidChar {
        field: &'static str,
        value: String,
        ch: char,
    },
}

/// All errors that can arise from loading or scaffolding a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// Underlying I/O failure, with the file involved.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML serialization error (scaffold path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load: includes file path and line context from serde_yaml.
    #[error("failed to parse manifest at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The manifest file did not exist.
    #[error("manifest not found at {path}")]
    NotFound { path: PathBuf },

    /// `init` refused to clobber an existing manifest.
    #[error("manifest already exists at {path}")]
    AlreadyExists { path: PathBuf },

    /// Structurally valid YAML that violates a manifest rule.
    #[error("invalid manifest: {0}")]
    Invalid(String),
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ManifestError {
    ManifestError::Io {
        path: path.into(),
        source,
    }
}
