//! Error types for reposync-github.

use thiserror::Error;

use reposync_core::StoreError;

/// Errors that can occur when talking to the GitHub REST API.
#[derive(Debug, Error)]
pub enum GithubError {
    /// Token does not look like a personal access token.
    #[error("invalid GitHub token format: {0}")]
    InvalidToken(String),

    /// Base URL could not be parsed or cannot carry path segments.
    #[error("invalid API URL: {0}")]
    InvalidUrl(String),

    /// HTTP request failed before a response arrived.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// GitHub answered with an error status.
    #[error("GitHub API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Response body did not have the expected shape.
    #[error("failed to parse response: {0}")]
    Parse(String),
}

impl GithubError {
    pub fn status(&self) -> Option<u16> {
        match self {
            GithubError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<GithubError> for StoreError {
    fn from(err: GithubError) -> Self {
        match err {
            GithubError::Api { status, message } => StoreError::Status { status, message },
            GithubError::Parse(message) => StoreError::Decode(message),
            other => StoreError::Transport(Box::new(other)),
        }
    }
}

/// Result type for GitHub client operations.
pub type Result<T> = std::result::Result<T, GithubError>;
