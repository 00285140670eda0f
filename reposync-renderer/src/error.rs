//! Error types for reposync-renderer.

use thiserror::Error;

/// All errors that can arise from template rendering operations.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Tera template engine error (syntax, missing variable, bad include).
    #[error("template engine error: {0}")]
    Tera(#[from] tera::Error),

    /// Render was requested for a template that was never registered.
    #[error("unknown template '{0}'")]
    UnknownTemplate(String),
}
