//! Personal access token handling.
//!
//! The raw value only leaves this type through [`Token::expose`], which the
//! client uses to build the `Authorization` header. Everything else sees
//! [`Token::masked`].

use std::fmt;

use crate::error::GithubError;

const ACCEPTED_PREFIXES: &[&str] = &["ghp_", "github_pat_"];

/// A GitHub personal access token (classic `ghp_` or fine-grained `github_pat_`).
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    /// Validate the token format. Surrounding whitespace is ignored.
    pub fn parse(raw: &str) -> Result<Self, GithubError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(GithubError::InvalidToken("token is empty".to_string()));
        }
        if !ACCEPTED_PREFIXES.iter().any(|p| raw.starts_with(p)) {
            return Err(GithubError::InvalidToken(format!(
                "expected a token starting with {}",
                ACCEPTED_PREFIXES.join(" or ")
            )));
        }
        Ok(Self(raw.to_owned()))
    }

    /// Token kind prefix followed by `***`; safe for logs and output.
    /// No character of the secret part is ever shown.
    pub fn masked(&self) -> String {
        let prefix = ACCEPTED_PREFIXES
            .iter()
            .find(|p| self.0.starts_with(*p))
            .copied()
            .unwrap_or_default();
        format!("{prefix}***")
    }

    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Token").field(&self.masked()).finish()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}
