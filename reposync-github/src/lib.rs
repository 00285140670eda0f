//! # reposync-github
//!
//! GitHub REST implementation of the reposync [`ContentStore`]
//! (contents API + secret-scanning push-protection bypasses), plus the
//! account-level calls the CLI exposes: `whoami`, repository creation and
//! `repository_dispatch`.
//!
//! [`ContentStore`]: reposync_core::ContentStore

pub mod client;
pub mod error;
pub mod token;
pub mod wire;

pub use client::GithubClient;
pub use reposync_core::manifest::DEFAULT_API_URL;
pub use error::GithubError;
pub use token::Token;
pub use wire::{NewRepository, Repository, User};
