pub mod create_repo;
pub mod dispatch;
pub mod init;
pub mod status;
pub mod sync;
pub mod whoami;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use reposync_github::{GithubClient, Token, DEFAULT_API_URL};

/// Credentials and endpoint shared by every command that talks to GitHub.
#[derive(Args, Debug)]
pub struct RemoteArgs {
    /// Personal access token (`ghp_...` or `github_pat_...`).
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// API root; override for GitHub Enterprise (`https://host/api/v3`).
    /// Defaults to the manifest's `settings.api_url` where there is one.
    #[arg(long, env = "REPOSYNC_API_URL")]
    pub api_url: Option<String>,
}

impl RemoteArgs {
    pub fn client(&self) -> Result<GithubClient> {
        self.client_or(DEFAULT_API_URL)
    }

    /// Like [`RemoteArgs::client`], falling back to `default_api_url` when
    /// neither `--api-url` nor `REPOSYNC_API_URL` is set.
    pub fn client_or(&self, default_api_url: &str) -> Result<GithubClient> {
        let api_url = self.api_url.as_deref().unwrap_or(default_api_url);
        client(api_url, self.token.as_deref())
    }
}

fn client(api_url: &str, token: Option<&str>) -> Result<GithubClient> {
    let raw = token.context("no token: pass --token or set GITHUB_TOKEN")?;
    let token = Token::parse(raw)?;
    GithubClient::new(api_url, token).with_context(|| format!("cannot use API URL '{api_url}'"))
}

pub(crate) fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().context("could not determine home directory")
}

/// Single-threaded runtime; every command issues its calls sequentially.
pub(crate) fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")
}
