//! `reposync dispatch <owner/repo> <event-type> [--payload <json>]`

use anyhow::{Context, Result};
use clap::Args;

use reposync_core::RepoRef;

use super::RemoteArgs;

#[derive(Args, Debug)]
pub struct DispatchArgs {
    /// Target repository as `owner/name`.
    #[arg(value_parser = parse_repo)]
    pub repository: RepoRef,

    /// `event_type` seen by `on: repository_dispatch` workflows.
    pub event_type: String,

    /// JSON object delivered as `client_payload`.
    #[arg(long, default_value = "{}")]
    pub payload: String,

    #[command(flatten)]
    pub remote: RemoteArgs,
}

impl DispatchArgs {
    pub fn run(self) -> Result<()> {
        let payload: serde_json::Value =
            serde_json::from_str(&self.payload).context("--payload is not valid JSON")?;
        anyhow::ensure!(payload.is_object(), "--payload must be a JSON object");

        let client = self.remote.client()?;
        super::runtime()?
            .block_on(client.dispatch(&self.repository, &self.event_type, &payload))
            .with_context(|| format!("dispatch to '{}' failed", self.repository))?;

        println!(
            "✓ Dispatched '{}' to '{}'",
            self.event_type, self.repository
        );
        Ok(())
    }
}

fn parse_repo(s: &str) -> Result<RepoRef, String> {
    RepoRef::parse(s).ok_or_else(|| format!("expected owner/name, got '{s}'"))
}
