//! `reposync create-repo <name> [--public] [--description <d>]`

use anyhow::{Context, Result};
use clap::Args;

use reposync_github::NewRepository;

use super::RemoteArgs;

#[derive(Args, Debug)]
pub struct CreateRepoArgs {
    /// Name of the new repository.
    pub name: String,

    /// Make the repository public (private by default).
    #[arg(long)]
    pub public: bool,

    #[arg(long, short = 'd')]
    pub description: Option<String>,

    #[command(flatten)]
    pub remote: RemoteArgs,
}

impl CreateRepoArgs {
    pub fn run(self) -> Result<()> {
        let client = self.remote.client()?;
        let mut spec = NewRepository::private(&self.name);
        spec.private = !self.public;
        spec.description = self.description;

        let repo = super::runtime()?
            .block_on(client.create_repository(&spec))
            .with_context(|| format!("failed to create repository '{}'", self.name))?;

        let visibility = if repo.private { "private" } else { "public" };
        println!("✓ Created {visibility} repository '{}'", repo.full_name);
        if let Some(url) = repo.html_url {
            println!("  {url}");
        }
        Ok(())
    }
}
