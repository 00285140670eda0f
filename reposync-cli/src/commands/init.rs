//! `reposync init <manifest> --owner <o> --repo <r> [--branch <b>]`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use reposync_core::{manifest, RepoRef};

/// Write a starter manifest.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Where to write the manifest (e.g. `reposync.yaml`).
    pub manifest: PathBuf,

    /// Repository owner (user or organisation).
    #[arg(long, short = 'o')]
    pub owner: String,

    /// Repository name.
    #[arg(long, short = 'r')]
    pub repo: String,

    /// Target branch; the repository default when omitted.
    #[arg(long, short = 'b')]
    pub branch: Option<String>,
}

impl InitArgs {
    pub fn run(self) -> Result<()> {
        let repository = RepoRef::new(self.owner, self.repo);
        let full_name = repository.full_name();
        manifest::scaffold(&self.manifest, repository, self.branch).with_context(|| {
            format!("failed to write manifest '{}'", self.manifest.display())
        })?;

        println!("✓ Wrote manifest for '{full_name}'");
        println!("  Saved to: {}", self.manifest.display());
        Ok(())
    }
}
