//! `reposync whoami`: check a token by asking who it belongs to.

use anyhow::{Context, Result};
use clap::Args;

use super::RemoteArgs;

#[derive(Args, Debug)]
pub struct WhoamiArgs {
    #[command(flatten)]
    pub remote: RemoteArgs,
}

impl WhoamiArgs {
    pub fn run(self) -> Result<()> {
        let client = self.remote.client()?;
        let user = super::runtime()?
            .block_on(client.authenticated_user())
            .context("token was rejected")?;

        match user.name {
            Some(name) => println!("✓ Authenticated as {} ({name})", user.login),
            None => println!("✓ Authenticated as {}", user.login),
        }
        println!("  Token: {}", client.token().masked());
        Ok(())
    }
}
