//! reposync: push declared files into a GitHub repository.
//!
//! # Usage
//!
//! ```text
//! reposync init <manifest> --owner <o> --repo <r> [--branch <b>]
//! reposync sync <manifest> [--dry-run] [--force] [--token <t>]
//! reposync status <manifest> [--json]
//! reposync whoami [--token <t>] [--api-url <url>]
//! reposync create-repo <name> [--public] [--description <d>] [--token <t>]
//! reposync dispatch <owner/repo> <event-type> [--payload <json>] [--token <t>]
//! ```
//!
//! Logs go to stderr; set `RUST_LOG=info` (or `debug`) for detail.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    create_repo::CreateRepoArgs, dispatch::DispatchArgs, init::InitArgs, status::StatusArgs,
    sync::SyncArgs, whoami::WhoamiArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "reposync",
    version,
    about = "Sync declared files into a GitHub repository, bypassing secret-scanning false positives",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a starter manifest.
    Init(InitArgs),

    /// Push every changed manifest entry to the remote repository.
    Sync(SyncArgs),

    /// Show which manifest entries differ from the last sync.
    Status(StatusArgs),

    /// Print the account the token authenticates as.
    Whoami(WhoamiArgs),

    /// Create a private repository for the authenticated user.
    CreateRepo(CreateRepoArgs),

    /// Fire a repository_dispatch event.
    Dispatch(DispatchArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Init(args) => args.run(),
        Commands::Sync(args) => args.run(),
        Commands::Status(args) => args.run(),
        Commands::Whoami(args) => args.run(),
        Commands::CreateRepo(args) => args.run(),
        Commands::Dispatch(args) => args.run(),
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
