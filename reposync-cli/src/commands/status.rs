//! `reposync status`: compare manifest entries with the local ledger.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use reposync_core::manifest;
use reposync_sync::{ledger, pipeline, FileState, FileStatus};

/// Arguments for `reposync status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Path to the manifest.
    pub manifest: PathBuf,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct StatusReportJson {
    repository: String,
    last_sync_at: Option<String>,
    summary: StatusSummaryJson,
    files: Vec<FileStatus>,
}

#[derive(Serialize)]
struct StatusSummaryJson {
    synced: usize,
    modified: usize,
    new: usize,
}

#[derive(Tabled)]
struct StatusTableRow {
    #[tabled(rename = "path")]
    path: String,
    #[tabled(rename = "status")]
    status: String,
    #[tabled(rename = "version")]
    version: String,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let home = super::home_dir()?;
        let manifest = manifest::load(&self.manifest)
            .with_context(|| format!("cannot load '{}'", self.manifest.display()))?;
        let base_dir = manifest::base_dir(&self.manifest);

        let files = pipeline::status_at(&home, &manifest, &base_dir)
            .with_context(|| format!("status check failed for '{}'", manifest.repository))?;
        let last_sync_at = if ledger::ledger_path_at(&home, &manifest.repository).exists() {
            let stored = ledger::load_at(&home, &manifest.repository)
                .context("failed to load sync ledger")?;
            Some(stored.synced_at.to_rfc3339())
        } else {
            None
        };

        let count = |state: FileState| files.iter().filter(|f| f.state == state).count();
        let summary = StatusSummaryJson {
            synced: count(FileState::Synced),
            modified: count(FileState::Modified),
            new: count(FileState::New),
        };

        if self.json {
            let payload = StatusReportJson {
                repository: manifest.repository.full_name(),
                last_sync_at,
                summary,
                files,
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).context("failed to serialize status JSON")?
            );
            return Ok(());
        }

        println!(
            "reposync v{} | {} | {} synced | {} modified | {} new",
            env!("CARGO_PKG_VERSION"),
            manifest.repository,
            summary.synced,
            summary.modified,
            summary.new,
        );
        println!(
            "Last sync: {}",
            last_sync_at.as_deref().unwrap_or("never")
        );

        let rows: Vec<StatusTableRow> = files
            .into_iter()
            .map(|f| StatusTableRow {
                path: f.path.to_string(),
                status: state_label(f.state),
                version: f.version.map(|v| short(&v.0)).unwrap_or_else(|| "-".into()),
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");

        if summary.modified + summary.new > 0 {
            println!(
                "Run 'reposync sync {}' to push pending files.",
                self.manifest.display()
            );
        }
        Ok(())
    }
}

fn state_label(state: FileState) -> String {
    match state {
        FileState::Synced => "SYNCED".green().to_string(),
        FileState::Modified => "MODIFIED".yellow().to_string(),
        FileState::New => "NEW".bright_black().to_string(),
    }
}

fn short(sha: &str) -> String {
    sha.chars().take(7).collect()
}
