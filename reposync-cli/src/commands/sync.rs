//! `reposync sync`: push every changed manifest entry.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use reposync_core::manifest;
use reposync_sync::{pipeline, RemoteFileSync, SyncRunResult, WriteResult};

use super::RemoteArgs;

/// Arguments for `reposync sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Path to the manifest.
    pub manifest: PathBuf,

    /// Show what would be pushed without contacting GitHub.
    #[arg(long)]
    pub dry_run: bool,

    /// Push entries even when the ledger says they are unchanged.
    #[arg(long)]
    pub force: bool,

    #[command(flatten)]
    pub remote: RemoteArgs,
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        let home = super::home_dir()?;
        let manifest = manifest::load(&self.manifest)
            .with_context(|| format!("cannot load '{}'", self.manifest.display()))?;
        let base_dir = manifest::base_dir(&self.manifest);
        tracing::debug!(
            repo = %manifest.repository,
            files = manifest.files.len(),
            base_dir = %base_dir.display(),
            "loaded manifest"
        );

        let result = if self.dry_run {
            pipeline::preview(&home, &manifest, &base_dir, self.force)
                .context("dry-run failed")?
        } else {
            let client = self.remote.client_or(&manifest.settings.api_url)?;
            let syncer = RemoteFileSync::from_settings(client, &manifest.settings);
            super::runtime()?
                .block_on(pipeline::run(&home, &manifest, &base_dir, &syncer, self.force))
                .with_context(|| format!("sync failed for '{}'", manifest.repository))?
        };

        print_results(&result, self.dry_run);
        if !result.is_success() {
            bail!("{} of {} file(s) failed", result.failed(), result.writes.len());
        }
        Ok(())
    }
}

fn print_results(result: &SyncRunResult, dry_run: bool) {
    let prefix = if dry_run { "[dry-run] " } else { "" };
    let repo = &result.repo;
    let pending = result
        .writes
        .iter()
        .filter(|w| matches!(w, WriteResult::WouldWrite { .. }))
        .count();

    if dry_run {
        println!(
            "{prefix}'{repo}': {pending} to push, {} unchanged",
            result.unchanged()
        );
    } else if result.is_success() {
        println!(
            "✓ '{repo}' synced ({} written, {} unchanged)",
            result.written(),
            result.unchanged()
        );
    } else {
        println!(
            "{} '{repo}' partially synced ({} written, {} unchanged, {} failed)",
            "✗".red(),
            result.written(),
            result.unchanged(),
            result.failed()
        );
    }

    for w in &result.writes {
        match w {
            WriteResult::Created { path, bypassed, .. } => {
                println!("  +  {path}{}", bypass_note(bypassed.len()))
            }
            WriteResult::Updated { path, bypassed, .. } => {
                println!("  ✎  {path}{}", bypass_note(bypassed.len()))
            }
            WriteResult::WouldWrite { path } => println!("  ~  {path}"),
            WriteResult::Unchanged { path } => println!("  ·  {path}"),
            WriteResult::Failed { path, error, .. } => {
                println!("  {}  {path}: {error}", "✗".red())
            }
        }
    }
}

fn bypass_note(count: usize) -> String {
    if count == 0 {
        String::new()
    } else {
        format!(" ({count} secret-scanning bypass(es))").yellow().to_string()
    }
}
