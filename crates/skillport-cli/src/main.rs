//! CLI entry point for skillport.
//!
//! This binary provides the `skills` command with subcommands for
//! installing, listing, and removing skills in the current project.

mod cli;
mod helpers;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use skillport_skills::{InstallOptions, SkillError};
use tracing::debug;

use crate::cli::{Cli, Commands};
use crate::helpers::{build_installer, describe_installed, init_tracing, short_hash};

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(if cli.verbose { "debug" } else { "warn" });

    let cwd = std::env::current_dir().context("failed to read current directory")?;
    debug!(cwd = %cwd.display(), "starting");

    match cli.command {
        Commands::Add {
            repo_url,
            skill,
            platform,
            output,
            branch,
        } => {
            let options = InstallOptions {
                repo_url,
                skill_id: skill,
                platform,
                output_dir: output,
                branch: Some(branch),
            };
            cmd_add(&cwd, options).await
        }
        Commands::List => cmd_list(&cwd),
        Commands::Remove { skill_id, output } => cmd_remove(&cwd, &skill_id, &output).await,
    }
}

// ---------------------------------------------------------------------------
// Subcommand: add
// ---------------------------------------------------------------------------

async fn cmd_add(cwd: &Path, options: InstallOptions) -> Result<()> {
    let installer = build_installer(cwd);

    let result = match installer.install(&options).await {
        Ok(result) => result,
        Err(e @ SkillError::PlatformNotDetected { .. }) => {
            eprintln!(
                "  Example: skills add {} --skill {} --platform cursor",
                options.repo_url, options.skill_id
            );
            return Err(e.into());
        }
        Err(e) => {
            return Err(e).with_context(|| format!("failed to install `{}`", options.skill_id));
        }
    };

    println!();
    println!("  [+] Installed {} v{}", result.skill_name, result.version);
    println!("      Platform : {}", result.platform);
    println!("      File     : {}", result.output_file.display());
    println!("      Config   : {}", result.config_path.display());
    println!("      Integrity: sha-256 {}...", short_hash(&result.content_hash));
    println!();

    Ok(())
}

// ---------------------------------------------------------------------------
// Subcommand: list
// ---------------------------------------------------------------------------

fn cmd_list(cwd: &Path) -> Result<()> {
    let installer = build_installer(cwd);
    let skills = installer.list().context("failed to read installed skills")?;

    println!();
    println!("  Installed Skills");
    println!();

    if skills.is_empty() {
        println!("  [!] No skills installed yet");
        println!();
        println!("  Install a skill with:");
        println!("    skills add https://github.com/<owner>/<repo> --skill <id>");
        println!();
        return Ok(());
    }

    for skill in &skills {
        println!("{}", describe_installed(skill));
        println!();
    }

    println!("  Total: {} skill(s)", skills.len());
    println!();
    println!("  Remove a skill with:");
    println!("    skills remove <skill-id>");
    println!();

    Ok(())
}

// ---------------------------------------------------------------------------
// Subcommand: remove
// ---------------------------------------------------------------------------

async fn cmd_remove(cwd: &Path, skill_id: &str, output: &Path) -> Result<()> {
    let installer = build_installer(cwd);

    let removed = installer
        .remove(skill_id, output)
        .await
        .with_context(|| format!("failed to remove `{skill_id}`"))?;

    if let Some(path) = &removed.removed_file {
        println!("  [+] Removed file: {}", path.display());
    }
    println!();
    println!("  [+] Removed skill: {} v{}", removed.record.id, removed.record.version);
    println!();

    Ok(())
}
