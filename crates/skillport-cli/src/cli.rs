//! CLI argument definitions for skillport.
//!
//! All `clap` structures live here so that `main.rs` stays focused on
//! dispatching subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// skills -- install AI development skills from GitHub into your editor.
#[derive(Debug, Parser)]
#[command(
    name = "skills",
    version,
    about = "Install AI development skills from GitHub into your editor",
    long_about = "Downloads a skill (markdown rules plus metadata) from a GitHub repository's \
                  manifest.json and writes it in the format Claude, Cursor, OpenAI or \
                  Windsurf expects."
)]
pub struct Cli {
    /// Print debug logs (overridden by RUST_LOG).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Install a skill from a GitHub repository.
    Add {
        /// Repository URL, e.g. https://github.com/owner/skills.
        repo_url: String,

        /// Skill ID to install.
        #[arg(long)]
        skill: String,

        /// Target platform (claude, cursor, openai, windsurf).  Detected from
        /// marker files when omitted.
        #[arg(long, short)]
        platform: Option<String>,

        /// Output directory.
        #[arg(long, short, default_value = ".")]
        output: PathBuf,

        /// Branch to read the manifest from.
        #[arg(long, default_value = "main")]
        branch: String,
    },

    /// List locally installed skills.
    List,

    /// Remove an installed skill.
    Remove {
        /// The skill ID to remove.
        skill_id: String,

        /// Directory where skill files are installed.
        #[arg(long, short, default_value = ".")]
        output: PathBuf,
    },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
