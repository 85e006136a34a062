//! Shared helper functions used across CLI subcommands.
//!
//! Includes tracing initialization, installer construction, and output
//! formatting for installed-skill records.

use std::path::Path;
use std::sync::Arc;

use skillport_skills::{
    FetchLimits, FormatterRegistry, HttpFetcher, MarkerFileDetector, SkillInstaller,
};
use skillport_store::{InstalledSkill, StateStore};
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// Tracing
// ---------------------------------------------------------------------------

/// Initialize the tracing subscriber with the given default log level.
pub fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

// ---------------------------------------------------------------------------
// Installer
// ---------------------------------------------------------------------------

/// Build an installer rooted at `project_dir`: state lives in
/// `<project_dir>/.skillsrc.json` and platform detection looks in the same
/// directory.
pub fn build_installer(project_dir: &Path) -> SkillInstaller {
    let limits = FetchLimits::default();
    SkillInstaller::new(
        Arc::new(HttpFetcher::with_limits(limits)),
        FormatterRegistry::builtin(),
        Box::new(MarkerFileDetector::new(project_dir)),
        StateStore::in_dir(project_dir),
    )
    .with_max_rules(limits.max_rules)
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// First 16 hex digits of a content hash.
pub fn short_hash(hash: &str) -> &str {
    hash.get(..16).unwrap_or(hash)
}

/// Render one installed skill for `skills list`.
pub fn describe_installed(skill: &InstalledSkill) -> String {
    let installed = skill
        .installed_date()
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| skill.installed_at.clone());

    format!(
        "  * {} v{}\n    platform : {}\n    source   : {}\n    installed: {}",
        skill.id, skill.version, skill.platform, skill.source, installed
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
