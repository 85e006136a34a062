//! Skill installation for AI coding assistants.
//!
//! A *skill* is a set of markdown rule files plus metadata, published in a
//! GitHub repository's `manifest.json`.  This crate provides:
//!
//! - **Bounded fetcher** ([`fetch`]) -- HTTP GET with a timeout and a size
//!   cap, behind the [`Fetch`] trait.
//!
//! - **Manifest validator** ([`manifest`]) -- structural checks on untrusted
//!   manifest JSON, including suspicious rule paths.
//!
//! - **GitHub source** ([`github`]) -- resolves a repository URL, downloads
//!   the manifest, readme and rule files, and hashes the rule contents.
//!
//! - **Formatters** ([`format`]) -- render a skill for Claude, Cursor,
//!   OpenAI or Windsurf.
//!
//! - **Output guard** ([`guard`]) -- keeps every write inside the output
//!   directory.
//!
//! - **Installer** ([`installer`]) -- install, remove and list, recording
//!   state in `.skillsrc.json` via [`skillport_store`].
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use skillport_skills::{
//!     FormatterRegistry, HttpFetcher, InstallOptions, MarkerFileDetector, SkillInstaller,
//! };
//! use skillport_store::StateStore;
//!
//! # async fn run() -> skillport_skills::Result<()> {
//! let installer = SkillInstaller::new(
//!     Arc::new(HttpFetcher::new()),
//!     FormatterRegistry::builtin(),
//!     Box::new(MarkerFileDetector::new(".")),
//!     StateStore::in_dir("."),
//! );
//! let options = InstallOptions::new("https://github.com/acme/skills", "rust-style")
//!     .platform("cursor");
//! let result = installer.install(&options).await?;
//! println!("wrote {}", result.output_file.display());
//! # Ok(())
//! # }
//! ```

pub mod detect;
pub mod error;
pub mod fetch;
pub mod format;
pub mod github;
pub mod guard;
pub mod installer;
pub mod manifest;
pub mod types;

pub use detect::{Confidence, DetectPlatform, Detection, MarkerFileDetector};
pub use error::{ManifestError, Result, SkillError};
pub use fetch::{Fetch, FetchLimits, FetchResponse, HttpFetcher};
pub use format::{
    BareRulesFormatter, ConversationalFormatter, Formatter, FormatterRegistry,
    RichContextFormatter,
};
pub use github::{GitHubSource, RepoRef, content_hash, parse_rules_from_yaml};
pub use guard::resolve_output_path;
pub use installer::{InstallOptions, InstallResult, RemoveResult, SkillInstaller};
pub use manifest::{is_suspicious_rule_path, parse_manifest, validate_manifest};
pub use types::{
    Manifest, ManifestEntry, Platform, PlatformConfig, PlatformSetting, RulesContent, Skill,
    SkillDownload,
};
