//! Error types for the skills subsystem.

use std::path::PathBuf;

/// Structural problems found while validating a remote manifest.
///
/// The first violation wins; a manifest that produces any of these is never
/// used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ManifestError {
    #[error("invalid manifest: response is not a JSON object")]
    NotAnObject,

    #[error("invalid manifest: missing `skills` field (array)")]
    MissingSkills,

    #[error("invalid manifest: skill entry at index {index} is not an object")]
    BadSkillShape { index: usize },

    #[error("invalid manifest: skill at index {index} has no non-empty string `id`")]
    MissingId { index: usize },

    #[error("invalid manifest: skill `{id}` has no string `name`")]
    MissingName { id: String },

    #[error("invalid manifest: skill `{id}` has no string `version`")]
    MissingVersion { id: String },

    #[error("invalid manifest: `rules` in skill `{id}` must be an array")]
    RulesNotArray { id: String },

    #[error("invalid manifest: rule path in skill `{id}` is not a string")]
    RuleNotString { id: String },

    #[error("suspicious rule path in skill `{id}`: `{path}`")]
    SuspiciousRulePath { id: String, path: String },

    #[error("invalid manifest: {0}")]
    Malformed(String),
}

/// Skill-specific errors.
#[derive(Debug, thiserror::Error)]
pub enum SkillError {
    #[error("invalid repository URL `{0}`: expected https://github.com/<owner>/<repo>")]
    InvalidRepoUrl(String),

    #[error("host not allowed: `{host}` in `{url}` (only github.com repositories are accepted)")]
    HostNotAllowed { url: String, host: String },

    #[error("request timed out: {url}")]
    Timeout { url: String },

    #[error("response too large ({size} bytes, max {limit}): {url}")]
    ResponseTooLarge { url: String, size: u64, limit: u64 },

    #[error("fetch failed ({status}): {url}")]
    Fetch { url: String, status: u16 },

    #[error("network error for {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("skill `{id}` not found in manifest; available: {}", available.join(", "))]
    SkillNotFound { id: String, available: Vec<String> },

    #[error("unsupported platform `{platform}`; supported: {}", supported.join(", "))]
    UnsupportedPlatform {
        platform: String,
        supported: Vec<String>,
    },

    #[error(
        "could not detect platform; specify it explicitly with --platform ({})",
        supported.join(", ")
    )]
    PlatformNotDetected { supported: Vec<String> },

    #[error("unsafe output filename `{0}`: contains parent-directory segments")]
    PathTraversal(String),

    #[error("output path outside the allowed directory: allowed `{allowed}`, got `{resolved}`")]
    OutsideOutputDir { allowed: PathBuf, resolved: PathBuf },

    #[error("skill `{id}` is not installed; installed: {}", installed.join(", "))]
    NotInstalled { id: String, installed: Vec<String> },

    #[error("state error: {0}")]
    Store(#[from] skillport_store::StoreError),

    #[error("io error on `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, SkillError>;
