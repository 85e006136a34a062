//! Skill installer -- install, remove, and list skills in a project.
//!
//! The installer ties the pieces together: it picks a platform, downloads
//! the skill through a [`GitHubSource`], renders it with the platform's
//! formatter, writes the result inside the output directory, and records
//! the install in the project's state file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use skillport_store::{CONTENT_HASH_ALGORITHM, InstalledSkill, StateStore};
use tracing::{debug, info};

use crate::detect::DetectPlatform;
use crate::error::{Result, SkillError};
use crate::fetch::{DEFAULT_MAX_RULES, Fetch};
use crate::format::FormatterRegistry;
use crate::github::{DEFAULT_BRANCH, GitHubSource};
use crate::guard::resolve_output_path;
use crate::types::{Platform, Skill};

/// Parameters for a single install.
#[derive(Debug, Clone)]
pub struct InstallOptions {
    pub repo_url: String,
    pub skill_id: String,
    /// Platform key; auto-detected when `None`.
    pub platform: Option<String>,
    pub output_dir: PathBuf,
    /// Branch to read from; `main` when `None`.
    pub branch: Option<String>,
}

impl InstallOptions {
    pub fn new(repo_url: impl Into<String>, skill_id: impl Into<String>) -> Self {
        Self {
            repo_url: repo_url.into(),
            skill_id: skill_id.into(),
            platform: None,
            output_dir: PathBuf::from("."),
            branch: None,
        }
    }

    pub fn platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }
}

/// Summary of a completed install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallResult {
    pub skill_name: String,
    pub version: String,
    pub platform: Platform,
    pub output_file: PathBuf,
    pub config_path: PathBuf,
    pub content_hash: String,
}

/// Summary of a completed removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveResult {
    pub record: InstalledSkill,
    /// The deleted output file, `None` if it was already gone.
    pub removed_file: Option<PathBuf>,
}

/// Installs skills into a project and keeps its state file current.
pub struct SkillInstaller {
    fetcher: Arc<dyn Fetch>,
    formatters: FormatterRegistry,
    detector: Box<dyn DetectPlatform>,
    store: StateStore,
    max_rules: usize,
}

impl SkillInstaller {
    pub fn new(
        fetcher: Arc<dyn Fetch>,
        formatters: FormatterRegistry,
        detector: Box<dyn DetectPlatform>,
        store: StateStore,
    ) -> Self {
        Self {
            fetcher,
            formatters,
            detector,
            store,
            max_rules: DEFAULT_MAX_RULES,
        }
    }

    /// Override the cap on rule files per skill.
    pub fn with_max_rules(mut self, max_rules: usize) -> Self {
        self.max_rules = max_rules;
        self
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn formatters(&self) -> &FormatterRegistry {
        &self.formatters
    }

    /// Install one skill.
    ///
    /// Platform selection, download, rendering and path resolution all
    /// complete before anything is written.  Writing the file and recording
    /// the install are two separate steps; a failure between them leaves
    /// the file without a record, which the next install of the same id
    /// repairs.
    pub async fn install(&self, options: &InstallOptions) -> Result<InstallResult> {
        let platform = self.select_platform(options.platform.as_deref())?;
        let formatter = self.formatters.for_platform(platform)?;

        let branch = options.branch.as_deref().unwrap_or(DEFAULT_BRANCH);
        let source = GitHubSource::with_branch(&options.repo_url, branch, self.fetcher.clone())?
            .with_max_rules(self.max_rules);

        info!(
            skill = %options.skill_id,
            repo = %source.repo_url(),
            platform = %platform,
            "installing skill"
        );

        let download = source.download_skill(&options.skill_id).await?;
        let content_hash = download.content_hash.clone();
        let skill = Skill::from_download(download);

        let rendered = formatter.render(&skill);
        let output_file = resolve_output_path(&options.output_dir, formatter.filename())?;

        if let Some(parent) = output_file.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| SkillError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        tokio::fs::write(&output_file, rendered.as_bytes())
            .await
            .map_err(|source| SkillError::Io {
                path: output_file.clone(),
                source,
            })?;
        debug!(path = %output_file.display(), bytes = rendered.len(), "wrote skill file");

        self.store.upsert(InstalledSkill {
            id: skill.id.clone(),
            version: skill.version.clone(),
            source: options.repo_url.clone(),
            installed_at: chrono::Utc::now().to_rfc3339(),
            platform: platform.key().to_owned(),
            content_hash: Some(content_hash.clone()),
            content_hash_algorithm: Some(CONTENT_HASH_ALGORITHM.to_owned()),
        })?;

        info!(
            skill = %skill.id,
            version = %skill.version,
            path = %output_file.display(),
            "skill installed"
        );

        Ok(InstallResult {
            skill_name: skill.name,
            version: skill.version,
            platform,
            output_file,
            config_path: self.store.path().to_path_buf(),
            content_hash,
        })
    }

    /// Remove an installed skill: delete its generated file, then its
    /// record.
    pub async fn remove(&self, skill_id: &str, output_dir: &Path) -> Result<RemoveResult> {
        let config = self.store.load()?;
        let Some(record) = config.find(skill_id).cloned() else {
            return Err(SkillError::NotInstalled {
                id: skill_id.to_owned(),
                installed: config.installed_ids(),
            });
        };

        let formatter = self.formatters.get(&record.platform)?;
        let path = resolve_output_path(output_dir, formatter.filename())?;

        let removed_file = match tokio::fs::remove_file(&path).await {
            Ok(()) => Some(path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "skill file already gone");
                None
            }
            Err(source) => return Err(SkillError::Io { path, source }),
        };

        self.store.remove(skill_id)?;
        info!(skill = %skill_id, "skill removed");

        Ok(RemoveResult {
            record,
            removed_file,
        })
    }

    /// Installed skills, in installation order.
    pub fn list(&self) -> Result<Vec<InstalledSkill>> {
        Ok(self.store.list()?)
    }

    /// Resolve the target platform.  An explicit key is validated against
    /// the registry; otherwise the detector decides.
    fn select_platform(&self, requested: Option<&str>) -> Result<Platform> {
        if let Some(key) = requested {
            return Ok(self.formatters.get(key)?.platform());
        }

        let detection = self.detector.detect();
        debug!(
            platform = ?detection.platform,
            confidence = %detection.confidence,
            evidence = ?detection.evidence,
            "platform detection"
        );
        detection
            .platform
            .filter(|p| self.formatters.is_supported(p.key()))
            .ok_or_else(|| SkillError::PlatformNotDetected {
                supported: self.formatters.supported_keys(),
            })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
