//! GitHub skill source -- resolve a repository, fetch its manifest, and
//! download one skill's rule files.
//!
//! Repositories publish a `manifest.json` at the root of their default
//! branch plus one directory per skill:
//!
//! ```text
//! <raw>/manifest.json
//! <raw>/skills/<id>/README.md      (optional)
//! <raw>/skills/<id>/skill.yaml     (optional, only read when the manifest
//!                                   does not list rules)
//! <raw>/skills/<id>/<rule path>
//! ```
//!
//! Only the manifest and the requested entry are required.  README, the
//! YAML fallback and individual rule files degrade to empty on failure.

use std::sync::Arc;

use futures::future::join_all;
use ring::digest;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ManifestError, Result, SkillError};
use crate::fetch::{DEFAULT_MAX_RULES, Fetch};
use crate::manifest::{is_suspicious_rule_path, parse_manifest};
use crate::types::{Manifest, ManifestEntry, RulesContent, SkillDownload};

/// The only host repository references may point at.
pub const GITHUB_HOST: &str = "github.com";

/// Host serving raw file contents.
const RAW_HOST: &str = "https://raw.githubusercontent.com";

/// Branch used when none is given.
pub const DEFAULT_BRANCH: &str = "main";

/// A parsed `https://github.com/<owner>/<repo>` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
    pub branch: String,
}

impl RepoRef {
    /// Parse a repository URL.  The host must be exactly `github.com`.
    pub fn parse(repo_url: &str, branch: &str) -> Result<Self> {
        let parsed =
            Url::parse(repo_url).map_err(|_| SkillError::InvalidRepoUrl(repo_url.to_owned()))?;

        if !matches!(parsed.scheme(), "https" | "http") {
            return Err(SkillError::InvalidRepoUrl(repo_url.to_owned()));
        }

        let host = parsed.host_str().unwrap_or_default();
        if host != GITHUB_HOST {
            return Err(SkillError::HostNotAllowed {
                url: repo_url.to_owned(),
                host: host.to_owned(),
            });
        }

        let mut segments = parsed
            .path_segments()
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty());
        let (Some(owner), Some(repo)) = (segments.next(), segments.next()) else {
            return Err(SkillError::InvalidRepoUrl(repo_url.to_owned()));
        };
        let repo = repo.strip_suffix(".git").unwrap_or(repo);
        if repo.is_empty() {
            return Err(SkillError::InvalidRepoUrl(repo_url.to_owned()));
        }

        Ok(Self {
            owner: owner.to_owned(),
            repo: repo.to_owned(),
            branch: branch.to_owned(),
        })
    }

    /// `https://raw.githubusercontent.com/<owner>/<repo>/<branch>`.
    pub fn raw_base(&self) -> String {
        format!("{RAW_HOST}/{}/{}/{}", self.owner, self.repo, self.branch)
    }

    /// `https://github.com/<owner>/<repo>`.
    pub fn canonical_url(&self) -> String {
        format!("https://{GITHUB_HOST}/{}/{}", self.owner, self.repo)
    }
}

/// Client for one skills repository.
pub struct GitHubSource {
    repo: RepoRef,
    raw_base: String,
    fetcher: Arc<dyn Fetch>,
    max_rules: usize,
}

impl GitHubSource {
    /// Create a source for `repo_url` on the default branch.
    ///
    /// Fails without touching the network if the URL is not a GitHub
    /// repository.
    pub fn new(repo_url: &str, fetcher: Arc<dyn Fetch>) -> Result<Self> {
        Self::with_branch(repo_url, DEFAULT_BRANCH, fetcher)
    }

    /// Create a source for `repo_url` on `branch`.
    pub fn with_branch(repo_url: &str, branch: &str, fetcher: Arc<dyn Fetch>) -> Result<Self> {
        let repo = RepoRef::parse(repo_url, branch)?;
        let raw_base = repo.raw_base();
        Ok(Self {
            repo,
            raw_base,
            fetcher,
            max_rules: DEFAULT_MAX_RULES,
        })
    }

    /// Override the cap on rule files per skill.
    pub fn with_max_rules(mut self, max_rules: usize) -> Self {
        self.max_rules = max_rules;
        self
    }

    pub fn repo(&self) -> &RepoRef {
        &self.repo
    }

    pub fn repo_url(&self) -> String {
        self.repo.canonical_url()
    }

    pub fn raw_base(&self) -> &str {
        &self.raw_base
    }

    /// Fetch and validate `manifest.json`.
    pub async fn fetch_manifest(&self) -> Result<Manifest> {
        let url = format!("{}/manifest.json", self.raw_base);
        let response = self.fetcher.fetch(&url).await?.error_for_status()?;
        let manifest = parse_manifest(&response.body)?;
        debug!(url = %url, skills = manifest.skills.len(), "manifest validated");
        Ok(manifest)
    }

    /// Download everything needed to install `skill_id`.
    pub async fn download_skill(&self, skill_id: &str) -> Result<SkillDownload> {
        let manifest = self.fetch_manifest().await?;

        let Some(metadata) = manifest.find(skill_id).cloned() else {
            return Err(SkillError::SkillNotFound {
                id: skill_id.to_owned(),
                available: manifest.ids(),
            });
        };

        let skill_base = format!("{}/skills/{}", self.raw_base, skill_id);

        let readme = self
            .fetch_optional(&format!("{skill_base}/README.md"))
            .await
            .unwrap_or_default();

        let mut rules = self.resolve_rules(&skill_base, &metadata).await?;
        dedup_in_order(&mut rules);
        if rules.len() > self.max_rules {
            warn!(
                skill = %skill_id,
                resolved = rules.len(),
                max = self.max_rules,
                "too many rule files, truncating"
            );
            rules.truncate(self.max_rules);
        }

        let rules_content = self.fetch_rules(&skill_base, &rules).await;
        let content_hash = content_hash(&rules, &rules_content);

        info!(
            skill = %skill_id,
            resolved = rules.len(),
            fetched = rules_content.len(),
            "skill downloaded"
        );

        Ok(SkillDownload {
            metadata,
            readme,
            rules_content,
            content_hash,
        })
    }

    /// The rule list: the manifest's own list when non-empty, otherwise the
    /// `rules:` block of `skill.yaml`.  A present-but-empty manifest list
    /// also falls through to the YAML file.
    async fn resolve_rules(&self, skill_base: &str, metadata: &ManifestEntry) -> Result<Vec<String>> {
        if let Some(rules) = metadata.rules.as_ref().filter(|r| !r.is_empty()) {
            return Ok(rules.clone());
        }

        let Some(yaml) = self.fetch_optional(&format!("{skill_base}/skill.yaml")).await else {
            return Ok(Vec::new());
        };

        let rules = parse_rules_from_yaml(&yaml);
        if let Some(bad) = rules.iter().find(|r| is_suspicious_rule_path(r)) {
            return Err(ManifestError::SuspiciousRulePath {
                id: metadata.id.clone(),
                path: bad.clone(),
            }
            .into());
        }
        Ok(rules)
    }

    /// Fetch every rule concurrently; failures are dropped.  The result is
    /// ordered by `rules`, not by completion.
    async fn fetch_rules(&self, skill_base: &str, rules: &[String]) -> RulesContent {
        let fetches = rules.iter().map(|path| async move {
            let url = format!("{skill_base}/{path}");
            (path, self.fetch_optional(&url).await)
        });

        join_all(fetches)
            .await
            .into_iter()
            .filter_map(|(path, content)| content.map(|c| (path.clone(), c)))
            .collect()
    }

    /// Fetch a resource whose absence is not an error.
    async fn fetch_optional(&self, url: &str) -> Option<String> {
        match self.fetcher.fetch(url).await {
            Ok(response) if response.is_success() => Some(response.body),
            Ok(response) => {
                debug!(url, status = %response.status, "optional resource unavailable");
                None
            }
            Err(e) => {
                warn!(url, error = %e, "optional fetch failed");
                None
            }
        }
    }
}

/// SHA-256 over the fetched rule contents, in `order`, joined by `\n`.
///
/// Paths in `order` that were not fetched are skipped.  Iteration order of
/// `contents` itself is irrelevant.
pub fn content_hash(order: &[String], contents: &RulesContent) -> String {
    let joined = order
        .iter()
        .filter_map(|path| contents.get(path))
        .collect::<Vec<_>>()
        .join("\n");
    let hash = digest::digest(&digest::SHA256, joined.as_bytes());
    to_hex(hash.as_ref())
}

fn to_hex(bytes: &[u8]) -> String {
    use std::fmt::Write;
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut s, b| {
        let _ = write!(s, "{b:02x}");
        s
    })
}

fn dedup_in_order(rules: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    rules.retain(|r| seen.insert(r.clone()));
}

/// Extract the `rules:` list from a `skill.yaml`.
///
/// ```text
/// rules:
///   - rules/style.md
///   - "rules/naming.md"
/// ```
///
/// The block ends at the first non-blank line that is not indented.
pub fn parse_rules_from_yaml(content: &str) -> Vec<String> {
    let mut rules = Vec::new();
    let mut in_rules = false;

    for line in content.lines() {
        if !in_rules {
            in_rules = line.starts_with("rules:");
            continue;
        }

        let indented = line.starts_with([' ', '\t']);
        let item = line.trim_start().strip_prefix('-');
        match item {
            Some(rest) if indented && rest.starts_with([' ', '\t']) && !rest.trim().is_empty() => {
                let value = rest.trim();
                let value = value.strip_prefix(['"', '\'']).unwrap_or(value);
                let value = value.strip_suffix(['"', '\'']).unwrap_or(value);
                rules.push(value.to_owned());
            }
            _ if !line.trim().is_empty() && !indented => break,
            _ => {}
        }
    }

    rules
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
