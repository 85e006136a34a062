//! Skill type definitions.
//!
//! A skill is a bundle of markdown rule files plus metadata, published in a
//! repository's `manifest.json`.  The manifest types here are what remains
//! after validation; [`Skill`] is the fully hydrated value handed to a
//! formatter.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::SkillError;

/// The AI assistants skills can be installed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Claude project instructions.
    Claude,
    /// Cursor `.cursorrules`.
    Cursor,
    /// OpenAI custom instructions.
    OpenAi,
    /// Windsurf `.windsurfrules`.
    Windsurf,
}

impl Platform {
    /// Every platform, in canonical order.
    pub const ALL: [Platform; 4] = [Self::Claude, Self::Cursor, Self::OpenAi, Self::Windsurf];

    /// The key used on the command line and in the state file.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Claude => "claude",
            Self::Cursor => "cursor",
            Self::OpenAi => "openai",
            Self::Windsurf => "windsurf",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Platform {
    type Err = SkillError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.key() == s)
            .ok_or_else(|| SkillError::UnsupportedPlatform {
                platform: s.to_owned(),
                supported: Self::ALL.iter().map(|p| p.key().to_owned()).collect(),
            })
    }
}

/// Per-platform switch from a manifest entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformSetting {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adapter: Option<String>,
}

/// Normalized `platforms` field: platform name to its setting.
pub type PlatformConfig = BTreeMap<String, PlatformSetting>;

/// The two shapes `platforms` arrives in.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawPlatforms {
    List(Vec<String>),
    Map(BTreeMap<String, PlatformSetting>),
}

/// Read a field the validator does not check.  A value of the wrong type
/// becomes the default instead of failing the whole manifest.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Normalize either `["cursor", "claude"]` or
/// `{"cursor": {"enabled": true}}` into a [`PlatformConfig`].  Anything else
/// is treated as no platforms.
fn deserialize_platforms<'de, D>(deserializer: D) -> Result<PlatformConfig, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::from_value::<RawPlatforms>(serde_json::Value::deserialize(deserializer)?);
    Ok(match raw {
        Err(_) => PlatformConfig::new(),
        Ok(RawPlatforms::List(names)) => names
            .into_iter()
            .map(|name| {
                (
                    name,
                    PlatformSetting {
                        enabled: true,
                        adapter: None,
                    },
                )
            })
            .collect(),
        Ok(RawPlatforms::Map(map)) => map,
    })
}

/// One skill as listed in `manifest.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    pub id: String,
    pub name: String,
    pub version: String,
    #[serde(default, deserialize_with = "lenient")]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub category: String,
    #[serde(default, deserialize_with = "lenient")]
    pub subcategory: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient")]
    pub difficulty: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub license: Option<String>,
    #[serde(default, deserialize_with = "deserialize_platforms")]
    pub platforms: PlatformConfig,
    /// Rule files relative to `skills/<id>/`.  `None` when the manifest does
    /// not list them (the `skill.yaml` fallback applies).
    #[serde(default)]
    pub rules: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient")]
    pub rules_count: Option<u64>,
    /// Fields this tool does not interpret, kept verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A validated `manifest.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default, deserialize_with = "lenient")]
    pub version: String,
    #[serde(default, deserialize_with = "lenient")]
    pub generated: String,
    #[serde(default, deserialize_with = "lenient")]
    pub repository: String,
    #[serde(default, deserialize_with = "lenient")]
    pub count: u64,
    pub skills: Vec<ManifestEntry>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Manifest {
    /// Find a skill entry by id.
    pub fn find(&self, id: &str) -> Option<&ManifestEntry> {
        self.skills.iter().find(|s| s.id == id)
    }

    /// All skill ids in manifest order.
    pub fn ids(&self) -> Vec<String> {
        self.skills.iter().map(|s| s.id.clone()).collect()
    }
}

/// Fetched rule texts keyed by rule path, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RulesContent {
    entries: Vec<(String, String)>,
}

impl RulesContent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the content for `path`.  A replaced entry keeps its
    /// original position.
    pub fn insert(&mut self, path: impl Into<String>, content: impl Into<String>) {
        let path = path.into();
        let content = content.into();
        match self.entries.iter_mut().find(|(p, _)| *p == path) {
            Some(entry) => entry.1 = content,
            None => self.entries.push((path, content)),
        }
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, c)| c.as_str())
    }

    /// `(path, content)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(p, c)| (p.as_str(), c.as_str()))
    }

    /// Contents only, in insertion order.
    pub fn contents(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(_, c)| c.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<P: Into<String>, C: Into<String>> FromIterator<(P, C)> for RulesContent {
    fn from_iter<I: IntoIterator<Item = (P, C)>>(iter: I) -> Self {
        let mut rules = Self::new();
        for (path, content) in iter {
            rules.insert(path, content);
        }
        rules
    }
}

/// Everything downloaded for one skill.
#[derive(Debug, Clone)]
pub struct SkillDownload {
    pub metadata: ManifestEntry,
    pub readme: String,
    pub rules_content: RulesContent,
    /// Hex SHA-256, see [`crate::github::content_hash`].
    pub content_hash: String,
}

/// A fully hydrated skill, built once per install and consumed by exactly
/// one formatter.
#[derive(Debug, Clone)]
pub struct Skill {
    pub id: String,
    pub name: String,
    pub version: String,
    pub author: Option<String>,
    pub category: String,
    pub subcategory: Option<String>,
    pub tags: Vec<String>,
    pub description: String,
    pub difficulty: Option<String>,
    pub license: Option<String>,
    pub rules: Option<Vec<String>>,
    pub platforms: PlatformConfig,
    pub readme: String,
    pub rules_content: RulesContent,
    /// Virtual install path, `skills/<id>`.
    pub path: String,
}

impl Skill {
    /// Assemble a skill from a manifest entry and its downloaded content.
    pub fn from_download(download: SkillDownload) -> Self {
        let SkillDownload {
            metadata,
            readme,
            rules_content,
            ..
        } = download;
        let path = format!("skills/{}", metadata.id);
        Self {
            id: metadata.id,
            name: metadata.name,
            version: metadata.version,
            author: metadata.author,
            category: metadata.category,
            subcategory: metadata.subcategory,
            tags: metadata.tags,
            description: metadata.description,
            difficulty: metadata.difficulty,
            license: metadata.license,
            rules: metadata.rules,
            platforms: metadata.platforms,
            readme,
            rules_content,
            path,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
