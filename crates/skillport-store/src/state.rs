//! The `.skillsrc.json` state file.
//!
//! Records which skills were installed into a project, from where, for which
//! platform and with which content hash.  Records are keyed by skill id:
//! installing a skill again replaces its record instead of adding another.
//!
//! Reading is forgiving about missing or mistyped optional fields but refuses
//! a file that is not a JSON object at all.  Writing never drops what was
//! read: unreadable records and unknown keys go back to disk unchanged.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};

/// File name of the state file inside a project directory.
pub const STATE_FILENAME: &str = ".skillsrc.json";

/// Platform value meaning "detect on every install".
pub const AUTO_PLATFORM: &str = "auto";

/// Hash algorithm label written next to every content hash.
pub const CONTENT_HASH_ALGORITHM: &str = "sha-256";

/// One installed skill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstalledSkill {
    /// Skill id, unique within the state file.
    pub id: String,
    /// Version string from the manifest at install time.
    pub version: String,
    /// Repository URL the skill came from, as given on the command line.
    pub source: String,
    /// RFC 3339 installation timestamp.
    pub installed_at: String,
    /// Platform key the skill was rendered for.
    pub platform: String,
    /// Hex SHA-256 over the installed rule contents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
    /// Always [`CONTENT_HASH_ALGORITHM`] when `content_hash` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash_algorithm: Option<String>,
}

impl InstalledSkill {
    /// The installation date, if the timestamp parses.
    pub fn installed_date(&self) -> Option<chrono::NaiveDate> {
        chrono::DateTime::parse_from_rfc3339(&self.installed_at)
            .ok()
            .map(|dt| dt.date_naive())
    }
}

/// Full contents of the state file.
///
/// Everything read from disk is written back: records that fail to parse
/// and top-level keys this tool does not know are carried along verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillsConfig {
    /// Preferred platform key or [`AUTO_PLATFORM`].
    pub platform: String,
    /// Default output directory.
    pub output_path: String,
    /// Installed skills in insertion order.
    pub installed_skills: Vec<InstalledSkill>,
    /// Records that could not be read, kept as-is and written after the
    /// readable ones.
    pub unreadable_skills: Vec<Value>,
    /// Top-level keys other than `platform`, `outputPath` and
    /// `installedSkills`.
    pub extra: Map<String, Value>,
}

impl Default for SkillsConfig {
    fn default() -> Self {
        Self {
            platform: AUTO_PLATFORM.to_owned(),
            output_path: ".".to_owned(),
            installed_skills: Vec::new(),
            unreadable_skills: Vec::new(),
            extra: Map::new(),
        }
    }
}

impl SkillsConfig {
    /// Find an installed skill by id.
    pub fn find(&self, id: &str) -> Option<&InstalledSkill> {
        self.installed_skills.iter().find(|s| s.id == id)
    }

    /// Installed ids in insertion order.
    pub fn installed_ids(&self) -> Vec<String> {
        self.installed_skills.iter().map(|s| s.id.clone()).collect()
    }

    /// Drop every record, readable or not, whose id is `id`.  Returns the
    /// number of records dropped.
    fn retain_other_ids(&mut self, id: &str) -> usize {
        let before = self.installed_skills.len() + self.unreadable_skills.len();
        self.installed_skills.retain(|s| s.id != id);
        self.unreadable_skills.retain(|v| raw_id(v) != Some(id));
        before - self.installed_skills.len() - self.unreadable_skills.len()
    }

    /// The JSON document written to disk.
    pub fn to_value(&self) -> StoreResult<Value> {
        let mut skills = self
            .installed_skills
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        skills.extend(self.unreadable_skills.iter().cloned());

        let mut obj = self.extra.clone();
        obj.insert("platform".into(), Value::String(self.platform.clone()));
        obj.insert("outputPath".into(), Value::String(self.output_path.clone()));
        obj.insert("installedSkills".into(), Value::Array(skills));
        Ok(Value::Object(obj))
    }
}

fn raw_id(record: &Value) -> Option<&str> {
    record.get("id").and_then(Value::as_str)
}

/// Reads and writes one state file.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    /// Use the state file at an explicit path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Use [`STATE_FILENAME`] inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(STATE_FILENAME))
    }

    /// Path of the underlying state file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the state file exists on disk.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the state file, returning defaults when it does not exist.
    pub fn load(&self) -> StoreResult<SkillsConfig> {
        if !self.exists() {
            debug!(path = %self.path.display(), "state file missing, using defaults");
            return Ok(SkillsConfig::default());
        }

        let content = std::fs::read_to_string(&self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;

        let value: Value = serde_json::from_str(&content).map_err(|e| StoreError::Corrupt {
            path: self.path.clone(),
            reason: format!("invalid JSON: {e}"),
        })?;

        self.interpret(value)
    }

    /// Overwrite the state file with `config`.
    pub fn save(&self, config: &SkillsConfig) -> StoreResult<()> {
        let json = serde_json::to_string_pretty(&config.to_value()?)?;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(&self.path, json).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        debug!(path = %self.path.display(), "state file written");
        Ok(())
    }

    /// Installed skills in insertion order.
    pub fn list(&self) -> StoreResult<Vec<InstalledSkill>> {
        Ok(self.load()?.installed_skills)
    }

    /// Insert `skill`, replacing any existing record with the same id.
    pub fn upsert(&self, skill: InstalledSkill) -> StoreResult<()> {
        let mut config = self.load()?;
        config.retain_other_ids(&skill.id);
        config.installed_skills.push(skill);
        self.save(&config)
    }

    /// Remove the record for `id`.  Returns `false` (and leaves the file
    /// untouched) when no such record exists.
    pub fn remove(&self, id: &str) -> StoreResult<bool> {
        let mut config = self.load()?;
        if config.retain_other_ids(id) == 0 {
            return Ok(false);
        }
        self.save(&config)?;
        Ok(true)
    }

    fn interpret(&self, value: Value) -> StoreResult<SkillsConfig> {
        let Value::Object(mut obj) = value else {
            return Err(StoreError::Corrupt {
                path: self.path.clone(),
                reason: "top-level value is not an object".into(),
            });
        };

        let platform = match obj.remove("platform") {
            Some(Value::String(s)) => s,
            _ => AUTO_PLATFORM.to_owned(),
        };
        let output_path = match obj.remove("outputPath") {
            Some(Value::String(s)) => s,
            _ => ".".to_owned(),
        };

        let mut installed_skills = Vec::new();
        let mut unreadable_skills = Vec::new();
        if let Some(Value::Array(items)) = obj.remove("installedSkills") {
            for item in items {
                match serde_json::from_value::<InstalledSkill>(item.clone()) {
                    Ok(skill) => installed_skills.push(skill),
                    Err(e) => {
                        warn!(
                            path = %self.path.display(),
                            id = raw_id(&item).unwrap_or("?"),
                            error = %e,
                            "ignoring unreadable installed-skill record"
                        );
                        unreadable_skills.push(item);
                    }
                }
            }
        }

        Ok(SkillsConfig {
            platform,
            output_path,
            installed_skills,
            unreadable_skills,
            extra: obj,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
