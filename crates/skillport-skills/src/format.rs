//! Platform formatters -- render a [`Skill`] into the file a given AI
//! assistant reads.
//!
//! Each formatter is a pure function of the skill plus a fixed output
//! filename.  The set of formatters is an explicit [`FormatterRegistry`]
//! value handed to the installer; [`FormatterRegistry::builtin`] holds the
//! four supported platforms.

use std::sync::Arc;

use crate::error::{Result, SkillError};
use crate::types::{Platform, Skill};

/// Renders a skill for one platform.
pub trait Formatter: Send + Sync {
    /// The platform this formatter targets.
    fn platform(&self) -> Platform;

    /// Output filename, relative to the output directory.
    fn filename(&self) -> &str;

    /// Render the skill.  Never fails; missing optional fields are omitted.
    fn render(&self, skill: &Skill) -> String;
}

/// Push each rule's content followed by a blank line.
fn push_rules(out: &mut String, skill: &Skill) {
    for content in skill.rules_content.contents() {
        out.push_str(content);
        out.push_str("\n\n");
    }
}

// ---------------------------------------------------------------------------
// Rich context (Claude)
// ---------------------------------------------------------------------------

/// Full markdown document: title, metadata, description, tags, then each
/// rule as a guideline block.
#[derive(Debug, Clone)]
pub struct RichContextFormatter {
    platform: Platform,
    filename: String,
}

impl RichContextFormatter {
    pub fn new(platform: Platform, filename: impl Into<String>) -> Self {
        Self {
            platform,
            filename: filename.into(),
        }
    }
}

impl Formatter for RichContextFormatter {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn filename(&self) -> &str {
        &self.filename
    }

    fn render(&self, skill: &Skill) -> String {
        let mut out = String::with_capacity(1024);

        out.push_str(&format!("# {}\n\n", skill.name));
        out.push_str(&format!("**Version:** {}\n", skill.version));
        out.push_str(&format!("**Category:** {}\n", skill.category));
        if let Some(author) = skill.author.as_deref().filter(|a| !a.is_empty()) {
            out.push_str(&format!("**Author:** {author}\n"));
        }

        out.push_str("\n## Description\n\n");
        out.push_str(&skill.description);
        out.push_str("\n\n");

        if !skill.tags.is_empty() {
            let tags = skill
                .tags
                .iter()
                .map(|t| format!("`{t}`"))
                .collect::<Vec<_>>()
                .join(", ");
            out.push_str("## Tags\n\n");
            out.push_str(&tags);
            out.push_str("\n\n");
        }

        out.push_str("## Guidelines\n\n");
        push_rules(&mut out, skill);
        out
    }
}

// ---------------------------------------------------------------------------
// Bare rules (Cursor, Windsurf)
// ---------------------------------------------------------------------------

/// Rule contents only, no metadata.
#[derive(Debug, Clone)]
pub struct BareRulesFormatter {
    platform: Platform,
    filename: String,
}

impl BareRulesFormatter {
    pub fn new(platform: Platform, filename: impl Into<String>) -> Self {
        Self {
            platform,
            filename: filename.into(),
        }
    }
}

impl Formatter for BareRulesFormatter {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn filename(&self) -> &str {
        &self.filename
    }

    fn render(&self, skill: &Skill) -> String {
        let mut out = String::new();
        push_rules(&mut out, skill);
        out
    }
}

// ---------------------------------------------------------------------------
// Conversational (OpenAI)
// ---------------------------------------------------------------------------

/// Natural-language framing around the rules.
#[derive(Debug, Clone)]
pub struct ConversationalFormatter {
    platform: Platform,
    filename: String,
}

impl ConversationalFormatter {
    pub fn new(platform: Platform, filename: impl Into<String>) -> Self {
        Self {
            platform,
            filename: filename.into(),
        }
    }
}

impl Formatter for ConversationalFormatter {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn filename(&self) -> &str {
        &self.filename
    }

    fn render(&self, skill: &Skill) -> String {
        let mut out = String::with_capacity(512);
        out.push_str(&format!("You are an expert in {}.\n\n", skill.category));
        out.push_str(&skill.description);
        out.push_str("\n\nFollow these guidelines:\n\n");
        push_rules(&mut out, skill);
        out
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// An immutable set of formatters, at most one per platform.
#[derive(Clone)]
pub struct FormatterRegistry {
    formatters: Vec<Arc<dyn Formatter>>,
}

impl FormatterRegistry {
    /// Build a registry from an explicit formatter list.  A later formatter
    /// for an already registered platform replaces the earlier one.
    pub fn new(formatters: Vec<Arc<dyn Formatter>>) -> Self {
        let mut registry = Self {
            formatters: Vec::with_capacity(formatters.len()),
        };
        for formatter in formatters {
            let platform = formatter.platform();
            registry.formatters.retain(|f| f.platform() != platform);
            registry.formatters.push(formatter);
        }
        registry.formatters.sort_by_key(|f| f.platform());
        registry
    }

    /// The four supported platforms.
    pub fn builtin() -> Self {
        Self::new(vec![
            Arc::new(RichContextFormatter::new(
                Platform::Claude,
                ".claude/custom-instructions.md",
            )),
            Arc::new(BareRulesFormatter::new(Platform::Cursor, ".cursorrules")),
            Arc::new(ConversationalFormatter::new(
                Platform::OpenAi,
                "gpt-instructions.txt",
            )),
            Arc::new(BareRulesFormatter::new(Platform::Windsurf, ".windsurfrules")),
        ])
    }

    /// Look up a formatter by platform key.
    pub fn get(&self, key: &str) -> Result<&dyn Formatter> {
        self.formatters
            .iter()
            .find(|f| f.platform().key() == key)
            .map(|f| f.as_ref())
            .ok_or_else(|| SkillError::UnsupportedPlatform {
                platform: key.to_owned(),
                supported: self.supported_keys(),
            })
    }

    /// Look up a formatter by platform.
    pub fn for_platform(&self, platform: Platform) -> Result<&dyn Formatter> {
        self.get(platform.key())
    }

    pub fn is_supported(&self, key: &str) -> bool {
        self.formatters.iter().any(|f| f.platform().key() == key)
    }

    /// All formatters in canonical platform order.
    pub fn list_all(&self) -> Vec<&dyn Formatter> {
        self.formatters.iter().map(|f| f.as_ref()).collect()
    }

    pub fn supported_keys(&self) -> Vec<String> {
        self.formatters
            .iter()
            .map(|f| f.platform().key().to_owned())
            .collect()
    }
}

impl Default for FormatterRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl std::fmt::Debug for FormatterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormatterRegistry")
            .field("platforms", &self.supported_keys())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
