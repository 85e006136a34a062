//! Platform auto-detection from marker files in a project directory.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::types::Platform;

/// Marker files per platform, checked in this order.  OpenAI has no local
/// marker.
const MARKERS: &[(Platform, &[&str])] = &[
    (Platform::Cursor, &[".cursorrules", ".cursor/rules"]),
    (Platform::Windsurf, &[".windsurfrules", ".windsurf/rules"]),
    (
        Platform::Claude,
        &[".claude/project.md", ".claude/instructions.md"],
    ),
];

/// How sure a detector is about its answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    High,
    Low,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::High => "high",
            Self::Low => "low",
        })
    }
}

/// Outcome of a detection pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub platform: Option<Platform>,
    pub confidence: Confidence,
    /// Human-readable reasons, e.g. `Found .cursorrules`.
    pub evidence: Vec<String>,
}

/// Guesses the target platform for an install without `--platform`.
pub trait DetectPlatform: Send + Sync {
    fn detect(&self) -> Detection;
}

/// Looks for platform marker files under a project root.
#[derive(Debug, Clone)]
pub struct MarkerFileDetector {
    root: PathBuf,
}

impl MarkerFileDetector {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl DetectPlatform for MarkerFileDetector {
    fn detect(&self) -> Detection {
        for (platform, markers) in MARKERS {
            let evidence: Vec<String> = markers
                .iter()
                .filter(|m| self.root.join(m).exists())
                .map(|m| format!("Found {m}"))
                .collect();

            if !evidence.is_empty() {
                debug!(platform = %platform, ?evidence, "platform detected");
                return Detection {
                    platform: Some(*platform),
                    confidence: Confidence::High,
                    evidence,
                };
            }
        }

        Detection {
            platform: None,
            confidence: Confidence::Low,
            evidence: vec!["No platform-specific files found".to_owned()],
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
