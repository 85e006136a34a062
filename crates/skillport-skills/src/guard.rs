//! Output path guard.
//!
//! Every file the installer writes goes through [`resolve_output_path`]
//! first.  Resolution is purely lexical: the target usually does not exist
//! yet, so `canonicalize()` is not an option, and the guard never touches the
//! filesystem.

use std::path::{Component, Path, PathBuf};

use crate::error::{Result, SkillError};

/// Resolve `filename` against `output_dir`, rejecting anything that would
/// land outside the directory.
///
/// The returned path is absolute and normalized.  It is either the output
/// directory itself or strictly below it.
pub fn resolve_output_path(output_dir: &Path, filename: &str) -> Result<PathBuf> {
    let relative = normalize_path(Path::new(filename));
    if relative
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return Err(SkillError::PathTraversal(filename.to_owned()));
    }

    let allowed = absolute_dir(output_dir)?;
    let resolved = normalize_path(&allowed.join(&relative));

    if !resolved.starts_with(&allowed) {
        return Err(SkillError::OutsideOutputDir { allowed, resolved });
    }

    Ok(resolved)
}

fn absolute_dir(dir: &Path) -> Result<PathBuf> {
    let dir = if dir.as_os_str().is_empty() {
        Path::new(".")
    } else {
        dir
    };
    let abs = std::path::absolute(dir).map_err(|source| SkillError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    Ok(normalize_path(&abs))
}

/// Lexically fold `.` and `..` components.  A `..` with nothing to pop is
/// kept so callers can detect it.
fn normalize_path(path: &Path) -> PathBuf {
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                if matches!(components.last(), Some(Component::Normal(_))) {
                    components.pop();
                } else if !matches!(
                    components.last(),
                    Some(Component::RootDir | Component::Prefix(_))
                ) {
                    components.push(component);
                }
            }
            Component::CurDir => {}
            _ => components.push(component),
        }
    }
    components.iter().collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
