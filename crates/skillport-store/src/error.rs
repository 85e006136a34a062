//! Error types for the skillport-store crate.
//!
//! All state-file operations return [`StoreError`] via [`StoreResult`].

use std::path::PathBuf;

use thiserror::Error;

/// Alias for `Result<T, StoreError>`.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while reading or writing the local state file.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the state file failed.
    #[error("io error on `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The state file exists but cannot be interpreted.  The local state is
    /// not reconstructible, so the user has to intervene.
    #[error("state file `{path}` is corrupt ({reason}); delete it and retry")]
    Corrupt { path: PathBuf, reason: String },

    /// JSON serialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
