//! # skillport-store
//!
//! Local state for skillport: the `.skillsrc.json` file that records which
//! skills are installed in a project.
//!
//! ```ignore
//! use skillport_store::StateStore;
//!
//! let store = StateStore::in_dir(".");
//! for skill in store.list()? {
//!     println!("{} v{}", skill.id, skill.version);
//! }
//! ```

pub mod error;
pub mod state;

// ── re-exports ───────────────────────────────────────────────────────

pub use error::{StoreError, StoreResult};
pub use state::{
    AUTO_PLATFORM, CONTENT_HASH_ALGORITHM, InstalledSkill, STATE_FILENAME, SkillsConfig,
    StateStore,
};
