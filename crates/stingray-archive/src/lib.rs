//! Archive and patch workspace for Stingray engine games.
//!
//! This crate manages the archives of a game installation together with the
//! patches that overlay them:
//!
//! - **Resolution**: lookups walk the active patch, the active archive, the
//!   other loaded archives and finally archives discovered on disk
//! - **Copy-on-write editing**: saving an entry clones it from its base
//!   archive into the active patch; base archives are never modified
//! - **Patch management**: creation next to the base archive with the next
//!   free `.patch_N` suffix, renaming, writing
//! - **Clipboard and selection**: copy and paste of entry references with
//!   per-entry failure reports
//! - **Dumps**: raw payload export and import, DDS texture exchange
//!
//! # Example
//!
//! ```rust,no_run
//! use stingray_archive::{Workspace, WorkspaceConfig};
//! use stingray_formats::toc::EntryKey;
//!
//! # fn example() -> Result<(), stingray_archive::ArchiveError> {
//! let mut workspace = Workspace::new(WorkspaceConfig::new("/games/data"));
//! workspace.load_archive("/games/data/9ba626afa44a3aa3", true, false)?;
//! workspace.create_patch_from_active(Some("my patch"))?;
//!
//! let key = EntryKey::new(0x1234, stingray_formats::type_ids::MATERIAL);
//! workspace.duplicate_entry(key, None)?;
//! workspace.write_active_patch()?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![allow(clippy::must_use_candidate)]

/// Workspace configuration
pub mod config;
/// Error types and batch reports
pub mod error;
/// Archive discovery outside the loaded set
pub mod search;
/// Archive, patch and entry management
pub mod workspace;

// Workspace operations split by concern
mod dump;
mod textures;

pub use config::WorkspaceConfig;
pub use error::{ArchiveError, ArchiveResult, BatchReport};
pub use search::{FoundEntry, SearchIndex, find_entries_in_directory, parse_id_list};
pub use workspace::{EntryListing, LoadOutcome, Workspace, next_patch_path};
