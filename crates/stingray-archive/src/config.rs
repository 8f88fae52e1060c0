//! Workspace configuration

use crate::error::ArchiveResult;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration for a [`Workspace`](crate::Workspace)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Directory holding the game's archives
    pub game_data_path: PathBuf,

    /// Where entry-id search results are written
    pub search_output_path: PathBuf,

    /// Drop archives with no meshes, textures or materials when they are loaded as active
    pub unload_empty_archives: bool,

    /// Unload every archive before a bulk load
    pub unload_before_bulk_load: bool,

    /// Scan the archive directory for search archives on the first load
    pub discover_search_archives: bool,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            game_data_path: PathBuf::new(),
            search_output_path: PathBuf::new(),
            unload_empty_archives: false,
            unload_before_bulk_load: true,
            discover_search_archives: true,
        }
    }
}

impl WorkspaceConfig {
    /// Create a configuration for the archives under `game_data_path`
    pub fn new<P: AsRef<Path>>(game_data_path: P) -> Self {
        Self {
            game_data_path: game_data_path.as_ref().to_path_buf(),
            ..Default::default()
        }
    }

    /// Read a JSON configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> ArchiveResult<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Read a configuration file, writing the defaults first if it does not exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> ArchiveResult<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Self::load(path);
        }
        let config = Self::default();
        config.save(path)?;
        debug!("Created default configuration at {}", path.display());
        Ok(config)
    }

    /// Write the configuration as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> ArchiveResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Set the game data directory
    #[must_use]
    pub fn with_game_data_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.game_data_path = path.as_ref().to_path_buf();
        self
    }

    /// Set the search output directory
    #[must_use]
    pub fn with_search_output_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_output_path = path.as_ref().to_path_buf();
        self
    }

    /// Skip activating archives that hold no entries
    #[must_use]
    pub const fn with_unload_empty_archives(mut self, enable: bool) -> Self {
        self.unload_empty_archives = enable;
        self
    }

    /// Unload every archive before a bulk load
    #[must_use]
    pub const fn with_unload_before_bulk_load(mut self, enable: bool) -> Self {
        self.unload_before_bulk_load = enable;
        self
    }

    /// Scan for search archives on the first archive load
    #[must_use]
    pub const fn with_search_discovery(mut self, enable: bool) -> Self {
        self.discover_search_archives = enable;
        self
    }
}
