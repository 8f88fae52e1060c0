//! Archive and patch workspace
//!
//! A [`Workspace`] owns every loaded archive and patch for one editing
//! session. Lookups walk a fixed priority chain:
//!
//! 1. the active patch
//! 2. the active archive
//! 3. every other loaded archive, in load order
//! 4. optionally, archives discovered on disk but not yet loaded
//!
//! Edits never touch a base archive. Saving an entry that only exists in a
//! base archive first clones it into the active patch; the clone shares the
//! unchanged payload bytes with the original.

use crate::config::WorkspaceConfig;
use crate::error::{ArchiveError, ArchiveResult, BatchReport};
use crate::search::SearchIndex;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use stingray_formats::mesh::{MeshError, NormalCodec};
use stingray_formats::payload::{
    CodecContext, ExternalResolver, TypedPayload, decode_entry, encode_entry, type_ids,
};
use stingray_formats::toc::{EntryData, EntryKey, TocEntry, TocFile};
use stingray_hash::HashNames;
use tracing::{debug, info, warn};

/// Types that make an archive worth keeping when empty archives are dropped
const CONTENT_TYPES: [u64; 4] = [
    type_ids::MESH,
    type_ids::TEXTURE,
    type_ids::MATERIAL,
    type_ids::COMPOSITE_MESH,
];

/// Result of [`Workspace::load_archive`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The archive was read and added
    Loaded,
    /// An archive with the same path was already loaded
    AlreadyLoaded,
    /// The archive holds no editable content and was dropped
    SkippedEmpty,
}

/// One row of [`Workspace::display_entries`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryListing {
    /// Entry key
    pub key: EntryKey,
    /// The row shows the active patch's version of the entry
    pub in_patch: bool,
    /// The entry holds a decoded payload
    pub loaded: bool,
    /// The entry changed since it was last written
    pub modified: bool,
    /// The entry was created in this session
    pub created: bool,
}

impl EntryListing {
    fn new(entry: &TocEntry, in_patch: bool) -> Self {
        let flags = entry.flags();
        Self {
            key: entry.key(),
            in_patch,
            loaded: flags.loaded,
            modified: flags.modified,
            created: flags.created,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Location {
    Patch(usize),
    Archive(usize),
}

/// Editing session over a set of archives and patches
pub struct Workspace {
    config: WorkspaceConfig,
    archives: Vec<TocFile>,
    active_archive: Option<usize>,
    patches: Vec<TocFile>,
    active_patch: Option<usize>,
    search: SearchIndex,
    selection: Vec<EntryKey>,
    last_selected: Option<EntryKey>,
    clipboard: Vec<EntryKey>,
    names: HashNames,
    normals: Option<Arc<dyn NormalCodec>>,
}

impl fmt::Debug for Workspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workspace")
            .field("archives", &self.archives.len())
            .field("active_archive", &self.active_archive)
            .field("patches", &self.patches.len())
            .field("active_patch", &self.active_patch)
            .field("search_archives", &self.search.len())
            .field("selection", &self.selection.len())
            .field("clipboard", &self.clipboard.len())
            .field("normals", &self.normals.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new(WorkspaceConfig::default())
    }
}

impl Workspace {
    /// Create an empty workspace
    pub fn new(config: WorkspaceConfig) -> Self {
        Self {
            config,
            archives: Vec::new(),
            active_archive: None,
            patches: Vec::new(),
            active_patch: None,
            search: SearchIndex::new(),
            selection: Vec::new(),
            last_selected: None,
            clipboard: Vec::new(),
            names: HashNames::new(),
            normals: None,
        }
    }

    /// Configuration this workspace was opened with
    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    /// Hash-name lists used for display and dumps
    pub fn names(&self) -> &HashNames {
        &self.names
    }

    /// Mutable hash-name lists
    pub fn names_mut(&mut self) -> &mut HashNames {
        &mut self.names
    }

    /// Install the converter for palette-packed normals
    ///
    /// Without one, meshes decode with zero normals and encode zero words.
    pub fn set_normal_codec(&mut self, codec: Arc<dyn NormalCodec>) {
        self.normals = Some(codec);
    }

    /// Loaded base archives
    pub fn archives(&self) -> &[TocFile] {
        &self.archives
    }

    /// Loaded patches
    pub fn patches(&self) -> &[TocFile] {
        &self.patches
    }

    /// Archive lookups start from
    pub fn active_archive(&self) -> Option<&TocFile> {
        self.active_archive.map(|i| &self.archives[i])
    }

    /// Patch that receives edits
    pub fn active_patch(&self) -> Option<&TocFile> {
        self.active_patch.map(|i| &self.patches[i])
    }

    /// Archives discovered for cross-archive lookups
    pub fn search_index(&self) -> &SearchIndex {
        &self.search
    }

    // =========================================================================
    // Archive and patch sets
    // =========================================================================

    /// Load the archive triad at `path` as an archive or a patch
    ///
    /// Loading a path that is already loaded only updates the active pointer.
    /// The first archive load scans for search archives when enabled.
    pub fn load_archive<P: AsRef<Path>>(
        &mut self,
        path: P,
        set_active: bool,
        is_patch: bool,
    ) -> ArchiveResult<LoadOutcome> {
        let path = path.as_ref();
        let loaded = if is_patch {
            &self.patches
        } else {
            &self.archives
        };
        if let Some(index) = loaded.iter().position(|toc| toc.path() == path) {
            if set_active {
                if is_patch {
                    self.active_patch = Some(index);
                } else {
                    self.set_active_archive(index);
                }
            }
            return Ok(LoadOutcome::AlreadyLoaded);
        }

        let toc = TocFile::load(path)?;

        if is_patch {
            info!("Loaded patch {} with {} entries", toc.name(), toc.len());
            self.patches.push(toc);
            if set_active {
                self.active_patch = Some(self.patches.len() - 1);
            }
            return Ok(LoadOutcome::Loaded);
        }

        if set_active && self.config.unload_empty_archives && !toc.has_any_type(&CONTENT_TYPES) {
            info!(
                "Skipping {}: no meshes, textures or materials",
                toc.name()
            );
            return Ok(LoadOutcome::SkippedEmpty);
        }

        if self.config.discover_search_archives && !self.search.is_scanned() {
            let dir = if self.config.game_data_path.as_os_str().is_empty() {
                path.parent().map(Path::to_path_buf)
            } else {
                Some(self.config.game_data_path.clone())
            };
            if let Some(dir) = dir.filter(|d| !d.as_os_str().is_empty()) {
                self.search.discover(dir);
            }
        }

        info!("Loaded archive {} with {} entries", toc.name(), toc.len());
        self.archives.push(toc);
        if set_active {
            self.set_active_archive(self.archives.len() - 1);
        }
        Ok(LoadOutcome::Loaded)
    }

    /// Load several archives, attempting every path
    ///
    /// The first archive loaded becomes active when none is.
    pub fn bulk_load<I, P>(&mut self, paths: I) -> BatchReport<PathBuf>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        if self.config.unload_before_bulk_load {
            self.unload_archives();
        }

        let mut report = BatchReport::new();
        for path in paths {
            let path = path.as_ref().to_path_buf();
            let set_active = self.active_archive.is_none();
            let result = self.load_archive(&path, set_active, false).map(|_| ());
            if let Err(e) = &result {
                warn!("Failed to load {}: {e}", path.display());
            }
            report.record(path, result);
        }
        info!(
            "Bulk load finished: {} loaded, {} failed",
            report.succeeded.len(),
            report.failures.len()
        );
        report
    }

    /// Drop every archive, the search pool and the selection
    pub fn unload_archives(&mut self) {
        self.archives.clear();
        self.active_archive = None;
        self.search.clear();
        self.deselect_all();
    }

    /// Drop every patch
    pub fn unload_patches(&mut self) {
        self.patches.clear();
        self.active_patch = None;
    }

    /// Make the archive at `index` active
    ///
    /// Switching to a different archive clears the selection. Returns false
    /// if no archive has that index.
    pub fn set_active_archive(&mut self, index: usize) -> bool {
        if index >= self.archives.len() {
            return false;
        }
        if self.active_archive != Some(index) {
            self.deselect_all();
            self.active_archive = Some(index);
        }
        true
    }

    /// Make the archive with this file or local name active
    pub fn set_active_archive_by_name(&mut self, name: &str) -> bool {
        self.archives
            .iter()
            .position(|toc| toc.name() == name || toc.local_name() == name)
            .is_some_and(|index| self.set_active_archive(index))
    }

    /// Advance the active archive, wrapping to the first
    pub fn next_archive(&mut self) -> Option<&TocFile> {
        if self.archives.is_empty() {
            return None;
        }
        let next = self
            .active_archive
            .map_or(0, |i| (i + 1) % self.archives.len());
        self.set_active_archive(next);
        self.active_archive()
    }

    /// Make the patch at `index` active
    pub fn set_active_patch(&mut self, index: usize) -> bool {
        if index >= self.patches.len() {
            return false;
        }
        self.active_patch = Some(index);
        true
    }

    /// Make the patch with this file or local name active
    pub fn set_active_patch_by_name(&mut self, name: &str) -> bool {
        self.patches
            .iter()
            .position(|toc| toc.name() == name || toc.local_name() == name)
            .is_some_and(|index| self.set_active_patch(index))
    }

    /// Change the active patch's user-facing name
    pub fn rename_active_patch(&mut self, name: impl Into<String>) -> ArchiveResult<()> {
        let patch = self.patch_index()?;
        self.patches[patch].set_local_name(name);
        Ok(())
    }

    /// Start a new, empty patch for the active archive and make it active
    ///
    /// The patch path is the archive path with the next free `.patch_N`
    /// suffix. Nothing is written until [`write_active_patch`](Self::write_active_patch).
    pub fn create_patch_from_active(&mut self, name: Option<&str>) -> ArchiveResult<&TocFile> {
        let active = self.active_archive.ok_or(ArchiveError::NoArchive)?;
        let archive = &self.archives[active];

        let mut path = next_patch_path(archive.path());
        while path.exists() || self.patches.iter().any(|p| p.path() == path) {
            path = next_patch_path(&path);
        }

        let mut patch = archive.shell_clone();
        patch.set_path(&path);
        let local_name = name.map_or_else(|| patch.name().to_string(), str::to_string);
        patch.set_local_name(local_name);

        info!("Created patch {} for {}", path.display(), archive.name());
        self.patches.push(patch);
        let index = self.patches.len() - 1;
        self.active_patch = Some(index);
        Ok(&self.patches[index])
    }

    /// Write the active patch triad and snapshot its entries as persisted
    pub fn write_active_patch(&mut self) -> ArchiveResult<PathBuf> {
        let patch = self.patch_index()?;
        let toc = &mut self.patches[patch];
        toc.write()?;
        info!("Wrote patch {} with {} entries", toc.path().display(), toc.len());
        Ok(toc.path().to_path_buf())
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    pub(crate) fn patch_index(&self) -> ArchiveResult<usize> {
        self.active_patch.ok_or(ArchiveError::NoPatch)
    }

    fn toc(&self, location: Location) -> &TocFile {
        match location {
            Location::Patch(i) => &self.patches[i],
            Location::Archive(i) => &self.archives[i],
        }
    }

    fn toc_mut(&mut self, location: Location) -> &mut TocFile {
        match location {
            Location::Patch(i) => &mut self.patches[i],
            Location::Archive(i) => &mut self.archives[i],
        }
    }

    fn locate_loaded(&self, key: EntryKey) -> Option<Location> {
        if let Some(patch) = self.active_patch
            && self.patches[patch].contains(key)
        {
            return Some(Location::Patch(patch));
        }
        if let Some(archive) = self.active_archive
            && self.archives[archive].contains(key)
        {
            return Some(Location::Archive(archive));
        }
        self.archives
            .iter()
            .position(|toc| toc.contains(key))
            .map(Location::Archive)
    }

    fn locate(&mut self, key: EntryKey, search_all: bool) -> Option<Location> {
        self.locate_loaded(key).or_else(|| {
            if search_all {
                self.load_from_search(key).map(Location::Archive)
            } else {
                None
            }
        })
    }

    fn load_from_search(&mut self, key: EntryKey) -> Option<usize> {
        let path = self.search.find(key)?.to_path_buf();
        if self.archives.iter().any(|toc| toc.path() == path) {
            return None;
        }
        match TocFile::load(&path) {
            Ok(toc) => {
                info!("Loaded search archive {} for {key}", toc.name());
                self.archives.push(toc);
                let index = self.archives.len() - 1;
                self.archives[index].contains(key).then_some(index)
            }
            Err(e) => {
                warn!("Failed to load search archive {}: {e}", path.display());
                None
            }
        }
    }

    /// Look up an entry among loaded archives and the active patch
    pub fn entry(&self, key: EntryKey) -> Option<&TocEntry> {
        self.locate_loaded(key)
            .and_then(|location| self.toc(location).entry(key))
    }

    /// Look up an entry, optionally loading a discovered archive that holds it
    pub fn resolve(&mut self, key: EntryKey, search_all: bool) -> Option<&TocEntry> {
        let location = self.locate(key, search_all)?;
        self.toc(location).entry(key)
    }

    /// Whether the active patch holds the entry
    pub fn is_in_patch(&self, key: EntryKey) -> bool {
        self.active_patch()
            .is_some_and(|patch| patch.contains(key))
    }

    // =========================================================================
    // Loading and saving
    // =========================================================================

    fn decode_at(&mut self, location: Location, key: EntryKey) -> ArchiveResult<()> {
        let data = self
            .toc(location)
            .entry(key)
            .ok_or(ArchiveError::EntryNotFound(key))?
            .data()
            .clone();
        let normals = self.normals.clone();
        let ctx = CodecContext {
            normals: normals.as_deref(),
        };
        let payload = decode_entry(key.type_id, &data, self, &ctx)?;
        self.toc_mut(location)
            .entry_mut(key)
            .ok_or(ArchiveError::EntryNotFound(key))?
            .set_payload(payload);
        debug!("Loaded entry {key}");
        Ok(())
    }

    /// Decode an entry, caching the payload on the entry
    ///
    /// Entries already decoded are returned as is unless `reload` is set.
    /// Returns `None` when no container holds the key.
    pub fn load_entry(
        &mut self,
        key: EntryKey,
        reload: bool,
        search_all: bool,
    ) -> ArchiveResult<Option<&TocEntry>> {
        let Some(location) = self.locate(key, search_all) else {
            return Ok(None);
        };
        let loaded = self
            .toc(location)
            .entry(key)
            .is_some_and(TocEntry::is_loaded);
        if reload || !loaded {
            self.decode_at(location, key)?;
        }
        Ok(self.toc(location).entry(key))
    }

    /// Clone an entry into the patch unless it is already there
    fn copy_into_patch(&mut self, patch: usize, key: EntryKey) -> ArchiveResult<()> {
        if self.patches[patch].contains(key) {
            return Ok(());
        }
        let location = self
            .locate(key, false)
            .ok_or(ArchiveError::EntryNotFound(key))?;
        let entry = self
            .toc(location)
            .entry(key)
            .ok_or(ArchiveError::EntryNotFound(key))?
            .clone();
        debug!("Copying {key} into patch {}", self.patches[patch].name());
        self.patches[patch].add_entry(entry)?;
        Ok(())
    }

    /// Decoded payload of the patch copy of an entry, for editing
    ///
    /// The entry is decoded first and only then cloned into the active
    /// patch, so a payload that fails to decode leaves the patch untouched.
    pub fn edit_payload(&mut self, key: EntryKey) -> ArchiveResult<&mut TypedPayload> {
        let patch = self.patch_index()?;
        if self.patches[patch].contains(key) {
            let location = Location::Patch(patch);
            if !self.toc(location).entry(key).is_some_and(TocEntry::is_loaded) {
                self.decode_at(location, key)?;
            }
        } else {
            self.load_entry(key, false, false)?
                .ok_or(ArchiveError::EntryNotFound(key))?;
            self.copy_into_patch(patch, key)?;
        }
        self.patches[patch]
            .entry_mut(key)
            .and_then(TocEntry::payload_mut)
            .ok_or(ArchiveError::EntryNotFound(key))
    }

    /// Re-encode an entry's decoded payload into the active patch
    ///
    /// Returns recoverable encoding diagnostics.
    pub fn save_entry(&mut self, key: EntryKey) -> ArchiveResult<Vec<MeshError>> {
        let payload = self.edit_payload(key)?.clone();
        let patch = self.patch_index()?;
        self.store_payload(patch, key, payload)
    }

    /// Save several entries, attempting every key
    pub fn save_entries(&mut self, keys: &[EntryKey]) -> ArchiveResult<BatchReport<EntryKey>> {
        self.patch_index()?;
        let mut report = BatchReport::new();
        for &key in keys {
            let result = self.save_entry(key).map(|_| ());
            if let Err(e) = &result {
                warn!("Failed to save {key}: {e}");
            }
            report.record(key, result);
        }
        Ok(report)
    }

    /// Encode `payload` as the new contents of an entry in the active patch
    pub fn save_payload(
        &mut self,
        key: EntryKey,
        payload: TypedPayload,
    ) -> ArchiveResult<Vec<MeshError>> {
        let patch = self.patch_index()?;
        self.copy_into_patch(patch, key)?;
        self.store_payload(patch, key, payload)
    }

    fn store_payload(
        &mut self,
        patch: usize,
        key: EntryKey,
        payload: TypedPayload,
    ) -> ArchiveResult<Vec<MeshError>> {
        let normals = self.normals.clone();
        let ctx = CodecContext {
            normals: normals.as_deref(),
        };
        let encoded = encode_entry(&payload, &ctx)?;
        for diagnostic in &encoded.diagnostics {
            warn!("{key}: {diagnostic}");
        }

        let entry = self.patches[patch]
            .entry_mut(key)
            .ok_or(ArchiveError::EntryNotFound(key))?;
        entry.set_data(encoded.data);
        entry.set_payload(payload);
        debug!("Saved entry {key}");
        Ok(encoded.diagnostics)
    }

    /// Replace an entry's raw payloads in the active patch
    pub fn save_data(&mut self, key: EntryKey, data: EntryData) -> ArchiveResult<()> {
        let patch = self.patch_index()?;
        self.copy_into_patch(patch, key)?;
        self.patches[patch]
            .entry_mut(key)
            .ok_or(ArchiveError::EntryNotFound(key))?
            .set_data(data);
        Ok(())
    }

    /// Revert an entry to its persisted payloads, decoding again if it was loaded
    pub fn undo_modified(&mut self, key: EntryKey) -> ArchiveResult<()> {
        let location = self
            .locate_loaded(key)
            .ok_or(ArchiveError::EntryNotFound(key))?;
        let was_loaded = self
            .toc_mut(location)
            .entry_mut(key)
            .ok_or(ArchiveError::EntryNotFound(key))?
            .undo_modified();
        if was_loaded {
            self.decode_at(location, key)?;
        }
        Ok(())
    }

    // =========================================================================
    // Patch edits
    // =========================================================================

    /// Clone an entry into the active patch without modifying it
    pub fn add_entry_to_patch(&mut self, key: EntryKey) -> ArchiveResult<&TocEntry> {
        let patch = self.patch_index()?;
        self.copy_into_patch(patch, key)?;
        self.patches[patch]
            .entry(key)
            .ok_or(ArchiveError::EntryNotFound(key))
    }

    /// Insert an entry built by the caller into the active patch
    pub fn add_new_entry_to_patch(&mut self, mut entry: TocEntry) -> ArchiveResult<EntryKey> {
        let patch = self.patch_index()?;
        entry.mark_created();
        let key = entry.key();
        self.patches[patch].add_entry(entry)?;
        Ok(key)
    }

    /// Copy an entry into the active patch under another file id
    ///
    /// Without `new_id` a random id is generated. Fails with
    /// [`ArchiveError::NoPatch`] before anything is looked up or changed.
    pub fn duplicate_entry(&mut self, key: EntryKey, new_id: Option<u64>) -> ArchiveResult<EntryKey> {
        let patch = self.patch_index()?;
        let file_id = new_id.unwrap_or_else(random_file_id);
        self.paste_entry(patch, key, file_id)
    }

    fn paste_entry(&mut self, patch: usize, key: EntryKey, file_id: u64) -> ArchiveResult<EntryKey> {
        let location = self
            .locate(key, false)
            .ok_or(ArchiveError::EntryNotFound(key))?;
        let copy = self
            .toc(location)
            .entry(key)
            .ok_or(ArchiveError::EntryNotFound(key))?
            .duplicate_as(file_id);
        let new_key = copy.key();
        self.patches[patch].add_entry(copy)?;
        debug!("Pasted {key} as {new_key}");
        Ok(new_key)
    }

    /// Remove an entry from the active patch
    pub fn remove_entry_from_patch(&mut self, key: EntryKey) -> ArchiveResult<Option<TocEntry>> {
        let patch = self.patch_index()?;
        let removed = self.patches[patch].remove_entry(key);
        if removed.is_some() {
            self.deselect_entries(&[key]);
        }
        Ok(removed)
    }

    /// Change the file id of an entry in the active patch
    pub fn rename_patch_entry(&mut self, key: EntryKey, new_id: u64) -> ArchiveResult<EntryKey> {
        let patch = self.patch_index()?;
        if !self.patches[patch].contains(key) {
            return Err(ArchiveError::NotInPatch(key));
        }
        self.patches[patch].rename_entry(key, new_id)?;
        Ok(EntryKey::new(new_id, key.type_id))
    }

    // =========================================================================
    // Selection and clipboard
    // =========================================================================

    /// Select entries, replacing the selection unless `append` is set
    ///
    /// Selecting exactly one key records it as the last selected entry.
    pub fn select_entries(&mut self, keys: &[EntryKey], append: bool) {
        if !append {
            self.selection.clear();
        }
        for key in keys {
            if !self.selection.contains(key) {
                self.selection.push(*key);
            }
        }
        if let [key] = keys {
            self.last_selected = Some(*key);
        }
    }

    /// Remove keys from the selection
    pub fn deselect_entries(&mut self, keys: &[EntryKey]) {
        self.selection.retain(|key| !keys.contains(key));
        if self.last_selected.is_some_and(|key| keys.contains(&key)) {
            self.last_selected = None;
        }
    }

    /// Clear the selection
    pub fn deselect_all(&mut self) {
        self.selection.clear();
        self.last_selected = None;
    }

    /// Selected keys in selection order
    pub fn selection(&self) -> &[EntryKey] {
        &self.selection
    }

    /// Key of the last single-entry selection
    pub fn last_selected(&self) -> Option<EntryKey> {
        self.last_selected
    }

    /// Put entry references on the clipboard, replacing its contents
    ///
    /// Keys that do not resolve are dropped. Returns the number kept.
    pub fn copy(&mut self, keys: &[EntryKey]) -> usize {
        self.clipboard = keys
            .iter()
            .copied()
            .filter(|key| self.locate_loaded(*key).is_some())
            .collect();
        self.clipboard.len()
    }

    /// Keys waiting to be pasted
    pub fn clipboard(&self) -> &[EntryKey] {
        &self.clipboard
    }

    /// Empty the clipboard
    pub fn clear_clipboard(&mut self) {
        self.clipboard.clear();
    }

    /// Insert copies of the clipboard entries into the active patch
    ///
    /// Each entry keeps its file id, takes `new_id`, or gets a random id when
    /// `gen_id` is set. Every entry is attempted and the clipboard is emptied.
    pub fn paste(&mut self, gen_id: bool, new_id: Option<u64>) -> ArchiveResult<BatchReport<EntryKey>> {
        let patch = self.patch_index()?;
        let mut report = BatchReport::new();
        for key in std::mem::take(&mut self.clipboard) {
            let file_id = match new_id {
                Some(id) => id,
                None if gen_id => random_file_id(),
                None => key.file_id,
            };
            let result = self.paste_entry(patch, key, file_id).map(|_| ());
            if let Err(e) = &result {
                warn!("Failed to paste {key}: {e}");
            }
            report.record(key, result);
        }
        Ok(report)
    }

    // =========================================================================
    // Listing
    // =========================================================================

    /// Entries of the active archive merged with the active patch
    ///
    /// Archive entries come first, showing the patch version where the patch
    /// shadows them, followed by entries only the patch holds. With
    /// `patch_only` only the patch is listed.
    pub fn display_entries(&self, patch_only: bool) -> Vec<EntryListing> {
        let archive = self.active_archive();
        let patch = self.active_patch();
        let mut rows = Vec::new();

        if !patch_only && let Some(archive) = archive {
            for entry in archive.iter() {
                let shadow = patch.and_then(|p| p.entry(entry.key()));
                rows.push(EntryListing::new(shadow.unwrap_or(entry), shadow.is_some()));
            }
        }
        if let Some(patch) = patch {
            for entry in patch.iter() {
                let listed = !patch_only && archive.is_some_and(|a| a.contains(entry.key()));
                if !listed {
                    rows.push(EntryListing::new(entry, true));
                }
            }
        }
        rows
    }
}

impl ExternalResolver for Workspace {
    fn resolve_external(&mut self, file_id: u64, type_id: u64) -> Option<EntryData> {
        self.resolve(EntryKey::new(file_id, type_id), true)
            .map(|entry| entry.data().clone())
    }
}

/// Random non-zero file id for new entries
pub(crate) fn random_file_id() -> u64 {
    rand::random::<u64>().max(1)
}

/// Next patch path after `path`
///
/// `<name>` becomes `<name>.patch_0` and `<name>.patch_N` becomes
/// `<name>.patch_{N+1}`.
pub fn next_patch_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let next = match name.rsplit_once(".patch_") {
        Some((stem, number)) => match number.parse::<u32>() {
            Ok(n) => format!("{stem}.patch_{}", n.saturating_add(1)),
            Err(_) => format!("{name}.patch_0"),
        },
        None => format!("{name}.patch_0"),
    };
    path.with_file_name(next)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_next_patch_path() {
        assert_eq!(
            next_patch_path(Path::new("data/9ba626afa44a3aa3")),
            PathBuf::from("data/9ba626afa44a3aa3.patch_0")
        );
        assert_eq!(
            next_patch_path(Path::new("data/9ba626afa44a3aa3.patch_0")),
            PathBuf::from("data/9ba626afa44a3aa3.patch_1")
        );
        assert_eq!(
            next_patch_path(Path::new("data/9ba626afa44a3aa3.patch_9")),
            PathBuf::from("data/9ba626afa44a3aa3.patch_10")
        );
        assert_eq!(
            next_patch_path(Path::new("data/base.patch_x")),
            PathBuf::from("data/base.patch_x.patch_0")
        );
    }

    #[test]
    fn test_selection_tracks_last_single_pick() {
        let mut workspace = Workspace::default();
        let a = EntryKey::new(1, 7);
        let b = EntryKey::new(2, 7);

        workspace.select_entries(&[a], false);
        workspace.select_entries(&[b, a], true);
        assert_eq!(workspace.selection(), &[a, b]);
        assert_eq!(workspace.last_selected(), Some(a));

        workspace.deselect_entries(&[a]);
        assert_eq!(workspace.selection(), &[b]);
        assert_eq!(workspace.last_selected(), None);

        workspace.select_entries(&[a], false);
        assert_eq!(workspace.selection(), &[a]);
    }

    #[test]
    fn test_edits_need_a_patch() {
        let mut workspace = Workspace::default();
        let key = EntryKey::new(1, 7);
        assert!(matches!(workspace.save_entry(key), Err(ArchiveError::NoPatch)));
        assert!(matches!(workspace.paste(true, None), Err(ArchiveError::NoPatch)));
        assert!(matches!(
            workspace.create_patch_from_active(None),
            Err(ArchiveError::NoArchive)
        ));
        assert!(workspace.next_archive().is_none());
    }
}
