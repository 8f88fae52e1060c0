//! In-memory container and the path triad it is bound to

use crate::mesh::header::declares_geometry;
use crate::payload::type_ids;
use crate::toc::builder::{TocBuffers, TocBuilder};
use crate::toc::constants::{GPU_SUFFIX, HEADER_RESERVED_SIZE, STREAM_SUFFIX};
use crate::toc::entry::{EntryData, EntryKey, TocEntry};
use crate::toc::error::{TocError, TocResult};
use crate::toc::header::{TocEntryRecord, TocHeader, TocTypeRecord};
use binrw::BinRead;
use bytes::Bytes;
use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A type group: the entries sharing one type hash
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TocType {
    /// Type hash
    pub type_id: u64,
    /// Uninterpreted record word, preserved
    pub unused: u64,
    /// Uninterpreted record word, preserved
    pub unknown_16: u32,
    /// Uninterpreted record word, preserved
    pub unknown_64: u32,
}

impl TocType {
    /// Group record for a type first seen in this session
    pub const fn new(type_id: u64) -> Self {
        Self {
            type_id,
            unused: 0,
            unknown_16: 16,
            unknown_64: 64,
        }
    }
}

impl From<&TocTypeRecord> for TocType {
    fn from(record: &TocTypeRecord) -> Self {
        Self {
            type_id: record.type_id,
            unused: record.unused,
            unknown_16: record.unknown_16,
            unknown_64: record.unknown_64,
        }
    }
}

/// Keys of a container read without its payloads
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TocListing {
    /// Type hashes in group order
    pub types: Vec<u64>,
    /// Entry keys in file order
    pub keys: Vec<EntryKey>,
}

impl TocListing {
    /// Whether the listing holds an entry with this key
    pub fn contains(&self, key: EntryKey) -> bool {
        self.keys.contains(&key)
    }

    /// Whether the listing holds an entry with this file id, of any type
    pub fn contains_file(&self, file_id: u64) -> bool {
        self.keys.iter().any(|key| key.file_id == file_id)
    }
}

/// A parsed container: type groups plus entries keyed by `(file_id, type_id)`
#[derive(Debug, Clone)]
pub struct TocFile {
    path: PathBuf,
    name: String,
    local_name: String,
    pub(crate) reserved: u32,
    pub(crate) reserved_block: [u8; HEADER_RESERVED_SIZE],
    types: Vec<TocType>,
    entries: Vec<TocEntry>,
    lookup: HashMap<EntryKey, usize>,
}

impl TocFile {
    /// Create an empty container bound to `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let mut toc = Self {
            path: PathBuf::new(),
            name: String::new(),
            local_name: String::new(),
            reserved: 0,
            reserved_block: [0; HEADER_RESERVED_SIZE],
            types: Vec::new(),
            entries: Vec::new(),
            lookup: HashMap::new(),
        };
        toc.set_path(path);
        toc
    }

    /// Read and parse the container triad at `path`
    ///
    /// Missing sibling files are treated as empty.
    pub fn load<P: AsRef<Path>>(path: P) -> TocResult<Self> {
        let path = path.as_ref();
        let index = Bytes::from(fs::read(path)?);
        let gpu = read_optional(&sibling_path(path, GPU_SUFFIX))?;
        let stream = read_optional(&sibling_path(path, STREAM_SUFFIX))?;

        let mut toc = Self::parse(index, gpu, stream)?;
        toc.set_path(path);
        debug!(
            "Loaded container {} with {} types and {} entries",
            toc.name,
            toc.types.len(),
            toc.entries.len()
        );
        Ok(toc)
    }

    /// Parse a container from its three file buffers
    ///
    /// Payloads are slices of the input buffers, not copies.
    pub fn parse(index: Bytes, gpu: Bytes, stream: Bytes) -> TocResult<Self> {
        let (header, types, records) = read_tables(&index)?;

        let mut toc = Self::new("");
        toc.reserved = header.reserved;
        toc.reserved_block = header.reserved_block;
        toc.types = group_types(&types, &records);

        for record in &records {
            let data = EntryData {
                index: slice_payload(&index, record, "index", record.index_offset, record.index_size)?,
                gpu: slice_payload(&gpu, record, "gpu", record.gpu_offset, record.gpu_size)?,
                stream: slice_payload(
                    &stream,
                    record,
                    "stream",
                    record.stream_offset,
                    record.stream_size,
                )?,
            };

            if record.type_id == type_ids::MESH && declares_geometry(&data.index) == Some(false) {
                return Err(TocError::MissingGeometry(record.file_id));
            }

            toc.push_entry(TocEntry::from_record(record, data))?;
        }

        Ok(toc)
    }

    /// Read only the header and tables of the index file at `path`
    pub fn read_listing<P: AsRef<Path>>(path: P) -> TocResult<TocListing> {
        let index = fs::read(path)?;
        Self::parse_listing(&index)
    }

    /// Parse only the header and tables of an index buffer
    pub fn parse_listing(index: &[u8]) -> TocResult<TocListing> {
        let (_, types, records) = read_tables(index)?;
        Ok(TocListing {
            types: types.iter().map(|t| t.type_id).collect(),
            keys: records
                .iter()
                .map(|r| EntryKey::new(r.file_id, r.type_id))
                .collect(),
        })
    }

    /// Encode the three files
    pub fn to_buffers(&self) -> TocResult<TocBuffers> {
        TocBuilder::new(self).build()
    }

    /// Encode and write the triad to `path`
    pub fn save<P: AsRef<Path>>(&self, path: P) -> TocResult<()> {
        let path = path.as_ref();
        let buffers = self.to_buffers()?;
        fs::write(path, &buffers.index)?;
        fs::write(sibling_path(path, GPU_SUFFIX), &buffers.gpu)?;
        fs::write(sibling_path(path, STREAM_SUFFIX), &buffers.stream)?;
        debug!(
            "Wrote container {} ({} index, {} gpu, {} stream bytes)",
            path.display(),
            buffers.index.len(),
            buffers.gpu.len(),
            buffers.stream.len()
        );
        Ok(())
    }

    /// Write to the bound path and snapshot every entry as persisted
    pub fn write(&mut self) -> TocResult<()> {
        self.save(&self.path)?;
        for entry in &mut self.entries {
            entry.mark_persisted();
        }
        Ok(())
    }

    /// Empty container sharing this one's path and header words
    pub fn shell_clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            name: self.name.clone(),
            local_name: self.local_name.clone(),
            reserved: self.reserved,
            reserved_block: self.reserved_block,
            types: Vec::new(),
            entries: Vec::new(),
            lookup: HashMap::new(),
        }
    }

    /// Index file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rebind to a new path, updating the display name
    pub fn set_path(&mut self, path: impl Into<PathBuf>) {
        self.path = path.into();
        self.name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        if self.local_name.is_empty() {
            self.local_name.clone_from(&self.name);
        }
    }

    /// File name of the index path
    pub fn name(&self) -> &str {
        &self.name
    }

    /// User-facing name
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    /// Set the user-facing name
    pub fn set_local_name(&mut self, name: impl Into<String>) {
        self.local_name = name.into();
    }

    /// Type groups in layout order
    pub fn types(&self) -> &[TocType] {
        &self.types
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the container holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &TocEntry> {
        self.entries.iter()
    }

    /// Mutable entries in insertion order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut TocEntry> {
        self.entries.iter_mut()
    }

    /// Whether an entry with this key exists
    pub fn contains(&self, key: EntryKey) -> bool {
        self.lookup.contains_key(&key)
    }

    /// Whether any entry has one of the given types
    pub fn has_any_type(&self, type_ids: &[u64]) -> bool {
        self.types.iter().any(|t| type_ids.contains(&t.type_id))
    }

    /// Look up an entry
    pub fn entry(&self, key: EntryKey) -> Option<&TocEntry> {
        self.lookup.get(&key).map(|&i| &self.entries[i])
    }

    /// Look up an entry for mutation
    pub fn entry_mut(&mut self, key: EntryKey) -> Option<&mut TocEntry> {
        self.lookup.get(&key).map(|&i| &mut self.entries[i])
    }

    /// First entry with this file id, of any type
    pub fn entry_by_file_id(&self, file_id: u64) -> Option<&TocEntry> {
        self.entries.iter().find(|e| e.file_id() == file_id)
    }

    /// Insert an entry, appending a type group for a new type
    ///
    /// Fails without mutating if the key is taken.
    pub fn add_entry(&mut self, entry: TocEntry) -> TocResult<()> {
        if self.contains(entry.key()) {
            return Err(duplicate(entry.key()));
        }
        if !self.types.iter().any(|t| t.type_id == entry.type_id()) {
            self.types.push(TocType::new(entry.type_id()));
        }
        self.push_entry(entry)
    }

    /// Remove an entry, dropping its type group if it was the last of its type
    pub fn remove_entry(&mut self, key: EntryKey) -> Option<TocEntry> {
        let position = self.lookup.remove(&key)?;
        let entry = self.entries.remove(position);
        self.reindex();
        if !self.entries.iter().any(|e| e.type_id() == key.type_id) {
            self.types.retain(|t| t.type_id != key.type_id);
        }
        Some(entry)
    }

    /// Change an entry's file id in place
    pub fn rename_entry(&mut self, key: EntryKey, file_id: u64) -> TocResult<()> {
        let new_key = EntryKey::new(file_id, key.type_id);
        if new_key == key {
            return Ok(());
        }
        if self.contains(new_key) {
            return Err(duplicate(new_key));
        }
        let position = self.lookup.remove(&key).ok_or(TocError::EntryNotFound {
            file_id: key.file_id,
            type_id: key.type_id,
        })?;
        self.entries[position].set_file_id(file_id);
        self.lookup.insert(new_key, position);
        Ok(())
    }

    fn push_entry(&mut self, entry: TocEntry) -> TocResult<()> {
        let key = entry.key();
        if self.lookup.contains_key(&key) {
            return Err(duplicate(key));
        }
        self.lookup.insert(key, self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    fn reindex(&mut self) {
        self.lookup = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.key(), i))
            .collect();
    }
}

fn duplicate(key: EntryKey) -> TocError {
    TocError::DuplicateKey {
        file_id: key.file_id,
        type_id: key.type_id,
    }
}

fn read_tables(index: &[u8]) -> TocResult<(TocHeader, Vec<TocTypeRecord>, Vec<TocEntryRecord>)> {
    let mut cursor = Cursor::new(index);
    let header = TocHeader::read(&mut cursor)?;
    header.validate()?;

    let types = (0..header.num_types)
        .map(|_| TocTypeRecord::read(&mut cursor))
        .collect::<Result<Vec<_>, _>>()?;
    let records = (0..header.num_files)
        .map(|_| TocEntryRecord::read(&mut cursor))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((header, types, records))
}

/// Type groups for the parsed entries
///
/// Repeated records keep their first occurrence. Entry types without a record
/// get a fresh group after the recorded ones, so every entry is written back.
fn group_types(types: &[TocTypeRecord], records: &[TocEntryRecord]) -> Vec<TocType> {
    let mut groups: Vec<TocType> = Vec::with_capacity(types.len());
    for record in types {
        if groups.iter().any(|t| t.type_id == record.type_id) {
            warn!("Dropping repeated type record {:016x}", record.type_id);
            continue;
        }
        groups.push(TocType::from(record));
    }
    for record in records {
        if !groups.iter().any(|t| t.type_id == record.type_id) {
            warn!(
                "Entry {:016x} has type {:016x} without a type record",
                record.file_id, record.type_id
            );
            groups.push(TocType::new(record.type_id));
        }
    }
    groups
}

fn slice_payload(
    file: &Bytes,
    record: &TocEntryRecord,
    region: &'static str,
    offset: u64,
    size: u32,
) -> TocResult<Bytes> {
    if size == 0 {
        return Ok(Bytes::new());
    }
    let start = usize::try_from(offset).ok();
    let end = start.and_then(|s| s.checked_add(size as usize));
    match (start, end) {
        (Some(start), Some(end)) if end <= file.len() => Ok(file.slice(start..end)),
        _ => Err(TocError::PayloadOutOfBounds {
            file_id: record.file_id,
            region,
            offset,
            size,
            available: file.len(),
        }),
    }
}

fn read_optional(path: &Path) -> TocResult<Bytes> {
    match fs::read(path) {
        Ok(data) => Ok(Bytes::from(data)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Bytes::new()),
        Err(e) => Err(e.into()),
    }
}

/// Path of a sibling payload file, e.g. `<path>.gpu_resources`
pub fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}
