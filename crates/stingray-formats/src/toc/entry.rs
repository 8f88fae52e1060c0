//! Container entries and their payload buffers

use crate::payload::TypedPayload;
use crate::toc::header::TocEntryRecord;
use bytes::Bytes;
use std::fmt;

/// Unique key of an entry within one container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryKey {
    /// Hash of the resource path
    pub file_id: u64,
    /// Hash of the resource type name
    pub type_id: u64,
}

impl EntryKey {
    /// Create a key
    pub const fn new(file_id: u64, type_id: u64) -> Self {
        Self { file_id, type_id }
    }
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:016x}", self.file_id, self.type_id)
    }
}

/// The three payload regions of an entry
///
/// Buffers are reference counted, so cloning an entry shares its bytes until
/// one side replaces them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryData {
    /// Payload stored inline in the index file
    pub index: Bytes,
    /// Payload stored in the `.gpu_resources` file
    pub gpu: Bytes,
    /// Payload stored in the `.stream` file
    pub stream: Bytes,
}

impl EntryData {
    /// Bundle three payloads
    pub fn new(index: impl Into<Bytes>, gpu: impl Into<Bytes>, stream: impl Into<Bytes>) -> Self {
        Self {
            index: index.into(),
            gpu: gpu.into(),
            stream: stream.into(),
        }
    }

    /// Entry with only an index payload
    pub fn index_only(index: impl Into<Bytes>) -> Self {
        Self::new(index, Bytes::new(), Bytes::new())
    }

    /// Combined length of all three payloads
    pub fn total_len(&self) -> usize {
        self.index.len() + self.gpu.len() + self.stream.len()
    }
}

/// Editing state of an entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryFlags {
    /// Decoded at least once
    pub loaded: bool,
    /// Data replaced since the last persisted snapshot
    pub modified: bool,
    /// Created in this session rather than read from disk
    pub created: bool,
}

/// One addressable payload inside a container
#[derive(Debug, Clone)]
pub struct TocEntry {
    key: EntryKey,
    data: EntryData,
    persisted: EntryData,
    /// Uninterpreted record word, preserved
    pub unknown1: u64,
    /// Uninterpreted record word, preserved
    pub unknown2: u64,
    /// Uninterpreted record word, preserved
    pub unknown_16: u32,
    /// Uninterpreted record word, preserved
    pub unknown_64: u32,
    flags: EntryFlags,
    payload: Option<Box<TypedPayload>>,
}

impl TocEntry {
    /// Create an entry that was not read from disk
    pub fn new(key: EntryKey, data: EntryData) -> Self {
        Self {
            key,
            persisted: data.clone(),
            data,
            unknown1: 0,
            unknown2: 0,
            unknown_16: 16,
            unknown_64: 64,
            flags: EntryFlags::default(),
            payload: None,
        }
    }

    pub(crate) fn from_record(record: &TocEntryRecord, data: EntryData) -> Self {
        Self {
            key: EntryKey::new(record.file_id, record.type_id),
            persisted: data.clone(),
            data,
            unknown1: record.unknown1,
            unknown2: record.unknown2,
            unknown_16: record.unknown_16,
            unknown_64: record.unknown_64,
            flags: EntryFlags::default(),
            payload: None,
        }
    }

    /// Entry key
    pub fn key(&self) -> EntryKey {
        self.key
    }

    /// File hash
    pub fn file_id(&self) -> u64 {
        self.key.file_id
    }

    /// Type hash
    pub fn type_id(&self) -> u64 {
        self.key.type_id
    }

    pub(crate) fn set_file_id(&mut self, file_id: u64) {
        self.key.file_id = file_id;
    }

    /// Current payloads
    pub fn data(&self) -> &EntryData {
        &self.data
    }

    /// Payloads as of the last load or write
    pub fn persisted_data(&self) -> &EntryData {
        &self.persisted
    }

    /// Replace the payloads, dropping the decoded cache and marking the entry modified
    pub fn set_data(&mut self, data: EntryData) {
        self.data = data;
        self.payload = None;
        self.flags.modified = true;
    }

    /// Revert to the persisted payloads
    ///
    /// Returns whether the entry had been loaded, in which case the caller
    /// should decode it again.
    pub fn undo_modified(&mut self) -> bool {
        self.data = self.persisted.clone();
        self.payload = None;
        self.flags.modified = false;
        self.flags.loaded
    }

    /// Record the current payloads as the persisted snapshot
    pub fn mark_persisted(&mut self) {
        self.persisted = self.data.clone();
        self.flags.modified = false;
    }

    /// Editing state
    pub fn flags(&self) -> EntryFlags {
        self.flags
    }

    /// Whether the entry has been decoded
    pub fn is_loaded(&self) -> bool {
        self.flags.loaded
    }

    /// Whether the payloads differ from the persisted snapshot
    pub fn is_modified(&self) -> bool {
        self.flags.modified
    }

    /// Whether the entry was created in this session
    pub fn is_created(&self) -> bool {
        self.flags.created
    }

    /// Flag the entry as created in this session
    pub fn mark_created(&mut self) {
        self.flags.created = true;
    }

    /// Decoded payload, if cached
    pub fn payload(&self) -> Option<&TypedPayload> {
        self.payload.as_deref()
    }

    /// Mutable decoded payload, if cached
    pub fn payload_mut(&mut self) -> Option<&mut TypedPayload> {
        self.payload.as_deref_mut()
    }

    /// Cache a decoded payload and mark the entry loaded
    pub fn set_payload(&mut self, payload: TypedPayload) {
        self.payload = Some(Box::new(payload));
        self.flags.loaded = true;
    }

    /// Copy of this entry under a new file id, flagged as created
    pub fn duplicate_as(&self, file_id: u64) -> Self {
        let mut copy = self.clone();
        copy.key.file_id = file_id;
        copy.flags.created = true;
        copy
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_set_data_and_undo() {
        let key = EntryKey::new(1, 7);
        let mut entry = TocEntry::new(key, EntryData::index_only(vec![1, 2, 3]));
        assert!(!entry.is_modified());

        entry.set_data(EntryData::index_only(vec![9]));
        assert!(entry.is_modified());
        assert_eq!(entry.data().index.as_ref(), &[9]);
        assert_eq!(entry.persisted_data().index.as_ref(), &[1, 2, 3]);

        assert!(!entry.undo_modified());
        assert!(!entry.is_modified());
        assert_eq!(entry.data().index.as_ref(), &[1, 2, 3]);
    }

    #[test]
    fn test_clone_shares_payload_bytes() {
        let entry = TocEntry::new(EntryKey::new(1, 7), EntryData::index_only(vec![0u8; 64]));
        let copy = entry.duplicate_as(2);
        assert_eq!(copy.file_id(), 2);
        assert!(copy.is_created());
        assert_eq!(copy.data().index.as_ptr(), entry.data().index.as_ptr());
    }

    #[test]
    fn test_mark_persisted() {
        let mut entry = TocEntry::new(EntryKey::new(1, 7), EntryData::default());
        entry.set_data(EntryData::index_only(vec![5]));
        entry.mark_persisted();
        assert!(!entry.is_modified());
        entry.undo_modified();
        assert_eq!(entry.data().index.as_ref(), &[5]);
    }

    #[test]
    fn test_key_display() {
        assert_eq!(EntryKey::new(42, 7).to_string(), "42:0000000000000007");
    }
}
