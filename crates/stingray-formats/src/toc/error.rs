//! Error types for container operations

use thiserror::Error;

/// Container operation result type
pub type TocResult<T> = Result<T, TocError>;

/// Errors raised while parsing, building or editing a container
#[derive(Debug, Error)]
pub enum TocError {
    /// Index file does not start with the container magic
    #[error("Invalid container magic: expected 0xEFCDAB89, got {0:#010x}")]
    InvalidMagic(u32),

    /// An entry's payload lies outside its file
    #[error(
        "Entry {file_id:016x}: {region} payload at {offset}+{size} exceeds file size {available}"
    )]
    PayloadOutOfBounds {
        /// Owning entry
        file_id: u64,
        /// `index`, `gpu` or `stream`
        region: &'static str,
        /// Recorded payload offset
        offset: u64,
        /// Recorded payload size
        size: u32,
        /// Size of the backing file
        available: usize,
    },

    /// A payload does not fit in a 32-bit size field
    #[error("Entry {file_id:016x}: {region} payload of {size} bytes is too large")]
    PayloadTooLarge {
        /// Owning entry
        file_id: u64,
        /// `index`, `gpu` or `stream`
        region: &'static str,
        /// Payload length
        size: usize,
    },

    /// An entry with the same key already exists
    #[error("Duplicate entry {file_id:016x} of type {type_id:016x}")]
    DuplicateKey {
        /// File hash
        file_id: u64,
        /// Type hash
        type_id: u64,
    },

    /// No entry with this key exists
    #[error("Entry {file_id:016x} of type {type_id:016x} not found")]
    EntryNotFound {
        /// File hash
        file_id: u64,
        /// Type hash
        type_id: u64,
    },

    /// A mesh entry references neither a composite mesh nor stream info
    #[error("Mesh {0:016x} has no geometry: no composite reference and no stream info")]
    MissingGeometry(u64),

    /// Binary record error
    #[error("Binary format error: {0}")]
    BinRead(#[from] binrw::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TocError {
    /// Check if the container bytes themselves are malformed
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidMagic(_) | Self::PayloadOutOfBounds { .. } | Self::BinRead(_)
        )
    }
}
