//! Stingray archive container format
//!
//! An archive is a triad of files sharing one base path:
//!
//! - `<path>`: the index file, holding the header, type groups, entry
//!   records and every entry's inline index payload
//! - `<path>.gpu_resources`: GPU payloads, each 64-byte aligned
//! - `<path>.stream`: stream payloads, each 64-byte aligned
//!
//! # Index File Layout
//!
//! ```text
//! TocHeader        (72 bytes)   magic 0xEFCDAB89, counts, reserved words
//! TocTypeRecord[]  (32 bytes)   one per type group
//! TocEntryRecord[] (80 bytes)   grouped by type-group order
//! index payloads                packed back to back
//! ```
//!
//! Entries are keyed by `(file_id, type_id)`; a container never holds two
//! entries with the same key. Entry records are emitted grouped by type-group
//! order, then insertion order, carrying a 1-based index within their group.
//!
//! # Example
//!
//! ```
//! use stingray_formats::toc::{EntryData, EntryKey, TocEntry, TocFile};
//!
//! let mut toc = TocFile::new("9ba626afa44a3aa3");
//! toc.add_entry(TocEntry::new(EntryKey::new(1, 7), EntryData::index_only(vec![1, 2, 3, 4])))?;
//!
//! let buffers = toc.to_buffers()?;
//! let parsed = TocFile::parse(buffers.index.into(), buffers.gpu.into(), buffers.stream.into())?;
//! assert!(parsed.contains(EntryKey::new(1, 7)));
//! # Ok::<(), stingray_formats::toc::TocError>(())
//! ```

mod builder;
mod entry;
mod error;
mod file;
mod header;

pub use builder::{TocBuffers, TocBuilder, TocLayout};
pub use entry::{EntryData, EntryFlags, EntryKey, TocEntry};
pub use error::{TocError, TocResult};
pub use file::{TocFile, TocListing, TocType, sibling_path};
pub use header::{TocEntryRecord, TocHeader, TocTypeRecord};

/// Container layout constants
pub mod constants {
    /// Index file magic
    pub const TOC_MAGIC: u32 = 0xEFCD_AB89;

    /// Header length
    pub const HEADER_SIZE: usize = 72;

    /// Reserved block at the end of the header
    pub const HEADER_RESERVED_SIZE: usize = 56;

    /// Type record length
    pub const TYPE_RECORD_SIZE: usize = 32;

    /// Entry record length
    pub const ENTRY_RECORD_SIZE: usize = 80;

    /// Alignment of GPU and stream payloads
    pub const PAYLOAD_ALIGNMENT: usize = 64;

    /// Suffix of the GPU payload file
    pub const GPU_SUFFIX: &str = ".gpu_resources";

    /// Suffix of the stream payload file
    pub const STREAM_SUFFIX: &str = ".stream";
}
