//! Fixed-size container records

use crate::toc::constants::{HEADER_RESERVED_SIZE, TOC_MAGIC};
use crate::toc::error::{TocError, TocResult};
use binrw::{BinRead, BinWrite};

/// Container header (72 bytes)
#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct TocHeader {
    /// Must be [`TOC_MAGIC`]
    pub magic: u32,
    /// Number of type groups
    pub num_types: u32,
    /// Number of entries
    pub num_files: u32,
    /// Uninterpreted, preserved
    pub reserved: u32,
    /// Uninterpreted, preserved
    pub reserved_block: [u8; HEADER_RESERVED_SIZE],
}

impl TocHeader {
    /// Header with the container magic and zeroed reserved fields
    pub fn new() -> Self {
        Self {
            magic: TOC_MAGIC,
            num_types: 0,
            num_files: 0,
            reserved: 0,
            reserved_block: [0; HEADER_RESERVED_SIZE],
        }
    }

    /// Reject headers without the container magic
    pub fn validate(&self) -> TocResult<()> {
        if self.magic != TOC_MAGIC {
            return Err(TocError::InvalidMagic(self.magic));
        }
        Ok(())
    }
}

impl Default for TocHeader {
    fn default() -> Self {
        Self::new()
    }
}

/// Type group record (32 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct TocTypeRecord {
    /// Always zero in shipped archives
    pub unused: u64,
    /// Type hash
    pub type_id: u64,
    /// Number of entries of this type
    pub entry_count: u64,
    /// Observed as 16
    pub unknown_16: u32,
    /// Observed as 64
    pub unknown_64: u32,
}

/// Entry record (80 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct TocEntryRecord {
    /// File hash
    pub file_id: u64,
    /// Type hash
    pub type_id: u64,
    /// Offset of the index payload in the index file
    pub index_offset: u64,
    /// Offset of the stream payload in the `.stream` file
    pub stream_offset: u64,
    /// Offset of the GPU payload in the `.gpu_resources` file
    pub gpu_offset: u64,
    /// Uninterpreted, preserved
    pub unknown1: u64,
    /// Uninterpreted, preserved
    pub unknown2: u64,
    /// Index payload length
    pub index_size: u32,
    /// Stream payload length
    pub stream_size: u32,
    /// GPU payload length
    pub gpu_size: u32,
    /// Observed as 16
    pub unknown_16: u32,
    /// Observed as 64
    pub unknown_64: u32,
    /// 1-based position within the entry's type group
    pub entry_index: u32,
}
