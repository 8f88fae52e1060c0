//! Two-pass container builder
//!
//! Pass 1 ([`TocBuilder::layout`]) walks entries in type-group order and
//! assigns every payload offset into a side table. Pass 2
//! ([`TocBuilder::build`]) emits the header, type records and entry records
//! from that table and copies the payloads to their assigned offsets.
//!
//! Offset rules:
//! - index payloads are packed back to back right after the entry table
//! - GPU and stream payloads start at the running file position rounded up to
//!   [`PAYLOAD_ALIGNMENT`]; empty payloads still receive an aligned offset but
//!   do not move the running position
//! - sibling files end at the last payload byte, without trailing padding

use crate::stream::align_up;
use crate::toc::constants::{ENTRY_RECORD_SIZE, HEADER_SIZE, PAYLOAD_ALIGNMENT, TYPE_RECORD_SIZE};
use crate::toc::error::{TocError, TocResult};
use crate::toc::file::TocFile;
use crate::toc::header::{TocEntryRecord, TocHeader, TocTypeRecord};
use binrw::BinWrite;
use std::io::Cursor;

/// Encoded contents of the three container files
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TocBuffers {
    /// Index file
    pub index: Vec<u8>,
    /// `.gpu_resources` file
    pub gpu: Vec<u8>,
    /// `.stream` file
    pub stream: Vec<u8>,
}

/// Offsets assigned in pass 1
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocLayout {
    /// Type records in emission order
    pub types: Vec<TocTypeRecord>,
    /// Entry records in emission order, paired with the entry's position in the container
    pub entries: Vec<(usize, TocEntryRecord)>,
    /// Final index file length
    pub index_len: usize,
    /// Final `.gpu_resources` length
    pub gpu_len: usize,
    /// Final `.stream` length
    pub stream_len: usize,
}

/// Builder that lays out and encodes a [`TocFile`]
pub struct TocBuilder<'a> {
    toc: &'a TocFile,
}

impl<'a> TocBuilder<'a> {
    /// Create a builder over a container
    pub fn new(toc: &'a TocFile) -> Self {
        Self { toc }
    }

    /// Pass 1: assign offsets
    pub fn layout(&self) -> TocResult<TocLayout> {
        let types = self.toc.types();
        let table_end = HEADER_SIZE
            + types.len() * TYPE_RECORD_SIZE
            + self.toc.len() * ENTRY_RECORD_SIZE;

        let mut index_pos = table_end;
        let mut gpu_pos = 0usize;
        let mut stream_pos = 0usize;
        let mut type_records = Vec::with_capacity(types.len());
        let mut entry_records = Vec::with_capacity(self.toc.len());

        for group in types {
            let mut count = 0u32;
            for (position, entry) in self
                .toc
                .iter()
                .enumerate()
                .filter(|(_, entry)| entry.type_id() == group.type_id)
            {
                count += 1;
                let data = entry.data();
                let index_size = payload_size(entry.file_id(), "index", data.index.len())?;
                let gpu_size = payload_size(entry.file_id(), "gpu", data.gpu.len())?;
                let stream_size = payload_size(entry.file_id(), "stream", data.stream.len())?;

                let index_offset = index_pos;
                index_pos += data.index.len();

                let gpu_offset = align_up(gpu_pos, PAYLOAD_ALIGNMENT);
                if gpu_size > 0 {
                    gpu_pos = gpu_offset + data.gpu.len();
                }

                let stream_offset = align_up(stream_pos, PAYLOAD_ALIGNMENT);
                if stream_size > 0 {
                    stream_pos = stream_offset + data.stream.len();
                }

                entry_records.push((
                    position,
                    TocEntryRecord {
                        file_id: entry.file_id(),
                        type_id: entry.type_id(),
                        index_offset: index_offset as u64,
                        stream_offset: stream_offset as u64,
                        gpu_offset: gpu_offset as u64,
                        unknown1: entry.unknown1,
                        unknown2: entry.unknown2,
                        index_size,
                        stream_size,
                        gpu_size,
                        unknown_16: entry.unknown_16,
                        unknown_64: entry.unknown_64,
                        entry_index: count,
                    },
                ));
            }

            type_records.push(TocTypeRecord {
                unused: group.unused,
                type_id: group.type_id,
                entry_count: u64::from(count),
                unknown_16: group.unknown_16,
                unknown_64: group.unknown_64,
            });
        }

        Ok(TocLayout {
            types: type_records,
            entries: entry_records,
            index_len: index_pos,
            gpu_len: gpu_pos,
            stream_len: stream_pos,
        })
    }

    /// Pass 2: emit the three files from the layout
    pub fn build(&self) -> TocResult<TocBuffers> {
        let layout = self.layout()?;

        let header = TocHeader {
            num_types: layout.types.len() as u32,
            num_files: layout.entries.len() as u32,
            reserved: self.toc.reserved,
            reserved_block: self.toc.reserved_block,
            ..TocHeader::new()
        };

        let mut index = Cursor::new(Vec::with_capacity(layout.index_len));
        header.write(&mut index)?;
        for record in &layout.types {
            record.write(&mut index)?;
        }
        for (_, record) in &layout.entries {
            record.write(&mut index)?;
        }

        let mut index = index.into_inner();
        index.resize(layout.index_len, 0);
        let mut gpu = vec![0u8; layout.gpu_len];
        let mut stream = vec![0u8; layout.stream_len];

        let entries: Vec<_> = self.toc.iter().collect();
        for (position, record) in &layout.entries {
            let data = entries[*position].data();
            copy_into(&mut index, record.index_offset, &data.index);
            copy_into(&mut gpu, record.gpu_offset, &data.gpu);
            copy_into(&mut stream, record.stream_offset, &data.stream);
        }

        Ok(TocBuffers { index, gpu, stream })
    }
}

fn payload_size(file_id: u64, region: &'static str, size: usize) -> TocResult<u32> {
    u32::try_from(size).map_err(|_| TocError::PayloadTooLarge {
        file_id,
        region,
        size,
    })
}

fn copy_into(target: &mut [u8], offset: u64, payload: &[u8]) {
    if payload.is_empty() {
        return;
    }
    let start = offset as usize;
    target[start..start + payload.len()].copy_from_slice(payload);
}
