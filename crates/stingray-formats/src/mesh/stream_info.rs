//! Vertex and index buffer descriptors

use crate::mesh::check_count;
use crate::mesh::component::Component;
use crate::mesh::constants::{COMPONENT_RECORD_SIZE, COMPONENT_SLOTS, DIRECTORY_ALIGNMENT};
use crate::mesh::error::{MeshError, MeshResult};
use crate::stream::{ByteStream, align_up};

/// Layout and location of one vertex buffer and its index buffer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamInfo {
    /// Component table id
    pub component_info_id: u64,
    /// Components in vertex order
    pub components: Vec<Component>,
    /// Vertex buffer id
    pub vertex_buffer_id: u64,
    /// Uninterpreted, preserved
    pub vertex_buffer_unknown1: u64,
    /// Vertices in the buffer
    pub num_vertices: u32,
    /// Declared bytes per vertex
    pub vertex_stride: u32,
    /// Uninterpreted, preserved
    pub vertex_buffer_unknown2: u64,
    /// Uninterpreted, preserved
    pub vertex_buffer_unknown3: u64,
    /// Index buffer id
    pub index_buffer_id: u64,
    /// Uninterpreted, preserved
    pub index_buffer_unknown1: u64,
    /// Indices in the buffer
    pub num_indices: u32,
    /// `1` means 32-bit indices, anything else 16-bit
    pub index_type: u32,
    /// Uninterpreted, preserved
    pub index_buffer_unknown2: u64,
    /// Uninterpreted, preserved
    pub index_buffer_unknown3: u64,
    /// Offset of the vertex buffer in the GPU payload
    pub vertex_buffer_offset: u32,
    /// Vertex buffer length, including alignment padding
    pub vertex_buffer_size: u32,
    /// Offset of the index buffer in the GPU payload
    pub index_buffer_offset: u32,
    /// Index buffer length
    pub index_buffer_size: u32,
    /// Uninterpreted, preserved
    pub unknown: [u8; 16],
    /// Raw bytes of the component slots past the last component, preserved
    pub unused_slots: Vec<u8>,
}

impl StreamInfo {
    /// Sum of the component sizes
    pub fn stride(&self) -> u32 {
        self.components.iter().map(|c| c.size() as u32).sum()
    }

    /// Whether indices are 32 bits wide
    pub fn uses_32bit_indices(&self) -> bool {
        self.index_type == 1
    }

    /// Bytes per index value
    pub fn index_width(&self) -> usize {
        if self.uses_32bit_indices() { 4 } else { 2 }
    }

    /// Check that the declared stride covers every component
    pub fn validate_stride(&self) -> MeshResult<()> {
        let derived = self.stride();
        if self.vertex_stride < derived {
            return Err(MeshError::StrideMismatch {
                declared: self.vertex_stride,
                derived,
            });
        }
        Ok(())
    }

    /// Transfer one 448-byte stream record
    pub fn serialize(&mut self, s: &mut ByteStream) -> MeshResult<()> {
        let start = s.position();
        self.component_info_id = s.u64(self.component_info_id)?;

        s.seek(start + 8 + COMPONENT_SLOTS * COMPONENT_RECORD_SIZE);
        let num_components = s.u64(self.components.len() as u64)? as usize;
        if num_components > COMPONENT_SLOTS {
            return Err(MeshError::TooManyComponents(num_components));
        }
        self.vertex_buffer_id = s.u64(self.vertex_buffer_id)?;
        self.vertex_buffer_unknown1 = s.u64(self.vertex_buffer_unknown1)?;
        self.num_vertices = s.u32(self.num_vertices)?;
        self.vertex_stride = s.u32(self.vertex_stride)?;
        self.vertex_buffer_unknown2 = s.u64(self.vertex_buffer_unknown2)?;
        self.vertex_buffer_unknown3 = s.u64(self.vertex_buffer_unknown3)?;

        self.index_buffer_id = s.u64(self.index_buffer_id)?;
        self.index_buffer_unknown1 = s.u64(self.index_buffer_unknown1)?;
        self.num_indices = s.u32(self.num_indices)?;
        self.index_type = s.u32(self.index_type)?;
        self.index_buffer_unknown2 = s.u64(self.index_buffer_unknown2)?;
        self.index_buffer_unknown3 = s.u64(self.index_buffer_unknown3)?;

        self.vertex_buffer_offset = s.u32(self.vertex_buffer_offset)?;
        self.vertex_buffer_size = s.u32(self.vertex_buffer_size)?;
        self.index_buffer_offset = s.u32(self.index_buffer_offset)?;
        self.index_buffer_size = s.u32(self.index_buffer_size)?;
        self.unknown = s.array(self.unknown)?;
        let end = align_up(s.position(), DIRECTORY_ALIGNMENT);

        s.seek(start + 8);
        if s.is_reading() {
            self.components = vec![Component::default(); num_components];
        }
        for component in &mut self.components {
            component.serialize(s)?;
        }
        let tail_len = COMPONENT_SLOTS.saturating_sub(self.components.len()) * COMPONENT_RECORD_SIZE;
        if s.is_writing() && self.unused_slots.len() != tail_len {
            self.unused_slots = vec![0; tail_len];
        }
        self.unused_slots = s.bytes(&self.unused_slots, tail_len)?;
        s.seek(end);
        if s.is_writing() && s.len() < end {
            s.align(DIRECTORY_ALIGNMENT);
        }
        Ok(())
    }
}

/// Directory of stream infos, shared by meshes and composite meshes
///
/// ```text
/// u32 count
/// u32 offsets[count]    relative to the block start
/// u32 mesh_ids[count]
/// u32 unknown
/// StreamInfo[count]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamInfoBlock {
    /// Stream records in block order
    pub streams: Vec<StreamInfo>,
    /// Mesh id recorded for each stream
    pub mesh_ids: Vec<u32>,
    /// Uninterpreted, preserved
    pub unknown: u32,
    offsets: Vec<u32>,
}

impl StreamInfoBlock {
    /// Block over the given streams
    pub fn new(streams: Vec<StreamInfo>) -> Self {
        Self {
            streams,
            ..Self::default()
        }
    }

    /// Transfer the block
    ///
    /// In read mode the block is read at `block_offset`; in write mode it is
    /// written at the next 16-byte boundary and `block_offset` is updated.
    pub fn serialize(&mut self, s: &mut ByteStream, block_offset: &mut u32) -> MeshResult<()> {
        if s.is_reading() {
            s.seek(*block_offset as usize);
        } else {
            s.align(DIRECTORY_ALIGNMENT);
            *block_offset = s.position() as u32;
        }
        let base = *block_offset as usize;

        let count = s.u32(self.streams.len() as u32)? as usize;
        if s.is_reading() {
            check_count(s, count, 8)?;
            self.offsets = vec![0; count];
            self.mesh_ids = vec![0; count];
            self.streams = vec![StreamInfo::default(); count];
        } else {
            self.offsets.resize(count, 0);
            self.mesh_ids.resize(count, 0);
        }

        for offset in &mut self.offsets {
            *offset = s.u32(*offset)?;
        }
        for mesh_id in &mut self.mesh_ids {
            *mesh_id = s.u32(*mesh_id)?;
        }
        self.unknown = s.u32(self.unknown)?;

        for (offset, stream) in self.offsets.iter_mut().zip(&mut self.streams) {
            if s.is_reading() {
                s.seek(base + *offset as usize);
            } else {
                *offset = (s.position() - base) as u32;
            }
            stream.serialize(s)?;
        }
        Ok(())
    }

    /// Overwrite the offset table of a block written earlier
    pub fn rewrite_offsets(&self, s: &mut ByteStream, block_offset: u32) -> MeshResult<()> {
        s.seek(block_offset as usize + 4);
        for &offset in &self.offsets {
            s.u32(offset)?;
        }
        Ok(())
    }
}
