//! Mesh-info records and their sections

use crate::mesh::check_count;
use crate::mesh::constants::SECTION_TABLE_OFFSET;
use crate::mesh::error::MeshResult;
use crate::stream::{ByteStream, StreamResult};

/// A contiguous vertex and index range drawn with one material
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeshSection {
    /// Uninterpreted, rewritten as the section number
    pub unknown1: u32,
    /// First vertex in the stream
    pub vertex_offset: u32,
    /// Vertices covered by the section
    pub num_vertices: u32,
    /// First index in the stream
    pub index_offset: u32,
    /// Indices drawn by the section
    pub num_indices: u32,
    /// Uninterpreted, rewritten as the section number
    pub unknown2: u32,
}

impl MeshSection {
    /// Transfer one section record
    pub fn serialize(&mut self, s: &mut ByteStream) -> StreamResult<()> {
        self.unknown1 = s.u32(self.unknown1)?;
        self.vertex_offset = s.u32(self.vertex_offset)?;
        self.num_vertices = s.u32(self.num_vertices)?;
        self.index_offset = s.u32(self.index_offset)?;
        self.num_indices = s.u32(self.num_indices)?;
        self.unknown2 = s.u32(self.unknown2)?;
        Ok(())
    }
}

/// One drawable mesh: a stream reference, a transform and its sections
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshInfo {
    /// Uninterpreted, preserved
    pub unknown1: u64,
    /// Uninterpreted, preserved
    pub data1: [u8; 32],
    /// Mesh name hash
    pub mesh_id: u32,
    /// Uninterpreted, preserved
    pub unknown3: u32,
    /// Row of the transform table
    pub transform_index: u32,
    /// Uninterpreted, preserved
    pub unknown4: u32,
    /// LOD level; `-1` for meshes outside the LOD chain
    pub lod_index: i32,
    /// Stream holding this mesh's buffers
    pub stream_index: u32,
    /// Uninterpreted, preserved
    pub data2: [u8; 40],
    /// Uninterpreted, preserved
    pub unknown8: u64,
    /// Section ids, parallel to `sections`; material lookups key on these
    pub section_ids: Vec<u32>,
    /// Draw ranges, parallel to `section_ids`
    pub sections: Vec<MeshSection>,
}

impl Default for MeshInfo {
    fn default() -> Self {
        Self {
            unknown1: 0,
            data1: [0; 32],
            mesh_id: 0,
            unknown3: 0,
            transform_index: 0,
            unknown4: 0,
            lod_index: -1,
            stream_index: 0,
            data2: [0; 40],
            unknown8: 0,
            section_ids: Vec::new(),
            sections: Vec::new(),
        }
    }
}

impl MeshInfo {
    /// Transfer the block at the cursor position
    pub fn serialize(&mut self, s: &mut ByteStream) -> MeshResult<()> {
        self.unknown1 = s.u64(self.unknown1)?;
        self.data1 = s.array(self.data1)?;
        self.mesh_id = s.u32(self.mesh_id)?;
        self.unknown3 = s.u32(self.unknown3)?;
        self.transform_index = s.u32(self.transform_index)?;
        self.unknown4 = s.u32(self.unknown4)?;
        self.lod_index = s.i32(self.lod_index)?;
        self.stream_index = s.u32(self.stream_index)?;
        self.data2 = s.array(self.data2)?;

        let count = self.sections.len() as u32;
        s.u32(count)?;
        s.u32(SECTION_TABLE_OFFSET)?;
        self.unknown8 = s.u64(self.unknown8)?;
        let count = s.u32(count)? as usize;
        s.u32(SECTION_TABLE_OFFSET + 4 * count as u32)?;

        if s.is_reading() {
            check_count(s, count, 28)?;
            self.section_ids = vec![0; count];
            self.sections = vec![MeshSection::default(); count];
        } else {
            self.section_ids.resize(count, 0);
        }
        for id in &mut self.section_ids {
            *id = s.u32(*id)?;
        }
        for section in &mut self.sections {
            section.serialize(s)?;
        }
        Ok(())
    }

    /// Whether this is a reduced-detail level
    pub fn is_lod(&self) -> bool {
        self.lod_index > 0
    }
}

/// Material assignment table: section id to material resource id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterialTable {
    /// Section ids, parallel to `material_ids`
    pub section_ids: Vec<u32>,
    /// Material resource ids
    pub material_ids: Vec<u64>,
}

impl MaterialTable {
    /// Transfer the table at the cursor position
    pub fn serialize(&mut self, s: &mut ByteStream) -> MeshResult<()> {
        let count = s.u32(self.section_ids.len() as u32)? as usize;
        if s.is_reading() {
            check_count(s, count, 12)?;
            self.section_ids = vec![0; count];
            self.material_ids = vec![0; count];
        }
        for id in &mut self.section_ids {
            *id = s.u32(*id)?;
        }
        for id in &mut self.material_ids {
            *id = s.u64(*id)?;
        }
        Ok(())
    }

    /// Material assigned to a section id
    pub fn material_for(&self, section_id: u32) -> Option<u64> {
        self.section_ids
            .iter()
            .position(|&id| id == section_id)
            .and_then(|i| self.material_ids.get(i).copied())
    }

    /// Append an assignment
    pub fn push(&mut self, section_id: u32, material_id: u64) {
        self.section_ids.push(section_id);
        self.material_ids.push(material_id);
    }

    /// Remove every assignment
    pub fn clear(&mut self) {
        self.section_ids.clear();
        self.material_ids.clear();
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_mesh_info_round_trip() {
        let mut info = MeshInfo {
            mesh_id: 0xDEAD,
            lod_index: 2,
            stream_index: 1,
            transform_index: 4,
            section_ids: vec![11, 12],
            sections: vec![
                MeshSection {
                    unknown1: 0,
                    vertex_offset: 0,
                    num_vertices: 30,
                    index_offset: 0,
                    num_indices: 60,
                    unknown2: 0,
                },
                MeshSection {
                    unknown1: 1,
                    vertex_offset: 0,
                    num_vertices: 30,
                    index_offset: 60,
                    num_indices: 12,
                    unknown2: 7,
                },
            ],
            ..MeshInfo::default()
        };

        let mut s = ByteStream::writer();
        info.serialize(&mut s).unwrap();
        assert_eq!(s.len(), 128 + 8 + 2 * 24);

        let bytes = s.into_inner();
        assert_eq!(&bytes[108..112], &0x80u32.to_le_bytes());
        assert_eq!(&bytes[124..128], &0x88u32.to_le_bytes());

        let mut decoded = MeshInfo::default();
        decoded.serialize(&mut ByteStream::reader(bytes)).unwrap();
        assert_eq!(decoded, info);
        assert!(decoded.is_lod());
    }

    #[test]
    fn test_material_table_lookup() {
        let mut table = MaterialTable::default();
        table.push(5, 500);
        table.push(6, 600);
        assert_eq!(table.material_for(6), Some(600));
        assert_eq!(table.material_for(7), None);

        let mut s = ByteStream::writer();
        table.serialize(&mut s).unwrap();
        assert_eq!(s.len(), 4 + 2 * 4 + 2 * 8);
    }
}
