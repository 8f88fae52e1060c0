//! Mesh index-payload header

use crate::mesh::constants::HEADER_SIZE;
use crate::stream::{ByteStream, StreamResult};

/// Fixed 116-byte header at the start of a mesh index payload
///
/// Offsets are absolute within the index payload; zero means absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshHeader {
    /// Uninterpreted reference, preserved
    pub unknown_ref: u64,
    /// File id of the shared bone-names entry
    pub bones_ref: u64,
    /// File id of the composite mesh holding this mesh's streams
    pub composite_ref: u64,
    /// Uninterpreted, preserved
    pub header_data1: [u8; 28],
    /// Transform table
    pub transform_info_offset: u32,
    /// Uninterpreted, preserved
    pub header_data2: [u8; 20],
    /// Customization labels
    pub customization_info_offset: u32,
    /// Uninterpreted, preserved
    pub unknown_offset1: u32,
    /// Uninterpreted, preserved
    pub unknown_offset2: u32,
    /// Bone-info directory
    pub bone_info_offset: u32,
    /// Stream-info directory
    pub stream_info_offset: u32,
    /// Trailing mesh count
    pub ending_offset: u32,
    /// Mesh-info directory
    pub mesh_info_offset: u32,
    /// Uninterpreted, preserved
    pub header_unknown: u64,
    /// Material table
    pub materials_offset: u32,
}

impl Default for MeshHeader {
    fn default() -> Self {
        Self {
            unknown_ref: 0,
            bones_ref: 0,
            composite_ref: 0,
            header_data1: [0; 28],
            transform_info_offset: 0,
            header_data2: [0; 20],
            customization_info_offset: 0,
            unknown_offset1: 0,
            unknown_offset2: 0,
            bone_info_offset: 0,
            stream_info_offset: 0,
            ending_offset: 0,
            mesh_info_offset: 0,
            header_unknown: 0,
            materials_offset: 0,
        }
    }
}

impl MeshHeader {
    /// Transfer the header at the cursor position
    pub fn serialize(&mut self, s: &mut ByteStream) -> StreamResult<()> {
        self.unknown_ref = s.u64(self.unknown_ref)?;
        self.bones_ref = s.u64(self.bones_ref)?;
        self.composite_ref = s.u64(self.composite_ref)?;
        self.header_data1 = s.array(self.header_data1)?;
        self.transform_info_offset = s.u32(self.transform_info_offset)?;
        self.header_data2 = s.array(self.header_data2)?;
        self.customization_info_offset = s.u32(self.customization_info_offset)?;
        self.unknown_offset1 = s.u32(self.unknown_offset1)?;
        self.unknown_offset2 = s.u32(self.unknown_offset2)?;
        self.bone_info_offset = s.u32(self.bone_info_offset)?;
        self.stream_info_offset = s.u32(self.stream_info_offset)?;
        self.ending_offset = s.u32(self.ending_offset)?;
        self.mesh_info_offset = s.u32(self.mesh_info_offset)?;
        self.header_unknown = s.u64(self.header_unknown)?;
        self.materials_offset = s.u32(self.materials_offset)?;
        Ok(())
    }

    /// Whether the mesh stores its streams in a shared composite mesh
    pub fn uses_composite(&self) -> bool {
        self.stream_info_offset == 0 && self.composite_ref != 0
    }
}

/// Check whether a mesh index payload declares any vertex source
///
/// Returns `None` when the payload is too short to hold a header.
pub fn declares_geometry(index: &[u8]) -> Option<bool> {
    if index.len() < HEADER_SIZE {
        return None;
    }
    let mut header = MeshHeader::default();
    header
        .serialize(&mut ByteStream::reader(&index[..HEADER_SIZE]))
        .ok()?;
    Some(header.stream_info_offset != 0 || header.composite_ref != 0)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    fn encode(header: &MeshHeader) -> Vec<u8> {
        let mut s = ByteStream::writer();
        header.clone().serialize(&mut s).unwrap();
        s.into_inner()
    }

    #[test]
    fn test_header_size() {
        assert_eq!(encode(&MeshHeader::default()).len(), HEADER_SIZE);
    }

    #[test]
    fn test_declares_geometry() {
        let mut header = MeshHeader::default();
        assert_eq!(declares_geometry(&encode(&header)), Some(false));

        header.stream_info_offset = 128;
        assert_eq!(declares_geometry(&encode(&header)), Some(true));

        header.stream_info_offset = 0;
        header.composite_ref = 5;
        assert_eq!(declares_geometry(&encode(&header)), Some(true));
        assert!(header.uses_composite());

        assert_eq!(declares_geometry(&[0; 12]), None);
    }
}
