//! Composite mesh entries
//!
//! A composite mesh holds vertex and index streams shared by several mesh
//! entries. Its index payload carries a small header and a stream-info block
//! with the same layout as a mesh's; its GPU payload holds the buffers.

use crate::mesh::{MeshResult, StreamInfoBlock};
use crate::stream::ByteStream;
use crate::toc::EntryData;
use bytes::Bytes;

/// Decoded composite mesh entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompositeMesh {
    /// Uninterpreted, preserved
    pub unknown1: u64,
    /// Number of mesh entries sharing these streams
    pub num_external_meshes: u32,
    /// Offset of the stream-info block in the index payload
    pub stream_info_offset: u32,
    /// Uninterpreted bytes before the stream-info block
    pub data: Vec<u8>,
    /// Shared stream layouts
    pub streams: StreamInfoBlock,
    /// Shared vertex and index buffers
    pub gpu: Bytes,
}

impl CompositeMesh {
    /// Decode a composite mesh entry
    pub fn decode(entry: &EntryData) -> MeshResult<Self> {
        let mut composite = Self {
            gpu: entry.gpu.clone(),
            ..Self::default()
        };
        composite.serialize(&mut ByteStream::reader(entry.index.as_ref()))?;
        Ok(composite)
    }

    /// Encode the entry, placing the stream-info block after `data`
    pub fn encode(&self) -> MeshResult<EntryData> {
        let mut composite = self.clone();
        let mut s = ByteStream::writer();
        composite.serialize(&mut s)?;
        s.seek(12);
        s.u32(composite.stream_info_offset)?;
        composite
            .streams
            .rewrite_offsets(&mut s, composite.stream_info_offset)?;
        Ok(EntryData::new(s.into_inner(), self.gpu.clone(), Bytes::new()))
    }

    fn serialize(&mut self, s: &mut ByteStream) -> MeshResult<()> {
        self.unknown1 = s.u64(self.unknown1)?;
        self.num_external_meshes = s.u32(self.num_external_meshes)?;
        self.stream_info_offset = s.u32(self.stream_info_offset)?;
        let data_len = if s.is_reading() {
            (self.stream_info_offset as usize).saturating_sub(s.position())
        } else {
            self.data.len()
        };
        self.data = s.bytes(&self.data, data_len)?;
        self.streams.serialize(s, &mut self.stream_info_offset)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mesh::StreamInfo;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_round_trip_keeps_gpu_payload() {
        let composite = CompositeMesh {
            unknown1: 5,
            num_external_meshes: 2,
            data: vec![0xAB; 20],
            streams: StreamInfoBlock::new(vec![StreamInfo {
                vertex_stride: 12,
                ..StreamInfo::default()
            }]),
            gpu: Bytes::from_static(&[1, 2, 3]),
            ..CompositeMesh::default()
        };

        let entry = composite.encode().unwrap();
        assert_eq!(&entry.index[12..16], &48u32.to_le_bytes());

        let decoded = CompositeMesh::decode(&entry).unwrap();
        assert_eq!(decoded.stream_info_offset, 48);
        assert_eq!(decoded.data, vec![0xAB; 20]);
        assert_eq!(decoded.streams.streams[0].vertex_stride, 12);
        assert_eq!(decoded.gpu.as_ref(), &[1, 2, 3]);
        assert_eq!(decoded.encode().unwrap(), entry);
    }
}
