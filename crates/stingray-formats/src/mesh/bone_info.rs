//! Per-LOD skinning blocks
//!
//! Bone-info blocks are re-emitted exactly as read. The parsed view exposes
//! the bind matrices and the remap from local to skeleton bone indices.

use crate::mesh::check_count;
use crate::stream::{ByteStream, StreamResult};

/// Decoded contents of a bone-info block
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoneInfoView {
    /// Uninterpreted
    pub unknown1: u32,
    /// Column-major 4x4 bind matrices, one per bone
    pub matrices: Vec<[f32; 16]>,
    /// Skeleton bone index for each local bone
    pub real_indices: Vec<u32>,
    /// Offset of the trailing index remap table
    pub fake_indices_offset: u32,
}

/// One bone-info block
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoneInfo {
    raw: Vec<u8>,
    view: Option<BoneInfoView>,
}

impl BoneInfo {
    /// Wrap a block as read, parsing the view when possible
    pub fn from_raw(raw: Vec<u8>) -> Self {
        let view = parse_view(&raw).ok();
        Self { raw, view }
    }

    /// Bytes written back on encode
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Parsed view, if the block could be decoded
    pub fn view(&self) -> Option<&BoneInfoView> {
        self.view.as_ref()
    }

    /// Bones in the parsed view, zero if it could not be parsed
    pub fn num_bones(&self) -> usize {
        self.view.as_ref().map_or(0, |v| v.real_indices.len())
    }
}

fn parse_view(raw: &[u8]) -> StreamResult<BoneInfoView> {
    let mut s = ByteStream::reader(raw);
    let num_bones = s.u32(0)? as usize;
    let unknown1 = s.u32(0)?;
    let real_indices_offset = s.u32(0)? as usize;
    let fake_indices_offset = s.u32(0)?;

    check_count(&s, num_bones, 64)?;
    let mut matrices = Vec::with_capacity(num_bones);
    for _ in 0..num_bones {
        let mut matrix = [0f32; 16];
        for value in &mut matrix {
            *value = s.f32(0.0)?;
        }
        matrices.push(matrix);
    }

    s.seek(real_indices_offset);
    check_count(&s, num_bones, 4)?;
    let real_indices = (0..num_bones)
        .map(|_| s.u32(0))
        .collect::<StreamResult<Vec<_>>>()?;

    Ok(BoneInfoView {
        unknown1,
        matrices,
        real_indices,
        fake_indices_offset,
    })
}
