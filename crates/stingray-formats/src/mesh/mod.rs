//! Mesh entry codec
//!
//! A mesh entry stores a directory in its index payload and vertex and index
//! buffers in its GPU payload.
//!
//! # Index Payload Layout
//!
//! ```text
//! MeshHeader         (116 bytes)  block offsets, bones and composite references
//! leading data                    uninterpreted, up to the first directory block
//! bone-info block                 u32 n; u32 rel[n]; raw blocks
//! stream-info block  (16-aligned) u32 n; u32 rel[n]; u32 mesh_id[n]; u32; StreamInfo[n]
//! mesh-info block                 u32 n; u32 rel[n]; u32 mesh_id[n]; MeshInfo[n]
//! material table                  u32 n; u32 section_id[n]; u64 material_id[n]
//! trailing data                   uninterpreted, up to the ending offset
//! u64 mesh count
//! ```
//!
//! Meshes without their own stream-info block reference a composite mesh
//! whose streams and GPU payload they share.
//!
//! # Decoding
//!
//! Each mesh info becomes one [`RawMesh`]: its sections become material
//! ranges, its index ranges are read at the stream's index width, and its
//! vertices are read one stride at a time. When the largest index does not
//! match the declared vertex count, the count is corrected from the indices.
//!
//! # Encoding
//!
//! Sections and the material table are rebuilt from each raw mesh's
//! materials. Every populated stream gets a fresh component table covering
//! the union of its meshes' attributes:
//!
//! | Attribute   | Format        |
//! |-------------|---------------|
//! | position    | vec3 `f32`    |
//! | normal      | palette-packed |
//! | uv (per set) | vec2 half    |
//! | bone weight | vec4 half     |
//! | bone index (per set) | vec4 `u8` |
//!
//! Vertex buffers are written per stream in recorded vertex-offset order and
//! padded to 16 bytes, followed by the index buffer in recorded index-offset
//! order. Indices that do not fit a 16-bit buffer are clamped and reported
//! as [`MeshError::CorruptGeometry`] diagnostics.

mod bone_info;
mod component;
mod error;
mod file;
pub(crate) mod header;
mod mesh_info;
mod normals;
mod raw;
mod stream_info;
mod transform;
mod vertex;

pub use bone_info::{BoneInfo, BoneInfoView};
pub use component::{Component, ComponentFormat, ComponentKind, ComponentValue};
pub use error::{MeshError, MeshResult};
pub use file::{EncodedMesh, MeshFile};
pub use header::{MeshHeader, declares_geometry};
pub use mesh_info::{MaterialTable, MeshInfo, MeshSection};
pub use normals::{NormalCodec, NormalPalette, normalize};
pub use raw::{PackedVector, RawMaterial, RawMesh, VertexLayout};
pub use stream_info::{StreamInfo, StreamInfoBlock};
pub use transform::{CustomizationInfo, LocalTransform, TransformInfo};
pub use vertex::{decode_vertices, encode_vertices};

use crate::stream::{ByteStream, StreamError, StreamResult};

/// Mesh layout constants
pub mod constants {
    /// Mesh header length
    pub const HEADER_SIZE: usize = 116;

    /// Slots in a stream's component table
    pub const COMPONENT_SLOTS: usize = 16;

    /// Component record length
    pub const COMPONENT_RECORD_SIZE: usize = 20;

    /// Alignment of the stream-info block and of each stream info
    pub const DIRECTORY_ALIGNMENT: usize = 16;

    /// Alignment of the end of each vertex buffer
    pub const VERTEX_BUFFER_ALIGNMENT: usize = 16;

    /// Offset of the section-id table within a mesh info
    pub const SECTION_TABLE_OFFSET: u32 = 0x80;

    /// Index type value selecting 32-bit indices
    pub const INDEX_TYPE_32BIT: u32 = 1;

    /// Section id used for ranges drawn with the default material
    pub const DEFAULT_MATERIAL_SHORT_ID: u32 = 155_175_220;

    /// Name of the engine's default material
    pub const DEFAULT_MATERIAL_NAME: &str = "StingrayDefaultMaterial";
}

/// Fail early when `count` elements of `element_size` bytes cannot fit in the rest of the buffer
pub(crate) fn check_count(s: &ByteStream, count: usize, element_size: usize) -> StreamResult<()> {
    let needed = count.saturating_mul(element_size);
    let available = s.len().saturating_sub(s.position());
    if needed > available {
        return Err(StreamError::BufferUnderrun {
            offset: s.position(),
            needed,
            available,
        });
    }
    Ok(())
}
