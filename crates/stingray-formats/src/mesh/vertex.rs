//! Vertex and index buffer codec
//!
//! Each vertex is a record of `vertex_stride` bytes holding the stream's
//! components back to back. Reading always advances exactly one stride per
//! vertex, so padding after the last component is skipped.

use crate::mesh::component::{Component, ComponentFormat, ComponentKind, ComponentValue};
use crate::mesh::error::{MeshError, MeshResult};
use crate::mesh::normals::{NormalCodec, normalize};
use crate::mesh::raw::{PackedVector, RawMesh, VertexLayout};
use crate::mesh::stream_info::StreamInfo;
use crate::stream::{ByteStream, StreamResult};
use tracing::warn;

/// Decode `count` vertices laid out as `stream` describes
pub fn decode_vertices(
    stream: &StreamInfo,
    buffer: &[u8],
    count: usize,
    normals: Option<&dyn NormalCodec>,
) -> MeshResult<RawMesh> {
    stream.validate_stride()?;
    let mut mesh = RawMesh::new(0);
    mesh.init_vertices(count, &VertexLayout::from_components(&stream.components));
    transfer_vertices(&mut ByteStream::reader(buffer), stream, &mut mesh, normals)?;
    Ok(mesh)
}

/// Encode every vertex of `mesh` laid out as `stream` describes
pub fn encode_vertices(
    stream: &StreamInfo,
    mesh: &RawMesh,
    normals: Option<&dyn NormalCodec>,
) -> MeshResult<Vec<u8>> {
    stream.validate_stride()?;
    let mut mesh = mesh.clone();
    let mut s = ByteStream::writer();
    transfer_vertices(&mut s, stream, &mut mesh, normals)?;
    Ok(s.into_inner())
}

pub(crate) fn transfer_vertices(
    s: &mut ByteStream,
    stream: &StreamInfo,
    mesh: &mut RawMesh,
    normals: Option<&dyn NormalCodec>,
) -> MeshResult<()> {
    let stride = stream.vertex_stride as usize;
    let mut warned = false;
    for vertex in 0..mesh.vertex_count() {
        let start = s.position();
        for component in &stream.components {
            transfer_component(s, component, mesh, vertex, normals, &mut warned)?;
        }
        let written = s.position() - start;
        if s.is_writing() && written < stride {
            pad(s, stride - written)?;
        }
        s.seek(start + stride);
    }
    Ok(())
}

fn transfer_component(
    s: &mut ByteStream,
    component: &Component,
    mesh: &mut RawMesh,
    vertex: usize,
    normals: Option<&dyn NormalCodec>,
    warned: &mut bool,
) -> MeshResult<()> {
    let format = component.format;
    let set = component.index as usize;
    match component.kind {
        ComponentKind::Position => {
            let Some(slot) = mesh.positions.get_mut(vertex) else {
                return Ok(pad(s, format.size())?);
            };
            let [x, y, z, _] = format
                .transfer(s, ComponentValue::Float([slot[0], slot[1], slot[2], 0.0]))?
                .to_floats();
            *slot = [x, y, z];
        }
        ComponentKind::Normal => {
            packed_vector(s, format, mesh.normals.get_mut(vertex), normals, true)?;
        }
        ComponentKind::Tangent => {
            packed_vector(s, format, mesh.tangents.get_mut(vertex), normals, false)?;
        }
        ComponentKind::Bitangent => {
            packed_vector(s, format, mesh.bitangents.get_mut(vertex), normals, false)?;
        }
        ComponentKind::Uv => {
            let Some(slot) = mesh.uvs.get_mut(set).and_then(|uvs| uvs.get_mut(vertex)) else {
                return Ok(pad(s, format.size())?);
            };
            let [u, v, _, _] = format
                .transfer(s, ComponentValue::Float([slot[0], slot[1], 0.0, 0.0]))?
                .to_floats();
            *slot = [u, v];
        }
        ComponentKind::Color => {
            let Some(slot) = mesh.colors.get_mut(vertex) else {
                return Ok(pad(s, format.size())?);
            };
            *slot = format.transfer(s, ComponentValue::Float(*slot))?.to_floats();
        }
        ComponentKind::BoneIndex => {
            let Some(slot) = mesh
                .bone_indices
                .get_mut(set)
                .and_then(|sets| sets.get_mut(vertex))
            else {
                return Ok(pad(s, format.size())?);
            };
            *slot = format.transfer(s, ComponentValue::UInt(*slot))?.to_uints();
        }
        ComponentKind::BoneWeight => {
            if set > 0 {
                if !*warned {
                    warn!("Mesh {}: skipping bone weight set {set}", mesh.mesh_info_index);
                    *warned = true;
                }
                return Ok(pad(s, format.size())?);
            }
            let Some(slot) = mesh.weights.get_mut(vertex) else {
                return Ok(pad(s, format.size())?);
            };
            *slot = format.transfer(s, ComponentValue::Float(*slot))?.to_floats();
        }
        ComponentKind::Other(_) => pad(s, format.size())?,
    }
    Ok(())
}

fn packed_vector(
    s: &mut ByteStream,
    format: ComponentFormat,
    slot: Option<&mut PackedVector>,
    codec: Option<&dyn NormalCodec>,
    normalize_on_read: bool,
) -> MeshResult<()> {
    let Some(slot) = slot else {
        return Ok(pad(s, format.size())?);
    };

    let value = match (format, *slot) {
        (ComponentFormat::PackedNormal, PackedVector::Packed(packed)) => {
            ComponentValue::Packed(packed)
        }
        (ComponentFormat::PackedNormal, PackedVector::Vector(v)) => {
            let codec = codec.ok_or(MeshError::NormalCodecRequired)?;
            ComponentValue::Packed(codec.quantize(v))
        }
        (_, PackedVector::Vector([x, y, z])) => ComponentValue::Float([x, y, z, 0.0]),
        (_, PackedVector::Packed(packed)) if s.is_writing() => {
            let [x, y, z] = codec
                .and_then(|c| c.dequantize(packed))
                .ok_or(MeshError::NormalCodecRequired)?;
            ComponentValue::Float([x, y, z, 0.0])
        }
        (_, PackedVector::Packed(_)) => ComponentValue::Float([0.0; 4]),
    };

    let out = format.transfer(s, value)?;
    if s.is_reading() {
        *slot = match out {
            ComponentValue::Packed(packed) => PackedVector::Packed(packed),
            other => {
                let [x, y, z, _] = other.to_floats();
                if normalize_on_read {
                    PackedVector::Vector(normalize([x, y, z]))
                } else {
                    PackedVector::Vector([x, y, z])
                }
            }
        };
    }
    Ok(())
}

/// Skip `len` bytes when reading, write zeros when writing
fn pad(s: &mut ByteStream, len: usize) -> StreamResult<()> {
    if s.is_reading() {
        s.skip(len);
    } else {
        s.bytes(&vec![0; len], len)?;
    }
    Ok(())
}

/// Transfer a run of index values of `width` bytes each
pub(crate) fn transfer_indices(
    s: &mut ByteStream,
    width: usize,
    values: &mut [u32],
) -> StreamResult<()> {
    for value in values {
        *value = if width == 4 {
            s.u32(*value)?
        } else {
            u32::from(s.u16(*value as u16)?)
        };
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn stream(components: Vec<Component>, stride: u32) -> StreamInfo {
        StreamInfo {
            components,
            vertex_stride: stride,
            ..StreamInfo::default()
        }
    }

    #[test]
    fn test_stride_padding_is_skipped() {
        let info = stream(
            vec![Component::new(ComponentKind::Position, ComponentFormat::Vec3Float, 0)],
            16,
        );
        let mut buffer = Vec::new();
        for v in [[1.0f32, 2.0, 3.0], [4.0, 5.0, 6.0]] {
            for c in v {
                buffer.extend_from_slice(&c.to_le_bytes());
            }
            buffer.extend_from_slice(&[0xEE; 4]);
        }

        let mesh = decode_vertices(&info, &buffer, 2, None).unwrap();
        assert_eq!(mesh.positions, vec![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);

        let encoded = encode_vertices(&info, &mesh, None).unwrap();
        assert_eq!(encoded.len(), 32);
        assert_eq!(&encoded[12..16], &[0; 4]);
    }

    #[test]
    fn test_float_normals_are_normalized() {
        let info = stream(
            vec![Component::new(ComponentKind::Normal, ComponentFormat::Vec3Float, 0)],
            12,
        );
        let mut buffer = Vec::new();
        for c in [0.0f32, 0.0, 2.0] {
            buffer.extend_from_slice(&c.to_le_bytes());
        }
        let mesh = decode_vertices(&info, &buffer, 1, None).unwrap();
        assert_eq!(mesh.normals, vec![PackedVector::Vector([0.0, 0.0, 1.0])]);
    }

    #[test]
    fn test_vector_normal_needs_codec_for_packed_format() {
        let info = stream(
            vec![Component::new(ComponentKind::Normal, ComponentFormat::PackedNormal, 0)],
            4,
        );
        let mut mesh = RawMesh::new(0);
        mesh.positions = vec![[0.0; 3]];
        mesh.normals = vec![PackedVector::Vector([0.0, 1.0, 0.0])];
        assert_eq!(
            encode_vertices(&info, &mesh, None),
            Err(MeshError::NormalCodecRequired)
        );

        mesh.normals = vec![PackedVector::Packed(0x1234_5678)];
        assert_eq!(
            encode_vertices(&info, &mesh, None).unwrap(),
            0x1234_5678u32.to_le_bytes().to_vec()
        );
    }

    #[test]
    fn test_extra_weight_sets_are_skipped() {
        let info = stream(
            vec![
                Component::new(ComponentKind::BoneWeight, ComponentFormat::Vec4Half, 0),
                Component::new(ComponentKind::BoneWeight, ComponentFormat::Vec4Half, 1),
            ],
            16,
        );
        let mut buffer = vec![0u8; 16];
        buffer[0..2].copy_from_slice(&0x3C00u16.to_le_bytes());
        buffer[8..10].copy_from_slice(&0x3C00u16.to_le_bytes());
        let mesh = decode_vertices(&info, &buffer, 1, None).unwrap();
        assert_eq!(mesh.weights, vec![[1.0, 0.0, 0.0, 0.0]]);
    }

    #[test]
    fn test_index_widths() {
        let mut s = ByteStream::writer();
        transfer_indices(&mut s, 2, &mut [1, 2, 0xFFFF]).unwrap();
        transfer_indices(&mut s, 4, &mut [0x1_0000]).unwrap();
        assert_eq!(s.len(), 10);

        let mut r = ByteStream::reader(s.into_inner());
        let mut short = [0; 3];
        let mut long = [0; 1];
        transfer_indices(&mut r, 2, &mut short).unwrap();
        transfer_indices(&mut r, 4, &mut long).unwrap();
        assert_eq!(short, [1, 2, 0xFFFF]);
        assert_eq!(long, [0x1_0000]);
    }
}
