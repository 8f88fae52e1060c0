//! Integration tests for vertex buffer decoding and encoding

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use stingray_formats::mesh::{
    Component, ComponentFormat, ComponentKind, MeshError, StreamInfo, decode_vertices,
    encode_vertices,
};

fn skinned_stream() -> StreamInfo {
    StreamInfo {
        components: vec![
            Component::new(ComponentKind::Position, ComponentFormat::Vec3Float, 0),
            Component::new(ComponentKind::Uv, ComponentFormat::Vec2Half, 0),
            Component::new(ComponentKind::BoneIndex, ComponentFormat::Vec4UInt8, 0),
        ],
        vertex_stride: 20,
        ..StreamInfo::default()
    }
}

fn vertex(buf: &mut Vec<u8>, position: [f32; 3], uv: [u16; 2], bones: [u8; 4]) {
    for value in position {
        buf.extend_from_slice(&value.to_le_bytes());
    }
    for value in uv {
        buf.extend_from_slice(&value.to_le_bytes());
    }
    buf.extend_from_slice(&bones);
}

#[test]
fn twenty_byte_stride_round_trip() {
    let stream = skinned_stream();
    assert_eq!(stream.stride(), 20);

    let mut buffer = Vec::new();
    vertex(&mut buffer, [1.0, -2.5, 0.25], [0x3800, 0x3C00], [1, 2, 3, 255]);
    vertex(&mut buffer, [0.0, 4.0, -8.0], [0x0000, 0x3400], [0, 0, 7, 9]);
    vertex(&mut buffer, [16.5, 0.125, 3.0], [0xBC00, 0x4000], [4, 5, 6, 7]);

    let mesh = decode_vertices(&stream, &buffer, 3, None).unwrap();
    assert_eq!(mesh.positions[0], [1.0, -2.5, 0.25]);
    assert_eq!(mesh.uvs[0][0], [0.5, 1.0]);
    assert_eq!(mesh.uvs[0][2], [-1.0, 2.0]);
    assert_eq!(mesh.bone_indices[0][0], [1, 2, 3, 255]);
    assert!(mesh.normals.is_empty());
    assert!(mesh.weights.is_empty());

    assert_eq!(encode_vertices(&stream, &mesh, None).unwrap(), buffer);
}

#[test]
fn declared_stride_shorter_than_components_is_rejected() {
    let stream = StreamInfo {
        vertex_stride: 16,
        ..skinned_stream()
    };
    assert_eq!(
        decode_vertices(&stream, &[0; 64], 2, None).unwrap_err(),
        MeshError::StrideMismatch {
            declared: 16,
            derived: 20
        }
    );
}

#[test]
fn short_buffer_is_an_underrun() {
    let result = decode_vertices(&skinned_stream(), &[0; 30], 2, None);
    assert!(matches!(result, Err(MeshError::Stream(_))));
}

proptest! {
    #[test]
    fn encoded_length_is_count_times_stride(count in 0usize..32, padding in 0u32..12) {
        let stream = StreamInfo {
            vertex_stride: 20 + padding,
            ..skinned_stream()
        };
        let buffer = vec![0u8; count * stream.vertex_stride as usize];
        let mesh = decode_vertices(&stream, &buffer, count, None).unwrap();
        let encoded = encode_vertices(&stream, &mesh, None).unwrap();
        prop_assert_eq!(encoded.len(), count * stream.vertex_stride as usize);
    }
}
