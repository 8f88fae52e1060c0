//! Vertex component descriptors

use crate::mesh::error::{MeshError, MeshResult};
use crate::stream::{ByteStream, StreamResult};
use std::fmt;

/// Semantic of a vertex component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    /// Vertex position
    Position,
    /// Vertex normal
    Normal,
    /// Vertex tangent
    Tangent,
    /// Vertex bitangent
    Bitangent,
    /// Texture coordinate set
    Uv,
    /// Vertex color
    Color,
    /// Skinning bone indices
    BoneIndex,
    /// Skinning weights
    BoneWeight,
    /// Semantic this codec does not interpret; the bytes are skipped
    Other(u32),
}

impl ComponentKind {
    /// Kind for a raw semantic value
    pub const fn from_raw(value: u32) -> Self {
        match value {
            0 => Self::Position,
            1 => Self::Normal,
            2 => Self::Tangent,
            3 => Self::Bitangent,
            4 => Self::Uv,
            5 => Self::Color,
            6 => Self::BoneIndex,
            7 => Self::BoneWeight,
            other => Self::Other(other),
        }
    }

    /// Raw semantic value
    pub const fn to_raw(self) -> u32 {
        match self {
            Self::Position => 0,
            Self::Normal => 1,
            Self::Tangent => 2,
            Self::Bitangent => 3,
            Self::Uv => 4,
            Self::Color => 5,
            Self::BoneIndex => 6,
            Self::BoneWeight => 7,
            Self::Other(other) => other,
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Position => write!(f, "position"),
            Self::Normal => write!(f, "normal"),
            Self::Tangent => write!(f, "tangent"),
            Self::Bitangent => write!(f, "bitangent"),
            Self::Uv => write!(f, "uv"),
            Self::Color => write!(f, "color"),
            Self::BoneIndex => write!(f, "bone_index"),
            Self::BoneWeight => write!(f, "bone_weight"),
            Self::Other(raw) => write!(f, "unknown({raw})"),
        }
    }
}

/// Numeric encoding of a vertex component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentFormat {
    /// One `f32`
    Float,
    /// Two `f32`
    Vec2Float,
    /// Three `f32`
    Vec3Float,
    /// Four bytes normalized to `[0, 1]`
    Rgba8,
    /// Four `u32`
    Vec4UInt32,
    /// Four `u8`
    Vec4UInt8,
    /// Unsigned 10-10-10-2; the fourth lane always decodes as zero
    Packed1010102,
    /// Normal quantized through the normal palette
    PackedNormal,
    /// Two half floats
    Vec2Half,
    /// Four half floats
    Vec4Half,
}

impl ComponentFormat {
    /// Format for a raw format value
    pub fn from_raw(value: u32) -> MeshResult<Self> {
        Ok(match value {
            0 => Self::Float,
            1 => Self::Vec2Float,
            2 => Self::Vec3Float,
            4 => Self::Rgba8,
            20 => Self::Vec4UInt32,
            24 => Self::Vec4UInt8,
            25 => Self::Packed1010102,
            26 => Self::PackedNormal,
            29 => Self::Vec2Half,
            31 => Self::Vec4Half,
            other => return Err(MeshError::UnknownVertexFormat(other)),
        })
    }

    /// Raw format value
    pub const fn to_raw(self) -> u32 {
        match self {
            Self::Float => 0,
            Self::Vec2Float => 1,
            Self::Vec3Float => 2,
            Self::Rgba8 => 4,
            Self::Vec4UInt32 => 20,
            Self::Vec4UInt8 => 24,
            Self::Packed1010102 => 25,
            Self::PackedNormal => 26,
            Self::Vec2Half => 29,
            Self::Vec4Half => 31,
        }
    }

    /// Encoded size in bytes
    pub const fn size(self) -> usize {
        match self {
            Self::Float
            | Self::Rgba8
            | Self::Vec4UInt8
            | Self::Packed1010102
            | Self::PackedNormal
            | Self::Vec2Half => 4,
            Self::Vec2Float | Self::Vec4Half => 8,
            Self::Vec3Float => 12,
            Self::Vec4UInt32 => 16,
        }
    }

    /// Transfer one value in this format
    ///
    /// Lanes the format does not carry are returned as zero.
    pub fn transfer(self, s: &mut ByteStream, value: ComponentValue) -> StreamResult<ComponentValue> {
        let f = value.to_floats();
        Ok(match self {
            Self::Float => ComponentValue::Float([s.f32(f[0])?, 0.0, 0.0, 0.0]),
            Self::Vec2Float => {
                let [x, y] = s.vec2_f32([f[0], f[1]])?;
                ComponentValue::Float([x, y, 0.0, 0.0])
            }
            Self::Vec3Float => {
                let [x, y, z] = s.vec3_f32([f[0], f[1], f[2]])?;
                ComponentValue::Float([x, y, z, 0.0])
            }
            Self::Rgba8 => {
                let bytes = s.vec4_u8(f.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8))?;
                ComponentValue::Float(bytes.map(|b| f32::from(b) / 255.0))
            }
            Self::Vec4UInt32 => ComponentValue::UInt(s.vec4_u32(value.to_uints())?),
            Self::Vec4UInt8 => {
                let bytes = s.vec4_u8(value.to_uints().map(|v| v.min(0xff) as u8))?;
                ComponentValue::UInt(bytes.map(u32::from))
            }
            Self::Packed1010102 => {
                let mut lanes = s.packed_1010102(f)?;
                if s.is_reading() {
                    lanes[3] = 0.0;
                }
                ComponentValue::Float(lanes)
            }
            Self::PackedNormal => ComponentValue::Packed(s.u32(value.to_packed())?),
            Self::Vec2Half => {
                let [x, y] = s.vec2_half([f[0], f[1]])?;
                ComponentValue::Float([x, y, 0.0, 0.0])
            }
            Self::Vec4Half => ComponentValue::Float(s.vec4_half(f)?),
        })
    }
}

/// A decoded component value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ComponentValue {
    /// Floating-point lanes; unused lanes are zero
    Float([f32; 4]),
    /// Integer lanes; unused lanes are zero
    UInt([u32; 4]),
    /// Opaque palette-packed normal
    Packed(u32),
}

impl ComponentValue {
    /// Lanes as floats; packed words give zeros
    pub fn to_floats(self) -> [f32; 4] {
        match self {
            Self::Float(v) => v,
            Self::UInt(v) => v.map(|x| x as f32),
            Self::Packed(_) => [0.0; 4],
        }
    }

    /// Lanes as rounded integers; packed words give zeros
    pub fn to_uints(self) -> [u32; 4] {
        match self {
            Self::Float(v) => v.map(|x| x.max(0.0).round() as u32),
            Self::UInt(v) => v,
            Self::Packed(_) => [0; 4],
        }
    }

    /// Packed word; other values give zero
    pub fn to_packed(self) -> u32 {
        match self {
            Self::Packed(v) => v,
            Self::Float(_) | Self::UInt(_) => 0,
        }
    }
}

/// One entry of a stream's component table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Component {
    /// Semantic
    pub kind: ComponentKind,
    /// Numeric format
    pub format: ComponentFormat,
    /// Set number for repeated semantics such as UVs and bone indices
    pub index: u32,
    /// Uninterpreted, preserved
    pub unknown: u64,
}

impl Component {
    /// Component with a zero trailing word
    pub const fn new(kind: ComponentKind, format: ComponentFormat, index: u32) -> Self {
        Self {
            kind,
            format,
            index,
            unknown: 0,
        }
    }

    /// Bytes per vertex
    pub const fn size(&self) -> usize {
        self.format.size()
    }

    /// Transfer one component record
    pub fn serialize(&mut self, s: &mut ByteStream) -> MeshResult<()> {
        self.kind = ComponentKind::from_raw(s.u32(self.kind.to_raw())?);
        self.format = ComponentFormat::from_raw(s.u32(self.format.to_raw())?)?;
        self.index = s.u32(self.index)?;
        self.unknown = s.u64(self.unknown)?;
        Ok(())
    }
}

impl Default for Component {
    fn default() -> Self {
        Self::new(ComponentKind::Position, ComponentFormat::Vec3Float, 0)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_format_sizes() {
        let sizes: Vec<(u32, usize)> = [0, 1, 2, 4, 20, 24, 25, 26, 29, 31]
            .into_iter()
            .map(|raw| (raw, ComponentFormat::from_raw(raw).unwrap().size()))
            .collect();
        assert_eq!(
            sizes,
            vec![
                (0, 4),
                (1, 8),
                (2, 12),
                (4, 4),
                (20, 16),
                (24, 4),
                (25, 4),
                (26, 4),
                (29, 4),
                (31, 8)
            ]
        );
    }

    #[test]
    fn test_unknown_format() {
        assert_eq!(
            ComponentFormat::from_raw(3),
            Err(MeshError::UnknownVertexFormat(3))
        );
    }

    #[test]
    fn test_component_record_is_20_bytes() {
        let mut s = ByteStream::writer();
        Component::new(ComponentKind::Uv, ComponentFormat::Vec2Half, 1)
            .serialize(&mut s)
            .unwrap();
        assert_eq!(s.len(), 20);

        let mut decoded = Component::default();
        decoded
            .serialize(&mut ByteStream::reader(s.into_inner()))
            .unwrap();
        assert_eq!(decoded.kind, ComponentKind::Uv);
        assert_eq!(decoded.format, ComponentFormat::Vec2Half);
        assert_eq!(decoded.index, 1);
    }

    #[test]
    fn test_packed_1010102_drops_fourth_lane() {
        let mut s = ByteStream::writer();
        ComponentFormat::Packed1010102
            .transfer(&mut s, ComponentValue::Float([1.0, 0.0, 1.0, 1.0]))
            .unwrap();
        let value = ComponentFormat::Packed1010102
            .transfer(
                &mut ByteStream::reader(s.into_inner()),
                ComponentValue::Float([0.0; 4]),
            )
            .unwrap();
        assert_eq!(value, ComponentValue::Float([1.0, 0.0, 1.0, 0.0]));
    }

    #[test]
    fn test_rgba8_normalizes() {
        let value = ComponentFormat::Rgba8
            .transfer(
                &mut ByteStream::reader(vec![255, 0, 51, 255]),
                ComponentValue::Float([0.0; 4]),
            )
            .unwrap();
        assert_eq!(value, ComponentValue::Float([1.0, 0.0, 0.2, 1.0]));
    }
}
