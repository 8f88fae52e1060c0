//! Read-only transform and customization tables

use crate::mesh::check_count;
use crate::stream::{ByteStream, StreamResult};

/// Local transform of one mesh node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalTransform {
    /// Rotation matrix rows
    pub rotation: [[f32; 3]; 3],
    /// Translation
    pub position: [f32; 3],
    /// Per-axis scale
    pub scale: [f32; 3],
}

impl Default for LocalTransform {
    fn default() -> Self {
        Self {
            rotation: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            position: [0.0; 3],
            scale: [1.0; 3],
        }
    }
}

impl LocalTransform {
    fn read(s: &mut ByteStream) -> StreamResult<Self> {
        let rotation = [
            s.vec3_f32([0.0; 3])?,
            s.vec3_f32([0.0; 3])?,
            s.vec3_f32([0.0; 3])?,
        ];
        let position = s.vec3_f32([0.0; 3])?;
        let scale = s.vec3_f32([0.0; 3])?;
        s.skip(4);
        Ok(Self {
            rotation,
            position,
            scale,
        })
    }
}

/// Transform table referenced by mesh infos
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformInfo {
    /// Transforms indexed by mesh-info `transform_index`
    pub transforms: Vec<LocalTransform>,
}

impl TransformInfo {
    /// Read the table at `offset`
    pub fn read(data: &[u8], offset: u32) -> StreamResult<Self> {
        let mut s = ByteStream::reader(data);
        s.seek(offset as usize);
        let count = s.u32(0)? as usize;
        s.skip(12);
        check_count(&s, count, 64)?;
        let transforms = (0..count)
            .map(|_| LocalTransform::read(&mut s))
            .collect::<StreamResult<Vec<_>>>()?;
        Ok(Self { transforms })
    }
}

/// Character customization labels
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomizationInfo {
    /// Body type label
    pub body_type: String,
    /// Equipment slot label
    pub slot: String,
    /// Body weight label
    pub weight: String,
    /// Piece type label
    pub piece_type: String,
}

impl CustomizationInfo {
    /// Read the labels, leaving every field empty if any of them is malformed
    pub fn read(data: &[u8], offset: u32) -> Self {
        Self::try_read(data, offset).unwrap_or_default()
    }

    fn try_read(data: &[u8], offset: u32) -> StreamResult<Self> {
        let mut s = ByteStream::reader(data);
        s.seek(offset as usize);
        s.skip(24);
        let body_type = read_label(&mut s)?;
        s.skip(12);
        let slot = read_label(&mut s)?;
        s.skip(12);
        let weight = read_label(&mut s)?;
        s.skip(12);
        let piece_type = read_label(&mut s)?;
        Ok(Self {
            body_type,
            slot,
            weight,
            piece_type,
        })
    }
}

fn read_label(s: &mut ByteStream) -> StreamResult<String> {
    let len = s.u32(0)? as usize;
    let bytes = s.bytes(&[], len)?;
    Ok(String::from_utf8_lossy(&bytes).replace('\0', ""))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    fn label(s: &mut ByteStream, text: &str) {
        s.u32(text.len() as u32 + 1).unwrap();
        let mut bytes = text.as_bytes().to_vec();
        bytes.push(0);
        s.bytes(&bytes, bytes.len()).unwrap();
    }

    #[test]
    fn test_transform_table() {
        let mut s = ByteStream::writer();
        s.seek(8);
        s.u32(1).unwrap();
        s.skip(12);
        for row in [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]] {
            s.vec3_f32(row).unwrap();
        }
        s.vec3_f32([1.0, 2.0, 3.0]).unwrap();
        s.vec3_f32([2.0, 2.0, 2.0]).unwrap();
        s.f32(0.0).unwrap();

        let info = TransformInfo::read(s.as_slice(), 8).unwrap();
        assert_eq!(info.transforms.len(), 1);
        assert_eq!(info.transforms[0].position, [1.0, 2.0, 3.0]);
        assert_eq!(info.transforms[0].scale, [2.0, 2.0, 2.0]);
    }

    #[test]
    fn test_customization_labels() {
        let mut s = ByteStream::writer();
        s.skip(24);
        label(&mut s, "slim");
        s.skip(12);
        label(&mut s, "body");
        s.skip(12);
        label(&mut s, "light");
        s.skip(12);
        label(&mut s, "armor");

        let info = CustomizationInfo::read(s.as_slice(), 0);
        assert_eq!(info.body_type, "slim");
        assert_eq!(info.piece_type, "armor");

        let broken = CustomizationInfo::read(&s.as_slice()[..40], 0);
        assert_eq!(broken, CustomizationInfo::default());
    }
}
