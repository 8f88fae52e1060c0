//! Skeleton bone-name entries
//!
//! ```text
//! u32 num_names
//! u32 num_unknown
//! u32 unknown1[num_unknown]
//! u32 unknown2[num_names]
//! u32 unknown3[num_unknown]
//! names, each NUL-terminated
//! ```

use crate::mesh::check_count;
use crate::stream::{ByteStream, StreamResult};

/// Bone names of a skeleton, indexed by skeleton bone index
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoneNames {
    /// Uninterpreted words, preserved
    pub unknown1: Vec<u32>,
    /// One uninterpreted word per name, preserved
    pub unknown2: Vec<u32>,
    /// Uninterpreted words, preserved
    pub unknown3: Vec<u32>,
    /// Bone names in skeleton order
    pub names: Vec<String>,
}

impl BoneNames {
    /// Decode a bones index payload
    pub fn decode(data: &[u8]) -> StreamResult<Self> {
        let mut bones = Self::default();
        let mut s = ByteStream::reader(data);
        bones.serialize(&mut s)?;
        let tail = &data[s.position().min(data.len())..];
        bones.names = tail
            .split_inclusive(|&b| b == 0)
            .map(|name| String::from_utf8_lossy(name.strip_suffix(&[0u8]).unwrap_or(name)).into_owned())
            .collect();
        Ok(bones)
    }

    /// Encode to an index payload
    pub fn encode(&self) -> StreamResult<Vec<u8>> {
        let mut s = ByteStream::writer();
        self.clone().serialize(&mut s)?;
        let mut out = s.into_inner();
        for name in &self.names {
            out.extend_from_slice(name.as_bytes());
            out.push(0);
        }
        Ok(out)
    }

    /// Name of a skeleton bone
    pub fn name(&self, bone: usize) -> Option<&str> {
        self.names.get(bone).map(String::as_str)
    }

    fn serialize(&mut self, s: &mut ByteStream) -> StreamResult<()> {
        let num_names = s.u32(self.names.len() as u32)? as usize;
        let num_unknown = s.u32(self.unknown1.len() as u32)? as usize;
        if s.is_reading() {
            check_count(s, 2 * num_unknown + num_names, 4)?;
            self.unknown1 = vec![0; num_unknown];
            self.unknown2 = vec![0; num_names];
            self.unknown3 = vec![0; num_unknown];
        }
        for value in self
            .unknown1
            .iter_mut()
            .chain(&mut self.unknown2)
            .chain(&mut self.unknown3)
        {
            *value = s.u32(*value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> BoneNames {
        BoneNames {
            unknown1: vec![1],
            unknown2: vec![10, 11, 12],
            unknown3: vec![2],
            names: vec!["root".into(), "spine".into(), "head".into()],
        }
    }

    #[test]
    fn test_round_trip() {
        let bytes = sample().encode().unwrap();
        assert_eq!(bytes.len(), 8 + 5 * 4 + 5 + 6 + 5);
        assert_eq!(BoneNames::decode(&bytes).unwrap(), sample());
        assert_eq!(BoneNames::decode(&bytes).unwrap().encode().unwrap(), bytes);
    }

    #[test]
    fn test_names_by_index() {
        let bones = sample();
        assert_eq!(bones.name(1), Some("spine"));
        assert_eq!(bones.name(3), None);
    }

    #[test]
    fn test_truncated_counts() {
        let mut bytes = sample().encode().unwrap();
        bytes.truncate(12);
        assert!(BoneNames::decode(&bytes).is_err());
    }
}
