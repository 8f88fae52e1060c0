//! Material entries
//!
//! A material is a 136-byte fixed prefix followed by one slot per texture:
//!
//! ```text
//! byte[12]
//! u32  end_offset
//! u64  unknown
//! u64  unknown_id
//! byte[32]
//! u32  num_textures
//! byte[36]
//! u32  num_unknown
//! byte[28]
//! u32  texture_unknown[num_textures]
//! u64  texture_id[num_textures]
//! remainder                          opaque
//! ```
//!
//! Texture ids are the file ids of texture entries; replacing a texture means
//! pointing its slot at another entry.

use crate::mesh::check_count;
use crate::stream::{ByteStream, StreamResult};

/// Decoded material entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Material {
    /// Uninterpreted, preserved
    pub data1: [u8; 12],
    /// Recorded end of the fixed block
    pub end_offset: u32,
    /// Uninterpreted, preserved
    pub unknown2: u64,
    /// Uninterpreted id, preserved
    pub unknown_id: u64,
    /// Uninterpreted, preserved
    pub data3: [u8; 32],
    /// Uninterpreted, preserved
    pub data4: [u8; 36],
    /// Uninterpreted count, preserved
    pub num_unknown: u32,
    /// Uninterpreted, preserved
    pub data5: [u8; 28],
    /// One uninterpreted word per texture slot
    pub texture_unknowns: Vec<u32>,
    /// File ids of the referenced texture entries
    pub texture_ids: Vec<u64>,
    /// Bytes after the texture table, kept as read
    pub remaining: Vec<u8>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            data1: [0; 12],
            end_offset: 0,
            unknown2: 0,
            unknown_id: 0,
            data3: [0; 32],
            data4: [0; 36],
            num_unknown: 0,
            data5: [0; 28],
            texture_unknowns: Vec::new(),
            texture_ids: Vec::new(),
            remaining: Vec::new(),
        }
    }
}

impl Material {
    /// Decode a material index payload
    pub fn decode(data: &[u8]) -> StreamResult<Self> {
        let mut material = Self::default();
        material.serialize(&mut ByteStream::reader(data))?;
        Ok(material)
    }

    /// Encode to an index payload
    pub fn encode(&self) -> StreamResult<Vec<u8>> {
        let mut s = ByteStream::writer();
        self.clone().serialize(&mut s)?;
        Ok(s.into_inner())
    }

    /// Point a texture slot at another texture entry
    ///
    /// Returns the previous texture id, or `None` if the slot does not exist.
    pub fn set_texture(&mut self, slot: usize, texture_id: u64) -> Option<u64> {
        self.texture_ids
            .get_mut(slot)
            .map(|id| std::mem::replace(id, texture_id))
    }

    fn serialize(&mut self, s: &mut ByteStream) -> StreamResult<()> {
        self.data1 = s.array(self.data1)?;
        self.end_offset = s.u32(self.end_offset)?;
        self.unknown2 = s.u64(self.unknown2)?;
        self.unknown_id = s.u64(self.unknown_id)?;
        self.data3 = s.array(self.data3)?;
        let num_textures = s.u32(self.texture_ids.len() as u32)? as usize;
        self.data4 = s.array(self.data4)?;
        self.num_unknown = s.u32(self.num_unknown)?;
        self.data5 = s.array(self.data5)?;

        if s.is_reading() {
            check_count(s, num_textures, 12)?;
            self.texture_unknowns = vec![0; num_textures];
            self.texture_ids = vec![0; num_textures];
        } else {
            self.texture_unknowns.resize(num_textures, 0);
        }
        for value in &mut self.texture_unknowns {
            *value = s.u32(*value)?;
        }
        for id in &mut self.texture_ids {
            *id = s.u64(*id)?;
        }

        let remaining_len = if s.is_reading() {
            s.len().saturating_sub(s.position())
        } else {
            self.remaining.len()
        };
        self.remaining = s.bytes(&self.remaining, remaining_len)?;
        Ok(())
    }
}
