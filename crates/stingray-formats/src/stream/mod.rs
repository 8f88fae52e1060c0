//! Mode-symmetric little-endian byte cursor
//!
//! [`ByteStream`] wraps a growable buffer and a position. It is opened either
//! for reading or for writing, and every accessor takes the current value of
//! a field and returns the field's value after the call:
//!
//! - in read mode the argument is ignored and the decoded value is returned
//! - in write mode the argument is encoded and returned unchanged
//!
//! This lets one routine describe a structure's layout for both directions:
//!
//! ```
//! use stingray_formats::stream::{ByteStream, StreamResult};
//!
//! struct Section {
//!     vertex_offset: u32,
//!     num_vertices: u32,
//! }
//!
//! impl Section {
//!     fn serialize(&mut self, s: &mut ByteStream) -> StreamResult<()> {
//!         self.vertex_offset = s.u32(self.vertex_offset)?;
//!         self.num_vertices = s.u32(self.num_vertices)?;
//!         Ok(())
//!     }
//! }
//!
//! let mut section = Section { vertex_offset: 16, num_vertices: 3 };
//! let mut writer = ByteStream::writer();
//! section.serialize(&mut writer)?;
//!
//! let mut reader = ByteStream::reader(writer.into_inner());
//! let mut decoded = Section { vertex_offset: 0, num_vertices: 0 };
//! decoded.serialize(&mut reader)?;
//! assert_eq!(decoded.num_vertices, 3);
//! # Ok::<(), stingray_formats::stream::StreamError>(())
//! ```
//!
//! Seeking is absolute. Reading past the end fails with
//! [`StreamError::BufferUnderrun`]; writing past the end grows the buffer and
//! zero-fills any gap.

mod error;
/// IEEE half-precision conversion
pub mod half;

pub use error::{StreamError, StreamResult};

/// Direction a [`ByteStream`] was opened in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMode {
    /// Accessors decode from the buffer
    Read,
    /// Accessors encode into the buffer
    Write,
}

/// Growable byte buffer with a cursor
#[derive(Debug, Clone)]
pub struct ByteStream {
    data: Vec<u8>,
    position: usize,
    mode: StreamMode,
}

impl ByteStream {
    /// Open a buffer for reading
    pub fn reader(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            position: 0,
            mode: StreamMode::Read,
        }
    }

    /// Open an empty buffer for writing
    pub fn writer() -> Self {
        Self {
            data: Vec::new(),
            position: 0,
            mode: StreamMode::Write,
        }
    }

    /// Current mode
    pub fn mode(&self) -> StreamMode {
        self.mode
    }

    /// Whether accessors decode
    pub fn is_reading(&self) -> bool {
        self.mode == StreamMode::Read
    }

    /// Whether accessors encode
    pub fn is_writing(&self) -> bool {
        self.mode == StreamMode::Write
    }

    /// Current position
    pub fn position(&self) -> usize {
        self.position
    }

    /// Buffer length
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the buffer holds no bytes
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Move to an absolute position
    pub fn seek(&mut self, position: usize) {
        self.position = position;
    }

    /// Advance the position by `count` bytes without touching the buffer
    pub fn skip(&mut self, count: usize) {
        self.position += count;
    }

    /// Round the position up to a multiple of `alignment`
    ///
    /// In write mode the skipped range is zero-filled.
    pub fn align(&mut self, alignment: usize) {
        let aligned = align_up(self.position, alignment);
        if self.is_writing() && aligned > self.data.len() {
            self.data.resize(aligned, 0);
        }
        self.position = aligned;
    }

    /// Borrow the whole buffer
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Take the buffer
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }

    fn take<const N: usize>(&mut self) -> StreamResult<[u8; N]> {
        let end = self.position.checked_add(N).filter(|&end| end <= self.data.len());
        let Some(end) = end else {
            return Err(StreamError::BufferUnderrun {
                offset: self.position,
                needed: N,
                available: self.data.len().saturating_sub(self.position),
            });
        };
        let mut out = [0u8; N];
        out.copy_from_slice(&self.data[self.position..end]);
        self.position = end;
        Ok(out)
    }

    fn put(&mut self, bytes: &[u8]) {
        let end = self.position + bytes.len();
        if end > self.data.len() {
            self.data.resize(end, 0);
        }
        self.data[self.position..end].copy_from_slice(bytes);
        self.position = end;
    }

    /// Transfer a raw byte run of `len` bytes
    ///
    /// In write mode `value` must be exactly `len` bytes long.
    pub fn bytes(&mut self, value: &[u8], len: usize) -> StreamResult<Vec<u8>> {
        match self.mode {
            StreamMode::Read => {
                let end = self
                    .position
                    .checked_add(len)
                    .filter(|&end| end <= self.data.len())
                    .ok_or(StreamError::BufferUnderrun {
                        offset: self.position,
                        needed: len,
                        available: self.data.len().saturating_sub(self.position),
                    })?;
                let out = self.data[self.position..end].to_vec();
                self.position = end;
                Ok(out)
            }
            StreamMode::Write => {
                if value.len() != len {
                    return Err(StreamError::LengthMismatch {
                        expected: len,
                        actual: value.len(),
                    });
                }
                self.put(value);
                Ok(value.to_vec())
            }
        }
    }

    /// Transfer a fixed-size byte array
    pub fn array<const N: usize>(&mut self, value: [u8; N]) -> StreamResult<[u8; N]> {
        match self.mode {
            StreamMode::Read => self.take::<N>(),
            StreamMode::Write => {
                self.put(&value);
                Ok(value)
            }
        }
    }

    /// Transfer a `u8`
    pub fn u8(&mut self, value: u8) -> StreamResult<u8> {
        Ok(self.array([value])?[0])
    }

    /// Transfer a little-endian `u16`
    pub fn u16(&mut self, value: u16) -> StreamResult<u16> {
        self.array(value.to_le_bytes()).map(u16::from_le_bytes)
    }

    /// Transfer a little-endian `u32`
    pub fn u32(&mut self, value: u32) -> StreamResult<u32> {
        self.array(value.to_le_bytes()).map(u32::from_le_bytes)
    }

    /// Transfer a little-endian `i32`
    pub fn i32(&mut self, value: i32) -> StreamResult<i32> {
        self.array(value.to_le_bytes()).map(i32::from_le_bytes)
    }

    /// Transfer a little-endian `u64`
    pub fn u64(&mut self, value: u64) -> StreamResult<u64> {
        self.array(value.to_le_bytes()).map(u64::from_le_bytes)
    }

    /// Transfer a little-endian `f32`
    pub fn f32(&mut self, value: f32) -> StreamResult<f32> {
        self.array(value.to_le_bytes()).map(f32::from_le_bytes)
    }

    /// Transfer a half-precision float
    pub fn f16(&mut self, value: f32) -> StreamResult<f32> {
        let bits = self.u16(half::f32_to_f16(value))?;
        Ok(match self.mode {
            StreamMode::Read => half::f16_to_f32(bits),
            StreamMode::Write => value,
        })
    }

    /// Transfer two `f32`
    pub fn vec2_f32(&mut self, value: [f32; 2]) -> StreamResult<[f32; 2]> {
        Ok([self.f32(value[0])?, self.f32(value[1])?])
    }

    /// Transfer three `f32`
    pub fn vec3_f32(&mut self, value: [f32; 3]) -> StreamResult<[f32; 3]> {
        Ok([self.f32(value[0])?, self.f32(value[1])?, self.f32(value[2])?])
    }

    /// Transfer four `f32`
    pub fn vec4_f32(&mut self, value: [f32; 4]) -> StreamResult<[f32; 4]> {
        Ok([
            self.f32(value[0])?,
            self.f32(value[1])?,
            self.f32(value[2])?,
            self.f32(value[3])?,
        ])
    }

    /// Transfer two half floats
    pub fn vec2_half(&mut self, value: [f32; 2]) -> StreamResult<[f32; 2]> {
        Ok([self.f16(value[0])?, self.f16(value[1])?])
    }

    /// Transfer four half floats
    pub fn vec4_half(&mut self, value: [f32; 4]) -> StreamResult<[f32; 4]> {
        Ok([
            self.f16(value[0])?,
            self.f16(value[1])?,
            self.f16(value[2])?,
            self.f16(value[3])?,
        ])
    }

    /// Transfer four unsigned bytes
    pub fn vec4_u8(&mut self, value: [u8; 4]) -> StreamResult<[u8; 4]> {
        self.array(value)
    }

    /// Transfer four little-endian `u32`
    pub fn vec4_u32(&mut self, value: [u32; 4]) -> StreamResult<[u32; 4]> {
        Ok([
            self.u32(value[0])?,
            self.u32(value[1])?,
            self.u32(value[2])?,
            self.u32(value[3])?,
        ])
    }

    /// Transfer a packed unsigned 10-10-10-2 vector
    ///
    /// Each lane is normalized to `[0, 1]`. In write mode inputs are clamped
    /// and rounded to the nearest step.
    pub fn packed_1010102(&mut self, value: [f32; 4]) -> StreamResult<[f32; 4]> {
        let packed = self.u32(pack_1010102(value))?;
        Ok(match self.mode {
            StreamMode::Read => unpack_1010102(packed),
            StreamMode::Write => value,
        })
    }
}

/// Round `value` up to a multiple of `alignment`
pub const fn align_up(value: usize, alignment: usize) -> usize {
    if alignment <= 1 {
        return value;
    }
    value.div_ceil(alignment) * alignment
}

fn quantize(value: f32, max: u32) -> u32 {
    (value.clamp(0.0, 1.0) * max as f32).round() as u32
}

/// Pack a normalized vector into 10-10-10-2 bits
pub fn pack_1010102(value: [f32; 4]) -> u32 {
    quantize(value[0], 0x3ff)
        | (quantize(value[1], 0x3ff) << 10)
        | (quantize(value[2], 0x3ff) << 20)
        | (quantize(value[3], 0x3) << 30)
}

/// Unpack 10-10-10-2 bits into a normalized vector
pub fn unpack_1010102(packed: u32) -> [f32; 4] {
    [
        (packed & 0x3ff) as f32 / 1023.0,
        ((packed >> 10) & 0x3ff) as f32 / 1023.0,
        ((packed >> 20) & 0x3ff) as f32 / 1023.0,
        (packed >> 30) as f32 / 3.0,
    ]
}
