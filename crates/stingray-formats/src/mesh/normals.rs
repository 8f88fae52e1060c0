//! Palette-packed normal conversion
//!
//! Normals stored with [`ComponentFormat::PackedNormal`] are quantized
//! through an external palette whose bit layout this crate does not
//! interpret. Decoding keeps the packed word as-is; conversion between packed
//! and vector form goes through a host-supplied [`NormalCodec`].
//!
//! [`ComponentFormat::PackedNormal`]: crate::mesh::ComponentFormat::PackedNormal

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

/// Conversion between unit vectors and packed normal words
pub trait NormalCodec: Send + Sync {
    /// Pack a unit vector
    fn quantize(&self, normal: [f32; 3]) -> u32;

    /// Unpack a packed word, if the codec supports that direction
    fn dequantize(&self, packed: u32) -> Option<[f32; 3]>;
}

type QuantizeFn = dyn Fn(&[u8], [f32; 3]) -> u32 + Send + Sync;
type DequantizeFn = dyn Fn(&[u8], u32) -> Option<[f32; 3]> + Send + Sync;

/// Normal palette loaded once from disk
///
/// The palette bytes are handed unchanged to the conversion functions the
/// host registers.
pub struct NormalPalette {
    palette: Vec<u8>,
    quantize: Box<QuantizeFn>,
    dequantize: Option<Box<DequantizeFn>>,
}

impl NormalPalette {
    /// Load a palette file and bind it to a quantizer
    pub fn load<P, F>(path: P, quantize: F) -> io::Result<Self>
    where
        P: AsRef<Path>,
        F: Fn(&[u8], [f32; 3]) -> u32 + Send + Sync + 'static,
    {
        let palette = fs::read(path.as_ref())?;
        tracing::debug!(
            "Loaded normal palette {} ({} bytes)",
            path.as_ref().display(),
            palette.len()
        );
        Ok(Self::from_bytes(palette, quantize))
    }

    /// Bind in-memory palette bytes to a quantizer
    pub fn from_bytes<F>(palette: Vec<u8>, quantize: F) -> Self
    where
        F: Fn(&[u8], [f32; 3]) -> u32 + Send + Sync + 'static,
    {
        Self {
            palette,
            quantize: Box::new(quantize),
            dequantize: None,
        }
    }

    /// Register the inverse conversion
    #[must_use]
    pub fn with_dequantize<F>(mut self, dequantize: F) -> Self
    where
        F: Fn(&[u8], u32) -> Option<[f32; 3]> + Send + Sync + 'static,
    {
        self.dequantize = Some(Box::new(dequantize));
        self
    }

    /// Palette bytes handed to the conversions
    pub fn palette(&self) -> &[u8] {
        &self.palette
    }
}

impl NormalCodec for NormalPalette {
    fn quantize(&self, normal: [f32; 3]) -> u32 {
        (self.quantize)(&self.palette, normal)
    }

    fn dequantize(&self, packed: u32) -> Option<[f32; 3]> {
        self.dequantize
            .as_ref()
            .and_then(|f| f(&self.palette, packed))
    }
}

impl fmt::Debug for NormalPalette {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NormalPalette")
            .field("palette_len", &self.palette.len())
            .field("has_dequantize", &self.dequantize.is_some())
            .finish()
    }
}

/// Scale a vector to unit length; zero vectors are returned unchanged
pub fn normalize(v: [f32; 3]) -> [f32; 3] {
    let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if len == 0.0 {
        return v;
    }
    v.map(|c| c / len)
}
