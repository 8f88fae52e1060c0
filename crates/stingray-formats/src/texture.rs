//! Texture entries
//!
//! The index payload holds a small header, fifteen mip records and a DDS
//! header with the DX10 extension. Pixel data lives in the stream payload
//! when one is present, otherwise in the GPU payload.
//!
//! Encoding clears the mip records and always places pixels in the GPU
//! payload, so re-encoded textures no longer depend on the stream file.

use crate::payload::{PayloadError, PayloadResult};
use crate::stream::ByteStream;
use crate::toc::EntryData;
use bytes::Bytes;

/// Mip records stored per texture
pub const MIP_RECORDS: usize = 15;

/// Length of the embedded DDS header, including the DX10 extension
pub const DDS_HEADER_SIZE: usize = 148;

const DX10_FOURCC_OFFSET: usize = 84;

/// Streaming record of one mip level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MipInfo {
    /// Offset of the mip in the pixel data
    pub start: u32,
    /// Bytes from this mip to the end of the pixel data
    pub bytes_left: u32,
    /// Mip height in pixels
    pub height: u16,
    /// Mip width in pixels
    pub width: u16,
}

/// Decoded texture entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    /// Uninterpreted, preserved
    pub unknown_id: u32,
    /// Uninterpreted, cleared on encode
    pub unknown1: u32,
    /// Uninterpreted, written as `0xFFFFFFFF`
    pub unknown2: u32,
    /// Mip streaming records as read
    pub mips: [MipInfo; MIP_RECORDS],
    dds_header: [u8; DDS_HEADER_SIZE],
    pixels: Bytes,
}

impl Texture {
    /// Decode a texture entry, taking pixels from the stream payload when present
    pub fn decode(entry: &EntryData) -> PayloadResult<Self> {
        let mut s = ByteStream::reader(entry.index.as_ref());
        let unknown_id = s.u32(0)?;
        let unknown1 = s.u32(0)?;
        let unknown2 = s.u32(0)?;
        let mut mips = [MipInfo::default(); MIP_RECORDS];
        for mip in &mut mips {
            mip.start = s.u32(0)?;
            mip.bytes_left = s.u32(0)?;
            mip.height = s.u16(0)?;
            mip.width = s.u16(0)?;
        }
        let dds_header = s.array([0; DDS_HEADER_SIZE])?;
        check_dx10(&dds_header)?;

        let pixels = if entry.stream.is_empty() {
            entry.gpu.clone()
        } else {
            entry.stream.clone()
        };
        Ok(Self {
            unknown_id,
            unknown1,
            unknown2,
            mips,
            dds_header,
            pixels,
        })
    }

    /// Encode with cleared mip records and pixels in the GPU payload
    pub fn encode(&self) -> PayloadResult<EntryData> {
        let mut s = ByteStream::writer();
        s.u32(self.unknown_id)?;
        s.u32(0)?;
        s.u32(0xFFFF_FFFF)?;
        for _ in 0..MIP_RECORDS {
            s.array([0; 12])?;
        }
        s.array(self.dds_header)?;
        Ok(EntryData::new(s.into_inner(), self.pixels.clone(), Bytes::new()))
    }

    /// Build a texture from a complete `.dds` file
    pub fn from_dds(dds: &[u8]) -> PayloadResult<Self> {
        let header: [u8; DDS_HEADER_SIZE] = dds
            .get(..DDS_HEADER_SIZE)
            .and_then(|h| h.try_into().ok())
            .ok_or(PayloadError::InvalidDds("file shorter than the DX10 header"))?;
        check_dx10(&header)?;
        Ok(Self {
            unknown_id: 0,
            unknown1: 0,
            unknown2: 0xFFFF_FFFF,
            mips: [MipInfo::default(); MIP_RECORDS],
            dds_header: header,
            pixels: Bytes::copy_from_slice(&dds[DDS_HEADER_SIZE..]),
        })
    }

    /// Complete `.dds` file: header then pixels
    pub fn to_dds(&self) -> Vec<u8> {
        let mut dds = Vec::with_capacity(DDS_HEADER_SIZE + self.pixels.len());
        dds.extend_from_slice(&self.dds_header);
        dds.extend_from_slice(&self.pixels);
        dds
    }

    /// Replace header and pixels from a `.dds` file, keeping the entry header
    pub fn replace_from_dds(&mut self, dds: &[u8]) -> PayloadResult<()> {
        let replacement = Self::from_dds(dds)?;
        self.dds_header = replacement.dds_header;
        self.pixels = replacement.pixels;
        Ok(())
    }

    /// Embedded DDS header
    pub fn dds_header(&self) -> &[u8; DDS_HEADER_SIZE] {
        &self.dds_header
    }

    /// Pixel data following the DDS header
    pub fn pixels(&self) -> &Bytes {
        &self.pixels
    }

    /// Height from the DDS header
    pub fn height(&self) -> u32 {
        header_u32(&self.dds_header, 12)
    }

    /// Width from the DDS header
    pub fn width(&self) -> u32 {
        header_u32(&self.dds_header, 16)
    }

    /// Mip count from the DDS header
    pub fn mip_count(&self) -> u32 {
        header_u32(&self.dds_header, 28)
    }

    /// DXGI format code from the DX10 extension
    pub fn dxgi_format(&self) -> u32 {
        header_u32(&self.dds_header, 128)
    }
}

fn check_dx10(header: &[u8; DDS_HEADER_SIZE]) -> PayloadResult<()> {
    if &header[DX10_FOURCC_OFFSET..DX10_FOURCC_OFFSET + 4] != b"DX10" {
        return Err(PayloadError::InvalidDds("missing DX10 extended header"));
    }
    Ok(())
}

fn header_u32(header: &[u8; DDS_HEADER_SIZE], offset: usize) -> u32 {
    u32::from_le_bytes([
        header[offset],
        header[offset + 1],
        header[offset + 2],
        header[offset + 3],
    ])
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dds(width: u32, height: u32, pixels: &[u8]) -> Vec<u8> {
        let mut dds = vec![0u8; DDS_HEADER_SIZE];
        dds[0..4].copy_from_slice(b"DDS ");
        dds[12..16].copy_from_slice(&height.to_le_bytes());
        dds[16..20].copy_from_slice(&width.to_le_bytes());
        dds[28..32].copy_from_slice(&1u32.to_le_bytes());
        dds[84..88].copy_from_slice(b"DX10");
        dds[128..132].copy_from_slice(&71u32.to_le_bytes());
        dds.extend_from_slice(pixels);
        dds
    }

    #[test]
    fn test_dds_round_trip() {
        let file = dds(4, 8, &[9; 16]);
        let texture = Texture::from_dds(&file).unwrap();
        assert_eq!(texture.width(), 4);
        assert_eq!(texture.height(), 8);
        assert_eq!(texture.mip_count(), 1);
        assert_eq!(texture.dxgi_format(), 71);
        assert_eq!(texture.to_dds(), file);
    }

    #[test]
    fn test_encode_moves_pixels_to_gpu() {
        let texture = Texture::from_dds(&dds(4, 4, &[5; 8])).unwrap();
        let entry = texture.encode().unwrap();
        assert_eq!(entry.index.len(), 12 + 15 * 12 + DDS_HEADER_SIZE);
        assert_eq!(&entry.index[8..12], &[0xFF; 4]);
        assert_eq!(entry.gpu.as_ref(), &[5; 8]);
        assert!(entry.stream.is_empty());

        let streamed = EntryData::new(entry.index.clone(), Bytes::new(), vec![6; 8]);
        let decoded = Texture::decode(&streamed).unwrap();
        assert_eq!(decoded.pixels().as_ref(), &[6; 8]);
    }

    #[test]
    fn test_non_dx10_header_is_rejected() {
        let mut file = dds(4, 4, &[]);
        file[84..88].copy_from_slice(b"DXT5");
        assert!(matches!(
            Texture::from_dds(&file),
            Err(PayloadError::InvalidDds(_))
        ));
        assert!(Texture::from_dds(&[0; 10]).is_err());
    }
}
