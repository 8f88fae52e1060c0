//! Typed payload dispatch
//!
//! Entries are decoded into a closed set of payload kinds chosen by type id.
//! Decoding goes through a static codec table; type ids without a codec fail
//! with [`PayloadError::UnknownType`].
//!
//! Some payloads reference other entries (a mesh's bone names or the
//! composite mesh holding its streams). Those lookups go through an
//! [`ExternalResolver`] supplied by the caller.

use crate::bones::BoneNames;
use crate::composite::CompositeMesh;
use crate::material::Material;
use crate::mesh::{MeshError, MeshFile, NormalCodec};
use crate::stream::StreamError;
use crate::texture::Texture;
use crate::toc::EntryData;
use std::fmt;
use thiserror::Error;

/// Type ids of the resource kinds this crate knows
pub mod type_ids {
    /// `unit`: meshes
    pub const MESH: u64 = 16_187_218_042_980_615_487;
    /// `texture`
    pub const TEXTURE: u64 = 14_790_446_551_990_181_426;
    /// `material`
    pub const MATERIAL: u64 = 16_915_718_763_308_572_383;
    /// Shared streams of several meshes
    pub const COMPOSITE_MESH: u64 = 14_191_111_524_867_688_662;
    /// `bones`
    pub const BONES: u64 = 1_792_059_921_637_536_489;
    /// `wwise_bank`
    pub const WWISE_BANK: u64 = 6_006_249_203_084_351_385;
}

/// Payload operation result type
pub type PayloadResult<T> = Result<T, PayloadError>;

/// Errors raised by payload codecs
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    /// No codec is registered for the type id
    #[error("No codec for type {0:016x}")]
    UnknownType(u64),

    /// A texture's DDS header is unusable
    #[error("Invalid DDS data: {0}")]
    InvalidDds(&'static str),

    /// Mesh codec failure
    #[error(transparent)]
    Mesh(#[from] MeshError),

    /// Payload bytes ended early
    #[error(transparent)]
    Stream(#[from] StreamError),
}

impl PayloadError {
    /// Check if the payload kind is simply not supported
    pub fn is_unknown_type(&self) -> bool {
        matches!(self, Self::UnknownType(_))
    }
}

/// A decoded entry payload
#[derive(Debug, Clone, PartialEq)]
pub enum TypedPayload {
    /// `unit` entry
    Mesh(Box<MeshFile>),
    /// Texture entry
    Texture(Box<Texture>),
    /// Material entry
    Material(Material),
    /// Skeleton bone names
    Bones(BoneNames),
    /// Streams shared by several meshes
    CompositeMesh(CompositeMesh),
}

impl TypedPayload {
    /// Type id this payload encodes to
    pub fn type_id(&self) -> u64 {
        match self {
            Self::Mesh(_) => type_ids::MESH,
            Self::Texture(_) => type_ids::TEXTURE,
            Self::Material(_) => type_ids::MATERIAL,
            Self::Bones(_) => type_ids::BONES,
            Self::CompositeMesh(_) => type_ids::COMPOSITE_MESH,
        }
    }
}

/// Lookup of entries referenced from inside a payload
pub trait ExternalResolver {
    /// Payloads of the entry `(file_id, type_id)`, if it can be found
    fn resolve_external(&mut self, file_id: u64, type_id: u64) -> Option<EntryData>;
}

/// Resolver for payloads decoded in isolation
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExternalReferences;

impl ExternalResolver for NoExternalReferences {
    fn resolve_external(&mut self, _file_id: u64, _type_id: u64) -> Option<EntryData> {
        None
    }
}

/// Shared state handed to codecs
#[derive(Clone, Copy, Default)]
pub struct CodecContext<'a> {
    /// Converter for palette-packed normals
    pub normals: Option<&'a dyn NormalCodec>,
}

impl<'a> CodecContext<'a> {
    /// Context without a normal codec
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `normals` for palette-packed normals
    #[must_use]
    pub fn with_normals(mut self, normals: &'a dyn NormalCodec) -> Self {
        self.normals = Some(normals);
        self
    }
}

impl fmt::Debug for CodecContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecContext")
            .field("normals", &self.normals.is_some())
            .finish()
    }
}

/// Encoded payloads with recoverable diagnostics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodedEntry {
    /// Encoded payloads
    pub data: EntryData,
    /// Recoverable problems found while encoding
    pub diagnostics: Vec<MeshError>,
}

impl From<EntryData> for EncodedEntry {
    fn from(data: EntryData) -> Self {
        Self {
            data,
            diagnostics: Vec::new(),
        }
    }
}

type DecodeFn =
    fn(&EntryData, &mut dyn ExternalResolver, &CodecContext<'_>) -> PayloadResult<TypedPayload>;

/// One row of the codec table
pub struct PayloadCodec {
    /// Type hash handled by this row
    pub type_id: u64,
    /// Type name, as hashed
    pub name: &'static str,
    decode: DecodeFn,
}

impl fmt::Debug for PayloadCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PayloadCodec")
            .field("type_id", &self.type_id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

static CODECS: &[PayloadCodec] = &[
    PayloadCodec {
        type_id: type_ids::MESH,
        name: "mesh",
        decode: decode_mesh,
    },
    PayloadCodec {
        type_id: type_ids::TEXTURE,
        name: "texture",
        decode: decode_texture,
    },
    PayloadCodec {
        type_id: type_ids::MATERIAL,
        name: "material",
        decode: decode_material,
    },
    PayloadCodec {
        type_id: type_ids::BONES,
        name: "bones",
        decode: decode_bones,
    },
    PayloadCodec {
        type_id: type_ids::COMPOSITE_MESH,
        name: "composite mesh",
        decode: decode_composite,
    },
];

fn decode_mesh(
    data: &EntryData,
    resolver: &mut dyn ExternalResolver,
    ctx: &CodecContext<'_>,
) -> PayloadResult<TypedPayload> {
    let mesh = MeshFile::decode(data, resolver, ctx.normals)?;
    Ok(TypedPayload::Mesh(Box::new(mesh)))
}

fn decode_texture(
    data: &EntryData,
    _: &mut dyn ExternalResolver,
    _: &CodecContext<'_>,
) -> PayloadResult<TypedPayload> {
    Ok(TypedPayload::Texture(Box::new(Texture::decode(data)?)))
}

fn decode_material(
    data: &EntryData,
    _: &mut dyn ExternalResolver,
    _: &CodecContext<'_>,
) -> PayloadResult<TypedPayload> {
    Ok(TypedPayload::Material(Material::decode(&data.index)?))
}

fn decode_bones(
    data: &EntryData,
    _: &mut dyn ExternalResolver,
    _: &CodecContext<'_>,
) -> PayloadResult<TypedPayload> {
    Ok(TypedPayload::Bones(BoneNames::decode(&data.index)?))
}

fn decode_composite(
    data: &EntryData,
    _: &mut dyn ExternalResolver,
    _: &CodecContext<'_>,
) -> PayloadResult<TypedPayload> {
    Ok(TypedPayload::CompositeMesh(CompositeMesh::decode(data)?))
}

/// Codec registered for a type id
pub fn codec_for(type_id: u64) -> Option<&'static PayloadCodec> {
    CODECS.iter().find(|codec| codec.type_id == type_id)
}

/// Whether entries of this type can be decoded
pub fn is_supported(type_id: u64) -> bool {
    codec_for(type_id).is_some()
}

/// Decode an entry's payloads
pub fn decode_entry(
    type_id: u64,
    data: &EntryData,
    resolver: &mut dyn ExternalResolver,
    ctx: &CodecContext<'_>,
) -> PayloadResult<TypedPayload> {
    let codec = codec_for(type_id).ok_or(PayloadError::UnknownType(type_id))?;
    tracing::trace!("Decoding {} payload ({} bytes)", codec.name, data.total_len());
    (codec.decode)(data, resolver, ctx)
}

/// Encode a payload back into entry payloads
pub fn encode_entry(payload: &TypedPayload, ctx: &CodecContext<'_>) -> PayloadResult<EncodedEntry> {
    Ok(match payload {
        TypedPayload::Mesh(mesh) => {
            let encoded = mesh.encode(ctx.normals)?;
            EncodedEntry {
                data: encoded.data,
                diagnostics: encoded.diagnostics,
            }
        }
        TypedPayload::Texture(texture) => texture.encode()?.into(),
        TypedPayload::Material(material) => EntryData::index_only(material.encode()?).into(),
        TypedPayload::Bones(bones) => EntryData::index_only(bones.encode()?).into(),
        TypedPayload::CompositeMesh(composite) => composite.encode()?.into(),
    })
}
