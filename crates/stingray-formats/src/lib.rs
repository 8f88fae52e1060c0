//! Archive container and payload formats for Stingray engine games
//!
#![warn(missing_docs)]
#![allow(clippy::cast_possible_truncation)] // Intentional for binary format parsing
#![allow(clippy::cast_possible_wrap)] // Intentional for binary operations
#![allow(clippy::cast_lossless)] // Sometimes clearer than From
#![allow(clippy::cast_precision_loss)] // Normalized vertex attributes
#![allow(clippy::uninlined_format_args)] // Backwards compatibility
#![allow(clippy::doc_markdown)] // Many engine-specific terms don't need backticks
#![allow(clippy::module_name_repetitions)] // Clear naming is preferred
#![allow(clippy::similar_names)] // Domain-specific naming patterns
#![allow(clippy::float_cmp)] // Binary format requirements
#![allow(clippy::derive_partial_eq_without_eq)] // Binary format structs
#![allow(clippy::redundant_closure_for_method_calls)] // Iterator chains
#![allow(clippy::return_self_not_must_use)] // Builder patterns
#![allow(clippy::use_self)] // Type clarity
#![allow(clippy::large_types_passed_by_value)] // Component tables
//! This crate provides symmetric (parser and builder) implementations for the
//! archive container used by Stingray engine games and for the payload kinds
//! stored inside it.
//!
//! # Supported Formats
//!
//! - **Container**: index file plus `.gpu_resources` and `.stream` siblings
//! - **Mesh**: directory blocks, component tables, vertex and index buffers
//! - **Texture**: mip records and DDS header, with `.dds` import and export
//! - **Material**: texture slot table
//! - **Bones**: skeleton bone names
//! - **Composite mesh**: streams shared by several meshes
//!
//! # Design Principles
//!
//! - **Symmetric Operations**: one layout routine drives both directions
//!   through [`stream::ByteStream`]
//! - **Shared Buffers**: entry payloads are [`bytes::Bytes`], so cloned
//!   entries share unchanged data
//! - **Round-Trip Guarantee**: an unmodified container re-encodes byte-exactly

/// Mode-symmetric byte cursor
pub mod stream;

/// Archive container codec
///
/// Parses and builds the index file and its two payload siblings. Entries
/// carry their raw payloads plus an optional decoded [`payload::TypedPayload`].
pub mod toc;

/// Mesh codec
pub mod mesh;

/// Skeleton bone names
pub mod bones;
/// Streams shared between mesh entries
pub mod composite;
/// Material texture slots
pub mod material;
/// Textures and DDS exchange
pub mod texture;

/// Typed payload dispatch by type id
pub mod payload;

pub use payload::{
    CodecContext, EncodedEntry, ExternalResolver, NoExternalReferences, PayloadError,
    PayloadResult, TypedPayload, decode_entry, encode_entry, type_ids,
};
pub use toc::{EntryData, EntryKey, TocEntry, TocError, TocFile, TocResult};
