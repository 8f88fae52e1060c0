//! Error types for mesh operations

use crate::stream::StreamError;
use thiserror::Error;

/// Mesh operation result type
pub type MeshResult<T> = Result<T, MeshError>;

/// Errors raised while decoding or encoding mesh payloads
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MeshError {
    /// The mesh has no mesh-info block, or neither stream info nor a composite reference
    #[error("Mesh has no geometry: {0}")]
    MissingGeometry(&'static str),

    /// A mesh was submitted for encoding without any material
    #[error("Mesh {mesh_info_index} has no materials, at least one is required")]
    MissingMaterial {
        /// Mesh-info block the mesh belongs to
        mesh_info_index: usize,
    },

    /// Index values did not fit the stream's index width and were clamped
    #[error(
        "Mesh {mesh_info_index}: clamped {clamped} index values (largest {max_value}) to the 16-bit range"
    )]
    CorruptGeometry {
        /// Mesh-info block the mesh belongs to
        mesh_info_index: usize,
        /// Number of clamped values
        clamped: usize,
        /// Largest value before clamping
        max_value: u32,
    },

    /// A component declares a numeric format this codec does not know
    #[error("Unknown vertex component format {0}")]
    UnknownVertexFormat(u32),

    /// A stream info declares more components than its table holds
    #[error("Stream declares {0} components, the table holds 16")]
    TooManyComponents(usize),

    /// The declared stride is smaller than the sum of the component sizes
    #[error("Vertex stride {declared} is smaller than component size sum {derived}")]
    StrideMismatch {
        /// Stride recorded in the stream info
        declared: u32,
        /// Sum of component sizes
        derived: u32,
    },

    /// A stream with a zero vertex stride is referenced by vertices
    #[error("Mesh {mesh_info_index}: {vertices} vertices in a stream with zero vertex stride")]
    ZeroStride {
        /// Mesh-info block the mesh belongs to
        mesh_info_index: usize,
        /// Vertices the mesh needs
        vertices: usize,
    },

    /// A mesh does not hold enough indices for its sections
    #[error("Mesh {mesh_info_index}: sections need {needed} indices but {available} are present")]
    IndexCountMismatch {
        /// Mesh-info block the mesh belongs to
        mesh_info_index: usize,
        /// Indices required by the sections
        needed: usize,
        /// Indices held by the mesh
        available: usize,
    },

    /// A raw mesh points at a mesh-info block that does not exist
    #[error("Mesh-info index {0} out of range")]
    MeshInfoOutOfRange(usize),

    /// A mesh stores vertex data only in a shared composite mesh that could not be resolved
    #[error("Composite mesh {0:016x} could not be found")]
    MissingComposite(u64),

    /// Meshes that borrow geometry from a composite mesh cannot be re-encoded
    #[error("Meshes backed by composite mesh {0:016x} cannot be encoded")]
    CompositeEncodeUnsupported(u64),

    /// A normal needs converting between packed and vector form but no codec is installed
    #[error("A normal codec is required to convert between packed and vector normals")]
    NormalCodecRequired,

    /// Payload bytes ended early
    #[error(transparent)]
    Stream(#[from] StreamError),
}

impl MeshError {
    /// Check if processing can continue past this error
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::CorruptGeometry { .. })
    }
}
