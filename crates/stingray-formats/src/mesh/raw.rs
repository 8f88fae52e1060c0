//! Decoded geometry, one [`RawMesh`] per mesh-info block

use crate::mesh::component::{Component, ComponentKind};
use crate::mesh::constants::DEFAULT_MATERIAL_SHORT_ID;
use crate::mesh::transform::LocalTransform;

/// Material range of a mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawMaterial {
    /// Material resource id; `None` for the engine's default material
    pub material_id: Option<u64>,
    /// Section id written to the mesh info and the material table
    pub short_id: u32,
    /// First index of the range
    pub start_index: u32,
    /// Indices in the range
    pub num_indices: u32,
}

impl RawMaterial {
    /// Range drawn with the default material
    pub const fn default_material(start_index: u32, num_indices: u32) -> Self {
        Self {
            material_id: None,
            short_id: DEFAULT_MATERIAL_SHORT_ID,
            start_index,
            num_indices,
        }
    }

    /// Range drawn with `material_id` under a fresh random section id
    pub fn new(material_id: u64, start_index: u32, num_indices: u32) -> Self {
        Self {
            material_id: Some(material_id),
            short_id: rand::random::<u32>(),
            start_index,
            num_indices,
        }
    }

    /// Whether the range uses the default material
    pub const fn is_default(&self) -> bool {
        self.material_id.is_none()
    }
}

/// Normal-like vector in packed or expanded form
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PackedVector {
    /// Palette-packed word, kept as read
    Packed(u32),
    /// Unit vector
    Vector([f32; 3]),
}

impl Default for PackedVector {
    fn default() -> Self {
        Self::Packed(0)
    }
}

/// Vertex attributes present in a stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VertexLayout {
    /// Normals
    pub normals: bool,
    /// Tangents
    pub tangents: bool,
    /// Bitangents
    pub bitangents: bool,
    /// Vertex colors
    pub colors: bool,
    /// Bone weights, implying skinning
    pub weights: bool,
    /// Number of UV sets
    pub uv_sets: usize,
    /// Number of bone-index sets
    pub bone_index_sets: usize,
}

impl VertexLayout {
    /// Layout declared by a component table
    pub fn from_components(components: &[Component]) -> Self {
        let mut layout = Self::default();
        for component in components {
            let sets = component.index as usize + 1;
            match component.kind {
                ComponentKind::Normal => layout.normals = true,
                ComponentKind::Tangent => layout.tangents = true,
                ComponentKind::Bitangent => layout.bitangents = true,
                ComponentKind::Color => layout.colors = true,
                ComponentKind::BoneWeight => layout.weights = true,
                ComponentKind::Uv => layout.uv_sets = layout.uv_sets.max(sets),
                ComponentKind::BoneIndex => {
                    layout.bone_index_sets = layout.bone_index_sets.max(sets);
                }
                ComponentKind::Position | ComponentKind::Other(_) => {}
            }
        }
        layout
    }
}

/// Geometry of one mesh-info block
///
/// Attribute arrays are either empty (attribute absent) or hold one value per
/// vertex. `positions` always defines the vertex count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawMesh {
    /// Mesh-info block this geometry was read from and is written back to
    pub mesh_info_index: usize,
    /// Mesh name hash
    pub mesh_id: u32,
    /// LOD level; `-1` outside the LOD chain
    pub lod_index: i32,
    /// Bone-info block used for skinning, if any
    pub bone_info_index: Option<usize>,
    /// Whether the stream stores 32-bit indices
    pub use_32bit_indices: bool,
    /// Node transform, if the table has one
    pub transform: Option<LocalTransform>,
    /// Vertex positions
    pub positions: Vec<[f32; 3]>,
    /// Vertex normals
    pub normals: Vec<PackedVector>,
    /// Vertex tangents
    pub tangents: Vec<PackedVector>,
    /// Vertex bitangents
    pub bitangents: Vec<PackedVector>,
    /// One array per UV set
    pub uvs: Vec<Vec<[f32; 2]>>,
    /// RGBA colors
    pub colors: Vec<[f32; 4]>,
    /// One array per bone-index set
    pub bone_indices: Vec<Vec<[u32; 4]>>,
    /// Bone weights
    pub weights: Vec<[f32; 4]>,
    /// Triangle list
    pub indices: Vec<u32>,
    /// Material ranges over `indices`
    pub materials: Vec<RawMaterial>,
}

impl RawMesh {
    /// Empty geometry for a mesh-info block
    pub fn new(mesh_info_index: usize) -> Self {
        Self {
            mesh_info_index,
            lod_index: -1,
            ..Self::default()
        }
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Reset the vertex arrays to `count` zeroed vertices in `layout`
    pub fn init_vertices(&mut self, count: usize, layout: &VertexLayout) {
        self.positions = vec![[0.0; 3]; count];
        self.normals = zeroed(layout.normals, count);
        self.tangents = zeroed(layout.tangents, count);
        self.bitangents = zeroed(layout.bitangents, count);
        self.colors = zeroed(layout.colors, count);
        self.weights = zeroed(layout.weights, count);
        self.uvs = vec![vec![[0.0; 2]; count]; layout.uv_sets];
        self.bone_indices = vec![vec![[0; 4]; count]; layout.bone_index_sets];
    }

    /// Attributes present in this mesh
    pub fn layout(&self) -> VertexLayout {
        VertexLayout {
            normals: !self.normals.is_empty(),
            tangents: !self.tangents.is_empty(),
            bitangents: !self.bitangents.is_empty(),
            colors: !self.colors.is_empty(),
            weights: !self.weights.is_empty(),
            uv_sets: self.uvs.len(),
            bone_index_sets: self.bone_indices.len(),
        }
    }

    /// Whether the mesh carries bone weights
    pub fn is_skinned(&self) -> bool {
        !self.bone_indices.is_empty()
    }

    /// Every material is the default material
    pub fn is_physics_body(&self) -> bool {
        self.materials.iter().all(RawMaterial::is_default)
    }

    /// A reduced-detail level that can be regenerated from LOD 0
    pub fn is_lod(&self) -> bool {
        self.lod_index != 0 && self.lod_index != -1 && !self.is_physics_body()
    }

    /// No vertex carries a bone weight
    pub fn is_static_mesh(&self) -> bool {
        self.weights.iter().all(|w| w.iter().all(|&x| x == 0.0))
    }

    /// Bring every attribute present in `layout` to full length, zero-filled
    pub fn fill_missing(&mut self, layout: &VertexLayout) {
        let count = self.vertex_count();
        if layout.normals && self.normals.is_empty() {
            self.normals = zeroed(true, count);
        }
        if layout.weights && self.weights.is_empty() {
            self.weights = zeroed(true, count);
        }
        if self.uvs.len() < layout.uv_sets {
            self.uvs.resize(layout.uv_sets, vec![[0.0; 2]; count]);
        }
        if self.bone_indices.len() < layout.bone_index_sets {
            self.bone_indices
                .resize(layout.bone_index_sets, vec![[0; 4]; count]);
        }
    }
}

fn zeroed<T: Clone + Default>(present: bool, count: usize) -> Vec<T> {
    if present {
        vec![T::default(); count]
    } else {
        Vec::new()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mesh::component::ComponentFormat;

    #[test]
    fn test_layout_from_components() {
        let layout = VertexLayout::from_components(&[
            Component::new(ComponentKind::Position, ComponentFormat::Vec3Float, 0),
            Component::new(ComponentKind::Uv, ComponentFormat::Vec2Half, 0),
            Component::new(ComponentKind::Uv, ComponentFormat::Vec2Half, 1),
            Component::new(ComponentKind::BoneIndex, ComponentFormat::Vec4UInt8, 0),
        ]);
        assert_eq!(layout.uv_sets, 2);
        assert_eq!(layout.bone_index_sets, 1);
        assert!(!layout.normals);

        let mut mesh = RawMesh::new(0);
        mesh.init_vertices(3, &layout);
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.uvs.len(), 2);
        assert!(mesh.normals.is_empty());
        assert_eq!(mesh.layout(), layout);
    }

    #[test]
    fn test_predicates() {
        let mut mesh = RawMesh::new(0);
        mesh.lod_index = 1;
        mesh.materials.push(RawMaterial::default_material(0, 3));
        assert!(mesh.is_physics_body());
        assert!(!mesh.is_lod());

        mesh.materials.push(RawMaterial::new(42, 3, 3));
        assert!(!mesh.is_physics_body());
        assert!(mesh.is_lod());

        assert!(mesh.is_static_mesh());
        mesh.weights = vec![[0.0, 0.5, 0.0, 0.0]];
        assert!(!mesh.is_static_mesh());
    }

    #[test]
    fn test_fill_missing() {
        let mut mesh = RawMesh::new(0);
        mesh.positions = vec![[0.0; 3]; 2];
        mesh.fill_missing(&VertexLayout {
            normals: true,
            uv_sets: 2,
            ..VertexLayout::default()
        });
        assert_eq!(mesh.normals, vec![PackedVector::Packed(0); 2]);
        assert_eq!(mesh.uvs, vec![vec![[0.0; 2]; 2]; 2]);
    }
}
