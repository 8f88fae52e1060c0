//! Mesh entry codec

use crate::bones::BoneNames;
use crate::composite::CompositeMesh;
use crate::mesh::bone_info::BoneInfo;
use crate::mesh::check_count;
use crate::mesh::component::{Component, ComponentFormat, ComponentKind};
use crate::mesh::constants::{INDEX_TYPE_32BIT, VERTEX_BUFFER_ALIGNMENT};
use crate::mesh::error::{MeshError, MeshResult};
use crate::mesh::header::MeshHeader;
use crate::mesh::mesh_info::{MaterialTable, MeshInfo, MeshSection};
use crate::mesh::normals::NormalCodec;
use crate::mesh::raw::{RawMaterial, RawMesh, VertexLayout};
use crate::mesh::stream_info::{StreamInfo, StreamInfoBlock};
use crate::mesh::transform::{CustomizationInfo, TransformInfo};
use crate::mesh::vertex::{transfer_indices, transfer_vertices};
use crate::payload::ExternalResolver;
use crate::payload::type_ids::{BONES, COMPOSITE_MESH};
use crate::stream::ByteStream;
use crate::toc::EntryData;
use bytes::Bytes;
use tracing::{debug, warn};

/// Result of encoding a mesh
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedMesh {
    /// Encoded payloads
    pub data: EntryData,
    /// Recoverable problems found while encoding
    pub diagnostics: Vec<MeshError>,
}

/// A decoded mesh entry
///
/// Directory blocks are kept as read so that re-encoding only replaces what
/// is derived from [`RawMesh`] geometry: sections, the material table,
/// stream layouts and the GPU payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshFile {
    /// Header with block offsets
    pub header: MeshHeader,
    /// Uninterpreted bytes between the header and the first directory block
    pub leading_data: Vec<u8>,
    /// Skinning blocks, one per LOD
    pub bone_infos: Vec<BoneInfo>,
    bone_info_offsets: Vec<u32>,
    /// Vertex and index stream layouts
    pub streams: StreamInfoBlock,
    /// Mesh-info blocks
    pub mesh_infos: Vec<MeshInfo>,
    mesh_info_offsets: Vec<u32>,
    /// Section id to material table
    pub materials: MaterialTable,
    /// Uninterpreted bytes between the material table and the ending marker
    pub trailing_data: Vec<u8>,
    /// Node transforms, read only
    pub transforms: TransformInfo,
    /// Customization labels, read only
    pub customization: Option<CustomizationInfo>,
    /// Names from the referenced bones entry, when it could be resolved
    pub bone_names: Option<Vec<String>>,
    /// Decoded geometry, one per readable mesh-info block
    pub raw_meshes: Vec<RawMesh>,
}

impl MeshFile {
    /// Decode a mesh entry
    ///
    /// Bone names and composite streams are looked up through `resolver`. A
    /// missing composite mesh is fatal; missing bone names are not.
    pub fn decode(
        data: &EntryData,
        resolver: &mut dyn ExternalResolver,
        normals: Option<&dyn NormalCodec>,
    ) -> MeshResult<Self> {
        let mut mesh = Self::default();
        mesh.serialize_directory(&mut ByteStream::reader(data.index.as_ref()))?;
        mesh.read_supplements(&data.index);

        if mesh.header.bones_ref != 0 {
            mesh.bone_names = resolver
                .resolve_external(mesh.header.bones_ref, BONES)
                .and_then(|bones| BoneNames::decode(&bones.index).ok())
                .map(|bones| bones.names);
            if mesh.bone_names.is_none() {
                debug!("Bones {:016x} not available", mesh.header.bones_ref);
            }
        }

        if mesh.header.uses_composite() {
            let composite_ref = mesh.header.composite_ref;
            let composite_data = resolver
                .resolve_external(composite_ref, COMPOSITE_MESH)
                .ok_or(MeshError::MissingComposite(composite_ref))?;
            let composite = CompositeMesh::decode(&composite_data)?;
            mesh.decode_geometry(&composite.streams.streams, &composite_data.gpu, normals)?;
        } else {
            let streams = mesh.streams.streams.clone();
            mesh.decode_geometry(&streams, &data.gpu, normals)?;
        }

        debug!(
            "Decoded mesh: {} mesh infos, {} raw meshes, {} streams",
            mesh.mesh_infos.len(),
            mesh.raw_meshes.len(),
            mesh.streams.streams.len()
        );
        Ok(mesh)
    }

    /// Encode the mesh, rebuilding sections and GPU buffers from the raw meshes
    pub fn encode(&self, normals: Option<&dyn NormalCodec>) -> MeshResult<EncodedMesh> {
        if self.header.uses_composite() {
            return Err(MeshError::CompositeEncodeUnsupported(self.header.composite_ref));
        }
        for raw in &self.raw_meshes {
            if raw.mesh_info_index >= self.mesh_infos.len() {
                return Err(MeshError::MeshInfoOutOfRange(raw.mesh_info_index));
            }
            if raw.materials.is_empty() {
                return Err(MeshError::MissingMaterial {
                    mesh_info_index: raw.mesh_info_index,
                });
            }
        }

        let mut work = self.clone();
        work.reassign_bone_infos();
        let vertex_order = work.ordered_meshes(|section| section.vertex_offset);
        let index_order = work.ordered_meshes(|section| section.index_offset);
        work.rebuild_sections();
        work.setup_components();

        let mut diagnostics = Vec::new();
        let gpu = work.write_gpu(&vertex_order, &index_order, normals, &mut diagnostics)?;
        let index = work.write_directory()?;

        Ok(EncodedMesh {
            data: EntryData::new(index, gpu, Bytes::new()),
            diagnostics,
        })
    }

    /// Replace every LOD mesh with a copy of the LOD 0 geometry
    pub fn apply_auto_lods(&mut self) {
        let Some(base) = self.raw_meshes.iter().find(|m| m.lod_index == 0).cloned() else {
            return;
        };
        for mesh in self.raw_meshes.iter_mut().filter(|m| m.is_lod()) {
            *mesh = RawMesh {
                mesh_info_index: mesh.mesh_info_index,
                mesh_id: mesh.mesh_id,
                lod_index: mesh.lod_index,
                ..base.clone()
            };
        }
    }

    fn has_bone_block(&self) -> bool {
        self.header.bone_info_offset != 0 || !self.bone_infos.is_empty()
    }

    fn has_stream_block(&self) -> bool {
        self.header.stream_info_offset != 0 || !self.streams.streams.is_empty()
    }

    fn serialize_directory(&mut self, s: &mut ByteStream) -> MeshResult<()> {
        self.header.serialize(s)?;
        if s.is_reading() {
            if self.header.mesh_info_offset == 0 {
                return Err(MeshError::MissingGeometry("no mesh-info block"));
            }
            if self.header.stream_info_offset == 0 && self.header.composite_ref == 0 {
                return Err(MeshError::MissingGeometry(
                    "no stream info and no composite mesh",
                ));
            }
        }

        let leading_len = if s.is_reading() {
            let end = [
                self.header.bone_info_offset,
                self.header.stream_info_offset,
                self.header.mesh_info_offset,
            ]
            .into_iter()
            .find(|&offset| offset != 0)
            .unwrap_or_default() as usize;
            end.saturating_sub(s.position())
        } else {
            self.leading_data.len()
        };
        self.leading_data = s.bytes(&self.leading_data, leading_len)?;

        if self.has_bone_block() {
            self.serialize_bone_infos(s)?;
        }

        if self.has_stream_block() {
            if s.is_writing() {
                self.streams.mesh_ids = (0..self.streams.streams.len())
                    .map(|i| self.mesh_infos.get(i).map_or(0, |info| info.mesh_id))
                    .collect();
            }
            self.streams.serialize(s, &mut self.header.stream_info_offset)?;
        }

        self.serialize_mesh_infos(s)?;

        if s.is_reading() {
            if self.header.materials_offset != 0 {
                s.seek(self.header.materials_offset as usize);
                self.materials.serialize(s)?;
            }
        } else {
            self.header.materials_offset = s.position() as u32;
            self.materials.serialize(s)?;
        }

        let trailing_len = if s.is_reading() {
            (self.header.ending_offset as usize).saturating_sub(s.position())
        } else {
            self.trailing_data.len()
        };
        self.trailing_data = s.bytes(&self.trailing_data, trailing_len)?;
        if s.is_writing() {
            self.header.ending_offset = s.position() as u32;
        }
        s.u64(self.mesh_infos.len() as u64)?;
        Ok(())
    }

    fn serialize_bone_infos(&mut self, s: &mut ByteStream) -> MeshResult<()> {
        if s.is_reading() {
            s.seek(self.header.bone_info_offset as usize);
        } else {
            self.header.bone_info_offset = s.position() as u32;
        }
        let base = self.header.bone_info_offset as usize;

        let count = s.u32(self.bone_infos.len() as u32)? as usize;
        if s.is_reading() {
            check_count(s, count, 4)?;
            self.bone_info_offsets = vec![0; count];
        } else {
            self.bone_info_offsets.resize(count, 0);
        }
        for offset in &mut self.bone_info_offsets {
            *offset = s.u32(*offset)?;
        }

        if s.is_reading() {
            let limit = if self.header.stream_info_offset != 0 {
                self.header.stream_info_offset
            } else {
                self.header.mesh_info_offset
            } as usize;
            let mut infos = Vec::with_capacity(count);
            for (i, &offset) in self.bone_info_offsets.iter().enumerate() {
                let start = base + offset as usize;
                let end = self
                    .bone_info_offsets
                    .get(i + 1)
                    .map_or(limit, |&next| base + next as usize);
                s.seek(start);
                infos.push(BoneInfo::from_raw(s.bytes(&[], end.saturating_sub(start))?));
            }
            self.bone_infos = infos;
        } else {
            for (offset, info) in self.bone_info_offsets.iter_mut().zip(&self.bone_infos) {
                *offset = (s.position() - base) as u32;
                s.bytes(info.raw(), info.raw().len())?;
            }
        }
        Ok(())
    }

    fn serialize_mesh_infos(&mut self, s: &mut ByteStream) -> MeshResult<()> {
        if s.is_reading() {
            s.seek(self.header.mesh_info_offset as usize);
        } else {
            self.header.mesh_info_offset = s.position() as u32;
        }
        let base = self.header.mesh_info_offset as usize;

        let count = s.u32(self.mesh_infos.len() as u32)? as usize;
        if s.is_reading() {
            check_count(s, count, 8)?;
            self.mesh_info_offsets = vec![0; count];
            self.mesh_infos = vec![MeshInfo::default(); count];
        } else {
            self.mesh_info_offsets.resize(count, 0);
        }
        for offset in &mut self.mesh_info_offsets {
            *offset = s.u32(*offset)?;
        }
        for info in &self.mesh_infos {
            s.u32(info.mesh_id)?;
        }

        for (offset, info) in self.mesh_info_offsets.iter_mut().zip(&mut self.mesh_infos) {
            if s.is_reading() {
                s.seek(base + *offset as usize);
            } else {
                *offset = (s.position() - base) as u32;
            }
            info.serialize(s)?;
        }
        Ok(())
    }

    /// Write the directory, then patch the header and offset tables in place
    fn write_directory(&mut self) -> MeshResult<Vec<u8>> {
        let mut s = ByteStream::writer();
        self.serialize_directory(&mut s)?;

        s.seek(0);
        self.header.serialize(&mut s)?;
        if self.has_bone_block() {
            s.seek(self.header.bone_info_offset as usize + 4);
            for &offset in &self.bone_info_offsets {
                s.u32(offset)?;
            }
        }
        if self.has_stream_block() {
            self.streams
                .rewrite_offsets(&mut s, self.header.stream_info_offset)?;
        }
        s.seek(self.header.mesh_info_offset as usize + 4);
        for &offset in &self.mesh_info_offsets {
            s.u32(offset)?;
        }
        Ok(s.into_inner())
    }

    fn read_supplements(&mut self, index: &[u8]) {
        if self.header.transform_info_offset != 0 {
            match TransformInfo::read(index, self.header.transform_info_offset) {
                Ok(transforms) => self.transforms = transforms,
                Err(e) => warn!("Could not read transform table: {e}"),
            }
        }
        if self.header.customization_info_offset != 0 {
            self.customization = Some(CustomizationInfo::read(
                index,
                self.header.customization_info_offset,
            ));
        }
    }

    fn decode_geometry(
        &mut self,
        streams: &[StreamInfo],
        gpu: &[u8],
        normals: Option<&dyn NormalCodec>,
    ) -> MeshResult<()> {
        let mut s = ByteStream::reader(gpu);
        self.raw_meshes.clear();

        for index in 0..self.mesh_infos.len() {
            let info = self.mesh_infos[index].clone();
            let Some(stream) = streams.get(info.stream_index as usize) else {
                warn!(
                    "Mesh {index}: stream index {} out of range ({} streams), skipping",
                    info.stream_index,
                    streams.len()
                );
                continue;
            };
            stream.validate_stride()?;

            let mut raw = RawMesh::new(index);
            raw.mesh_id = info.mesh_id;
            raw.lod_index = info.lod_index;
            raw.bone_info_index = usize::try_from(info.lod_index).ok();
            raw.use_32bit_indices = stream.uses_32bit_indices();
            raw.transform = self
                .transforms
                .transforms
                .get(info.transform_index as usize)
                .copied();

            let width = stream.index_width();
            for (section, &section_id) in info.sections.iter().zip(&info.section_ids) {
                let start = raw.indices.len() as u32;
                raw.materials.push(match self.materials.material_for(section_id) {
                    Some(material_id) => RawMaterial {
                        material_id: Some(material_id),
                        short_id: section_id,
                        start_index: start,
                        num_indices: section.num_indices,
                    },
                    None => RawMaterial {
                        short_id: section_id,
                        ..RawMaterial::default_material(start, section.num_indices)
                    },
                });

                let len = (section.num_indices / 3 * 3) as usize;
                s.seek(stream.index_buffer_offset as usize + section.index_offset as usize * width);
                check_count(&s, len, width)?;
                let mut values = vec![0; len];
                transfer_indices(&mut s, width, &mut values)?;
                raw.indices.extend(values);
            }

            let declared = info.sections.first().map_or(0, |section| section.num_vertices);
            let mut count = declared as usize;
            if let Some(&max) = raw.indices.iter().max() {
                let real = max as usize + 1;
                if real != count {
                    debug!("Mesh {index}: vertex count {declared} corrected to {real}");
                    count = real;
                    for section in &mut self.mesh_infos[index].sections {
                        section.num_vertices = real as u32;
                    }
                }
            }

            let stride = stream.vertex_stride as usize;
            if stride == 0 && count > 0 {
                return Err(MeshError::ZeroStride {
                    mesh_info_index: index,
                    vertices: count,
                });
            }
            let first_vertex = info.sections.first().map_or(0, |section| section.vertex_offset);
            s.seek(stream.vertex_buffer_offset as usize + first_vertex as usize * stride);
            check_count(&s, count, stride)?;
            raw.init_vertices(count, &VertexLayout::from_components(&stream.components));
            transfer_vertices(&mut s, stream, &mut raw, normals)?;

            self.raw_meshes.push(raw);
        }
        Ok(())
    }

    /// Copy each LOD's skinning block into the slot of its LOD index
    fn reassign_bone_infos(&mut self) {
        let original = self.bone_infos.clone();
        for raw in &mut self.raw_meshes {
            let lod_index = self.mesh_infos[raw.mesh_info_index].lod_index;
            let Ok(lod) = usize::try_from(lod_index) else {
                continue;
            };
            if let Some(info) = raw.bone_info_index.and_then(|i| original.get(i)) {
                if let Some(slot) = self.bone_infos.get_mut(lod) {
                    *slot = info.clone();
                }
            }
            raw.bone_info_index = Some(lod);
        }
    }

    /// Raw mesh positions per stream, stably sorted by the first section's `key`
    fn ordered_meshes(&self, key: impl Fn(&MeshSection) -> u32) -> Vec<Vec<usize>> {
        let mut order = vec![Vec::new(); self.streams.streams.len()];
        for (i, raw) in self.raw_meshes.iter().enumerate() {
            let stream_index = self.mesh_infos[raw.mesh_info_index].stream_index as usize;
            match order.get_mut(stream_index) {
                Some(list) => list.push(i),
                None => warn!(
                    "Mesh {}: stream index {stream_index} out of range, not written",
                    raw.mesh_info_index
                ),
            }
        }
        for list in &mut order {
            list.sort_by_key(|&i| {
                self.mesh_infos[self.raw_meshes[i].mesh_info_index]
                    .sections
                    .first()
                    .map_or(u32::MAX, &key)
            });
        }
        order
    }

    fn rebuild_sections(&mut self) {
        self.materials.clear();
        for raw in &self.raw_meshes {
            let info = &mut self.mesh_infos[raw.mesh_info_index];
            info.section_ids.clear();
            info.sections.clear();
            for (n, material) in raw.materials.iter().enumerate() {
                info.section_ids.push(material.short_id);
                info.sections.push(MeshSection {
                    unknown1: n as u32,
                    num_indices: material.num_indices,
                    unknown2: n as u32,
                    ..MeshSection::default()
                });
                if let Some(material_id) = material.material_id {
                    self.materials.push(material.short_id, material_id);
                }
            }
        }
    }

    /// Rebuild each populated stream's component table from its meshes
    fn setup_components(&mut self) {
        for (stream_index, stream) in self.streams.streams.iter_mut().enumerate() {
            let members: Vec<usize> = self
                .raw_meshes
                .iter()
                .enumerate()
                .filter(|(_, raw)| {
                    self.mesh_infos[raw.mesh_info_index].stream_index as usize == stream_index
                })
                .map(|(i, _)| i)
                .collect();
            if members.is_empty() {
                continue;
            }

            let mut layout = VertexLayout::default();
            for &i in &members {
                let raw = &self.raw_meshes[i];
                layout.normals |= !raw.normals.is_empty();
                layout.weights |= raw.is_skinned();
                layout.uv_sets = layout.uv_sets.max(raw.uvs.len());
                layout.bone_index_sets = layout.bone_index_sets.max(raw.bone_indices.len());
                if raw.use_32bit_indices {
                    stream.index_type = INDEX_TYPE_32BIT;
                }
            }

            stream.components = components_for(&layout);
            stream.vertex_stride = stream.stride();
            for &i in &members {
                self.raw_meshes[i].fill_missing(&layout);
            }
        }
    }

    fn write_gpu(
        &mut self,
        vertex_order: &[Vec<usize>],
        index_order: &[Vec<usize>],
        normals: Option<&dyn NormalCodec>,
        diagnostics: &mut Vec<MeshError>,
    ) -> MeshResult<Vec<u8>> {
        let mut s = ByteStream::writer();
        for (stream_index, stream) in self.streams.streams.iter_mut().enumerate() {
            stream.vertex_buffer_offset = s.position() as u32;
            let mut vertex_offset = 0u32;
            for &i in &vertex_order[stream_index] {
                let raw = &mut self.raw_meshes[i];
                let count = raw.vertex_count() as u32;
                for section in &mut self.mesh_infos[raw.mesh_info_index].sections {
                    section.vertex_offset = vertex_offset;
                    section.num_vertices = count;
                }
                transfer_vertices(&mut s, stream, raw, normals)?;
                vertex_offset += count;
            }
            s.align(VERTEX_BUFFER_ALIGNMENT);
            stream.vertex_buffer_size = s.position() as u32 - stream.vertex_buffer_offset;
            stream.num_vertices = vertex_offset;

            stream.index_buffer_offset = s.position() as u32;
            let width = stream.index_width();
            let mut index_offset = 0u32;
            for &i in &index_order[stream_index] {
                let raw = &self.raw_meshes[i];
                let mut consumed = 0usize;
                let mut clamped = 0usize;
                let mut max_value = 0u32;
                for section in &mut self.mesh_infos[raw.mesh_info_index].sections {
                    let len = (section.num_indices / 3 * 3) as usize;
                    let mut values = raw
                        .indices
                        .get(consumed..consumed + len)
                        .ok_or(MeshError::IndexCountMismatch {
                            mesh_info_index: raw.mesh_info_index,
                            needed: consumed + len,
                            available: raw.indices.len(),
                        })?
                        .to_vec();
                    if width == 2 {
                        for value in values.iter_mut().filter(|v| **v > 0xFFFF) {
                            clamped += 1;
                            max_value = max_value.max(*value);
                            *value = 0xFFFF;
                        }
                    }
                    section.index_offset = index_offset;
                    transfer_indices(&mut s, width, &mut values)?;
                    consumed += len;
                    index_offset += section.num_indices;
                }
                if clamped > 0 {
                    let diagnostic = MeshError::CorruptGeometry {
                        mesh_info_index: raw.mesh_info_index,
                        clamped,
                        max_value,
                    };
                    warn!("{diagnostic}");
                    diagnostics.push(diagnostic);
                }
            }
            stream.index_buffer_size = s.position() as u32 - stream.index_buffer_offset;
            stream.num_indices = index_offset;
        }
        Ok(s.into_inner())
    }
}

/// Component table written for a vertex layout
fn components_for(layout: &VertexLayout) -> Vec<Component> {
    let mut components = vec![Component::new(
        ComponentKind::Position,
        ComponentFormat::Vec3Float,
        0,
    )];
    if layout.normals {
        components.push(Component::new(
            ComponentKind::Normal,
            ComponentFormat::PackedNormal,
            0,
        ));
    }
    for set in 0..layout.uv_sets {
        components.push(Component::new(
            ComponentKind::Uv,
            ComponentFormat::Vec2Half,
            set as u32,
        ));
    }
    if layout.weights {
        components.push(Component::new(
            ComponentKind::BoneWeight,
            ComponentFormat::Vec4Half,
            0,
        ));
        for set in 0..layout.bone_index_sets {
            components.push(Component::new(
                ComponentKind::BoneIndex,
                ComponentFormat::Vec4UInt8,
                set as u32,
            ));
        }
    }
    components
}
