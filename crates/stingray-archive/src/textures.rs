//! Material saves that carry their textures into the patch

use crate::error::ArchiveResult;
use crate::workspace::{Workspace, random_file_id};
use std::collections::HashMap;
use stingray_formats::material::Material;
use stingray_formats::payload::{TypedPayload, type_ids};
use stingray_formats::texture::Texture;
use stingray_formats::toc::{EntryKey, TocEntry};
use tracing::{debug, warn};

impl Workspace {
    /// Save a material into the active patch with fresh copies of its textures
    ///
    /// Slots listed in `replacements` get a new texture built from the given
    /// DDS bytes. Every other slot gets a copy of its current texture. New
    /// textures take random file ids and the material is relinked to them;
    /// textures the patch held under the old ids are removed. Slots whose
    /// texture cannot be found keep their id.
    pub fn save_material_with_textures(
        &mut self,
        key: EntryKey,
        mut material: Material,
        replacements: &HashMap<usize, Vec<u8>>,
    ) -> ArchiveResult<Material> {
        self.patch_index()?;

        for slot in 0..material.texture_ids.len() {
            let old_key = EntryKey::new(material.texture_ids[slot], type_ids::TEXTURE);
            let new_id = random_file_id();
            let new_key = EntryKey::new(new_id, type_ids::TEXTURE);

            let entry = if let Some(dds) = replacements.get(&slot) {
                let texture = Texture::from_dds(dds)?;
                let mut entry = TocEntry::new(new_key, texture.encode()?);
                entry.set_payload(TypedPayload::Texture(Box::new(texture)));
                entry
            } else if let Some(existing) = self.resolve(old_key, true) {
                existing.duplicate_as(new_id)
            } else {
                warn!("Material {key} slot {slot}: texture {old_key} not found, keeping it");
                continue;
            };

            self.add_new_entry_to_patch(entry)?;
            if self.is_in_patch(old_key) {
                self.remove_entry_from_patch(old_key)?;
            }
            material.set_texture(slot, new_id);
            debug!("Material {key} slot {slot}: {old_key} -> {new_key}");
        }

        self.save_payload(key, TypedPayload::Material(material.clone()))?;
        Ok(material)
    }
}
