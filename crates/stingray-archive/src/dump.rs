//! Raw entry export and import
//!
//! A dumped entry is written as up to three files named after its key:
//! `<file_id>.<type>` holding the index payload, plus `.gpu_resources` and
//! `.stream` siblings when those payloads are non-empty. Textures can also be
//! exchanged as standalone `.dds` files.

use crate::error::{ArchiveError, ArchiveResult, BatchReport};
use crate::workspace::Workspace;
use bytes::Bytes;
use std::fs;
use std::path::{Path, PathBuf};
use stingray_formats::payload::TypedPayload;
use stingray_formats::toc::constants::{GPU_SUFFIX, STREAM_SUFFIX};
use stingray_formats::toc::{EntryData, EntryKey, sibling_path};
use tracing::{debug, info};

impl Workspace {
    /// File name an entry is dumped under
    ///
    /// The type part is the type's name when the name lists know it, else
    /// its hex id.
    pub fn dump_file_name(&self, key: EntryKey) -> String {
        let type_name = self
            .names()
            .type_name(key.type_id)
            .map_or_else(|| format!("{:016x}", key.type_id), str::to_string);
        format!("{:016x}.{type_name}", key.file_id)
    }

    /// Write the raw payloads of each entry into `dir`
    pub fn dump_entries<P: AsRef<Path>>(&self, keys: &[EntryKey], dir: P) -> BatchReport<EntryKey> {
        let dir = dir.as_ref();
        let mut report = BatchReport::new();
        for &key in keys {
            let result = self.dump_entry(key, dir).map(|path| {
                debug!("Dumped {key} to {}", path.display());
            });
            report.record(key, result);
        }
        info!(
            "Dumped {} of {} entries to {}",
            report.succeeded.len(),
            report.attempted(),
            dir.display()
        );
        report
    }

    fn dump_entry(&self, key: EntryKey, dir: &Path) -> ArchiveResult<PathBuf> {
        let data = self
            .entry(key)
            .ok_or(ArchiveError::EntryNotFound(key))?
            .data();
        fs::create_dir_all(dir)?;

        let path = dir.join(self.dump_file_name(key));
        fs::write(&path, &data.index)?;
        if !data.gpu.is_empty() {
            fs::write(sibling_path(&path, GPU_SUFFIX), &data.gpu)?;
        }
        if !data.stream.is_empty() {
            fs::write(sibling_path(&path, STREAM_SUFFIX), &data.stream)?;
        }
        Ok(path)
    }

    /// Replace an entry's payloads in the active patch with a dumped triad
    ///
    /// `path` is the index payload file; missing siblings import as empty.
    pub fn import_dump<P: AsRef<Path>>(&mut self, key: EntryKey, path: P) -> ArchiveResult<()> {
        self.patch_index()?;
        let path = path.as_ref();
        let data = EntryData::new(
            fs::read(path)?,
            read_optional(&sibling_path(path, GPU_SUFFIX))?,
            read_optional(&sibling_path(path, STREAM_SUFFIX))?,
        );
        debug!(
            "Importing {} bytes into {key} from {}",
            data.total_len(),
            path.display()
        );
        self.save_data(key, data)
    }

    /// Write a texture entry as a `.dds` file
    pub fn export_texture<P: AsRef<Path>>(&mut self, key: EntryKey, path: P) -> ArchiveResult<()> {
        let entry = self
            .load_entry(key, false, false)?
            .ok_or(ArchiveError::EntryNotFound(key))?;
        let Some(TypedPayload::Texture(texture)) = entry.payload() else {
            return Err(not_a_texture(key));
        };
        fs::write(path, texture.to_dds())?;
        Ok(())
    }

    /// Replace a texture's pixels from a `.dds` file and save it into the active patch
    pub fn import_texture<P: AsRef<Path>>(&mut self, key: EntryKey, path: P) -> ArchiveResult<()> {
        let dds = fs::read(path)?;
        let TypedPayload::Texture(texture) = self.edit_payload(key)? else {
            return Err(not_a_texture(key));
        };
        texture.replace_from_dds(&dds)?;
        self.save_entry(key)?;
        Ok(())
    }
}

const fn not_a_texture(key: EntryKey) -> ArchiveError {
    ArchiveError::UnexpectedPayload {
        key,
        expected: "texture",
    }
}

fn read_optional(path: &Path) -> ArchiveResult<Bytes> {
    match fs::read(path) {
        Ok(data) => Ok(Bytes::from(data)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Bytes::new()),
        Err(e) => Err(e.into()),
    }
}
