#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
//! Workspace tests over archive triads written to temporary directories

use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use stingray_archive::{ArchiveError, LoadOutcome, Workspace, WorkspaceConfig};
use stingray_formats::material::Material;
use stingray_formats::payload::{TypedPayload, type_ids};
use stingray_formats::toc::{EntryData, EntryKey, TocEntry, TocError, TocFile};

const RAW_TYPE: u64 = 7;

fn write_archive(dir: &Path, name: &str, entries: Vec<TocEntry>) -> PathBuf {
    let path = dir.join(name);
    let mut toc = TocFile::new(&path);
    for entry in entries {
        toc.add_entry(entry).unwrap();
    }
    toc.save(&path).unwrap();
    path
}

fn raw_entry(file_id: u64, index: &[u8]) -> TocEntry {
    TocEntry::new(
        EntryKey::new(file_id, RAW_TYPE),
        EntryData::index_only(index.to_vec()),
    )
}

fn material_bytes(texture_ids: &[u64]) -> Vec<u8> {
    Material {
        texture_unknowns: vec![0; texture_ids.len()],
        texture_ids: texture_ids.to_vec(),
        ..Material::default()
    }
    .encode()
    .unwrap()
}

fn material_entry(file_id: u64, texture_ids: &[u64]) -> TocEntry {
    TocEntry::new(
        EntryKey::new(file_id, type_ids::MATERIAL),
        EntryData::index_only(material_bytes(texture_ids)),
    )
}

fn config() -> WorkspaceConfig {
    WorkspaceConfig::default().with_search_discovery(false)
}

fn open(path: &Path) -> Workspace {
    let mut workspace = Workspace::new(config());
    assert_eq!(
        workspace.load_archive(path, true, false).unwrap(),
        LoadOutcome::Loaded
    );
    workspace
}

#[test]
fn duplicate_without_patch_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_archive(dir.path(), "base", vec![raw_entry(1, b"abc")]);
    let mut workspace = open(&path);

    let result = workspace.duplicate_entry(EntryKey::new(1, RAW_TYPE), Some(99));
    assert!(matches!(result, Err(ArchiveError::NoPatch)));
    assert!(workspace.patches().is_empty());
    assert_eq!(workspace.archives()[0].len(), 1);
    assert!(workspace.entry(EntryKey::new(99, RAW_TYPE)).is_none());
}

#[test]
fn patch_shadows_base_archive() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_archive(dir.path(), "base", vec![raw_entry(1, b"base")]);
    let mut workspace = open(&path);
    let key = EntryKey::new(1, RAW_TYPE);

    workspace.create_patch_from_active(None).unwrap();
    workspace
        .save_data(key, EntryData::index_only(b"patched".to_vec()))
        .unwrap();

    assert_eq!(workspace.entry(key).unwrap().data().index.as_ref(), b"patched");
    assert!(workspace.is_in_patch(key));
    let base = workspace.archives()[0].entry(key).unwrap();
    assert_eq!(base.data().index.as_ref(), b"base");
    assert!(!base.is_modified());

    workspace.unload_patches();
    assert_eq!(workspace.entry(key).unwrap().data().index.as_ref(), b"base");
}

#[test]
fn copy_into_patch_shares_payload_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_archive(dir.path(), "base", vec![raw_entry(1, &[7; 32])]);
    let mut workspace = open(&path);
    let key = EntryKey::new(1, RAW_TYPE);
    workspace.create_patch_from_active(None).unwrap();

    let copied = workspace.add_entry_to_patch(key).unwrap().data().index.as_ptr();
    let base = workspace.archives()[0].entry(key).unwrap().data().index.as_ptr();
    assert_eq!(copied, base);
    assert!(!workspace.active_patch().unwrap().entry(key).unwrap().is_created());

    // A second add returns the existing patch entry
    workspace.add_entry_to_patch(key).unwrap();
    assert_eq!(workspace.active_patch().unwrap().len(), 1);
}

#[test]
fn save_and_undo_material() {
    let dir = tempfile::tempdir().unwrap();
    let original = material_bytes(&[0x10]);
    let path = write_archive(dir.path(), "base", vec![material_entry(5, &[0x10])]);
    let mut workspace = open(&path);
    let key = EntryKey::new(5, type_ids::MATERIAL);

    let entry = workspace.load_entry(key, false, false).unwrap().unwrap();
    assert!(entry.is_loaded());
    assert!(matches!(entry.payload(), Some(TypedPayload::Material(_))));

    workspace.create_patch_from_active(Some("edits")).unwrap();
    let TypedPayload::Material(material) = workspace.edit_payload(key).unwrap() else {
        panic!("expected a material payload");
    };
    assert_eq!(material.set_texture(0, 0x77), Some(0x10));
    let diagnostics = workspace.save_entry(key).unwrap();
    assert!(diagnostics.is_empty());

    let patched = workspace.active_patch().unwrap().entry(key).unwrap();
    assert!(patched.is_modified());
    assert_eq!(
        Material::decode(&patched.data().index).unwrap().texture_ids,
        vec![0x77]
    );
    assert_eq!(
        workspace.archives()[0].entry(key).unwrap().data().index.as_ref(),
        original.as_slice()
    );

    workspace.undo_modified(key).unwrap();
    let reverted = workspace.active_patch().unwrap().entry(key).unwrap();
    assert!(!reverted.is_modified());
    assert_eq!(reverted.data().index.as_ref(), original.as_slice());
    let Some(TypedPayload::Material(material)) = reverted.payload() else {
        panic!("undo should decode the entry again");
    };
    assert_eq!(material.texture_ids, vec![0x10]);
}

#[test]
fn unknown_types_fail_to_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_archive(dir.path(), "base", vec![raw_entry(1, b"abc")]);
    let mut workspace = open(&path);

    let err = workspace
        .load_entry(EntryKey::new(1, RAW_TYPE), false, false)
        .unwrap_err();
    assert!(err.is_unknown_type());
    assert!(workspace.load_entry(EntryKey::new(2, RAW_TYPE), false, false).unwrap().is_none());
}

#[test]
fn patch_paths_and_writing() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_archive(dir.path(), "9ba626afa44a3aa3", vec![raw_entry(1, b"abc")]);
    let mut workspace = open(&path);

    let patch = workspace.create_patch_from_active(Some("mods")).unwrap();
    assert_eq!(patch.path(), dir.path().join("9ba626afa44a3aa3.patch_0"));
    assert_eq!(patch.local_name(), "mods");
    assert!(patch.is_empty());

    workspace.duplicate_entry(EntryKey::new(1, RAW_TYPE), Some(2)).unwrap();
    let written = workspace.write_active_patch().unwrap();
    assert!(written.exists());
    let entry = workspace
        .active_patch()
        .unwrap()
        .entry(EntryKey::new(2, RAW_TYPE))
        .unwrap();
    assert!(!entry.is_modified());
    assert!(entry.is_created());

    let reloaded = TocFile::load(&written).unwrap();
    assert_eq!(
        reloaded.entry(EntryKey::new(2, RAW_TYPE)).unwrap().data().index.as_ref(),
        b"abc"
    );

    let next = workspace.create_patch_from_active(None).unwrap();
    assert_eq!(next.path(), dir.path().join("9ba626afa44a3aa3.patch_1"));
    assert_eq!(
        workspace.load_archive(&written, true, true).unwrap(),
        LoadOutcome::AlreadyLoaded
    );
    assert_eq!(workspace.active_patch().unwrap().local_name(), "mods");
    assert!(workspace.set_active_patch_by_name("9ba626afa44a3aa3.patch_1"));
    workspace.rename_active_patch("second").unwrap();
    assert_eq!(workspace.active_patch().unwrap().local_name(), "second");
}

#[test]
fn paste_reports_each_entry() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_archive(
        dir.path(),
        "base",
        vec![raw_entry(1, b"one"), raw_entry(2, b"two")],
    );
    let mut workspace = open(&path);
    let one = EntryKey::new(1, RAW_TYPE);
    let two = EntryKey::new(2, RAW_TYPE);

    assert!(matches!(workspace.paste(false, None), Err(ArchiveError::NoPatch)));
    workspace.create_patch_from_active(None).unwrap();

    assert_eq!(workspace.copy(&[one, EntryKey::new(3, RAW_TYPE), two]), 2);
    let report = workspace.paste(false, None).unwrap();
    assert_eq!(report.succeeded, vec![one, two]);
    assert!(workspace.clipboard().is_empty());

    workspace.copy(&[one]);
    let report = workspace.paste(false, None).unwrap();
    assert_eq!(report.attempted(), 1);
    assert!(matches!(
        report.failures[0].1,
        ArchiveError::Toc(TocError::DuplicateKey { file_id: 1, .. })
    ));

    workspace.copy(&[one]);
    let report = workspace.paste(true, None).unwrap();
    assert!(report.is_success());
    let patch = workspace.active_patch().unwrap();
    assert_eq!(patch.len(), 3);
    let generated = patch
        .iter()
        .find(|e| e.file_id() != 1 && e.file_id() != 2)
        .unwrap();
    assert!(generated.is_created());
    assert_eq!(generated.data().index.as_ref(), b"one");
}

#[test]
fn patch_entry_edits() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_archive(dir.path(), "base", vec![raw_entry(1, b"one")]);
    let mut workspace = open(&path);
    let key = EntryKey::new(1, RAW_TYPE);
    workspace.create_patch_from_active(None).unwrap();

    assert!(matches!(
        workspace.rename_patch_entry(key, 5),
        Err(ArchiveError::NotInPatch(_))
    ));
    workspace.add_entry_to_patch(key).unwrap();
    let renamed = workspace.rename_patch_entry(key, 5).unwrap();
    assert_eq!(renamed, EntryKey::new(5, RAW_TYPE));

    let created = workspace.add_new_entry_to_patch(raw_entry(9, b"new")).unwrap();
    assert!(workspace.entry(created).unwrap().is_created());

    workspace.select_entries(&[created], false);
    let removed = workspace.remove_entry_from_patch(created).unwrap();
    assert_eq!(removed.unwrap().key(), created);
    assert!(workspace.selection().is_empty());
    assert!(workspace.remove_entry_from_patch(created).unwrap().is_none());
}

#[test]
fn display_merges_archive_and_patch() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_archive(
        dir.path(),
        "base",
        vec![raw_entry(1, b"one"), raw_entry(2, b"two")],
    );
    let mut workspace = open(&path);
    workspace.create_patch_from_active(None).unwrap();
    workspace
        .save_data(EntryKey::new(2, RAW_TYPE), EntryData::index_only(b"2".to_vec()))
        .unwrap();
    workspace.add_new_entry_to_patch(raw_entry(3, b"three")).unwrap();

    let rows: Vec<(u64, bool, bool, bool)> = workspace
        .display_entries(false)
        .iter()
        .map(|row| (row.key.file_id, row.in_patch, row.modified, row.created))
        .collect();
    assert_eq!(
        rows,
        vec![
            (1, false, false, false),
            (2, true, true, false),
            (3, true, false, true),
        ]
    );

    let patch_rows: Vec<u64> = workspace
        .display_entries(true)
        .iter()
        .map(|row| row.key.file_id)
        .collect();
    assert_eq!(patch_rows, vec![2, 3]);
}

#[test]
fn search_loads_archives_on_demand() {
    let dir = tempfile::tempdir().unwrap();
    let base = write_archive(dir.path(), "aaaa", vec![raw_entry(1, b"one")]);
    let other = write_archive(dir.path(), "bbbb", vec![raw_entry(2, b"two")]);
    let mut workspace = Workspace::new(WorkspaceConfig::default());
    workspace.load_archive(&base, true, false).unwrap();
    assert_eq!(workspace.search_index().len(), 2);

    let key = EntryKey::new(2, RAW_TYPE);
    assert!(workspace.resolve(key, false).is_none());
    assert_eq!(workspace.resolve(key, true).unwrap().data().index.as_ref(), b"two");
    assert_eq!(workspace.archives().len(), 2);
    assert_eq!(workspace.archives()[1].path(), other);
    assert_eq!(workspace.active_archive().unwrap().path(), base);

    // Later lookups hit the loaded archive directly
    assert!(workspace.entry(key).is_some());
}

#[test]
fn dump_and_import_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let entry = TocEntry::new(
        EntryKey::new(0x42, RAW_TYPE),
        EntryData::new(b"index".to_vec(), b"gpu".to_vec(), Vec::<u8>::new()),
    );
    let path = write_archive(dir.path(), "base", vec![entry, raw_entry(1, b"one")]);
    let mut workspace = open(&path);
    let key = EntryKey::new(0x42, RAW_TYPE);
    let out = dir.path().join("dump");

    let report = workspace.dump_entries(&[key, EntryKey::new(9, RAW_TYPE)], &out);
    assert_eq!(report.succeeded, vec![key]);
    assert_eq!(report.failures.len(), 1);

    let dumped = out.join("0000000000000042.0000000000000007");
    assert_eq!(std::fs::read(&dumped).unwrap(), b"index");
    assert_eq!(
        std::fs::read(out.join("0000000000000042.0000000000000007.gpu_resources")).unwrap(),
        b"gpu"
    );
    assert!(!out.join("0000000000000042.0000000000000007.stream").exists());

    let target = EntryKey::new(1, RAW_TYPE);
    assert!(matches!(
        workspace.import_dump(target, &dumped),
        Err(ArchiveError::NoPatch)
    ));
    workspace.create_patch_from_active(None).unwrap();
    workspace.import_dump(target, &dumped).unwrap();

    let imported = workspace.active_patch().unwrap().entry(target).unwrap();
    assert!(imported.is_modified());
    assert_eq!(
        imported.data(),
        &EntryData::new(b"index".to_vec(), b"gpu".to_vec(), Vec::<u8>::new())
    );
}

#[test]
fn material_textures_are_copied_and_relinked() {
    let dir = tempfile::tempdir().unwrap();
    let texture = TocEntry::new(
        EntryKey::new(0x10, type_ids::TEXTURE),
        EntryData::new(vec![1; 16], vec![2; 16], Vec::<u8>::new()),
    );
    let path = write_archive(
        dir.path(),
        "base",
        vec![material_entry(5, &[0x10, 0x20]), texture],
    );
    let mut workspace = open(&path);
    let key = EntryKey::new(5, type_ids::MATERIAL);
    let material = Material::decode(&material_bytes(&[0x10, 0x20])).unwrap();

    assert!(matches!(
        workspace.save_material_with_textures(key, material.clone(), &HashMap::new()),
        Err(ArchiveError::NoPatch)
    ));
    workspace.create_patch_from_active(None).unwrap();
    let saved = workspace
        .save_material_with_textures(key, material, &HashMap::new())
        .unwrap();

    let copied_id = saved.texture_ids[0];
    assert_ne!(copied_id, 0x10);
    assert_eq!(saved.texture_ids[1], 0x20);

    let patch = workspace.active_patch().unwrap();
    let copied = patch.entry(EntryKey::new(copied_id, type_ids::TEXTURE)).unwrap();
    assert!(copied.is_created());
    assert_eq!(copied.data().gpu.as_ref(), &[2u8; 16]);

    let stored = patch.entry(key).unwrap();
    assert!(stored.is_modified());
    assert_eq!(
        Material::decode(&stored.data().index).unwrap().texture_ids,
        vec![copied_id, 0x20]
    );
}

#[test]
fn bulk_load_collects_failures() {
    let dir = tempfile::tempdir().unwrap();
    let good = write_archive(dir.path(), "good", vec![raw_entry(1, b"one")]);
    let missing = dir.path().join("missing");

    let mut workspace = Workspace::new(config());
    let report = workspace.bulk_load([missing.clone(), good.clone()]);
    assert_eq!(report.succeeded, vec![good.clone()]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].0, missing);
    assert_eq!(workspace.active_archive().unwrap().path(), good);
}

#[test]
fn empty_archives_are_skipped_when_configured() {
    let dir = tempfile::tempdir().unwrap();
    let raw = write_archive(dir.path(), "raw", vec![raw_entry(1, b"one")]);
    let materials = write_archive(dir.path(), "materials", vec![material_entry(5, &[])]);

    let mut workspace = Workspace::new(config().with_unload_empty_archives(true));
    assert_eq!(
        workspace.load_archive(&raw, true, false).unwrap(),
        LoadOutcome::SkippedEmpty
    );
    assert!(workspace.archives().is_empty());
    assert_eq!(
        workspace.load_archive(&materials, true, false).unwrap(),
        LoadOutcome::Loaded
    );
    assert_eq!(
        workspace.load_archive(&materials, true, false).unwrap(),
        LoadOutcome::AlreadyLoaded
    );
}

#[test]
fn switching_archives_clears_selection() {
    let dir = tempfile::tempdir().unwrap();
    let first = write_archive(dir.path(), "first", vec![raw_entry(1, b"one")]);
    let second = write_archive(dir.path(), "second", vec![raw_entry(2, b"two")]);
    let mut workspace = open(&first);
    workspace.load_archive(&second, false, false).unwrap();
    assert_eq!(workspace.active_archive().unwrap().path(), first);

    workspace.select_entries(&[EntryKey::new(1, RAW_TYPE)], false);
    assert_eq!(workspace.next_archive().unwrap().path(), second);
    assert!(workspace.selection().is_empty());
    assert_eq!(workspace.next_archive().unwrap().path(), first);
    assert!(workspace.set_active_archive_by_name("second"));
    assert!(!workspace.set_active_archive_by_name("third"));
}

#[test]
fn batch_save_reports_failures_without_touching_the_patch() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_archive(
        dir.path(),
        "base",
        vec![material_entry(5, &[0x10]), raw_entry(1, b"one")],
    );
    let mut workspace = open(&path);
    let material = EntryKey::new(5, type_ids::MATERIAL);
    let raw = EntryKey::new(1, RAW_TYPE);

    assert!(matches!(
        workspace.save_entries(&[material]),
        Err(ArchiveError::NoPatch)
    ));
    workspace.create_patch_from_active(None).unwrap();

    let report = workspace.save_entries(&[material, raw]).unwrap();
    assert_eq!(report.succeeded, vec![material]);
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].1.is_unknown_type());

    let patch = workspace.active_patch().unwrap();
    assert!(patch.contains(material));
    assert!(!patch.contains(raw));
}
