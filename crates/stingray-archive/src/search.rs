//! Discovery of archives on disk
//!
//! Archive index files carry no extension (`9ba626afa44a3aa3`); their
//! siblings and patches do (`.gpu_resources`, `.stream`, `.patch_0`). The
//! search index reads only the header and entry table of each discovered
//! archive, so whole archives are loaded later and only when a lookup hits.

use std::path::{Path, PathBuf};
use stingray_formats::toc::{EntryKey, TocFile, TocListing};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Archive index files under `dir`, in file-name order
///
/// With `recursive` unset only the top level of `dir` is listed.
pub fn archive_index_paths<P: AsRef<Path>>(dir: P, recursive: bool) -> Vec<PathBuf> {
    let mut walk = WalkDir::new(dir).min_depth(1).sort_by_file_name();
    if !recursive {
        walk = walk.max_depth(1);
    }
    walk.into_iter()
        .flatten()
        .filter(|entry| entry.file_type().is_file() && entry.path().extension().is_none())
        .map(walkdir::DirEntry::into_path)
        .collect()
}

/// A discovered archive and the keys it holds
#[derive(Debug, Clone)]
pub struct SearchArchive {
    /// Index file path
    pub path: PathBuf,
    /// Keys read from the index file
    pub listing: TocListing,
}

/// Lazily populated pool of archives searched when the loaded set misses
#[derive(Debug, Clone, Default)]
pub struct SearchIndex {
    scanned: bool,
    archives: Vec<SearchArchive>,
}

impl SearchIndex {
    /// Index that has not scanned yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a scan has run since the last [`clear`](Self::clear)
    pub fn is_scanned(&self) -> bool {
        self.scanned
    }

    /// Scan `dir` recursively once, recording every readable archive listing
    ///
    /// Returns the number of archives found; later calls do nothing until
    /// the index is cleared. Unreadable files are skipped.
    pub fn discover<P: AsRef<Path>>(&mut self, dir: P) -> usize {
        if self.scanned {
            return 0;
        }
        self.scanned = true;

        for path in archive_index_paths(&dir, true) {
            match TocFile::read_listing(&path) {
                Ok(listing) => self.archives.push(SearchArchive { path, listing }),
                Err(e) => debug!("Skipping {}: {e}", path.display()),
            }
        }
        info!(
            "Discovered {} search archives under {}",
            self.archives.len(),
            dir.as_ref().display()
        );
        self.archives.len()
    }

    /// First discovered archive holding `key`
    pub fn find(&self, key: EntryKey) -> Option<&Path> {
        self.archives
            .iter()
            .find(|archive| archive.listing.contains(key))
            .map(|archive| archive.path.as_path())
    }

    /// Discovered archives in scan order
    pub fn archives(&self) -> &[SearchArchive] {
        &self.archives
    }

    /// Number of discovered archives
    pub fn len(&self) -> usize {
        self.archives.len()
    }

    /// Whether no archive was discovered
    pub fn is_empty(&self) -> bool {
        self.archives.is_empty()
    }

    /// Forget every discovered archive and allow a new scan
    pub fn clear(&mut self) {
        self.scanned = false;
        self.archives.clear();
    }
}

/// An entry found by [`find_entries_in_directory`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundEntry {
    /// Index file of the archive holding the entry
    pub archive: PathBuf,
    /// Key of the matching entry
    pub key: EntryKey,
}

/// Scan every archive index directly under `dir` for entries with one of `file_ids`
pub fn find_entries_in_directory<P: AsRef<Path>>(dir: P, file_ids: &[u64]) -> Vec<FoundEntry> {
    let paths = archive_index_paths(&dir, false);
    info!(
        "Searching for {} ids in {} archives",
        file_ids.len(),
        paths.len()
    );

    let mut found = Vec::new();
    for path in paths {
        let listing = match TocFile::read_listing(&path) {
            Ok(listing) => listing,
            Err(e) => {
                debug!("Skipping {}: {e}", path.display());
                continue;
            }
        };
        for key in listing.keys {
            if file_ids.contains(&key.file_id) {
                debug!("Found {key} in {}", path.display());
                found.push(FoundEntry {
                    archive: path.clone(),
                    key,
                });
            }
        }
    }
    found
}

/// Parse an id list: one `<id> [name]` per line
///
/// Ids containing letters are read as hex, others as decimal. Lines whose
/// id does not parse are skipped.
pub fn parse_id_list(text: &str) -> Vec<(u64, Option<String>)> {
    text.lines()
        .filter_map(|line| {
            let line = line.trim();
            let (id, name) = match line.split_once(char::is_whitespace) {
                Some((id, name)) => (id, Some(name.trim().to_string())),
                None => (line, None),
            };
            if id.is_empty() {
                return None;
            }
            let parsed = if id.chars().any(|c| c.is_ascii_alphabetic()) {
                u64::from_str_radix(id.trim_start_matches("0x"), 16)
            } else {
                id.parse()
            };
            match parsed {
                Ok(id) => Some((id, name.filter(|n| !n.is_empty()))),
                Err(_) => {
                    debug!("Skipping id list line {line:?}");
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use stingray_formats::toc::{EntryData, TocEntry};

    fn write_archive(dir: &Path, name: &str, keys: &[(u64, u64)]) -> PathBuf {
        let path = dir.join(name);
        let mut toc = TocFile::new(&path);
        for &(file_id, type_id) in keys {
            toc.add_entry(TocEntry::new(
                EntryKey::new(file_id, type_id),
                EntryData::index_only(vec![1, 2]),
            ))
            .unwrap();
        }
        toc.save(&path).unwrap();
        path
    }

    #[test]
    fn test_only_extensionless_files_are_archives() {
        let dir = tempfile::tempdir().unwrap();
        write_archive(dir.path(), "aaaa", &[(1, 7)]);
        write_archive(dir.path(), "bbbb.patch_0", &[(2, 7)]);
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        write_archive(&dir.path().join("nested"), "cccc", &[(3, 7)]);

        let names: Vec<String> = archive_index_paths(dir.path(), false)
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["aaaa"]);
        assert_eq!(archive_index_paths(dir.path(), true).len(), 2);
    }

    #[test]
    fn test_discover_runs_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_archive(dir.path(), "aaaa", &[(1, 7), (2, 8)]);
        std::fs::write(dir.path().join("garbage"), b"not an archive").unwrap();

        let mut index = SearchIndex::new();
        assert_eq!(index.discover(dir.path()), 1);
        assert_eq!(index.find(EntryKey::new(2, 8)), Some(path.as_path()));
        assert_eq!(index.find(EntryKey::new(2, 7)), None);

        write_archive(dir.path(), "bbbb", &[(5, 7)]);
        assert_eq!(index.discover(dir.path()), 0);
        index.clear();
        assert_eq!(index.discover(dir.path()), 2);
    }

    #[test]
    fn test_find_entries_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        let first = write_archive(dir.path(), "aaaa", &[(1, 7), (2, 7)]);
        let second = write_archive(dir.path(), "bbbb", &[(2, 8)]);

        let found = find_entries_in_directory(dir.path(), &[2]);
        assert_eq!(
            found,
            vec![
                FoundEntry {
                    archive: first,
                    key: EntryKey::new(2, 7)
                },
                FoundEntry {
                    archive: second,
                    key: EntryKey::new(2, 8)
                },
            ]
        );
    }

    #[test]
    fn test_parse_id_list() {
        let ids = parse_id_list("1792059921637536489 bones\n\ncd4238c6a0c69e32\nnot-an-id x\n");
        assert_eq!(
            ids,
            vec![
                (1_792_059_921_637_536_489, Some("bones".to_string())),
                (0xcd42_38c6_a0c6_9e32, None),
            ]
        );
    }
}
