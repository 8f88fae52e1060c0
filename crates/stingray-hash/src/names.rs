//! Hash-name lookup lists
//!
//! Three plain-text list kinds are supported, one entry per line:
//!
//! | List | Line shape | Example |
//! |------|------------|---------|
//! | type names | `<hex hash> <name>` | `cd4238c6a0c69e32 texture` |
//! | file / friendly names | `<decimal hash> <name>` | `1792059921637536489 bones` |
//! | archive names | `<hex archive id> <title>` | `9ba626afa44a3aa3 Base Patch` |
//!
//! File names are verified names: the hash of the name equals the id. Friendly
//! names are user-chosen labels and are only persisted to the friendly list
//! unless they also verify.

use crate::error::{HashError, HashResult};
use crate::murmur::hash64;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Archive id of the base archive patches are usually built on
pub const BASE_PATCH_ARCHIVE: &str = "9ba626afa44a3aa3";

/// In-memory hash-to-name tables
#[derive(Debug, Clone, Default)]
pub struct HashNames {
    type_names: HashMap<u64, String>,
    type_ids: HashMap<String, u64>,
    file_names: BTreeMap<u64, String>,
    archive_names: Vec<(String, String)>,
}

impl HashNames {
    /// Create empty tables
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a type-name list from disk
    pub fn load_type_names<P: AsRef<Path>>(&mut self, path: P) -> HashResult<usize> {
        let text = fs::read_to_string(path)?;
        self.parse_type_names(&text)
    }

    /// Parse type-name list content, returning the number of names added
    pub fn parse_type_names(&mut self, text: &str) -> HashResult<usize> {
        let mut added = 0;
        for (line, id, name) in parse_lines(text, false)? {
            let id = u64::from_str_radix(id, 16).map_err(|_| HashError::InvalidHash {
                line,
                value: id.to_string(),
            })?;
            self.type_ids.insert(name.to_string(), id);
            self.type_names.insert(id, name.to_string());
            added += 1;
        }
        debug!("Loaded {} type names", added);
        Ok(added)
    }

    /// Load a verified file-name list, replacing existing names for the same ids
    pub fn load_file_names<P: AsRef<Path>>(&mut self, path: P) -> HashResult<usize> {
        let text = fs::read_to_string(path)?;
        self.parse_file_names(&text, true)
    }

    /// Load a friendly-name list; ids that already have a name are kept as is
    pub fn load_friendly_names<P: AsRef<Path>>(&mut self, path: P) -> HashResult<usize> {
        let text = fs::read_to_string(path)?;
        self.parse_file_names(&text, false)
    }

    /// Parse decimal `<id> <name>` lines
    pub fn parse_file_names(&mut self, text: &str, replace: bool) -> HashResult<usize> {
        let mut added = 0;
        for (line, id, name) in parse_lines(text, true)? {
            let id: u64 = id.parse().map_err(|_| HashError::InvalidHash {
                line,
                value: id.to_string(),
            })?;
            if !replace && self.file_names.contains_key(&id) {
                continue;
            }
            self.file_names.insert(id, name.to_string());
            added += 1;
        }
        debug!("Loaded {} file names", added);
        Ok(added)
    }

    /// Load every `*.txt` archive-name list in a directory
    ///
    /// Titles are prefixed with the list's file stem, so `dlc.txt` containing
    /// `abcd Armor` yields `dlc: Armor`. The base patch archive is always known.
    pub fn load_archive_names<P: AsRef<Path>>(&mut self, dir: P) -> HashResult<usize> {
        let mut added = 0;
        let mut paths: Vec<_> = fs::read_dir(dir)?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "txt"))
            .collect();
        paths.sort();

        for path in paths {
            let prefix = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();
            let text = fs::read_to_string(&path)?;
            added += self.parse_archive_names(&text, &prefix)?;
        }

        if self.archive_name(BASE_PATCH_ARCHIVE).is_none() {
            self.archive_names.push((
                BASE_PATCH_ARCHIVE.to_string(),
                "SDK: Base Patch Archive".to_string(),
            ));
        }
        Ok(added)
    }

    /// Parse archive-name list content under a title prefix
    pub fn parse_archive_names(&mut self, text: &str, prefix: &str) -> HashResult<usize> {
        let mut added = 0;
        for (_, id, title) in parse_lines(text, true)? {
            self.archive_names
                .push((id.to_string(), format!("{prefix}: {title}")));
            added += 1;
        }
        Ok(added)
    }

    /// Look up a type name by its hash
    pub fn type_name(&self, type_id: u64) -> Option<&str> {
        self.type_names.get(&type_id).map(String::as_str)
    }

    /// Look up a type hash by its name
    pub fn type_id(&self, name: &str) -> Option<u64> {
        self.type_ids.get(name).copied()
    }

    /// Look up the known name of a file id
    pub fn file_name(&self, file_id: u64) -> Option<&str> {
        self.file_names
            .get(&file_id)
            .map(String::as_str)
            .filter(|name| !name.is_empty())
    }

    /// Name for display: the known name or the decimal id
    pub fn display_name(&self, file_id: u64) -> String {
        self.file_name(file_id)
            .map_or_else(|| file_id.to_string(), str::to_string)
    }

    /// Look up an archive title by its hex id
    pub fn archive_name(&self, archive_id: &str) -> Option<&str> {
        self.archive_names
            .iter()
            .find(|(id, _)| id == archive_id)
            .map(|(_, title)| title.as_str())
    }

    /// Look up an archive hex id by its title
    pub fn archive_id(&self, title: &str) -> Option<&str> {
        self.archive_names
            .iter()
            .find(|(_, name)| name == title)
            .map(|(id, _)| id.as_str())
    }

    /// Set or replace the friendly name of a file id
    pub fn set_friendly_name(&mut self, file_id: u64, name: impl Into<String>) {
        self.file_names.insert(file_id, name.into());
    }

    /// Persist names to the verified and friendly lists
    ///
    /// The verified list only receives names whose hash matches their id.
    pub fn save_file_names<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        verified_path: P,
        friendly_path: Q,
    ) -> HashResult<()> {
        let mut verified = String::new();
        let mut friendly = String::new();
        for (id, name) in self.file_names.iter().filter(|(_, n)| !n.is_empty()) {
            let line = format!("{id} {name}\n");
            if hash64(name) == *id {
                verified.push_str(&line);
            }
            friendly.push_str(&line);
        }
        fs::write(verified_path, verified)?;
        fs::write(friendly_path, friendly)?;
        Ok(())
    }
}

/// Split non-empty lines into `(line number, hash field, name field)`
///
/// With `rest` the name is everything after the first space, otherwise only
/// the second whitespace-separated token.
fn parse_lines(text: &str, rest: bool) -> HashResult<Vec<(usize, &str, &str)>> {
    let mut out = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let trimmed = raw.trim_end_matches('\r');
        if trimmed.trim().is_empty() {
            continue;
        }
        let Some((id, name)) = trimmed.split_once(' ') else {
            return Err(HashError::MalformedLine {
                line: index + 1,
                content: trimmed.to_string(),
            });
        };
        let name = if rest {
            name
        } else {
            name.split(' ').next().unwrap_or_default()
        };
        out.push((index + 1, id, name));
    }
    Ok(out)
}
