//! Persistent index of what already exists in the destination tree.
//!
//! The index is a sorted set of [`RelativePath`]s stored as plain text,
//! one path per line, in a file inside the destination directory. A path is
//! added only after it has been copied, converted, or found to exist, so
//! the index is the single source of truth for "already mirrored".
//!
//! When the index file is missing it is rebuilt from whatever is on disk in
//! the destination, which makes the index self-healing at the cost of one
//! full tree scan.

mod path;

pub use path::RelativePath;

use std::collections::BTreeSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{Error, Result, ResultExt};

/// Set of destination-relative paths known to be mirrored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileIndex {
    entries: BTreeSet<RelativePath>,
}

impl FileIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the index from `index_file`, rebuilding it from
    /// `destination_root` if the file does not exist.
    pub fn load(index_file: &Path, destination_root: &Path) -> Result<Self> {
        if !index_file.exists() {
            return Self::rebuild(index_file, destination_root);
        }
        let text = std::fs::read_to_string(index_file)
            .with_context(format!("reading index {}", index_file.display()))?;
        let index = Self::parse(&text);
        debug!("Loaded {} index entries from {:?}", index.len(), index_file);
        Ok(index)
    }

    /// Build a fresh index from the current contents of `destination_root`
    /// and persist it to `index_file`.
    pub fn rebuild(index_file: &Path, destination_root: &Path) -> Result<Self> {
        info!(
            "{:?} not found, rebuilding from existing files (if any). This might take a while...",
            index_file
        );
        let temp_file = temp_path(index_file);
        let mut index = Self::new();
        for entry in WalkDir::new(destination_root).min_depth(1) {
            let entry = entry.map_err(Error::walk)?;
            if entry.path() == index_file || entry.path() == temp_file {
                continue;
            }
            if let Some(rel) = RelativePath::from_base(destination_root, entry.path()) {
                index.add(rel);
            }
        }
        index.persist(index_file)?;
        info!("Rebuilt index with {} entries", index.len());
        Ok(index)
    }

    /// Parse the flat text form. Blank lines are ignored.
    pub fn parse(text: &str) -> Self {
        Self {
            entries: text.split('\n').filter_map(RelativePath::parse).collect(),
        }
    }

    pub fn contains(&self, path: &RelativePath) -> bool {
        self.entries.contains(path)
    }

    /// Insert `path`; returns `false` if it was already present.
    pub fn add(&mut self, path: RelativePath) -> bool {
        self.entries.insert(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RelativePath> {
        self.entries.iter()
    }

    /// All entries joined by `\n`, sorted, without a trailing newline.
    pub fn serialize(&self) -> String {
        self.entries
            .iter()
            .map(RelativePath::as_str)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Overwrite `index_file` with the serialized index.
    pub fn persist(&self, index_file: &Path) -> Result<()> {
        let temp_file = temp_path(index_file);
        std::fs::write(&temp_file, self.serialize())
            .with_context(format!("writing index {}", temp_file.display()))?;
        std::fs::rename(&temp_file, index_file)
            .with_context(format!("replacing index {}", index_file.display()))?;
        debug!("Persisted {} index entries to {:?}", self.len(), index_file);
        Ok(())
    }
}

fn temp_path(index_file: &Path) -> PathBuf {
    let mut name = OsString::from(index_file.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}
