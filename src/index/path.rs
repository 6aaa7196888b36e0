//! Paths relative to a mirror root.

use serde::Serialize;
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// A location below a base directory, rendered as `/a/b/c`.
///
/// Source entries are made relative to the *parent* of their source root, so
/// the source folder's own name is the first component. Destination entries
/// are made relative to the destination root. Both sides therefore agree on
/// the same key for the same file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct RelativePath(String);

impl RelativePath {
    /// Strip `base` from `path`.
    ///
    /// Returns `None` when `path` is not below `base`, is `base` itself,
    /// contains `..`-style components after the prefix, or has a component
    /// that is not valid UTF-8. Such names could not be told apart once
    /// written to the index.
    pub fn from_base(base: &Path, path: &Path) -> Option<Self> {
        let rest = path.strip_prefix(base).ok()?;
        let mut rendered = String::new();
        for component in rest.components() {
            match component {
                Component::Normal(part) => {
                    rendered.push('/');
                    rendered.push_str(part.to_str()?);
                }
                Component::CurDir => {}
                _ => return None,
            }
        }
        if rendered.is_empty() {
            None
        } else {
            Some(Self(rendered))
        }
    }

    /// Parse one line of a persisted index. Blank lines yield `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            return None;
        }
        if line.starts_with('/') {
            Some(Self(line.to_string()))
        } else {
            Some(Self(format!("/{line}")))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last component.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or_default()
    }

    /// Suffix of the file name after the last `.`, lower-cased.
    pub fn extension(&self) -> Option<String> {
        self.file_name()
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
    }

    /// Same path with the file extension replaced (or appended if there was none).
    pub fn with_extension(&self, extension: &str) -> Self {
        let name = self.file_name();
        let dir = &self.0[..self.0.len() - name.len()];
        let stem = name.rsplit_once('.').map_or(name, |(stem, _)| stem);
        Self(format!("{dir}{stem}.{extension}"))
    }

    /// Absolute location of this path below `root`.
    pub fn to_path_under(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        path.extend(self.0.split('/').filter(|part| !part.is_empty()));
        path
    }
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
