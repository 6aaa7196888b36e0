//! Incremental mirroring of source trees into one lossy destination tree.
//!
//! For every entry found by a depth-first walk of each source directory:
//! directories are created in the destination, lossy audio and artwork is
//! copied, lossless audio is transcoded, and everything that lands in the
//! destination is recorded in the [`FileIndex`] so the next run can skip it.
//!
//! # Example
//!
//! ```ignore
//! let tools = ExternalTools::from_config(&config)?;
//! let mut mirror = Mirror::open(&tools, &config.mirror, Path::new("/music/.lossy"))?;
//! let mut report = MirrorReport::new();
//! let result = mirror.run(&[PathBuf::from("/music/Music")], &mut report);
//! println!("{report}");
//! result?;
//! ```

mod report;

pub use report::MirrorReport;

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::classifier::{Decision, EntryFacts, ExtensionPolicy};
use crate::config::MirrorConfig;
use crate::error::{Error, Result, ResultExt};
use crate::index::{FileIndex, RelativePath};
use crate::process::MediaTools;

/// A mirror run into one destination directory.
pub struct Mirror<'a, T: MediaTools> {
    tools: &'a T,
    policy: ExtensionPolicy,
    target_extension: String,
    target_dir: PathBuf,
    index_file: PathBuf,
    index: FileIndex,
}

impl<'a, T: MediaTools> Mirror<'a, T> {
    /// Prepare a run into `target_dir`, creating it if needed and loading (or
    /// rebuilding) its index.
    pub fn open(tools: &'a T, config: &MirrorConfig, target_dir: &Path) -> Result<Self> {
        if !target_dir.exists() {
            info!("creating directory: {}", target_dir.display());
            fs::create_dir_all(target_dir)
                .with_context(format!("creating {}", target_dir.display()))?;
        }
        let target_dir = fs::canonicalize(target_dir)
            .with_context(format!("reading target {}", target_dir.display()))?;
        let index_file = target_dir.join(&config.index_file);
        let index = FileIndex::load(&index_file, &target_dir)?;

        Ok(Self {
            tools,
            policy: ExtensionPolicy::from_config(config),
            target_extension: config.target_extension.clone(),
            target_dir,
            index_file,
            index,
        })
    }

    pub fn index(&self) -> &FileIndex {
        &self.index
    }

    pub fn index_file(&self) -> &Path {
        &self.index_file
    }

    /// Mirror every source directory in turn.
    ///
    /// The index is persisted after each source directory and once more at
    /// the end, also when the walk stops with an error.
    pub fn run(&mut self, sources: &[PathBuf], report: &mut MirrorReport) -> Result<()> {
        let result = self.mirror_all(sources, report);
        let persisted = self.index.persist(&self.index_file);
        result.and(persisted)
    }

    fn mirror_all(&mut self, sources: &[PathBuf], report: &mut MirrorReport) -> Result<()> {
        for source in sources {
            self.mirror_source(source, report)?;
            self.index.persist(&self.index_file)?;
        }
        Ok(())
    }

    /// Walk one source directory. Paths are taken relative to its parent, so
    /// the directory itself appears in the destination.
    pub fn mirror_source(&mut self, source: &Path, report: &mut MirrorReport) -> Result<()> {
        // Resolves `..` and symlinks so the parent below is the real parent
        let source = fs::canonicalize(source)
            .with_context(format!("reading source {}", source.display()))?;
        if self.target_dir.starts_with(&source) {
            return Err(Error::config(format!(
                "target {} lies inside source {}",
                self.target_dir.display(),
                source.display()
            )));
        }
        let base = source.parent().unwrap_or(&source).to_path_buf();
        info!("Mirroring {}", source.display());

        for entry in WalkDir::new(&source).follow_links(true).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => match dangling_link(&e) {
                    Some(link) => {
                        warn!("{} points nowhere, skipping", link.display());
                        report.total += 1;
                        report.skipped += 1;
                        report.record_broken(link);
                        continue;
                    }
                    None => {
                        error!("could not read directory {:?}: {}", e.path(), e);
                        return Err(Error::walk(e));
                    }
                },
            };
            self.visit(&base, &entry, report)?;
        }
        Ok(())
    }

    fn visit(&mut self, base: &Path, entry: &DirEntry, report: &mut MirrorReport) -> Result<()> {
        let path = entry.path();
        let Some(rel) = RelativePath::from_base(base, path) else {
            warn!("{} has no usable name below {}, skipping", path.display(), base.display());
            if !entry.file_type().is_dir() {
                report.total += 1;
                report.skipped += 1;
            }
            return Ok(());
        };
        let is_dir = entry.file_type().is_dir();
        if !is_dir {
            report.total += 1;
        }
        // Unreadable metadata is treated like an empty file: broken, retried next run
        let len = if is_dir {
            0
        } else {
            entry.metadata().map(|m| m.len()).unwrap_or(0)
        };
        let extension = rel.extension();
        let facts = EntryFacts {
            is_dir,
            len,
            extension: extension.as_deref(),
            indexed: self.index.contains(&rel),
        };

        let tools = self.tools;
        let decision = match self.policy.classify(facts, || tools.probe(path)) {
            Ok(decision) => decision,
            Err(e) if e.is_timeout() => {
                report.record_timeout(path);
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let outcome = match decision {
            Decision::RecordDirectory => self.record_directory(rel),
            Decision::SkipAlreadyIndexed => {
                if !is_dir {
                    debug!("{} found in index, skipping", rel);
                    report.existing += 1;
                }
                Ok(())
            }
            Decision::SkipEmptyFile => {
                warn!("{} is empty, skipping", path.display());
                report.skipped += 1;
                report.record_broken(path);
                Ok(())
            }
            Decision::CopyAsIs => self.copy(path, rel, report),
            Decision::Convert => self.convert(path, rel, report),
            Decision::SkipUnknownType => {
                warn!("Don't know how to handle {}, skipping", rel);
                report.skipped += 1;
                Ok(())
            }
        };

        match outcome {
            Err(e) if e.is_timeout() => {
                report.record_timeout(path);
                Ok(())
            }
            other => other,
        }
    }

    fn record_directory(&mut self, rel: RelativePath) -> Result<()> {
        let dir = rel.to_path_under(&self.target_dir);
        if !dir.exists() {
            info!("creating directory: {}", dir.display());
            fs::create_dir_all(&dir).with_context(format!("creating {}", dir.display()))?;
        }
        self.index.add(rel);
        Ok(())
    }

    fn copy(&mut self, source: &Path, rel: RelativePath, report: &mut MirrorReport) -> Result<()> {
        let destination = rel.to_path_under(&self.target_dir);
        if destination.exists() {
            debug!("{} already exists", destination.display());
            report.existing += 1;
        } else {
            ensure_parent(&destination)?;
            self.tools
                .copy(source, &destination)
                .inspect_err(|_| discard_partial(&destination))?;
            report.copied += 1;
        }
        self.index.add(rel);
        Ok(())
    }

    fn convert(&mut self, source: &Path, rel: RelativePath, report: &mut MirrorReport) -> Result<()> {
        let converted = rel.with_extension(&self.target_extension);
        if self.index.contains(&converted) {
            debug!("{} found in index, skipping", converted);
            report.existing += 1;
            return Ok(());
        }

        let destination = converted.to_path_under(&self.target_dir);
        if destination.exists() {
            debug!("{} already exists", destination.display());
            report.existing += 1;
        } else {
            ensure_parent(&destination)?;
            self.tools
                .transcode(source, &destination)
                .inspect_err(|_| discard_partial(&destination))?;
            report.converted += 1;

            // The transcoder can exit cleanly and still leave nothing behind
            let len = fs::metadata(&destination).map(|m| m.len()).unwrap_or(0);
            if len == 0 {
                warn!("{} is empty after conversion", destination.display());
                report.record_broken(&destination);
            }
        }
        self.index.add(converted);
        Ok(())
    }
}

/// The path of a walk error caused by a symlink whose target is missing.
fn dangling_link(error: &walkdir::Error) -> Option<&Path> {
    if error.loop_ancestor().is_some() {
        return None;
    }
    let path = error.path()?;
    let is_link = fs::symlink_metadata(path).is_ok_and(|m| m.file_type().is_symlink());
    (is_link && fs::metadata(path).is_err()).then_some(path)
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            info!("creating directory: {}", parent.display());
            fs::create_dir_all(parent).with_context(format!("creating {}", parent.display()))?;
        }
    }
    Ok(())
}

/// Remove whatever a failed or killed tool left at `path`.
fn discard_partial(path: &Path) {
    if path.exists() {
        if let Err(e) = fs::remove_file(path) {
            warn!("could not remove partial file {}: {}", path.display(), e);
        }
    }
}
