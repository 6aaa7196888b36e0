//! Per-run counters and the list of broken files.

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// What a mirror run did.
///
/// Threaded through the walk by `&mut` and printed once at the end,
/// whether the run succeeded or not.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MirrorReport {
    /// Files seen (directories are not counted)
    pub total: usize,
    /// Files already indexed or already present in the destination
    pub existing: usize,
    pub copied: usize,
    pub converted: usize,
    /// Empty sources and unknown file types
    pub skipped: usize,
    /// Files whose copy, conversion or probe hit the tool timeout
    pub timed_out: usize,
    /// Empty sources and empty conversion results
    pub broken_files: BTreeSet<PathBuf>,
    /// Directories containing at least one broken file
    pub broken_albums: BTreeSet<PathBuf>,
    pub timed_out_files: BTreeSet<PathBuf>,
}

impl MirrorReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember `file` and its directory as broken.
    pub fn record_broken(&mut self, file: &Path) {
        self.broken_files.insert(file.to_path_buf());
        if let Some(parent) = file.parent() {
            self.broken_albums.insert(parent.to_path_buf());
        }
    }

    pub fn record_timeout(&mut self, file: &Path) {
        self.timed_out += 1;
        self.timed_out_files.insert(file.to_path_buf());
    }

    pub fn has_broken(&self) -> bool {
        !self.broken_files.is_empty()
    }
}

impl fmt::Display for MirrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, " Files:     {}", self.total)?;
        writeln!(f, " Existing:  {}", self.existing)?;
        writeln!(f, " Copied:    {}", self.copied)?;
        writeln!(f, " Converted: {}", self.converted)?;
        writeln!(f, " Skipped:   {}", self.skipped)?;
        write!(f, " Timed out: {}", self.timed_out)?;
        for file in &self.timed_out_files {
            write!(f, "\n   {}", file.display())?;
        }
        if self.has_broken() {
            write!(f, "\nDirectories with broken files:")?;
            for album in &self.broken_albums {
                write!(f, "\n{}", album.display())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_broken_collects_distinct_albums() {
        let mut report = MirrorReport::new();
        report.record_broken(Path::new("/music/A/1.flac"));
        report.record_broken(Path::new("/music/A/2.flac"));
        report.record_broken(Path::new("/music/B/1.flac"));

        assert_eq!(report.broken_files.len(), 3);
        assert_eq!(
            report.broken_albums.iter().collect::<Vec<_>>(),
            vec![Path::new("/music/A"), Path::new("/music/B")]
        );
    }

    #[test]
    fn test_summary_lists_counts() {
        let report = MirrorReport {
            total: 5,
            existing: 1,
            copied: 2,
            converted: 1,
            skipped: 1,
            ..Default::default()
        };
        let text = report.to_string();
        assert!(text.contains(" Files:     5"));
        assert!(text.contains(" Copied:    2"));
        assert!(!text.contains("broken"));
    }

    #[test]
    fn test_summary_lists_broken_albums() {
        let mut report = MirrorReport::new();
        report.record_broken(Path::new("/music/Rip Again/1.flac"));
        let text = report.to_string();
        assert!(text.contains("Directories with broken files:\n/music/Rip Again"));
    }

    #[test]
    fn test_report_serializes_to_json() {
        let mut report = MirrorReport::new();
        report.record_timeout(Path::new("/music/slow.flac"));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["timed_out"], 1);
        assert_eq!(json["timed_out_files"][0], "/music/slow.flac");
    }
}
