//! Destination index commands.

use std::path::Path;

use crate::config::Config;
use crate::index::{FileIndex, RelativePath};

/// Discard the index of `target` and rebuild it from what is on disk
pub fn cmd_rebuild_index(config: &Config, target: &Path) -> anyhow::Result<()> {
    let target = std::path::absolute(target)?;
    if !target.is_dir() {
        anyhow::bail!("{} is not a directory", target.display());
    }
    let index_file = target.join(&config.mirror.index_file);
    if index_file.exists() {
        std::fs::remove_file(&index_file)?;
    }

    let index = FileIndex::rebuild(&index_file, &target)?;
    println!("Rebuilt {:?} with {} entries", index_file, index.len());
    Ok(())
}

/// Show the index of `target`, rebuilding it first if there is none
pub fn cmd_index(
    config: &Config,
    target: &Path,
    list: bool,
    contains: Option<&str>,
) -> anyhow::Result<()> {
    let target = std::path::absolute(target)?;
    if !target.is_dir() {
        anyhow::bail!("{} is not a directory", target.display());
    }
    let index_file = target.join(&config.mirror.index_file);
    let index = FileIndex::load(&index_file, &target)?;

    println!("Index: {:?}", index_file);
    println!("Entries: {}", index.len());

    if list {
        for entry in index.iter() {
            println!("{}", entry);
        }
    }

    if let Some(query) = contains {
        match RelativePath::parse(query) {
            Some(path) if index.contains(&path) => println!("✓ {} is indexed", path),
            Some(path) => println!("✗ {} is not indexed", path),
            None => anyhow::bail!("empty path"),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::write_file;
    use tempfile::tempdir;

    #[test]
    fn test_rebuild_replaces_stale_index() {
        let dir = tempdir().unwrap();
        write_file(dir.path(), ".lossy.idx", b"/Gone/track.ogg");
        write_file(dir.path(), "Album/track.ogg", b"OggS");

        cmd_rebuild_index(&Config::default(), dir.path()).unwrap();

        let text = std::fs::read_to_string(dir.path().join(".lossy.idx")).unwrap();
        assert_eq!(text, "/Album\n/Album/track.ogg");
    }

    #[test]
    fn test_index_requires_directory() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(cmd_index(&Config::default(), &missing, false, None).is_err());
        assert!(cmd_index(&Config::default(), dir.path(), true, Some("/x")).is_ok());
    }
}
