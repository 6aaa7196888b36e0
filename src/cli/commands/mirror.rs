//! The mirror run: confirmation, walk, summary.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use super::SummaryFormat;
use crate::config::Config;
use crate::mirror::{Mirror, MirrorReport};
use crate::process::ExternalTools;

/// Mirror `paths[..n-1]` into `paths[n-1]`.
///
/// The summary is printed whether or not the run succeeds; the run's error
/// is returned afterwards so the process exits non-zero.
pub fn cmd_mirror(config: &Config, paths: &[PathBuf], yes: bool, format: SummaryFormat) -> anyhow::Result<()> {
    let Some((target, sources)) = paths.split_last() else {
        anyhow::bail!("no target directory given");
    };

    if !yes {
        print!(
            "This will mirror and convert all files from {:?} to {:?} - are you sure (y/n)? ",
            sources, target
        );
        io::stdout().flush()?;
        if !read_confirmation(&mut io::stdin().lock())? {
            println!("Nothing was changed.");
            return Ok(());
        }
    }

    let tools = ExternalTools::from_config(config)?;
    let mut mirror = Mirror::open(&tools, &config.mirror, target)?;
    let mut report = MirrorReport::new();

    let result = mirror.run(sources, &mut report);

    match result {
        Ok(()) => println!("\nDone :)"),
        Err(ref e) => println!("\nStopped: {}", e),
    }
    println!(
        "Index {:?} holds {} entries",
        mirror.index_file(),
        mirror.index().len()
    );
    print_report(&report, format)?;
    result?;
    Ok(())
}

/// Only a literal `y` confirms.
fn read_confirmation(input: &mut impl BufRead) -> io::Result<bool> {
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(answer.trim_end_matches(['\r', '\n']) == "y")
}

fn print_report(report: &MirrorReport, format: SummaryFormat) -> anyhow::Result<()> {
    match format {
        SummaryFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        SummaryFormat::Text => println!("{}", report),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_only_literal_y_confirms() {
        assert!(read_confirmation(&mut Cursor::new("y\n")).unwrap());
        assert!(read_confirmation(&mut Cursor::new("y\r\n")).unwrap());
        assert!(!read_confirmation(&mut Cursor::new("Y\n")).unwrap());
        assert!(!read_confirmation(&mut Cursor::new("yes\n")).unwrap());
        assert!(!read_confirmation(&mut Cursor::new("")).unwrap());
    }
}
