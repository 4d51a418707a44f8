//! Removing a string from the names of the entries in a directory.

use crate::error::{Error, Result};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

/// A planned rename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rename {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Plans a rename for every entry directly in `dir` whose name contains
/// `needle`, removing its first occurrence. Sorted by name.
///
/// Entries whose name would become empty are skipped.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] for an empty `needle`, or an I/O error if
/// the directory cannot be listed.
pub fn plan_renames(dir: &Path, needle: &str) -> Result<Vec<Rename>> {
    if needle.is_empty() {
        return Err(Error::input("the string to remove is empty"));
    }

    let mut names: Vec<String> = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(Error::io("failed to read directory", dir))? {
        let entry = entry.map_err(Error::io("failed to read directory", dir))?;
        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(name) => warn!(?name, "Skipping non UTF-8 file name"),
        }
    }
    names.sort();

    Ok(names
        .into_iter()
        .filter(|name| name.contains(needle))
        .filter_map(|name| {
            let renamed = name.replacen(needle, "", 1);
            if renamed.is_empty() {
                warn!(%name, "Skipping, nothing would be left of the name");
                return None;
            }
            Some(Rename {
                from: dir.join(&name),
                to: dir.join(renamed),
            })
        })
        .collect())
}

/// Answer to a confirmation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirm {
    Yes,
    No,
    Invalid,
}

/// Prompts on `out` and reads a `Y/y/N/n` answer from `input`.
///
/// # Errors
///
/// Returns an I/O error if either stream fails.
pub fn ask<R: BufRead, W: Write>(prompt: &str, input: &mut R, out: &mut W) -> std::io::Result<Confirm> {
    write!(out, "{prompt} Y/N ")?;
    out.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(match line.trim() {
        "Y" | "y" => Confirm::Yes,
        "N" | "n" => Confirm::No,
        _ => Confirm::Invalid,
    })
}

/// Removes `needle` from entry names in `dir`, asking before each rename
/// unless `yes` is set. Reports the count on `out` and returns the renames
/// performed.
///
/// # Errors
///
/// Returns an error if the directory cannot be listed or `input`/`out` fail.
pub fn remove_str<R: BufRead, W: Write>(
    dir: &Path,
    needle: &str,
    yes: bool,
    input: &mut R,
    out: &mut W,
) -> Result<Vec<Rename>> {
    let prompt_err = || Error::io("failed to prompt", "<stdin>");
    let mut done = Vec::new();

    for rename in plan_renames(dir, needle)? {
        let prompt = format!("mv {} {} ?", rename.from.display(), rename.to.display());
        if !yes {
            match ask(&prompt, input, out).map_err(prompt_err())? {
                Confirm::Yes => {}
                Confirm::No => continue,
                Confirm::Invalid => {
                    writeln!(out, "invalid choice, skipping").map_err(prompt_err())?;
                    continue;
                }
            }
        }

        if rename.to.exists() {
            warn!(to = %rename.to.display(), "Target exists, skipping");
            continue;
        }
        match std::fs::rename(&rename.from, &rename.to) {
            Ok(()) => done.push(rename),
            Err(e) => warn!(from = %rename.from.display(), error = %e, "Rename failed"),
        }
    }

    writeln!(out, "renamed {} entries", done.len()).map_err(prompt_err())?;
    Ok(done)
}
