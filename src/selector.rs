//! Glob based file selection.
//! Rules and copy directives name files with globs relative to some root
//! (the library root or a generated tree). `*` never crosses a path
//! separator, `**` spans any number of directories.

use crate::constants::SKIPPED_DIRS;
use crate::error::Result;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use log::debug;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Compiles `patterns` into a single set.
///
/// # Errors
/// * `Error::GlobError` if any pattern is not a valid glob
pub fn build_globset<S: AsRef<str>>(patterns: &[S]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern.as_ref()).literal_separator(true).build()?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// Whether `pattern` contains glob syntax or names a single path.
pub fn has_glob_meta(pattern: &str) -> bool {
    pattern.contains(['*', '?', '[', '{'])
}

/// Relative path with forward slashes, the form globs are matched against.
pub fn slash_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<&str> = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join("/"))
}

fn is_skipped(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry.file_name().to_str().is_some_and(|name| SKIPPED_DIRS.contains(&name))
}

/// Lists files under `root` whose relative path matches `globs`, sorted.
///
/// `exclude` removes matches; pass an empty set to keep everything.
pub fn select_files(root: &Path, globs: &GlobSet, exclude: &GlobSet) -> Result<Vec<PathBuf>> {
    let mut selected = Vec::new();
    let walker = WalkDir::new(root).sort_by_file_name().into_iter();
    for entry in walker.filter_entry(|e| !is_skipped(e)) {
        let entry = entry?;
        if entry.depth() > 0 && entry.path_is_symlink() {
            debug!("Skipping symlink {}", entry.path().display());
            continue;
        }
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(relative) = slash_path(root, entry.path()) else {
            debug!("Skipping non UTF-8 path {}", entry.path().display());
            continue;
        };
        if globs.is_match(&relative) && !exclude.is_match(&relative) {
            selected.push(PathBuf::from(relative));
        }
    }
    Ok(selected)
}
