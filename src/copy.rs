//! Copying generated files into the library root.

use crate::config::CopyDirective;
use crate::error::{Error, Result};
use crate::selector::{build_globset, has_glob_meta, select_files};
use globset::GlobSet;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// What happened to a single destination file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyAction {
    Created,
    Overwritten,
    Merged,
}

impl std::fmt::Display for CopyAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CopyAction::Created => write!(f, "Created"),
            CopyAction::Overwritten => write!(f, "Overwritten"),
            CopyAction::Merged => write!(f, "Merged"),
        }
    }
}

/// A file written by a copy directive, relative to the library root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopiedFile {
    pub target: PathBuf,
    pub action: CopyAction,
}

fn write_file(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(fs::write(path, content)?)
}

/// Resolves a directive into `(source file, destination relative path)` pairs.
///
/// * `.` or a directory: every file below it, keeping paths relative to it
/// * a glob: every match, keeping paths relative to the generated tree
/// * a file: that file
///
/// `dest` replaces the source path (files), or is prepended to the kept
/// relative paths (directories and globs). Destinations default to the
/// source's own relative path.
pub fn plan_copy(generated_root: &Path, directive: &CopyDirective) -> Result<Vec<(PathBuf, PathBuf)>> {
    let exclude = build_globset(&directive.exclude)?;
    let dest = directive.dest.as_deref().map(PathBuf::from);
    let source = directive.source.trim_end_matches('/');

    let plan = if has_glob_meta(source) {
        let globs = build_globset(&[source])?;
        select_files(generated_root, &globs, &exclude)?
            .into_iter()
            .map(|relative| {
                let target = match &dest {
                    Some(dest) => dest.join(&relative),
                    None => relative.clone(),
                };
                (generated_root.join(relative), target)
            })
            .collect()
    } else {
        let source_path = generated_root.join(source);
        if source_path.is_dir() {
            let prefix = if source == "." { PathBuf::new() } else { PathBuf::from(source) };
            files_below(generated_root, &source_path, &exclude)?
                .into_iter()
                .map(|below| {
                    let target = dest.clone().unwrap_or_else(|| prefix.clone()).join(&below);
                    (source_path.join(below), target)
                })
                .collect()
        } else if source_path.is_file() {
            let target = dest.unwrap_or_else(|| PathBuf::from(source));
            vec![(source_path, target)]
        } else {
            Vec::new()
        }
    };

    if plan.is_empty() {
        return Err(Error::CopySourceNotFoundError {
            source_path: directive.source.clone(),
            generated_root: generated_root.to_path_buf(),
        });
    }
    Ok(plan)
}

// Excludes are relative to the generated tree, not to the copied directory.
fn files_below(generated_root: &Path, dir: &Path, exclude: &GlobSet) -> Result<Vec<PathBuf>> {
    let everything = build_globset(&["**"])?;
    let offset = dir.strip_prefix(generated_root).unwrap_or(Path::new("")).to_path_buf();
    Ok(select_files(dir, &everything, &GlobSet::empty())?
        .into_iter()
        .filter(|below| {
            let from_root = offset.join(below);
            !exclude.is_match(&from_root)
        })
        .collect())
}

/// Copies the files a directive selects into `library_root`.
///
/// # Errors
/// * `Error::CopySourceNotFoundError` if the directive selects nothing
/// * `Error::IoError` on any read or write failure
pub fn copy_directive(
    generated_root: &Path,
    library_root: &Path,
    directive: &CopyDirective,
) -> Result<Vec<CopiedFile>> {
    let mut copied = Vec::new();
    for (source, target) in plan_copy(generated_root, directive)? {
        let dest_path = library_root.join(&target);
        let existed = dest_path.is_file();
        let strategy = directive.merge.and_then(|merge| merge.for_path(&target));
        let action = match strategy {
            Some(strategy) if existed => {
                let existing = fs::read_to_string(&dest_path)?;
                let generated = fs::read_to_string(&source)?;
                debug!("Merging {} into {}", source.display(), dest_path.display());
                let merged = strategy.merge(&existing, &generated, &target);
                write_file(&dest_path, merged.as_bytes())?;
                CopyAction::Merged
            }
            _ => {
                debug!("Copying {} to {}", source.display(), dest_path.display());
                write_file(&dest_path, &fs::read(&source)?)?;
                if existed {
                    CopyAction::Overwritten
                } else {
                    CopyAction::Created
                }
            }
        };
        copied.push(CopiedFile { target, action });
    }
    Ok(copied)
}
