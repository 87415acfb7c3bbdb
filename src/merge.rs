//! Merge strategies for copies that land on existing files.
//!
//! Regeneration must not clobber fields the release process owns: gem
//! versions, homepages and changelogs are kept from the existing file while
//! everything else comes from the generator.

use crate::config::MergeStrategy;
use log::debug;
use regex::{NoExpand, Regex};
use std::path::Path;
use std::sync::LazyLock;

static GEM_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^[ \t]+gem\.version[ \t]*=[ \t]*\S.*$"#).expect("valid gem version regex")
});
static GEM_HOMEPAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^[ \t]+gem\.homepage[ \t]*=[ \t]*"[^"]+"$"#).expect("valid homepage regex")
});
static VERSION_CONSTANT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^[ \t]*VERSION[ \t]*=[ \t]*"[^"]*"\S*$"#).expect("valid VERSION regex")
});

impl MergeStrategy {
    /// The text strategy that applies to `path`, if any. `Global` resolves by
    /// file name; `None` means the generated file is copied as bytes.
    pub fn for_path(&self, path: &Path) -> Option<MergeStrategy> {
        match self {
            MergeStrategy::Global => global_strategy(path),
            strategy => Some(*strategy),
        }
    }

    /// Produces the content to write, given the `existing` destination file
    /// and the freshly generated `generated` content.
    pub fn merge(&self, existing: &str, generated: &str, path: &Path) -> String {
        match self {
            MergeStrategy::Gemspec => merge_gemspec(existing, generated),
            MergeStrategy::Version => merge_version(existing, generated),
            MergeStrategy::Changelog => existing.to_string(),
            MergeStrategy::Global => match global_strategy(path) {
                Some(strategy) => {
                    debug!("Merging {} as {:?}", path.display(), strategy);
                    strategy.merge(existing, generated, path)
                }
                None => generated.to_string(),
            },
        }
    }
}

/// Picks the strategy the global merge uses for `path`, by file name.
pub fn global_strategy(path: &Path) -> Option<MergeStrategy> {
    let name = path.file_name()?.to_str()?;
    if name.ends_with(".gemspec") {
        Some(MergeStrategy::Gemspec)
    } else if name == "version.rb" {
        Some(MergeStrategy::Version)
    } else if name == "CHANGELOG.md" {
        Some(MergeStrategy::Changelog)
    } else {
        None
    }
}

/// Replaces the first line matching `line` in `generated` with the first one
/// found in `existing`, when both have one.
fn keep_line(line: &Regex, existing: &str, generated: &str) -> String {
    match line.find(existing) {
        Some(kept) => line.replacen(generated, 1, NoExpand(kept.as_str())).into_owned(),
        None => generated.to_string(),
    }
}

fn merge_gemspec(existing: &str, generated: &str) -> String {
    let merged = keep_line(&GEM_VERSION, existing, generated);
    keep_line(&GEM_HOMEPAGE, existing, &merged)
}

fn merge_version(existing: &str, generated: &str) -> String {
    keep_line(&VERSION_CONSTANT, existing, generated)
}
