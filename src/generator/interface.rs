use crate::config::GeneratorTarget;
use crate::error::Result;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Directory holding one generator run's output.
///
/// Output written to a scratch directory is removed when the tree is
/// dropped, so a tree should live exactly as long as its copy step.
#[derive(Debug)]
pub struct GeneratedTree {
    root: PathBuf,
    _scratch: Option<TempDir>,
}

impl GeneratedTree {
    /// Output that already exists on disk and outlives the run.
    pub fn existing(root: PathBuf) -> Self {
        Self { root, _scratch: None }
    }

    /// Output written into `scratch`, removed on drop.
    pub fn scratch(scratch: TempDir) -> Self {
        Self { root: scratch.path().to_path_buf(), _scratch: Some(scratch) }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Trait for producing generated library sources for a target.
pub trait Generator {
    /// Runs (or locates) the generator output for `target`.
    ///
    /// # Returns
    /// * `Result<GeneratedTree>` - Directory with the generated files
    fn generate(&self, target: &GeneratorTarget) -> Result<GeneratedTree>;
}
