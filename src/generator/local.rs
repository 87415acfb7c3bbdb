use crate::config::GeneratorTarget;
use crate::error::{Error, Result};
use crate::generator::interface::{GeneratedTree, Generator};
use log::debug;
use std::path::{Path, PathBuf};

/// Generator reading output produced ahead of time.
///
/// Each target's files live in `<root>/<service>-<version>`.
pub struct LocalGenerator<P: AsRef<Path>> {
    root: P,
}

impl<P: AsRef<Path>> LocalGenerator<P> {
    /// Creates a new LocalGenerator instance.
    pub fn new(root: P) -> Self {
        Self { root }
    }

    pub fn output_dir(&self, target: &GeneratorTarget) -> PathBuf {
        self.root.as_ref().join(target.output_name())
    }
}

impl<P: AsRef<Path>> Generator for LocalGenerator<P> {
    /// # Errors
    /// * `Error::GeneratorError` if the target's directory doesn't exist
    fn generate(&self, target: &GeneratorTarget) -> Result<GeneratedTree> {
        let path = self.output_dir(target);
        if !path.is_dir() {
            return Err(Error::GeneratorError {
                target: target.to_string(),
                reason: format!("no pre-generated output at '{}'", path.display()),
            });
        }
        debug!("Using pre-generated output {}", path.display());
        Ok(GeneratedTree::existing(path))
    }
}
