//! Sources of generated library code.
//! Handles both running the external generator and reading output
//! generated ahead of time.
use crate::config::SynthConfig;
use crate::constants::GENERATOR_ENV;
use std::path::PathBuf;

pub mod command;
pub mod interface;
pub mod local;

pub use command::CommandGenerator;
pub use interface::{GeneratedTree, Generator};
pub use local::LocalGenerator;

/// Where generated code comes from for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratorSource {
    /// Run the generator command
    Command(Vec<String>),
    /// Read pre-generated output from this directory
    Output(PathBuf),
}

impl std::fmt::Display for GeneratorSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeneratorSource::Command(command) => write!(f, "command: '{}'", command.join(" ")),
            GeneratorSource::Output(path) => {
                write!(f, "pre-generated output: '{}'", path.display())
            }
        }
    }
}

impl GeneratorSource {
    /// Picks the source: explicit output directory first, then the
    /// `SYNTH_GENERATOR` environment variable (split on whitespace, no
    /// quoting), then the synth file.
    pub fn resolve(output: Option<PathBuf>, config: &SynthConfig) -> Self {
        if let Some(path) = output {
            return Self::Output(path);
        }
        match std::env::var(GENERATOR_ENV) {
            Ok(command) if !command.trim().is_empty() => {
                Self::Command(command.split_whitespace().map(String::from).collect())
            }
            _ => Self::Command(config.generator.command.clone()),
        }
    }

    pub fn into_generator(self) -> Box<dyn Generator> {
        match self {
            GeneratorSource::Command(command) => Box::new(CommandGenerator::new(command)),
            GeneratorSource::Output(path) => Box::new(LocalGenerator::new(path)),
        }
    }
}
