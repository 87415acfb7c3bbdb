//! Command-line interface implementation for synth.
//! Provides argument parsing using clap.

use clap::Parser;
use std::path::{Path, PathBuf};

/// Command-line arguments structure for synth.
#[derive(Parser, Debug)]
#[command(author, version, about = "synth: regenerate and patch generated client libraries", long_about = None)]
pub struct Args {
    /// Synth file to run (default: synth.json, synth.yml or synth.yaml in the library root)
    #[arg(value_name = "SYNTH_FILE")]
    pub synth_file: Option<PathBuf>,

    /// Library root that generated files are copied into and patched
    /// (default: the synth file's directory, or the current directory)
    #[arg(short = 'C', long, value_name = "DIR")]
    pub library_root: Option<PathBuf>,

    /// Read pre-generated output from DIR/<service>-<version> instead of
    /// running the generator
    #[arg(short, long, value_name = "DIR")]
    pub generator_output: Option<PathBuf>,

    /// Do not run the post-process command
    #[arg(long)]
    pub skip_post_process: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Library root the run works in.
    pub fn resolved_library_root(&self) -> PathBuf {
        if let Some(root) = &self.library_root {
            return root.clone();
        }
        match self.synth_file.as_deref().and_then(Path::parent) {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

/// Parses command line arguments and returns the Args structure.
pub fn get_args() -> Args {
    Args::parse()
}
