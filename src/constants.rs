//! Common constants used throughout the synth application.

/// Supported synth file names, searched in this order
pub const SYNTH_FILES: [&str; 3] = ["synth.json", "synth.yml", "synth.yaml"];

/// Environment variable overriding the generator command. Its value is split
/// on whitespace without shell quoting, so arguments and paths cannot contain
/// spaces; use `generator.command` in the synth file for those.
pub const GENERATOR_ENV: &str = "SYNTH_GENERATOR";

/// Minimum pass limit for fixed-point rewrites; longer inputs get one pass per brace
pub const MAX_ESCAPE_PASSES: usize = 1024;

/// Directories never descended into when selecting files
pub const SKIPPED_DIRS: [&str; 2] = [".git", "vendor"];
