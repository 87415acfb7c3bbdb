//! Error handling for the synth application.
//! Defines the error type and result alias used throughout the application.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// A single problem found while validating a synth configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    #[error("synth configuration declares no mappings")]
    EmptyMappingList,

    #[error("mapping #{mapping} is missing required field '{field}'")]
    MissingField { mapping: usize, field: &'static str },

    #[error("mapping #{mapping}: destination '{dest}' must be a relative path inside the library root")]
    InvalidDestination { mapping: usize, dest: String },

    #[error("rule '{rule}' is missing required field '{field}'")]
    MissingRuleField { rule: String, field: &'static str },

    #[error("rule '{rule}' has invalid configuration: {message}")]
    InvalidRule { rule: String, message: String },

    #[error("generator option '{option}' is invalid: {message}")]
    InvalidOption { option: &'static str, message: String },
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    issues.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

/// Error types for synth operations.
///
/// Every variant is fatal: the runner never recovers locally and the error
/// ends up as the process exit status.
#[derive(Error, Debug)]
pub enum Error {
    /// Represents errors that occur during file system operations
    #[error("IO error: {0}.")]
    IoError(#[from] io::Error),

    /// Represents errors that occur while loading the synth file
    #[error("Configuration error: {0}.")]
    ConfigError(String),

    /// Represents validation failures in the synth file or generator options
    #[error("Validation error: {}.", join_issues(.issues))]
    ValidationError { issues: Vec<ValidationIssue> },

    /// The external generator failed or produced nothing usable
    #[error("Generator error for '{target}': {reason}.")]
    GeneratorError { target: String, reason: String },

    /// A copy directive matched nothing in the generated tree
    #[error("Copy source '{source_path}' does not exist in generated output '{generated_root}'.")]
    CopySourceNotFoundError { source_path: String, generated_root: PathBuf },

    /// A substitution rule selected no files
    #[error("Rule '{rule}' matched no files for {}.", .patterns.join(", "))]
    NoMatchingFilesError { rule: String, patterns: Vec<String> },

    /// A rule or precondition pattern is not a valid regular expression
    #[error("Invalid pattern '{pattern}': {source}.")]
    PatternError {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A file selector is not a valid glob
    #[error("Invalid glob: {0}.")]
    GlobError(#[from] globset::Error),

    /// Represents errors that occur while rendering rule templates
    #[error("Template error: {0}.")]
    MinijinjaError(#[from] minijinja::Error),

    /// A fixed-point rewrite kept finding matches past its pass limit
    #[error("Rewrite did not converge after {passes} passes.")]
    FixedPointError { passes: usize },

    /// Represents errors that occur during post-process command execution
    #[error("Post-process error: {0}.")]
    HookError(String),

    /// Represents failures while walking a directory tree
    #[error("Directory walk error: {0}.")]
    WalkError(#[from] walkdir::Error),
}

/// Convenience type alias for Results with [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Default error handler that prints the error and exits the program.
///
/// # Arguments
/// * `err` - The Error to handle
///
/// # Behavior
/// Prints the error message to stderr and exits with status code 1
pub fn default_error_handler(err: Error) {
    eprintln!("{err}");
    std::process::exit(1);
}
