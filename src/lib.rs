//! synth regenerates client library source trees.
//! It runs an external code generator, copies its output into a library
//! layout and patches known generator defects with ordered regex rules.

/// Command-line interface module for the synth application
pub mod cli;

/// Synth file loading and validation
/// Supports JSON and YAML formats (synth.json, synth.yml, synth.yaml)
pub mod config;

/// Common constants
pub mod constants;

/// Copying generated files into the library root
pub mod copy;

/// Error types and handling for the synth application
pub mod error;

/// Brace escaping for documentation comments
pub mod escape;

/// External generator invocation and pre-generated output
pub mod generator;

/// Post-process command execution
pub mod hooks;

/// Logger setup
pub mod logger;

/// Merge strategies for copies onto existing files
pub mod merge;

/// Typed generator options
pub mod options;

/// Placeholder rendering for expanded rules
pub mod renderer;

/// Substitution rules
pub mod rules;

/// Core orchestration
pub mod runner;

/// Glob based file selection
pub mod selector;
