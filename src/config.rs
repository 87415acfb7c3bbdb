//! Synth file handling.
//! This module loads synth files (JSON or YAML) describing which generator
//! targets to run, what to copy out of their output and which substitution
//! rules to apply afterwards.

use crate::constants::SYNTH_FILES;
use crate::error::{Error, Result, ValidationIssue};
use crate::options::GeneratorOptions;
use crate::rules::SubstitutionRule;
use log::debug;
use serde::Deserialize;
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Top-level synth file contents.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SynthConfig {
    #[serde(default)]
    pub generator: GeneratorSettings,
    pub mappings: Vec<Mapping>,
    /// Shell command run once in the library root after every mapping
    #[serde(default)]
    pub post_process: Option<String>,
}

/// How to reach the external generator.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorSettings {
    /// Program followed by its leading arguments
    #[serde(default)]
    pub command: Vec<String>,
}

/// One generator invocation plus its copy and patch rules.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Mapping {
    pub target: GeneratorTarget,
    #[serde(default)]
    pub copy: Vec<CopyDirective>,
    #[serde(default)]
    pub rules: Vec<SubstitutionRule>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct GeneratorTarget {
    pub service: String,
    pub version: String,
    #[serde(flatten)]
    pub kind: GeneratorKind,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum GeneratorKind {
    /// Artman-driven GAPIC generator
    Gapic {
        config_path: String,
        #[serde(default)]
        artman_output_name: Option<String>,
    },
    /// Ruby microgenerator driven by typed options
    Microgenerator { options: GeneratorOptions },
}

impl GeneratorTarget {
    /// Directory name used for pre-generated output, `<service>-<version>`.
    pub fn output_name(&self) -> String {
        format!("{}-{}", self.service, self.version)
    }
}

impl fmt::Display for GeneratorTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.service, self.version)
    }
}

/// Named merge strategies applied when a copy lands on an existing file.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum MergeStrategy {
    Gemspec,
    Version,
    Changelog,
    Global,
}

/// Copies part of the generated tree into the library root.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CopyDirective {
    /// Path or glob relative to the generated tree; `.` is the whole tree
    pub source: String,
    /// Destination relative to the library root
    #[serde(default)]
    pub dest: Option<String>,
    #[serde(default)]
    pub merge: Option<MergeStrategy>,
    /// Globs, relative to the generated tree, that are never copied
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl CopyDirective {
    pub fn new<S: Into<String>>(source: S) -> Self {
        Self { source: source.into(), dest: None, merge: None, exclude: Vec::new() }
    }
}

/// Returns true when `path` stays inside whatever root it is joined to.
pub fn is_contained_path(path: &str) -> bool {
    if path.trim().is_empty() {
        return false;
    }
    let mut depth = 0usize;
    for component in Path::new(path).components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return false;
                }
                depth -= 1;
            }
            Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    true
}

impl SynthConfig {
    /// Checks the whole configuration, reporting every issue at once.
    pub fn validate(&self) -> Result<()> {
        let mut issues = Vec::new();

        if self.mappings.is_empty() {
            issues.push(ValidationIssue::EmptyMappingList);
        }

        for (idx, mapping) in self.mappings.iter().enumerate() {
            let mapping_no = idx + 1;
            let target = &mapping.target;
            if target.service.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    mapping: mapping_no,
                    field: "target.service",
                });
            }
            if target.version.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    mapping: mapping_no,
                    field: "target.version",
                });
            }
            match &target.kind {
                GeneratorKind::Gapic { config_path, .. } => {
                    if config_path.trim().is_empty() {
                        issues.push(ValidationIssue::MissingField {
                            mapping: mapping_no,
                            field: "target.config_path",
                        });
                    }
                }
                GeneratorKind::Microgenerator { options } => {
                    issues.extend(options.issues(&target.service));
                }
            }

            for directive in &mapping.copy {
                if directive.source.trim().is_empty() {
                    issues.push(ValidationIssue::MissingField {
                        mapping: mapping_no,
                        field: "copy.source",
                    });
                }
                if let Some(dest) = &directive.dest {
                    if !is_contained_path(dest) {
                        issues.push(ValidationIssue::InvalidDestination {
                            mapping: mapping_no,
                            dest: dest.clone(),
                        });
                    }
                }
            }

            for rule in &mapping.rules {
                issues.extend(rule.issues());
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(Error::ValidationError { issues })
        }
    }
}

/// Finds the synth file in a library root, trying multiple file formats.
/// Supports: synth.json, synth.yml, synth.yaml
///
/// # Arguments
/// * `library_root` - Directory expected to contain the synth file
/// * `synth_files` - List of file names to try
///
/// # Errors
/// * `Error::ConfigError` if no synth file exists
pub fn find_synth_file<P: AsRef<Path>>(library_root: P, synth_files: &[&str]) -> Result<PathBuf> {
    for file in synth_files {
        let synth_path = library_root.as_ref().join(file);
        if synth_path.exists() {
            debug!("Found synth file {}", synth_path.display());
            return Ok(synth_path);
        }
    }

    Err(Error::ConfigError(format!(
        "No synth file found in '{}' (tried: {})",
        library_root.as_ref().display(),
        synth_files.join(", ")
    )))
}

/// Parses and validates synth file content.
///
/// JSON is tried first, then YAML, so the error reported for malformed
/// input is the YAML one.
pub fn parse_config(content: &str) -> Result<SynthConfig> {
    let config: SynthConfig = match serde_json::from_str(content) {
        Ok(config) => config,
        Err(_) => serde_yaml::from_str(content)
            .map_err(|e| Error::ConfigError(format!("Invalid synth file format: {e}")))?,
    };
    config.validate()?;
    Ok(config)
}

/// Reads, parses and validates a synth file.
pub fn load_config<P: AsRef<Path>>(synth_path: P) -> Result<SynthConfig> {
    let synth_path = synth_path.as_ref();
    if !synth_path.is_file() {
        return Err(Error::ConfigError(format!(
            "Invalid synth file path: {}",
            synth_path.display()
        )));
    }
    debug!("Loading synth file {}", synth_path.display());
    let content = std::fs::read_to_string(synth_path)?;
    parse_config(&content)
}

/// Loads the synth file from `library_root` using the default file names.
pub fn get_config<P: AsRef<Path>>(library_root: P) -> Result<SynthConfig> {
    let synth_path = find_synth_file(library_root, &SYNTH_FILES)?;
    load_config(synth_path)
}
