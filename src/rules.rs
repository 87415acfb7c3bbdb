//! Substitution rules: ordered, regex based rewrites of library files.
//!
//! A rule is a selector (`files` globs), an optional precondition and a
//! transformation (a `replace` template or a named `transform`). Rules are
//! applied one at a time in declared order; later rules see the output of
//! earlier ones.

use crate::error::{Error, Result, ValidationIssue};
use crate::escape::escape_braces;
use crate::renderer::TemplateRenderer;
use crate::selector::{build_globset, select_files};
use globset::GlobSet;
use indexmap::IndexMap;
use log::{debug, info, warn};
use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// One glob or a list of globs, relative to the library root.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum FileSelector {
    One(String),
    Many(Vec<String>),
}

impl FileSelector {
    pub fn patterns(&self) -> &[String] {
        match self {
            FileSelector::One(pattern) => std::slice::from_ref(pattern),
            FileSelector::Many(patterns) => patterns,
        }
    }
}

impl From<&str> for FileSelector {
    fn from(pattern: &str) -> Self {
        FileSelector::One(pattern.to_string())
    }
}

impl From<Vec<&str>> for FileSelector {
    fn from(patterns: Vec<&str>) -> Self {
        FileSelector::Many(patterns.into_iter().map(String::from).collect())
    }
}

/// Named transformations receiving the whole match.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Transform {
    /// Fixed-point escaping of `{identifier}` tokens, see [`escape_braces`]
    EscapeBraces,
}

impl Transform {
    pub fn apply(&self, matched: &str) -> Result<String> {
        match self {
            Transform::EscapeBraces => escape_braces(matched),
        }
    }
}

/// Gate evaluated against a file's content before the rule touches it.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Precondition {
    /// Only rewrite files matching this regex
    Contains(String),
    /// Only rewrite files not matching this regex
    Absent(String),
}

impl Precondition {
    fn pattern(&self) -> &str {
        match self {
            Precondition::Contains(pattern) | Precondition::Absent(pattern) => pattern,
        }
    }

    fn map(&self, f: impl FnOnce(&str) -> Result<String>) -> Result<Self> {
        Ok(match self {
            Precondition::Contains(pattern) => Precondition::Contains(f(pattern)?),
            Precondition::Absent(pattern) => Precondition::Absent(f(pattern)?),
        })
    }
}

/// A substitution rule as declared in a synth file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SubstitutionRule {
    #[serde(default)]
    pub id: Option<String>,
    /// Upstream issue the rule works around
    #[serde(default)]
    pub issue: Option<String>,
    pub files: FileSelector,
    pub pattern: String,
    /// Replacement template; `$1` or `${name}` refer to capture groups
    #[serde(default)]
    pub replace: Option<String>,
    #[serde(default)]
    pub transform: Option<Transform>,
    #[serde(default)]
    pub precondition: Option<Precondition>,
    /// Expands the rule once per combination of values.
    ///
    /// Files, pattern, replacement and precondition are rendered as
    /// templates, so in such rules `{%` and `{#` are rejected and `{{` is
    /// always a placeholder. Write a literal brace as `\{` in patterns.
    #[serde(default)]
    pub each: IndexMap<String, Vec<String>>,
}

impl SubstitutionRule {
    /// Rule replacing `pattern` with a capture-expanding template.
    pub fn replace<F: Into<FileSelector>>(files: F, pattern: &str, replacement: &str) -> Self {
        Self {
            id: None,
            issue: None,
            files: files.into(),
            pattern: pattern.to_string(),
            replace: Some(replacement.to_string()),
            transform: None,
            precondition: None,
            each: IndexMap::new(),
        }
    }

    /// Rule handing every match of `pattern` to `transform`.
    pub fn transform<F: Into<FileSelector>>(files: F, pattern: &str, transform: Transform) -> Self {
        Self {
            replace: None,
            transform: Some(transform),
            ..Self::replace(files, pattern, "")
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_precondition(mut self, precondition: Precondition) -> Self {
        self.precondition = Some(precondition);
        self
    }

    /// Name used in logs and errors: the id, or the pattern when there is none.
    pub fn label(&self) -> String {
        self.id.clone().unwrap_or_else(|| self.pattern.clone())
    }

    /// Problems with this rule that do not need compiling it to find.
    pub fn issues(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        let rule = self.label();

        if self.pattern.is_empty() {
            issues.push(ValidationIssue::MissingRuleField { rule: rule.clone(), field: "pattern" });
        }
        let patterns = self.files.patterns();
        if patterns.is_empty() || patterns.iter().any(|p| p.trim().is_empty()) {
            issues.push(ValidationIssue::MissingRuleField { rule: rule.clone(), field: "files" });
        }
        match (&self.replace, &self.transform) {
            (Some(_), Some(_)) => issues.push(ValidationIssue::InvalidRule {
                rule: rule.clone(),
                message: "replace and transform are mutually exclusive".to_string(),
            }),
            (None, None) => issues.push(ValidationIssue::InvalidRule {
                rule: rule.clone(),
                message: "one of replace or transform is required".to_string(),
            }),
            _ => {}
        }
        for (name, values) in &self.each {
            if name.trim().is_empty() || values.is_empty() {
                issues.push(ValidationIssue::InvalidRule {
                    rule: rule.clone(),
                    message: format!("each variable '{name}' needs a name and at least one value"),
                });
            }
        }
        if !self.each.is_empty() {
            let templated = [Some(self.pattern.as_str()), self.replace.as_deref()]
                .into_iter()
                .chain([self.precondition.as_ref().map(Precondition::pattern)])
                .flatten();
            for text in templated {
                if text.contains("{%") || text.contains("{#") {
                    issues.push(ValidationIssue::InvalidRule {
                        rule: rule.clone(),
                        message: format!(
                            "'{text}' contains template syntax; rules with each only support {{{{ var }}}} placeholders"
                        ),
                    });
                }
            }
        }
        issues
    }

    /// Expands `each` into one concrete rule per combination of values, in
    /// declaration order. Rules without `each` expand to themselves.
    pub fn expand(&self, renderer: &dyn TemplateRenderer) -> Result<Vec<SubstitutionRule>> {
        if self.each.is_empty() {
            return Ok(vec![self.clone()]);
        }

        let mut combinations: Vec<Vec<(&str, &str)>> = vec![Vec::new()];
        for (name, values) in &self.each {
            combinations = combinations
                .into_iter()
                .flat_map(|prefix| {
                    values.iter().map(move |value| {
                        let mut combination = prefix.clone();
                        combination.push((name.as_str(), value.as_str()));
                        combination
                    })
                })
                .collect();
        }

        let base = self.label();
        combinations
            .into_iter()
            .map(|combination| {
                let context: serde_json::Map<String, serde_json::Value> = combination
                    .iter()
                    .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
                    .collect();
                let context = serde_json::Value::Object(context);
                let render = |s: &str| renderer.render(s, &context);

                let bindings: Vec<String> =
                    combination.iter().map(|(k, v)| format!("{k}={v}")).collect();
                let files = match &self.files {
                    FileSelector::One(p) => FileSelector::One(render(p)?),
                    FileSelector::Many(ps) => FileSelector::Many(
                        ps.iter().map(|p| render(p)).collect::<Result<Vec<_>>>()?,
                    ),
                };
                Ok(SubstitutionRule {
                    id: Some(format!("{base}[{}]", bindings.join(","))),
                    issue: self.issue.clone(),
                    files,
                    pattern: render(&self.pattern)?,
                    replace: self.replace.as_deref().map(render).transpose()?,
                    transform: self.transform,
                    precondition: self
                        .precondition
                        .as_ref()
                        .map(|p| p.map(render))
                        .transpose()?,
                    each: IndexMap::new(),
                })
            })
            .collect()
    }

    /// Compiles globs and regexes. Patterns are multi-line: `^` and `$`
    /// match at line boundaries, `\A` and `\z` at the ends of the file.
    pub fn compile(&self) -> Result<CompiledRule> {
        let replacement = match (&self.replace, self.transform) {
            (_, Some(transform)) => Replacement::Transform(transform),
            (Some(template), None) => Replacement::Template(template.clone()),
            (None, None) => {
                return Err(Error::ValidationError { issues: self.issues() });
            }
        };
        let precondition = match &self.precondition {
            Some(p) => Some(CompiledPrecondition {
                regex: compile_pattern(p.pattern())?,
                required: matches!(p, Precondition::Contains(_)),
            }),
            None => None,
        };

        Ok(CompiledRule {
            label: self.label(),
            patterns: self.files.patterns().to_vec(),
            files: build_globset(self.files.patterns())?,
            regex: compile_pattern(&self.pattern)?,
            replacement,
            precondition,
        })
    }
}

fn compile_pattern(pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .multi_line(true)
        .build()
        .map_err(|source| Error::PatternError { pattern: pattern.to_string(), source })
}

#[derive(Debug, Clone)]
pub enum Replacement {
    Template(String),
    Transform(Transform),
}

#[derive(Debug, Clone)]
struct CompiledPrecondition {
    regex: Regex,
    required: bool,
}

/// Outcome of rewriting one string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub content: String,
    pub replacements: usize,
}

/// Summary of one rule applied to a library tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleOutcome {
    pub rule: String,
    pub files_selected: usize,
    pub changed: Vec<PathBuf>,
    pub replacements: usize,
}

impl fmt::Display for RuleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} replacement(s) in {} of {} file(s)",
            self.replacements,
            self.changed.len(),
            self.files_selected
        )
    }
}

/// A rule ready to run.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    label: String,
    patterns: Vec<String>,
    files: GlobSet,
    regex: Regex,
    replacement: Replacement,
    precondition: Option<CompiledPrecondition>,
}

impl CompiledRule {
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether the precondition lets this rule touch `content`.
    pub fn admits(&self, content: &str) -> bool {
        match &self.precondition {
            Some(p) => p.regex.is_match(content) == p.required,
            None => true,
        }
    }

    /// Replaces every non-overlapping match in `content`.
    pub fn rewrite(&self, content: &str) -> Result<Rewrite> {
        let mut rewritten = String::with_capacity(content.len());
        let mut last = 0;
        let mut replacements = 0;

        for caps in self.regex.captures_iter(content) {
            let Some(whole) = caps.get(0) else { continue };
            rewritten.push_str(&content[last..whole.start()]);
            match &self.replacement {
                Replacement::Template(template) => caps.expand(template, &mut rewritten),
                Replacement::Transform(transform) => {
                    rewritten.push_str(&transform.apply(whole.as_str())?)
                }
            }
            last = whole.end();
            replacements += 1;
        }
        rewritten.push_str(&content[last..]);

        Ok(Rewrite { content: rewritten, replacements })
    }

    /// Applies the rule to every selected file under `library_root`.
    ///
    /// # Errors
    /// * `Error::NoMatchingFilesError` if the globs select nothing
    /// * `Error::IoError` if a selected file cannot be read or written
    pub fn apply(&self, library_root: &Path) -> Result<RuleOutcome> {
        let files = select_files(library_root, &self.files, &GlobSet::empty())?;
        if files.is_empty() {
            return Err(Error::NoMatchingFilesError {
                rule: self.label.clone(),
                patterns: self.patterns.clone(),
            });
        }

        let mut outcome = RuleOutcome {
            rule: self.label.clone(),
            files_selected: files.len(),
            changed: Vec::new(),
            replacements: 0,
        };
        for relative in files {
            let path = library_root.join(&relative);
            let content = fs::read_to_string(&path)?;
            if !self.admits(&content) {
                debug!("Precondition of '{}' excludes {}", self.label, relative.display());
                continue;
            }
            let rewrite = self.rewrite(&content)?;
            outcome.replacements += rewrite.replacements;
            if rewrite.content != content {
                debug!("Rewriting {} ({} match(es))", relative.display(), rewrite.replacements);
                fs::write(&path, rewrite.content)?;
                outcome.changed.push(relative);
            }
        }

        if outcome.replacements == 0 {
            warn!("Rule '{}' made no replacements", self.label);
        } else {
            info!("Rule '{}': {}", self.label, outcome);
        }
        Ok(outcome)
    }
}
