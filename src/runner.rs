//! Core orchestration: generate, copy, patch, post-process.

use crate::config::{GeneratorKind, Mapping, SynthConfig};
use crate::copy::{copy_directive, CopiedFile};
use crate::error::Result;
use crate::generator::Generator;
use crate::hooks::run_post_process;
use crate::renderer::TemplateRenderer;
use crate::rules::{CompiledRule, RuleOutcome};
use log::{debug, info};
use std::path::{Path, PathBuf};

/// Everything one mapping did to the library root.
#[derive(Debug, Clone, Default)]
pub struct MappingReport {
    pub target: String,
    pub copied: Vec<CopiedFile>,
    pub rules: Vec<RuleOutcome>,
}

/// Runs synth configurations against a library root.
///
/// Every step is fail-fast: the first error aborts the run and leaves the
/// library root as it was at that point.
pub struct Runner<'a> {
    generator: &'a dyn Generator,
    renderer: &'a dyn TemplateRenderer,
    library_root: PathBuf,
    skip_post_process: bool,
}

impl<'a> Runner<'a> {
    pub fn new<P: AsRef<Path>>(
        generator: &'a dyn Generator,
        renderer: &'a dyn TemplateRenderer,
        library_root: P,
        skip_post_process: bool,
    ) -> Self {
        Self {
            generator,
            renderer,
            library_root: library_root.as_ref().to_path_buf(),
            skip_post_process,
        }
    }

    /// Runs every mapping in order, then the post-process command.
    pub fn run(&self, config: &SynthConfig) -> Result<Vec<MappingReport>> {
        let mut reports = Vec::with_capacity(config.mappings.len());
        for mapping in &config.mappings {
            reports.push(self.run_mapping(mapping)?);
        }

        match &config.post_process {
            Some(command) if self.skip_post_process => {
                info!("Skipping post-process '{command}'");
            }
            Some(command) => run_post_process(command, &self.library_root)?,
            None => {}
        }
        Ok(reports)
    }

    /// Generates, copies and patches a single mapping.
    pub fn run_mapping(&self, mapping: &Mapping) -> Result<MappingReport> {
        let target = &mapping.target;
        if let GeneratorKind::Microgenerator { options } = &target.kind {
            options.resolve(&target.service)?;
        }
        // Compile before generating so a bad rule fails before any file changes.
        let rules = self.compile_rules(mapping)?;

        let mut report = MappingReport { target: target.to_string(), ..Default::default() };
        {
            let tree = self.generator.generate(target)?;
            debug!("Generated {} into {}", target, tree.root().display());
            for directive in &mapping.copy {
                report.copied.extend(copy_directive(tree.root(), &self.library_root, directive)?);
            }
        }

        for rule in &rules {
            report.rules.push(rule.apply(&self.library_root)?);
        }
        Ok(report)
    }

    fn compile_rules(&self, mapping: &Mapping) -> Result<Vec<CompiledRule>> {
        let mut compiled = Vec::new();
        for rule in &mapping.rules {
            for expanded in rule.expand(self.renderer)? {
                compiled.push(expanded.compile()?);
            }
        }
        Ok(compiled)
    }
}
