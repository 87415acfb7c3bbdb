use crate::config::{GeneratorKind, GeneratorTarget};
use crate::error::{Error, Result};
use crate::generator::interface::{GeneratedTree, Generator};
use log::{debug, info};
use std::path::Path;
use std::process::{Command, Stdio};

/// Generator running an external program.
///
/// The program is invoked as
/// `<command...> --service S --version V --output DIR <kind arguments>`
/// and must write the generated library into `DIR`.
pub struct CommandGenerator {
    command: Vec<String>,
}

impl CommandGenerator {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }

    /// Arguments following the configured command for `target`.
    ///
    /// # Errors
    /// * `Error::ValidationError` if microgenerator options are invalid
    pub fn arguments(target: &GeneratorTarget, output: &Path) -> Result<Vec<String>> {
        let mut args = vec![
            "--service".to_string(),
            target.service.clone(),
            "--version".to_string(),
            target.version.clone(),
            "--output".to_string(),
            output.display().to_string(),
        ];
        match &target.kind {
            GeneratorKind::Gapic { config_path, artman_output_name } => {
                args.push("--config".to_string());
                args.push(config_path.clone());
                if let Some(name) = artman_output_name {
                    args.push("--artman-output-name".to_string());
                    args.push(name.clone());
                }
            }
            GeneratorKind::Microgenerator { options } => {
                let resolved = options.resolve(&target.service)?;
                args.extend(
                    resolved
                        .to_generator_args()
                        .into_iter()
                        .map(|(key, value)| format!("--{key}={value}")),
                );
            }
        }
        Ok(args)
    }
}

fn is_empty_dir(path: &Path) -> Result<bool> {
    Ok(std::fs::read_dir(path)?.next().is_none())
}

impl Generator for CommandGenerator {
    /// # Errors
    /// * `Error::GeneratorError` if no command is configured, the command
    ///   fails to start, exits unsuccessfully or produces no files
    fn generate(&self, target: &GeneratorTarget) -> Result<GeneratedTree> {
        let failed = |reason: String| Error::GeneratorError { target: target.to_string(), reason };

        let Some((program, leading)) = self.command.split_first() else {
            return Err(failed("no generator command configured".to_string()));
        };
        let scratch = tempfile::Builder::new().prefix("synth-").tempdir()?;
        let args = Self::arguments(target, scratch.path())?;

        info!("Generating {target}");
        debug!("Running {} {} {}", program, leading.join(" "), args.join(" "));
        let status = Command::new(program)
            .args(leading)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| failed(format!("failed to start '{program}': {e}")))?;

        if !status.success() {
            return Err(failed(format!("generator exited with {status}")));
        }
        if is_empty_dir(scratch.path())? {
            return Err(failed("generator produced no files".to_string()));
        }
        Ok(GeneratedTree::scratch(scratch))
    }
}
