//! Post-processing command run after every mapping has been patched.
use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::{Error, Result};
use log::info;

/// Builds the shell invocation for `command`.
fn shell(command: &str) -> Command {
    if cfg!(windows) {
        let mut shell = Command::new("cmd");
        shell.args(["/C", command]);
        shell
    } else {
        let mut shell = Command::new("sh");
        shell.args(["-c", command]);
        shell
    }
}

/// Runs `command` through the shell inside `library_root`.
///
/// The command inherits the environment and stdio of this process.
///
/// # Errors
/// * `Error::HookError` if the command cannot start or exits unsuccessfully
pub fn run_post_process<P: AsRef<Path>>(command: &str, library_root: P) -> Result<()> {
    let library_root = library_root.as_ref();
    info!("Running post-process '{}' in {}", command, library_root.display());

    let status = shell(command)
        .current_dir(library_root)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|e| Error::HookError(format!("failed to start '{command}': {e}")))?;

    if !status.success() {
        return Err(Error::HookError(format!("'{command}' failed with status: {status}")));
    }

    Ok(())
}
