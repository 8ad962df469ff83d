//! Resolution and invocation of the external geometry tools.
//!
//! Every external invocation goes through [`run_checked`], which waits for
//! the child, inspects its exit status, and turns a non-zero exit into a
//! typed error. Nothing in the pipeline fires a process and ignores the
//! outcome.

use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Result, UpdateError};

/// Locate an executable the way a shell would.
///
/// A name containing a path separator is checked as-is; a bare name is
/// searched for in every `PATH` entry.
pub fn find_executable(name: &Path) -> Option<PathBuf> {
    if name.components().count() > 1 {
        return name.is_file().then(|| name.to_path_buf());
    }
    let path_var = env::var_os("PATH")?;
    env::split_paths(&path_var)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

/// Run an external tool to completion and return its exit status.
///
/// There is deliberately no timeout: a hung tool hangs the run.
pub async fn run(command: &mut Command, tool: &str) -> Result<ExitStatus> {
    debug!("Running {}: {:?}", tool, command.as_std());
    Ok(command.status().await?)
}

/// Like [`run`], but a non-zero exit is fatal.
pub async fn run_checked(command: &mut Command, tool: &str) -> Result<()> {
    let status = run(command, tool).await?;
    if !status.success() {
        return Err(UpdateError::ToolFailed {
            tool: tool.to_string(),
            status,
        });
    }
    Ok(())
}
