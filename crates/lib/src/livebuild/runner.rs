//! Process execution for live-build runs.
//!
//! Everything the orchestrator launches goes through a [`Runner`]: read-only
//! probes whose stdout is returned, and stage commands whose output streams
//! straight to the caller's terminal. [`SystemRunner`] is the real
//! implementation; tests substitute their own.

use std::io;
use std::process::{Command, Stdio};

use thiserror::Error;
use tracing::debug;

use crate::livebuild::types::BuildCommand;

/// Errors from launching an external program.
#[derive(Debug, Error)]
pub enum RunError {
  /// The program could not be started.
  #[error("failed to launch {program}: {source}")]
  Spawn {
    program: String,
    #[source]
    source: io::Error,
  },

  /// The program ran and exited unsuccessfully.
  #[error("{program} exited with status {code:?}")]
  Failed { program: String, code: Option<i32> },
}

impl RunError {
  /// Whether the program is not installed.
  pub fn is_not_found(&self) -> bool {
    matches!(self, RunError::Spawn { source, .. } if source.kind() == io::ErrorKind::NotFound)
  }
}

/// Launches external programs on behalf of the orchestrator.
pub trait Runner {
  /// Run a read-only query and return its trimmed stdout.
  ///
  /// A non-zero exit is an error; any stdout produced before it is discarded.
  fn output(&mut self, program: &str, args: &[&str]) -> Result<String, RunError>;

  /// Run a live-build stage to completion with inherited stdio.
  fn run(&mut self, command: &BuildCommand) -> Result<(), RunError>;
}

/// Runs programs with [`std::process::Command`], blocking until they exit.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl Runner for SystemRunner {
  fn output(&mut self, program: &str, args: &[&str]) -> Result<String, RunError> {
    debug!(program = %program, args = ?args, "running query");

    let output = Command::new(program)
      .args(args)
      .stdin(Stdio::null())
      .output()
      .map_err(|e| RunError::Spawn {
        program: program.to_string(),
        source: e,
      })?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      if !stderr.is_empty() {
        debug!(program = %program, stderr = %stderr, "query stderr");
      }
      return Err(RunError::Failed {
        program: program.to_string(),
        code: output.status.code(),
      });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  fn run(&mut self, command: &BuildCommand) -> Result<(), RunError> {
    let mut child = Command::new(&command.program);
    child
      .args(command.args())
      .stdout(Stdio::inherit())
      .stderr(Stdio::inherit());

    // Layered over the inherited environment, later entries win
    for (key, value) in command.env_pairs() {
      child.env(key, value);
    }

    let status = child.status().map_err(|e| RunError::Spawn {
      program: command.program.clone(),
      source: e,
    })?;

    if !status.success() {
      return Err(RunError::Failed {
        program: command.program.clone(),
        code: status.code(),
      });
    }

    Ok(())
  }
}
