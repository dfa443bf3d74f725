//! Test utilities for livefs-lib.
//!
//! Provides an in-memory writer, a scripted [`Runner`] that records what it was
//! asked to run, and helpers for placing fake executables on `PATH`.

use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::livebuild::{BuildCommand, RunError, Runner, Stage};

/// Cloneable in-memory writer whose contents can be inspected.
#[derive(Debug, Clone, Default)]
pub struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
  pub fn contents(&self) -> String {
    String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
  }
}

impl Write for SharedBuf {
  fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
    self.0.lock().unwrap().extend_from_slice(buf);
    Ok(buf.len())
  }

  fn flush(&mut self) -> io::Result<()> {
    Ok(())
  }
}

/// Runner that answers probes from a table and records stage invocations.
///
/// Probes without a canned answer fail as if the program were not installed.
#[derive(Debug, Default)]
pub struct RecordingRunner {
  outputs: HashMap<String, String>,
  fail_stage: Option<Stage>,
  /// Every probe command line, in order.
  pub probes: Vec<String>,
  /// Every stage that was started, in order.
  pub stages: Vec<BuildCommand>,
}

impl RecordingRunner {
  /// Answer `command_line` (program and args joined by spaces) with `stdout`.
  pub fn with_output(mut self, command_line: &str, stdout: &str) -> Self {
    self.outputs.insert(command_line.to_string(), stdout.to_string());
    self
  }

  /// Report the host architecture as `arch`.
  pub fn with_host_arch(self, arch: &str) -> Self {
    self.with_output("dpkg --print-architecture", &format!("{}\n", arch))
  }

  /// Make `stage` exit with status 1.
  pub fn failing(mut self, stage: Stage) -> Self {
    self.fail_stage = Some(stage);
    self
  }

  pub fn stage(&self, stage: Stage) -> Option<&BuildCommand> {
    self.stages.iter().find(|cmd| cmd.stage == stage)
  }
}

impl Runner for RecordingRunner {
  fn output(&mut self, program: &str, args: &[&str]) -> Result<String, RunError> {
    let line = std::iter::once(program)
      .chain(args.iter().copied())
      .collect::<Vec<_>>()
      .join(" ");
    self.probes.push(line.clone());

    match self.outputs.get(&line) {
      Some(stdout) => Ok(stdout.trim().to_string()),
      None => Err(RunError::Spawn {
        program: program.to_string(),
        source: io::Error::from(io::ErrorKind::NotFound),
      }),
    }
  }

  fn run(&mut self, command: &BuildCommand) -> Result<(), RunError> {
    self.stages.push(command.clone());
    if self.fail_stage == Some(command.stage) {
      return Err(RunError::Failed {
        program: command.program.clone(),
        code: Some(1),
      });
    }
    Ok(())
  }
}

/// Create an executable shell script called `name` in `dir` that exits 0.
pub fn fake_executable(dir: &Path, name: &str) -> PathBuf {
  script(dir, name, "exit 0")
}

/// Create an executable `/bin/sh` script called `name` in `dir` running `body`.
pub fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
  use std::os::unix::fs::PermissionsExt;

  let path = dir.join(name);
  std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
  std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
  path
}

/// Lay out a minimal `auto/` support directory under `dir` and return its path.
pub fn fake_auto_dir(dir: &Path) -> PathBuf {
  let auto = dir.join("live-build").join("auto");
  std::fs::create_dir_all(&auto).unwrap();
  fake_executable(&auto, "config");
  fake_executable(&auto, "build");
  auto
}
