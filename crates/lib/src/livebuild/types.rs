//! Types for live-build orchestration.
//!
//! This module defines the stage commands handed to a [`Runner`](super::Runner),
//! the caller-facing options, and the error type for a whole run.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::consts::{LIVE_BUILD, QEMU_STATIC_PATH_ENV, SUDO};
use crate::livebuild::runner::RunError;
use crate::util::fs::CopyError;

/// One sequential phase of a live-build run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
  /// `lb config`
  Config,
  /// `lb build`
  Build,
}

impl Stage {
  /// The live-build sub-command for this stage.
  pub fn as_str(&self) -> &'static str {
    match self {
      Stage::Config => "config",
      Stage::Build => "build",
    }
  }
}

impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// A fully assembled live-build stage invocation.
///
/// Runs as `<program> <env...> <tool> <stage> <extra_args...>`. The `env`
/// entries are also added to the child's environment on top of the inherited
/// one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildCommand {
  pub program: String,
  /// `KEY=VALUE` entries, in caller order.
  pub env: Vec<String>,
  pub tool: String,
  pub stage: Stage,
  /// Flags appended after the stage name.
  pub extra_args: Vec<String>,
}

impl BuildCommand {
  /// A privileged `lb <stage>` invocation with the given environment.
  pub fn live_build(stage: Stage, env: &[String]) -> Self {
    Self {
      program: SUDO.to_string(),
      env: env.to_vec(),
      tool: LIVE_BUILD.to_string(),
      stage,
      extra_args: Vec::new(),
    }
  }

  /// Arguments passed to `program`.
  pub fn args(&self) -> Vec<String> {
    let mut args = self.env.clone();
    args.push(self.tool.clone());
    args.push(self.stage.as_str().to_string());
    args.extend(self.extra_args.iter().cloned());
    args
  }

  /// The `env` entries split into key/value pairs.
  ///
  /// Entries without `=` are only passed as arguments.
  pub fn env_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
    self.env.iter().filter_map(|entry| entry.split_once('='))
  }
}

impl fmt::Display for BuildCommand {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.program)?;
    for arg in self.args() {
      write!(f, " {}", arg)?;
    }
    Ok(())
  }
}

/// What to build and how.
#[derive(Debug, Clone, Default)]
pub struct LiveBuildOptions {
  /// Directory live-build runs in; receives the `auto/` support scripts.
  pub rootfs: PathBuf,
  /// Target architecture in Debian naming (`amd64`, `arm64`, ...).
  pub arch: String,
  /// `KEY=VALUE` entries passed to both stages.
  pub env: Vec<String>,
  /// Bootstrap through qemu when `arch` is not the host architecture.
  pub enable_cross_build: bool,
}

/// Errors that can occur during a live-build run.
#[derive(Debug, Error)]
pub enum LiveBuildError {
  /// The package manager could not list the support package.
  #[error("failed to list files of {package}: {source}")]
  SupportLookup {
    package: String,
    #[source]
    source: RunError,
  },

  /// The support package does not ship the expected path.
  #[error("{package} does not ship an '{suffix}' directory")]
  SupportNotFound { package: String, suffix: String },

  /// Copying the support files into the rootfs failed.
  #[error("error copying {src} to {dst}: {source}")]
  CopySupport {
    src: String,
    dst: String,
    #[source]
    source: CopyError,
  },

  /// The rootfs could not be entered.
  #[error("failed to change into {path}: {source}")]
  EnterRootfs {
    path: String,
    #[source]
    source: io::Error,
  },

  /// No emulation binary for a cross-build.
  #[error(
    "no qemu user static binary found for '{arch}': set {var} for non-standard architectures or custom paths",
    var = QEMU_STATIC_PATH_ENV
  )]
  QemuNotFound { arch: String },

  /// A live-build stage failed to launch or exited non-zero.
  #[error("lb {stage} failed: {source}")]
  Stage {
    stage: Stage,
    #[source]
    source: RunError,
  },

  /// I/O error while reporting progress.
  #[error("io error: {0}")]
  Io(#[from] io::Error),
}
