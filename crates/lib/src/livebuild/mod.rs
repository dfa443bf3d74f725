//! Live-build orchestration.
//!
//! [`run_live_build`] stages the `auto/` scripts into a rootfs, then runs
//! `lb config` followed by `lb build` inside it. When the target architecture
//! differs from the host and cross-building is enabled, `lb config` is told to
//! bootstrap through a qemu user static binary.
//!
//! Runs are not reentrant: the process working directory is changed for the
//! duration and restored afterwards.

pub mod runner;
pub mod support;
pub mod types;

use std::io::Write;

use tracing::{debug, info};

use crate::platform::host::host_arch;
use crate::platform::qemu::find_qemu_static;
use crate::util::capture::StreamSlot;
use crate::util::cwd::save_cwd;

pub use runner::{RunError, Runner, SystemRunner};
pub use types::{BuildCommand, LiveBuildError, LiveBuildOptions, Stage};

/// Run `lb config` and `lb build` for `options`.
///
/// Each stage's command line is echoed to `out` before it starts; the stages
/// themselves write to the inherited stdout/stderr. `lb build` is only run if
/// `lb config` succeeded. The working directory is restored on every exit path.
pub fn run_live_build(
  options: &LiveBuildOptions,
  runner: &mut dyn Runner,
  out: &StreamSlot,
) -> Result<(), LiveBuildError> {
  let src = support::resolve_support_source(runner)?;
  let dst = support::install_support(&src, &options.rootfs)?;
  debug!(src = ?src, dst = ?dst, "installed live-build support files");

  let _cwd = save_cwd();
  std::env::set_current_dir(&options.rootfs).map_err(|e| LiveBuildError::EnterRootfs {
    path: options.rootfs.display().to_string(),
    source: e,
  })?;

  let mut config = BuildCommand::live_build(Stage::Config, &options.env);
  let build = BuildCommand::live_build(Stage::Build, &options.env);

  let host = host_arch(runner);
  config.extra_args = cross_build_args(&options.arch, &host, options.enable_cross_build)?;

  run_stage(runner, &config, out)?;
  run_stage(runner, &build, out)?;

  Ok(())
}

/// Flags that make `lb config` bootstrap `arch` through qemu.
///
/// Empty unless `arch` differs from `host_arch` and `enable_cross_build` is set.
/// An empty `host_arch` (unknown) counts as different.
pub fn cross_build_args(arch: &str, host_arch: &str, enable_cross_build: bool) -> Result<Vec<String>, LiveBuildError> {
  if arch == host_arch || !enable_cross_build {
    return Ok(Vec::new());
  }

  let qemu = find_qemu_static(arch)?;
  info!(arch = %arch, host = %host_arch, qemu = ?qemu, "cross-building");

  Ok(vec![
    "--bootstrap-qemu-arch".to_string(),
    arch.to_string(),
    "--bootstrap-qemu-static".to_string(),
    qemu.to_string_lossy().into_owned(),
    "--architectures".to_string(),
    arch.to_string(),
  ])
}

fn run_stage(runner: &mut dyn Runner, command: &BuildCommand, out: &StreamSlot) -> Result<(), LiveBuildError> {
  let mut out = out;
  writeln!(out, "{}", command)?;

  info!(stage = %command.stage, "running live-build stage");
  runner
    .run(command)
    .map_err(|source| LiveBuildError::Stage {
      stage: command.stage,
      source,
    })
}
