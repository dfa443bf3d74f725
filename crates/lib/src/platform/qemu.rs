//! qemu user-mode emulators for cross-architecture builds.

use std::path::PathBuf;

use tracing::debug;

use crate::consts::QEMU_STATIC_PATH_ENV;
use crate::livebuild::LiveBuildError;
use crate::platform::env_override;

/// The qemu user static binary name for a Debian architecture.
///
/// Returns `""` for architectures without a known emulator.
pub fn qemu_static_for_arch(arch: &str) -> &'static str {
  match arch {
    "armhf" => "qemu-arm-static",
    "arm64" => "qemu-aarch64-static",
    "ppc64el" => "qemu-ppc64le-static",
    _ => "",
  }
}

/// Locate the emulator to bootstrap `arch` with.
///
/// `LIVEFS_QEMU_USER_STATIC_PATH` takes precedence; otherwise the mapped binary
/// is looked up on `PATH`.
pub fn find_qemu_static(arch: &str) -> Result<PathBuf, LiveBuildError> {
  if let Some(path) = env_override(QEMU_STATIC_PATH_ENV) {
    debug!(path = ?path, "using qemu override");
    return Ok(path);
  }

  let not_found = || LiveBuildError::QemuNotFound { arch: arch.to_string() };

  let name = qemu_static_for_arch(arch);
  if name.is_empty() {
    return Err(not_found());
  }

  which::which(name).map_err(|e| {
    debug!(binary = %name, error = %e, "qemu lookup failed");
    not_found()
  })
}
