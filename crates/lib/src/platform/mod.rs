//! Host inspection: package architecture, release codename and the qemu
//! binaries used for cross-builds.

pub mod host;
pub mod qemu;

use std::path::PathBuf;

/// Read a path override from the environment.
///
/// Unset and empty both mean "no override".
pub(crate) fn env_override(name: &str) -> Option<PathBuf> {
  std::env::var_os(name).filter(|value| !value.is_empty()).map(PathBuf::from)
}
