//! Staging of the live-build `auto/` scripts.
//!
//! live-build picks up `auto/config`, `auto/build` and friends from the
//! directory it runs in. They are shipped by `livecd-rootfs` and copied into
//! the rootfs before the first stage.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::consts::{AUTO_PATH_ENV, LIVECD_ROOTFS_PACKAGE, SUPPORT_SUFFIX};
use crate::livebuild::{LiveBuildError, Runner};
use crate::platform::env_override;
use crate::util::fs::copy_special;

/// Find the `auto/` directory to copy.
///
/// Uses `LIVEFS_LIVECD_ROOTFS_AUTO_PATH` when set, otherwise asks dpkg where
/// `livecd-rootfs` installed it.
pub fn resolve_support_source(runner: &mut dyn Runner) -> Result<PathBuf, LiveBuildError> {
  if let Some(path) = env_override(AUTO_PATH_ENV) {
    debug!(path = ?path, "using auto override");
    return Ok(path);
  }

  let listing = runner
    .output("dpkg", &["-L", LIVECD_ROOTFS_PACKAGE])
    .map_err(|source| LiveBuildError::SupportLookup {
      package: LIVECD_ROOTFS_PACKAGE.to_string(),
      source,
    })?;

  select_support_path(&listing).ok_or_else(|| LiveBuildError::SupportNotFound {
    package: LIVECD_ROOTFS_PACKAGE.to_string(),
    suffix: SUPPORT_SUFFIX.to_string(),
  })
}

/// First path in a `dpkg -L` listing whose last component is `auto`.
fn select_support_path(listing: &str) -> Option<PathBuf> {
  listing
    .lines()
    .map(str::trim)
    .map(Path::new)
    .find(|path| path.file_name() == Some(OsStr::new(SUPPORT_SUFFIX)))
    .map(Path::to_path_buf)
}

/// Copy `src` to `<rootfs>/auto`, returning the destination.
pub fn install_support(src: &Path, rootfs: &Path) -> Result<PathBuf, LiveBuildError> {
  let dst = rootfs.join(SUPPORT_SUFFIX);

  copy_special(src, &dst).map_err(|source| LiveBuildError::CopySupport {
    src: src.display().to_string(),
    dst: dst.display().to_string(),
    source,
  })?;

  Ok(dst)
}
