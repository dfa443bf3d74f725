//! Working-directory save/restore.
//!
//! The working directory is process-wide, so anything that changes it must
//! hold a [`CwdGuard`] for the duration. The guard puts the directory back when
//! it is restored explicitly or dropped, which covers early returns and
//! unwinding.

use std::path::{Path, PathBuf};

use tracing::debug;

/// Snapshot of the working directory at the time [`save_cwd`] was called.
#[derive(Debug)]
#[must_use = "the directory is restored when the guard is dropped"]
pub struct CwdGuard {
  saved: Option<PathBuf>,
}

/// Remember the current working directory.
///
/// If the directory cannot be resolved the snapshot is empty and restoring
/// it does nothing.
pub fn save_cwd() -> CwdGuard {
  let saved = match std::env::current_dir() {
    Ok(dir) => Some(dir),
    Err(e) => {
      debug!(error = %e, "could not resolve current directory, nothing to restore");
      None
    }
  };
  CwdGuard { saved }
}

impl CwdGuard {
  /// The directory that will be restored, if one was captured.
  pub fn path(&self) -> Option<&Path> {
    self.saved.as_deref()
  }

  /// Change back to the saved directory now.
  pub fn restore(mut self) {
    self.restore_inner();
  }

  fn restore_inner(&mut self) {
    let Some(dir) = self.saved.take() else {
      return;
    };
    // The directory may have been removed in the meantime
    if let Err(e) = std::env::set_current_dir(&dir) {
      debug!(path = ?dir, error = %e, "failed to restore working directory");
    }
  }
}

impl Drop for CwdGuard {
  fn drop(&mut self) {
    self.restore_inner();
  }
}
