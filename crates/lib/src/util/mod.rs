//! Shared utilities.
//!
//! Process-wide state helpers (working directory, stream redirection) and the
//! special-file copy used to stage live-build support files.

pub mod cwd;

#[cfg(unix)]
pub mod capture;
#[cfg(unix)]
pub mod fs;

#[cfg(all(test, unix))]
pub mod testutil;
