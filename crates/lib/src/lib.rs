//! livefs-lib: live-build orchestration for livefs
//!
//! This crate drives Debian's live-build (`lb config` / `lb build`) to produce
//! a root filesystem, including cross-architecture builds bootstrapped through
//! qemu user-mode emulation:
//! - `livebuild`: the orchestrator, stage commands and the process runner seam
//! - `platform`: host architecture/release probes and qemu binary lookup
//! - `util`: working-directory guard, stream capture and special-file copy

pub mod consts;
#[cfg(unix)]
pub mod livebuild;
#[cfg(unix)]
pub mod platform;
pub mod util;
