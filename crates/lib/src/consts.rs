/// Binary and command name.
pub const APP_NAME: &str = "livefs";

/// Overrides the `auto/` support directory copied into the rootfs.
pub const AUTO_PATH_ENV: &str = "LIVEFS_LIVECD_ROOTFS_AUTO_PATH";

/// Overrides the qemu user static binary used for cross-builds.
pub const QEMU_STATIC_PATH_ENV: &str = "LIVEFS_QEMU_USER_STATIC_PATH";

/// Package that ships the live-build `auto/` scripts.
pub const LIVECD_ROOTFS_PACKAGE: &str = "livecd-rootfs";

/// Suffix of the support path in the package file listing, and its name inside the rootfs.
pub const SUPPORT_SUFFIX: &str = "auto";

/// Privilege wrapper for the live-build stages.
pub const SUDO: &str = "sudo";

/// The live-build front-end.
pub const LIVE_BUILD: &str = "lb";
