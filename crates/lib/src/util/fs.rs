//! Copying that keeps special files special.
//!
//! [`copy_special`] behaves like `cp -a` for the parts live-build cares about:
//! directories are copied recursively, symlinks stay symlinks, FIFOs and device
//! nodes are recreated rather than read, and permission bits are carried over.
//! Timestamps and ownership are not preserved.

use std::fs;
use std::io;
use std::os::unix::fs::{MetadataExt, PermissionsExt, symlink};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

/// Errors that can occur while copying.
#[derive(Debug, Error)]
pub enum CopyError {
  #[error("failed to traverse {path}: {source}")]
  WalkDir {
    path: String,
    #[source]
    source: walkdir::Error,
  },

  #[error("failed to read {path}: {source}")]
  Read {
    path: String,
    #[source]
    source: io::Error,
  },

  #[error("failed to create directory {path}: {source}")]
  CreateDir {
    path: String,
    #[source]
    source: io::Error,
  },

  #[error("failed to copy file to {path}: {source}")]
  CopyFile {
    path: String,
    #[source]
    source: io::Error,
  },

  #[error("failed to create symlink {path}: {source}")]
  Symlink {
    path: String,
    #[source]
    source: io::Error,
  },

  #[error("failed to create special file {path}: {source}")]
  SpecialFile {
    path: String,
    #[source]
    source: io::Error,
  },

  #[error("failed to replace {path}: {source}")]
  Replace {
    path: String,
    #[source]
    source: io::Error,
  },

  #[error("failed to set permissions on {path}: {source}")]
  SetPermissions {
    path: String,
    #[source]
    source: io::Error,
  },
}

/// Copy `src` to `dst`, preserving links, special files and permissions.
///
/// `src` may be a single entry or a directory tree. Existing directories at the
/// destination are merged into; any other existing entry is replaced.
pub fn copy_special(src: &Path, dst: &Path) -> Result<(), CopyError> {
  debug!(src = ?src, dst = ?dst, "copying");

  // Directory modes are applied last so read-only directories can be filled first
  let mut dirs: Vec<(PathBuf, u32)> = Vec::new();

  for entry in WalkDir::new(src).follow_links(false) {
    let entry = entry.map_err(|e| CopyError::WalkDir {
      path: src.display().to_string(),
      source: e,
    })?;

    let relative = entry.path().strip_prefix(src).unwrap_or(Path::new(""));
    let target = if relative.as_os_str().is_empty() {
      dst.to_path_buf()
    } else {
      dst.join(relative)
    };

    copy_entry(entry.path(), &target, &mut dirs)?;
  }

  for (dir, mode) in dirs.iter().rev() {
    fs::set_permissions(dir, fs::Permissions::from_mode(*mode)).map_err(|e| CopyError::SetPermissions {
      path: dir.display().to_string(),
      source: e,
    })?;
  }

  Ok(())
}

fn copy_entry(src: &Path, dst: &Path, dirs: &mut Vec<(PathBuf, u32)>) -> Result<(), CopyError> {
  let metadata = fs::symlink_metadata(src).map_err(|e| CopyError::Read {
    path: src.display().to_string(),
    source: e,
  })?;
  let file_type = metadata.file_type();

  if file_type.is_dir() {
    // Parents come first in the walk, so a missing parent here means a missing destination root
    match fs::create_dir(dst) {
      Ok(()) => {}
      Err(e) if e.kind() == io::ErrorKind::AlreadyExists && dst.is_dir() => {}
      Err(e) => {
        return Err(CopyError::CreateDir {
          path: dst.display().to_string(),
          source: e,
        });
      }
    }
    dirs.push((dst.to_path_buf(), metadata.mode() & 0o7777));
    return Ok(());
  }

  remove_existing(dst)?;

  if file_type.is_symlink() {
    let link = fs::read_link(src).map_err(|e| CopyError::Read {
      path: src.display().to_string(),
      source: e,
    })?;
    symlink(&link, dst).map_err(|e| CopyError::Symlink {
      path: dst.display().to_string(),
      source: e,
    })?;
  } else if file_type.is_file() {
    // fs::copy carries the permission bits over
    fs::copy(src, dst).map_err(|e| CopyError::CopyFile {
      path: dst.display().to_string(),
      source: e,
    })?;
  } else {
    make_node(dst, &metadata)?;
  }

  Ok(())
}

/// Remove a non-directory entry at `path` so it can be recreated.
fn remove_existing(path: &Path) -> Result<(), CopyError> {
  match fs::symlink_metadata(path) {
    Ok(meta) if !meta.is_dir() => fs::remove_file(path).map_err(|e| CopyError::Replace {
      path: path.display().to_string(),
      source: e,
    }),
    _ => Ok(()),
  }
}

#[cfg(target_os = "linux")]
fn make_node(dst: &Path, metadata: &fs::Metadata) -> Result<(), CopyError> {
  use rustix::fs::{CWD, FileType, Mode, mknodat};

  let raw_mode = metadata.mode();
  mknodat(
    CWD,
    dst,
    FileType::from_raw_mode(raw_mode),
    Mode::from_raw_mode(raw_mode),
    metadata.rdev(),
  )
  .map_err(|e| CopyError::SpecialFile {
    path: dst.display().to_string(),
    source: e.into(),
  })
}

#[cfg(not(target_os = "linux"))]
fn make_node(dst: &Path, _metadata: &fs::Metadata) -> Result<(), CopyError> {
  Err(CopyError::SpecialFile {
    path: dst.display().to_string(),
    source: io::Error::new(io::ErrorKind::Unsupported, "special files are only supported on Linux"),
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  fn mode_of(path: &Path) -> u32 {
    fs::symlink_metadata(path).unwrap().mode() & 0o7777
  }

  fn write_script(path: &Path, body: &str) {
    fs::write(path, body).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
  }

  #[test]
  fn copies_directory_tree() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("auto");
    fs::create_dir(&src).unwrap();
    write_script(&src.join("config"), "#!/bin/sh\nlb config noauto \"$@\"\n");
    write_script(&src.join("build"), "#!/bin/sh\nlb build noauto \"$@\"\n");
    fs::write(src.join("README"), "not executable").unwrap();

    let dst = temp.path().join("rootfs").join("auto");
    fs::create_dir(temp.path().join("rootfs")).unwrap();
    copy_special(&src, &dst).unwrap();

    assert_eq!(
      fs::read_to_string(dst.join("config")).unwrap(),
      "#!/bin/sh\nlb config noauto \"$@\"\n"
    );
    assert_eq!(mode_of(&dst.join("config")), 0o755);
    assert_eq!(mode_of(&dst.join("build")), 0o755);
    assert_eq!(mode_of(&dst.join("README")) & 0o111, 0);
  }

  #[test]
  fn keeps_symlinks_as_links() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("auto");
    fs::create_dir(&src).unwrap();
    write_script(&src.join("config"), "#!/bin/sh\n");
    symlink("config", src.join("clean")).unwrap();

    let dst = temp.path().join("copy");
    copy_special(&src, &dst).unwrap();

    let link = dst.join("clean");
    assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
    assert_eq!(fs::read_link(&link).unwrap(), PathBuf::from("config"));
  }

  #[test]
  fn copies_a_single_symlink() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("auto");
    symlink("/usr/share/livecd-rootfs/live-build/auto", &src).unwrap();

    let dst = temp.path().join("dst");
    copy_special(&src, &dst).unwrap();

    assert_eq!(
      fs::read_link(&dst).unwrap(),
      PathBuf::from("/usr/share/livecd-rootfs/live-build/auto")
    );
  }

  #[test]
  #[cfg(target_os = "linux")]
  fn recreates_fifos() {
    use rustix::fs::{CWD, FileType, Mode, mknodat};
    use std::os::unix::fs::FileTypeExt;

    let temp = TempDir::new().unwrap();
    let src = temp.path().join("pipe");
    mknodat(CWD, &src, FileType::Fifo, Mode::from_raw_mode(0o644), 0).unwrap();

    let dst = temp.path().join("pipe-copy");
    copy_special(&src, &dst).unwrap();

    assert!(fs::symlink_metadata(&dst).unwrap().file_type().is_fifo());
  }

  #[test]
  fn replaces_existing_files_and_merges_directories() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("auto");
    fs::create_dir(&src).unwrap();
    fs::write(src.join("config"), "new").unwrap();

    let dst = temp.path().join("dst");
    fs::create_dir(&dst).unwrap();
    fs::write(dst.join("config"), "old").unwrap();
    fs::write(dst.join("keep"), "untouched").unwrap();

    copy_special(&src, &dst).unwrap();

    assert_eq!(fs::read_to_string(dst.join("config")).unwrap(), "new");
    assert_eq!(fs::read_to_string(dst.join("keep")).unwrap(), "untouched");
  }

  #[test]
  fn fills_read_only_directories() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("auto");
    fs::create_dir(&src).unwrap();
    fs::write(src.join("config"), "x").unwrap();
    fs::set_permissions(&src, fs::Permissions::from_mode(0o555)).unwrap();

    let dst = temp.path().join("dst");
    let result = copy_special(&src, &dst);

    // Let TempDir clean up
    fs::set_permissions(&src, fs::Permissions::from_mode(0o755)).unwrap();
    let dst_mode = mode_of(&dst);
    fs::set_permissions(&dst, fs::Permissions::from_mode(0o755)).unwrap();

    result.unwrap();
    assert_eq!(dst_mode, 0o555);
    assert_eq!(fs::read_to_string(dst.join("config")).unwrap(), "x");
  }

  #[test]
  fn missing_destination_parent_is_an_error() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("auto");
    fs::create_dir(&src).unwrap();

    let result = copy_special(&src, &temp.path().join("no-rootfs").join("auto"));

    assert!(matches!(result, Err(CopyError::CreateDir { .. })));
  }

  #[test]
  fn missing_source_is_an_error() {
    let temp = TempDir::new().unwrap();
    let result = copy_special(&temp.path().join("nope"), &temp.path().join("dst"));

    assert!(matches!(result, Err(CopyError::WalkDir { .. })));
  }
}
