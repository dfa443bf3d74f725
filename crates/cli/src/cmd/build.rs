//! Implementation of the `livefs build` command.
//!
//! Fills in the target architecture and release from the host when they are
//! not given, assembles the live-build environment and runs both stages.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::Args;
use tracing::debug;

use livefs_lib::livebuild::{LiveBuildOptions, SystemRunner, run_live_build};
use livefs_lib::platform::host::{host_arch, host_suite};
use livefs_lib::util::capture::StreamSlot;

use crate::output::{format_duration, print_info, print_success, print_warning};

#[derive(Debug, Args)]
pub struct BuildArgs {
  /// Root filesystem directory live-build runs in
  #[arg(long)]
  pub rootfs: PathBuf,

  /// Target architecture, e.g. amd64 or arm64 (default: host architecture)
  #[arg(long)]
  pub arch: Option<String>,

  /// Release codename (default: host release)
  #[arg(long)]
  pub suite: Option<String>,

  /// livecd-rootfs project to build, e.g. ubuntu-cpc
  #[arg(long)]
  pub project: Option<String>,

  /// Extra environment for live-build (repeatable)
  #[arg(short = 'e', long = "env", value_name = "KEY=VALUE", value_parser = parse_env_entry)]
  pub env: Vec<String>,

  /// Bootstrap through qemu when the target architecture differs from the host
  #[arg(long)]
  pub cross_build: bool,
}

fn parse_env_entry(entry: &str) -> Result<String, String> {
  match entry.split_once('=') {
    Some((key, _)) if !key.is_empty() => Ok(entry.to_string()),
    _ => Err(format!("expected KEY=VALUE, got '{}'", entry)),
  }
}

/// Environment handed to live-build: PROJECT, SUITE and ARCH first, then user entries.
fn build_env(project: Option<&str>, suite: &str, arch: &str, extra: &[String]) -> Vec<String> {
  let mut env = Vec::with_capacity(extra.len() + 3);
  if let Some(project) = project {
    env.push(format!("PROJECT={}", project));
  }
  if !suite.is_empty() {
    env.push(format!("SUITE={}", suite));
  }
  env.push(format!("ARCH={}", arch));
  env.extend(extra.iter().cloned());
  env
}

pub fn cmd_build(args: BuildArgs) -> Result<()> {
  let rootfs = dunce::canonicalize(&args.rootfs)
    .with_context(|| format!("rootfs {} does not exist", args.rootfs.display()))?;

  let mut runner = SystemRunner;

  let arch = match args.arch {
    Some(arch) => arch,
    None => {
      let arch = host_arch(&mut runner);
      if arch.is_empty() {
        bail!("could not determine the host architecture, pass --arch");
      }
      arch
    }
  };

  let suite = args.suite.unwrap_or_else(|| host_suite(&mut runner));
  if suite.is_empty() {
    print_warning("Could not determine the host release, SUITE will not be set");
  }

  let options = LiveBuildOptions {
    env: build_env(args.project.as_deref(), &suite, &arch, &args.env),
    rootfs,
    arch,
    enable_cross_build: args.cross_build,
  };
  debug!(options = ?options, "live-build options");

  print_info(&format!(
    "Building {} rootfs in {}",
    options.arch,
    options.rootfs.display()
  ));

  let started = Instant::now();
  run_live_build(&options, &mut runner, &StreamSlot::stdout()).context("live-build failed")?;

  print_success(&format!("Build complete in {}", format_duration(started.elapsed())));
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn env_entries_need_a_key() {
    assert_eq!(parse_env_entry("IMAGEFORMAT=ext4").unwrap(), "IMAGEFORMAT=ext4");
    assert_eq!(parse_env_entry("EMPTY=").unwrap(), "EMPTY=");
    assert!(parse_env_entry("=value").is_err());
    assert!(parse_env_entry("no-equals").is_err());
  }

  #[test]
  fn build_env_orders_known_keys_first() {
    let env = build_env(Some("ubuntu-cpc"), "noble", "arm64", &["SUBPROJECT=minimized".to_string()]);
    assert_eq!(
      env,
      vec!["PROJECT=ubuntu-cpc", "SUITE=noble", "ARCH=arm64", "SUBPROJECT=minimized"]
    );
  }

  #[test]
  fn build_env_omits_unknown_suite_and_project() {
    assert_eq!(build_env(None, "", "amd64", &[]), vec!["ARCH=amd64"]);
  }
}
