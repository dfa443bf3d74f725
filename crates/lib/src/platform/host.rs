//! Host facts gathered from single-purpose system tools.
//!
//! Probes never fail: a missing or broken tool yields an empty string, which
//! callers must treat as "unknown". The reason is logged so a misconfigured
//! host is still visible.

use serde::Serialize;
use tracing::{debug, warn};

use crate::livebuild::Runner;

/// The host's package architecture (`dpkg --print-architecture`), or `""`.
pub fn host_arch(runner: &mut dyn Runner) -> String {
  probe(runner, "dpkg", &["--print-architecture"])
}

/// The host's release codename (`lsb_release -c -s`), or `""`.
pub fn host_suite(runner: &mut dyn Runner) -> String {
  probe(runner, "lsb_release", &["-c", "-s"])
}

fn probe(runner: &mut dyn Runner, program: &str, args: &[&str]) -> String {
  match runner.output(program, args) {
    Ok(output) => {
      debug!(program = %program, output = %output, "host probe");
      output
    }
    Err(e) if e.is_not_found() => {
      warn!(program = %program, "probe not installed, treating result as unknown");
      String::new()
    }
    Err(e) => {
      warn!(program = %program, error = %e, "probe failed, treating result as unknown");
      String::new()
    }
  }
}

/// Everything we know about the build host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HostFacts {
  pub arch: String,
  pub suite: String,
}

impl HostFacts {
  pub fn detect(runner: &mut dyn Runner) -> Self {
    Self {
      arch: host_arch(runner),
      suite: host_suite(runner),
    }
  }
}
