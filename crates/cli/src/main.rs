#[cfg(not(unix))]
compile_error!("livefs drives live-build and only builds for Unix hosts");

mod cmd;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use livefs_lib::consts::APP_NAME;
use tracing_subscriber::EnvFilter;

use cmd::{BuildArgs, cmd_build, cmd_info};

/// livefs - build live root filesystems with live-build
#[derive(Parser)]
#[command(name = APP_NAME)]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Run lb config and lb build inside a rootfs directory
  Build(BuildArgs),

  /// Show the host architecture and release
  Info {
    /// Output as JSON
    #[arg(long)]
    json: bool,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  // RUST_LOG wins; otherwise --verbose picks the default level
  let default_level = if cli.verbose { "debug" } else { "info" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match cli.command {
    Commands::Build(args) => cmd_build(args),
    Commands::Info { json } => cmd_info(json),
  }
}
