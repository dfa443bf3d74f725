use anyhow::Result;

use livefs_lib::livebuild::SystemRunner;
use livefs_lib::platform::host::HostFacts;

use crate::output::{print_json, print_stat};

fn or_unknown(value: &str) -> &str {
  if value.is_empty() { "unknown" } else { value }
}

pub fn cmd_info(json: bool) -> Result<()> {
  let facts = HostFacts::detect(&mut SystemRunner);

  if json {
    return print_json(&facts);
  }

  println!("Host:");
  print_stat("Architecture", or_unknown(&facts.arch));
  print_stat("Release", or_unknown(&facts.suite));
  Ok(())
}
