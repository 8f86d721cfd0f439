//! normal2disp CLI.
//!
//! Converts tangent-space normal maps into per-UDIM-tile displacement maps:
//! - `inspect`: report a mesh's materials, UV sets, UDIM tiles, and
//!   tangent-space orientation
//! - `bake`: reconstruct displacement heights from normal maps and write
//!   float EXR tiles

use anyhow::Result;
use clap::{Parser, Subcommand};

mod bake;
mod inspect;

#[derive(Parser, Debug)]
#[command(name = "n2d")]
#[command(version)]
#[command(about = "Convert tangent-space normal maps into displacement maps")]
struct Cli {
  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
  /// Inspect mesh materials, UV sets, and UDIM tiles
  Inspect(inspect::InspectArgs),
  /// Bake displacement maps from normal maps
  Bake(bake::BakeArgs),
}

fn main() -> Result<()> {
  env_logger::init();

  let cli = Cli::parse();
  match cli.command {
    Commands::Inspect(args) => inspect::run_inspect(args),
    Commands::Bake(args) => bake::run_bake(args),
  }
}

#[cfg(test)]
#[path = "main_test.rs"]
mod main_test;
