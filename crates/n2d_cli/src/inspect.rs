//! `inspect` subcommand: human-readable topology report plus optional JSON.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use n2d_core::topology;
use n2d_io::{write_report, CodecReader, ObjImporter};

#[derive(Parser, Debug)]
pub struct InspectArgs {
  /// Path to the mesh (OBJ)
  #[arg(long)]
  pub mesh: PathBuf,

  /// Write the inspection report to this JSON file
  #[arg(long)]
  pub inspect_json: Option<PathBuf>,
}

pub fn run_inspect(args: InspectArgs) -> Result<()> {
  let importer = ObjImporter::new();
  let reader = CodecReader::new();
  let report = topology::inspect(&args.mesh, &importer, &reader)
    .with_context(|| format!("inspecting {}", args.mesh.display()))?;

  for material in &report.materials {
    println!("material {}: {}", material.index, material.name);
    println!("  uv_sets: {}", material.uv_sets.join(" "));
    let tiles: Vec<String> = material.udim_tiles.iter().map(|t| t.to_string()).collect();
    println!("  udims: {}", tiles.join(" "));
    if let Some(map) = &material.normal_map {
      println!("  normal_map: {map}");
      println!("  y_is_down: {}", material.orientation.y_is_down);
    }
    if material.overlapping_uvs {
      println!("  warning: overlapping UVs detected");
    }
  }

  if let Some(path) = &args.inspect_json {
    write_report(path, &report).with_context(|| format!("writing {}", path.display()))?;
    println!("report written to {}", path.display());
  }

  Ok(())
}
