//! `bake` subcommand: full normal-to-displacement bake over UDIM tiles.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use n2d_core::types::{
  BakeParams, CancelToken, HeightBias, NormalizationMode, TileFailurePolicy,
};
use n2d_io::{CodecReader, ExrWriter, ObjImporter};

/// Command-line face of [`NormalizationMode`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum NormalizationArg {
  /// Pick by channel count: 2 channels decode as XY, 3 or more as XYZ
  #[default]
  Auto,
  /// Decode all three channels, then renormalize
  Xyz,
  /// Decode X/Y and reconstruct Z
  Xy,
  /// Pass samples through unmodified
  None,
}

impl From<NormalizationArg> for NormalizationMode {
  fn from(arg: NormalizationArg) -> Self {
    match arg {
      NormalizationArg::Auto => NormalizationMode::Auto,
      NormalizationArg::Xyz => NormalizationMode::Xyz,
      NormalizationArg::Xy => NormalizationMode::Xy,
      NormalizationArg::None => NormalizationMode::None,
    }
  }
}

#[derive(Parser, Debug)]
pub struct BakeArgs {
  /// Path to the mesh (OBJ)
  #[arg(long)]
  pub mesh: PathBuf,

  /// Material name or integer index; defaults to the only material
  #[arg(long, default_value = "")]
  pub material: String,

  /// UV set name (UV0, UV1, ...) or integer index; defaults to UV0
  #[arg(long, default_value = "")]
  pub uv_set: String,

  /// Normal-map filename pattern; use <UDIM> for multi-tile bakes
  #[arg(long)]
  pub normal_pattern: String,

  /// Output filename pattern, same <UDIM> rule
  #[arg(long)]
  pub output_pattern: String,

  /// Override the +Y-down convention (true/false); omitted guesses per tile
  #[arg(long)]
  pub y_is_down: Option<bool>,

  /// Write a JSON sidecar next to each output tile
  #[arg(long)]
  pub export_sidecars: bool,

  /// Height-field cache directory; omitted disables caching
  #[arg(long)]
  pub cache_dir: Option<PathBuf>,

  /// Worker threads; 0 uses all cores
  #[arg(long, default_value_t = 0)]
  pub threads: usize,

  /// Displacement amplitude in millimeters
  #[arg(long, default_value_t = 1.0)]
  pub amplitude_mm: f32,

  /// Slope clamp applied before amplitude scaling
  #[arg(long, default_value_t = 10.0)]
  pub max_slope: f32,

  /// Normal decode mode
  #[arg(long, value_enum, default_value_t = NormalizationArg::Auto)]
  pub normalization: NormalizationArg,

  /// Bit-reproducible solves (sequential reductions)
  #[arg(long)]
  pub deterministic: bool,

  /// Directory for intermediate gradient dumps
  #[arg(long)]
  pub debug_dumps_dir: Option<PathBuf>,

  /// Stop dispatching tiles after the first failure instead of skipping it
  #[arg(long)]
  pub abort_on_failure: bool,

  /// Re-bias solved heights to zero mean instead of anchoring the origin
  #[arg(long)]
  pub zero_mean: bool,
}

impl BakeArgs {
  pub fn to_params(&self) -> BakeParams {
    BakeParams {
      mesh_path: self.mesh.clone(),
      material_selector: self.material.clone(),
      uv_set: self.uv_set.clone(),
      normal_pattern: self.normal_pattern.clone(),
      output_pattern: self.output_pattern.clone(),
      y_is_down: self.y_is_down,
      export_sidecars: self.export_sidecars,
      cache_dir: self.cache_dir.clone(),
      threads: self.threads,
      amplitude_mm: self.amplitude_mm,
      max_slope: self.max_slope,
      normalization: self.normalization.into(),
      deterministic: self.deterministic,
      debug_dumps_dir: self.debug_dumps_dir.clone(),
      failure_policy: if self.abort_on_failure {
        TileFailurePolicy::AbortAll
      } else {
        TileFailurePolicy::SkipAndLog
      },
      height_bias: if self.zero_mean {
        HeightBias::ZeroMean
      } else {
        HeightBias::ZeroAnchor
      },
    }
  }
}

pub fn run_bake(args: BakeArgs) -> Result<()> {
  let params = args.to_params();
  let importer = ObjImporter::new();
  let reader = CodecReader::new();
  let writer = ExrWriter::new();
  let cancel = CancelToken::new();

  let result = n2d_core::bake::bake(&params, &importer, &reader, &writer, &cancel)
    .with_context(|| format!("baking {}", params.mesh_path.display()))?;

  for line in &result.log_lines {
    println!("{line}");
  }
  println!("baked {} tile(s)", result.outputs.len());

  Ok(())
}

#[cfg(test)]
#[path = "bake_test.rs"]
mod bake_test;
