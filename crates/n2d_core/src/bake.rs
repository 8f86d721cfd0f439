//! Bake orchestration.
//!
//! Resolves selectors against the mesh, expands UDIM patterns into per-tile
//! tasks, and drives the decode / gradient / solve / write pipeline over a
//! fixed-size worker pool. All validation happens before the first tile is
//! dispatched; per-tile failures after that point are governed by the
//! configured [`TileFailurePolicy`].

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use serde::Serialize;

use crate::cache::{KeyHasher, TileCache};
use crate::decode;
use crate::error::{N2dError, Result};
use crate::gradient::{self, GradientParams};
use crate::io::{ImageReader, ImageWriter, MeshImporter, PixelGrid};
use crate::solver::{self, SolverConfig};
use crate::topology::{self, MaterialInfo, MeshTopology};
use crate::types::{
  BakeParams, BakeResult, CancelToken, HeightBias, NormalizationMode, Orientation,
  TileFailurePolicy,
};

/// Placeholder substituted with the four-digit tile number in filename
/// patterns.
pub const UDIM_TOKEN: &str = "<UDIM>";

/// Expand a filename pattern for one tile. Patterns without the token pass
/// through unchanged.
pub fn expand_udim(pattern: &str, tile: u32) -> String {
  pattern.replace(UDIM_TOKEN, &tile.to_string())
}

/// One unit of worker-pool work.
#[derive(Clone, Debug)]
struct BakeTask {
  tile: u32,
  normal_path: PathBuf,
  output_path: PathBuf,
}

enum TileOutcome {
  Done {
    output: PathBuf,
    cache_hit: bool,
    min: f32,
    max: f32,
  },
  Cancelled,
  SkippedAfterFailure,
  Failed(N2dError),
}

/// Resolve a material selector against the analyzed topology.
///
/// Resolution order: empty selector (sole material only), exact name,
/// case-insensitive substring, integer index. Multiple substring matches are
/// ambiguous rather than first-wins.
pub fn resolve_material<'a>(
  topology: &'a MeshTopology,
  selector: &str,
) -> Result<&'a MaterialInfo> {
  if selector.is_empty() {
    return match topology.materials.len() {
      0 => Err(N2dError::InvalidAsset("mesh has no materials".into())),
      1 => Ok(&topology.materials[0]),
      n => Err(N2dError::AmbiguousInput(format!(
        "mesh has {n} materials; pass a material selector"
      ))),
    };
  }

  if let Some(m) = topology.materials.iter().find(|m| m.name == selector) {
    return Ok(m);
  }

  let needle = selector.to_lowercase();
  let partial: Vec<&MaterialInfo> = topology
    .materials
    .iter()
    .filter(|m| m.name.to_lowercase().contains(&needle))
    .collect();
  match partial.len() {
    1 => return Ok(partial[0]),
    0 => {}
    _ => {
      let names: Vec<&str> = partial.iter().map(|m| m.name.as_str()).collect();
      return Err(N2dError::AmbiguousInput(format!(
        "material selector '{selector}' matches {}",
        names.join(", ")
      )));
    }
  }

  if let Ok(index) = selector.parse::<u32>() {
    if let Some(m) = topology.material(index) {
      return Ok(m);
    }
    return Err(N2dError::InvalidArgs(format!(
      "material index {index} out of range ({} materials)",
      topology.materials.len()
    )));
  }

  Err(N2dError::InvalidArgs(format!(
    "no material matches selector '{selector}'"
  )))
}

/// Resolve a UV-set selector (`UV1`, `1`, or empty for `UV0`) to a channel
/// index. The channel must exist and be fully populated.
pub fn resolve_uv_set(geometry: &crate::io::MeshGeometry, selector: &str) -> Result<usize> {
  let channel = if selector.is_empty() {
    0
  } else {
    let digits = selector
      .strip_prefix("UV")
      .or_else(|| selector.strip_prefix("uv"))
      .unwrap_or(selector);
    digits.parse::<usize>().map_err(|_| {
      N2dError::InvalidArgs(format!("cannot parse uv set selector '{selector}'"))
    })?
  };

  if geometry.uv_channel(channel).is_none() {
    return Err(N2dError::InvalidAsset(format!(
      "uv set UV{channel} has no per-vertex data"
    )));
  }
  Ok(channel)
}

#[derive(Serialize)]
struct TileSidecar<'a> {
  tile: u32,
  width: u32,
  height: u32,
  min_mm: f32,
  max_mm: f32,
  amplitude_mm: f32,
  max_slope: f32,
  #[serde(flatten)]
  orientation: Orientation,
  cache_hit: bool,
  normal_map: &'a str,
}

struct TileContext<'a> {
  params: &'a BakeParams,
  orientation: Orientation,
  reader: &'a dyn ImageReader,
  writer: &'a dyn ImageWriter,
  cache: &'a TileCache,
  solver_config: SolverConfig,
}

fn mode_tag(mode: NormalizationMode) -> u32 {
  match mode {
    NormalizationMode::Auto => 0,
    NormalizationMode::Xyz => 1,
    NormalizationMode::Xy => 2,
    NormalizationMode::None => 3,
  }
}

fn run_tile(task: &BakeTask, ctx: &TileContext<'_>) -> Result<TileOutcome> {
  let grid = ctx.reader.read(&task.normal_path)?;

  let y_is_down = ctx
    .params
    .y_is_down
    .unwrap_or_else(|| topology::guess_y_down(&grid));

  // Key covers the source bytes plus every parameter that affects the solve.
  let key = if ctx.cache.enabled() {
    let normal_bytes = fs::read(&task.normal_path)
      .map_err(|err| N2dError::Io(format!("{}: {err}", task.normal_path.display())))?;
    let mut hasher = KeyHasher::new();
    hasher
      .bytes(&normal_bytes)
      .flag(ctx.orientation.flip_u)
      .flag(ctx.orientation.flip_v)
      .flag(y_is_down)
      .f32(ctx.params.amplitude_mm)
      .f32(ctx.params.max_slope)
      .u32(mode_tag(ctx.params.normalization))
      .flag(ctx.params.height_bias == HeightBias::ZeroMean);
    Some(hasher.finish())
  } else {
    None
  };

  let (field, cache_hit) = match key.as_ref().and_then(|k| ctx.cache.get(k)) {
    Some(field) => (field, true),
    None => {
      let normals = decode::decode_grid(&grid, ctx.params.normalization, y_is_down)?;
      let gradients = gradient::build(
        &normals,
        grid.width,
        grid.height,
        GradientParams {
          amplitude_mm: ctx.params.amplitude_mm,
          max_slope: ctx.params.max_slope,
          orientation: Orientation {
            y_is_down,
            ..ctx.orientation
          },
        },
      );

      if let Some(dir) = &ctx.params.debug_dumps_dir {
        dump_gradients(dir, task.tile, &gradients, ctx.writer)?;
      }

      let field = solver::solve(&gradients, &ctx.solver_config)?;
      if let Some(k) = &key {
        ctx.cache.put(k, &field);
      }
      (field, false)
    }
  };

  let mut out = PixelGrid::new(field.width, field.height, 1);
  out.data.copy_from_slice(&field.data);
  ctx.writer.write(&task.output_path, &out)?;

  let (min, max) = field.min_max();
  if ctx.params.export_sidecars {
    write_sidecar(task, ctx, &field, y_is_down, cache_hit)?;
  }

  Ok(TileOutcome::Done {
    output: task.output_path.clone(),
    cache_hit,
    min,
    max,
  })
}

fn dump_gradients(
  dir: &Path,
  tile: u32,
  gradients: &crate::types::GradientField,
  writer: &dyn ImageWriter,
) -> Result<()> {
  fs::create_dir_all(dir).map_err(|err| N2dError::Io(format!("{}: {err}", dir.display())))?;
  let mut grid = PixelGrid::new(gradients.width, gradients.height, 2);
  for i in 0..gradients.gx.len() {
    grid.data[i * 2] = gradients.gx[i];
    grid.data[i * 2 + 1] = gradients.gy[i];
  }
  writer.write(&dir.join(format!("tile_{tile}_gradients.exr")), &grid)
}

fn write_sidecar(
  task: &BakeTask,
  ctx: &TileContext<'_>,
  field: &crate::types::HeightField,
  y_is_down: bool,
  cache_hit: bool,
) -> Result<()> {
  let (min, max) = field.min_max();
  let normal_map = task.normal_path.to_string_lossy();
  let sidecar = TileSidecar {
    tile: task.tile,
    width: field.width,
    height: field.height,
    min_mm: min,
    max_mm: max,
    amplitude_mm: ctx.params.amplitude_mm,
    max_slope: ctx.params.max_slope,
    orientation: Orientation {
      y_is_down,
      ..ctx.orientation
    },
    cache_hit,
    normal_map: &normal_map,
  };
  let json = serde_json::to_string_pretty(&sidecar)
    .map_err(|err| N2dError::Io(err.to_string()))?;
  let mut path = task.output_path.clone().into_os_string();
  path.push(".json");
  fs::write(&path, json).map_err(|err| N2dError::Io(err.to_string()))
}

fn validate(params: &BakeParams) -> Result<()> {
  if params.mesh_path.as_os_str().is_empty() {
    return Err(N2dError::InvalidArgs("mesh path is empty".into()));
  }
  if params.normal_pattern.is_empty() {
    return Err(N2dError::InvalidArgs("normal pattern is empty".into()));
  }
  if params.output_pattern.is_empty() {
    return Err(N2dError::InvalidArgs("output pattern is empty".into()));
  }
  if !(params.amplitude_mm.is_finite() && params.amplitude_mm > 0.0) {
    return Err(N2dError::InvalidArgs(format!(
      "amplitude must be positive, got {}",
      params.amplitude_mm
    )));
  }
  if !(params.max_slope.is_finite() && params.max_slope > 0.0) {
    return Err(N2dError::InvalidArgs(format!(
      "max slope must be positive, got {}",
      params.max_slope
    )));
  }
  Ok(())
}

/// Run a full bake: one height map per UDIM tile of the selected material.
///
/// Outputs and log lines come back in task-submission order regardless of
/// worker completion order.
pub fn bake(
  params: &BakeParams,
  importer: &dyn MeshImporter,
  reader: &dyn ImageReader,
  writer: &dyn ImageWriter,
  cancel: &CancelToken,
) -> Result<BakeResult> {
  validate(params)?;
  if cancel.is_cancelled() {
    return Err(N2dError::UserCancelled);
  }

  let geometry = importer.import(&params.mesh_path)?;
  let channel = resolve_uv_set(&geometry, &params.uv_set)?;
  let analysis = topology::analyze(&geometry, channel)?;
  let material = resolve_material(&analysis, &params.material_selector)?;

  if material.udim_tiles.is_empty() {
    return Err(N2dError::InvalidAsset(format!(
      "material '{}' has no UV data in UV{channel}",
      material.name
    )));
  }
  if material.udim_tiles.len() > 1 {
    for (name, pattern) in [
      ("normal", &params.normal_pattern),
      ("output", &params.output_pattern),
    ] {
      if !pattern.contains(UDIM_TOKEN) {
        return Err(N2dError::InvalidArgs(format!(
          "material spans {} tiles but the {name} pattern has no {UDIM_TOKEN} token",
          material.udim_tiles.len()
        )));
      }
    }
  }

  let tasks: Vec<BakeTask> = material
    .udim_tiles
    .iter()
    .map(|&tile| BakeTask {
      tile,
      normal_path: PathBuf::from(expand_udim(&params.normal_pattern, tile)),
      output_path: PathBuf::from(expand_udim(&params.output_pattern, tile)),
    })
    .collect();

  log::info!(
    "baking {} tile(s) of material '{}' (UV{channel})",
    tasks.len(),
    material.name
  );

  let cache = TileCache::new(params.cache_dir.clone());
  let ctx = TileContext {
    params,
    orientation: material.orientation,
    reader,
    writer,
    cache: &cache,
    solver_config: SolverConfig {
      deterministic: params.deterministic,
      height_bias: params.height_bias,
      ..SolverConfig::default()
    },
  };

  let pool = rayon::ThreadPoolBuilder::new()
    .num_threads(params.threads)
    .build()
    .map_err(|err| N2dError::Io(format!("worker pool: {err}")))?;

  let abort = AtomicBool::new(false);
  let (sender, receiver) = crossbeam_channel::unbounded();

  pool.install(|| {
    tasks
      .par_iter()
      .enumerate()
      .for_each_with(sender, |tx, (index, task)| {
        let outcome = if cancel.is_cancelled() {
          TileOutcome::Cancelled
        } else if abort.load(Ordering::Relaxed) {
          TileOutcome::SkippedAfterFailure
        } else {
          match run_tile(task, &ctx) {
            Ok(outcome) => outcome,
            Err(err) => {
              if ctx.params.failure_policy == TileFailurePolicy::AbortAll {
                abort.store(true, Ordering::Relaxed);
              }
              TileOutcome::Failed(err)
            }
          }
        };
        // Receiver outlives the pool; a send can only fail on panic-teardown.
        let _ = tx.send((index, task.tile, outcome));
      });
  });

  let mut reports: Vec<(usize, u32, TileOutcome)> = receiver.into_iter().collect();
  reports.sort_by_key(|(index, _, _)| *index);

  let mut result = BakeResult::default();
  let mut first_failure: Option<N2dError> = None;
  for (_, tile, outcome) in reports {
    match outcome {
      TileOutcome::Done {
        output,
        cache_hit,
        min,
        max,
      } => {
        result.log_lines.push(format!(
          "tile {tile}: wrote {} (height {min:.3}..{max:.3} mm, cache {})",
          output.display(),
          if cache_hit { "hit" } else { "miss" }
        ));
        result.outputs.push(output);
      }
      TileOutcome::Cancelled => {
        result
          .log_lines
          .push(format!("tile {tile}: cancelled: {}", N2dError::UserCancelled));
      }
      TileOutcome::SkippedAfterFailure => {
        result
          .log_lines
          .push(format!("tile {tile}: skipped after earlier failure"));
      }
      TileOutcome::Failed(err) => {
        log::error!("tile {tile} failed: {err}");
        result.log_lines.push(format!("tile {tile}: failed: {err}"));
        if first_failure.is_none() {
          first_failure = Some(err);
        }
      }
    }
  }

  if params.failure_policy == TileFailurePolicy::AbortAll {
    if let Some(err) = first_failure {
      return Err(err);
    }
  }
  Ok(result)
}

#[cfg(test)]
#[path = "bake_test.rs"]
mod bake_test;
