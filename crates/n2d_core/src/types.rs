//! Core value types for the baking pipeline.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;

/// How raw normal-map channels are mapped to tangent-space vectors.
///
/// Resolved once per image against the channel count, never per pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum NormalizationMode {
  /// Inspect the channel count: 2 channels decode as [`Xy`](Self::Xy),
  /// 3 or more as [`Xyz`](Self::Xyz).
  #[default]
  Auto,
  /// Decode all three channels with the `* 2 - 1` mapping, then normalize.
  Xyz,
  /// Decode X/Y, reconstruct `z = sqrt(max(0, 1 - x² - y²))`, then
  /// normalize. The path two-channel (BC5-style) sources take.
  Xy,
  /// Pass channel values through unmodified. For float sources that already
  /// store unit vectors.
  None,
}

/// What happens to the batch when a single tile fails.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TileFailurePolicy {
  /// Log the failure, keep baking the remaining tiles.
  #[default]
  SkipAndLog,
  /// Stop dispatching queued tiles after the first failure; in-flight tiles
  /// finish.
  AbortAll,
}

/// Height re-bias applied after the solve.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum HeightBias {
  /// Keep the anchor convention: height at grid origin is 0.
  #[default]
  ZeroAnchor,
  /// Shift the solved field so its mean is 0, making displacement symmetric
  /// around the mesh surface.
  ZeroMean,
}

/// Tangent-space orientation facts derived per material, immutable once
/// computed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Orientation {
  pub flip_u: bool,
  pub flip_v: bool,
  pub y_is_down: bool,
}

/// Bake parameters, consumed verbatim and validated at orchestration entry.
#[derive(Clone, Debug)]
pub struct BakeParams {
  pub mesh_path: PathBuf,
  /// Material name or integer index; empty selects the only material.
  pub material_selector: String,
  /// UV set name (`UV0`, `UV1`, ...) or integer index; empty selects `UV0`.
  pub uv_set: String,
  /// Normal-map filename pattern; must contain `<UDIM>` when multiple tiles
  /// are targeted.
  pub normal_pattern: String,
  /// Output filename pattern, same `<UDIM>` rule.
  pub output_pattern: String,
  /// Explicit Y-convention override; `None` defers to the per-tile guess.
  pub y_is_down: Option<bool>,
  pub export_sidecars: bool,
  /// Cache directory; absent means every lookup misses.
  pub cache_dir: Option<PathBuf>,
  /// Worker threads; 0 uses available hardware concurrency.
  pub threads: usize,
  pub amplitude_mm: f32,
  pub max_slope: f32,
  pub normalization: NormalizationMode,
  pub deterministic: bool,
  pub debug_dumps_dir: Option<PathBuf>,
  pub failure_policy: TileFailurePolicy,
  pub height_bias: HeightBias,
}

impl Default for BakeParams {
  fn default() -> Self {
    Self {
      mesh_path: PathBuf::new(),
      material_selector: String::new(),
      uv_set: String::new(),
      normal_pattern: String::new(),
      output_pattern: String::new(),
      y_is_down: None,
      export_sidecars: false,
      cache_dir: None,
      threads: 0,
      amplitude_mm: 1.0,
      max_slope: 10.0,
      normalization: NormalizationMode::Auto,
      deterministic: false,
      debug_dumps_dir: None,
      failure_policy: TileFailurePolicy::SkipAndLog,
      height_bias: HeightBias::ZeroAnchor,
    }
  }
}

impl BakeParams {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_amplitude_mm(mut self, amplitude_mm: f32) -> Self {
    self.amplitude_mm = amplitude_mm;
    self
  }

  pub fn with_max_slope(mut self, max_slope: f32) -> Self {
    self.max_slope = max_slope;
    self
  }

  pub fn with_normalization(mut self, mode: NormalizationMode) -> Self {
    self.normalization = mode;
    self
  }

  pub fn with_deterministic(mut self, deterministic: bool) -> Self {
    self.deterministic = deterministic;
    self
  }

  pub fn with_threads(mut self, threads: usize) -> Self {
    self.threads = threads;
    self
  }

  pub fn with_failure_policy(mut self, policy: TileFailurePolicy) -> Self {
    self.failure_policy = policy;
    self
  }
}

/// Scalar displacement grid for one UDIM tile, in millimeters.
#[derive(Clone, Debug, PartialEq)]
pub struct HeightField {
  pub width: u32,
  pub height: u32,
  pub data: Vec<f32>,
}

impl HeightField {
  pub fn new(width: u32, height: u32) -> Self {
    Self {
      width,
      height,
      data: vec![0.0; (width * height) as usize],
    }
  }

  /// Minimum and maximum displacement, `(0, 0)` for an empty field.
  pub fn min_max(&self) -> (f32, f32) {
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for &v in &self.data {
      min = min.min(v);
      max = max.max(v);
    }
    if self.data.is_empty() {
      (0.0, 0.0)
    } else {
      (min, max)
    }
  }
}

/// Per-pixel height gradients `(gx, gy)` on a tile grid.
#[derive(Clone, Debug, PartialEq)]
pub struct GradientField {
  pub width: u32,
  pub height: u32,
  pub gx: Vec<f32>,
  pub gy: Vec<f32>,
}

/// Aggregated bake outcome: written output paths plus log lines, both in
/// task-submission order regardless of completion order.
#[derive(Clone, Debug, Default)]
pub struct BakeResult {
  pub outputs: Vec<PathBuf>,
  pub log_lines: Vec<String>,
}

/// Cooperative cancellation handle, honored at task-boundary granularity:
/// in-flight tiles complete, queued tiles are dropped.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
  flag: Arc<AtomicBool>,
}

impl CancelToken {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn cancel(&self) {
    self.flag.store(true, Ordering::Relaxed);
  }

  pub fn is_cancelled(&self) -> bool {
    self.flag.load(Ordering::Relaxed)
  }
}
