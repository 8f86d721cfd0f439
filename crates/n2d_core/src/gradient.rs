//! Height-gradient construction from decoded normals.
//!
//! A tangent-space normal `(nx, ny, nz)` implies slopes `-nx/nz` and
//! `-ny/nz`. Slope clamping happens in slope space, before the millimeter
//! amplitude scale, so `max_slope` keeps its geometric meaning regardless of
//! amplitude.

use glam::Vec3;
use rayon::prelude::*;

use crate::types::{GradientField, Orientation};

/// Floor on `nz` when converting to slopes. Normals at or past the horizon
/// would otherwise produce unbounded gradients.
const MIN_NZ: f32 = 1e-6;

/// Per-bake gradient parameters.
#[derive(Clone, Copy, Debug)]
pub struct GradientParams {
  pub amplitude_mm: f32,
  pub max_slope: f32,
  pub orientation: Orientation,
}

#[inline]
fn slopes(n: Vec3, params: &GradientParams) -> (f32, f32) {
  let nz = n.z.max(MIN_NZ);
  let mut gx = -n.x / nz;
  let mut gy = -n.y / nz;
  if params.orientation.flip_u {
    gx = -gx;
  }
  if params.orientation.flip_v {
    gy = -gy;
  }
  (
    gx.clamp(-params.max_slope, params.max_slope) * params.amplitude_mm,
    gy.clamp(-params.max_slope, params.max_slope) * params.amplitude_mm,
  )
}

/// Convert a row-major normal grid into a [`GradientField`].
///
/// `normals.len()` must equal `width * height`; rows are processed in
/// parallel.
pub fn build(normals: &[Vec3], width: u32, height: u32, params: GradientParams) -> GradientField {
  debug_assert_eq!(normals.len(), (width * height) as usize);

  let w = width as usize;
  let mut gx = vec![0.0f32; normals.len()];
  let mut gy = vec![0.0f32; normals.len()];

  gx.par_chunks_mut(w)
    .zip(gy.par_chunks_mut(w))
    .zip(normals.par_chunks(w))
    .for_each(|((row_gx, row_gy), row_n)| {
      for ((out_x, out_y), &n) in row_gx.iter_mut().zip(row_gy.iter_mut()).zip(row_n) {
        let (sx, sy) = slopes(n, &params);
        *out_x = sx;
        *out_y = sy;
      }
    });

  GradientField {
    width,
    height,
    gx,
    gy,
  }
}

#[cfg(test)]
#[path = "gradient_test.rs"]
mod gradient_test;
