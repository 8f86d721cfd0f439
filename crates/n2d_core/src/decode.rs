//! Normal-map sample decoding.
//!
//! Turns raw pixel-grid channels into unit tangent-space vectors. Mode
//! resolution happens once per image; the per-pixel paths are branch-free
//! after that.

use glam::Vec3;

use crate::error::{N2dError, Result};
use crate::io::PixelGrid;
use crate::types::NormalizationMode;

/// Resolve [`NormalizationMode::Auto`] against an image's channel count and
/// validate that the explicit modes have enough channels to read.
pub fn resolve_mode(mode: NormalizationMode, channels: u32) -> Result<NormalizationMode> {
  match mode {
    NormalizationMode::Auto => match channels {
      0 | 1 => Err(N2dError::IncompatibleTextures(format!(
        "cannot decode normals from a {channels}-channel image"
      ))),
      2 => Ok(NormalizationMode::Xy),
      _ => Ok(NormalizationMode::Xyz),
    },
    NormalizationMode::Xy if channels < 2 => Err(N2dError::IncompatibleTextures(format!(
      "XY decode needs 2 channels, image has {channels}"
    ))),
    NormalizationMode::Xyz | NormalizationMode::None if channels < 3 => {
      Err(N2dError::IncompatibleTextures(format!(
        "XYZ decode needs 3 channels, image has {channels}"
      )))
    }
    other => Ok(other),
  }
}

/// Decode X/Y and reconstruct Z on the unit hemisphere.
///
/// Samples outside the unit disk (x² + y² > 1) clamp to the equator: Z is
/// pinned to 0 and the XY pair renormalized.
#[inline]
pub fn decode_xy(x: f32, y: f32) -> Vec3 {
  let x = x * 2.0 - 1.0;
  let y = y * 2.0 - 1.0;
  let sq = x * x + y * y;
  if sq > 1.0 {
    let inv = 1.0 / sq.sqrt();
    return Vec3::new(x * inv, y * inv, 0.0);
  }
  Vec3::new(x, y, (1.0 - sq).sqrt())
}

/// Decode all three channels with the `* 2 - 1` mapping and normalize.
///
/// A zero-length sample decodes as the up vector rather than NaN.
#[inline]
pub fn decode_xyz(x: f32, y: f32, z: f32) -> Vec3 {
  let v = Vec3::new(x * 2.0 - 1.0, y * 2.0 - 1.0, z * 2.0 - 1.0);
  v.try_normalize().unwrap_or(Vec3::Z)
}

/// Decode a whole pixel grid into tangent-space normals, row-major.
///
/// `y_is_down` flips the Y component after normalization so both conventions
/// produce the same downstream gradients.
pub fn decode_grid(
  grid: &PixelGrid,
  mode: NormalizationMode,
  y_is_down: bool,
) -> Result<Vec<Vec3>> {
  let mode = resolve_mode(mode, grid.channels)?;
  let c = grid.channels as usize;
  let mut normals = Vec::with_capacity(grid.pixel_count());

  for px in grid.data.chunks_exact(c) {
    let mut n = match mode {
      NormalizationMode::Xy => decode_xy(px[0], px[1]),
      NormalizationMode::Xyz => decode_xyz(px[0], px[1], px[2]),
      NormalizationMode::None => Vec3::new(px[0], px[1], px[2]),
      // resolve_mode never returns Auto.
      NormalizationMode::Auto => unreachable!(),
    };
    if y_is_down {
      n.y = -n.y;
    }
    normals.push(n);
  }

  Ok(normals)
}

#[cfg(test)]
#[path = "decode_test.rs"]
mod decode_test;
