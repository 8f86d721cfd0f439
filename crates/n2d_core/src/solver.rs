//! Poisson height reconstruction.
//!
//! Integrates a gradient field into a height field by solving the discrete
//! Poisson equation `L h = -div(g)` with natural (Neumann) boundaries. The
//! Laplacian is assembled as a sparse CSR matrix and solved with conjugate
//! gradients in f64; the result is truncated to f32 on output.

use rayon::prelude::*;
use sprs::{CsMat, TriMat};

use crate::error::{N2dError, Result};
use crate::types::{GradientField, HeightBias, HeightField};

/// Weight added to the anchor cell's diagonal. Pins the otherwise-singular
/// Neumann system to `h[0] = 0` while keeping it symmetric positive
/// definite.
const ANCHOR_WEIGHT: f64 = 1.0;

/// Conjugate-gradient parameters.
#[derive(Clone, Copy, Debug)]
pub struct SolverConfig {
  /// Relative residual target, `|r| / |b|`.
  pub tolerance: f64,
  /// Iteration cap; exceeding it fails the solve.
  pub max_iterations: usize,
  /// Sequential reductions when set, for bit-stable output.
  pub deterministic: bool,
  pub height_bias: HeightBias,
}

impl Default for SolverConfig {
  fn default() -> Self {
    Self {
      tolerance: 1e-8,
      max_iterations: 20_000,
      deterministic: false,
      height_bias: HeightBias::ZeroAnchor,
    }
  }
}

/// Assemble the 5-point Laplacian for a `w * h` grid.
///
/// Each row has `degree` on the diagonal and `-1` per existing neighbor, so
/// boundary cells see only the neighbors the grid actually has.
fn build_laplacian(w: usize, h: usize) -> CsMat<f64> {
  let n = w * h;
  let mut tri = TriMat::new((n, n));

  for y in 0..h {
    for x in 0..w {
      let idx = y * w + x;
      let mut degree = 0.0;
      if x > 0 {
        tri.add_triplet(idx, idx - 1, -1.0);
        degree += 1.0;
      }
      if x + 1 < w {
        tri.add_triplet(idx, idx + 1, -1.0);
        degree += 1.0;
      }
      if y > 0 {
        tri.add_triplet(idx, idx - w, -1.0);
        degree += 1.0;
      }
      if y + 1 < h {
        tri.add_triplet(idx, idx + w, -1.0);
        degree += 1.0;
      }
      if idx == 0 {
        degree += ANCHOR_WEIGHT;
      }
      tri.add_triplet(idx, idx, degree);
    }
  }

  tri.to_csr()
}

/// Negative divergence of a forward-difference gradient field, the
/// right-hand side of the Poisson system.
///
/// The anchor cell's entry is zeroed to match the anchor row of the matrix.
fn build_rhs(gradients: &GradientField) -> Vec<f64> {
  let w = gradients.width as usize;
  let h = gradients.height as usize;
  let mut b = vec![0.0f64; w * h];

  for y in 0..h {
    for x in 0..w {
      let idx = y * w + x;
      let mut div = 0.0f64;
      if x + 1 < w {
        div += gradients.gx[idx] as f64;
      }
      if x > 0 {
        div -= gradients.gx[idx - 1] as f64;
      }
      if y + 1 < h {
        div += gradients.gy[idx] as f64;
      }
      if y > 0 {
        div -= gradients.gy[idx - w] as f64;
      }
      b[idx] = -div;
    }
  }

  b[0] = 0.0;
  b
}

fn dot(a: &[f64], b: &[f64], deterministic: bool) -> f64 {
  if deterministic {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
  } else {
    a.par_iter().zip(b.par_iter()).map(|(x, y)| x * y).sum()
  }
}

fn matvec(a: &CsMat<f64>, x: &[f64], out: &mut [f64], deterministic: bool) {
  if deterministic {
    for (i, row) in a.outer_iterator().enumerate() {
      out[i] = row.iter().map(|(j, &v)| v * x[j]).sum();
    }
  } else {
    out.par_iter_mut().enumerate().for_each(|(i, slot)| {
      *slot = match a.outer_view(i) {
        Some(row) => row.iter().map(|(j, &v)| v * x[j]).sum(),
        None => 0.0,
      };
    });
  }
}

/// Conjugate gradients on an SPD system, starting from zero.
fn conjugate_gradient(
  a: &CsMat<f64>,
  b: &[f64],
  config: &SolverConfig,
) -> Result<Vec<f64>> {
  let n = b.len();
  let mut x = vec![0.0f64; n];

  let b_norm = dot(b, b, config.deterministic).sqrt();
  if b_norm == 0.0 {
    return Ok(x);
  }

  let mut r = b.to_vec();
  let mut p = r.clone();
  let mut ap = vec![0.0f64; n];
  let mut rs_old = dot(&r, &r, config.deterministic);

  for _ in 0..config.max_iterations {
    matvec(a, &p, &mut ap, config.deterministic);
    let p_ap = dot(&p, &ap, config.deterministic);
    if p_ap == 0.0 {
      return Err(N2dError::SolverFailed(
        "conjugate gradient breakdown: p·Ap = 0".into(),
      ));
    }
    let alpha = rs_old / p_ap;

    for i in 0..n {
      x[i] += alpha * p[i];
      r[i] -= alpha * ap[i];
    }

    let rs_new = dot(&r, &r, config.deterministic);
    if rs_new.sqrt() / b_norm < config.tolerance {
      return Ok(x);
    }

    let beta = rs_new / rs_old;
    for i in 0..n {
      p[i] = r[i] + beta * p[i];
    }
    rs_old = rs_new;
  }

  Err(N2dError::SolverFailed(format!(
    "no convergence after {} iterations (relative residual {:.3e})",
    config.max_iterations,
    rs_old.sqrt() / b_norm
  )))
}

/// Integrate a gradient field into a height field.
pub fn solve(gradients: &GradientField, config: &SolverConfig) -> Result<HeightField> {
  let w = gradients.width as usize;
  let h = gradients.height as usize;
  if w == 0 || h == 0 {
    return Ok(HeightField::new(gradients.width, gradients.height));
  }
  if gradients.gx.len() != w * h || gradients.gy.len() != w * h {
    return Err(N2dError::SolverFailed(format!(
      "gradient buffers do not match {w}x{h} grid"
    )));
  }

  let a = build_laplacian(w, h);
  let b = build_rhs(gradients);
  let mut heights = conjugate_gradient(&a, &b, config)?;

  if config.height_bias == HeightBias::ZeroMean {
    let mean = heights.iter().sum::<f64>() / heights.len() as f64;
    for v in &mut heights {
      *v -= mean;
    }
  }

  Ok(HeightField {
    width: gradients.width,
    height: gradients.height,
    data: heights.into_iter().map(|v| v as f32).collect(),
  })
}

#[cfg(test)]
#[path = "solver_test.rs"]
mod solver_test;
