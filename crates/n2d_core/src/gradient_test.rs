use super::*;

fn params(amplitude_mm: f32, max_slope: f32) -> GradientParams {
  GradientParams {
    amplitude_mm,
    max_slope,
    orientation: Orientation::default(),
  }
}

fn approx(a: f32, b: f32) -> bool {
  (a - b).abs() < 1e-5
}

#[test]
fn test_flat_normal_has_zero_gradient() {
  let field = build(&[Vec3::Z], 1, 1, params(1.0, 10.0));
  assert!(approx(field.gx[0], 0.0));
  assert!(approx(field.gy[0], 0.0));
}

#[test]
fn test_slope_follows_normal_tilt() {
  // 45 degrees toward +X means the surface falls one unit per unit step
  let n = Vec3::new(1.0, 0.0, 1.0).normalize();
  let field = build(&[n], 1, 1, params(1.0, 10.0));
  assert!(approx(field.gx[0], -1.0), "gx {}", field.gx[0]);
  assert!(approx(field.gy[0], 0.0));
}

#[test]
fn test_amplitude_scales_slopes() {
  let n = Vec3::new(1.0, 0.0, 1.0).normalize();
  let field = build(&[n], 1, 1, params(2.5, 10.0));
  assert!(approx(field.gx[0], -2.5));
}

#[test]
fn test_grazing_normal_clamps_to_max_slope() {
  // Horizon-level normal would be an unbounded slope without the clamp
  let n = Vec3::new(1.0, 0.0, 0.0);
  let field = build(&[n], 1, 1, params(1.0, 10.0));
  assert!(approx(field.gx[0], -10.0));
}

#[test]
fn test_clamp_applies_before_amplitude() {
  let n = Vec3::new(1.0, 0.0, 0.0);
  let field = build(&[n], 1, 1, params(2.0, 10.0));
  // Slope clamps to 10, then scales to 20 mm per texel
  assert!(approx(field.gx[0], -20.0));
}

#[test]
fn test_flips_negate_their_axis() {
  let n = Vec3::new(0.5, 0.5, 1.0).normalize();
  let plain = build(&[n], 1, 1, params(1.0, 10.0));

  let mut p = params(1.0, 10.0);
  p.orientation.flip_u = true;
  let flipped_u = build(&[n], 1, 1, p);

  let mut p = params(1.0, 10.0);
  p.orientation.flip_v = true;
  let flipped_v = build(&[n], 1, 1, p);

  assert!(approx(flipped_u.gx[0], -plain.gx[0]));
  assert!(approx(flipped_u.gy[0], plain.gy[0]));
  assert!(approx(flipped_v.gy[0], -plain.gy[0]));
  assert!(approx(flipped_v.gx[0], plain.gx[0]));
}

#[test]
fn test_rows_keep_their_place() {
  let normals = vec![
    Vec3::Z,
    Vec3::new(1.0, 0.0, 1.0).normalize(),
    Vec3::new(0.0, 1.0, 1.0).normalize(),
    Vec3::Z,
  ];
  let field = build(&normals, 2, 2, params(1.0, 10.0));

  assert!(approx(field.gx[0], 0.0));
  assert!(approx(field.gx[1], -1.0));
  assert!(approx(field.gy[2], -1.0));
  assert!(approx(field.gx[3], 0.0));
}
