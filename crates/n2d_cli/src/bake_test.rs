use std::path::PathBuf;

use super::*;

fn parse(args: &[&str]) -> BakeArgs {
  let mut argv = vec!["bake"];
  argv.extend_from_slice(args);
  BakeArgs::try_parse_from(argv).unwrap()
}

const REQUIRED: &[&str] = &[
  "--mesh",
  "mesh.obj",
  "--normal-pattern",
  "n_<UDIM>.png",
  "--output-pattern",
  "out_<UDIM>.exr",
];

#[test]
fn test_defaults_match_params_defaults() {
  let params = parse(REQUIRED).to_params();
  let defaults = BakeParams::default();

  assert_eq!(params.mesh_path, PathBuf::from("mesh.obj"));
  assert_eq!(params.normal_pattern, "n_<UDIM>.png");
  assert_eq!(params.output_pattern, "out_<UDIM>.exr");
  assert_eq!(params.material_selector, defaults.material_selector);
  assert_eq!(params.uv_set, defaults.uv_set);
  assert_eq!(params.y_is_down, defaults.y_is_down);
  assert_eq!(params.export_sidecars, defaults.export_sidecars);
  assert_eq!(params.cache_dir, defaults.cache_dir);
  assert_eq!(params.threads, defaults.threads);
  assert_eq!(params.amplitude_mm, defaults.amplitude_mm);
  assert_eq!(params.max_slope, defaults.max_slope);
  assert_eq!(params.normalization, defaults.normalization);
  assert_eq!(params.deterministic, defaults.deterministic);
  assert_eq!(params.debug_dumps_dir, defaults.debug_dumps_dir);
  assert_eq!(params.failure_policy, defaults.failure_policy);
  assert_eq!(params.height_bias, defaults.height_bias);
}

#[test]
fn test_full_flag_set_maps_through() {
  let mut argv: Vec<&str> = REQUIRED.to_vec();
  argv.extend_from_slice(&[
    "--material",
    "skin",
    "--uv-set",
    "UV1",
    "--y-is-down",
    "false",
    "--export-sidecars",
    "--cache-dir",
    "/tmp/n2d-cache",
    "--threads",
    "4",
    "--amplitude-mm",
    "2.5",
    "--max-slope",
    "5",
    "--normalization",
    "xy",
    "--deterministic",
    "--debug-dumps-dir",
    "/tmp/dumps",
    "--abort-on-failure",
    "--zero-mean",
  ]);
  let params = parse(&argv).to_params();

  assert_eq!(params.material_selector, "skin");
  assert_eq!(params.uv_set, "UV1");
  assert_eq!(params.y_is_down, Some(false));
  assert!(params.export_sidecars);
  assert_eq!(params.cache_dir, Some(PathBuf::from("/tmp/n2d-cache")));
  assert_eq!(params.threads, 4);
  assert_eq!(params.amplitude_mm, 2.5);
  assert_eq!(params.max_slope, 5.0);
  assert_eq!(params.normalization, NormalizationMode::Xy);
  assert!(params.deterministic);
  assert_eq!(params.debug_dumps_dir, Some(PathBuf::from("/tmp/dumps")));
  assert_eq!(params.failure_policy, TileFailurePolicy::AbortAll);
  assert_eq!(params.height_bias, HeightBias::ZeroMean);
}

#[test]
fn test_normalization_values() {
  for (flag, mode) in [
    ("auto", NormalizationMode::Auto),
    ("xyz", NormalizationMode::Xyz),
    ("xy", NormalizationMode::Xy),
    ("none", NormalizationMode::None),
  ] {
    let mut argv: Vec<&str> = REQUIRED.to_vec();
    argv.extend_from_slice(&["--normalization", flag]);
    assert_eq!(parse(&argv).to_params().normalization, mode, "flag {flag}");
  }
}

#[test]
fn test_missing_required_pattern_is_rejected() {
  let err = BakeArgs::try_parse_from(["bake", "--mesh", "mesh.obj"]);
  assert!(err.is_err());
}
