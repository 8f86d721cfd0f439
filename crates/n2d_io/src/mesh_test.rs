use std::path::PathBuf;

use super::*;
use n2d_core::topology;

/// Writes an OBJ (and optional MTL) fixture under a per-test temp dir.
fn write_fixture(tag: &str, obj: &str, mtl: Option<&str>) -> PathBuf {
  let dir = std::env::temp_dir().join(format!("n2d_obj_{tag}_{}", std::process::id()));
  std::fs::create_dir_all(&dir).unwrap();
  if let Some(mtl) = mtl {
    std::fs::write(dir.join("fixture.mtl"), mtl).unwrap();
  }
  let path = dir.join("fixture.obj");
  std::fs::write(&path, obj).unwrap();
  path
}

const QUAD_OBJ: &str = "\
mtllib fixture.mtl
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0.1 0.1
vt 0.9 0.1
vt 0.9 0.9
vt 0.1 0.9
usemtl skin
f 1/1 2/2 3/3 4/4
";

const QUAD_MTL: &str = "\
newmtl skin
map_bump skin_n.png
";

#[test]
fn test_import_triangulates_and_indexes() {
  let path = write_fixture("quad", QUAD_OBJ, Some(QUAD_MTL));
  let geometry = ObjImporter::new().import(&path).unwrap();

  assert_eq!(geometry.positions.len(), 4);
  assert_eq!(geometry.triangles.len(), 2, "quad must triangulate into 2 faces");
  assert_eq!(geometry.material_ids.len(), geometry.triangles.len());
  assert_eq!(geometry.uv_channels.len(), 1);
  assert_eq!(geometry.uv_channels[0].len(), geometry.positions.len());

  for tri in &geometry.triangles {
    for &i in tri {
      assert!((i as usize) < geometry.positions.len(), "index {i} out of range");
    }
  }
}

#[test]
fn test_import_reads_material_table() {
  let path = write_fixture("mtl", QUAD_OBJ, Some(QUAD_MTL));
  let geometry = ObjImporter::new().import(&path).unwrap();

  assert_eq!(geometry.materials.len(), 1);
  assert_eq!(geometry.materials[0].name, "skin");
  assert_eq!(geometry.materials[0].normal_map.as_deref(), Some("skin_n.png"));
}

#[test]
fn test_missing_mtl_degrades_to_no_materials() {
  let path = write_fixture("nomtl", QUAD_OBJ, None);
  let geometry = ObjImporter::new().import(&path).unwrap();

  assert!(geometry.materials.is_empty());
  assert_eq!(geometry.triangles.len(), 2);
}

#[test]
fn test_mesh_without_texcoords_has_no_uv_channels() {
  let obj = "\
v 0 0 0
v 1 0 0
v 0 1 0
f 1 2 3
";
  let path = write_fixture("nouv", obj, None);
  let geometry = ObjImporter::new().import(&path).unwrap();

  assert!(geometry.uv_channels.is_empty());
  assert_eq!(geometry.triangles.len(), 1);
}

#[test]
fn test_missing_file_is_a_parse_error() {
  let err = ObjImporter::new()
    .import(std::path::Path::new("/nonexistent/fixture.obj"))
    .unwrap_err();
  assert!(matches!(err, n2d_core::error::N2dError::MeshParse(_)));
}

#[test]
fn test_imported_quad_analyzes_right_handed() {
  let path = write_fixture("analyze", QUAD_OBJ, Some(QUAD_MTL));
  let geometry = ObjImporter::new().import(&path).unwrap();
  let report = topology::analyze(&geometry, 0).unwrap();

  assert_eq!(report.materials.len(), 1);
  let material = &report.materials[0];
  assert_eq!(material.name, "skin");
  assert!(!material.orientation.flip_u);
  assert!(!material.orientation.flip_v);
  assert_eq!(material.udim_tiles, vec![1001]);
}

#[test]
fn test_mirrored_quad_analyzes_flipped() {
  // V texcoords mirrored relative to the winding order.
  let obj = "\
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0.1 0.9
vt 0.9 0.9
vt 0.9 0.1
vt 0.1 0.1
f 1/1 2/2 3/3 4/4
";
  let path = write_fixture("mirror", obj, None);
  let geometry = ObjImporter::new().import(&path).unwrap();
  let report = topology::analyze(&geometry, 0).unwrap();

  let material = &report.materials[0];
  assert!(material.orientation.flip_u);
  assert!(material.orientation.flip_v);
}
