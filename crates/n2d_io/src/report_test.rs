use super::*;
use n2d_core::topology::{MaterialInfo, MeshTopology};
use n2d_core::types::Orientation;

fn sample_topology() -> MeshTopology {
  MeshTopology {
    materials: vec![MaterialInfo {
      index: 0,
      name: "skin".to_string(),
      uv_sets: vec!["UV0".to_string()],
      udim_tiles: vec![1001, 1002],
      normal_map: Some("skin_n.png".to_string()),
      orientation: Orientation {
        flip_u: false,
        flip_v: true,
        y_is_down: true,
      },
      overlapping_uvs: false,
    }],
  }
}

#[test]
fn test_render_report_includes_material_fields() {
  let json = render_report(&sample_topology()).unwrap();

  assert!(json.contains("\"name\": \"skin\""), "missing name in {json}");
  assert!(json.contains("\"udim_tiles\""), "missing tiles in {json}");
  assert!(json.contains("\"flip_v\": true"), "missing flattened orientation in {json}");
  assert!(json.contains("\"normal_map\": \"skin_n.png\""), "missing normal map in {json}");
}

#[test]
fn test_write_report_round_trips_through_disk() {
  let dir = std::env::temp_dir().join(format!("n2d_report_{}", std::process::id()));
  std::fs::create_dir_all(&dir).unwrap();
  let path = dir.join("inspect.json");

  write_report(&path, &sample_topology()).unwrap();

  let written = std::fs::read_to_string(&path).unwrap();
  assert_eq!(written, render_report(&sample_topology()).unwrap());

  let value: serde_json::Value = serde_json::from_str(&written).unwrap();
  assert_eq!(value["materials"][0]["udim_tiles"][1], 1002);

  let _ = std::fs::remove_dir_all(dir);
}
