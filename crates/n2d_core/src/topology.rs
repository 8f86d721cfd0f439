//! Mesh UV/tangent-space topology analysis.
//!
//! Derives per-material UV-set lists, UDIM tile sets, mirrored-island
//! orientation and overlap flags from raw triangle geometry. All of it is a
//! pure pass over the mesh; the only I/O is the optional Y-convention guess,
//! which samples the material's normal map through the [`ImageReader`]
//! collaborator.

use std::collections::HashSet;
use std::path::Path;

use glam::{Vec2, Vec3};
use serde::Serialize;

use crate::error::{N2dError, Result};
use crate::io::{ImageReader, MeshGeometry, MeshImporter};
use crate::types::Orientation;

/// Overlap-detection grid cells per unit UV square.
///
/// Heuristic constant: overlaps smaller than one cell go undetected, which is
/// acceptable for advisory output. Tunable, not derived.
pub const OVERLAP_GRID: u32 = 1024;

/// UV-area degeneracy threshold; triangles below it carry no orientation
/// vote.
const DEGENERATE_UV_AREA: f32 = 1e-8;

/// Everything the pipeline knows about one material.
#[derive(Clone, Debug, Default, Serialize)]
pub struct MaterialInfo {
  pub index: u32,
  pub name: String,
  pub uv_sets: Vec<String>,
  pub udim_tiles: Vec<u32>,
  /// Normal-map path from the material table, if any.
  pub normal_map: Option<String>,
  #[serde(flatten)]
  pub orientation: Orientation,
  /// Advisory flag: two triangles landed in the same discretized UV cell.
  pub overlapping_uvs: bool,
}

/// Analysis product: one entry per material index referenced by the mesh.
#[derive(Clone, Debug, Default, Serialize)]
pub struct MeshTopology {
  pub materials: Vec<MaterialInfo>,
}

impl MeshTopology {
  pub fn material(&self, index: u32) -> Option<&MaterialInfo> {
    self.materials.iter().find(|m| m.index == index)
  }
}

/// Per-axis mirrored-orientation vote counts, folded across all
/// non-degenerate triangles of a material.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OrientationCounts {
  pub flip_u: u32,
  pub flip_v: u32,
  pub total: u32,
}

impl OrientationCounts {
  fn merge(self, vote: TriangleVote) -> Self {
    Self {
      flip_u: self.flip_u + u32::from(vote.flip_u),
      flip_v: self.flip_v + u32::from(vote.flip_v),
      total: self.total + 1,
    }
  }

  /// Majority rule: an axis flips iff more than half of the votes agree.
  pub fn decide(self) -> (bool, bool) {
    if self.total == 0 {
      return (false, false);
    }
    (self.flip_u > self.total / 2, self.flip_v > self.total / 2)
  }
}

/// One non-degenerate triangle's orientation vote.
#[derive(Clone, Copy, Debug)]
struct TriangleVote {
  flip_u: bool,
  flip_v: bool,
}

/// Compute the orientation vote for a single triangle, or `None` when its UV
/// area is degenerate.
///
/// The tangent/bitangent basis comes from the UV-to-position affine map. A
/// triangle is mirrored when `(T × B) · N` is negative; a mirrored triangle
/// votes for each single-axis flip that restores a right-handed frame.
fn orientation_vote(positions: [Vec3; 3], uvs: [Vec2; 3]) -> Option<TriangleVote> {
  let e1 = positions[1] - positions[0];
  let e2 = positions[2] - positions[0];
  let normal = e1.cross(e2);

  let duv1 = uvs[1] - uvs[0];
  let duv2 = uvs[2] - uvs[0];
  let det = duv1.x * duv2.y - duv1.y * duv2.x;
  if det.abs() < DEGENERATE_UV_AREA {
    return None;
  }

  let inv = 1.0 / det;
  let tangent = (e1 * duv2.y - e2 * duv1.y) * inv;
  let bitangent = (e2 * duv1.x - e1 * duv2.x) * inv;

  let mirrored = tangent.cross(bitangent).dot(normal) < 0.0;
  if !mirrored {
    return Some(TriangleVote {
      flip_u: false,
      flip_v: false,
    });
  }
  Some(TriangleVote {
    flip_u: (-tangent).cross(bitangent).dot(normal) > 0.0,
    flip_v: tangent.cross(-bitangent).dot(normal) > 0.0,
  })
}

/// UDIM tile id for a UV coordinate: `1001 + floor(u) + 10 * floor(v)`.
#[inline]
pub fn udim_tile(uv: [f32; 2]) -> u32 {
  let tile_u = uv[0].floor() as i32;
  let tile_v = uv[1].floor() as i32;
  (1001 + tile_u + tile_v * 10) as u32
}

/// Analyze mesh geometry against one UV channel.
///
/// Produces one [`MaterialInfo`] per material-table entry, plus synthesized
/// entries for triangle material indices past the table. Tile sets use
/// per-vertex UV membership so tiles touched only at a corner are kept.
pub fn analyze(geometry: &MeshGeometry, uv_channel: usize) -> Result<MeshTopology> {
  if geometry.triangles.len() != geometry.material_ids.len() {
    return Err(N2dError::InvalidAsset(format!(
      "triangle/material count mismatch: {} triangles, {} material ids",
      geometry.triangles.len(),
      geometry.material_ids.len()
    )));
  }

  let uvs = geometry.uv_channel(uv_channel);
  let uv_sets: Vec<String> = geometry
    .uv_channels
    .iter()
    .enumerate()
    .filter(|(_, ch)| !ch.is_empty())
    .map(|(i, _)| format!("UV{i}"))
    .collect();

  let table_len = geometry.materials.len() as u32;
  let max_referenced = geometry.material_ids.iter().copied().max().map(|m| m + 1);
  let material_count = max_referenced.unwrap_or(0).max(table_len);

  let mut materials = Vec::with_capacity(material_count as usize);
  for index in 0..material_count {
    let source = geometry.materials.get(index as usize);
    let mut info = MaterialInfo {
      index,
      name: source
        .map(|s| s.name.clone())
        .unwrap_or_else(|| format!("material_{index}")),
      uv_sets: uv_sets.clone(),
      normal_map: source.and_then(|s| s.normal_map.clone()),
      ..MaterialInfo::default()
    };

    if let Some(uvs) = uvs {
      let mut tiles: HashSet<u32> = HashSet::new();
      let mut seen_cells: HashSet<u64> = HashSet::new();
      let mut counts = OrientationCounts::default();

      for (tri, &mat) in geometry.triangles.iter().zip(&geometry.material_ids) {
        if mat != index {
          continue;
        }
        let p = [
          Vec3::from(geometry.positions[tri[0] as usize]),
          Vec3::from(geometry.positions[tri[1] as usize]),
          Vec3::from(geometry.positions[tri[2] as usize]),
        ];
        let t_uv = [
          Vec2::from(uvs[tri[0] as usize]),
          Vec2::from(uvs[tri[1] as usize]),
          Vec2::from(uvs[tri[2] as usize]),
        ];

        for uv in &t_uv {
          tiles.insert(udim_tile([uv.x, uv.y]));
        }

        if let Some(vote) = orientation_vote(p, t_uv) {
          counts = counts.merge(vote);
        }

        let centroid = (t_uv[0] + t_uv[1] + t_uv[2]) / 3.0;
        let cu = (centroid.x * OVERLAP_GRID as f32).floor() as i64;
        let cv = (centroid.y * OVERLAP_GRID as f32).floor() as i64;
        let key = ((cu as u64) << 32) ^ (cv as u32 as u64);
        if !seen_cells.insert(key) {
          info.overlapping_uvs = true;
        }
      }

      info.udim_tiles = tiles.into_iter().collect();
      info.udim_tiles.sort_unstable();
      let (flip_u, flip_v) = counts.decide();
      info.orientation.flip_u = flip_u;
      info.orientation.flip_v = flip_v;
    }

    materials.push(info);
  }

  Ok(MeshTopology { materials })
}

/// Guess the normal map's Y convention from its green-channel average.
///
/// An average below the midpoint implies most normals point "down" in Y,
/// i.e. a DirectX-style map. Advisory only; an explicit override wins.
pub fn guess_y_down(grid: &crate::io::PixelGrid) -> bool {
  if grid.channels < 2 || grid.pixel_count() == 0 {
    return false;
  }
  let mut sum = 0.0f64;
  for i in 0..grid.pixel_count() {
    sum += grid.data[i * grid.channels as usize + 1] as f64;
  }
  sum / (grid.pixel_count() as f64) < 0.5
}

/// Inspect a mesh through the collaborators: import, analyze channel 0, and
/// fill in each material's advisory Y convention from its normal map.
///
/// A normal map that cannot be read leaves `y_is_down` at its default rather
/// than failing the inspection.
pub fn inspect(
  mesh_path: &Path,
  importer: &dyn MeshImporter,
  reader: &dyn ImageReader,
) -> Result<MeshTopology> {
  let geometry = importer.import(mesh_path)?;
  let mut topology = analyze(&geometry, 0)?;

  for material in &mut topology.materials {
    let Some(map) = material.normal_map.clone() else {
      continue;
    };
    match reader.read(Path::new(&map)) {
      Ok(grid) => material.orientation.y_is_down = guess_y_down(&grid),
      Err(err) => log::debug!("y-convention guess skipped for {map}: {err}"),
    }
  }

  Ok(topology)
}

#[cfg(test)]
#[path = "topology_test.rs"]
mod topology_test;
