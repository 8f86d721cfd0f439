//! OBJ mesh import.
//!
//! Loads Wavefront OBJ files (with their sibling MTL material tables)
//! through `tobj` and flattens every model into one [`MeshGeometry`]. Faces
//! are triangulated at load time; vertices are re-indexed to a single index
//! stream so positions and texcoords stay parallel.

use std::path::Path;

use n2d_core::error::{N2dError, Result};
use n2d_core::io::{MaterialSource, MeshGeometry, MeshImporter};

/// Production mesh importer backed by `tobj`.
#[derive(Debug, Default)]
pub struct ObjImporter;

impl ObjImporter {
  pub fn new() -> Self {
    Self
  }
}

const LOAD_OPTIONS: tobj::LoadOptions = tobj::LoadOptions {
  single_index: true,
  triangulate: true,
  ignore_points: true,
  ignore_lines: true,
};

impl MeshImporter for ObjImporter {
  fn import(&self, path: &Path) -> Result<MeshGeometry> {
    let (models, materials) = tobj::load_obj(path, &LOAD_OPTIONS)
      .map_err(|err| N2dError::MeshParse(format!("{}: {err}", path.display())))?;

    let mut geometry = MeshGeometry::default();

    match materials {
      Ok(materials) => {
        for m in materials {
          geometry.materials.push(MaterialSource {
            name: m.name,
            normal_map: m.normal_texture,
          });
        }
      }
      // A broken MTL degrades to synthesized material names downstream.
      Err(err) => log::warn!("material table skipped for {}: {err}", path.display()),
    }

    geometry.uv_channels.push(Vec::new());
    let mut any_texcoords = false;

    for model in models {
      let mesh = model.mesh;
      let base = geometry.positions.len() as u32;

      for p in mesh.positions.chunks_exact(3) {
        geometry.positions.push([p[0], p[1], p[2]]);
      }

      if mesh.texcoords.is_empty() {
        // Keep the channel parallel to positions; a fully absent channel is
        // detected below.
        geometry.uv_channels[0]
          .extend(std::iter::repeat([0.0, 0.0]).take(mesh.positions.len() / 3));
      } else {
        any_texcoords = true;
        for uv in mesh.texcoords.chunks_exact(2) {
          geometry.uv_channels[0].push([uv[0], uv[1]]);
        }
      }

      let material_id = mesh.material_id.map(|m| m as u32).unwrap_or(0);
      for tri in mesh.indices.chunks_exact(3) {
        geometry
          .triangles
          .push([base + tri[0], base + tri[1], base + tri[2]]);
        geometry.material_ids.push(material_id);
      }
    }

    if !any_texcoords {
      geometry.uv_channels.clear();
    }

    log::debug!(
      "imported {}: {} vertices, {} triangles, {} materials",
      path.display(),
      geometry.positions.len(),
      geometry.triangles.len(),
      geometry.materials.len()
    );
    Ok(geometry)
  }
}

#[cfg(test)]
#[path = "mesh_test.rs"]
mod mesh_test;
