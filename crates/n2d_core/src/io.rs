//! Collaborator seams for mesh import and image codecs.
//!
//! The core never parses mesh-file or image-file bytes itself. File formats
//! live behind these traits; `n2d_io` provides the production
//! implementations, tests provide in-memory fakes.

use std::path::Path;

use crate::error::Result;

/// Per-material facts taken verbatim from the source file's material table.
#[derive(Debug, Clone, Default)]
pub struct MaterialSource {
  /// Material name as authored.
  pub name: String,
  /// Normal-map path referenced by the material definition, if any.
  pub normal_map: Option<String>,
}

/// Triangle geometry handed over by a mesh importer.
///
/// Indices into `triangles` and `material_ids` are parallel: triangle `t`
/// uses material `material_ids[t]`. UV channels are per-vertex; a channel may
/// be empty when the source file does not carry it.
#[derive(Debug, Clone, Default)]
pub struct MeshGeometry {
  /// Vertex positions.
  pub positions: Vec<[f32; 3]>,
  /// Triangle vertex indices, one `[u32; 3]` per triangle.
  pub triangles: Vec<[u32; 3]>,
  /// Material index per triangle.
  pub material_ids: Vec<u32>,
  /// UV channels; each non-empty channel has one UV per vertex.
  pub uv_channels: Vec<Vec<[f32; 2]>>,
  /// Material table; order defines material indices.
  pub materials: Vec<MaterialSource>,
}

impl MeshGeometry {
  /// Returns the UV channel if present and fully populated.
  pub fn uv_channel(&self, channel: usize) -> Option<&[[f32; 2]]> {
    self
      .uv_channels
      .get(channel)
      .filter(|uvs| uvs.len() == self.positions.len())
      .map(|uvs| uvs.as_slice())
  }
}

/// Float pixel grid with interleaved channels.
///
/// LDR sources are normalized to `[0, 1]`; float sources pass through.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelGrid {
  pub width: u32,
  pub height: u32,
  pub channels: u32,
  /// Interleaved samples, `width * height * channels` values.
  pub data: Vec<f32>,
}

impl PixelGrid {
  /// Create a zero-filled grid.
  pub fn new(width: u32, height: u32, channels: u32) -> Self {
    Self {
      width,
      height,
      channels,
      data: vec![0.0; (width * height * channels) as usize],
    }
  }

  /// Sample channel `c` at pixel `(x, y)`.
  #[inline]
  pub fn sample(&self, x: u32, y: u32, c: u32) -> f32 {
    self.data[((y * self.width + x) * self.channels + c) as usize]
  }

  pub fn pixel_count(&self) -> usize {
    (self.width * self.height) as usize
  }
}

/// Mesh import collaborator. Failures surface as `MeshParseError`.
pub trait MeshImporter: Sync {
  fn import(&self, path: &Path) -> Result<MeshGeometry>;
}

/// Image read collaborator. Failures surface as `IoError`.
pub trait ImageReader: Sync {
  fn read(&self, path: &Path) -> Result<PixelGrid>;
}

/// Image write collaborator for floating-point output. Failures surface as
/// `IoError`.
pub trait ImageWriter: Sync {
  fn write(&self, path: &Path, grid: &PixelGrid) -> Result<()>;
}
