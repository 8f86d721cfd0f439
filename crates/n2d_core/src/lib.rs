//! n2d_core - Normal-map to displacement-map baking
//!
//! This crate converts tangent-space normal maps into scalar displacement
//! maps by integrating the slope field implied by the normals. The pipeline
//! runs per UDIM tile: decode normals, derive height gradients, solve the
//! discrete Poisson equation, write a floating-point height map.
//!
//! # Features
//!
//! - **Mesh topology analysis**: Per-material UV sets, UDIM tile sets,
//!   mirrored-island detection and UV-overlap flags
//! - **Poisson height reconstruction**: Sparse conjugate-gradient solve with
//!   an optional bit-deterministic mode
//! - **Content-addressed caching**: blake3-keyed height-field reuse across
//!   bakes
//! - **Collaborator seams**: Mesh import and image codecs stay behind
//!   traits, so the core never touches file formats
//!
//! # Example
//!
//! ```ignore
//! use n2d_core::{bake, BakeParams, CancelToken};
//!
//! let params = BakeParams::new()
//!     .with_amplitude_mm(2.5)
//!     .with_deterministic(true);
//!
//! let result = bake::bake(&params, &importer, &reader, &writer, &CancelToken::new())?;
//! for line in &result.log_lines {
//!     println!("{line}");
//! }
//! ```

pub mod error;
pub mod io;
pub mod types;

// Re-export commonly used items
pub use error::{N2dError, Result};
pub use io::{ImageReader, ImageWriter, MaterialSource, MeshGeometry, MeshImporter, PixelGrid};
pub use types::{
  BakeParams, BakeResult, CancelToken, GradientField, HeightBias, HeightField,
  NormalizationMode, Orientation, TileFailurePolicy,
};

// Mesh UV/tangent-space analysis
pub mod topology;
pub use topology::{MaterialInfo, MeshTopology};

// Normal-map sample decoding
pub mod decode;

// Height-gradient construction
pub mod gradient;

// Poisson height reconstruction
pub mod solver;
pub use solver::SolverConfig;

// Content-addressed height-field cache
pub mod cache;
pub use cache::{CacheKey, KeyHasher, TileCache};

// Bake orchestration
pub mod bake;
pub use bake::{expand_udim, UDIM_TOKEN};
