//! Error kinds shared across the baking pipeline.

use thiserror::Error;

/// Main result type for the baking core.
pub type Result<T> = std::result::Result<T, N2dError>;

/// Error kinds surfaced by the baking core.
///
/// Selector-resolution and parameter-validation errors are raised before any
/// tile work starts; per-tile failures are collected according to the
/// configured [`TileFailurePolicy`](crate::types::TileFailurePolicy).
#[derive(Debug, Clone, Error)]
pub enum N2dError {
  #[error("io error: {0}")]
  Io(String),

  #[error("mesh parse error: {0}")]
  MeshParse(String),

  #[error("invalid asset: {0}")]
  InvalidAsset(String),

  #[error("invalid arguments: {0}")]
  InvalidArgs(String),

  #[error("incompatible textures: {0}")]
  IncompatibleTextures(String),

  #[error("ambiguous input: {0}")]
  AmbiguousInput(String),

  #[error("solver failed: {0}")]
  SolverFailed(String),

  #[error("cancelled by user")]
  UserCancelled,
}

impl From<std::io::Error> for N2dError {
  fn from(err: std::io::Error) -> Self {
    N2dError::Io(err.to_string())
  }
}
