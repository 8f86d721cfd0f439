//! Inspection report rendering.
//!
//! Serializes a [`MeshTopology`] to pretty-printed JSON, either as a string
//! for stdout or straight to a file.

use std::path::Path;

use n2d_core::error::{N2dError, Result};
use n2d_core::topology::MeshTopology;

/// Renders the topology report as pretty-printed JSON.
pub fn render_report(topology: &MeshTopology) -> Result<String> {
  serde_json::to_string_pretty(topology)
    .map_err(|err| N2dError::Io(format!("report serialization failed: {err}")))
}

/// Writes the topology report to `path` as pretty-printed JSON.
pub fn write_report(path: &Path, topology: &MeshTopology) -> Result<()> {
  let json = render_report(topology)?;
  std::fs::write(path, json)
    .map_err(|err| N2dError::Io(format!("{}: {err}", path.display())))?;
  log::debug!("wrote report {}", path.display());
  Ok(())
}

#[cfg(test)]
#[path = "report_test.rs"]
mod report_test;
