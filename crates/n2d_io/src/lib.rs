//! n2d_io - File-format collaborators for the baking core
//!
//! Production implementations of the [`n2d_core::io`] traits: OBJ mesh
//! import through `tobj`, LDR/HDR image reads through the `image` crate, and
//! floating-point EXR output through `exr`. Everything here converts between
//! file formats and the core's in-memory types; no baking logic lives in
//! this crate.

pub mod mesh;
pub use mesh::ObjImporter;

pub mod codec;
pub use codec::{CodecReader, ExrWriter};

pub mod report;
pub use report::{render_report, write_report};
