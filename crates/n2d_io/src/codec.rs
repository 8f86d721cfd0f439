//! Image codecs: LDR/HDR reads through `image`, float EXR writes through
//! `exr`.
//!
//! Reads preserve the source channel count (two-channel BC5-style maps stay
//! two channels) and normalize integer samples to `[0, 1]`; float sources
//! pass through untouched. Writes always emit 32-bit float EXR regardless of
//! the path's extension.

use std::path::Path;

use exr::prelude::{
  AnyChannel, AnyChannels, FlatSamples, Image, Text, Vec2, WritableImage,
};
use image::DynamicImage;

use n2d_core::error::{N2dError, Result};
use n2d_core::io::{ImageReader, ImageWriter, PixelGrid};

/// Production image reader backed by the `image` crate (PNG, TIFF, EXR).
#[derive(Debug, Default)]
pub struct CodecReader;

impl CodecReader {
  pub fn new() -> Self {
    Self
  }
}

fn normalize_u8(data: Vec<u8>) -> Vec<f32> {
  data.into_iter().map(|v| v as f32 / 255.0).collect()
}

fn normalize_u16(data: Vec<u16>) -> Vec<f32> {
  data.into_iter().map(|v| v as f32 / 65535.0).collect()
}

fn grid_from(width: u32, height: u32, channels: u32, data: Vec<f32>) -> PixelGrid {
  PixelGrid {
    width,
    height,
    channels,
    data,
  }
}

impl ImageReader for CodecReader {
  fn read(&self, path: &Path) -> Result<PixelGrid> {
    let img = image::open(path)
      .map_err(|err| N2dError::Io(format!("{}: {err}", path.display())))?;
    let (width, height) = (img.width(), img.height());

    let grid = match img {
      DynamicImage::ImageLuma8(buf) => grid_from(width, height, 1, normalize_u8(buf.into_raw())),
      DynamicImage::ImageLumaA8(buf) => grid_from(width, height, 2, normalize_u8(buf.into_raw())),
      DynamicImage::ImageRgb8(buf) => grid_from(width, height, 3, normalize_u8(buf.into_raw())),
      DynamicImage::ImageRgba8(buf) => grid_from(width, height, 4, normalize_u8(buf.into_raw())),
      DynamicImage::ImageLuma16(buf) => grid_from(width, height, 1, normalize_u16(buf.into_raw())),
      DynamicImage::ImageLumaA16(buf) => {
        grid_from(width, height, 2, normalize_u16(buf.into_raw()))
      }
      DynamicImage::ImageRgb16(buf) => grid_from(width, height, 3, normalize_u16(buf.into_raw())),
      DynamicImage::ImageRgba16(buf) => grid_from(width, height, 4, normalize_u16(buf.into_raw())),
      DynamicImage::ImageRgb32F(buf) => grid_from(width, height, 3, buf.into_raw()),
      DynamicImage::ImageRgba32F(buf) => grid_from(width, height, 4, buf.into_raw()),
      other => grid_from(width, height, 4, other.to_rgba32f().into_raw()),
    };

    log::debug!(
      "read {}: {}x{}, {} channel(s)",
      path.display(),
      grid.width,
      grid.height,
      grid.channels
    );
    Ok(grid)
  }
}

/// Production float image writer emitting EXR.
#[derive(Debug, Default)]
pub struct ExrWriter;

impl ExrWriter {
  pub fn new() -> Self {
    Self
  }
}

/// EXR channel names by channel count. Scalar output is luminance, not
/// depth.
fn channel_names(channels: u32) -> Result<&'static [&'static str]> {
  match channels {
    1 => Ok(&["Y"]),
    2 => Ok(&["R", "G"]),
    3 => Ok(&["R", "G", "B"]),
    4 => Ok(&["R", "G", "B", "A"]),
    other => Err(N2dError::Io(format!(
      "unsupported EXR channel count: {other}"
    ))),
  }
}

impl ImageWriter for ExrWriter {
  fn write(&self, path: &Path, grid: &PixelGrid) -> Result<()> {
    if grid.width == 0 || grid.height == 0 {
      return Err(N2dError::Io(format!(
        "refusing to write empty image to {}",
        path.display()
      )));
    }
    let names = channel_names(grid.channels)?;
    let stride = grid.channels as usize;

    let mut list = Vec::with_capacity(names.len());
    for (c, name) in names.iter().enumerate() {
      let samples: Vec<f32> = grid.data.iter().skip(c).step_by(stride).copied().collect();
      let name = Text::new_or_none(name)
        .ok_or_else(|| N2dError::Io(format!("invalid EXR channel name: {name}")))?;
      list.push(AnyChannel {
        name,
        sample_data: FlatSamples::F32(samples),
        quantize_linearly: false,
        sampling: Vec2(1, 1),
      });
    }

    let image = Image::from_channels(
      (grid.width as usize, grid.height as usize),
      AnyChannels::sort(list.into()),
    );
    image
      .write()
      .to_file(path)
      .map_err(|err| N2dError::Io(format!("{}: {err}", path.display())))?;

    log::debug!("wrote {}", path.display());
    Ok(())
  }
}

#[cfg(test)]
#[path = "codec_test.rs"]
mod codec_test;
