//! Content-addressed height-field cache.
//!
//! Keys are blake3 fingerprints over everything that affects a tile's solve:
//! normal-map bytes, resolved orientation, and the numeric bake parameters.
//! A guarded in-memory map serves repeat lookups within a batch; disk entries
//! are flat binary files, `width`/`height` as little-endian u32 followed by
//! raw little-endian f32 samples. The map lock is held only for map access,
//! never across a solve or a file read.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::types::HeightField;

/// Fingerprint of one tile's bake inputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheKey(blake3::Hash);

impl CacheKey {
  pub fn hex(&self) -> String {
    self.0.to_hex().to_string()
  }

  fn bytes(&self) -> [u8; 32] {
    *self.0.as_bytes()
  }
}

/// Incremental key builder. Every field is length-prefixed so adjacent
/// updates cannot collide by concatenation.
#[derive(Default)]
pub struct KeyHasher {
  inner: blake3::Hasher,
}

impl KeyHasher {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn bytes(&mut self, field: &[u8]) -> &mut Self {
    self.inner.update(&(field.len() as u64).to_le_bytes());
    self.inner.update(field);
    self
  }

  pub fn f32(&mut self, value: f32) -> &mut Self {
    self.bytes(&value.to_le_bytes())
  }

  pub fn u32(&mut self, value: u32) -> &mut Self {
    self.bytes(&value.to_le_bytes())
  }

  pub fn flag(&mut self, value: bool) -> &mut Self {
    self.bytes(&[u8::from(value)])
  }

  pub fn finish(&self) -> CacheKey {
    CacheKey(self.inner.finalize())
  }
}

/// Two-level tile cache: a guarded in-memory map in front of a disk
/// directory. With no directory configured the cache is inert and every
/// lookup misses.
#[derive(Debug, Default)]
pub struct TileCache {
  dir: Option<PathBuf>,
  index: Mutex<HashMap<[u8; 32], HeightField>>,
}

impl TileCache {
  pub fn new(dir: Option<PathBuf>) -> Self {
    Self {
      dir,
      index: Mutex::new(HashMap::new()),
    }
  }

  pub fn enabled(&self) -> bool {
    self.dir.is_some()
  }

  fn entry_path(&self, key: &CacheKey) -> Option<PathBuf> {
    self.dir.as_ref().map(|d| d.join(format!("{}.bin", key.hex())))
  }

  /// Look up a height field. Corrupt or unreadable disk entries count as
  /// misses.
  pub fn get(&self, key: &CacheKey) -> Option<HeightField> {
    self.dir.as_ref()?;
    if let Ok(index) = self.index.lock() {
      if let Some(field) = index.get(&key.bytes()) {
        return Some(field.clone());
      }
    }

    let path = self.entry_path(key)?;
    let bytes = fs::read(&path).ok()?;
    match decode_entry(&bytes) {
      Some(field) => {
        log::debug!("cache hit: {}", path.display());
        if let Ok(mut index) = self.index.lock() {
          index.insert(key.bytes(), field.clone());
        }
        Some(field)
      }
      None => {
        log::warn!("discarding corrupt cache entry: {}", path.display());
        None
      }
    }
  }

  /// Store a height field. Disk failures are logged and swallowed.
  pub fn put(&self, key: &CacheKey, field: &HeightField) {
    let Some(path) = self.entry_path(key) else {
      return;
    };
    if let Ok(mut index) = self.index.lock() {
      index.insert(key.bytes(), field.clone());
    }
    if let Err(err) = write_entry(&path, field) {
      log::warn!("cache store failed for {}: {err}", path.display());
    }
  }
}

fn write_entry(path: &Path, field: &HeightField) -> std::io::Result<()> {
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent)?;
  }
  let mut bytes = Vec::with_capacity(8 + field.data.len() * 4);
  bytes.extend_from_slice(&field.width.to_le_bytes());
  bytes.extend_from_slice(&field.height.to_le_bytes());
  for &v in &field.data {
    bytes.extend_from_slice(&v.to_le_bytes());
  }
  fs::write(path, bytes)
}

fn decode_entry(bytes: &[u8]) -> Option<HeightField> {
  if bytes.len() < 8 {
    return None;
  }
  let width = u32::from_le_bytes(bytes[0..4].try_into().ok()?);
  let height = u32::from_le_bytes(bytes[4..8].try_into().ok()?);
  let expected = (width as usize).checked_mul(height as usize)?.checked_mul(4)?;
  let payload = &bytes[8..];
  if payload.len() != expected {
    return None;
  }
  let data = payload
    .chunks_exact(4)
    .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
    .collect();
  Some(HeightField {
    width,
    height,
    data,
  })
}

#[cfg(test)]
#[path = "cache_test.rs"]
mod cache_test;
