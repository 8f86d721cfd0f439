use super::*;

fn sample_field() -> HeightField {
  HeightField {
    width: 2,
    height: 2,
    data: vec![0.0, 1.5, -2.25, 0.125],
  }
}

fn sample_key(tag: &[u8]) -> CacheKey {
  let mut hasher = KeyHasher::new();
  hasher.bytes(tag).f32(1.0).flag(true);
  hasher.finish()
}

#[test]
fn test_keys_are_stable_and_input_sensitive() {
  assert_eq!(sample_key(b"a"), sample_key(b"a"));
  assert_ne!(sample_key(b"a"), sample_key(b"b"));

  let mut base = KeyHasher::new();
  base.bytes(b"a").flag(false);
  let mut flipped = KeyHasher::new();
  flipped.bytes(b"a").flag(true);
  assert_ne!(base.finish(), flipped.finish());
}

#[test]
fn test_field_boundaries_do_not_collide() {
  let mut ab_c = KeyHasher::new();
  ab_c.bytes(b"ab").bytes(b"c");
  let mut a_bc = KeyHasher::new();
  a_bc.bytes(b"a").bytes(b"bc");
  assert_ne!(ab_c.finish(), a_bc.finish());
}

#[test]
fn test_disabled_cache_always_misses() {
  let cache = TileCache::new(None);
  let key = sample_key(b"tile");

  assert!(!cache.enabled());
  cache.put(&key, &sample_field());
  assert!(cache.get(&key).is_none());
}

#[test]
fn test_store_then_load_round_trips() {
  let dir = std::env::temp_dir().join(format!("n2d_cache_test_{}", std::process::id()));
  let cache = TileCache::new(Some(dir.clone()));
  let key = sample_key(b"round-trip");

  assert!(cache.get(&key).is_none());
  cache.put(&key, &sample_field());
  assert_eq!(cache.get(&key), Some(sample_field()));

  // A second cache over the same directory reads the disk entry
  let reopened = TileCache::new(Some(dir.clone()));
  assert_eq!(reopened.get(&key), Some(sample_field()));

  let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn test_corrupt_entry_is_a_miss() {
  let dir = std::env::temp_dir().join(format!("n2d_cache_corrupt_{}", std::process::id()));
  std::fs::create_dir_all(&dir).unwrap();
  let cache = TileCache::new(Some(dir.clone()));
  let key = sample_key(b"corrupt");

  std::fs::write(dir.join(format!("{}.bin", key.hex())), b"short").unwrap();
  assert!(cache.get(&key).is_none());

  let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn test_entry_decode_checks_payload_length() {
  let mut bytes = Vec::new();
  bytes.extend_from_slice(&2u32.to_le_bytes());
  bytes.extend_from_slice(&2u32.to_le_bytes());
  bytes.extend_from_slice(&[0u8; 12]); // 3 floats, grid needs 4
  assert!(decode_entry(&bytes).is_none());

  bytes.extend_from_slice(&[0u8; 4]);
  let field = decode_entry(&bytes).unwrap();
  assert_eq!(field.width, 2);
  assert_eq!(field.data, vec![0.0; 4]);
}
