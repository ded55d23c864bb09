use super::*;

// =========================================================================
// Validation
// =========================================================================

#[test]
fn test_default_is_valid() {
  assert_eq!(StreamConfig::default().validate(), Ok(()));
}

#[test]
fn test_empty_lod_table_rejected() {
  let config = StreamConfig::default().with_lod_resolutions(Vec::<usize>::new());
  assert_eq!(config.validate(), Err(ConfigError::NoLodResolutions));
}

#[test]
fn test_zero_resolution_rejected() {
  let config = StreamConfig::default().with_lod_resolutions([16, 0]);
  assert_eq!(config.validate(), Err(ConfigError::ZeroResolution(1)));
}

/// Finest first: a later LOD may not be finer than an earlier one.
#[test]
fn test_unordered_lods_rejected() {
  let config = StreamConfig::default().with_lod_resolutions([8, 16]);
  assert_eq!(
    config.validate(),
    Err(ConfigError::UnorderedLods { previous: 8, next: 16 })
  );

  let repeated = StreamConfig::default().with_lod_resolutions([16, 16, 8]);
  assert_eq!(repeated.validate(), Ok(()));
}

#[test]
fn test_oversized_resolution_rejected() {
  let config = StreamConfig::default().with_lod_resolutions([MAX_RESOLUTION + 1]);
  assert!(matches!(
    config.validate(),
    Err(ConfigError::Extract(ExtractError::InvalidResolution { .. }))
  ));
}

#[test]
fn test_invalid_chunk_size_rejected() {
  for size in [0.0, -4.0, f32::NAN, f32::INFINITY] {
    let config = StreamConfig::default().with_chunk_size(size);
    assert!(matches!(config.validate(), Err(ConfigError::InvalidChunkSize(_))), "{}", size);
  }
}

#[test]
fn test_zero_batch_cube_rejected() {
  let config = StreamConfig::default().with_batch_cube_size(0);
  assert_eq!(config.validate(), Err(ConfigError::ZeroBatchCube));
}

#[test]
fn test_load_distance_sign() {
  let negative = StreamConfig::default().with_load_distance(IVec3::new(1, -1, 1));
  assert_eq!(
    negative.validate(),
    Err(ConfigError::NegativeLoadDistance(IVec3::new(1, -1, 1)))
  );

  let zero = StreamConfig::default().with_load_distance(IVec3::new(0, 1, 1));
  assert_eq!(zero.validate(), Ok(()));
}

// =========================================================================
// Derived values
// =========================================================================

#[test]
fn test_resolution_for_clamps() {
  let config = StreamConfig::default().with_lod_resolutions([32, 16, 8]);
  assert_eq!(config.resolution_for(0), 32);
  assert_eq!(config.resolution_for(2), 8);
  assert_eq!(config.resolution_for(99), 8);
}

#[test]
fn test_voxel_size() {
  let config = StreamConfig::default().with_chunk_size(32.0);
  assert_eq!(config.voxel_size(32), 1.0);
  assert_eq!(config.voxel_size(8), 4.0);
}

#[test]
fn test_batch_capacity_and_extent() {
  let config = StreamConfig::default()
    .with_batch_cube_size(3)
    .with_chunk_size(10.0)
    .with_load_distance(IVec3::new(1, 2, 3));
  assert_eq!(config.batch_capacity(), 27);
  assert_eq!(config.load_extent(), glam::Vec3::new(10.0, 20.0, 30.0));
}
