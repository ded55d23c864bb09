use super::*;

#[test]
fn test_grid_dim_adds_padding() {
  assert_eq!(grid_dim(8), 11);
  assert_eq!(grid_dim(32), 35);
  assert_eq!(GRID_PADDING, 3);
}

#[test]
fn test_coord_to_index_roundtrip() {
  let dim = grid_dim(5);
  for x in 0..dim {
    for y in 0..dim {
      for z in 0..dim {
        let idx = coord_to_index(x, y, z, dim);
        assert_eq!(
          index_to_coord(idx, dim),
          (x, y, z),
          "Roundtrip failed for ({}, {}, {})",
          x,
          y,
          z
        );
      }
    }
  }
}

#[test]
fn test_z_is_innermost() {
  let dim = 7;
  assert_eq!(coord_to_index(0, 0, 1, dim), 1);
  assert_eq!(coord_to_index(0, 1, 0, dim), dim);
  assert_eq!(coord_to_index(1, 0, 0, dim), dim * dim);
}

#[test]
fn test_corner_index_offsets() {
  let dim = 11;
  let offsets = corner_index_offsets(dim);
  assert_eq!(offsets[0], 0);
  assert_eq!(offsets[1], dim * dim);
  assert_eq!(offsets[2], dim);
  assert_eq!(offsets[4], 1);
  assert_eq!(offsets[7], dim * dim + dim + 1);
}

#[test]
fn test_capacity_for_is_power_of_two() {
  assert_eq!(capacity_for(0), 1);
  assert_eq!(capacity_for(1), 1);
  assert_eq!(capacity_for(3), 4);
  assert_eq!(capacity_for(64), 64);
  assert_eq!(capacity_for(65), 128);
  // 32³ voxels rounds to itself
  assert_eq!(capacity_for(32 * 32 * 32), 32768);
}

#[test]
fn test_max_resolution_keys_fit_u32() {
  let dim = grid_dim(MAX_RESOLUTION) as u64;
  assert!(3 * dim * dim * dim < u32::MAX as u64);
}
