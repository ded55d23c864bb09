//! Distance-to-LOD mapping and load range checks.
//!
//! ```text
//! offset   = (chunk_world - viewer) / chunk_size          per axis, in chunks
//! max_dist = clamp01(max(|offset.x| / load.x, |offset.y| / load.y, |offset.z| / load.z))
//! lod      = round(max_dist * (lod_count - 1))            0 = finest
//! ```

use glam::{IVec3, Vec3};

/// LOD index for a chunk at `chunk_world` seen from `viewer`.
///
/// Never exceeds `lod_count - 1`. Axes with a zero load distance count as
/// fully distant.
pub fn select_lod(chunk_world: Vec3, viewer: Vec3, chunk_size: f32, load_distance: IVec3, lod_count: usize) -> usize {
  if lod_count <= 1 {
    return 0;
  }

  let offset = ((chunk_world - viewer) / chunk_size).abs();
  let load = load_distance.as_vec3();

  let mut max_dist = 0.0f32;
  for axis in 0..3 {
    let normalized = if load[axis] > 0.0 { offset[axis] / load[axis] } else { 1.0 };
    max_dist = max_dist.max(normalized);
  }

  let max_lod = lod_count - 1;
  let lod = (max_dist.clamp(0.0, 1.0) * max_lod as f32).round() as usize;
  lod.min(max_lod)
}

/// Whether `chunk_world` lies within the load distance of `viewer` on all
/// three axes.
#[inline]
pub fn within_load_distance(chunk_world: Vec3, viewer: Vec3, load_extent: Vec3) -> bool {
  (chunk_world - viewer).abs().cmple(load_extent).all()
}
