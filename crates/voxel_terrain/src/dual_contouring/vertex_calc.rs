//! Vertex placement for dual contouring cells.
//!
//! Each mixed cell gets one vertex at the average of its edge crossing
//! points (mass point).

use glam::Vec3A;

/// Precomputed corner positions within unit cube.
/// Layout matches corner index bits: corner i = (x=bit0, y=bit1, z=bit2)
pub const CORNER_POSITIONS: [Vec3A; 8] = [
  Vec3A::new(0.0, 0.0, 0.0), // 0b000
  Vec3A::new(1.0, 0.0, 0.0), // 0b001
  Vec3A::new(0.0, 1.0, 0.0), // 0b010
  Vec3A::new(1.0, 1.0, 0.0), // 0b011
  Vec3A::new(0.0, 0.0, 1.0), // 0b100
  Vec3A::new(1.0, 0.0, 1.0), // 0b101
  Vec3A::new(0.0, 1.0, 1.0), // 0b110
  Vec3A::new(1.0, 1.0, 1.0), // 0b111
];

/// The 12 cube edges as corner pairs, lower corner first.
pub const CUBE_EDGES: [[usize; 2]; 12] = [
  [0, 1], // X axis at Y=0, Z=0
  [0, 2], // Y axis at X=0, Z=0
  [0, 4], // Z axis at X=0, Y=0
  [1, 3], // Y axis at X=1, Z=0
  [1, 5], // Z axis at X=1, Y=0
  [2, 3], // X axis at Y=1, Z=0
  [2, 6], // Z axis at X=0, Y=1
  [3, 7], // Z axis at X=1, Y=1
  [4, 5], // X axis at Y=0, Z=1
  [4, 6], // Y axis at X=0, Z=1
  [5, 7], // Y axis at X=1, Z=1
  [6, 7], // X axis at Y=1, Z=1
];

/// Mass point of the crossings of `level` along the cell's edges, in unit
/// cube coordinates. Falls back to the cell center when nothing crosses.
#[inline]
pub fn mass_point(samples: &[f32; 8], level: f32) -> Vec3A {
  let mut sum = Vec3A::ZERO;
  let mut count = 0u32;

  for &[c0, c1] in &CUBE_EDGES {
    let s0 = samples[c0] - level;
    let s1 = samples[c1] - level;

    if (s0 < 0.0) != (s1 < 0.0) {
      let t = s0 / (s0 - s1);
      let p0 = CORNER_POSITIONS[c0];
      let p1 = CORNER_POSITIONS[c1];
      sum += p0 + t * (p1 - p0);
      count += 1;
    }
  }

  if count == 0 {
    return Vec3A::splat(0.5);
  }

  sum / count as f32
}

#[cfg(test)]
#[path = "vertex_calc_test.rs"]
mod vertex_calc_test;
