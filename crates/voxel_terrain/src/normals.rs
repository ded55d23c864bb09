//! Vertex normal passes run after vertex placement.
//!
//! Gradient normals point from inside (below the level) toward outside, so
//! they agree with the outward face orientation of both extractors.

use glam::{Vec3, Vec3A};
use rayon::prelude::*;

use crate::grid::DensityGrid;
use crate::types::NormalMode;

const UP: [f32; 3] = [0.0, 1.0, 0.0];

/// Normalize, falling back to up for degenerate input.
#[inline]
fn normalize_or_up(v: Vec3A) -> [f32; 3] {
  let len_sq = v.length_squared();
  if len_sq < 1e-12 {
    return UP;
  }
  (v * len_sq.sqrt().recip()).to_array()
}

/// Compute normals for `vertices` according to `mode`.
pub fn compute(
  mode: NormalMode,
  grid: &DensityGrid,
  vertices: &[[f32; 3]],
  indices: &[u32],
) -> Vec<[f32; 3]> {
  let _span = tracing::trace_span!("normals", ?mode, vertices = vertices.len()).entered();

  match mode {
    NormalMode::Gradient => from_gradient(grid, vertices),
    NormalMode::Geometry => from_geometry(vertices, indices),
  }
}

/// Density gradient interpolated at each vertex.
pub fn from_gradient(grid: &DensityGrid, vertices: &[[f32; 3]]) -> Vec<[f32; 3]> {
  vertices
    .par_iter()
    .map(|v| normalize_or_up(Vec3A::from(grid.gradient(Vec3::from_array(*v)))))
    .collect()
}

// =============================================================================
// Geometry-based normals
// =============================================================================

/// Angle-weighted average of incident face normals ("mean weighted by
/// angle").
///
/// Each face contributes to a vertex normal in proportion to the interior
/// angle of the triangle at that vertex.
pub fn from_geometry(vertices: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
  let mut accum = vec![Vec3A::ZERO; vertices.len()];

  for tri in indices.chunks_exact(3) {
    let [i0, i1, i2] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];

    let p0 = Vec3A::from_array(vertices[i0]);
    let p1 = Vec3A::from_array(vertices[i1]);
    let p2 = Vec3A::from_array(vertices[i2]);

    let e01 = p1 - p0;
    let e02 = p2 - p0;
    let e12 = p2 - p1;

    let face_normal = e01.cross(e02);
    let face_len_sq = face_normal.length_squared();

    // Skip degenerate triangles
    if face_len_sq < 1e-12 {
      continue;
    }

    let unit = face_normal * face_len_sq.sqrt().recip();

    accum[i0] += unit * vertex_angle(e01, e02);
    accum[i1] += unit * vertex_angle(-e01, e12);
    accum[i2] += unit * vertex_angle(-e02, -e12);
  }

  accum.into_iter().map(normalize_or_up).collect()
}

/// Angle between two edge vectors at a vertex, in radians.
#[inline]
fn vertex_angle(e1: Vec3A, e2: Vec3A) -> f32 {
  let len1_sq = e1.length_squared();
  let len2_sq = e2.length_squared();

  if len1_sq < 1e-12 || len2_sq < 1e-12 {
    return 0.0;
  }

  let cos_angle = e1.dot(e2) / (len1_sq.sqrt() * len2_sq.sqrt());
  // Clamp to [-1, 1] to handle floating point errors
  cos_angle.clamp(-1.0, 1.0).acos()
}

#[cfg(test)]
#[path = "normals_test.rs"]
mod normals_test;
