//! Core data types for surface extraction.

use crate::dispatch::Dispatch;

/// Normal computation mode for mesh generation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NormalMode {
  /// Density gradient at the vertex (fast, consistent across chunks).
  #[default]
  Gradient,

  /// Angle-weighted triangle normals (accurate interior, discontinuous at
  /// chunk edges).
  Geometry,
}

/// Which isosurface algorithm meshes chunks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExtractorKind {
  /// One vertex per crossed edge, table-driven triangles.
  #[default]
  MarchingCubes,
  /// One vertex per mixed cell, quads across crossed edges, octree pre-pass.
  DualContouring,
}

/// Axis-aligned bounding box.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MinMaxAABB {
  pub min: [f32; 3],
  pub max: [f32; 3],
}

impl MinMaxAABB {
  /// Create AABB with inverted extents (ready for encapsulation).
  pub fn empty() -> Self {
    Self {
      min: [f32::INFINITY; 3],
      max: [f32::NEG_INFINITY; 3],
    }
  }

  pub fn new(min: [f32; 3], max: [f32; 3]) -> Self {
    Self { min, max }
  }

  /// Expand AABB to include a point.
  #[inline]
  pub fn encapsulate(&mut self, point: [f32; 3]) {
    for i in 0..3 {
      self.min[i] = self.min[i].min(point[i]);
      self.max[i] = self.max[i].max(point[i]);
    }
  }

  /// Check if AABB is valid (min <= max on all axes).
  pub fn is_valid(&self) -> bool {
    self.min[0] <= self.max[0] && self.min[1] <= self.max[1] && self.min[2] <= self.max[2]
  }
}

impl Default for MinMaxAABB {
  fn default() -> Self {
    Self::empty()
  }
}

/// Extracted chunk mesh in chunk-local voxel units.
///
/// `normals` is parallel to `vertices`; `indices` holds three entries per
/// triangle, each `< vertices.len()`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
  pub vertices: Vec<[f32; 3]>,
  pub normals: Vec<[f32; 3]>,
  pub indices: Vec<u32>,
  pub bounds: MinMaxAABB,
}

impl MeshData {
  pub fn new() -> Self {
    Self::default()
  }

  /// Build from positions and indices, computing bounds. Normals start empty.
  pub fn from_geometry(vertices: Vec<[f32; 3]>, indices: Vec<u32>) -> Self {
    let mut bounds = MinMaxAABB::empty();
    for v in &vertices {
      bounds.encapsulate(*v);
    }
    Self {
      vertices,
      normals: Vec::new(),
      indices,
      bounds,
    }
  }

  /// Returns true if no geometry was generated.
  pub fn is_empty(&self) -> bool {
    self.indices.is_empty()
  }

  /// Number of triangles in the mesh.
  pub fn triangle_count(&self) -> usize {
    self.indices.len() / 3
  }

  /// Check the structural invariants consumers rely on.
  pub fn is_well_formed(&self) -> bool {
    let n = self.vertices.len();
    self.normals.len() == n
      && self.indices.len() % 3 == 0
      && self.indices.iter().all(|&i| (i as usize) < n)
  }
}

/// Configuration for a single extraction pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExtractConfig {
  /// Isosurface threshold. Samples below it are inside.
  pub surface_level: f32,

  /// Normal computation mode.
  pub normal_mode: NormalMode,

  /// Kernel scheduling.
  pub dispatch: Dispatch,
}

impl Default for ExtractConfig {
  fn default() -> Self {
    Self {
      surface_level: 0.0,
      normal_mode: NormalMode::default(),
      dispatch: Dispatch::default(),
    }
  }
}

impl ExtractConfig {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_surface_level(mut self, level: f32) -> Self {
    self.surface_level = level;
    self
  }

  pub fn with_normal_mode(mut self, mode: NormalMode) -> Self {
    self.normal_mode = mode;
    self
  }

  pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
    self.dispatch = dispatch;
    self
  }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
