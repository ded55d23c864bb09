//! Bottom-up octree collapse of uniform-sign regions.
//!
//! # Algorithm
//!
//! ```text
//! scale 1   classify every unit cell: Below | Above | Mixed
//!   │
//!   ▼
//! scale 2   for each 2³ block (parallel, read-only):
//!   │         merge iff all 8 children are single scale-1 leaves,
//!   │         share one uniform sign, and the block's 8 corners agree
//!   │       then apply: parent scale = 2, the 7 other children = 0
//!   ▼
//! scale 4, 8, ... ≤ N   same rule with children of scale S/2
//!   │
//!   ▼
//! pack      every node with scale > 0 becomes a leaf (X-major order),
//!           then unit border cells with any coordinate == -1
//! ```
//!
//! A parent whose children are absent at the expected scale (one of them
//! failed to merge earlier) simply stays unmerged.

use glam::IVec3;
use rayon::prelude::*;

use super::leaf::OctreeLeaf;
use crate::constants::{coord_to_index, index_to_coord, CORNER_OFFSETS};
use crate::grid::DensityGrid;

/// Sign class of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum NodeSign {
  Below,
  Above,
  Mixed,
}

impl NodeSign {
  #[inline]
  fn of(density: f32, level: f32) -> Self {
    if density < level {
      NodeSign::Below
    } else {
      NodeSign::Above
    }
  }

  /// Classify a unit cell from its 8 corners.
  #[inline]
  pub fn of_cell(corners: &[f32; 8], level: f32) -> Self {
    let first = Self::of(corners[0], level);
    if corners[1..].iter().all(|&d| Self::of(d, level) == first) {
      first
    } else {
      NodeSign::Mixed
    }
  }
}

/// Packed leaf list produced by [`OctreeCollapser::collapse`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PackedOctree {
  resolution: usize,
  leaves: Vec<OctreeLeaf>,
  interior_count: usize,
}

impl PackedOctree {
  /// All leaves: interior first, then border padding.
  pub fn leaves(&self) -> &[OctreeLeaf] {
    &self.leaves
  }

  /// Leaves tiling the `N^3` chunk volume.
  pub fn interior(&self) -> &[OctreeLeaf] {
    &self.leaves[..self.interior_count]
  }

  /// Unit padding cells on the three negative faces.
  pub fn border(&self) -> &[OctreeLeaf] {
    &self.leaves[self.interior_count..]
  }

  pub fn resolution(&self) -> usize {
    self.resolution
  }

  /// Interior leaf count over unit cell count. 1.0 means nothing merged.
  pub fn compression_ratio(&self) -> f32 {
    if self.resolution == 0 {
      return 1.0;
    }
    self.interior_count as f32 / self.resolution.pow(3) as f32
  }
}

/// Reusable collapse scratch for one resolution tier.
#[derive(Clone, Debug, Default)]
pub struct OctreeCollapser {
  resolution: usize,
  scales: Vec<u32>,
  signs: Vec<NodeSign>,
}

impl OctreeCollapser {
  pub fn new(resolution: usize) -> Self {
    let cells = resolution.pow(3);
    Self {
      resolution,
      scales: vec![0; cells],
      signs: vec![NodeSign::Mixed; cells],
    }
  }

  #[inline]
  fn node_index(&self, cell: IVec3) -> usize {
    coord_to_index(cell.x as usize, cell.y as usize, cell.z as usize, self.resolution)
  }

  /// Collapse the interior cells of `grid` against `surface_level`.
  pub fn collapse(&mut self, grid: &DensityGrid, surface_level: f32) -> PackedOctree {
    let n = grid.resolution();
    let _span = tracing::trace_span!("octree::collapse", resolution = n).entered();

    if n != self.resolution {
      *self = Self::new(n);
    }

    self.classify_unit_cells(grid, surface_level);

    let mut size = 2;
    while size <= n {
      let merges = self.find_merges(grid, surface_level, size);
      self.apply_merges(&merges, size);
      size *= 2;
    }

    self.pack()
  }

  fn classify_unit_cells(&mut self, grid: &DensityGrid, level: f32) {
    let n = self.resolution;
    self.scales.fill(1);
    self
      .signs
      .par_iter_mut()
      .enumerate()
      .for_each(|(i, sign)| {
        let (x, y, z) = index_to_coord(i, n);
        let corners = grid.cell_corners(IVec3::new(x as i32, y as i32, z as i32));
        *sign = NodeSign::of_cell(&corners, level);
      });
  }

  /// Parents of `size` that can merge, with their sign. Read-only.
  fn find_merges(&self, grid: &DensityGrid, level: f32, size: usize) -> Vec<(IVec3, NodeSign)> {
    let n = self.resolution;
    let origins: Vec<IVec3> = (0..=n - size)
      .step_by(size)
      .flat_map(|x| {
        (0..=n - size).step_by(size).flat_map(move |y| {
          (0..=n - size)
            .step_by(size)
            .map(move |z| IVec3::new(x as i32, y as i32, z as i32))
        })
      })
      .collect();

    origins
      .par_iter()
      .filter_map(|&origin| {
        self
          .merge_sign(grid, level, origin, size)
          .map(|sign| (origin, sign))
      })
      .collect()
  }

  fn merge_sign(&self, grid: &DensityGrid, level: f32, origin: IVec3, size: usize) -> Option<NodeSign> {
    let half = (size / 2) as u32;
    let first = self.signs[self.node_index(origin)];
    if first == NodeSign::Mixed {
      return None;
    }

    for [x, y, z] in CORNER_OFFSETS {
      let child = origin + IVec3::new(x as i32, y as i32, z as i32) * half as i32;
      let idx = self.node_index(child);
      if self.scales[idx] != half || self.signs[idx] != first {
        return None;
      }

      let corner = origin + IVec3::new(x as i32, y as i32, z as i32) * size as i32;
      if NodeSign::of(grid.corner(corner), level) != first {
        return None;
      }
    }

    Some(first)
  }

  fn apply_merges(&mut self, merges: &[(IVec3, NodeSign)], size: usize) {
    let half = (size / 2) as i32;
    for &(origin, sign) in merges {
      for [x, y, z] in CORNER_OFFSETS {
        let child = origin + IVec3::new(x as i32, y as i32, z as i32) * half;
        let idx = self.node_index(child);
        self.scales[idx] = 0;
      }
      let idx = self.node_index(origin);
      self.scales[idx] = size as u32;
      self.signs[idx] = sign;
    }
  }

  fn pack(&self) -> PackedOctree {
    let n = self.resolution as i32;

    let mut leaves: Vec<OctreeLeaf> = self
      .scales
      .iter()
      .enumerate()
      .filter(|(_, scale)| **scale > 0)
      .map(|(i, &scale)| {
        let (x, y, z) = index_to_coord(i, self.resolution);
        OctreeLeaf::new(IVec3::new(x as i32, y as i32, z as i32), scale)
      })
      .collect();
    let interior_count = leaves.len();

    for x in -1..n {
      for y in -1..n {
        for z in -1..n {
          if x == -1 || y == -1 || z == -1 {
            leaves.push(OctreeLeaf::unit(IVec3::new(x, y, z)));
          }
        }
      }
    }

    PackedOctree {
      resolution: self.resolution,
      leaves,
      interior_count,
    }
  }
}

#[cfg(test)]
#[path = "collapse_test.rs"]
mod collapse_test;
