//! Padded sample grid layout shared by both extractors.
//!
//! A chunk of resolution `N` (cells per axis) is sampled at `N + 3` points per
//! axis.
//!
//! # Sample Layout (one axis)
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        PADDED SAMPLE LAYOUT                             │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Sample index:  0     1     2    ...    N     N+1   N+2                 │
//! │                 │     │                       │     │                   │
//! │                 │     └──── N + 1 corners ────┘     │                   │
//! │                 │         (cells 0..N-1)            └─ positive apron   │
//! │                 └─ negative apron                                       │
//! │                                                                         │
//! │  Cell c uses samples c+1 and c+2. Cell -1 (dual contouring border)      │
//! │  uses samples 0 and 1.                                                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Memory Layout
//!
//! ```text
//! index = (x * dim + y) * dim + z      (X major, Z innermost)
//! ```
//!
//! # Coordinate System
//!
//! ```text
//!         +Y
//!          │
//!          └───────── +X
//!         /
//!       +Z
//!
//! Cell corner indices (binary: ZYX):
//!   0 = (0,0,0)    4 = (0,0,1)
//!   1 = (1,0,0)    5 = (1,0,1)
//!   2 = (0,1,0)    6 = (0,1,1)
//!   3 = (1,1,0)    7 = (1,1,1)
//! ```

/// Samples before the first cell corner on each axis.
pub const NEGATIVE_APRON: usize = 1;

/// Samples after the last cell corner on each axis.
pub const POSITIVE_APRON: usize = 1;

/// Extra samples per axis beyond the `N` cells: apron, last corner, apron.
pub const GRID_PADDING: usize = NEGATIVE_APRON + 1 + POSITIVE_APRON;

/// Largest supported chunk resolution.
///
/// Keeps `3 * (N + 3)^3` edge keys below the `u32` empty sentinel.
pub const MAX_RESOLUTION: usize = 512;

/// Sample count per axis for a chunk of `resolution` cells.
#[inline(always)]
pub const fn grid_dim(resolution: usize) -> usize {
  resolution + GRID_PADDING
}

/// Convert 3D sample coordinates to a linear index for a grid of `dim` samples
/// per axis.
#[inline(always)]
pub const fn coord_to_index(x: usize, y: usize, z: usize, dim: usize) -> usize {
  (x * dim + y) * dim + z
}

/// Convert a linear index back to 3D sample coordinates.
#[inline(always)]
pub const fn index_to_coord(idx: usize, dim: usize) -> (usize, usize, usize) {
  let z = idx % dim;
  let y = (idx / dim) % dim;
  let x = idx / (dim * dim);
  (x, y, z)
}

/// Unit offsets of the 8 cube corners (binary: ZYX).
pub const CORNER_OFFSETS: [[usize; 3]; 8] = [
  [0, 0, 0],
  [1, 0, 0],
  [0, 1, 0],
  [1, 1, 0],
  [0, 0, 1],
  [1, 0, 1],
  [0, 1, 1],
  [1, 1, 1],
];

/// Linear-index offsets of the 8 cube corners for a grid of `dim` samples.
#[inline]
pub const fn corner_index_offsets(dim: usize) -> [usize; 8] {
  let mut offsets = [0usize; 8];
  let mut i = 0;
  while i < 8 {
    let [x, y, z] = CORNER_OFFSETS[i];
    offsets[i] = coord_to_index(x, y, z, dim);
    i += 1;
  }
  offsets
}

/// Smallest power of two `>= value` (minimum 1).
///
/// Hash capacities are derived from this so slot lookup is a bitmask.
#[inline]
pub const fn capacity_for(value: usize) -> usize {
  if value <= 1 {
    1
  } else {
    value.next_power_of_two()
  }
}

#[cfg(test)]
#[path = "constants_test.rs"]
mod constants_test;
