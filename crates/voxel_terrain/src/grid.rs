//! Padded density grid for one chunk extraction pass.
//!
//! See [`crate::constants`] for the sample layout. Samples are taken once per
//! chunk and are immutable while the extraction kernels run.

use glam::{IVec3, Vec3};
use rayon::prelude::*;

use crate::constants::{coord_to_index, corner_index_offsets, grid_dim, MAX_RESOLUTION, NEGATIVE_APRON};
use crate::density::DensityField;
use crate::error::ExtractError;

/// Which sides of the surface level a grid's samples fall on.
///
/// A grid with samples on only one side cannot contain a crossing and is
/// skipped without dispatching any kernel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DensityClass {
  /// Some sample is `>= surface_level`.
  pub any_above: bool,
  /// Some sample is `< surface_level`.
  pub any_below: bool,
}

impl DensityClass {
  #[inline]
  pub fn has_crossing(&self) -> bool {
    self.any_above && self.any_below
  }
}

/// `(N + 3)^3` density samples around a chunk of `N` cells.
#[derive(Clone, Debug)]
pub struct DensityGrid {
  resolution: usize,
  dim: usize,
  corner_offsets: [usize; 8],
  samples: Vec<f32>,
}

impl DensityGrid {
  /// Sample `field` around a chunk whose cell (0,0,0) corner is at `origin`.
  ///
  /// Sample `g` on an axis lies at `origin + (g - 1) * voxel_size`.
  pub fn sample<F: DensityField + ?Sized>(
    field: &F,
    origin: Vec3,
    voxel_size: f32,
    resolution: usize,
  ) -> Result<Self, ExtractError> {
    let _span = tracing::trace_span!("grid::sample", resolution).entered();

    Self::build(resolution, |g| {
      let local = g.as_vec3() - Vec3::splat(NEGATIVE_APRON as f32);
      field.density(origin + local * voxel_size)
    })
  }

  /// Build a grid from a function of the sample coordinate `g` in
  /// `[0, N + 3)^3`.
  pub fn from_fn<F>(resolution: usize, f: F) -> Result<Self, ExtractError>
  where
    F: Fn(IVec3) -> f32 + Send + Sync,
  {
    Self::build(resolution, f)
  }

  fn build<F>(resolution: usize, f: F) -> Result<Self, ExtractError>
  where
    F: Fn(IVec3) -> f32 + Send + Sync,
  {
    if resolution == 0 || resolution > MAX_RESOLUTION {
      return Err(ExtractError::InvalidResolution {
        resolution,
        max: MAX_RESOLUTION,
      });
    }

    let dim = grid_dim(resolution);
    let mut samples = vec![0.0f32; dim * dim * dim];

    // One X slab per task
    samples
      .par_chunks_mut(dim * dim)
      .enumerate()
      .for_each(|(x, slab)| {
        for y in 0..dim {
          for z in 0..dim {
            slab[y * dim + z] = f(IVec3::new(x as i32, y as i32, z as i32));
          }
        }
      });

    Ok(Self {
      resolution,
      dim,
      corner_offsets: corner_index_offsets(dim),
      samples,
    })
  }

  /// Cells per axis.
  #[inline]
  pub fn resolution(&self) -> usize {
    self.resolution
  }

  /// Samples per axis (`resolution + 3`).
  #[inline]
  pub fn dim(&self) -> usize {
    self.dim
  }

  #[inline]
  pub fn samples(&self) -> &[f32] {
    &self.samples
  }

  /// Linear index of sample `g`.
  #[inline]
  pub fn index(&self, g: IVec3) -> usize {
    coord_to_index(g.x as usize, g.y as usize, g.z as usize, self.dim)
  }

  /// Sample at grid coordinate `g` (no apron shift).
  #[inline]
  pub fn at(&self, g: IVec3) -> f32 {
    self.samples[self.index(g)]
  }

  /// Sample at the cell-corner coordinate `c`, where `c` ranges over
  /// `[-1, N + 2)` and corner 0 of cell 0 is `c = 0`.
  #[inline]
  pub fn corner(&self, c: IVec3) -> f32 {
    self.at(c + IVec3::splat(NEGATIVE_APRON as i32))
  }

  /// Linear sample index of the minimum corner of `cell`.
  ///
  /// Unique per cell in `[-1, N + 1)^3`, so it doubles as a cell key.
  #[inline]
  pub fn cell_key(&self, cell: IVec3) -> u32 {
    self.index(cell + IVec3::splat(NEGATIVE_APRON as i32)) as u32
  }

  /// The 8 corner samples of `cell` (binary ZYX corner order).
  #[inline]
  pub fn cell_corners(&self, cell: IVec3) -> [f32; 8] {
    let base = self.index(cell + IVec3::splat(NEGATIVE_APRON as i32));
    self.corner_offsets.map(|offset| self.samples[base + offset])
  }

  /// Classify all samples against `surface_level`.
  pub fn classify(&self, surface_level: f32) -> DensityClass {
    let (any_above, any_below) = self
      .samples
      .par_iter()
      .fold(
        || (false, false),
        |(above, below), &s| (above || s >= surface_level, below || s < surface_level),
      )
      .reduce(|| (false, false), |a, b| (a.0 || b.0, a.1 || b.1));

    DensityClass {
      any_above,
      any_below,
    }
  }

  /// Central-difference gradient at sample `g`, one-sided at the grid border.
  pub fn gradient_at(&self, g: IVec3) -> Vec3 {
    let max = self.dim as i32 - 1;
    let mut out = [0.0f32; 3];

    for (axis, slot) in out.iter_mut().enumerate() {
      let mut lo = g;
      let mut hi = g;
      lo[axis] = (g[axis] - 1).max(0);
      hi[axis] = (g[axis] + 1).min(max);
      let span = (hi[axis] - lo[axis]) as f32;
      if span > 0.0 {
        *slot = (self.at(hi) - self.at(lo)) / span;
      }
    }

    Vec3::from_array(out)
  }

  /// Trilinearly interpolated gradient at a chunk-local position (cell units,
  /// cell 0 corner at the origin).
  pub fn gradient(&self, local: Vec3) -> Vec3 {
    let max = (self.dim - 2) as f32;
    let p = (local + Vec3::splat(NEGATIVE_APRON as f32)).clamp(Vec3::ZERO, Vec3::splat(max));
    let base = p.floor().min(Vec3::splat(max));
    let t = p - base;
    let b = base.as_ivec3();

    let mut result = Vec3::ZERO;
    for corner in 0..8 {
      let offset = IVec3::new(corner & 1, (corner >> 1) & 1, (corner >> 2) & 1);
      let w = Vec3::select(
        offset.cmpeq(IVec3::ZERO),
        Vec3::ONE - t,
        t,
      );
      let weight = w.x * w.y * w.z;
      if weight > 0.0 {
        result += self.gradient_at(b + offset) * weight;
      }
    }
    result
  }
}

#[cfg(test)]
#[path = "grid_test.rs"]
mod grid_test;
