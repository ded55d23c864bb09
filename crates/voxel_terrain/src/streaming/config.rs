//! StreamConfig - values consumed by the chunk streamer.

use glam::IVec3;

use super::budget::SliceBudget;
use crate::constants::MAX_RESOLUTION;
use crate::error::{ConfigError, ExtractError};
use crate::types::{ExtractConfig, ExtractorKind};

/// Configuration for chunk streaming.
#[derive(Clone, Debug, PartialEq)]
pub struct StreamConfig {
  /// Cells per chunk axis for each LOD, finest first. LOD index `i` meshes at
  /// `lod_resolutions[i]`.
  pub lod_resolutions: Vec<usize>,

  /// Chunk edge length in world units.
  pub chunk_size: f32,

  /// Batches group `batch_cube_size^3` neighbouring chunks.
  pub batch_cube_size: u32,

  /// Per-axis load distance in chunks (Chebyshev per axis).
  pub load_distance: IVec3,

  /// Time allowance of one streaming slice.
  pub time_budget: SliceBudget,

  /// Isosurface algorithm, fixed for the streamer's lifetime.
  pub extractor: ExtractorKind,

  /// Per-pass extraction settings.
  pub extract: ExtractConfig,
}

impl Default for StreamConfig {
  fn default() -> Self {
    Self {
      lod_resolutions: vec![32, 16, 8],
      chunk_size: 32.0,
      batch_cube_size: 3,
      load_distance: IVec3::new(4, 2, 4),
      time_budget: SliceBudget::DEFAULT,
      extractor: ExtractorKind::default(),
      extract: ExtractConfig::default(),
    }
  }
}

impl StreamConfig {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_lod_resolutions(mut self, resolutions: impl Into<Vec<usize>>) -> Self {
    self.lod_resolutions = resolutions.into();
    self
  }

  pub fn with_chunk_size(mut self, chunk_size: f32) -> Self {
    self.chunk_size = chunk_size;
    self
  }

  pub fn with_batch_cube_size(mut self, size: u32) -> Self {
    self.batch_cube_size = size;
    self
  }

  pub fn with_load_distance(mut self, distance: IVec3) -> Self {
    self.load_distance = distance;
    self
  }

  pub fn with_time_budget(mut self, budget: SliceBudget) -> Self {
    self.time_budget = budget;
    self
  }

  pub fn with_extractor(mut self, kind: ExtractorKind) -> Self {
    self.extractor = kind;
    self
  }

  pub fn with_extract(mut self, extract: ExtractConfig) -> Self {
    self.extract = extract;
    self
  }

  /// Number of LOD levels.
  #[inline]
  pub fn lod_count(&self) -> usize {
    self.lod_resolutions.len()
  }

  /// Resolution of `lod`, clamped to the table.
  #[inline]
  pub fn resolution_for(&self, lod: usize) -> usize {
    let last = self.lod_resolutions.len().saturating_sub(1);
    self.lod_resolutions.get(lod.min(last)).copied().unwrap_or(1)
  }

  /// World size of one voxel at `resolution`.
  #[inline]
  pub fn voxel_size(&self, resolution: usize) -> f32 {
    self.chunk_size / resolution.max(1) as f32
  }

  /// Members of a full batch.
  #[inline]
  pub fn batch_capacity(&self) -> usize {
    (self.batch_cube_size as usize).pow(3)
  }

  /// Load distance in world units per axis.
  #[inline]
  pub fn load_extent(&self) -> glam::Vec3 {
    self.load_distance.as_vec3() * self.chunk_size
  }

  /// Reject configurations the streamer cannot run.
  ///
  /// A zero load distance is valid: every pass completes without visiting a
  /// chunk.
  pub fn validate(&self) -> Result<(), ConfigError> {
    let first = *self.lod_resolutions.first().ok_or(ConfigError::NoLodResolutions)?;
    if first > MAX_RESOLUTION {
      return Err(
        ExtractError::InvalidResolution {
          resolution: first,
          max: MAX_RESOLUTION,
        }
        .into(),
      );
    }

    for (lod, &resolution) in self.lod_resolutions.iter().enumerate() {
      if resolution == 0 {
        return Err(ConfigError::ZeroResolution(lod));
      }
    }

    for pair in self.lod_resolutions.windows(2) {
      if pair[1] > pair[0] {
        return Err(ConfigError::UnorderedLods {
          previous: pair[0],
          next: pair[1],
        });
      }
    }

    if !self.chunk_size.is_finite() || self.chunk_size <= 0.0 {
      return Err(ConfigError::InvalidChunkSize(self.chunk_size));
    }

    if self.batch_cube_size == 0 {
      return Err(ConfigError::ZeroBatchCube);
    }

    if self.load_distance.min_element() < 0 {
      return Err(ConfigError::NegativeLoadDistance(self.load_distance));
    }

    if self.load_distance.min_element() == 0 {
      tracing::warn!(load_distance = ?self.load_distance, "zero load distance, nothing will stream");
    }

    Ok(())
  }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
