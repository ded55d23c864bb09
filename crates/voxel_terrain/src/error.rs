//! Error types for extraction and streaming.

use thiserror::Error;

/// Failures raised by a surface extraction pass.
///
/// All of these indicate an undersized buffer or a broken kernel; none are
/// recoverable by retrying the same chunk.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractError {
  #[error("vertex hash table full (capacity {capacity})")]
  HashTableFull { capacity: usize },

  #[error("key {0:#x} is reserved as the empty slot sentinel")]
  ReservedKey(u32),

  #[error("{buffer} buffer overflow (capacity {capacity})")]
  BufferOverflow {
    buffer: &'static str,
    capacity: usize,
  },

  #[error("{buffer} slot {index} written twice")]
  SlotAlreadyWritten { buffer: &'static str, index: usize },

  #[error("{buffer} slot {index} was reserved but never written")]
  MissingSlot { buffer: &'static str, index: usize },

  #[error("edge key {0} has no vertex")]
  UnresolvedKey(u32),

  #[error("resolution {resolution} outside the supported range 1..={max}")]
  InvalidResolution { resolution: usize, max: usize },
}

/// Invalid streaming configuration.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
  #[error("LOD resolution table is empty")]
  NoLodResolutions,

  #[error("LOD resolution {0} must be at least 1")]
  ZeroResolution(usize),

  #[error("LOD resolutions must be ordered finest first, got {previous} then {next}")]
  UnorderedLods { previous: usize, next: usize },

  #[error("chunk size must be positive and finite, got {0}")]
  InvalidChunkSize(f32),

  #[error("batch cube size must be at least 1")]
  ZeroBatchCube,

  #[error("load distance must not be negative, got {0:?}")]
  NegativeLoadDistance(glam::IVec3),

  #[error(transparent)]
  Extract(#[from] ExtractError),
}

/// Failures surfaced from [`ChunkStreamer`](crate::streaming::ChunkStreamer).
#[derive(Debug, Error)]
pub enum StreamError {
  #[error("chunk {coord:?} failed to mesh: {source}")]
  Mesh {
    coord: glam::IVec3,
    #[source]
    source: ExtractError,
  },

  #[error(transparent)]
  Config(#[from] ConfigError),
}
