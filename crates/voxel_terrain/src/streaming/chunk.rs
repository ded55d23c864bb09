//! Chunk identity and per-chunk state owned by the streamer.

use glam::{IVec3, Vec3};
use smallvec::SmallVec;

use super::batch::BatchKey;
use crate::extract::MeshResult;
use crate::types::MeshData;

/// Integer chunk grid coordinate. World position is `coord * chunk_size`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, PartialOrd, Ord)]
pub struct ChunkCoord {
  pub x: i32,
  pub y: i32,
  pub z: i32,
}

impl ChunkCoord {
  pub const ORIGIN: Self = Self { x: 0, y: 0, z: 0 };

  pub const fn new(x: i32, y: i32, z: i32) -> Self {
    Self { x, y, z }
  }

  /// Chunk whose grid position is nearest to `position`.
  pub fn closest_to(position: Vec3, chunk_size: f32) -> Self {
    (position / chunk_size).round().as_ivec3().into()
  }

  #[inline]
  pub fn as_ivec3(&self) -> IVec3 {
    IVec3::new(self.x, self.y, self.z)
  }

  /// World position of the chunk's cell (0,0,0) corner.
  #[inline]
  pub fn world_position(&self, chunk_size: f32) -> Vec3 {
    self.as_ivec3().as_vec3() * chunk_size
  }

  /// The 26 face, edge and corner neighbours, Z outermost.
  pub fn neighbors(&self) -> SmallVec<[ChunkCoord; 26]> {
    let mut out = SmallVec::new();
    for z in -1..=1 {
      for y in -1..=1 {
        for x in -1..=1 {
          if x == 0 && y == 0 && z == 0 {
            continue;
          }
          out.push(Self::new(self.x + x, self.y + y, self.z + z));
        }
      }
    }
    out
  }
}

impl From<IVec3> for ChunkCoord {
  fn from(v: IVec3) -> Self {
    Self::new(v.x, v.y, v.z)
  }
}

impl From<ChunkCoord> for IVec3 {
  fn from(c: ChunkCoord) -> Self {
    c.as_ivec3()
  }
}

/// A meshed chunk.
///
/// Created on first visit, re-meshed when the viewer comes close enough for
/// a finer LOD, hidden when a pass no longer reaches it. Never destroyed while
/// the streamer lives.
#[derive(Clone, Debug)]
pub struct Chunk {
  pub coord: ChunkCoord,
  /// LOD index the current mesh was generated at.
  pub lod: usize,
  /// Cells per axis of the current mesh.
  pub resolution: usize,
  /// Chunk-local mesh in voxel units.
  pub mesh: MeshData,
  pub active: bool,
  pub batch: BatchKey,
  /// Interior octree leaves of the last dual contouring pass.
  pub packed_leaves: Option<usize>,
  world_position: Vec3,
  scale: f32,
}

impl Chunk {
  pub fn new(
    coord: ChunkCoord,
    batch: BatchKey,
    chunk_size: f32,
    lod: usize,
    resolution: usize,
    result: MeshResult,
  ) -> Self {
    let mut chunk = Self {
      coord,
      lod,
      resolution,
      mesh: MeshData::new(),
      active: true,
      batch,
      packed_leaves: None,
      world_position: coord.world_position(chunk_size),
      scale: 1.0,
    };
    chunk.replace_mesh(chunk_size, lod, resolution, result);
    chunk
  }

  /// Swap in a mesh generated at `lod`.
  pub fn replace_mesh(&mut self, chunk_size: f32, lod: usize, resolution: usize, result: MeshResult) {
    self.lod = lod;
    self.resolution = resolution;
    self.mesh = result.mesh;
    self.packed_leaves = result.packed_leaves;
    self.scale = chunk_size / resolution.max(1) as f32;
  }

  /// Translation to apply to the mesh.
  #[inline]
  pub fn world_position(&self) -> Vec3 {
    self.world_position
  }

  /// Uniform scale to apply to the mesh: `chunk_size / resolution`.
  #[inline]
  pub fn scale(&self) -> f32 {
    self.scale
  }

  /// Whether the mesh contributes anything renderable.
  #[inline]
  pub fn is_renderable(&self) -> bool {
    !self.mesh.is_empty()
  }
}
