//! Batch grouping of neighbouring chunks.
//!
//! A batch covers a cube of `batch_cube_size^3` chunks. Renderers can merge a
//! batch's meshes once every member exists, which the map reports exactly
//! once per batch.

use std::collections::HashMap;

use glam::IVec3;

use super::chunk::ChunkCoord;

/// Batch grid coordinate: `floor(chunk_world_position / (chunk_size * batch_cube_size))`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct BatchKey(pub IVec3);

impl BatchKey {
  /// Batch owning `coord`.
  #[inline]
  pub fn of(coord: ChunkCoord, batch_cube_size: u32) -> Self {
    let size = batch_cube_size.max(1) as i32;
    BatchKey(IVec3::new(
      coord.x.div_euclid(size),
      coord.y.div_euclid(size),
      coord.z.div_euclid(size),
    ))
  }
}

/// Chunks grouped under one key.
#[derive(Clone, Debug, Default)]
pub struct Batch {
  pub key: BatchKey,
  pub members: Vec<ChunkCoord>,
  pub sealed: bool,
}

impl Batch {
  fn new(key: BatchKey) -> Self {
    Self {
      key,
      members: Vec::new(),
      sealed: false,
    }
  }
}

/// All batches of a streamer.
#[derive(Clone, Debug)]
pub struct BatchMap {
  batch_cube_size: u32,
  batches: HashMap<BatchKey, Batch>,
}

impl BatchMap {
  pub fn new(batch_cube_size: u32) -> Self {
    Self {
      batch_cube_size: batch_cube_size.max(1),
      batches: HashMap::new(),
    }
  }

  /// Members of a full batch.
  #[inline]
  pub fn capacity(&self) -> usize {
    (self.batch_cube_size as usize).pow(3)
  }

  /// Add a newly created chunk, creating its batch if absent.
  ///
  /// Returns the key when this insertion fills and seals the batch.
  pub fn insert(&mut self, coord: ChunkCoord) -> (BatchKey, Option<BatchKey>) {
    let key = BatchKey::of(coord, self.batch_cube_size);
    let capacity = self.capacity();
    let batch = self.batches.entry(key).or_insert_with(|| Batch::new(key));

    batch.members.push(coord);
    if !batch.sealed && batch.members.len() >= capacity {
      batch.sealed = true;
      return (key, Some(key));
    }
    (key, None)
  }

  pub fn get(&self, key: BatchKey) -> Option<&Batch> {
    self.batches.get(&key)
  }

  pub fn iter(&self) -> impl Iterator<Item = &Batch> {
    self.batches.values()
  }

  pub fn len(&self) -> usize {
    self.batches.len()
  }

  pub fn is_empty(&self) -> bool {
    self.batches.is_empty()
  }

  pub fn clear(&mut self) {
    self.batches.clear();
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_batch_key_floors_negative_coords() {
    assert_eq!(BatchKey::of(ChunkCoord::new(0, 2, 3), 3), BatchKey(IVec3::new(0, 0, 1)));
    assert_eq!(BatchKey::of(ChunkCoord::new(-1, -3, -4), 3), BatchKey(IVec3::new(-1, -1, -2)));
  }

  #[test]
  fn test_batch_seals_once_when_full() {
    let mut map = BatchMap::new(2);
    let mut sealed = Vec::new();

    for x in 0..2 {
      for y in 0..2 {
        for z in 0..2 {
          let (_, seal) = map.insert(ChunkCoord::new(x, y, z));
          sealed.extend(seal);
        }
      }
    }
    assert_eq!(sealed, vec![BatchKey::default()]);

    // Further members never reseal
    let (_, seal) = map.insert(ChunkCoord::new(1, 1, 1));
    assert_eq!(seal, None);
    assert!(map.get(BatchKey::default()).is_some_and(|b| b.sealed));
  }

  #[test]
  fn test_partial_batches_stay_open() {
    let mut map = BatchMap::new(3);
    map.insert(ChunkCoord::new(0, 0, 0));
    map.insert(ChunkCoord::new(3, 0, 0));

    assert_eq!(map.len(), 2);
    assert!(map.iter().all(|b| !b.sealed && b.members.len() == 1));
  }

  #[test]
  fn test_unit_batch_seals_immediately() {
    let mut map = BatchMap::new(1);
    let (key, seal) = map.insert(ChunkCoord::new(4, 5, 6));
    assert_eq!(seal, Some(key));
    assert_eq!(key, BatchKey(IVec3::new(4, 5, 6)));
  }
}
