//! Open-addressing `key -> vertex index` table for concurrent deduplication.
//!
//! ```text
//!   slot = scramble(key) & (capacity - 1)        capacity is a power of two
//!
//!   keys:    [ EMPTY | k7 | EMPTY | k2 | k9 | EMPTY | ... ]
//!   values:  [   -   | 0  |   -   | 3  | 1  |   -   | ... ]
//!                       ▲
//!                       └─ linear probing on collision
//! ```
//!
//! The first invocation to claim a key (compare-exchange on `keys`) draws the
//! next vertex index from the table's counter and publishes it to `values`.
//! Invocations that lose the race on the same key wait until the index is
//! published, then reuse it.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::constants::capacity_for;
use crate::error::ExtractError;

/// Reserved key marking an unused slot.
pub const EMPTY_KEY: u32 = u32::MAX;

/// Value of a claimed slot whose index is not yet published.
const PENDING: u32 = u32::MAX;

/// Outcome of [`VertexHashTable::lookup_or_reserve`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reservation {
  /// Vertex index owned by the key.
  pub index: u32,
  /// True for exactly one caller per key: the one that must write the vertex.
  pub is_new: bool,
}

pub struct VertexHashTable {
  keys: Box<[AtomicU32]>,
  values: Box<[AtomicU32]>,
  mask: usize,
  next_index: AtomicU32,
}

impl VertexHashTable {
  /// Table with room for at least `min_capacity` distinct keys.
  pub fn with_capacity(min_capacity: usize) -> Self {
    let capacity = capacity_for(min_capacity);
    Self {
      keys: (0..capacity).map(|_| AtomicU32::new(EMPTY_KEY)).collect(),
      values: (0..capacity).map(|_| AtomicU32::new(PENDING)).collect(),
      mask: capacity - 1,
      next_index: AtomicU32::new(0),
    }
  }

  #[inline]
  pub fn capacity(&self) -> usize {
    self.keys.len()
  }

  /// Distinct keys reserved since the last reset.
  #[inline]
  pub fn len(&self) -> usize {
    self.next_index.load(Ordering::Acquire) as usize
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Clear all slots, growing to fit `min_capacity` keys if needed.
  pub fn reset(&mut self, min_capacity: usize) {
    let capacity = capacity_for(min_capacity);
    if capacity > self.capacity() {
      *self = Self::with_capacity(capacity);
      return;
    }
    for key in self.keys.iter_mut() {
      *key.get_mut() = EMPTY_KEY;
    }
    for value in self.values.iter_mut() {
      *value.get_mut() = PENDING;
    }
    *self.next_index.get_mut() = 0;
  }

  #[inline]
  fn home_slot(&self, key: u32) -> usize {
    // Fibonacci scramble so consecutive keys spread across the table
    let h = key.wrapping_mul(0x9E37_79B1);
    ((h ^ (h >> 16)) as usize) & self.mask
  }

  /// Return the vertex index for `key`, reserving a new one if the key has
  /// not been seen this pass.
  pub fn lookup_or_reserve(&self, key: u32) -> Result<Reservation, ExtractError> {
    if key == EMPTY_KEY {
      return Err(ExtractError::ReservedKey(key));
    }

    let mut slot = self.home_slot(key);
    for _ in 0..self.capacity() {
      match self.keys[slot].compare_exchange(EMPTY_KEY, key, Ordering::AcqRel, Ordering::Acquire)
      {
        Ok(_) => {
          let index = self.next_index.fetch_add(1, Ordering::AcqRel);
          self.values[slot].store(index, Ordering::Release);
          return Ok(Reservation {
            index,
            is_new: true,
          });
        }
        Err(existing) if existing == key => {
          return Ok(Reservation {
            index: self.wait_for_index(slot),
            is_new: false,
          });
        }
        Err(_) => slot = (slot + 1) & self.mask,
      }
    }

    Err(ExtractError::HashTableFull {
      capacity: self.capacity(),
    })
  }

  #[inline]
  fn wait_for_index(&self, slot: usize) -> u32 {
    loop {
      let value = self.values[slot].load(Ordering::Acquire);
      if value != PENDING {
        return value;
      }
      std::hint::spin_loop();
    }
  }

  /// Published vertex index for `key`, if reserved.
  pub fn get(&self, key: u32) -> Option<u32> {
    if key == EMPTY_KEY {
      return None;
    }

    let mut slot = self.home_slot(key);
    for _ in 0..self.capacity() {
      let stored = self.keys[slot].load(Ordering::Acquire);
      if stored == EMPTY_KEY {
        return None;
      }
      if stored == key {
        let value = self.values[slot].load(Ordering::Acquire);
        return (value != PENDING).then_some(value);
      }
      slot = (slot + 1) & self.mask;
    }
    None
  }
}

#[cfg(test)]
#[path = "hash_table_test.rs"]
mod hash_table_test;
