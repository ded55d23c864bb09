//! Fixed-capacity output buffers shared by concurrent kernel invocations.
//!
//! Slots are reserved with an atomic counter (append) or handed out by the
//! vertex hash table (store at a known index). Each slot is written at most
//! once per pass.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

use crate::error::ExtractError;

/// Lock-free append buffer with a hard capacity.
pub struct AppendBuffer<T> {
  name: &'static str,
  slots: Box<[OnceLock<T>]>,
  len: AtomicUsize,
}

impl<T: Copy + Send + Sync> AppendBuffer<T> {
  pub fn new(name: &'static str, capacity: usize) -> Self {
    Self {
      name,
      slots: (0..capacity).map(|_| OnceLock::new()).collect(),
      len: AtomicUsize::new(0),
    }
  }

  #[inline]
  pub fn capacity(&self) -> usize {
    self.slots.len()
  }

  /// Slots claimed so far (clamped to capacity).
  #[inline]
  pub fn len(&self) -> usize {
    self.len.load(Ordering::Acquire).min(self.capacity())
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Clear for a new pass, growing if `capacity` exceeds the current one.
  pub fn reset(&mut self, capacity: usize) {
    if capacity > self.slots.len() {
      self.slots = (0..capacity).map(|_| OnceLock::new()).collect();
    } else {
      for slot in self.slots.iter_mut() {
        slot.take();
      }
    }
    *self.len.get_mut() = 0;
  }

  /// Claim the next slot and write `value` into it.
  pub fn append(&self, value: T) -> Result<usize, ExtractError> {
    let index = self.len.fetch_add(1, Ordering::AcqRel);
    if index >= self.capacity() {
      return Err(self.overflow());
    }
    self.store(index, value)?;
    Ok(index)
  }

  /// Write `value` into a slot reserved elsewhere.
  pub fn store(&self, index: usize, value: T) -> Result<(), ExtractError> {
    let slot = self.slots.get(index).ok_or_else(|| self.overflow())?;
    slot.set(value).map_err(|_| ExtractError::SlotAlreadyWritten {
      buffer: self.name,
      index,
    })
  }

  /// Read a slot written earlier in this pass.
  #[inline]
  pub fn get(&self, index: usize) -> Option<T> {
    self.slots.get(index).and_then(|s| s.get().copied())
  }

  /// Copy out the first `count` slots. Every one of them must be written.
  pub fn to_vec(&self, count: usize) -> Result<Vec<T>, ExtractError> {
    if count > self.capacity() {
      return Err(self.overflow());
    }
    self.slots[..count]
      .iter()
      .enumerate()
      .map(|(index, slot)| {
        slot.get().copied().ok_or(ExtractError::MissingSlot {
          buffer: self.name,
          index,
        })
      })
      .collect()
  }

  fn overflow(&self) -> ExtractError {
    ExtractError::BufferOverflow {
      buffer: self.name,
      capacity: self.capacity(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rayon::prelude::*;

  #[test]
  fn test_append_then_collect() {
    let buffer = AppendBuffer::new("test", 4);
    assert_eq!(buffer.append(10u32).unwrap(), 0);
    assert_eq!(buffer.append(20u32).unwrap(), 1);
    assert_eq!(buffer.len(), 2);
    assert_eq!(buffer.to_vec(2).unwrap(), vec![10, 20]);
  }

  #[test]
  fn test_overflow_is_an_error() {
    let buffer = AppendBuffer::new("tiny", 1);
    buffer.append(1u32).unwrap();
    let err = buffer.append(2u32).unwrap_err();
    assert_eq!(
      err,
      ExtractError::BufferOverflow {
        buffer: "tiny",
        capacity: 1
      }
    );
    assert_eq!(buffer.len(), 1);
  }

  #[test]
  fn test_store_twice_is_an_error() {
    let buffer = AppendBuffer::new("verts", 2);
    buffer.store(1, 5u32).unwrap();
    assert!(matches!(
      buffer.store(1, 6u32),
      Err(ExtractError::SlotAlreadyWritten { index: 1, .. })
    ));
    assert_eq!(buffer.get(1), Some(5));
  }

  #[test]
  fn test_unwritten_slot_reported() {
    let buffer = AppendBuffer::new("verts", 3);
    buffer.store(0, 1u32).unwrap();
    assert!(matches!(
      buffer.to_vec(2),
      Err(ExtractError::MissingSlot { index: 1, .. })
    ));
  }

  #[test]
  fn test_reset_clears_and_grows() {
    let mut buffer = AppendBuffer::new("b", 2);
    buffer.append(1u32).unwrap();
    buffer.reset(2);
    assert!(buffer.is_empty());
    assert_eq!(buffer.get(0), None);

    buffer.reset(8);
    assert_eq!(buffer.capacity(), 8);
  }

  #[test]
  fn test_parallel_append_claims_unique_slots() {
    let buffer = AppendBuffer::new("par", 1000);
    (0..1000u32).into_par_iter().for_each(|i| {
      buffer.append(i).unwrap();
    });

    let mut values = buffer.to_vec(1000).unwrap();
    values.sort_unstable();
    assert_eq!(values, (0..1000).collect::<Vec<_>>());
  }
}
