//! Double-buffered visibility sets.
//!
//! ```text
//! pass start   toggle: current <-> previous, current is empty
//! visit c      current += c, previous -= c
//! restart      current += previous, previous = {}   (then a new pass toggles)
//! pass end     previous holds exactly the chunks to hide
//! ```

use std::collections::HashSet;

use super::chunk::ChunkCoord;

#[derive(Clone, Debug, Default)]
pub struct VisibilityBuffers {
  sets: [HashSet<ChunkCoord>; 2],
  current: usize,
}

impl VisibilityBuffers {
  pub fn new() -> Self {
    Self::default()
  }

  /// Swap roles at the start of a pass.
  pub fn toggle(&mut self) {
    self.current = 1 - self.current;
  }

  /// Record a visit during the running pass.
  pub fn mark_visible(&mut self, coord: ChunkCoord) {
    self.sets[self.current].insert(coord);
    self.sets[1 - self.current].remove(&coord);
  }

  #[inline]
  pub fn is_current(&self, coord: &ChunkCoord) -> bool {
    self.sets[self.current].contains(coord)
  }

  pub fn current(&self) -> &HashSet<ChunkCoord> {
    &self.sets[self.current]
  }

  pub fn previous(&self) -> &HashSet<ChunkCoord> {
    &self.sets[1 - self.current]
  }

  /// Fold `previous` into `current` so an interrupted pass hides nothing.
  pub fn merge_previous_into_current(&mut self) {
    let previous = std::mem::take(&mut self.sets[1 - self.current]);
    self.sets[self.current].extend(previous);
  }

  /// Remove and return every chunk left in `previous`.
  pub fn take_previous(&mut self) -> HashSet<ChunkCoord> {
    std::mem::take(&mut self.sets[1 - self.current])
  }

  pub fn clear(&mut self) {
    self.sets[0].clear();
    self.sets[1].clear();
  }
}
