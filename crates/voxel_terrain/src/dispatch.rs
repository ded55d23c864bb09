//! Kernel dispatch over a 3D index space.
//!
//! A kernel is invoked exactly once per coordinate with no ordering
//! guarantee. Everything a dispatch writes is visible to the next one.
//! `Shuffled` exists to prove kernels are order independent: it walks the
//! index space in a seeded random order on the calling thread.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::error::ExtractError;

/// How kernel invocations are scheduled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Dispatch {
  /// Rayon work stealing.
  #[default]
  Parallel,
  /// In-order on the calling thread.
  Sequential,
  /// Seeded random order on the calling thread.
  Shuffled { seed: u64 },
}

impl Dispatch {
  /// Run `kernel` for every coordinate in `[0, dims)`, stopping at the first
  /// error.
  pub fn run<K>(&self, dims: [usize; 3], kernel: K) -> Result<(), ExtractError>
  where
    K: Fn([usize; 3]) -> Result<(), ExtractError> + Sync + Send,
  {
    let total = dims[0] * dims[1] * dims[2];
    if total == 0 {
      return Ok(());
    }
    let coord = |i: usize| -> [usize; 3] {
      let z = i % dims[2];
      let y = (i / dims[2]) % dims[1];
      let x = i / (dims[1] * dims[2]);
      [x, y, z]
    };

    match *self {
      Dispatch::Parallel => (0..total)
        .into_par_iter()
        .try_for_each(|i| kernel(coord(i))),
      Dispatch::Sequential => (0..total).try_for_each(|i| kernel(coord(i))),
      Dispatch::Shuffled { seed } => {
        let mut order: Vec<usize> = (0..total).collect();
        order.shuffle(&mut StdRng::seed_from_u64(seed));
        order.into_iter().try_for_each(|i| kernel(coord(i)))
      }
    }
  }

  /// Run `kernel` once per item of a slice.
  pub fn run_items<T, K>(&self, items: &[T], kernel: K) -> Result<(), ExtractError>
  where
    T: Sync,
    K: Fn(&T) -> Result<(), ExtractError> + Sync + Send,
  {
    self.run([items.len(), 1, 1], |[i, _, _]| kernel(&items[i]))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::Mutex;

  fn visit_all(dispatch: Dispatch) -> Vec<[usize; 3]> {
    let seen = Mutex::new(Vec::new());
    dispatch
      .run([3, 4, 5], |c| {
        seen.lock().unwrap().push(c);
        Ok(())
      })
      .unwrap();
    seen.into_inner().unwrap()
  }

  #[test]
  fn test_every_coordinate_once() {
    for dispatch in [
      Dispatch::Parallel,
      Dispatch::Sequential,
      Dispatch::Shuffled { seed: 9 },
    ] {
      let mut seen = visit_all(dispatch);
      assert_eq!(seen.len(), 60);
      seen.sort_unstable();
      seen.dedup();
      assert_eq!(seen.len(), 60, "{:?} visited a coordinate twice", dispatch);
      assert!(seen.iter().all(|c| c[0] < 3 && c[1] < 4 && c[2] < 5));
    }
  }

  #[test]
  fn test_sequential_is_z_fastest() {
    let seen = visit_all(Dispatch::Sequential);
    assert_eq!(seen[0], [0, 0, 0]);
    assert_eq!(seen[1], [0, 0, 1]);
    assert_eq!(seen[5], [0, 1, 0]);
  }

  #[test]
  fn test_shuffled_is_deterministic_per_seed() {
    let a = visit_all(Dispatch::Shuffled { seed: 1 });
    let b = visit_all(Dispatch::Shuffled { seed: 1 });
    let c = visit_all(Dispatch::Sequential);
    assert_eq!(a, b);
    assert_ne!(a, c);
  }

  #[test]
  fn test_error_stops_dispatch() {
    let calls = AtomicUsize::new(0);
    let result = Dispatch::Sequential.run([10, 1, 1], |[x, _, _]| {
      calls.fetch_add(1, Ordering::Relaxed);
      if x == 3 {
        Err(ExtractError::UnresolvedKey(3))
      } else {
        Ok(())
      }
    });
    assert_eq!(result, Err(ExtractError::UnresolvedKey(3)));
    assert_eq!(calls.load(Ordering::Relaxed), 4);
  }

  #[test]
  fn test_empty_dims_is_noop() {
    Dispatch::Parallel
      .run([0, 5, 5], |_| Err(ExtractError::UnresolvedKey(0)))
      .unwrap();
  }
}
