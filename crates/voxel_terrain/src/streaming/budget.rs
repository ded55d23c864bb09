//! Time budget and counters for the sliced streaming walk.
//!
//! A slice processes whole chunks and checks the budget after each one, so a
//! zero budget advances exactly one chunk per slice.

use std::time::Duration;

/// Wall-clock allowance for one call to
/// [`ChunkStreamer::advance_one_time_slice`](super::ChunkStreamer::advance_one_time_slice).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SliceBudget {
	/// Yield once this much time has elapsed within the slice.
	pub max_time: Duration,
}

impl SliceBudget {
	/// Four milliseconds, a quarter of a 60 Hz frame.
	pub const DEFAULT: Self = Self {
		max_time: Duration::from_millis(4),
	};

	/// Never yield; the pass runs to completion in one slice.
	pub const UNLIMITED: Self = Self {
		max_time: Duration::MAX,
	};

	/// Yield after every chunk. Deterministic, used to drive passes step by
	/// step.
	pub const SINGLE_STEP: Self = Self {
		max_time: Duration::ZERO,
	};

	pub const fn from_millis(millis: u64) -> Self {
		Self {
			max_time: Duration::from_millis(millis),
		}
	}

	/// Check whether a slice that has run for `elapsed` must yield.
	#[inline]
	pub fn is_exhausted(&self, elapsed: Duration) -> bool {
		elapsed >= self.max_time
	}
}

impl Default for SliceBudget {
	fn default() -> Self {
		Self::DEFAULT
	}
}

impl From<Duration> for SliceBudget {
	fn from(max_time: Duration) -> Self {
		Self { max_time }
	}
}

/// Cumulative streaming statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamStats {
	/// Passes begun, including restarts.
	pub passes_started: usize,
	/// Passes that exhausted their frontier.
	pub passes_completed: usize,
	/// Passes abandoned for a coalesced restart.
	pub restarts: usize,
	/// Chunks dequeued from the frontier.
	pub chunks_visited: usize,
	/// Chunks meshed for the first time.
	pub chunks_created: usize,
	/// Chunks re-meshed at a finer LOD.
	pub chunks_regenerated: usize,
	/// Inactive chunks made visible again.
	pub chunks_activated: usize,
	/// Chunks hidden at the end of a pass.
	pub chunks_deactivated: usize,
	/// Batches that reached their full member count.
	pub batches_sealed: usize,
	/// Slices that yielded before the pass finished.
	pub slices_yielded: usize,
}

impl StreamStats {
	/// Meshes generated, first-time and refined.
	#[inline]
	pub fn meshes_generated(&self) -> usize {
		self.chunks_created + self.chunks_regenerated
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_budget() {
		let budget = SliceBudget::default();
		assert_eq!(budget.max_time, Duration::from_millis(4));
		assert!(!budget.is_exhausted(Duration::from_millis(3)));
		assert!(budget.is_exhausted(Duration::from_millis(4)));
	}

	#[test]
	fn test_single_step_always_exhausted() {
		assert!(SliceBudget::SINGLE_STEP.is_exhausted(Duration::ZERO));
	}

	#[test]
	fn test_unlimited_never_exhausted() {
		assert!(!SliceBudget::UNLIMITED.is_exhausted(Duration::from_secs(3600)));
	}

	#[test]
	fn test_from_duration() {
		assert_eq!(SliceBudget::from(Duration::from_millis(7)), SliceBudget::from_millis(7));
	}

	#[test]
	fn test_meshes_generated() {
		let stats = StreamStats {
			chunks_created: 10,
			chunks_regenerated: 3,
			..Default::default()
		};
		assert_eq!(stats.meshes_generated(), 13);
	}
}
