//! Engine-agnostic statistics for the streamed terrain.
//!
//! # Usage
//!
//! ```ignore
//! let metrics = streamer.metrics();
//! println!("{} active chunks, avg mesh {:.0}us",
//!     metrics.active_chunks(), metrics.avg_mesh_timing_us());
//! ```

use std::collections::VecDeque;

/// Maximum LOD levels tracked per-level.
pub const MAX_TRACKED_LODS: usize = 16;

/// Rolling window for storing recent values (e.g., timing history).
#[derive(Debug, Clone)]
pub struct RollingWindow<T> {
    buffer: VecDeque<T>,
    capacity: usize,
}

impl<T> RollingWindow<T> {
    /// Create a new rolling window with the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push a new value, evicting the oldest if at capacity.
    pub fn push(&mut self, value: T) {
        if self.capacity == 0 {
            return;
        }
        if self.buffer.len() >= self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Iterate over values (oldest to newest).
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.buffer.iter()
    }

    /// Get the most recent value.
    pub fn last(&self) -> Option<&T> {
        self.buffer.back()
    }
}

impl<T: Copy + Default + std::ops::Add<Output = T>> RollingWindow<T> {
    /// Compute the sum of all values.
    pub fn sum(&self) -> T {
        self.buffer.iter().copied().fold(T::default(), |acc, x| acc + x)
    }
}

impl RollingWindow<u64> {
    /// Compute the average of all values.
    pub fn average(&self) -> f64 {
        if self.buffer.is_empty() {
            0.0
        } else {
            self.sum() as f64 / self.buffer.len() as f64
        }
    }

    /// Get min and max values.
    pub fn min_max(&self) -> Option<(u64, u64)> {
        let min = *self.buffer.iter().min()?;
        let max = *self.buffer.iter().max()?;
        Some((min, max))
    }
}

impl Default for RollingWindow<u64> {
    fn default() -> Self {
        Self::new(128) // Default to 128 samples (~2 seconds at 60fps)
    }
}

/// Terrain statistics updated as chunks are meshed and retired.
#[derive(Debug, Clone)]
pub struct TerrainMetrics {
    /// Active chunk count at each LOD index.
    pub chunks_per_lod: [u32; MAX_TRACKED_LODS],
    /// Active vertex count at each LOD index.
    pub vertices_per_lod: [u64; MAX_TRACKED_LODS],
    /// Active triangle count at each LOD index.
    pub triangles_per_lod: [u64; MAX_TRACKED_LODS],

    /// Rolling window of chunk mesh times in microseconds.
    pub mesh_timings: RollingWindow<u64>,
    /// Rolling window of time slice durations in microseconds.
    pub slice_timings: RollingWindow<u64>,

    /// Last chunk mesh time in microseconds.
    pub last_mesh_us: u64,
    /// Total chunk meshes generated this session (including regenerations).
    pub total_meshes_generated: u64,
}

impl Default for TerrainMetrics {
    fn default() -> Self {
        Self {
            chunks_per_lod: [0; MAX_TRACKED_LODS],
            vertices_per_lod: [0; MAX_TRACKED_LODS],
            triangles_per_lod: [0; MAX_TRACKED_LODS],
            mesh_timings: RollingWindow::new(128),
            slice_timings: RollingWindow::new(128),
            last_mesh_us: 0,
            total_meshes_generated: 0,
        }
    }
}

impl TerrainMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset everything except the cumulative mesh count.
    pub fn reset(&mut self) {
        self.chunks_per_lod.fill(0);
        self.vertices_per_lod.fill(0);
        self.triangles_per_lod.fill(0);
        self.mesh_timings.clear();
        self.slice_timings.clear();
        self.last_mesh_us = 0;
    }

    pub fn record_mesh_timing(&mut self, timing_us: u64) {
        self.mesh_timings.push(timing_us);
        self.last_mesh_us = timing_us;
        self.total_meshes_generated += 1;
    }

    pub fn record_slice_timing(&mut self, timing_us: u64) {
        self.slice_timings.push(timing_us);
    }

    /// Count a chunk as active at `lod`.
    pub fn add_chunk(&mut self, lod: usize, vertex_count: usize, triangle_count: usize) {
        let lod_idx = lod.min(MAX_TRACKED_LODS - 1);
        self.chunks_per_lod[lod_idx] += 1;
        self.vertices_per_lod[lod_idx] += vertex_count as u64;
        self.triangles_per_lod[lod_idx] += triangle_count as u64;
    }

    /// Stop counting a chunk previously added at `lod`.
    pub fn remove_chunk(&mut self, lod: usize, vertex_count: usize, triangle_count: usize) {
        let lod_idx = lod.min(MAX_TRACKED_LODS - 1);
        self.chunks_per_lod[lod_idx] = self.chunks_per_lod[lod_idx].saturating_sub(1);
        self.vertices_per_lod[lod_idx] =
            self.vertices_per_lod[lod_idx].saturating_sub(vertex_count as u64);
        self.triangles_per_lod[lod_idx] =
            self.triangles_per_lod[lod_idx].saturating_sub(triangle_count as u64);
    }

    pub fn active_chunks(&self) -> u32 {
        self.chunks_per_lod.iter().sum()
    }

    pub fn active_vertices(&self) -> u64 {
        self.vertices_per_lod.iter().sum()
    }

    pub fn active_triangles(&self) -> u64 {
        self.triangles_per_lod.iter().sum()
    }

    pub fn avg_mesh_timing_us(&self) -> f64 {
        self.mesh_timings.average()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rolling_window() {
        let mut window = RollingWindow::new(3);
        assert!(window.is_empty());

        window.push(10u64);
        window.push(20);
        window.push(30);
        assert_eq!(window.len(), 3);
        assert_eq!(window.sum(), 60);
        assert_eq!(window.average(), 20.0);

        // Push one more, oldest should be evicted
        window.push(40);
        assert_eq!(window.len(), 3);
        assert_eq!(window.sum(), 90);
        assert_eq!(window.average(), 30.0);
        assert_eq!(window.last(), Some(&40));

        let (min, max) = window.min_max().unwrap();
        assert_eq!(min, 20);
        assert_eq!(max, 40);
    }

    #[test]
    fn test_empty_window() {
        let window = RollingWindow::<u64>::default();
        assert_eq!(window.average(), 0.0);
        assert_eq!(window.min_max(), None);
    }

    #[test]
    fn test_chunk_accounting() {
        let mut metrics = TerrainMetrics::new();

        metrics.add_chunk(0, 1000, 300);
        metrics.add_chunk(1, 500, 150);
        metrics.add_chunk(0, 800, 240);

        assert_eq!(metrics.chunks_per_lod[0], 2);
        assert_eq!(metrics.chunks_per_lod[1], 1);
        assert_eq!(metrics.active_chunks(), 3);
        assert_eq!(metrics.active_triangles(), 690);

        metrics.remove_chunk(0, 1000, 300);
        assert_eq!(metrics.chunks_per_lod[0], 1);
        assert_eq!(metrics.active_vertices(), 1300);
    }

    #[test]
    fn test_lod_index_is_clamped() {
        let mut metrics = TerrainMetrics::new();
        metrics.add_chunk(99, 1, 1);
        assert_eq!(metrics.chunks_per_lod[MAX_TRACKED_LODS - 1], 1);
    }

    #[test]
    fn test_timing_recording() {
        let mut metrics = TerrainMetrics::new();

        metrics.record_mesh_timing(1000);
        metrics.record_mesh_timing(2000);
        metrics.record_mesh_timing(3000);

        assert_eq!(metrics.mesh_timings.len(), 3);
        assert_eq!(metrics.avg_mesh_timing_us(), 2000.0);
        assert_eq!(metrics.last_mesh_us, 3000);
        assert_eq!(metrics.total_meshes_generated, 3);

        metrics.reset();
        assert!(metrics.mesh_timings.is_empty());
        assert_eq!(metrics.total_meshes_generated, 3);
    }
}
