//! Time-sliced breadth-first chunk streaming.
//!
//! # Pass
//!
//! ```text
//! begin_pass ── toggle visibility, seed frontier with the chunk nearest the viewer
//!     │
//!     ▼
//! ┌─► dequeue c ── mark visible ── select LOD
//! │       │
//! │       ├─ known:  reactivate if hidden; re-mesh if the new LOD is finer
//! │       └─ new:    mesh, insert, join batch (seal when full)
//! │       │
//! │       ▼
//! │   enqueue 26 neighbours in load range, not queued, not visited
//! │       │
//! │       ├─ restart requested ── merge previous into current, begin_pass
//! │       └─ budget spent ──────── yield (frontier kept)
//! └───────┘
//!     │ frontier empty
//!     ▼
//! hide everything left in previous, Idle
//! ```
//!
//! The walk is an explicit state object: callers drive it with
//! [`ChunkStreamer::advance_one_time_slice`] from whatever loop they own.

use std::collections::{HashMap, HashSet, VecDeque};

use glam::Vec3;
use web_time::Instant;

use super::batch::{BatchKey, BatchMap};
use super::budget::{SliceBudget, StreamStats};
use super::chunk::{Chunk, ChunkCoord};
use super::config::StreamConfig;
use super::lod::{select_lod, within_load_distance};
use super::visibility::VisibilityBuffers;
use crate::density::DensityField;
use crate::error::StreamError;
use crate::extract::{MeshResult, Mesher};
use crate::metrics::TerrainMetrics;

/// Scheduler state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StreamState {
  #[default]
  Idle,
  Streaming,
}

/// Result of one slice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SliceOutcome {
  /// No pass was running.
  Idle,
  /// Budget spent; the pass resumes on the next slice.
  Yielded,
  /// The frontier ran dry and stale chunks were hidden.
  Completed,
}

/// Changes for the mesh consumer, drained with
/// [`ChunkStreamer::drain_events`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamEvent {
  /// A chunk was meshed for the first time.
  ChunkCreated { coord: ChunkCoord, lod: usize },
  /// A chunk was re-meshed at a finer LOD.
  ChunkRegenerated {
    coord: ChunkCoord,
    from_lod: usize,
    to_lod: usize,
  },
  /// A hidden chunk became visible again.
  ChunkActivated(ChunkCoord),
  /// A chunk left the visible set.
  ChunkDeactivated(ChunkCoord),
  /// Every member of a batch now exists.
  BatchSealed(BatchKey),
  /// All chunks were dropped by [`ChunkStreamer::reload_immediate`].
  Reset,
}

/// Streams chunks of `field` around a moving viewer.
pub struct ChunkStreamer<F> {
  config: StreamConfig,
  field: F,
  mesher: Mesher,

  state: StreamState,
  restart_requested: bool,
  frontier: VecDeque<ChunkCoord>,
  queued: HashSet<ChunkCoord>,
  visibility: VisibilityBuffers,

  chunks: HashMap<ChunkCoord, Chunk>,
  batches: BatchMap,

  viewer: Vec3,
  pass_origin: Option<Vec3>,

  events: VecDeque<StreamEvent>,
  stats: StreamStats,
  metrics: TerrainMetrics,
}

impl<F: DensityField> ChunkStreamer<F> {
  /// Validate `config` and allocate one extractor per LOD tier.
  pub fn new(config: StreamConfig, field: F) -> Result<Self, StreamError> {
    config.validate()?;

    let mesher = Mesher::new(config.extractor, config.extract).with_tiers(&config.lod_resolutions);
    let batches = BatchMap::new(config.batch_cube_size);

    tracing::info!(
      lods = ?config.lod_resolutions,
      chunk_size = config.chunk_size,
      load_distance = ?config.load_distance,
      extractor = ?config.extractor,
      "chunk streamer created"
    );

    Ok(Self {
      config,
      field,
      mesher,
      state: StreamState::Idle,
      restart_requested: false,
      frontier: VecDeque::new(),
      queued: HashSet::new(),
      visibility: VisibilityBuffers::new(),
      chunks: HashMap::new(),
      batches,
      viewer: Vec3::ZERO,
      pass_origin: None,
      events: VecDeque::new(),
      stats: StreamStats::default(),
      metrics: TerrainMetrics::new(),
    })
  }

  // ===========================================================================
  // Triggers
  // ===========================================================================

  /// Record the viewer position. Starts a pass, or requests a restart of the
  /// running one, once the viewer is a chunk away from where the last pass
  /// began.
  pub fn on_viewer_moved(&mut self, position: Vec3) {
    self.viewer = position;

    let threshold = self.config.chunk_size * self.config.chunk_size;
    let moved = match self.pass_origin {
      Some(origin) => origin.distance_squared(position) >= threshold,
      None => true,
    };

    if moved {
      self.request_pass();
    }
  }

  /// Start a pass now, or coalesce into a restart if one is running.
  pub fn request_pass(&mut self) {
    match self.state {
      StreamState::Streaming => {
        if !self.restart_requested {
          tracing::debug!(viewer = ?self.viewer, "restart requested");
        }
        self.restart_requested = true;
      }
      StreamState::Idle => self.begin_pass(),
    }
  }

  // ===========================================================================
  // Slicing
  // ===========================================================================

  /// Resume the running pass until the frontier empties or `budget` is spent.
  ///
  /// The budget is checked after each chunk, so a zero budget processes
  /// exactly one chunk and [`SliceBudget::UNLIMITED`] finishes the pass.
  /// A failed chunk mesh is fatal and leaves the pass where it stopped.
  pub fn advance_one_time_slice(&mut self, budget: SliceBudget) -> Result<SliceOutcome, StreamError> {
    if self.state == StreamState::Idle {
      return Ok(SliceOutcome::Idle);
    }

    let _span = tracing::info_span!("stream_slice", frontier = self.frontier.len()).entered();
    let start = Instant::now();
    let mut visited = 0usize;

    let outcome = loop {
      let Some(coord) = self.frontier.pop_front() else {
        // A move that arrived after the last visit still gets its pass
        if self.restart_requested {
          self.restart();
          continue;
        }
        self.finish_pass();
        break SliceOutcome::Completed;
      };
      self.queued.remove(&coord);

      self.visit(coord)?;
      visited += 1;

      if self.restart_requested {
        self.restart();
      }

      if budget.is_exhausted(start.elapsed()) {
        self.stats.slices_yielded += 1;
        break SliceOutcome::Yielded;
      }
    };

    let elapsed_us = start.elapsed().as_micros() as u64;
    self.metrics.record_slice_timing(elapsed_us);
    tracing::trace!(visited, ?outcome, elapsed_us, remaining = self.frontier.len(), "slice done");

    Ok(outcome)
  }

  /// Finish the running pass in one go, starting one first if idle.
  pub fn run_to_completion(&mut self) -> Result<(), StreamError> {
    if self.state == StreamState::Idle {
      self.request_pass();
    }
    while self.advance_one_time_slice(SliceBudget::UNLIMITED)? == SliceOutcome::Yielded {}
    Ok(())
  }

  /// Drop every chunk and batch, then stream from scratch in one go.
  pub fn reload_immediate(&mut self) -> Result<(), StreamError> {
    tracing::info!(chunks = self.chunks.len(), "reloading all chunks");

    self.chunks.clear();
    self.batches.clear();
    self.visibility.clear();
    self.frontier.clear();
    self.queued.clear();
    self.restart_requested = false;
    self.state = StreamState::Idle;
    self.pass_origin = None;
    self.metrics.reset();
    self.events.clear();
    self.events.push_back(StreamEvent::Reset);

    self.run_to_completion()
  }

  // ===========================================================================
  // Pass internals
  // ===========================================================================

  fn begin_pass(&mut self) {
    self.state = StreamState::Streaming;
    self.pass_origin = Some(self.viewer);
    self.frontier.clear();
    self.queued.clear();
    self.visibility.toggle();
    self.stats.passes_started += 1;

    let seed = ChunkCoord::closest_to(self.viewer, self.config.chunk_size);
    if self.admits(seed) {
      self.enqueue(seed);
    }

    tracing::debug!(viewer = ?self.viewer, ?seed, frontier = self.frontier.len(), "pass started");
  }

  /// Abandon the frontier and start over from the current viewer without
  /// hiding anything the interrupted pass had not reached yet.
  fn restart(&mut self) {
    self.restart_requested = false;
    self.stats.restarts += 1;
    self.visibility.merge_previous_into_current();
    self.begin_pass();
  }

  fn finish_pass(&mut self) {
    let mut stale: Vec<ChunkCoord> = self.visibility.take_previous().into_iter().collect();
    stale.sort_unstable();

    for coord in stale {
      let Some(chunk) = self.chunks.get_mut(&coord) else {
        continue;
      };
      if !chunk.active {
        continue;
      }
      chunk.active = false;
      self
        .metrics
        .remove_chunk(chunk.lod, chunk.mesh.vertices.len(), chunk.mesh.triangle_count());
      self.stats.chunks_deactivated += 1;
      self.events.push_back(StreamEvent::ChunkDeactivated(coord));
      tracing::debug!(?coord, "chunk deactivated");
    }

    self.state = StreamState::Idle;
    self.stats.passes_completed += 1;
    tracing::debug!(
      visible = self.visibility.current().len(),
      total = self.chunks.len(),
      "pass completed"
    );
  }

  #[inline]
  fn admits(&self, coord: ChunkCoord) -> bool {
    self.config.load_distance.min_element() > 0
      && within_load_distance(
        coord.world_position(self.config.chunk_size),
        self.viewer,
        self.config.load_extent(),
      )
  }

  #[inline]
  fn enqueue(&mut self, coord: ChunkCoord) {
    self.queued.insert(coord);
    self.frontier.push_back(coord);
  }

  fn visit(&mut self, coord: ChunkCoord) -> Result<(), StreamError> {
    self.stats.chunks_visited += 1;
    self.visibility.mark_visible(coord);

    let lod = select_lod(
      coord.world_position(self.config.chunk_size),
      self.viewer,
      self.config.chunk_size,
      self.config.load_distance,
      self.config.lod_count(),
    );

    match self.chunks.get(&coord).map(|chunk| (chunk.lod, chunk.active)) {
      Some((current_lod, active)) => {
        if !active {
          self.activate(coord);
        }
        // Refine only: a chunk keeps its finer mesh when the viewer backs off
        if current_lod > lod {
          self.regenerate(coord, current_lod, lod)?;
        }
      }
      None => self.create(coord, lod)?,
    }

    for neighbor in coord.neighbors() {
      if !self.queued.contains(&neighbor) && !self.visibility.is_current(&neighbor) && self.admits(neighbor) {
        self.enqueue(neighbor);
      }
    }

    Ok(())
  }

  fn mesh(&mut self, coord: ChunkCoord, resolution: usize) -> Result<MeshResult, StreamError> {
    let origin = coord.world_position(self.config.chunk_size);
    let voxel_size = self.config.voxel_size(resolution);

    let result = self
      .mesher
      .generate(&self.field, origin, voxel_size, resolution)
      .map_err(|source| StreamError::Mesh {
        coord: coord.as_ivec3(),
        source,
      })?;

    self.metrics.record_mesh_timing(result.timing_us);
    Ok(result)
  }

  fn create(&mut self, coord: ChunkCoord, lod: usize) -> Result<(), StreamError> {
    let resolution = self.config.resolution_for(lod);
    let result = self.mesh(coord, resolution)?;
    let (batch, sealed) = self.batches.insert(coord);

    let chunk = Chunk::new(coord, batch, self.config.chunk_size, lod, resolution, result);
    self
      .metrics
      .add_chunk(lod, chunk.mesh.vertices.len(), chunk.mesh.triangle_count());
    tracing::debug!(
      ?coord,
      lod,
      resolution,
      triangles = chunk.mesh.triangle_count(),
      "chunk created"
    );
    self.chunks.insert(coord, chunk);

    self.stats.chunks_created += 1;
    self.events.push_back(StreamEvent::ChunkCreated { coord, lod });

    if let Some(key) = sealed {
      self.stats.batches_sealed += 1;
      self.events.push_back(StreamEvent::BatchSealed(key));
      tracing::debug!(?key, "batch sealed");
    }
    Ok(())
  }

  fn regenerate(&mut self, coord: ChunkCoord, from_lod: usize, to_lod: usize) -> Result<(), StreamError> {
    let resolution = self.config.resolution_for(to_lod);
    let result = self.mesh(coord, resolution)?;
    let chunk_size = self.config.chunk_size;

    if let Some(chunk) = self.chunks.get_mut(&coord) {
      if chunk.active {
        self
          .metrics
          .remove_chunk(chunk.lod, chunk.mesh.vertices.len(), chunk.mesh.triangle_count());
      }
      chunk.replace_mesh(chunk_size, to_lod, resolution, result);
      if chunk.active {
        self
          .metrics
          .add_chunk(to_lod, chunk.mesh.vertices.len(), chunk.mesh.triangle_count());
      }
    }

    self.stats.chunks_regenerated += 1;
    self.events.push_back(StreamEvent::ChunkRegenerated {
      coord,
      from_lod,
      to_lod,
    });
    tracing::debug!(?coord, from_lod, to_lod, "chunk regenerated");
    Ok(())
  }

  fn activate(&mut self, coord: ChunkCoord) {
    if let Some(chunk) = self.chunks.get_mut(&coord) {
      chunk.active = true;
      self
        .metrics
        .add_chunk(chunk.lod, chunk.mesh.vertices.len(), chunk.mesh.triangle_count());
      self.stats.chunks_activated += 1;
      self.events.push_back(StreamEvent::ChunkActivated(coord));
      tracing::debug!(?coord, "chunk activated");
    }
  }
}

impl<F> ChunkStreamer<F> {
  // ===========================================================================
  // Accessors
  // ===========================================================================

  /// Take every event queued since the last drain, oldest first.
  pub fn drain_events(&mut self) -> Vec<StreamEvent> {
    self.events.drain(..).collect()
  }

  pub fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
    self.chunks.get(&coord)
  }

  pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
    self.chunks.values()
  }

  pub fn chunk_count(&self) -> usize {
    self.chunks.len()
  }

  pub fn batches(&self) -> &BatchMap {
    &self.batches
  }

  /// Chunks visited by the running or last completed pass.
  pub fn visible(&self) -> &HashSet<ChunkCoord> {
    self.visibility.current()
  }

  pub fn state(&self) -> StreamState {
    self.state
  }

  pub fn is_streaming(&self) -> bool {
    self.state == StreamState::Streaming
  }

  pub fn restart_requested(&self) -> bool {
    self.restart_requested
  }

  pub fn frontier_len(&self) -> usize {
    self.frontier.len()
  }

  pub fn viewer(&self) -> Vec3 {
    self.viewer
  }

  pub fn config(&self) -> &StreamConfig {
    &self.config
  }

  pub fn field(&self) -> &F {
    &self.field
  }

  pub fn stats(&self) -> &StreamStats {
    &self.stats
  }

  pub fn metrics(&self) -> &TerrainMetrics {
    &self.metrics
  }
}

#[cfg(test)]
#[path = "streamer_test.rs"]
mod streamer_test;
