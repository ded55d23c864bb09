//! Chunk streaming around a moving viewer.
//!
//! # Module Structure
//!
//! - [`config`]: `StreamConfig` - LOD table, chunk size, load distance
//! - [`budget`]: `SliceBudget`, `StreamStats` - slice time allowance, counters
//! - [`chunk`]: `ChunkCoord`, `Chunk` - identity and per-chunk state
//! - [`lod`]: distance to LOD mapping and load range test
//! - [`batch`]: `BatchMap` - cubes of chunks sealed once complete
//! - [`visibility`]: `VisibilityBuffers` - current / previous pass sets
//! - [`streamer`]: `ChunkStreamer` - the resumable breadth-first walk
//!
//! # Usage
//!
//! ```ignore
//! let mut streamer = ChunkStreamer::new(StreamConfig::default(), NoiseTerrain::default())?;
//! loop {
//!     streamer.on_viewer_moved(camera_position);
//!     streamer.advance_one_time_slice(streamer.config().time_budget)?;
//!     for event in streamer.drain_events() {
//!         // upload / hide meshes via streamer.chunk(coord)
//!     }
//! }
//! ```

pub mod batch;
pub mod budget;
pub mod chunk;
pub mod config;
pub mod lod;
pub mod streamer;
pub mod visibility;

pub use batch::{Batch, BatchKey, BatchMap};
pub use budget::{SliceBudget, StreamStats};
pub use chunk::{Chunk, ChunkCoord};
pub use config::StreamConfig;
pub use lod::{select_lod, within_load_distance};
pub use streamer::{ChunkStreamer, SliceOutcome, StreamEvent, StreamState};
pub use visibility::VisibilityBuffers;
