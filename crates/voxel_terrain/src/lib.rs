//! voxel_terrain - streamed level-of-detail isosurface terrain
//!
//! Density fields are sampled into padded per-chunk grids and meshed by one
//! of two extractors. A time-sliced scheduler streams chunks around a moving
//! viewer, choosing a resolution per chunk by distance.
//!
//! # Features
//!
//! - **Marching cubes**: one vertex per crossed edge, deduplicated through a
//!   lock-free vertex hash table
//! - **Dual contouring**: one vertex per mixed cell, with an octree collapse
//!   pre-pass that merges uniform regions
//! - **Order-independent kernels**: every pass runs under parallel,
//!   sequential or shuffled dispatch with identical output
//! - **Chunk streaming**: breadth-first, budgeted walk with refine-only LOD,
//!   double-buffered visibility and coalesced restarts
//!
//! # Example
//!
//! ```ignore
//! use voxel_terrain::{ExtractConfig, ExtractorKind, Mesher, SphereField};
//! use glam::Vec3;
//!
//! let field = SphereField::new(Vec3::splat(16.0), 10.0);
//! let mut mesher = Mesher::new(ExtractorKind::MarchingCubes, ExtractConfig::default());
//! let result = mesher.generate(&field, Vec3::ZERO, 1.0, 32)?;
//!
//! println!("{} vertices, {} triangles in {}us",
//!     result.mesh.vertices.len(), result.mesh.triangle_count(), result.timing_us);
//! ```

pub mod buffers;
pub mod constants;
pub mod density;
pub mod dispatch;
pub mod error;
pub mod grid;
pub mod hash_table;
pub mod metrics;
pub mod normals;
pub mod types;

// Re-export commonly used items
pub use constants::{coord_to_index, grid_dim, index_to_coord, CORNER_OFFSETS, MAX_RESOLUTION};
pub use density::{DensityField, NoiseTerrain, PlaneField, SphereField};
pub use dispatch::Dispatch;
pub use error::{ConfigError, ExtractError, StreamError};
pub use grid::{DensityClass, DensityGrid};
pub use hash_table::{Reservation, VertexHashTable};
pub use metrics::TerrainMetrics;
pub use types::{ExtractConfig, ExtractorKind, MeshData, MinMaxAABB, NormalMode};

// Extractors
pub mod dual_contouring;
pub mod extract;
pub mod marching_cubes;
pub use dual_contouring::DualContouring;
pub use extract::{Extractor, MeshResult, Mesher, SurfaceExtractor};
pub use marching_cubes::MarchingCubes;

// Octree collapse for dual contouring
pub mod octree;
pub use octree::{OctreeCollapser, OctreeLeaf, PackedOctree};

// Time-sliced chunk streaming
pub mod streaming;
pub use streaming::{ChunkCoord, ChunkStreamer, SliceBudget, SliceOutcome, StreamConfig, StreamEvent};
