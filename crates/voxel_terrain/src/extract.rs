//! Extractor selection and per-tier scratch ownership.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │ Mesher                                                           │
//! │                                                                  │
//! │  generate(field, origin, voxel_size, resolution)                 │
//! │           │                                                      │
//! │           ▼                                                      │
//! │  DensityGrid::sample ──► tiers[resolution]: Extractor            │
//! │                           ├─ MarchingCubes                       │
//! │                           └─ DualContouring (+ OctreeCollapser)  │
//! │           │                                                      │
//! │           ▼                                                      │
//! │  MeshResult { mesh, timing_us, packed_leaves }                   │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each resolution tier keeps one extractor whose hash table and buffers are
//! sized for that tier and reused by every chunk meshed at it. Chunks are
//! meshed one at a time, so a tier's scratch is never shared by two passes.

use std::collections::HashMap;

use glam::Vec3;
use web_time::Instant;

use crate::density::DensityField;
use crate::dual_contouring::DualContouring;
use crate::error::ExtractError;
use crate::grid::DensityGrid;
use crate::marching_cubes::MarchingCubes;
use crate::octree::PackedOctree;
use crate::types::{ExtractConfig, ExtractorKind, MeshData};

/// An isosurface algorithm that turns a padded density grid into a mesh.
///
/// Implementations own their scratch and may be called repeatedly with grids
/// of any resolution; buffers grow as needed.
pub trait SurfaceExtractor: Send {
  fn kind(&self) -> ExtractorKind;

  /// Run every pass over `grid`. A grid without a crossing yields an empty
  /// mesh without dispatching any kernel.
  fn extract(&mut self, grid: &DensityGrid, config: &ExtractConfig) -> Result<MeshData, ExtractError>;
}

/// Extractor variant chosen once at configuration time.
pub enum Extractor {
  MarchingCubes(MarchingCubes),
  DualContouring(DualContouring),
}

impl Extractor {
  /// Allocate an extractor of `kind` with scratch sized for `resolution`.
  pub fn new(kind: ExtractorKind, resolution: usize) -> Self {
    match kind {
      ExtractorKind::MarchingCubes => Extractor::MarchingCubes(MarchingCubes::new(resolution)),
      ExtractorKind::DualContouring => Extractor::DualContouring(DualContouring::new(resolution)),
    }
  }

  /// Packed octree of the last pass, dual contouring only.
  pub fn packed_octree(&self) -> Option<&PackedOctree> {
    match self {
      Extractor::MarchingCubes(_) => None,
      Extractor::DualContouring(dc) => Some(dc.octree()),
    }
  }
}

impl SurfaceExtractor for Extractor {
  fn kind(&self) -> ExtractorKind {
    match self {
      Extractor::MarchingCubes(mc) => mc.kind(),
      Extractor::DualContouring(dc) => dc.kind(),
    }
  }

  fn extract(&mut self, grid: &DensityGrid, config: &ExtractConfig) -> Result<MeshData, ExtractError> {
    match self {
      Extractor::MarchingCubes(mc) => mc.extract(grid, config),
      Extractor::DualContouring(dc) => dc.extract(grid, config),
    }
  }
}

/// Output of meshing one chunk.
#[derive(Clone, Debug)]
pub struct MeshResult {
  pub mesh: MeshData,
  /// Sampling plus extraction time.
  pub timing_us: u64,
  /// Interior leaves of the packed octree (dual contouring, non-degenerate
  /// chunks only).
  pub packed_leaves: Option<usize>,
}

/// Owns one extractor per resolution tier.
pub struct Mesher {
  kind: ExtractorKind,
  config: ExtractConfig,
  tiers: HashMap<usize, Extractor>,
}

impl Mesher {
  pub fn new(kind: ExtractorKind, config: ExtractConfig) -> Self {
    Self {
      kind,
      config,
      tiers: HashMap::new(),
    }
  }

  /// Pre-allocate scratch for every resolution in `resolutions`.
  pub fn with_tiers(mut self, resolutions: &[usize]) -> Self {
    for &resolution in resolutions {
      self.tier(resolution);
    }
    self
  }

  pub fn kind(&self) -> ExtractorKind {
    self.kind
  }

  pub fn config(&self) -> &ExtractConfig {
    &self.config
  }

  /// Number of resolution tiers with allocated scratch.
  pub fn tier_count(&self) -> usize {
    self.tiers.len()
  }

  fn tier(&mut self, resolution: usize) -> &mut Extractor {
    let kind = self.kind;
    self
      .tiers
      .entry(resolution)
      .or_insert_with(|| Extractor::new(kind, resolution))
  }

  /// Sample `field` for a chunk whose cell (0,0,0) corner sits at `origin`
  /// and mesh it at `resolution`.
  pub fn generate<F: DensityField + ?Sized>(
    &mut self,
    field: &F,
    origin: Vec3,
    voxel_size: f32,
    resolution: usize,
  ) -> Result<MeshResult, ExtractError> {
    let start = Instant::now();
    let grid = DensityGrid::sample(field, origin, voxel_size, resolution)?;
    self.mesh_grid(&grid, start)
  }

  /// Mesh an already sampled grid.
  pub fn extract(&mut self, grid: &DensityGrid) -> Result<MeshResult, ExtractError> {
    self.mesh_grid(grid, Instant::now())
  }

  fn mesh_grid(&mut self, grid: &DensityGrid, start: Instant) -> Result<MeshResult, ExtractError> {
    let config = self.config;
    let extractor = self.tier(grid.resolution());
    let mesh = extractor.extract(grid, &config)?;

    let packed_leaves = extractor
      .packed_octree()
      .filter(|octree| octree.resolution() > 0)
      .map(|octree| octree.interior().len());

    Ok(MeshResult {
      mesh,
      timing_us: start.elapsed().as_micros() as u64,
      packed_leaves,
    })
  }
}
