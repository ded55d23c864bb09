//! Dual contouring extraction over an octree-collapsed chunk.
//!
//! # Pass Order
//!
//! ```text
//! ┌────────────┐   ┌────────────┐   ┌────────────────┐   ┌────────────────┐   ┌─────────┐
//! │ Initialize │──►│  Collapse  │──►│ CreateVertices │──►│ CreateIndices  │──►│ Normals │
//! │ reset hash │   │ octree +   │   │ packed leaves  │   │ N×N×N cells,   │   │         │
//! │ + buffers  │   │ border pad │   │ 1 vertex/cell  │   │ 3 edges each   │   │         │
//! └────────────┘   └────────────┘   └────────────────┘   └────────────────┘   └─────────┘
//! ```
//!
//! A mixed unit cell gets one vertex at the mass point of its edge crossings,
//! keyed by the cell's minimum-corner sample index. Every crossed edge leaving
//! the minimum corner of an interior cell then becomes a quad joining the four
//! cells around it:
//!
//! ```text
//!          v
//!          ▲
//!   c-u ───┼─── c           quad order c, c-u, c-u-v, c-v is counter-clockwise
//!     │    │    │           around +axis; reversed when the inside is at the
//!  ───┼────●────┼──► u      far end of the edge
//!     │  edge   │
//!  c-u-v ──┼── c-v
//! ```
//!
//! Cells on the negative border (any coordinate `-1`) are padding: they only
//! exist so quads on the chunk's negative faces find all four vertices.

mod vertex_calc;

use glam::{IVec3, Vec3A};

use crate::buffers::AppendBuffer;
use crate::error::ExtractError;
use crate::extract::SurfaceExtractor;
use crate::grid::DensityGrid;
use crate::hash_table::VertexHashTable;
use crate::normals;
use crate::octree::{OctreeCollapser, OctreeLeaf, PackedOctree};
use crate::types::{ExtractConfig, ExtractorKind, MeshData};

pub use vertex_calc::mass_point;

/// Worst-case vertices: one per cell in `[-1, N)^3`.
#[inline]
pub fn max_vertices(resolution: usize) -> usize {
  (resolution + 1).pow(3)
}

/// Worst-case triangles: two per crossed edge, three edges per cell.
#[inline]
pub fn max_triangles(resolution: usize) -> usize {
  6 * resolution.pow(3)
}

/// Dual contouring extractor owning the scratch buffers of one resolution
/// tier.
pub struct DualContouring {
  resolution: usize,
  table: VertexHashTable,
  vertices: AppendBuffer<[f32; 3]>,
  triangles: AppendBuffer<[u32; 3]>,
  collapser: OctreeCollapser,
  octree: PackedOctree,
}

impl DualContouring {
  pub fn new(resolution: usize) -> Self {
    Self {
      resolution,
      table: VertexHashTable::with_capacity(max_vertices(resolution)),
      vertices: AppendBuffer::new("dc vertex", max_vertices(resolution)),
      triangles: AppendBuffer::new("dc triangle", max_triangles(resolution)),
      collapser: OctreeCollapser::new(resolution),
      octree: PackedOctree::default(),
    }
  }

  pub fn resolution(&self) -> usize {
    self.resolution
  }

  /// Vertex table of the most recent pass.
  pub fn vertex_table(&self) -> &VertexHashTable {
    &self.table
  }

  /// Packed octree of the most recent pass. Empty after a degenerate chunk.
  pub fn octree(&self) -> &PackedOctree {
    &self.octree
  }

  fn initialize(&mut self, resolution: usize) {
    self.resolution = resolution;
    self.table.reset(max_vertices(resolution));
    self.vertices.reset(max_vertices(resolution));
    self.triangles.reset(max_triangles(resolution));
  }

  /// CreateVertices kernel for one packed leaf.
  fn create_vertex(&self, grid: &DensityGrid, level: f32, leaf: &OctreeLeaf) -> Result<(), ExtractError> {
    // Coarser leaves are uniform by construction
    if leaf.scale != 1 {
      return Ok(());
    }

    let corners = grid.cell_corners(leaf.origin);
    let below = corners.iter().filter(|&&d| d < level).count();
    if below == 0 || below == 8 {
      return Ok(());
    }

    let reservation = self.table.lookup_or_reserve(grid.cell_key(leaf.origin))?;
    if reservation.is_new {
      let position = leaf.origin.as_vec3a() + mass_point(&corners, level);
      self.vertices.store(reservation.index as usize, position.to_array())?;
    }
    Ok(())
  }

  #[inline]
  fn vertex_of(&self, grid: &DensityGrid, cell: IVec3) -> Result<u32, ExtractError> {
    let key = grid.cell_key(cell);
    self.table.get(key).ok_or(ExtractError::UnresolvedKey(key))
  }

  /// CreateIndices kernel for one interior cell.
  fn create_indices(&self, grid: &DensityGrid, level: f32, cell: IVec3) -> Result<(), ExtractError> {
    let d0 = grid.corner(cell);

    for axis in 0..3 {
      let mut far = cell;
      far[axis] += 1;
      let d1 = grid.corner(far);

      let inside_near = d0 < level;
      if inside_near == (d1 < level) {
        continue;
      }

      let mut u = IVec3::ZERO;
      let mut v = IVec3::ZERO;
      u[(axis + 1) % 3] = 1;
      v[(axis + 2) % 3] = 1;

      let mut quad = [
        self.vertex_of(grid, cell)?,
        self.vertex_of(grid, cell - u)?,
        self.vertex_of(grid, cell - u - v)?,
        self.vertex_of(grid, cell - v)?,
      ];
      if !inside_near {
        quad.reverse();
      }

      self.emit_quad(quad)?;
    }

    Ok(())
  }

  /// Split a quad along its shorter diagonal, keeping its winding.
  fn emit_quad(&self, quad: [u32; 4]) -> Result<(), ExtractError> {
    let p = quad.map(|i| {
      self
        .vertices
        .get(i as usize)
        .map(Vec3A::from_array)
        .ok_or(ExtractError::MissingSlot {
          buffer: "dc vertex",
          index: i as usize,
        })
    });
    let [p0, p1, p2, p3] = p;
    let (p0, p1, p2, p3) = (p0?, p1?, p2?, p3?);

    if p0.distance_squared(p2) <= p1.distance_squared(p3) {
      self.triangles.append([quad[0], quad[1], quad[2]])?;
      self.triangles.append([quad[0], quad[2], quad[3]])?;
    } else {
      self.triangles.append([quad[0], quad[1], quad[3]])?;
      self.triangles.append([quad[1], quad[2], quad[3]])?;
    }
    Ok(())
  }
}

impl SurfaceExtractor for DualContouring {
  fn kind(&self) -> ExtractorKind {
    ExtractorKind::DualContouring
  }

  fn extract(&mut self, grid: &DensityGrid, config: &ExtractConfig) -> Result<MeshData, ExtractError> {
    let n = grid.resolution();
    let _span = tracing::debug_span!("dual_contouring", resolution = n).entered();

    let level = config.surface_level;
    if !grid.classify(level).has_crossing() {
      self.octree = PackedOctree::default();
      return Ok(MeshData::new());
    }

    self.initialize(n);
    self.octree = self.collapser.collapse(grid, level);

    {
      let _span = tracing::trace_span!("create_vertices", leaves = self.octree.leaves().len()).entered();
      let this = &*self;
      config
        .dispatch
        .run_items(this.octree.leaves(), |leaf| this.create_vertex(grid, level, leaf))?;
    }

    {
      let _span = tracing::trace_span!("create_indices").entered();
      let this = &*self;
      config.dispatch.run([n, n, n], |[x, y, z]| {
        this.create_indices(grid, level, IVec3::new(x as i32, y as i32, z as i32))
      })?;
    }

    let vertices = self.vertices.to_vec(self.table.len())?;
    let triangles = self.triangles.to_vec(self.triangles.len())?;
    let indices: Vec<u32> = triangles.into_iter().flatten().collect();

    let mut mesh = MeshData::from_geometry(vertices, indices);
    mesh.normals = normals::compute(config.normal_mode, grid, &mesh.vertices, &mesh.indices);

    tracing::trace!(
      vertices = mesh.vertices.len(),
      triangles = mesh.triangle_count(),
      compression = self.octree.compression_ratio(),
      "dual contouring pass complete"
    );
    Ok(mesh)
  }
}
