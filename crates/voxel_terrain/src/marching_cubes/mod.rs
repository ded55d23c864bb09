//! Marching cubes extraction with hashed edge-vertex deduplication.
//!
//! # Pass Order
//!
//! ```text
//! ┌────────────┐   ┌──────────────────┐   ┌──────────────┐   ┌───────────┐
//! │ Initialize │──►│ CreateVerts N×N×N │──►│   Finalize   │──►│  Normals  │
//! │ reset hash │   │ reserve edge keys │   │ key → index  │   │ per vertex│
//! │ + buffers  │   │ emit key triples  │   │ rewrite      │   │           │
//! └────────────┘   └──────────────────┘   └──────────────┘   └───────────┘
//! ```
//!
//! Each crossed edge is keyed by `3 * (minimum-corner sample index) + axis`,
//! so the up to four cells sharing an edge agree on its key and the vertex is
//! created once. Triangles are written as edge-key triples during
//! CreateVerts and resolved to vertex indices in Finalize, after every key
//! has been published.
//!
//! Triangles are wound counter-clockwise when seen from outside (above the
//! surface level).

pub mod tables;

use glam::{IVec3, Vec3};
use rayon::prelude::*;

use crate::buffers::AppendBuffer;
use crate::constants::coord_to_index;
use crate::error::ExtractError;
use crate::extract::SurfaceExtractor;
use crate::grid::DensityGrid;
use crate::hash_table::{VertexHashTable, EMPTY_KEY};
use crate::normals;
use crate::types::{ExtractConfig, ExtractorKind, MeshData};
use tables::{CORNERS, EDGE_AXIS, EDGE_CORNERS, EDGE_MIN_CORNER, TRIANGULATION};

/// Per-edge key offsets relative to `3 * cell_key` for a grid dimension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EdgeKeyTable {
  offsets: [u32; 12],
}

impl EdgeKeyTable {
  pub fn new(dim: usize) -> Self {
    let mut offsets = [0u32; 12];
    for (edge, offset) in offsets.iter_mut().enumerate() {
      let [x, y, z] = EDGE_MIN_CORNER[edge];
      *offset = (3 * coord_to_index(x, y, z, dim) + EDGE_AXIS[edge]) as u32;
    }
    Self { offsets }
  }

  /// Key of `edge` of the cell whose minimum-corner sample key is
  /// `cell_key`.
  #[inline]
  pub fn key(&self, cell_key: u32, edge: usize) -> u32 {
    3 * cell_key + self.offsets[edge]
  }
}

/// Worst-case distinct crossed edges for `resolution` cells per axis.
#[inline]
pub fn max_vertices(resolution: usize) -> usize {
  3 * (resolution + 1).pow(3)
}

/// Worst-case triangles (5 per cell).
#[inline]
pub fn max_triangles(resolution: usize) -> usize {
  5 * resolution.pow(3)
}

/// Marching cubes extractor owning the scratch buffers of one resolution
/// tier.
pub struct MarchingCubes {
  resolution: usize,
  table: VertexHashTable,
  vertices: AppendBuffer<[f32; 3]>,
  triangles: AppendBuffer<[u32; 3]>,
}

impl MarchingCubes {
  pub fn new(resolution: usize) -> Self {
    Self {
      resolution,
      table: VertexHashTable::with_capacity(max_vertices(resolution)),
      vertices: AppendBuffer::new("mc vertex", max_vertices(resolution)),
      triangles: AppendBuffer::new("mc triangle", max_triangles(resolution)),
    }
  }

  /// Resolution these buffers are sized for.
  pub fn resolution(&self) -> usize {
    self.resolution
  }

  /// Vertex table of the most recent pass.
  pub fn vertex_table(&self) -> &VertexHashTable {
    &self.table
  }

  fn initialize(&mut self, resolution: usize) {
    self.resolution = resolution;
    self.table.reset(max_vertices(resolution));
    self.vertices.reset(max_vertices(resolution));
    self.triangles.reset(max_triangles(resolution));
  }

  /// CreateVerts kernel for one cell.
  fn create_verts(
    &self,
    grid: &DensityGrid,
    edges: &EdgeKeyTable,
    level: f32,
    cell: IVec3,
  ) -> Result<(), ExtractError> {
    let corner_pos = CORNERS.map(|[x, y, z]| cell + IVec3::new(x as i32, y as i32, z as i32));
    let density = corner_pos.map(|c| grid.corner(c));

    let mut config = 0usize;
    for (i, &d) in density.iter().enumerate() {
      if d < level {
        config |= 1 << i;
      }
    }
    if config == 0 || config == 0xFF {
      return Ok(());
    }

    let cell_key = grid.cell_key(cell);
    let mut keys = [EMPTY_KEY; 12];

    for (edge, key_slot) in keys.iter_mut().enumerate() {
      let [a, b] = EDGE_CORNERS[edge];
      if (config >> a) & 1 == (config >> b) & 1 {
        continue;
      }

      let key = edges.key(cell_key, edge);
      let reservation = self.table.lookup_or_reserve(key)?;
      if reservation.is_new {
        // Interpolate from the minimum corner so every sharing cell computes
        // bit-identical positions
        let axis = EDGE_AXIS[edge];
        let (a, b) = if CORNERS[a][axis] < CORNERS[b][axis] { (a, b) } else { (b, a) };
        let (da, db) = (density[a], density[b]);
        let t = (level - da) / (db - da);
        let pa = corner_pos[a].as_vec3();
        let pb = corner_pos[b].as_vec3();
        let position: Vec3 = pa + (pb - pa) * t;
        self.vertices.store(reservation.index as usize, position.to_array())?;
      }
      *key_slot = key;
    }

    for tri in TRIANGULATION[config].chunks_exact(3) {
      if tri[0] < 0 {
        break;
      }
      // Table winding faces inward; swap to face outward
      self.triangles.append([
        keys[tri[0] as usize],
        keys[tri[2] as usize],
        keys[tri[1] as usize],
      ])?;
    }

    Ok(())
  }

  /// Finalize: rewrite edge keys to vertex indices.
  fn finalize(&self) -> Result<Vec<u32>, ExtractError> {
    let triangles = self.triangles.to_vec(self.triangles.len())?;
    let resolved = triangles
      .par_iter()
      .map(|tri| {
        let mut out = [0u32; 3];
        for (slot, &key) in out.iter_mut().zip(tri) {
          *slot = self.table.get(key).ok_or(ExtractError::UnresolvedKey(key))?;
        }
        Ok(out)
      })
      .collect::<Result<Vec<[u32; 3]>, ExtractError>>()?;

    Ok(resolved.into_iter().flatten().collect())
  }
}

impl SurfaceExtractor for MarchingCubes {
  fn kind(&self) -> ExtractorKind {
    ExtractorKind::MarchingCubes
  }

  fn extract(&mut self, grid: &DensityGrid, config: &ExtractConfig) -> Result<MeshData, ExtractError> {
    let n = grid.resolution();
    let _span = tracing::debug_span!("marching_cubes", resolution = n).entered();

    if !grid.classify(config.surface_level).has_crossing() {
      return Ok(MeshData::new());
    }

    self.initialize(n);

    let edges = EdgeKeyTable::new(grid.dim());
    let level = config.surface_level;
    {
      let _span = tracing::trace_span!("create_verts").entered();
      let this = &*self;
      config.dispatch.run([n, n, n], |[x, y, z]| {
        this.create_verts(grid, &edges, level, IVec3::new(x as i32, y as i32, z as i32))
      })?;
    }

    let indices = {
      let _span = tracing::trace_span!("finalize").entered();
      self.finalize()?
    };

    let vertices = self.vertices.to_vec(self.table.len())?;
    let mut mesh = MeshData::from_geometry(vertices, indices);
    mesh.normals = normals::compute(config.normal_mode, grid, &mesh.vertices, &mesh.indices);

    tracing::trace!(
      vertices = mesh.vertices.len(),
      triangles = mesh.triangle_count(),
      "marching cubes pass complete"
    );
    Ok(mesh)
  }
}
