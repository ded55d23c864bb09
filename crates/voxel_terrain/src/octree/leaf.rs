//! OctreeLeaf - immutable value type for one packed octree cell.

use glam::IVec3;

/// Octree leaf in chunk-local cell units.
///
/// `origin` is the minimum cell; the leaf covers `[origin, origin + scale)` on
/// each axis. `scale` is a power of two.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct OctreeLeaf {
  pub origin: IVec3,
  pub scale: u32,
}

impl OctreeLeaf {
  pub fn new(origin: IVec3, scale: u32) -> Self {
    Self { origin, scale }
  }

  /// Unit cell at `origin`.
  pub fn unit(origin: IVec3) -> Self {
    Self { origin, scale: 1 }
  }

  /// Origin of child `octant` one level finer.
  ///
  /// Octant bits: bit 0 = +X, bit 1 = +Y, bit 2 = +Z. Returns `None` for unit
  /// cells.
  pub fn child(&self, octant: u8) -> Option<Self> {
    if self.scale <= 1 {
      return None;
    }
    let half = (self.scale / 2) as i32;
    let offset = IVec3::new(
      (octant & 1) as i32,
      ((octant >> 1) & 1) as i32,
      ((octant >> 2) & 1) as i32,
    );
    Some(Self {
      origin: self.origin + offset * half,
      scale: self.scale / 2,
    })
  }

  /// Number of unit cells covered.
  #[inline]
  pub fn volume(&self) -> u64 {
    (self.scale as u64).pow(3)
  }

  /// True if `cell` lies inside this leaf.
  #[inline]
  pub fn contains(&self, cell: IVec3) -> bool {
    let rel = cell - self.origin;
    let s = self.scale as i32;
    rel.cmpge(IVec3::ZERO).all() && rel.cmplt(IVec3::splat(s)).all()
  }

  /// True for padding cells outside the chunk's non-negative range.
  #[inline]
  pub fn is_border(&self) -> bool {
    self.origin.min_element() < 0
  }
}
