//! Octree LOD collapse for dual contouring.
//!
//! The collapse works on the unit cells of one chunk and merges uniform-sign
//! regions into coarser leaves. Only mixed unit cells (plus the negative
//! border padding) can carry a vertex, so the packed leaf list is both the
//! vertex pass's work list and a compression measure.
//!
//! # Module Structure
//!
//! - [`leaf`]: `OctreeLeaf` - immutable value type for a packed cell
//! - [`collapse`]: `OctreeCollapser` - bottom-up merge and packing

pub mod collapse;
pub mod leaf;

pub use collapse::{NodeSign, OctreeCollapser, PackedOctree};
pub use leaf::OctreeLeaf;
