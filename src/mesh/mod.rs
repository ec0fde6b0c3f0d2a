//! Mesh topology and its per-evaluation views.
//!
//! # Overview
//!
//! A [`MeshTopology`] is the persistent, tag-based description of a
//! triangulated surface: triangles, bonds (mesh edges) with their one or two
//! adjacent triangles, and a list of named types. It never changes while
//! particles move or get reordered.
//!
//! Each evaluation resolves the topology against the current particle arrays
//! into a [`ResolvedMesh`], and the data-parallel paths additionally build
//! per-vertex incidence [`Star`]s.
//!
//! # Index Types
//!
//! - [`Tag`] - Stable particle identity
//! - [`TriangleId`] - Identifies a triangle
//! - [`TypeId`] - Identifies a mesh type
//!
//! # Construction
//!
//! ```
//! use meshforce::mesh::build_from_triangles;
//!
//! let topo = build_from_triangles(&[[0, 1, 2], [0, 2, 3]]).unwrap();
//! assert_eq!(topo.num_bonds(), 5);
//! assert_eq!(topo.num_boundary_bonds(), 4);
//! ```

mod builder;
mod incidence;
mod index;
pub mod primitives;
mod resolve;
mod topology;

pub use builder::{build_from_triangles, build_typed, DEFAULT_TYPE};
pub use incidence::{bond_star, triangle_star, BondRole, BondSlot, Corner, Star};
pub use index::{Tag, TriangleId, TypeId};
pub use primitives::MeshGeometry;
pub use resolve::{ResolvedBond, ResolvedMesh, ResolvedTriangle};
pub use topology::{MeshBond, MeshTopology, MeshTriangle};
