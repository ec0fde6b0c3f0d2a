//! Tag-based mesh topology.

use serde::{Deserialize, Serialize};

use super::index::{Tag, TriangleId, TypeId};
use crate::error::{ForceError, Result};

/// A mesh triangle: three vertex tags and a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshTriangle {
    /// Vertex tags, in winding order.
    pub tags: [Tag; 3],
    /// Triangle type.
    pub type_id: TypeId,
}

impl MeshTriangle {
    /// The vertex of this triangle that is neither `a` nor `b`.
    ///
    /// Returns `None` unless the triangle contains both `a` and `b`.
    pub fn opposite(&self, a: Tag, b: Tag) -> Option<Tag> {
        if !self.tags.contains(&a) || !self.tags.contains(&b) {
            return None;
        }
        self.tags.iter().copied().find(|&t| t != a && t != b)
    }
}

/// A mesh bond (surface edge) with its up to two adjacent triangles.
///
/// A boundary edge stores the same triangle twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshBond {
    /// End vertex tags.
    pub tags: [Tag; 2],
    /// Adjacent triangles.
    pub triangles: [TriangleId; 2],
    /// Bond type.
    pub type_id: TypeId,
}

impl MeshBond {
    /// Whether this bond lies on the mesh boundary.
    #[inline]
    pub fn is_boundary(&self) -> bool {
        self.triangles[0] == self.triangles[1]
    }
}

/// Read-only view of the mesh: typed triangles and bonds.
///
/// Triangles and bonds share one list of named types. The topology is
/// validated on construction, so every bond's triangles exist and contain
/// both of its end vertices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshTopology {
    type_names: Vec<String>,
    triangles: Vec<MeshTriangle>,
    bonds: Vec<MeshBond>,
    triangle_counts: Vec<usize>,
}

impl MeshTopology {
    /// Create a topology from explicit element lists.
    pub fn new(
        type_names: Vec<String>,
        triangles: Vec<MeshTriangle>,
        bonds: Vec<MeshBond>,
    ) -> Result<Self> {
        if triangles.is_empty() {
            return Err(ForceError::EmptyMesh);
        }
        let num_types = type_names.len();
        let check_type = |type_id: TypeId| {
            if type_id.index() >= num_types {
                Err(ForceError::InvalidTypeId {
                    type_id: type_id.raw(),
                    num_types,
                })
            } else {
                Ok(())
            }
        };

        let mut triangle_counts = vec![0usize; num_types];
        for (ti, tri) in triangles.iter().enumerate() {
            check_type(tri.type_id)?;
            let [a, b, c] = tri.tags;
            if a == b || b == c || a == c {
                return Err(ForceError::DegenerateTriangle { triangle: ti });
            }
            triangle_counts[tri.type_id.index()] += 1;
        }

        for (bi, bond) in bonds.iter().enumerate() {
            check_type(bond.type_id)?;
            for t in bond.triangles {
                let tri = triangles
                    .get(t.index())
                    .ok_or(ForceError::TriangleOutOfRange {
                        bond: bi,
                        triangle: t.index(),
                        count: triangles.len(),
                    })?;
                if tri.opposite(bond.tags[0], bond.tags[1]).is_none() {
                    return Err(ForceError::BondTriangleMismatch {
                        bond: bi,
                        triangle: t.index(),
                    });
                }
            }
        }

        log::debug!(
            "mesh topology: {} triangles, {} bonds, {} types",
            triangles.len(),
            bonds.len(),
            num_types
        );

        Ok(Self {
            type_names,
            triangles,
            bonds,
            triangle_counts,
        })
    }

    /// Number of mesh types.
    #[inline]
    pub fn num_types(&self) -> usize {
        self.type_names.len()
    }

    /// Type names, indexed by [`TypeId`].
    pub fn type_names(&self) -> &[String] {
        &self.type_names
    }

    /// Name of a type.
    pub fn type_name(&self, type_id: TypeId) -> Result<&str> {
        self.type_names
            .get(type_id.index())
            .map(String::as_str)
            .ok_or(ForceError::InvalidTypeId {
                type_id: type_id.raw(),
                num_types: self.num_types(),
            })
    }

    /// Look up a type by name.
    pub fn type_id(&self, name: &str) -> Result<TypeId> {
        self.type_names
            .iter()
            .position(|n| n == name)
            .map(TypeId::new)
            .ok_or_else(|| ForceError::UnknownType(name.to_string()))
    }

    /// Number of triangles.
    #[inline]
    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }

    /// Number of bonds.
    #[inline]
    pub fn num_bonds(&self) -> usize {
        self.bonds.len()
    }

    /// All triangles.
    pub fn triangles(&self) -> &[MeshTriangle] {
        &self.triangles
    }

    /// All bonds.
    pub fn bonds(&self) -> &[MeshBond] {
        &self.bonds
    }

    /// A single triangle.
    #[inline]
    pub fn triangle(&self, id: TriangleId) -> &MeshTriangle {
        &self.triangles[id.index()]
    }

    /// Number of triangles of a given type.
    pub fn triangle_count(&self, type_id: TypeId) -> usize {
        self.triangle_counts.get(type_id.index()).copied().unwrap_or(0)
    }

    /// Number of boundary bonds.
    pub fn num_boundary_bonds(&self) -> usize {
        self.bonds.iter().filter(|b| b.is_boundary()).count()
    }

    /// Largest tag referenced by any triangle.
    pub fn max_tag(&self) -> Option<Tag> {
        self.triangles.iter().flat_map(|t| t.tags).max()
    }
}
