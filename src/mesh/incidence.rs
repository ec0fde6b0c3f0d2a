//! Per-vertex incidence lists.
//!
//! The data-parallel paths run one task per vertex. A task needs to know
//! which elements touch its vertex and in which role, so it can evaluate the
//! element and keep only its own share. [`Star`] stores these lists in
//! compressed-row form.

use super::resolve::ResolvedMesh;

/// Compressed per-vertex lists of `T`.
#[derive(Debug, Clone)]
pub struct Star<T> {
    offsets: Vec<usize>,
    entries: Vec<T>,
}

impl<T: Copy> Star<T> {
    /// Build from `(vertex, entry)` pairs for `n` vertices.
    ///
    /// Entries of one vertex keep the order in which they were given.
    pub fn build(n: usize, pairs: &[(usize, T)]) -> Self {
        let mut offsets = vec![0usize; n + 1];
        for &(v, _) in pairs {
            offsets[v + 1] += 1;
        }
        for i in 0..n {
            offsets[i + 1] += offsets[i];
        }

        let mut cursor = offsets.clone();
        let mut entries: Vec<Option<T>> = vec![None; pairs.len()];
        for &(v, e) in pairs {
            entries[cursor[v]] = Some(e);
            cursor[v] += 1;
        }

        Self {
            offsets,
            entries: entries.into_iter().flatten().collect(),
        }
    }

    /// Entries of vertex `v`.
    #[inline]
    pub fn of(&self, v: usize) -> &[T] {
        &self.entries[self.offsets[v]..self.offsets[v + 1]]
    }

    /// Number of vertices.
    #[inline]
    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Whether there are no vertices.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A vertex's corner of a triangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Corner {
    /// Triangle index.
    pub triangle: usize,
    /// Which vertex of the triangle: 0 = A, 1 = B, 2 = C.
    pub corner: usize,
}

/// The role a vertex plays in a non-boundary bond `(A, B; C, D)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BondRole {
    /// First end vertex.
    A,
    /// Second end vertex.
    B,
    /// Opposite vertex in the first triangle.
    C,
    /// Opposite vertex in the second triangle.
    D,
}

impl BondRole {
    /// All roles in quad order.
    pub const ALL: [BondRole; 4] = [BondRole::A, BondRole::B, BondRole::C, BondRole::D];

    /// Position in `[A, B, C, D]`.
    #[inline]
    pub fn slot(self) -> usize {
        self as usize
    }
}

/// A vertex's membership in a bond.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BondSlot {
    /// Bond index.
    pub bond: usize,
    /// Role of the vertex.
    pub role: BondRole,
}

/// Triangles around each particle slot.
pub fn triangle_star(mesh: &ResolvedMesh) -> Star<Corner> {
    let pairs: Vec<(usize, Corner)> = mesh
        .triangles
        .iter()
        .enumerate()
        .flat_map(|(ti, t)| {
            t.vertices.iter().enumerate().map(move |(corner, &v)| {
                (
                    v,
                    Corner {
                        triangle: ti,
                        corner,
                    },
                )
            })
        })
        .collect();
    Star::build(mesh.num_particles, &pairs)
}

/// Non-boundary bonds around each particle slot, in every role.
///
/// Boundary bonds are left out entirely.
pub fn bond_star(mesh: &ResolvedMesh) -> Star<BondSlot> {
    let pairs: Vec<(usize, BondSlot)> = mesh
        .bonds
        .iter()
        .enumerate()
        .filter_map(|(bi, b)| b.quad().map(|q| (bi, q)))
        .flat_map(|(bi, quad)| {
            BondRole::ALL
                .iter()
                .map(move |&role| (quad[role.slot()], BondSlot { bond: bi, role }))
        })
        .collect();
    Star::build(mesh.num_particles, &pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::resolve::{ResolvedBond, ResolvedTriangle};
    use crate::mesh::TypeId;

    #[test]
    fn test_star_build() {
        let star = Star::build(3, &[(2, 'a'), (0, 'b'), (2, 'c')]);
        assert_eq!(star.len(), 3);
        assert_eq!(star.of(0), &['b']);
        assert!(star.of(1).is_empty());
        assert_eq!(star.of(2), &['a', 'c']);
    }

    #[test]
    fn test_triangle_and_bond_stars() {
        let mesh = ResolvedMesh {
            triangles: vec![
                ResolvedTriangle {
                    vertices: [0, 1, 2],
                    type_id: TypeId::new(0),
                },
                ResolvedTriangle {
                    vertices: [0, 2, 3],
                    type_id: TypeId::new(0),
                },
            ],
            bonds: vec![
                ResolvedBond {
                    vertices: [2, 0],
                    opposite: Some([1, 3]),
                    type_id: TypeId::new(0),
                },
                ResolvedBond {
                    vertices: [0, 1],
                    opposite: None,
                    type_id: TypeId::new(0),
                },
            ],
            num_particles: 4,
        };

        let tris = triangle_star(&mesh);
        assert_eq!(tris.of(0).len(), 2);
        assert_eq!(tris.of(3), &[Corner { triangle: 1, corner: 2 }]);

        let bonds = bond_star(&mesh);
        assert_eq!(bonds.of(2), &[BondSlot { bond: 0, role: BondRole::A }]);
        assert_eq!(bonds.of(3), &[BondSlot { bond: 0, role: BondRole::D }]);
        // The boundary bond (0, 1) is not listed.
        assert_eq!(bonds.of(0), &[BondSlot { bond: 0, role: BondRole::B }]);
    }
}
