//! Tag → index resolution of mesh elements.
//!
//! Tags are resolved once per evaluation, after any particle reordering, into
//! index-based views the force kernels work on. Resolution validates every
//! reference first, so an inconsistent topology aborts the evaluation before
//! any force is computed or any collective is entered.

use super::index::TypeId;
use super::topology::MeshTopology;
use crate::error::{ForceError, Result};
use crate::system::ParticleData;

/// A triangle with particle indices.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedTriangle {
    /// Particle indices of the three vertices.
    pub vertices: [usize; 3],
    /// Triangle type.
    pub type_id: TypeId,
}

/// A bond with particle indices.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedBond {
    /// Particle indices of the end vertices A and B.
    pub vertices: [usize; 2],
    /// Indices of the vertices C and D opposite the bond in its first and
    /// second triangle, or `None` for a boundary bond.
    pub opposite: Option<[usize; 2]>,
    /// Bond type.
    pub type_id: TypeId,
}

impl ResolvedBond {
    /// `[A, B, C, D]`, if the bond is not on the boundary.
    #[inline]
    pub fn quad(&self) -> Option<[usize; 4]> {
        self.opposite
            .map(|[c, d]| [self.vertices[0], self.vertices[1], c, d])
    }
}

/// Index-based mesh view valid for one evaluation.
#[derive(Debug, Clone)]
pub struct ResolvedMesh {
    /// Triangles in topology order.
    pub triangles: Vec<ResolvedTriangle>,
    /// Bonds in topology order.
    pub bonds: Vec<ResolvedBond>,
    /// Number of particle slots (owned plus ghosts).
    pub num_particles: usize,
}

impl ResolvedMesh {
    /// Resolve triangles only.
    pub fn triangles(topology: &MeshTopology, particles: &ParticleData) -> Result<Self> {
        let triangles = resolve_triangles(topology, particles)?;
        Ok(Self {
            triangles,
            bonds: Vec::new(),
            num_particles: particles.n_total(),
        })
    }

    /// Resolve triangles and bonds.
    pub fn full(topology: &MeshTopology, particles: &ParticleData) -> Result<Self> {
        let triangles = resolve_triangles(topology, particles)?;

        let mut bonds = Vec::with_capacity(topology.num_bonds());
        for (bi, bond) in topology.bonds().iter().enumerate() {
            let [ta, tb] = bond.tags;
            let a = particles.resolve(ta, "bond", bi)?;
            let b = particles.resolve(tb, "bond", bi)?;

            let opposite = if bond.is_boundary() {
                None
            } else {
                // Topology construction guarantees both triangles contain the bond.
                let mut cd = [0usize; 2];
                for (slot, t) in cd.iter_mut().zip(bond.triangles) {
                    let tag = topology.triangle(t).opposite(ta, tb).ok_or(
                        ForceError::BondTriangleMismatch {
                            bond: bi,
                            triangle: t.index(),
                        },
                    )?;
                    *slot = particles.resolve(tag, "bond", bi)?;
                }
                Some(cd)
            };

            bonds.push(ResolvedBond {
                vertices: [a, b],
                opposite,
                type_id: bond.type_id,
            });
        }

        Ok(Self {
            triangles,
            bonds,
            num_particles: particles.n_total(),
        })
    }
}

fn resolve_triangles(
    topology: &MeshTopology,
    particles: &ParticleData,
) -> Result<Vec<ResolvedTriangle>> {
    topology
        .triangles()
        .iter()
        .enumerate()
        .map(|(ti, tri)| {
            let mut vertices = [0usize; 3];
            for (v, &tag) in vertices.iter_mut().zip(tri.tags.iter()) {
                *v = particles.resolve(tag, "triangle", ti)?;
            }
            Ok(ResolvedTriangle {
                vertices,
                type_id: tri.type_id,
            })
        })
        .collect()
}
