//! Per-triangle area conservation.
//!
//! Every triangle of type `t` relaxes towards the target area `a0[t]` with
//! the energy
//!
//! ```text
//! U = k / (2 a0 n) · (A − a0)²
//! ```
//!
//! where `n` is the number of triangles of type `t`. The energy is split in
//! equal thirds between the triangle's vertices.

use std::sync::Arc;

use super::buffer::{Contribution, ForceBuffer};
use super::params::{warn_non_positive, AreaParams, ParamTable};
use super::triangle::{area_by_type, TriangleGeometry};
use super::{gather_owned, EvaluateOptions, MeshForce};
use crate::error::{ForceError, Result};
use crate::mesh::{triangle_star, MeshTopology, ResolvedMesh, ResolvedTriangle, TypeId};
use crate::system::{Communicator, ParticleData};

/// Area conservation applied to each triangle individually.
pub struct TriangleAreaConservation {
    topology: Arc<MeshTopology>,
    comm: Arc<dyn Communicator>,
    params: ParamTable<AreaParams>,
    options: EvaluateOptions,
    area: Vec<f64>,
}

impl TriangleAreaConservation {
    /// Name used in logs and errors.
    pub const NAME: &'static str = "area_local";

    /// Create the force with every type's parameters unset.
    pub fn new(topology: Arc<MeshTopology>, comm: Arc<dyn Communicator>) -> Self {
        let num_types = topology.num_types();
        log::debug!(
            "{}: {} triangles of {} types",
            Self::NAME,
            topology.num_triangles(),
            num_types
        );
        Self {
            params: ParamTable::new(Self::NAME, num_types),
            area: vec![0.0; num_types],
            topology,
            comm,
            options: EvaluateOptions::default(),
        }
    }

    /// Set the evaluation options.
    pub fn with_options(mut self, options: EvaluateOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the evaluation options.
    pub fn set_options(&mut self, options: EvaluateOptions) {
        self.options = options;
    }

    /// The mesh this force acts on.
    pub fn topology(&self) -> &MeshTopology {
        &self.topology
    }

    /// Set stiffness `k` and target triangle area `a0` for a type.
    pub fn set_params(&mut self, type_id: TypeId, k: f64, a0: f64) -> Result<()> {
        let name = self.topology.type_name(type_id)?;
        warn_non_positive(Self::NAME, name, "k", k);
        warn_non_positive(Self::NAME, name, "A0", a0);
        log::debug!("{}: type {} k={} A0={}", Self::NAME, name, k, a0);
        self.params.set(type_id.index(), AreaParams { k, a0 })
    }

    /// Parameters of a type.
    pub fn params(&self, type_id: TypeId) -> Result<AreaParams> {
        let name = self.topology.type_name(type_id)?;
        self.params
            .get(type_id.index())
            .ok_or_else(|| ForceError::MissingParameters {
                force: Self::NAME,
                type_name: name.to_string(),
            })
    }

    /// Total area of a type, summed over all ranks, as of the last
    /// evaluation.
    pub fn current_area(&self, type_id: TypeId) -> Result<f64> {
        self.topology.type_name(type_id)?;
        Ok(self.area[type_id.index()])
    }
}

impl MeshForce for TriangleAreaConservation {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn evaluate(
        &mut self,
        timestep: u64,
        particles: &ParticleData,
        forces: &mut ForceBuffer,
    ) -> Result<()> {
        forces.check_layout(particles)?;
        let params = self.params.resolve_all(&self.topology)?;
        let mesh = ResolvedMesh::triangles(&self.topology, particles)?;
        log::trace!(
            "{}: step {} over {} triangles ({} owned particles)",
            Self::NAME,
            timestep,
            mesh.triangles.len(),
            particles.n_local()
        );

        let counts: Vec<f64> = (0..self.topology.num_types())
            .map(|t| self.topology.triangle_count(TypeId::new(t)) as f64)
            .collect();
        let box_dim = particles.box_dim();
        let positions = particles.positions();
        let compute_virial = self.options.compute_virial;

        let kernel = |tri: &ResolvedTriangle| -> [Contribution; 3] {
            let t = tri.type_id.index();
            let AreaParams { k, a0 } = params[t];
            let n = counts[t];
            let geom = TriangleGeometry::of(box_dim, positions, tri);
            let excess = geom.area() - a0;
            let du_da = k * excess / (a0 * n);
            let energy = k * excess * excess / (6.0 * a0 * n);
            geom.contributions(du_da, energy, compute_virial)
        };

        if self.options.parallel {
            let star = triangle_star(&mesh);
            gather_owned(particles.n_local(), forces, |v| {
                let mut total = Contribution::default();
                for corner in star.of(v) {
                    total += kernel(&mesh.triangles[corner.triangle])[corner.corner];
                }
                total
            });
        } else {
            for tri in &mesh.triangles {
                let contributions = kernel(tri);
                for (&v, c) in tri.vertices.iter().zip(contributions.iter()) {
                    forces.add(v, c);
                }
            }
        }

        let mut area = area_by_type(
            &mesh,
            particles,
            self.topology.num_types(),
            true,
            self.options.parallel,
            |tri| tri.type_id.index(),
        );
        self.comm.reduce_sum(&mut area)?;
        self.area = area;
        Ok(())
    }
}
