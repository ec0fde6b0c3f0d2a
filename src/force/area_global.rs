//! Global area conservation.
//!
//! The total area `A_g[t]` of all triangles of type `t` relaxes towards
//! `a0[t]`:
//!
//! ```text
//! U = k / (2 a0) · (A_g − a0)²
//! ```
//!
//! `A_g` is a sum over the whole mesh, so evaluation takes two passes: the
//! per-type area is summed and all-reduced across ranks first, then every
//! triangle applies the restoring force for the shared total.

use std::sync::Arc;

use super::buffer::{Contribution, ForceBuffer};
use super::params::{warn_non_positive, AreaParams, ParamTable};
use super::triangle::{area_by_type, TriangleGeometry};
use super::{gather_owned, EvaluateOptions, MeshForce};
use crate::error::{ForceError, Result};
use crate::mesh::{triangle_star, MeshTopology, ResolvedMesh, ResolvedTriangle, TypeId};
use crate::system::{Communicator, ParticleData};

/// Area conservation of the total area of each mesh type.
///
/// With `ignore_type`, all triangles are treated as one type and only the
/// parameters of type 0 are used.
pub struct AreaConservation {
    topology: Arc<MeshTopology>,
    comm: Arc<dyn Communicator>,
    params: ParamTable<AreaParams>,
    options: EvaluateOptions,
    ignore_type: bool,
    area: Vec<f64>,
}

impl AreaConservation {
    /// Name used in logs and errors.
    pub const NAME: &'static str = "area_global";

    /// Create the force with every record's parameters unset.
    pub fn new(topology: Arc<MeshTopology>, comm: Arc<dyn Communicator>, ignore_type: bool) -> Self {
        let num_records = if ignore_type { 1 } else { topology.num_types() };
        log::debug!(
            "{}: {} triangles, {} parameter records{}",
            Self::NAME,
            topology.num_triangles(),
            num_records,
            if ignore_type { " (types ignored)" } else { "" }
        );
        Self {
            params: ParamTable::new(Self::NAME, num_records),
            area: vec![0.0; num_records],
            topology,
            comm,
            options: EvaluateOptions::default(),
            ignore_type,
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

    /// Whether all types share record 0.
    pub fn ignore_type(&self) -> bool {
        self.ignore_type
    }

    #[inline]
    fn record(&self, type_id: TypeId) -> usize {
        if self.ignore_type {
            0
        } else {
            type_id.index()
        }
    }

    /// Set stiffness `k` and target total area `a0` for a type.
    ///
    /// With `ignore_type` only type 0 can be set; other types are ignored.
    pub fn set_params(&mut self, type_id: TypeId, k: f64, a0: f64) -> Result<()> {
        let name = self.topology.type_name(type_id)?;
        if self.ignore_type && type_id.index() != 0 {
            log::warn!(
                "{}: types are ignored, parameters for {} have no effect",
                Self::NAME,
                name
            );
            return Ok(());
        }
        warn_non_positive(Self::NAME, name, "k", k);
        warn_non_positive(Self::NAME, name, "A0", a0);
        log::debug!("{}: type {} k={} A0={}", Self::NAME, name, k, a0);
        let record = self.record(type_id);
        self.params.set(record, AreaParams { k, a0 })
    }

    /// Parameters governing a type.
    pub fn params(&self, type_id: TypeId) -> Result<AreaParams> {
        let name = self.topology.type_name(type_id)?;
        self.params
            .get(self.record(type_id))
            .ok_or_else(|| ForceError::MissingParameters {
                force: Self::NAME,
                type_name: name.to_string(),
            })
    }

    /// Total area governing a type, as of the last reduction.
    pub fn current_area(&self, type_id: TypeId) -> Result<f64> {
        self.topology.type_name(type_id)?;
        Ok(self.area[self.record(type_id)])
    }

    /// Recompute and all-reduce the per-type total area without evaluating
    /// forces.
    ///
    /// A collective: on a decomposed system every rank must call it.
    pub fn precompute(&mut self, particles: &ParticleData) -> Result<()> {
        let mesh = ResolvedMesh::triangles(&self.topology, particles)?;
        self.reduce_area(&mesh, particles)
    }

    fn reduce_area(&mut self, mesh: &ResolvedMesh, particles: &ParticleData) -> Result<()> {
        // Every rank sees every triangle of its halo, so a single rank adds
        // whole areas while a decomposed system adds thirds per owned vertex.
        let ignore_type = self.ignore_type;
        let mut area = area_by_type(
            mesh,
            particles,
            self.params.len(),
            self.comm.is_decomposed(),
            self.options.parallel,
            |tri| if ignore_type { 0 } else { tri.type_id.index() },
        );
        self.comm.reduce_sum(&mut area)?;
        self.area = area;
        Ok(())
    }
}

impl MeshForce for AreaConservation {
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
        self.reduce_area(&mesh, particles)?;
        log::trace!(
            "{}: step {} total area {:?}",
            Self::NAME,
            timestep,
            self.area
        );

        let counts: Vec<f64> = if self.ignore_type {
            vec![self.topology.num_triangles() as f64]
        } else {
            (0..self.topology.num_types())
                .map(|t| self.topology.triangle_count(TypeId::new(t)) as f64)
                .collect()
        };
        let ignore_type = self.ignore_type;
        let area = &self.area;
        let box_dim = particles.box_dim();
        let positions = particles.positions();
        let compute_virial = self.options.compute_virial;

        let kernel = |tri: &ResolvedTriangle| -> [Contribution; 3] {
            let r = if ignore_type { 0 } else { tri.type_id.index() };
            let AreaParams { k, a0 } = params[r];
            let excess = area[r] - a0;
            let du_da = k * excess / a0;
            let energy = k * excess * excess / (6.0 * a0 * counts[r]);
            TriangleGeometry::of(box_dim, positions, tri).contributions(
                du_da,
                energy,
                compute_virial,
            )
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
        Ok(())
    }
}
