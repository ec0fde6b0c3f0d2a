//! Mesh force modules.
//!
//! Each module implements [`MeshForce`]: given the particle store it adds
//! per-particle forces, energies and virials to a [`ForceBuffer`].
//!
//! - [`TriangleAreaConservation`] - per-triangle area relaxation
//! - [`AreaConservation`] - relaxation of the total area of each type
//! - [`HelfrichBending`] - discrete Helfrich bending energy
//!
//! # Scheduling
//!
//! [`EvaluateOptions`] selects between two execution paths that produce the
//! same result up to floating-point summation order. The sequential path
//! walks the elements once and scatters each element's contributions into
//! the buffer. The parallel path runs one task per owned vertex, which
//! gathers over the vertex's incidence star and writes only its own slot.

mod area_global;
mod area_local;
mod buffer;
mod decomposed;
mod helfrich;
mod params;
mod triangle;

pub use area_global::AreaConservation;
pub use area_local::TriangleAreaConservation;
pub use buffer::{Contribution, ForceBuffer, Virial};
pub use decomposed::{run_decomposed, GatheredForces};
pub use helfrich::{HelfrichBending, SigmaField, MIN_MIXED_AREA};
pub use params::{AreaParams, BendingParams};

use rayon::prelude::*;

use crate::error::Result;
use crate::system::ParticleData;

/// Options for force evaluation.
#[derive(Debug, Clone, Copy)]
pub struct EvaluateOptions {
    /// Evaluate with one rayon task per owned vertex.
    pub parallel: bool,
    /// Accumulate per-particle virials.
    pub compute_virial: bool,
}

impl Default for EvaluateOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            compute_virial: true,
        }
    }
}

impl EvaluateOptions {
    /// Create default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable parallel evaluation.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Shorthand for `with_parallel(false)`.
    pub fn sequential(self) -> Self {
        self.with_parallel(false)
    }

    /// Enable or disable virial accumulation.
    pub fn with_virial(mut self, compute_virial: bool) -> Self {
        self.compute_virial = compute_virial;
        self
    }
}

/// A force computed from the mesh topology and the particle positions.
pub trait MeshForce: Send {
    /// Short name used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Add this force's contributions for the current positions to `forces`.
    ///
    /// The buffer is not zeroed. On error nothing useful has been added and
    /// the step must be aborted.
    fn evaluate(
        &mut self,
        timestep: u64,
        particles: &ParticleData,
        forces: &mut ForceBuffer,
    ) -> Result<()>;
}

/// Run `per_vertex` for every owned slot in parallel and add the results.
fn gather_owned<F>(n_local: usize, forces: &mut ForceBuffer, per_vertex: F)
where
    F: Fn(usize) -> Contribution + Sync + Send,
{
    let gathered: Vec<Contribution> = (0..n_local).into_par_iter().map(per_vertex).collect();
    for (v, c) in gathered.iter().enumerate() {
        forces.add(v, c);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Shared helpers for the force tests.

    use nalgebra::Point3;

    use super::*;
    use crate::geometry::BoxDim;
    use crate::mesh::primitives::{icosphere, MeshGeometry};

    pub fn perturbed_sphere() -> MeshGeometry {
        icosphere(1, 1.5).perturbed(0.05)
    }

    pub fn big_box() -> BoxDim {
        BoxDim::cube(20.0)
    }

    pub fn evaluate<M: MeshForce>(force: &mut M, particles: &ParticleData) -> ForceBuffer {
        let mut buf = ForceBuffer::new(particles);
        force.evaluate(0, particles, &mut buf).unwrap();
        buf
    }

    /// Check forces against central differences of the total energy at a
    /// handful of (vertex, axis) pairs.
    pub fn check_finite_difference<M: MeshForce>(
        force: &mut M,
        particles: &ParticleData,
        tolerance: f64,
    ) {
        let buf = evaluate(force, particles);
        let h = 1e-6;
        let n = particles.n_local();
        let samples = [(0, 0), (3, 1), (7, 2), (n / 2, 0), (n - 1, 1)];
        for (v, axis) in samples.into_iter().filter(|&(v, _)| v < n) {
            let p = *particles.position(v);
            let mut energy_at = |delta: f64| {
                let mut moved = particles.clone();
                let mut q: Point3<f64> = p;
                q[axis] += delta;
                moved.set_position(v, q);
                evaluate(&mut *force, &moved).total_energy()
            };
            let fd = -(energy_at(h) - energy_at(-h)) / (2.0 * h);
            let analytic = buf.force(v)[axis];
            assert!(
                (fd - analytic).abs() < tolerance * analytic.abs().max(1.0),
                "vertex {v} axis {axis}: finite difference {fd}, analytic {analytic}"
            );
        }
    }

    pub fn assert_buffers_close(a: &ForceBuffer, b: &ForceBuffer, tolerance: f64) {
        assert_eq!(a.len(), b.len());
        for i in 0..a.len() {
            assert!(
                (a.force(i) - b.force(i)).norm() < tolerance,
                "force {i}: {:?} vs {:?}",
                a.force(i),
                b.force(i)
            );
            assert!((a.energy(i) - b.energy(i)).abs() < tolerance);
            assert!((a.virial(i) - b.virial(i)).max_abs() < tolerance);
        }
    }
}
