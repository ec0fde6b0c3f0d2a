//! Evaluation over an in-process domain decomposition.
//!
//! The system is split into per-rank views with [`ParticleData::split`], each
//! rank runs on its own thread with a [`ThreadGroup`] communicator, and the
//! owned results are gathered back into tag order.

use std::sync::Arc;

use nalgebra::Vector3;

use super::buffer::{ForceBuffer, Virial};
use super::MeshForce;
use crate::error::{ForceError, Result};
use crate::mesh::Tag;
use crate::system::{Communicator, ParticleData, ThreadGroup};

/// Per-particle results indexed by tag.
#[derive(Debug, Clone)]
pub struct GatheredForces {
    forces: Vec<Vector3<f64>>,
    energies: Vec<f64>,
    virials: Vec<Virial>,
}

impl GatheredForces {
    fn new(num_tags: usize) -> Self {
        Self {
            forces: vec![Vector3::zeros(); num_tags],
            energies: vec![0.0; num_tags],
            virials: vec![Virial::ZERO; num_tags],
        }
    }

    /// Gather the owned slots of a buffer.
    fn absorb(&mut self, particles: &ParticleData, buffer: &ForceBuffer) {
        for i in 0..particles.n_local() {
            let t = particles.tag(i).index();
            self.forces[t] += buffer.force(i);
            self.energies[t] += buffer.energy(i);
            self.virials[t] += buffer.virial(i);
        }
    }

    /// Collect an undecomposed buffer into tag order.
    pub fn from_buffer(particles: &ParticleData, buffer: &ForceBuffer) -> Self {
        let mut gathered = Self::new(particles.num_tags());
        gathered.absorb(particles, buffer);
        gathered
    }

    /// Number of tags.
    pub fn len(&self) -> usize {
        self.forces.len()
    }

    /// Whether there are no tags.
    pub fn is_empty(&self) -> bool {
        self.forces.is_empty()
    }

    /// Force on a particle.
    pub fn force(&self, tag: Tag) -> Vector3<f64> {
        self.forces[tag.index()]
    }

    /// Energy of a particle.
    pub fn energy(&self, tag: Tag) -> f64 {
        self.energies[tag.index()]
    }

    /// Virial of a particle.
    pub fn virial(&self, tag: Tag) -> Virial {
        self.virials[tag.index()]
    }

    /// Total energy.
    pub fn total_energy(&self) -> f64 {
        self.energies.iter().sum()
    }

    /// Sum of all forces.
    pub fn net_force(&self) -> Vector3<f64> {
        self.forces.iter().fold(Vector3::zeros(), |acc, f| acc + f)
    }

    /// Sum of all virials.
    pub fn total_virial(&self) -> Virial {
        self.virials.iter().fold(Virial::ZERO, |acc, &v| acc + v)
    }

    /// Largest per-particle force difference and energy difference.
    pub fn max_difference(&self, other: &GatheredForces) -> (f64, f64) {
        let df = self
            .forces
            .iter()
            .zip(&other.forces)
            .fold(0.0_f64, |m, (a, b)| m.max((a - b).norm()));
        let de = self
            .energies
            .iter()
            .zip(&other.energies)
            .fold(0.0_f64, |m, (a, b)| m.max((a - b).abs()));
        (df, de)
    }
}

/// Evaluate forces on `num_ranks` simulated ranks and gather the results.
///
/// `build` is called once on every rank with that rank's communicator and
/// must return the same set of forces, configured alike, on all ranks. Every
/// rank evaluates its forces in order; a collective inside one force is met
/// by the same collective on every other rank. When one rank fails, ranks
/// waiting on it fail with [`ForceError::Reduction`] and the first other
/// error is returned.
pub fn run_decomposed<F>(
    particles: &ParticleData,
    num_ranks: usize,
    timestep: u64,
    build: F,
) -> Result<GatheredForces>
where
    F: Fn(Arc<dyn Communicator>) -> Result<Vec<Box<dyn MeshForce>>> + Sync,
{
    let views = particles.split(num_ranks)?;
    let group = ThreadGroup::create(num_ranks);
    let build = &build;

    let buffers: Vec<Result<ForceBuffer>> = std::thread::scope(|s| {
        let handles: Vec<_> = views
            .iter()
            .zip(group)
            .map(|(view, comm)| {
                s.spawn(move || -> Result<ForceBuffer> {
                    let rank = comm.rank();
                    let mut forces = build(Arc::new(comm))?;
                    let mut buffer = ForceBuffer::new(view);
                    for force in forces.iter_mut() {
                        force.evaluate(timestep, view, &mut buffer)?;
                    }
                    log::debug!(
                        "rank {}: {} owned, {} ghosts, energy {}",
                        rank,
                        view.n_local(),
                        view.n_ghosts(),
                        buffer.total_energy()
                    );
                    Ok(buffer)
                })
            })
            .collect();
        handles
            .into_iter()
            .enumerate()
            .map(|(rank, h)| {
                h.join().unwrap_or_else(|_| {
                    Err(ForceError::InvalidState(format!("rank {} panicked", rank)))
                })
            })
            .collect()
    });

    // A rank that fails makes the others' reductions fail too; report the
    // cause rather than its echo.
    if buffers.iter().any(|b| b.is_err()) {
        let mut errors: Vec<ForceError> = buffers.into_iter().filter_map(|b| b.err()).collect();
        let cause = errors
            .iter()
            .position(|e| !matches!(e, ForceError::Reduction(_)))
            .unwrap_or(0);
        return Err(errors.swap_remove(cause));
    }

    let mut gathered = GatheredForces::new(particles.num_tags());
    for (view, buffer) in views.iter().zip(buffers) {
        gathered.absorb(view, &buffer?);
    }
    Ok(gathered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::force::testing::*;
    use crate::force::{AreaConservation, HelfrichBending, TriangleAreaConservation};
    use crate::mesh::{MeshTopology, TypeId};
    use crate::system::SingleRank;

    fn all_forces(
        topo: &Arc<MeshTopology>,
        comm: Arc<dyn Communicator>,
    ) -> Result<Vec<Box<dyn MeshForce>>> {
        let t0 = TypeId::new(0);
        let mut local = TriangleAreaConservation::new(Arc::clone(topo), Arc::clone(&comm));
        local.set_params(t0, 2.0, 0.2)?;
        let mut global = AreaConservation::new(Arc::clone(topo), comm, false);
        global.set_params(t0, 3.0, 25.0)?;
        let mut bending = HelfrichBending::new(Arc::clone(topo));
        bending.set_params(t0, 1.0)?;
        let forces: Vec<Box<dyn MeshForce>> =
            vec![Box::new(local), Box::new(global), Box::new(bending)];
        Ok(forces)
    }

    #[test]
    fn test_partition_invariance() {
        let sphere = perturbed_sphere();
        let pd = sphere.particles(big_box());
        let topo = Arc::new(sphere.topology().unwrap());

        let mut whole = ForceBuffer::new(&pd);
        for mut force in all_forces(&topo, Arc::new(SingleRank)).unwrap() {
            force.evaluate(0, &pd, &mut whole).unwrap();
        }
        let reference = GatheredForces::from_buffer(&pd, &whole);

        for ranks in [2, 3, 5] {
            let split = run_decomposed(&pd, ranks, 0, |comm| all_forces(&topo, comm)).unwrap();
            let (df, de) = split.max_difference(&reference);
            assert!(df < 1e-10, "{ranks} ranks: force difference {df}");
            assert!(de < 1e-12, "{ranks} ranks: energy difference {de}");
            assert!((split.total_energy() - reference.total_energy()).abs() < 1e-10);
        }
    }

    #[test]
    fn test_global_area_is_partition_invariant() {
        let sphere = perturbed_sphere();
        let pd = sphere.particles(big_box());
        let topo = Arc::new(sphere.topology().unwrap());

        let mut single = AreaConservation::new(Arc::clone(&topo), Arc::new(SingleRank), false);
        single.precompute(&pd).unwrap();
        let expected = single.current_area(TypeId::new(0)).unwrap();

        let views = pd.split(4).unwrap();
        let areas: Vec<f64> = std::thread::scope(|s| {
            let handles: Vec<_> = views
                .iter()
                .zip(ThreadGroup::create(4))
                .map(|(view, comm)| {
                    let topo = Arc::clone(&topo);
                    s.spawn(move || {
                        let mut f = AreaConservation::new(topo, Arc::new(comm), false);
                        f.precompute(view).unwrap();
                        f.current_area(TypeId::new(0)).unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        for a in areas {
            assert!((a - expected).abs() < 1e-12 * expected);
        }
    }

    #[test]
    fn test_failing_rank_does_not_block_the_others() {
        let sphere = perturbed_sphere();
        let pd = sphere.particles(big_box());
        let topo = Arc::new(sphere.topology().unwrap());
        let result = run_decomposed(&pd, 3, 0, |comm| {
            if comm.rank() == 1 {
                return Err(ForceError::InvalidState("rank 1 has no forces".into()));
            }
            all_forces(&topo, comm)
        });
        assert!(matches!(result, Err(ForceError::InvalidState(msg)) if msg.contains("rank 1")));
    }

    #[test]
    fn test_build_error_is_reported() {
        let sphere = perturbed_sphere();
        let pd = sphere.particles(big_box());
        let topo = Arc::new(sphere.topology().unwrap());
        let result = run_decomposed(&pd, 2, 0, |_comm| {
            let f = HelfrichBending::new(Arc::clone(&topo));
            Ok(vec![Box::new(f) as Box<dyn MeshForce>])
        });
        assert!(matches!(result, Err(ForceError::MissingParameters { .. })));
    }
}
