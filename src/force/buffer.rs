//! Per-particle force, energy and virial accumulation.

use std::ops::{Add, AddAssign, Mul, Sub};

use nalgebra::Vector3;

use crate::error::{ForceError, Result};
use crate::system::ParticleData;

/// Symmetric per-particle virial, stored as `[xx, xy, xz, yy, yz, zz]`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Virial(pub [f64; 6]);

impl Virial {
    /// All components zero.
    pub const ZERO: Virial = Virial([0.0; 6]);

    /// Symmetrised outer product `½ (d ⊗ f + f ⊗ d)`.
    #[inline]
    pub fn from_outer(d: &Vector3<f64>, f: &Vector3<f64>) -> Self {
        Virial([
            d.x * f.x,
            0.5 * (d.x * f.y + d.y * f.x),
            0.5 * (d.x * f.z + d.z * f.x),
            d.y * f.y,
            0.5 * (d.y * f.z + d.z * f.y),
            d.z * f.z,
        ])
    }

    /// Sum of the diagonal components.
    #[inline]
    pub fn trace(&self) -> f64 {
        self.0[0] + self.0[3] + self.0[5]
    }

    /// Largest absolute component.
    pub fn max_abs(&self) -> f64 {
        self.0.iter().fold(0.0_f64, |m, v| m.max(v.abs()))
    }
}

impl Add for Virial {
    type Output = Virial;

    fn add(mut self, rhs: Virial) -> Virial {
        self += rhs;
        self
    }
}

impl AddAssign for Virial {
    fn add_assign(&mut self, rhs: Virial) {
        for (a, b) in self.0.iter_mut().zip(rhs.0) {
            *a += b;
        }
    }
}

impl Sub for Virial {
    type Output = Virial;

    fn sub(self, rhs: Virial) -> Virial {
        self + rhs * -1.0
    }
}

impl Mul<f64> for Virial {
    type Output = Virial;

    fn mul(self, s: f64) -> Virial {
        Virial(self.0.map(|v| v * s))
    }
}

/// What one element, or one vertex's whole star, adds to a particle.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Contribution {
    /// Force.
    pub force: Vector3<f64>,
    /// Energy.
    pub energy: f64,
    /// Virial.
    pub virial: Virial,
}

impl AddAssign for Contribution {
    fn add_assign(&mut self, rhs: Contribution) {
        self.force += rhs.force;
        self.energy += rhs.energy;
        self.virial += rhs.virial;
    }
}

/// Per-particle output arrays shared by all force modules.
///
/// The buffer spans every particle slot of a rank, but only owned slots
/// (`index < n_local`) are ever written; additions to ghost slots are
/// dropped.
#[derive(Debug, Clone)]
pub struct ForceBuffer {
    forces: Vec<Vector3<f64>>,
    energies: Vec<f64>,
    virials: Vec<Virial>,
    n_local: usize,
}

impl ForceBuffer {
    /// Zeroed buffer laid out for `particles`.
    pub fn new(particles: &ParticleData) -> Self {
        Self::with_layout(particles.n_local(), particles.n_total())
    }

    /// Zeroed buffer with `n_total` slots of which the first `n_local` are
    /// owned.
    pub fn with_layout(n_local: usize, n_total: usize) -> Self {
        Self {
            forces: vec![Vector3::zeros(); n_total],
            energies: vec![0.0; n_total],
            virials: vec![Virial::ZERO; n_total],
            n_local: n_local.min(n_total),
        }
    }

    /// Reset every slot to zero.
    pub fn zero(&mut self) {
        self.forces.fill(Vector3::zeros());
        self.energies.fill(0.0);
        self.virials.fill(Virial::ZERO);
    }

    /// Fail unless the buffer matches the layout of `particles`.
    pub fn check_layout(&self, particles: &ParticleData) -> Result<()> {
        if self.forces.len() != particles.n_total() || self.n_local != particles.n_local() {
            return Err(ForceError::InvalidState(format!(
                "force buffer has {} slots ({} owned) but the system has {} ({} owned)",
                self.forces.len(),
                self.n_local,
                particles.n_total(),
                particles.n_local()
            )));
        }
        Ok(())
    }

    /// Number of slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.forces.len()
    }

    /// Whether the buffer has no slots.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.forces.is_empty()
    }

    /// Number of owned slots.
    #[inline]
    pub fn n_local(&self) -> usize {
        self.n_local
    }

    /// Add a force to slot `idx`. Ghost slots are skipped.
    #[inline]
    pub fn add_force(&mut self, idx: usize, f: Vector3<f64>) {
        if idx < self.n_local {
            self.forces[idx] += f;
        }
    }

    /// Add energy to slot `idx`. Ghost slots are skipped.
    #[inline]
    pub fn add_energy(&mut self, idx: usize, e: f64) {
        if idx < self.n_local {
            self.energies[idx] += e;
        }
    }

    /// Add a virial to slot `idx`. Ghost slots are skipped.
    #[inline]
    pub fn add_virial(&mut self, idx: usize, v: Virial) {
        if idx < self.n_local {
            self.virials[idx] += v;
        }
    }

    /// Add a whole contribution to slot `idx`. Ghost slots are skipped.
    #[inline]
    pub fn add(&mut self, idx: usize, c: &Contribution) {
        if idx < self.n_local {
            self.forces[idx] += c.force;
            self.energies[idx] += c.energy;
            self.virials[idx] += c.virial;
        }
    }

    /// Force on slot `idx`.
    #[inline]
    pub fn force(&self, idx: usize) -> Vector3<f64> {
        self.forces[idx]
    }

    /// Energy of slot `idx`.
    #[inline]
    pub fn energy(&self, idx: usize) -> f64 {
        self.energies[idx]
    }

    /// Virial of slot `idx`.
    #[inline]
    pub fn virial(&self, idx: usize) -> Virial {
        self.virials[idx]
    }

    /// Total energy over owned slots.
    pub fn total_energy(&self) -> f64 {
        self.energies[..self.n_local].iter().sum()
    }

    /// Sum of forces over owned slots.
    pub fn net_force(&self) -> Vector3<f64> {
        self.forces[..self.n_local]
            .iter()
            .fold(Vector3::zeros(), |acc, f| acc + f)
    }

    /// Sum of virials over owned slots.
    pub fn total_virial(&self) -> Virial {
        self.virials[..self.n_local]
            .iter()
            .fold(Virial::ZERO, |acc, &v| acc + v)
    }

    /// Virial contribution to the scalar pressure, `trace(W) / (3V)`.
    pub fn pressure(&self, volume: f64) -> f64 {
        self.total_virial().trace() / (3.0 * volume)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_outer_is_symmetric() {
        let d = Vector3::new(1.0, 2.0, 3.0);
        let f = Vector3::new(-1.0, 0.5, 4.0);
        let v = Virial::from_outer(&d, &f);
        assert_eq!(v.0[0], -1.0);
        assert_eq!(v.0[1], 0.5 * (0.5 - 2.0));
        assert_eq!(v.0[5], 12.0);
        assert_eq!(v, Virial::from_outer(&f, &d));
        assert_eq!(v.trace(), d.dot(&f));
    }

    #[test]
    fn test_ghost_slots_are_skipped() {
        let mut buf = ForceBuffer::with_layout(2, 3);
        let c = Contribution {
            force: Vector3::x(),
            energy: 1.5,
            virial: Virial([1.0; 6]),
        };
        buf.add(0, &c);
        buf.add(2, &c);
        buf.add_force(1, Vector3::y());

        assert_eq!(buf.force(2), Vector3::zeros());
        assert_eq!(buf.energy(2), 0.0);
        assert_eq!(buf.total_energy(), 1.5);
        assert_eq!(buf.net_force(), Vector3::new(1.0, 1.0, 0.0));
        assert_eq!(buf.pressure(1.0), 1.0);

        buf.zero();
        assert_eq!(buf.total_energy(), 0.0);
        assert_eq!(buf.total_virial(), Virial::ZERO);
    }
}
