//! Discrete Helfrich bending.
//!
//! The bending energy is built from the cotangent Laplacian. For every
//! non-boundary bond `(A, B)` with opposite vertices `C` and `D`, the weight
//!
//! ```text
//! σ̂ = (cot∠ACB + cot∠ADB) / 2
//! ```
//!
//! feeds two per-vertex sums: the mixed area `σ_v = Σ σ̂ |AB|² / 4` and the
//! curvature normal `σ'_v = Σ ±σ̂ (A − B)`. The energy of a vertex is
//!
//! ```text
//! E_v = k_v / 2 · |σ'_v|² / σ_v
//! ```
//!
//! Since a bond's force depends on the sums at both of its end vertices,
//! evaluation runs in two passes: [`SigmaField`] is completed for every
//! particle slot first, then every bond differentiates its own share of the
//! sums with respect to A, B, C and D.
//!
//! Only vertex A of each bond receives the bond's virial.

use std::ops::AddAssign;
use std::sync::Arc;

use nalgebra::{Point3, Vector3};
use rayon::prelude::*;

use super::buffer::{Contribution, ForceBuffer, Virial};
use super::params::{warn_non_positive, BendingParams, ParamTable};
use super::{gather_owned, EvaluateOptions, MeshForce};
use crate::error::{ForceError, Result};
use crate::geometry::{dcos_du, Angle, BoxDim, Edge};
use crate::mesh::{bond_star, BondRole, BondSlot, MeshTopology, ResolvedMesh, Star, TypeId};
use crate::system::ParticleData;

/// Vertices whose mixed area is below this contribute no energy or force.
pub const MIN_MIXED_AREA: f64 = 1e-12;

/// Per-particle results of the first pass.
///
/// Indexed by particle slot, ghosts included.
#[derive(Debug, Clone, Default)]
pub struct SigmaField {
    mixed_area: Vec<f64>,
    curvature_normal: Vec<Vector3<f64>>,
    stiffness: Vec<f64>,
}

impl SigmaField {
    /// Mixed area `σ` at a particle slot.
    #[inline]
    pub fn mixed_area(&self, idx: usize) -> f64 {
        self.mixed_area[idx]
    }

    /// Curvature normal `σ'` at a particle slot.
    #[inline]
    pub fn curvature_normal(&self, idx: usize) -> Vector3<f64> {
        self.curvature_normal[idx]
    }

    /// Mean rigidity of the valid bonds ending at a particle slot, or zero
    /// if there are none.
    #[inline]
    pub fn stiffness(&self, idx: usize) -> f64 {
        self.stiffness[idx]
    }

    /// Bending energy of a particle slot.
    pub fn energy(&self, idx: usize) -> f64 {
        let sigma = self.mixed_area[idx];
        if sigma.abs() < MIN_MIXED_AREA {
            return 0.0;
        }
        0.5 * self.stiffness[idx] * self.curvature_normal[idx].norm_squared() / sigma
    }

    /// Number of particle slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.mixed_area.len()
    }

    /// Check if the field is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.mixed_area.is_empty()
    }
}

/// Accumulator for one slot during the first pass.
#[derive(Debug, Clone, Copy, Default)]
struct SigmaSum {
    area: f64,
    normal: Vector3<f64>,
    k_sum: f64,
    bonds: u32,
}

impl AddAssign for SigmaSum {
    fn add_assign(&mut self, rhs: SigmaSum) {
        self.area += rhs.area;
        self.normal += rhs.normal;
        self.k_sum += rhs.k_sum;
        self.bonds += rhs.bonds;
    }
}

/// Cotangent of the angle at `o` in triangle `(a, b, o)` and its gradient
/// with respect to `a`, `b` and `o`.
#[derive(Debug, Clone, Copy)]
struct CotWeight {
    cot: f64,
    grad: [Vector3<f64>; 3],
}

impl CotWeight {
    fn new(box_dim: &BoxDim, a: &Point3<f64>, b: &Point3<f64>, o: &Point3<f64>) -> Self {
        let u = Edge::new(box_dim.delta(a, o));
        let w = Edge::new(box_dim.delta(b, o));
        let angle = Angle::between(&u.n, &w.n);
        let dcot = angle.dcot_dcos();
        let ga = dcot * dcos_du(&u, &w, angle.cos);
        let gb = dcot * dcos_du(&w, &u, angle.cos);
        Self {
            cot: angle.cot(),
            grad: [ga, gb, -(ga + gb)],
        }
    }
}

/// Cotangent of the angle at `o` in triangle `(a, b, o)`.
fn cotangent(box_dim: &BoxDim, a: &Point3<f64>, b: &Point3<f64>, o: &Point3<f64>) -> f64 {
    let u = Edge::new(box_dim.delta(a, o));
    let w = Edge::new(box_dim.delta(b, o));
    Angle::between(&u.n, &w.n).cot()
}

/// First-pass share of bond `[A, B, C, D]` at its end vertex A (`sign = 1`)
/// or B (`sign = -1`).
fn bond_sigma(
    box_dim: &BoxDim,
    positions: &[Point3<f64>],
    quad: [usize; 4],
    sign: f64,
    k: f64,
) -> SigmaSum {
    let [a, b, c, d] = quad.map(|i| &positions[i]);
    let dab = box_dim.delta(a, b);
    let sigma_hat = 0.5 * (cotangent(box_dim, a, b, c) + cotangent(box_dim, a, b, d));
    SigmaSum {
        area: 0.25 * sigma_hat * dab.norm_squared(),
        normal: sign * sigma_hat * dab,
        k_sum: k,
        bonds: 1,
    }
}

/// Forces on `[A, B, C, D]` from one bond, plus the bond vector `A − B`.
fn bond_forces(
    box_dim: &BoxDim,
    positions: &[Point3<f64>],
    quad: [usize; 4],
    field: &SigmaField,
) -> ([Vector3<f64>; 4], Vector3<f64>) {
    let [a, b, c, d] = quad.map(|i| &positions[i]);
    let dab = box_dim.delta(a, b);
    let rsq = dab.norm_squared();
    let wc = CotWeight::new(box_dim, a, b, c);
    let wd = CotWeight::new(box_dim, a, b, d);
    let sigma_hat = 0.5 * (wc.cot + wd.cot);
    let grad_hat = [
        0.5 * (wc.grad[0] + wd.grad[0]),
        0.5 * (wc.grad[1] + wd.grad[1]),
        0.5 * wc.grad[2],
        0.5 * wd.grad[2],
    ];

    let mut forces = [Vector3::zeros(); 4];
    for (v, sign) in [(quad[0], 1.0), (quad[1], -1.0)] {
        let sigma = field.mixed_area[v];
        if sigma.abs() < MIN_MIXED_AREA {
            continue;
        }
        let k = field.stiffness[v];
        let g = field.curvature_normal[v] / sigma;
        let q = 0.5 * g.norm_squared();
        let dg = sign * dab.dot(&g);

        for (x, f) in forces.iter_mut().enumerate() {
            // d(±σ̂ dab)ᵀ g and the gradient of σ̂ |dab|² / 4.
            let mut term = (dg - 0.25 * q * rsq) * grad_hat[x];
            if x == BondRole::A.slot() {
                term += sign * sigma_hat * g - 0.5 * q * sigma_hat * dab;
            } else if x == BondRole::B.slot() {
                term += -sign * sigma_hat * g + 0.5 * q * sigma_hat * dab;
            }
            *f -= k * term;
        }
    }
    (forces, dab)
}

/// Helfrich bending force on a triangulated surface.
///
/// Rigidities are per bond type.
pub struct HelfrichBending {
    topology: Arc<MeshTopology>,
    params: ParamTable<BendingParams>,
    options: EvaluateOptions,
    sigma: SigmaField,
}

impl HelfrichBending {
    /// Name used in logs and errors.
    pub const NAME: &'static str = "helfrich";

    /// Create the force with every type's rigidity unset.
    pub fn new(topology: Arc<MeshTopology>) -> Self {
        log::debug!(
            "{}: {} bonds ({} on the boundary)",
            Self::NAME,
            topology.num_bonds(),
            topology.num_boundary_bonds()
        );
        Self {
            params: ParamTable::new(Self::NAME, topology.num_types()),
            topology,
            options: EvaluateOptions::default(),
            sigma: SigmaField::default(),
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

    /// Set the bending rigidity for a bond type.
    pub fn set_params(&mut self, type_id: TypeId, k: f64) -> Result<()> {
        let name = self.topology.type_name(type_id)?;
        warn_non_positive(Self::NAME, name, "k", k);
        log::debug!("{}: type {} k={}", Self::NAME, name, k);
        self.params.set(type_id.index(), BendingParams { k })
    }

    /// Rigidity of a bond type.
    pub fn params(&self, type_id: TypeId) -> Result<BendingParams> {
        let name = self.topology.type_name(type_id)?;
        self.params
            .get(type_id.index())
            .ok_or_else(|| ForceError::MissingParameters {
                force: Self::NAME,
                type_name: name.to_string(),
            })
    }

    /// First-pass fields of the last evaluation.
    pub fn sigma(&self) -> &SigmaField {
        &self.sigma
    }

    /// Run only the first pass for the current positions.
    pub fn compute_sigma(&mut self, particles: &ParticleData) -> Result<&SigmaField> {
        let stiffness = self.rigidities()?;
        let mesh = ResolvedMesh::full(&self.topology, particles)?;
        let star = self.options.parallel.then(|| bond_star(&mesh));
        self.sigma = sigma_field(&mesh, particles, &stiffness, star.as_ref());
        Ok(&self.sigma)
    }

    fn rigidities(&self) -> Result<Vec<f64>> {
        Ok(self
            .params
            .resolve_all(&self.topology)?
            .iter()
            .map(|p| p.k)
            .collect())
    }
}

/// First pass over every particle slot.
fn sigma_field(
    mesh: &ResolvedMesh,
    particles: &ParticleData,
    stiffness: &[f64],
    star: Option<&Star<BondSlot>>,
) -> SigmaField {
    let box_dim = particles.box_dim();
    let positions = particles.positions();

    let sums: Vec<SigmaSum> = match star {
        Some(star) => (0..mesh.num_particles)
            .into_par_iter()
            .map(|v| {
                let mut total = SigmaSum::default();
                for slot in star.of(v) {
                    let sign = match slot.role {
                        BondRole::A => 1.0,
                        BondRole::B => -1.0,
                        BondRole::C | BondRole::D => continue,
                    };
                    let bond = &mesh.bonds[slot.bond];
                    if let Some(quad) = bond.quad() {
                        let k = stiffness[bond.type_id.index()];
                        total += bond_sigma(box_dim, positions, quad, sign, k);
                    }
                }
                total
            })
            .collect(),
        None => {
            let mut sums = vec![SigmaSum::default(); mesh.num_particles];
            for bond in &mesh.bonds {
                let Some(quad) = bond.quad() else { continue };
                let k = stiffness[bond.type_id.index()];
                sums[quad[0]] += bond_sigma(box_dim, positions, quad, 1.0, k);
                sums[quad[1]] += bond_sigma(box_dim, positions, quad, -1.0, k);
            }
            sums
        }
    };

    SigmaField {
        mixed_area: sums.iter().map(|s| s.area).collect(),
        curvature_normal: sums.iter().map(|s| s.normal).collect(),
        stiffness: sums
            .iter()
            .map(|s| {
                if s.bonds > 0 {
                    s.k_sum / s.bonds as f64
                } else {
                    0.0
                }
            })
            .collect(),
    }
}

impl MeshForce for HelfrichBending {
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
        let stiffness = self.rigidities()?;
        let mesh = ResolvedMesh::full(&self.topology, particles)?;
        let star = self.options.parallel.then(|| bond_star(&mesh));
        log::trace!(
            "{}: step {} over {} bonds",
            Self::NAME,
            timestep,
            mesh.bonds.len()
        );

        self.sigma = sigma_field(&mesh, particles, &stiffness, star.as_ref());

        let field = &self.sigma;
        let box_dim = particles.box_dim();
        let positions = particles.positions();
        let compute_virial = self.options.compute_virial;

        match &star {
            Some(star) => {
                // Each bond once, then every owned vertex picks up its share.
                let per_bond: Vec<Option<([Vector3<f64>; 4], Vector3<f64>)>> = mesh
                    .bonds
                    .par_iter()
                    .map(|bond| {
                        bond.quad()
                            .map(|quad| bond_forces(box_dim, positions, quad, field))
                    })
                    .collect();
                gather_owned(particles.n_local(), forces, |v| {
                    let mut total = Contribution {
                        energy: field.energy(v),
                        ..Default::default()
                    };
                    for slot in star.of(v) {
                        let Some((f, dab)) = &per_bond[slot.bond] else {
                            continue;
                        };
                        total.force += f[slot.role.slot()];
                        if compute_virial && slot.role == BondRole::A {
                            total.virial += Virial::from_outer(dab, &f[0]) * 0.5;
                        }
                    }
                    total
                })
            }
            None => {
                for bond in &mesh.bonds {
                    let Some(quad) = bond.quad() else { continue };
                    let (f, dab) = bond_forces(box_dim, positions, quad, field);
                    for (&v, fv) in quad.iter().zip(f) {
                        forces.add_force(v, fv);
                    }
                    if compute_virial {
                        forces.add_virial(quad[0], Virial::from_outer(&dab, &f[0]) * 0.5);
                    }
                }
                for v in 0..particles.n_local() {
                    forces.add_energy(v, field.energy(v));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use nalgebra::{Rotation3, Vector3};

    use super::*;
    use crate::force::testing::*;
    use crate::mesh::primitives::{flat_grid, hexagonal_patch, icosphere, tent, MeshGeometry};
    use crate::mesh::{build_typed, MeshBond};

    fn bending(topo: MeshTopology, k: f64) -> HelfrichBending {
        let mut f = HelfrichBending::new(Arc::new(topo));
        f.set_params(TypeId::new(0), k).unwrap();
        f
    }

    #[test]
    fn test_flat_tent_has_no_energy() {
        let t = tent(0.0);
        let pd = t.particles(big_box());
        for options in [EvaluateOptions::new(), EvaluateOptions::new().sequential()] {
            let mut f = bending(t.topology().unwrap(), 1.0).with_options(options);
            let buf = evaluate(&mut f, &pd);
            for v in 0..4 {
                assert!(buf.energy(v).abs() < 1e-24);
                assert!(buf.force(v).norm() < 1e-12);
            }
        }
    }

    #[test]
    fn test_folded_tent() {
        // C and D see the bond at a right angle wherever they sit on the
        // circle around its midpoint, so push them outwards.
        let mut t = tent(0.6);
        let mid = Point3::new(0.5, 0.5, 0.0);
        for i in [2, 3] {
            t.positions[i] = mid + 1.5 * (t.positions[i] - mid);
        }
        let pd = t.particles(big_box());
        let mut f = bending(t.topology().unwrap(), 2.0);
        let buf = evaluate(&mut f, &pd);
        assert!(buf.total_energy() > 0.0);
        assert!(buf.net_force().norm() < 1e-12);
        check_finite_difference(&mut f, &pd, 1e-5);
    }

    fn folded_tent() -> MeshGeometry {
        let mut t = tent(0.6);
        let mid = Point3::new(0.5, 0.5, 0.0);
        for i in [2, 3] {
            t.positions[i] = mid + 1.5 * (t.positions[i] - mid);
        }
        t
    }

    #[test]
    fn test_virial_goes_to_first_bond_vertex() {
        let t = folded_tent();
        let topo = t.topology().unwrap();
        let interior = topo.bonds().iter().find(|b| !b.is_boundary()).unwrap();
        let [a, b] = interior.tags.map(|tag| tag.index());
        let pd = t.particles(big_box());
        let dab = pd.box_dim().delta(pd.position(a), pd.position(b));

        for options in [EvaluateOptions::new(), EvaluateOptions::new().sequential()] {
            let mut f = bending(topo.clone(), 2.0).with_options(options);
            let buf = evaluate(&mut f, &pd);
            let expected = Virial::from_outer(&dab, &buf.force(a)) * 0.5;
            assert!(expected.max_abs() > 1e-10);
            assert!((buf.virial(a) - expected).max_abs() < 1e-12);
            for v in (0..4).filter(|&v| v != a) {
                assert_eq!(buf.virial(v), Virial::ZERO, "vertex {v}");
            }
        }
    }

    #[test]
    fn test_negative_rigidity_still_evaluates() {
        let t = folded_tent();
        let pd = t.particles(big_box());
        let mut f = HelfrichBending::new(Arc::new(t.topology().unwrap()));
        f.set_params(TypeId::new(0), -1.0).unwrap();
        let mut buf = ForceBuffer::new(&pd);
        f.evaluate(0, &pd, &mut buf).unwrap();
        assert!(buf.total_energy() < 0.0);
        for v in 0..4 {
            assert!(buf.force(v).iter().all(|x| x.is_finite()));
        }
    }

    #[test]
    fn test_sphere_across_periodic_boundary() {
        let sphere = perturbed_sphere();
        let box_dim = BoxDim::cube(8.0);
        let pd = sphere.particles(box_dim);

        // Shift the sphere onto the box face and wrap every vertex into the
        // primary image, so some of its bonds cross the boundary.
        let mut wrapped = sphere.clone().translated(Vector3::new(4.0, 0.0, 3.9));
        for p in &mut wrapped.positions {
            *p = Point3::from(box_dim.min_image(p.coords));
        }
        assert!(wrapped.positions.iter().any(|p| p.x > 3.0));
        assert!(wrapped.positions.iter().any(|p| p.x < -3.0));
        let moved = wrapped.particles(box_dim);

        let mut f = bending(sphere.topology().unwrap(), 1.5);
        let before = evaluate(&mut f, &pd);
        let after = evaluate(&mut f, &moved);
        assert_buffers_close(&before, &after, 1e-9);
    }

    #[test]
    fn test_boundary_bond_contributes_nothing() {
        // The folded tent with its only interior bond marked as boundary.
        let t = tent(0.6);
        let pd = t.particles(big_box());
        let topo = t.topology().unwrap();
        let bonds: Vec<MeshBond> = topo
            .bonds()
            .iter()
            .map(|b| MeshBond {
                triangles: [b.triangles[0], b.triangles[0]],
                ..*b
            })
            .collect();
        let open = MeshTopology::new(
            topo.type_names().to_vec(),
            topo.triangles().to_vec(),
            bonds,
        )
        .unwrap();

        let mut f = bending(open, 2.0);
        let buf = evaluate(&mut f, &pd);
        for v in 0..4 {
            assert_eq!(f.sigma().mixed_area(v), 0.0);
            assert_eq!(f.sigma().curvature_normal(v), Vector3::zeros());
            assert_eq!(buf.force(v), Vector3::zeros());
            assert_eq!(buf.energy(v), 0.0);
        }
    }

    #[test]
    fn test_flat_hexagon_centre() {
        let hex = hexagonal_patch(1.0);
        let pd = hex.particles(big_box());
        let mut f = bending(hex.topology().unwrap(), 1.0);
        let buf = evaluate(&mut f, &pd);

        let sigma = f.sigma();
        assert!(sigma.curvature_normal(0).norm() < 1e-12);
        // Six spokes, each with weight cot 60°, length 1.
        let expected = 6.0 * (1.0 / 3.0_f64.sqrt()) / 4.0;
        assert!((sigma.mixed_area(0) - expected).abs() < 1e-12);
        assert!(buf.energy(0).abs() < 1e-20);
        assert!(buf.force(0).norm() < 1e-12);
    }

    #[test]
    fn test_flat_grid_interior() {
        let grid = flat_grid(4, 0.5);
        let pd = grid.particles(big_box());
        let mut f = bending(grid.topology().unwrap(), 1.0);
        let buf = evaluate(&mut f, &pd);
        // Vertex (2, 2) is in the middle of the grid.
        let centre = 2 * 5 + 2;
        assert!(f.sigma().curvature_normal(centre).norm() < 1e-12);
        assert!(buf.energy(centre).abs() < 1e-20);
        for v in 0..pd.n_local() {
            assert!(buf.force(v).z.abs() < 1e-12);
        }
    }

    #[test]
    fn test_sphere_energy() {
        // On a sphere E = 8πk independently of the radius.
        let sphere = icosphere(3, 2.0);
        let pd = sphere.particles(big_box());
        let mut f = bending(sphere.topology().unwrap(), 1.5);
        let buf = evaluate(&mut f, &pd);
        let expected = 8.0 * PI * 1.5;
        assert!(
            (buf.total_energy() - expected).abs() < 0.05 * expected,
            "energy {} vs {}",
            buf.total_energy(),
            expected
        );
    }

    #[test]
    fn test_forces_match_finite_difference() {
        let sphere = perturbed_sphere();
        let pd = sphere.particles(big_box());
        let mut f = bending(sphere.topology().unwrap(), 1.0);
        check_finite_difference(&mut f, &pd, 1e-5);
    }

    #[test]
    fn test_sequential_matches_parallel() {
        let sphere = perturbed_sphere();
        let pd = sphere.particles(big_box());
        let topo = sphere.topology().unwrap();
        let mut par = bending(topo.clone(), 1.0);
        let mut seq = bending(topo, 1.0).with_options(EvaluateOptions::new().sequential());
        let a = evaluate(&mut par, &pd);
        let b = evaluate(&mut seq, &pd);
        assert_buffers_close(&a, &b, 1e-10);
        assert!(a.net_force().norm() < 1e-10);
    }

    #[test]
    fn test_rotation_invariance() {
        let sphere = perturbed_sphere();
        let pd = sphere.particles(big_box());
        let mut f = bending(sphere.topology().unwrap(), 1.0);
        let before = evaluate(&mut f, &pd);

        let rot = Rotation3::from_euler_angles(0.3, -0.8, 1.2);
        let mut moved = pd.clone();
        moved.transform(&rot, Vector3::new(-2.0, 0.5, 1.0));
        let after = evaluate(&mut f, &moved);

        assert!((before.total_energy() - after.total_energy()).abs() < 1e-10);
        for i in 0..pd.n_local() {
            assert!((rot * before.force(i) - after.force(i)).norm() < 1e-9);
        }
    }

    #[test]
    fn test_reordering_follows_tags() {
        let sphere = perturbed_sphere();
        let pd = sphere.particles(big_box());
        let mut f = bending(sphere.topology().unwrap(), 1.0);
        let before = evaluate(&mut f, &pd);

        let n = pd.n_total();
        let perm: Vec<usize> = (0..n).map(|i| (i * 5 + 3) % n).collect();
        let mut shuffled = pd.clone();
        shuffled.reorder(&perm).unwrap();
        let after = evaluate(&mut f, &shuffled);

        for i in 0..n {
            let tag = shuffled.tag(i).index();
            assert!((after.force(i) - before.force(tag)).norm() < 1e-10);
            assert!((after.energy(i) - before.energy(tag)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_stiffness_is_mean_over_bond_types() {
        let sphere = perturbed_sphere();
        let types: Vec<u32> = (0..sphere.faces.len() as u32).map(|i| i % 2).collect();
        let topo = build_typed(vec!["soft".into(), "stiff".into()], &sphere.faces, &types).unwrap();
        let pd = sphere.particles(big_box());

        let mut f = HelfrichBending::new(Arc::new(topo.clone()));
        f.set_params(TypeId::new(0), 1.0).unwrap();
        f.set_params(TypeId::new(1), 3.0).unwrap();
        f.compute_sigma(&pd).unwrap();

        let mut k_sum = vec![0.0; pd.n_total()];
        let mut count = vec![0.0; pd.n_total()];
        for bond in topo.bonds().iter().filter(|b| !b.is_boundary()) {
            let k = [1.0, 3.0][bond.type_id.index()];
            for tag in bond.tags {
                k_sum[tag.index()] += k;
                count[tag.index()] += 1.0;
            }
        }
        for v in 0..pd.n_total() {
            let expected = k_sum[v] / count[v];
            assert!((f.sigma().stiffness(v) - expected).abs() < 1e-14);
        }
    }

    #[test]
    fn test_missing_rigidity() {
        let t = tent(0.3);
        let pd = t.particles(big_box());
        let mut f = HelfrichBending::new(Arc::new(t.topology().unwrap()));
        let mut buf = ForceBuffer::new(&pd);
        assert!(matches!(
            f.evaluate(0, &pd, &mut buf),
            Err(ForceError::MissingParameters { force: "helfrich", .. })
        ));
        assert!(f.params(TypeId::new(0)).is_err());
    }
}
