//! Triangle area and its gradient, shared by both area-conservation forces.

use nalgebra::{Point3, Vector3};
use rayon::prelude::*;

use super::buffer::{Contribution, Virial};
use crate::geometry::{dcos_du, Angle, BoxDim, Edge};
use crate::mesh::{ResolvedMesh, ResolvedTriangle};
use crate::system::ParticleData;

/// Geometry of triangle `(A, B, C)` seen from vertex A.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TriangleGeometry {
    dab: Edge,
    dac: Edge,
    angle: Angle,
}

impl TriangleGeometry {
    pub(crate) fn new(
        box_dim: &BoxDim,
        a: &Point3<f64>,
        b: &Point3<f64>,
        c: &Point3<f64>,
    ) -> Self {
        let dab = Edge::new(box_dim.delta(a, b));
        let dac = Edge::new(box_dim.delta(a, c));
        let angle = Angle::between(&dab.n, &dac.n);
        Self { dab, dac, angle }
    }

    pub(crate) fn of(box_dim: &BoxDim, positions: &[Point3<f64>], tri: &ResolvedTriangle) -> Self {
        let [a, b, c] = tri.vertices;
        Self::new(box_dim, &positions[a], &positions[b], &positions[c])
    }

    /// `½ |AB| |AC| sin∠A`, with the unclamped sine.
    #[inline]
    pub(crate) fn area(&self) -> f64 {
        0.5 * self.dab.r * self.dac.r * self.angle.sin
    }

    /// Gradients of the area with respect to `dab` and `dac`.
    pub(crate) fn area_gradient(&self) -> (Vector3<f64>, Vector3<f64>) {
        let (dab, dac, angle) = (&self.dab, &self.dac, &self.angle);
        let dsin = angle.dsin_dcos();
        let dc_dab = dcos_du(dab, dac, angle.cos);
        let dc_dac = dcos_du(dac, dab, angle.cos);

        let gab = 0.5 * dac.r * (angle.sin * dab.n + dab.r * dsin * dc_dab);
        let gac = 0.5 * dab.r * (angle.sin * dac.n + dac.r * dsin * dc_dac);
        (gab, gac)
    }

    /// Contributions to A, B and C for an objective with derivative `du_da`
    /// with respect to this triangle's area, plus `energy` on every vertex.
    pub(crate) fn contributions(
        &self,
        du_da: f64,
        energy: f64,
        compute_virial: bool,
    ) -> [Contribution; 3] {
        let (gab, gac) = self.area_gradient();
        let fab = -du_da * gab;
        let fac = -du_da * gac;

        let (va, vb, vc) = if compute_virial {
            let wab = Virial::from_outer(&self.dab.d, &fab) * 0.5;
            let wac = Virial::from_outer(&self.dac.d, &fac) * 0.5;
            (wab + wac, wab, wac)
        } else {
            (Virial::ZERO, Virial::ZERO, Virial::ZERO)
        };

        [
            Contribution {
                force: fab + fac,
                energy,
                virial: va,
            },
            Contribution {
                force: -fab,
                energy,
                virial: vb,
            },
            Contribution {
                force: -fac,
                energy,
                virial: vc,
            },
        ]
    }
}

/// Sum triangle areas per type record.
///
/// With `thirds`, every triangle adds a third of its area for each of its
/// vertices that is owned by this rank, so that the shares of all
/// ranks add up to the full area. Otherwise whole areas are added. Records
/// are picked by `record(type_id)`.
pub(crate) fn area_by_type(
    mesh: &ResolvedMesh,
    particles: &ParticleData,
    num_records: usize,
    thirds: bool,
    parallel: bool,
    record: impl Fn(&ResolvedTriangle) -> usize + Sync,
) -> Vec<f64> {
    let box_dim = particles.box_dim();
    let positions = particles.positions();
    let n_local = particles.n_local();
    let share = |tri: &ResolvedTriangle| -> (usize, f64) {
        let area = TriangleGeometry::of(box_dim, positions, tri).area();
        let weight = if thirds {
            tri.vertices.iter().filter(|&&v| v < n_local).count() as f64 / 3.0
        } else {
            1.0
        };
        (record(tri), weight * area)
    };

    if parallel {
        mesh.triangles
            .par_iter()
            .fold(
                || vec![0.0; num_records],
                |mut acc, tri| {
                    let (r, a) = share(tri);
                    acc[r] += a;
                    acc
                },
            )
            .reduce(
                || vec![0.0; num_records],
                |mut a, b| {
                    for (x, y) in a.iter_mut().zip(b) {
                        *x += y;
                    }
                    a
                },
            )
    } else {
        let mut acc = vec![0.0; num_records];
        for tri in &mesh.triangles {
            let (r, a) = share(tri);
            acc[r] += a;
        }
        acc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn equilateral() -> [Point3<f64>; 3] {
        [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 3.0_f64.sqrt() / 2.0, 0.0),
        ]
    }

    #[test]
    fn test_area() {
        let [a, b, c] = equilateral();
        let g = TriangleGeometry::new(&BoxDim::cube(10.0), &a, &b, &c);
        assert!((g.area() - 3.0_f64.sqrt() / 4.0).abs() < 1e-15);
    }

    #[test]
    fn test_area_gradient_matches_finite_difference() {
        let bx = BoxDim::cube(10.0);
        let a = Point3::new(0.1, 0.2, -0.3);
        let b = Point3::new(1.2, 0.1, 0.2);
        let c = Point3::new(0.4, 0.9, 0.1);
        let (gab, _) = TriangleGeometry::new(&bx, &a, &b, &c).area_gradient();

        // Moving A by h moves dab by h as well as dac; move B instead, which
        // shifts only dab, by -h.
        let h = 1e-6;
        for axis in 0..3 {
            let mut bp = b;
            let mut bm = b;
            bp[axis] -= h;
            bm[axis] += h;
            let ap = TriangleGeometry::new(&bx, &a, &bp, &c).area();
            let am = TriangleGeometry::new(&bx, &a, &bm, &c).area();
            let fd = (ap - am) / (2.0 * h);
            assert!((fd - gab[axis]).abs() < 1e-8, "axis {axis}: {fd} vs {}", gab[axis]);
        }
    }

    #[test]
    fn test_contributions_sum_to_zero() {
        let bx = BoxDim::cube(10.0);
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.2, 0.0);
        let c = Point3::new(0.3, 0.8, 0.4);
        let cs = TriangleGeometry::new(&bx, &a, &b, &c).contributions(0.7, 0.1, true);
        let net = cs[0].force + cs[1].force + cs[2].force;
        assert!(net.norm() < 1e-14);
    }

    #[test]
    fn test_area_across_periodic_boundary() {
        let bx = BoxDim::cube(4.0);
        let [a, b, c] = equilateral();
        let shift = Vector3::new(4.0, 0.0, -4.0);
        let g = TriangleGeometry::new(&bx, &a, &(b + shift), &c);
        assert!((g.area() - 3.0_f64.sqrt() / 4.0).abs() < 1e-14);
    }
}
