//! Periodic simulation box.

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// A (possibly triclinic) periodic simulation box.
///
/// The box is spanned by the lattice vectors
/// `a1 = (Lx, 0, 0)`, `a2 = (xy·Ly, Ly, 0)` and `a3 = (xz·Lz, yz·Lz, Lz)`.
/// Each axis may independently be periodic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxDim {
    lengths: [f64; 3],
    xy: f64,
    xz: f64,
    yz: f64,
    periodic: [bool; 3],
}

impl BoxDim {
    /// Create an orthorhombic box, periodic along all three axes.
    pub fn new(lx: f64, ly: f64, lz: f64) -> Self {
        Self {
            lengths: [lx, ly, lz],
            xy: 0.0,
            xz: 0.0,
            yz: 0.0,
            periodic: [true; 3],
        }
    }

    /// Create a cubic box with side `l`.
    pub fn cube(l: f64) -> Self {
        Self::new(l, l, l)
    }

    /// Set the tilt factors.
    pub fn with_tilt(mut self, xy: f64, xz: f64, yz: f64) -> Self {
        self.xy = xy;
        self.xz = xz;
        self.yz = yz;
        self
    }

    /// Set per-axis periodicity.
    pub fn with_periodic(mut self, periodic: [bool; 3]) -> Self {
        self.periodic = periodic;
        self
    }

    /// Box edge lengths.
    #[inline]
    pub fn lengths(&self) -> [f64; 3] {
        self.lengths
    }

    /// Tilt factors (xy, xz, yz).
    #[inline]
    pub fn tilt(&self) -> (f64, f64, f64) {
        (self.xy, self.xz, self.yz)
    }

    /// Box volume.
    pub fn volume(&self) -> f64 {
        self.lengths[0] * self.lengths[1] * self.lengths[2]
    }

    /// Apply the minimum image convention to a displacement vector.
    ///
    /// Corrections are applied along z, then y, then x, so that tilted boxes
    /// carry the off-diagonal lattice components along with each image shift.
    pub fn min_image(&self, v: Vector3<f64>) -> Vector3<f64> {
        let [lx, ly, lz] = self.lengths;
        let mut w = v;

        if self.periodic[2] {
            let img = (w.z / lz).round_ties_even();
            w.z -= lz * img;
            w.y -= lz * self.yz * img;
            w.x -= lz * self.xz * img;
        }

        if self.periodic[1] {
            let img = (w.y / ly).round_ties_even();
            w.y -= ly * img;
            w.x -= ly * self.xy * img;
        }

        if self.periodic[0] {
            let img = (w.x / lx).round_ties_even();
            w.x -= lx * img;
        }

        w
    }

    /// Minimum-image displacement `a - b`.
    #[inline]
    pub fn delta(&self, a: &Point3<f64>, b: &Point3<f64>) -> Vector3<f64> {
        self.min_image(a - b)
    }
}

impl Default for BoxDim {
    fn default() -> Self {
        Self::cube(1.0)
    }
}
