//! Geometry kernel.
//!
//! Pure functions over explicit inputs shared by every force module: periodic
//! displacements, edge lengths and unit vectors, and robust angle evaluation.
//!
//! # Angles near collinearity
//!
//! Cosines are clamped to `[-1, 1]` before the sine is taken. When a sine is
//! about to be used as a divisor it is first raised to [`SIN_EPSILON`], which
//! bounds `1/sin` and `cot` for nearly collinear triples. This trades a small
//! bias on badly shaped triangles for finite forces; it is not an error
//! condition.
//!
//! Zero-length edges are not guarded: [`Edge::new`] on a zero vector yields a
//! NaN direction, so callers must not feed coincident vertices.

mod boxdim;

pub use boxdim::BoxDim;

use nalgebra::Vector3;

/// Lower bound applied to a sine before it is used as a divisor.
pub const SIN_EPSILON: f64 = 1e-3;

/// A displacement vector together with its length and direction.
#[derive(Debug, Clone, Copy)]
pub struct Edge {
    /// The displacement.
    pub d: Vector3<f64>,
    /// Squared length.
    pub rsq: f64,
    /// Length.
    pub r: f64,
    /// Unit vector along `d`.
    pub n: Vector3<f64>,
}

impl Edge {
    /// Decompose a displacement into length and direction.
    #[inline]
    pub fn new(d: Vector3<f64>) -> Self {
        let rsq = d.norm_squared();
        let r = rsq.sqrt();
        Self { d, rsq, r, n: d / r }
    }
}

/// Cosine and sine of an angle between two unit vectors.
#[derive(Debug, Clone, Copy)]
pub struct Angle {
    /// Clamped cosine.
    pub cos: f64,
    /// Sine, `sqrt(1 - cos²)`.
    pub sin: f64,
    /// `1 / max(sin, SIN_EPSILON)`.
    pub inv_sin: f64,
}

impl Angle {
    /// Angle between two unit vectors.
    #[inline]
    pub fn between(u: &Vector3<f64>, w: &Vector3<f64>) -> Self {
        Self::from_cos(u.dot(w))
    }

    /// Build from a raw (possibly out of range) cosine.
    #[inline]
    pub fn from_cos(c: f64) -> Self {
        let cos = clamp_cos(c);
        let sin = (1.0 - cos * cos).sqrt();
        Self {
            cos,
            sin,
            inv_sin: 1.0 / sin.max(SIN_EPSILON),
        }
    }

    /// Cotangent, using the clamped sine.
    #[inline]
    pub fn cot(&self) -> f64 {
        self.cos * self.inv_sin
    }

    /// Derivative of the cotangent with respect to the cosine.
    ///
    /// `d cot / d cos = 1/s + cos²/s³`, evaluated with the clamped sine.
    #[inline]
    pub fn dcot_dcos(&self) -> f64 {
        self.inv_sin * (1.0 + self.cos * self.cos * self.inv_sin * self.inv_sin)
    }

    /// Derivative of the sine with respect to the cosine, `-cos/sin`.
    #[inline]
    pub fn dsin_dcos(&self) -> f64 {
        -self.cos * self.inv_sin
    }
}

/// Clamp a cosine into `[-1, 1]`.
#[inline]
pub fn clamp_cos(c: f64) -> f64 {
    c.clamp(-1.0, 1.0)
}

/// Gradient of `cos(u, w) = û·ŵ` with respect to `u`.
///
/// The gradient with respect to `w` is obtained by swapping the arguments.
#[inline]
pub fn dcos_du(u: &Edge, w: &Edge, cos: f64) -> Vector3<f64> {
    (w.n - cos * u.n) / u.r
}
