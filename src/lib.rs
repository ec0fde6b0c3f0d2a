//! # meshforce
//!
//! Mesh-constraint forces for particle simulations of triangulated surfaces
//! such as membranes and vesicles.
//!
//! The vertices of a surface mesh are simulated particles living in a
//! periodic box. Three force modules derive forces, per-particle energies and
//! per-particle virials from the mesh geometry:
//!
//! - **Local area conservation**: every triangle relaxes towards a target area
//! - **Global area conservation**: the total area of each mesh type relaxes
//!   towards a target, which needs a cross-rank reduction before forces can
//!   be evaluated
//! - **Helfrich bending**: the discrete cotangent-Laplacian bending energy,
//!   evaluated in two passes
//!
//! Every module runs either sequentially or with one rayon task per owned
//! vertex, and both paths agree to floating-point tolerance.
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use meshforce::prelude::*;
//! use meshforce::mesh::primitives::icosphere;
//!
//! let sphere = icosphere(2, 3.0);
//! let topology = Arc::new(sphere.topology().unwrap());
//! let particles = sphere.particles(BoxDim::cube(20.0));
//!
//! let mut bending = HelfrichBending::new(Arc::clone(&topology));
//! bending.set_params(TypeId::new(0), 20.0).unwrap();
//!
//! let mut area = AreaConservation::new(topology, Arc::new(SingleRank), false);
//! area.set_params(TypeId::new(0), 1000.0, 110.0).unwrap();
//!
//! let mut forces = ForceBuffer::new(&particles);
//! bending.evaluate(0, &particles, &mut forces).unwrap();
//! area.evaluate(0, &particles, &mut forces).unwrap();
//!
//! assert!(forces.net_force().norm() < 1e-8);
//! println!("energy {:.4}", forces.total_energy());
//! ```
//!
//! ## Domain Decomposition
//!
//! Forces only ever write to owned particles (`index < n_local`), while ghost
//! copies are read for geometry. [`system::Communicator`] is the collective
//! used by the global area force; [`force::run_decomposed`] drives a whole
//! in-process decomposition over a [`system::ThreadGroup`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod force;
pub mod geometry;
pub mod mesh;
pub mod system;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use meshforce::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{ForceError, Result};
    pub use crate::force::{
        AreaConservation, EvaluateOptions, ForceBuffer, HelfrichBending, MeshForce,
        TriangleAreaConservation, Virial,
    };
    pub use crate::geometry::BoxDim;
    pub use crate::mesh::{build_from_triangles, build_typed, MeshTopology, Tag, TypeId};
    pub use crate::system::{Communicator, ParticleData, SingleRank};
}

// Re-export nalgebra types for convenience
pub use nalgebra;

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::prelude::*;
    use nalgebra::Point3;

    #[test]
    fn test_tetrahedron() {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, 0.5, 1.0),
        ];

        let faces = vec![
            [0, 2, 1], // bottom
            [0, 1, 3], // front
            [1, 2, 3], // right
            [2, 0, 3], // left
        ];

        let topology = Arc::new(build_from_triangles(&faces).unwrap());
        assert_eq!(topology.num_bonds(), 6);
        let particles = ParticleData::new(BoxDim::cube(10.0), positions);

        let mut local = TriangleAreaConservation::new(Arc::clone(&topology), Arc::new(SingleRank));
        local.set_params(TypeId::new(0), 1.0, 0.3).unwrap();
        let mut bending = HelfrichBending::new(topology);
        bending.set_params(TypeId::new(0), 1.0).unwrap();

        let mut forces = ForceBuffer::new(&particles);
        local.evaluate(0, &particles, &mut forces).unwrap();
        bending.evaluate(0, &particles, &mut forces).unwrap();
        assert!(forces.net_force().norm() < 1e-10);
        assert!(forces.total_energy() > 0.0);
    }
}
