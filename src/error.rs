//! Error types for meshforce.
//!
//! Every unrecoverable condition aborts the whole evaluation and surfaces as a
//! [`ForceError`]. Numerical degeneracies are clamped and never reach this type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`ForceError`].
pub type Result<T> = std::result::Result<T, ForceError>;

/// Errors that can occur while building meshes or evaluating mesh forces.
#[derive(Error, Debug)]
pub enum ForceError {
    /// The mesh has no triangles.
    #[error("mesh has no triangles")]
    EmptyMesh,

    /// A mesh element references a tag beyond the largest tag in the system.
    #[error("{element} {index} references tag {tag}, but the largest valid tag is {max_tag}")]
    TagOutOfRange {
        /// Kind of element ("triangle" or "bond").
        element: &'static str,
        /// Element index.
        index: usize,
        /// The offending tag.
        tag: u32,
        /// Largest valid tag.
        max_tag: u32,
    },

    /// A tag is valid but the particle is not present in the local arrays.
    #[error("{element} {index} references tag {tag}, which is not present on this rank")]
    MissingParticle {
        /// Kind of element ("triangle" or "bond").
        element: &'static str,
        /// Element index.
        index: usize,
        /// The missing tag.
        tag: u32,
    },

    /// A triangle has duplicate vertex tags.
    #[error("triangle {triangle} is degenerate (has duplicate vertices)")]
    DegenerateTriangle {
        /// The triangle index.
        triangle: usize,
    },

    /// A bond references a triangle that does not exist.
    #[error("bond {bond} references triangle {triangle}, but the mesh has {count} triangles")]
    TriangleOutOfRange {
        /// The bond index.
        bond: usize,
        /// The referenced triangle index.
        triangle: usize,
        /// Number of triangles in the mesh.
        count: usize,
    },

    /// A bond's adjacent triangle does not contain both end vertices.
    #[error("bond {bond} is not an edge of its adjacent triangle {triangle}")]
    BondTriangleMismatch {
        /// The bond index.
        bond: usize,
        /// The adjacent triangle index.
        triangle: usize,
    },

    /// An edge has more than two incident triangles.
    #[error("edge ({v0}, {v1}) has more than two incident triangles")]
    NonManifoldEdge {
        /// First vertex tag of the edge.
        v0: u32,
        /// Second vertex tag of the edge.
        v1: u32,
    },

    /// A mesh type name is not defined.
    #[error("unknown mesh type: {0}")]
    UnknownType(String),

    /// A mesh type id is out of range.
    #[error("invalid mesh type id {type_id} (mesh defines {num_types} types)")]
    InvalidTypeId {
        /// The offending id.
        type_id: u32,
        /// Number of defined types.
        num_types: usize,
    },

    /// A force module was evaluated before all of its parameters were set.
    #[error("{force}: no parameters set for mesh type {type_name}")]
    MissingParameters {
        /// Name of the force module.
        force: &'static str,
        /// Name of the type lacking parameters.
        type_name: String,
    },

    /// Invalid input for the requested operation.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The collective reduction failed.
    #[error("reduction failed: {0}")]
    Reduction(String),

    /// Particle arrays are inconsistent.
    #[error("invalid particle data: {0}")]
    InvalidParticleData(String),

    /// A parameter file could not be parsed.
    #[error("failed to parse parameters from {path}: {message}")]
    Config {
        /// The file path.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ForceError {
    /// Create an invalid particle data error.
    pub fn invalid_particles<T: std::fmt::Display>(message: T) -> Self {
        ForceError::InvalidParticleData(message.to_string())
    }
}
