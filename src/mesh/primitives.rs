//! Deterministic surface meshes.
//!
//! Used by the CLI, the benchmarks and the tests. Vertex `i` of every
//! primitive carries tag `i`.

use std::collections::HashMap;

use nalgebra::{Point3, Vector3};

use super::builder::build_from_triangles;
use super::topology::MeshTopology;
use crate::error::Result;
use crate::geometry::BoxDim;
use crate::system::ParticleData;

/// Vertex positions plus triangles given as vertex tags.
#[derive(Debug, Clone)]
pub struct MeshGeometry {
    /// Vertex positions; the index is the tag.
    pub positions: Vec<Point3<f64>>,
    /// Triangles as vertex tags, consistently wound.
    pub faces: Vec<[u32; 3]>,
}

impl MeshGeometry {
    /// Single-type topology of this mesh.
    pub fn topology(&self) -> Result<MeshTopology> {
        build_from_triangles(&self.faces)
    }

    /// Particle store with every vertex owned.
    pub fn particles(&self, box_dim: BoxDim) -> ParticleData {
        ParticleData::new(box_dim, self.positions.clone())
    }

    /// Number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.positions.len()
    }

    /// Displace every vertex by a fixed pseudo-random offset of magnitude up
    /// to `amplitude` along each axis.
    pub fn perturbed(mut self, amplitude: f64) -> Self {
        for (i, p) in self.positions.iter_mut().enumerate() {
            let x = i as f64;
            *p += amplitude
                * Vector3::new(
                    (1.3 * x + 0.1).sin(),
                    (2.1 * x + 0.7).sin(),
                    (3.7 * x + 1.9).sin(),
                );
        }
        self
    }

    /// Translate every vertex.
    pub fn translated(mut self, delta: Vector3<f64>) -> Self {
        for p in &mut self.positions {
            *p += delta;
        }
        self
    }
}

/// Geodesic sphere: an icosahedron refined `subdivisions` times, projected
/// onto a sphere of the given radius.
pub fn icosphere(subdivisions: usize, radius: f64) -> MeshGeometry {
    let phi = (1.0 + 5.0_f64.sqrt()) / 2.0;

    let mut vertices: Vec<Vector3<f64>> = [
        (-1.0, phi, 0.0),
        (1.0, phi, 0.0),
        (-1.0, -phi, 0.0),
        (1.0, -phi, 0.0),
        (0.0, -1.0, phi),
        (0.0, 1.0, phi),
        (0.0, -1.0, -phi),
        (0.0, 1.0, -phi),
        (phi, 0.0, -1.0),
        (phi, 0.0, 1.0),
        (-phi, 0.0, -1.0),
        (-phi, 0.0, 1.0),
    ]
    .iter()
    .map(|&(x, y, z)| Vector3::new(x, y, z).normalize())
    .collect();

    let mut faces: Vec<[u32; 3]> = vec![
        [0, 11, 5],
        [0, 5, 1],
        [0, 1, 7],
        [0, 7, 10],
        [0, 10, 11],
        [1, 5, 9],
        [5, 11, 4],
        [11, 10, 2],
        [10, 7, 6],
        [7, 1, 8],
        [3, 9, 4],
        [3, 4, 2],
        [3, 2, 6],
        [3, 6, 8],
        [3, 8, 9],
        [4, 9, 5],
        [2, 4, 11],
        [6, 2, 10],
        [8, 6, 7],
        [9, 8, 1],
    ];

    for _ in 0..subdivisions {
        let mut new_faces = Vec::with_capacity(faces.len() * 4);
        let mut midpoints: HashMap<(u32, u32), u32> = HashMap::new();

        for face in &faces {
            let mut mids = [0u32; 3];
            for i in 0..3 {
                let v0 = face[i];
                let v1 = face[(i + 1) % 3];
                let key = if v0 < v1 { (v0, v1) } else { (v1, v0) };
                mids[i] = *midpoints.entry(key).or_insert_with(|| {
                    let mid = (vertices[v0 as usize] + vertices[v1 as usize]) / 2.0;
                    vertices.push(mid.normalize());
                    (vertices.len() - 1) as u32
                });
            }

            new_faces.push([face[0], mids[0], mids[2]]);
            new_faces.push([face[1], mids[1], mids[0]]);
            new_faces.push([face[2], mids[2], mids[1]]);
            new_faces.push([mids[0], mids[1], mids[2]]);
        }

        faces = new_faces;
    }

    MeshGeometry {
        positions: vertices
            .into_iter()
            .map(|v| Point3::from(v * radius))
            .collect(),
        faces,
    }
}

/// Flat `n × n` grid of squares in the z = 0 plane, each split into two
/// triangles, centred on the origin.
pub fn flat_grid(n: usize, spacing: f64) -> MeshGeometry {
    let offset = n as f64 * spacing / 2.0;
    let mut positions = Vec::with_capacity((n + 1) * (n + 1));
    for j in 0..=n {
        for i in 0..=n {
            positions.push(Point3::new(
                i as f64 * spacing - offset,
                j as f64 * spacing - offset,
                0.0,
            ));
        }
    }

    let mut faces = Vec::with_capacity(2 * n * n);
    for j in 0..n {
        for i in 0..n {
            let v00 = (j * (n + 1) + i) as u32;
            let v10 = v00 + 1;
            let v01 = v00 + (n + 1) as u32;
            let v11 = v01 + 1;
            faces.push([v00, v10, v11]);
            faces.push([v00, v11, v01]);
        }
    }

    MeshGeometry { positions, faces }
}

/// Flat hexagonal fan: a centre vertex (tag 0) surrounded by six vertices at
/// distance `spacing`.
pub fn hexagonal_patch(spacing: f64) -> MeshGeometry {
    let mut positions = vec![Point3::origin()];
    for k in 0..6 {
        let theta = k as f64 * std::f64::consts::FRAC_PI_3;
        positions.push(Point3::new(
            spacing * theta.cos(),
            spacing * theta.sin(),
            0.0,
        ));
    }
    let faces = (0..6u32).map(|k| [0, k + 1, (k + 1) % 6 + 1]).collect();
    MeshGeometry { positions, faces }
}

/// Two right triangles sharing the diagonal of a unit square.
///
/// Tags: 0 = A (0,0,0), 1 = B (1,1,0), 2 = C (1,0,0), 3 = D. The shared bond
/// is A–B. `fold` rotates D about the A–B axis out of the plane; `fold = 0`
/// leaves the square flat.
pub fn tent(fold: f64) -> MeshGeometry {
    let m = Vector3::new(0.5, 0.5, 0.0);
    let across = Vector3::new(1.0, -1.0, 0.0).normalize();
    let h = 0.5_f64.sqrt();
    let d = m + h * (-fold.cos() * across + fold.sin() * Vector3::z());

    MeshGeometry {
        positions: vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::from(d),
        ],
        faces: vec![[0, 2, 1], [0, 1, 3]],
    }
}
