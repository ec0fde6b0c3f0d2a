//! Mesh construction utilities.
//!
//! Derives the bond list (with adjacent triangles) from a plain triangle
//! list, the way mesh files describe surfaces.

use std::collections::HashMap;

use super::index::{Tag, TriangleId, TypeId};
use super::topology::{MeshBond, MeshTopology, MeshTriangle};
use crate::error::{ForceError, Result};

/// Name of the single type used by [`build_from_triangles`].
pub const DEFAULT_TYPE: &str = "mesh";

/// Build a single-type mesh topology from triangles given as vertex tags.
///
/// # Example
/// ```
/// use meshforce::mesh::build_from_triangles;
///
/// let faces = vec![[0, 1, 2], [0, 2, 3]];
/// let topo = build_from_triangles(&faces).unwrap();
/// assert_eq!(topo.num_triangles(), 2);
/// assert_eq!(topo.num_bonds(), 5);
/// assert_eq!(topo.num_boundary_bonds(), 4);
/// ```
pub fn build_from_triangles(faces: &[[u32; 3]]) -> Result<MeshTopology> {
    let types = vec![0u32; faces.len()];
    build_typed(vec![DEFAULT_TYPE.to_string()], faces, &types)
}

/// Build a typed mesh topology.
///
/// `types[i]` is the type of triangle `i`. Each bond takes the type of the
/// first triangle that contains it. Bonds are numbered in order of first
/// appearance while walking the triangles, so the result is deterministic.
pub fn build_typed(
    type_names: Vec<String>,
    faces: &[[u32; 3]],
    types: &[u32],
) -> Result<MeshTopology> {
    if faces.is_empty() {
        return Err(ForceError::EmptyMesh);
    }
    if types.len() != faces.len() {
        return Err(ForceError::InvalidState(format!(
            "{} triangle types given for {} triangles",
            types.len(),
            faces.len()
        )));
    }

    let triangles: Vec<MeshTriangle> = faces
        .iter()
        .zip(types)
        .map(|(f, &t)| MeshTriangle {
            tags: [Tag::from(f[0]), Tag::from(f[1]), Tag::from(f[2])],
            type_id: TypeId::from(t),
        })
        .collect();

    // Map from undirected edge to (bond index, number of incident triangles)
    let mut edge_map: HashMap<(u32, u32), (usize, usize)> = HashMap::new();
    let mut bonds: Vec<MeshBond> = Vec::new();

    for (ti, face) in faces.iter().enumerate() {
        for i in 0..3 {
            let v0 = face[i];
            let v1 = face[(i + 1) % 3];
            if v0 == v1 {
                return Err(ForceError::DegenerateTriangle { triangle: ti });
            }
            let key = if v0 < v1 { (v0, v1) } else { (v1, v0) };
            let tid = TriangleId::new(ti);

            match edge_map.get_mut(&key) {
                Some((bi, count)) => {
                    if *count >= 2 {
                        return Err(ForceError::NonManifoldEdge {
                            v0: key.0,
                            v1: key.1,
                        });
                    }
                    bonds[*bi].triangles[1] = tid;
                    *count += 1;
                }
                None => {
                    edge_map.insert(key, (bonds.len(), 1));
                    bonds.push(MeshBond {
                        tags: [Tag::from(v0), Tag::from(v1)],
                        // Boundary until a second triangle claims the edge
                        triangles: [tid, tid],
                        type_id: TypeId::from(types[ti]),
                    });
                }
            }
        }
    }

    MeshTopology::new(type_names, triangles, bonds)
}
