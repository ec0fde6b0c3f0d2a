//! Particle store: positions, types and the tag ↔ index maps.

use nalgebra::{Point3, Vector3};

use crate::error::{ForceError, Result};
use crate::geometry::BoxDim;
use crate::mesh::Tag;

/// Reverse-tag sentinel for particles that are not present locally.
const NOT_LOCAL: u32 = u32::MAX;

/// Particle arrays as seen by one rank.
///
/// Particles are addressed by a volatile array index. Owned particles occupy
/// indices `0..n_local`; ghost copies (read for geometry, never written)
/// follow. A particle's stable identity is its [`Tag`]; the reverse-tag array
/// maps every tag to its current index, or to nothing when the particle is
/// absent from this rank.
#[derive(Debug, Clone)]
pub struct ParticleData {
    box_dim: BoxDim,
    positions: Vec<Point3<f64>>,
    types: Vec<u32>,
    tags: Vec<Tag>,
    rtags: Vec<u32>,
    n_local: usize,
}

impl ParticleData {
    /// Create a store where every particle is owned, tags equal indices and
    /// all types are 0.
    pub fn new(box_dim: BoxDim, positions: Vec<Point3<f64>>) -> Self {
        let n = positions.len();
        Self {
            box_dim,
            types: vec![0; n],
            tags: (0..n).map(Tag::new).collect(),
            rtags: (0..n as u32).collect(),
            positions,
            n_local: n,
        }
    }

    /// Create a store from explicit arrays.
    ///
    /// `num_tags` is the size of the global tag space; every tag must be
    /// below it and appear at most once.
    pub fn from_parts(
        box_dim: BoxDim,
        positions: Vec<Point3<f64>>,
        types: Vec<u32>,
        tags: Vec<Tag>,
        n_local: usize,
        num_tags: usize,
    ) -> Result<Self> {
        let n = positions.len();
        if types.len() != n || tags.len() != n {
            return Err(ForceError::invalid_particles(format!(
                "{} positions, {} types and {} tags",
                n,
                types.len(),
                tags.len()
            )));
        }
        if n_local > n {
            return Err(ForceError::invalid_particles(format!(
                "{} owned particles out of {}",
                n_local, n
            )));
        }

        let mut rtags = vec![NOT_LOCAL; num_tags];
        for (idx, tag) in tags.iter().enumerate() {
            let slot = rtags.get_mut(tag.index()).ok_or_else(|| {
                ForceError::invalid_particles(format!(
                    "tag {} outside tag space of size {}",
                    tag, num_tags
                ))
            })?;
            if *slot != NOT_LOCAL {
                return Err(ForceError::invalid_particles(format!("duplicate tag {}", tag)));
            }
            *slot = idx as u32;
        }

        Ok(Self {
            box_dim,
            positions,
            types,
            tags,
            rtags,
            n_local,
        })
    }

    /// Set per-particle types.
    pub fn with_types(mut self, types: Vec<u32>) -> Result<Self> {
        if types.len() != self.positions.len() {
            return Err(ForceError::invalid_particles(format!(
                "{} types for {} particles",
                types.len(),
                self.positions.len()
            )));
        }
        self.types = types;
        Ok(self)
    }

    /// The periodic box.
    #[inline]
    pub fn box_dim(&self) -> &BoxDim {
        &self.box_dim
    }

    /// Number of locally owned particles.
    #[inline]
    pub fn n_local(&self) -> usize {
        self.n_local
    }

    /// Number of ghost particles.
    #[inline]
    pub fn n_ghosts(&self) -> usize {
        self.positions.len() - self.n_local
    }

    /// Number of owned plus ghost particles.
    #[inline]
    pub fn n_total(&self) -> usize {
        self.positions.len()
    }

    /// Whether the particle at `idx` is owned by this rank.
    #[inline]
    pub fn is_owned(&self, idx: usize) -> bool {
        idx < self.n_local
    }

    /// Size of the global tag space.
    #[inline]
    pub fn num_tags(&self) -> usize {
        self.rtags.len()
    }

    /// Position by index.
    #[inline]
    pub fn position(&self, idx: usize) -> &Point3<f64> {
        &self.positions[idx]
    }

    /// All positions, by index.
    pub fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    /// Set a position by index.
    pub fn set_position(&mut self, idx: usize, p: Point3<f64>) {
        self.positions[idx] = p;
    }

    /// Type by index.
    #[inline]
    pub fn particle_type(&self, idx: usize) -> u32 {
        self.types[idx]
    }

    /// Tag by index.
    #[inline]
    pub fn tag(&self, idx: usize) -> Tag {
        self.tags[idx]
    }

    /// Current index of a tag, if the particle is present.
    #[inline]
    pub fn index_of(&self, tag: Tag) -> Option<usize> {
        match self.rtags.get(tag.index()) {
            Some(&idx) if idx != NOT_LOCAL => Some(idx as usize),
            _ => None,
        }
    }

    /// Resolve a tag referenced by a mesh element.
    pub fn resolve(&self, tag: Tag, element: &'static str, index: usize) -> Result<usize> {
        if tag.index() >= self.rtags.len() {
            return Err(ForceError::TagOutOfRange {
                element,
                index,
                tag: tag.raw(),
                max_tag: self.rtags.len().saturating_sub(1) as u32,
            });
        }
        self.index_of(tag)
            .ok_or(ForceError::MissingParticle {
                element,
                index,
                tag: tag.raw(),
            })
    }

    /// Displace every particle by `delta` and rotate about the origin.
    pub fn transform(&mut self, rotation: &nalgebra::Rotation3<f64>, delta: Vector3<f64>) {
        for p in &mut self.positions {
            *p = rotation * *p + delta;
        }
    }

    /// Reorder the local arrays: the particle at old index `perm[i]` moves to
    /// index `i`.
    ///
    /// Owned particles must stay in the owned range.
    pub fn reorder(&mut self, perm: &[usize]) -> Result<()> {
        let n = self.positions.len();
        if perm.len() != n {
            return Err(ForceError::invalid_particles(format!(
                "permutation of length {} for {} particles",
                perm.len(),
                n
            )));
        }
        let mut seen = vec![false; n];
        for (i, &old) in perm.iter().enumerate() {
            if old >= n || seen[old] {
                return Err(ForceError::invalid_particles("not a permutation"));
            }
            if self.is_owned(i) != self.is_owned(old) {
                return Err(ForceError::invalid_particles(
                    "permutation moves particles across the ownership boundary",
                ));
            }
            seen[old] = true;
        }

        self.positions = perm.iter().map(|&i| self.positions[i]).collect();
        self.types = perm.iter().map(|&i| self.types[i]).collect();
        self.tags = perm.iter().map(|&i| self.tags[i]).collect();
        for (idx, tag) in self.tags.iter().enumerate() {
            self.rtags[tag.index()] = idx as u32;
        }
        Ok(())
    }

    /// Split the system into per-rank views.
    ///
    /// Rank `r` owns the `r`-th contiguous block of tags; every other particle
    /// is present on that rank as a ghost. The union of the owned sets covers
    /// each particle exactly once.
    pub fn split(&self, num_ranks: usize) -> Result<Vec<ParticleData>> {
        if num_ranks == 0 {
            return Err(ForceError::invalid_particles("cannot split into zero ranks"));
        }
        let num_tags = self.rtags.len();
        let block = num_tags.div_ceil(num_ranks);

        (0..num_ranks)
            .map(|rank| {
                let lo = rank * block;
                let hi = ((rank + 1) * block).min(num_tags);
                let owned = |tag: Tag| tag.index() >= lo && tag.index() < hi;

                let mut order: Vec<usize> = (0..self.n_total())
                    .filter(|&i| owned(self.tags[i]))
                    .collect();
                let n_local = order.len();
                order.extend((0..self.n_total()).filter(|&i| !owned(self.tags[i])));

                ParticleData::from_parts(
                    self.box_dim,
                    order.iter().map(|&i| self.positions[i]).collect(),
                    order.iter().map(|&i| self.types[i]).collect(),
                    order.iter().map(|&i| self.tags[i]).collect(),
                    n_local,
                    num_tags,
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(n: usize) -> ParticleData {
        let positions = (0..n).map(|i| Point3::new(i as f64, 0.0, 0.0)).collect();
        ParticleData::new(BoxDim::cube(100.0), positions)
    }

    #[test]
    fn test_new_identity_tags() {
        let pd = line(4);
        assert_eq!(pd.n_local(), 4);
        assert_eq!(pd.n_ghosts(), 0);
        for i in 0..4 {
            assert_eq!(pd.index_of(Tag::new(i)), Some(i));
        }
    }

    #[test]
    fn test_reorder_updates_rtags() {
        let mut pd = line(4);
        pd.reorder(&[3, 1, 0, 2]).unwrap();
        assert_eq!(pd.tag(0), Tag::new(3));
        assert_eq!(pd.index_of(Tag::new(3)), Some(0));
        assert_eq!(pd.index_of(Tag::new(0)), Some(2));
        assert_eq!(pd.position(0).x, 3.0);
    }

    #[test]
    fn test_types_follow_particles() {
        let mut pd = line(4).with_types(vec![0, 1, 2, 3]).unwrap();
        assert!(line(4).with_types(vec![0]).is_err());

        pd.reorder(&[2, 0, 3, 1]).unwrap();
        for i in 0..4 {
            assert_eq!(pd.particle_type(i) as usize, pd.tag(i).index());
        }
        for r in pd.split(2).unwrap() {
            for i in 0..r.n_total() {
                assert_eq!(r.particle_type(i) as usize, r.tag(i).index());
                assert_eq!(r.is_owned(i), i < r.n_local());
            }
        }
    }

    #[test]
    fn test_reorder_rejects_bad_permutation() {
        let mut pd = line(3);
        assert!(pd.reorder(&[0, 0, 1]).is_err());
        assert!(pd.reorder(&[0, 1]).is_err());
    }

    #[test]
    fn test_resolve_errors() {
        let pd = ParticleData::from_parts(
            BoxDim::cube(10.0),
            vec![Point3::origin(); 2],
            vec![0; 2],
            vec![Tag::new(0), Tag::new(2)],
            2,
            4,
        )
        .unwrap();
        assert_eq!(pd.resolve(Tag::new(2), "triangle", 0).unwrap(), 1);
        assert!(matches!(
            pd.resolve(Tag::new(1), "triangle", 5),
            Err(ForceError::MissingParticle { index: 5, tag: 1, .. })
        ));
        assert!(matches!(
            pd.resolve(Tag::new(9), "bond", 0),
            Err(ForceError::TagOutOfRange { tag: 9, max_tag: 3, .. })
        ));
    }

    #[test]
    fn test_from_parts_rejects_duplicate_tags() {
        let err = ParticleData::from_parts(
            BoxDim::cube(10.0),
            vec![Point3::origin(); 2],
            vec![0; 2],
            vec![Tag::new(1), Tag::new(1)],
            2,
            2,
        )
        .unwrap_err();
        assert!(matches!(err, ForceError::InvalidParticleData(_)));
    }

    #[test]
    fn test_split_partitions_ownership() {
        let pd = line(10);
        let ranks = pd.split(3).unwrap();
        assert_eq!(ranks.len(), 3);
        let owned: usize = ranks.iter().map(|r| r.n_local()).sum();
        assert_eq!(owned, 10);
        for r in &ranks {
            assert_eq!(r.n_total(), 10);
            for i in 0..r.n_total() {
                let tag = r.tag(i);
                assert_eq!(r.position(i).x, tag.index() as f64);
            }
        }
        assert_eq!(ranks[0].tag(0), Tag::new(0));
        assert_eq!(ranks[1].tag(0), Tag::new(4));
    }
}
