//! Per-type parameter records.

use serde::{Deserialize, Serialize};

use crate::error::{ForceError, Result};
use crate::mesh::{MeshTopology, TypeId};

/// Stiffness and target area of an area-conservation type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AreaParams {
    /// Stiffness.
    pub k: f64,
    /// Target area.
    pub a0: f64,
}

/// Bending rigidity of a Helfrich type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BendingParams {
    /// Bending rigidity.
    pub k: f64,
}

/// A table of optional per-type records.
///
/// Records start unset; evaluating with an unset record that is needed is an
/// error.
#[derive(Debug, Clone)]
pub(crate) struct ParamTable<P> {
    force: &'static str,
    records: Vec<Option<P>>,
}

impl<P: Copy> ParamTable<P> {
    pub(crate) fn new(force: &'static str, num_records: usize) -> Self {
        Self {
            force,
            records: vec![None; num_records],
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn set(&mut self, record: usize, params: P) -> Result<()> {
        let num_types = self.records.len();
        let slot = self
            .records
            .get_mut(record)
            .ok_or(ForceError::InvalidTypeId {
                type_id: record as u32,
                num_types,
            })?;
        *slot = Some(params);
        Ok(())
    }

    pub(crate) fn get(&self, record: usize) -> Option<P> {
        self.records.get(record).copied().flatten()
    }

    /// A dense copy of every record, or the first missing record as an error.
    pub(crate) fn resolve_all(&self, topology: &MeshTopology) -> Result<Vec<P>> {
        self.records
            .iter()
            .enumerate()
            .map(|(i, p)| {
                p.ok_or_else(|| ForceError::MissingParameters {
                    force: self.force,
                    type_name: topology
                        .type_name(TypeId::new(i))
                        .unwrap_or("<unnamed>")
                        .to_string(),
                })
            })
            .collect()
    }
}

/// Log a warning for stiffness or target values that are not positive.
pub(crate) fn warn_non_positive(force: &str, type_name: &str, name: &str, value: f64) {
    if value <= 0.0 {
        log::warn!("{}: specified {} <= 0 for mesh type {}", force, name, type_name);
    }
}
