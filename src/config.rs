//! Parameter files.
//!
//! A TOML file maps mesh type names to per-type parameters for each force:
//!
//! ```toml
//! [area_local.mesh]
//! k = 1.0
//! a0 = 0.05
//!
//! [area_global]
//! ignore_type = false
//!
//! [area_global.types.mesh]
//! k = 10.0
//! a0 = 12.5
//!
//! [helfrich.mesh]
//! k = 20.0
//! ```
//!
//! Every section is optional. Type names must exist in the mesh the
//! parameters are applied to.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ForceError, Result};
use crate::force::{
    AreaConservation, AreaParams, BendingParams, HelfrichBending, TriangleAreaConservation,
};

/// Global area-conservation section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalAreaSection {
    /// Treat all triangles as one type.
    #[serde(default)]
    pub ignore_type: bool,
    /// Per-type parameters.
    #[serde(default)]
    pub types: BTreeMap<String, AreaParams>,
}

/// Parsed parameter file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterFile {
    /// Per-triangle area conservation, by type name.
    #[serde(default)]
    pub area_local: BTreeMap<String, AreaParams>,
    /// Global area conservation.
    #[serde(default)]
    pub area_global: Option<GlobalAreaSection>,
    /// Helfrich bending, by bond type name.
    #[serde(default)]
    pub helfrich: BTreeMap<String, BendingParams>,
}

impl ParameterFile {
    /// Read and parse a parameter file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        Self::parse(&content, path)
    }

    /// Parse parameters from TOML text. `origin` names the source in errors.
    pub fn parse(content: &str, origin: impl Into<PathBuf>) -> Result<Self> {
        let params: ParameterFile = toml::from_str(content).map_err(|e| ForceError::Config {
            path: origin.into(),
            message: e.to_string(),
        })?;
        log::debug!(
            "parameters: {} local, {} global, {} bending entries",
            params.area_local.len(),
            params.area_global.as_ref().map_or(0, |g| g.types.len()),
            params.helfrich.len()
        );
        Ok(params)
    }

    /// Serialise back to TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| ForceError::InvalidState(e.to_string()))
    }

    /// Set the per-triangle area parameters on a force.
    pub fn apply_area_local(&self, force: &mut TriangleAreaConservation) -> Result<()> {
        for (name, p) in &self.area_local {
            let type_id = force.topology().type_id(name)?;
            force.set_params(type_id, p.k, p.a0)?;
        }
        Ok(())
    }

    /// Set the global area parameters on a force.
    pub fn apply_area_global(&self, force: &mut AreaConservation) -> Result<()> {
        let Some(section) = &self.area_global else {
            return Ok(());
        };
        if section.ignore_type != force.ignore_type() {
            log::warn!(
                "{}: parameter file has ignore_type = {}, force was built with {}",
                AreaConservation::NAME,
                section.ignore_type,
                force.ignore_type()
            );
        }
        for (name, p) in &section.types {
            let type_id = force.topology().type_id(name)?;
            force.set_params(type_id, p.k, p.a0)?;
        }
        Ok(())
    }

    /// Set the bending rigidities on a force.
    pub fn apply_helfrich(&self, force: &mut HelfrichBending) -> Result<()> {
        for (name, p) in &self.helfrich {
            let type_id = force.topology().type_id(name)?;
            force.set_params(type_id, p.k)?;
        }
        Ok(())
    }

    /// Whether the file configures the global area force with types ignored.
    pub fn ignore_type(&self) -> bool {
        self.area_global.as_ref().is_some_and(|g| g.ignore_type)
    }
}
