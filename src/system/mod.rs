//! The simulation system the force modules read from.
//!
//! - [`ParticleData`] holds positions, types and the tag ↔ index maps
//! - [`Communicator`] sums per-type scalars across ranks

mod comm;
mod particles;

pub use comm::{Communicator, SingleRank, ThreadGroup};
pub use particles::ParticleData;
