//! Cross-rank aggregation.
//!
//! The global area-conservation force needs one scalar per mesh type summed
//! over every rank before any force can be evaluated. [`Communicator`] is the
//! seam for that collective; [`SingleRank`] is the trivial implementation and
//! [`ThreadGroup`] runs a real blocking all-reduce between threads of one
//! process, which is how decomposed evaluation is exercised without MPI.

use std::sync::{Arc, Condvar, Mutex, MutexGuard};

use crate::error::{ForceError, Result};

/// A group of ranks that can perform collective sums.
pub trait Communicator: Send + Sync {
    /// Index of this rank within the group.
    fn rank(&self) -> usize;

    /// Number of ranks in the group.
    fn num_ranks(&self) -> usize;

    /// Sum `values` element-wise across all ranks, in place.
    ///
    /// Blocking and collective: every rank must call it with a slice of the
    /// same length, and every rank receives the identical result.
    fn reduce_sum(&self, values: &mut [f64]) -> Result<()>;

    /// Whether the system is split across more than one rank.
    fn is_decomposed(&self) -> bool {
        self.num_ranks() > 1
    }
}

/// The trivial single-process communicator.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleRank;

impl Communicator for SingleRank {
    fn rank(&self) -> usize {
        0
    }

    fn num_ranks(&self) -> usize {
        1
    }

    fn reduce_sum(&self, _values: &mut [f64]) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Round {
    arrived: usize,
    generation: u64,
    sum: Vec<f64>,
    mismatch: bool,
    result: Vec<f64>,
    result_mismatch: bool,
    departed: bool,
}

#[derive(Debug)]
struct GroupState {
    size: usize,
    round: Mutex<Round>,
    turn: Condvar,
}

impl GroupState {
    fn lock(&self) -> MutexGuard<'_, Round> {
        self.round.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// One member of an in-process group of ranks.
///
/// Each member is intended to be driven from its own thread; `reduce_sum`
/// blocks until every member of the group has called it. Dropping a member
/// marks the group as broken, and any rank waiting in or entering a
/// reduction then fails instead of blocking forever.
#[derive(Debug)]
pub struct ThreadGroup {
    rank: usize,
    state: Arc<GroupState>,
}

impl ThreadGroup {
    /// Create the `size` members of a new group.
    pub fn create(size: usize) -> Vec<ThreadGroup> {
        let state = Arc::new(GroupState {
            size,
            round: Mutex::new(Round::default()),
            turn: Condvar::new(),
        });
        (0..size)
            .map(|rank| ThreadGroup {
                rank,
                state: Arc::clone(&state),
            })
            .collect()
    }

    fn departed(&self) -> ForceError {
        ForceError::Reduction(format!(
            "rank {}: another rank left the group before the reduction completed",
            self.rank
        ))
    }
}

impl Communicator for ThreadGroup {
    fn rank(&self) -> usize {
        self.rank
    }

    fn num_ranks(&self) -> usize {
        self.state.size
    }

    fn reduce_sum(&self, values: &mut [f64]) -> Result<()> {
        let state = &self.state;
        let mut round = state.lock();
        if round.departed {
            return Err(self.departed());
        }

        if round.arrived == 0 {
            round.sum = vec![0.0; values.len()];
            round.mismatch = false;
        }
        if round.sum.len() == values.len() {
            for (s, v) in round.sum.iter_mut().zip(values.iter()) {
                *s += v;
            }
        } else {
            round.mismatch = true;
        }
        round.arrived += 1;

        let generation = round.generation;
        if round.arrived == state.size {
            round.result = std::mem::take(&mut round.sum);
            round.result_mismatch = round.mismatch;
            round.arrived = 0;
            round.generation += 1;
            state.turn.notify_all();
        } else {
            while round.generation == generation && !round.departed {
                round = state.turn.wait(round).unwrap_or_else(|e| e.into_inner());
            }
            if round.generation == generation {
                return Err(self.departed());
            }
        }

        // The result of this generation stays put until this rank arrives at
        // the next reduction.
        if round.result_mismatch {
            return Err(ForceError::Reduction(format!(
                "rank {} reduced {} values, which does not match the group",
                self.rank,
                values.len()
            )));
        }
        values.copy_from_slice(&round.result);
        Ok(())
    }
}

impl Drop for ThreadGroup {
    fn drop(&mut self) {
        let mut round = self.state.lock();
        round.departed = true;
        self.state.turn.notify_all();
    }
}
