//! # enersched-solver
//!
//! Solvers for robust energy-constrained single-machine scheduling.
//!
//! The innermost primitive is the *robust fixed-order scheduler*
//! ([`OrderSchedule`]): given a permutation of all operations it produces the
//! pointwise-earliest start times that stay energy-feasible under every
//! right-shift deviation scenario, or declares the order infeasible. Every
//! search layer ([`GreedyHeuristics`], [`TabuSearch`],
//! [`BranchAndBoundOnOrder`], [`BruteForceSearch`]) explores permutations
//! through it, and the [`RobustnessChecker`] independently validates any
//! schedule as ground truth. [`MultiStageSolver`] chains stages with
//! warm-starting under a global wall-clock budget.

use enersched_core::{Instance, SolverConfig, SolverResult};
use thiserror::Error;

mod branch_and_bound;
mod brute_force;
mod checker;
mod envelope;
mod fixed_order;
mod greedy;
mod multi_stage;
mod tabu;

pub use branch_and_bound::BranchAndBoundOnOrder;
pub use brute_force::BruteForceSearch;
pub use checker::{RobustnessChecker, RobustnessVerdict};
pub use fixed_order::{
    BaselineOrderSchedule, DefaultOrderSchedule, OptimisedOrderSchedule, OrderSchedule,
    OrderScheduleVariant,
};
pub use greedy::GreedyHeuristics;
pub use multi_stage::MultiStageSolver;
pub use tabu::TabuSearch;

/// Verdict of the fixed-order scheduler for one permutation (or prefix).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Feasibility {
    Feasible,
    Infeasible,
}

/// Configuration-level failures. Algorithmic outcomes (infeasibility,
/// deadline) are statuses on [`SolverResult`], never errors.
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("unknown solver `{0}`")]
    UnknownSolver(String),

    #[error("unknown greedy rule `{0}`")]
    UnknownGreedyRule(String),
}

/// Uniform solver contract: consume a configuration, produce a result.
///
/// Implementors own their scratch buffers and PRNG; independent instances may
/// run on separate threads.
pub trait Solver {
    fn solve(&mut self, cfg: &SolverConfig) -> Result<SolverResult, SolverError>;
}

/// Instantiate a solver stage by its configuration key.
pub fn create_solver<'a>(
    name: &str,
    instance: &'a Instance,
) -> Result<Box<dyn Solver + 'a>, SolverError> {
    match name {
        GreedyHeuristics::KEY => Ok(Box::new(GreedyHeuristics::new(instance))),
        TabuSearch::KEY => Ok(Box::new(TabuSearch::new(instance))),
        BranchAndBoundOnOrder::KEY => Ok(Box::new(BranchAndBoundOnOrder::new(instance))),
        BruteForceSearch::KEY => Ok(Box::new(BruteForceSearch::new(instance))),
        _ => Err(SolverError::UnknownSolver(name.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn factory_knows_every_stage_name() {
        let ins = Instance::new(
            vec![0],
            vec![5],
            vec![2],
            vec![1.0],
            0,
            2,
            5,
            vec![10.0, 10.0],
            BTreeMap::new(),
        )
        .unwrap();

        for name in [
            "GreedyHeuristics",
            "TabuSearch",
            "BranchAndBoundOnOrder",
            "BruteForceSearch",
        ] {
            assert!(create_solver(name, &ins).is_ok(), "missing stage {name}");
        }

        assert!(matches!(
            create_solver("LazyConstraints", &ins),
            Err(SolverError::UnknownSolver(_))
        ));
    }
}
