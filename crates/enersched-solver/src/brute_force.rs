//! Exhaustive search over all orderings.
//!
//! Enumerates permutations in lexicographic order and keeps the best
//! feasible schedule. Exponential; retained as the ground-truth baseline for
//! small instances and for validating the branch-and-bound.

use crate::checker::RobustnessChecker;
use crate::fixed_order::{DefaultOrderSchedule, OrderSchedule};
use crate::{Feasibility, Solver, SolverError};
use enersched_core::{
    Instance, SolverConfig, SolverResult, SolverStatus, Stopwatch, TotalTardiness,
};

/// Advance `ordered` to the lexicographically next permutation; false once
/// the sequence wraps around to sorted order.
fn next_permutation(ordered: &mut [usize]) -> bool {
    if ordered.len() < 2 {
        return false;
    }
    let Some(pivot) = ordered.windows(2).rposition(|pair| pair[0] < pair[1]) else {
        ordered.reverse();
        return false;
    };
    let successor = ordered
        .iter()
        .rposition(|&value| value > ordered[pivot])
        .expect("a successor exists right of the pivot");
    ordered.swap(pivot, successor);
    ordered[pivot + 1..].reverse();
    true
}

pub struct BruteForceSearch<'a> {
    instance: &'a Instance,
}

impl<'a> BruteForceSearch<'a> {
    pub const KEY: &'static str = "BruteForceSearch";

    pub fn new(instance: &'a Instance) -> Self {
        Self { instance }
    }
}

impl Solver for BruteForceSearch<'_> {
    fn solve(&mut self, cfg: &SolverConfig) -> Result<SolverResult, SolverError> {
        let stopwatch = Stopwatch::started();
        let ins = self.instance;
        let n = ins.num_operations();
        let objective = TotalTardiness;

        let mut result = SolverResult::no_solution(n, TotalTardiness::worst_value());
        if cfg.use_init_start_times
            && RobustnessChecker::new(ins).is_robust(&cfg.init_start_times)
        {
            let value = objective.compute(ins, &cfg.init_start_times);
            result.set_solution(SolverStatus::Feasible, &cfg.init_start_times, value);
        }

        let mut ordered: Vec<usize> = (0..n).collect();
        let mut alg = DefaultOrderSchedule::new(ins);
        let mut time_limit_reached = false;
        loop {
            if stopwatch.time_limit_reached(cfg.time_limit) {
                time_limit_reached = true;
                break;
            }

            if alg.create(&ordered) == Feasibility::Feasible {
                let value = objective.compute(ins, alg.start_times());
                if TotalTardiness::is_better(value, result.objective_value) {
                    result.set_solution(SolverStatus::Feasible, alg.start_times(), value);
                }
            }

            if !next_permutation(&mut ordered) {
                break;
            }
        }

        if !time_limit_reached {
            result.status = match result.status {
                SolverStatus::Feasible => SolverStatus::Optimal,
                _ => SolverStatus::Infeasible,
            };
        }

        result.runtime = stopwatch.duration();
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use enersched_core::ObjectiveKind;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;
    use std::time::Duration;

    #[test]
    fn permutations_enumerate_in_lexicographic_order() {
        let mut ordered = vec![0, 1, 2];
        let mut seen = vec![ordered.clone()];
        while next_permutation(&mut ordered) {
            seen.push(ordered.clone());
        }
        assert_eq!(
            seen,
            vec![
                vec![0, 1, 2],
                vec![0, 2, 1],
                vec![1, 0, 2],
                vec![1, 2, 0],
                vec![2, 0, 1],
                vec![2, 1, 0],
            ]
        );
        // Wrapped back to sorted order.
        assert_eq!(ordered, vec![0, 1, 2]);
    }

    #[test]
    fn agrees_with_the_forced_order_case() {
        let ins = Instance::new(
            vec![0, 0, 0],
            vec![4, 5, 6],
            vec![3, 3, 3],
            vec![1.0, 1.0, 1.0],
            0,
            2,
            5,
            vec![10.0, 10.0],
            BTreeMap::new(),
        )
        .unwrap();
        let cfg = SolverConfig::new(Duration::from_secs(60), ObjectiveKind::TotalTardiness);
        let result = BruteForceSearch::new(&ins).solve(&cfg).unwrap();

        assert_eq!(result.status, SolverStatus::Optimal);
        assert_eq!(result.objective_value, 4.0);
    }

    #[test]
    fn single_operation_is_optimal_at_release() {
        let ins = Instance::new(
            vec![0],
            vec![10],
            vec![5],
            vec![1.0],
            0,
            2,
            5,
            vec![10.0, 10.0],
            BTreeMap::new(),
        )
        .unwrap();
        let cfg = SolverConfig::new(Duration::from_secs(60), ObjectiveKind::TotalTardiness);
        let result = BruteForceSearch::new(&ins).solve(&cfg).unwrap();

        assert_eq!(result.status, SolverStatus::Optimal);
        assert_eq!(result.start_times.as_slice(), &[0]);
    }
}
