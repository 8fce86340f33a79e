//! Exact branch-and-bound over operation orderings.
//!
//! Depth-first search over prefix permutations. Each node extends the prefix
//! through the incremental fixed-order scheduler; subtrees are pruned when
//! the preemptive tardiness lower bound of the prefix cannot beat the
//! incumbent, or when the extension itself is infeasible. Branching follows
//! ascending due dates. The deadline is polled at every node; when it fires
//! the search unwinds and the incumbent is returned unchanged, without the
//! optimality promotion.

use crate::checker::RobustnessChecker;
use crate::fixed_order::{DefaultOrderSchedule, OrderSchedule};
use crate::{Feasibility, Solver, SolverError};
use enersched_core::{
    Instance, SolverConfig, SolverResult, SolverStatus, Stopwatch, TotalTardiness,
};
use std::collections::BTreeSet;

pub struct BranchAndBoundOnOrder<'a> {
    instance: &'a Instance,
}

struct SearchState<'a> {
    alg: DefaultOrderSchedule<'a>,
    result: SolverResult,
    current_ordered: Vec<usize>,
    remaining: BTreeSet<usize>,
    stopwatch: Stopwatch,
    time_limit_reached: bool,
}

impl<'a> BranchAndBoundOnOrder<'a> {
    pub const KEY: &'static str = "BranchAndBoundOnOrder";

    pub fn new(instance: &'a Instance) -> Self {
        Self { instance }
    }

    fn dfs(&self, cfg: &SolverConfig, state: &mut SearchState<'_>) {
        if state.time_limit_reached {
            return;
        }
        if state.stopwatch.time_limit_reached(cfg.time_limit) {
            state.time_limit_reached = true;
            return;
        }

        let ins = self.instance;
        let objective = TotalTardiness;

        if state.remaining.is_empty() {
            let value = objective.compute(ins, state.alg.start_times());
            if TotalTardiness::is_better(value, state.result.objective_value) {
                state
                    .result
                    .set_solution(SolverStatus::Feasible, state.alg.start_times(), value);
            }
            return;
        }

        let lower_bound = objective.chu_lower_bound(
            ins,
            &state.current_ordered,
            state.alg.start_times(),
            &state.remaining,
        );
        if !TotalTardiness::is_better(lower_bound, state.result.objective_value) {
            return;
        }

        let mut branch_order: Vec<usize> = state.remaining.iter().copied().collect();
        branch_order.sort_by_key(|&index| (ins.operation(index).due_date, index));

        let position = ins.num_operations() - state.remaining.len();
        for candidate in branch_order {
            state.current_ordered[position] = candidate;
            state.remaining.remove(&candidate);

            if state.alg.append_position(&state.current_ordered, position) == Feasibility::Feasible
            {
                self.dfs(cfg, state);
            }

            state.remaining.insert(candidate);

            if state.time_limit_reached {
                return;
            }
        }
    }
}

impl Solver for BranchAndBoundOnOrder<'_> {
    fn solve(&mut self, cfg: &SolverConfig) -> Result<SolverResult, SolverError> {
        let ins = self.instance;
        let n = ins.num_operations();

        let mut state = SearchState {
            alg: DefaultOrderSchedule::new(ins),
            result: SolverResult::no_solution(n, TotalTardiness::worst_value()),
            current_ordered: vec![0; n],
            remaining: (0..n).collect(),
            stopwatch: Stopwatch::started(),
            time_limit_reached: false,
        };

        if cfg.use_init_start_times
            && RobustnessChecker::new(ins).is_robust(&cfg.init_start_times)
        {
            let objective = TotalTardiness.compute(ins, &cfg.init_start_times);
            state
                .result
                .set_solution(SolverStatus::Feasible, &cfg.init_start_times, objective);
        }

        self.dfs(cfg, &mut state);

        if !state.time_limit_reached {
            state.result.status = match state.result.status {
                SolverStatus::Feasible => SolverStatus::Optimal,
                _ => SolverStatus::Infeasible,
            };
        }

        state.stopwatch.stop();
        state.result.runtime = state.stopwatch.duration();
        Ok(state.result)
    }
}
