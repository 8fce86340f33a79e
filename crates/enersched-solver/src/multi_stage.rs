//! Multi-stage driving of chained solvers.
//!
//! Runs an ordered list of solver stages under one global wall-clock budget.
//! Each stage receives the remaining budget and, when the current best is
//! feasible, its start times as a warm start. Feasible improvements replace
//! the current best; OPTIMAL and INFEASIBLE are terminal; NO_SOLUTION leaves
//! the current best untouched and lets later stages try.

use crate::checker::RobustnessChecker;
use crate::{Solver, SolverError};
use enersched_core::{
    Instance, SolverConfig, SolverResult, SolverStatus, Stopwatch, TotalTardiness,
};
use std::time::Duration;
use tracing::info;

pub struct MultiStageSolver<'a> {
    instance: &'a Instance,
    stages: Vec<Box<dyn Solver + 'a>>,
    stage_results: Vec<SolverResult>,
}

impl<'a> MultiStageSolver<'a> {
    pub fn new(instance: &'a Instance) -> Self {
        Self {
            instance,
            stages: Vec::new(),
            stage_results: Vec::new(),
        }
    }

    pub fn add_stage(&mut self, solver: Box<dyn Solver + 'a>) {
        self.stages.push(solver);
    }

    /// Result of each stage from the last `solve`, in stage order.
    pub fn stage_results(&self) -> &[SolverResult] {
        &self.stage_results
    }

    fn merge_optional(source: &SolverResult, target: &mut SolverResult) {
        for (key, value) in &source.optional {
            target.optional.insert(key.clone(), value.clone());
        }
    }
}

impl Solver for MultiStageSolver<'_> {
    fn solve(&mut self, cfg: &SolverConfig) -> Result<SolverResult, SolverError> {
        let stopwatch = Stopwatch::started();
        let ins = self.instance;
        self.stage_results.clear();

        let mut current =
            SolverResult::no_solution(ins.num_operations(), TotalTardiness::worst_value());
        if cfg.use_init_start_times
            && RobustnessChecker::new(ins).is_robust(&cfg.init_start_times)
        {
            let objective = TotalTardiness.compute(ins, &cfg.init_start_times);
            current.set_solution(SolverStatus::Feasible, &cfg.init_start_times, objective);
        }

        let mut remaining_ms = i64::try_from(cfg.time_limit.as_millis()).unwrap_or(i64::MAX);

        for (stage_index, stage) in self.stages.iter_mut().enumerate() {
            let mut stage_cfg = SolverConfig::new(
                Duration::from_millis(remaining_ms.max(0) as u64),
                cfg.objective,
            )
            .with_specialized(cfg.specialized.clone());
            if current.status == SolverStatus::Feasible {
                stage_cfg = stage_cfg.with_warm_start(current.start_times.clone());
            }

            let stage_stopwatch = Stopwatch::started();
            let result = stage.solve(&stage_cfg)?;
            remaining_ms -= i64::try_from(stage_stopwatch.duration().as_millis()).unwrap_or(i64::MAX);

            Self::merge_optional(&result, &mut current);

            let mut stop = false;
            match result.status {
                SolverStatus::Feasible => {
                    info!(stage = stage_index, objective = result.objective_value, "feasible solution");
                    current.set_solution(
                        SolverStatus::Feasible,
                        &result.start_times,
                        result.objective_value,
                    );
                }
                SolverStatus::Optimal => {
                    info!(stage = stage_index, objective = result.objective_value, "optimal solution");
                    current.set_solution(
                        SolverStatus::Optimal,
                        &result.start_times,
                        result.objective_value,
                    );
                    stop = true;
                }
                SolverStatus::Infeasible => {
                    info!(stage = stage_index, "infeasible model");
                    current.status = SolverStatus::Infeasible;
                    stop = true;
                }
                SolverStatus::NoSolution => {
                    info!(stage = stage_index, "no solution");
                }
            }

            self.stage_results.push(result);

            if remaining_ms < 0 {
                info!("global time budget spent");
                stop = true;
            }
            if stop {
                break;
            }
        }

        current.runtime = stopwatch.duration();
        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BranchAndBoundOnOrder, GreedyHeuristics, TabuSearch};
    use enersched_core::ObjectiveKind;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;
    use std::time::Duration;

    fn instance() -> Instance {
        Instance::new(
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
        .unwrap()
    }

    #[test]
    fn stages_chain_to_optimality() {
        let ins = instance();
        let mut driver = MultiStageSolver::new(&ins);
        driver.add_stage(Box::new(GreedyHeuristics::new(&ins)));
        driver.add_stage(Box::new(TabuSearch::new(&ins)));
        driver.add_stage(Box::new(BranchAndBoundOnOrder::new(&ins)));

        let cfg = SolverConfig::new(Duration::from_secs(60), ObjectiveKind::TotalTardiness);
        let result = driver.solve(&cfg).unwrap();

        assert_eq!(result.status, SolverStatus::Optimal);
        assert_eq!(result.objective_value, 4.0);
        assert_eq!(driver.stage_results().len(), 3);
    }

    #[test]
    fn infeasible_stage_is_terminal() {
        let ins = Instance::new(
            vec![0, 0],
            vec![10, 10],
            vec![3, 3],
            vec![4.0, 4.0],
            0,
            1,
            6,
            vec![18.0],
            BTreeMap::new(),
        )
        .unwrap();
        let mut driver = MultiStageSolver::new(&ins);
        driver.add_stage(Box::new(BranchAndBoundOnOrder::new(&ins)));
        driver.add_stage(Box::new(TabuSearch::new(&ins)));

        let cfg = SolverConfig::new(Duration::from_secs(60), ObjectiveKind::TotalTardiness);
        let result = driver.solve(&cfg).unwrap();

        assert_eq!(result.status, SolverStatus::Infeasible);
        // The tabu stage never ran.
        assert_eq!(driver.stage_results().len(), 1);
    }

    #[test]
    fn objective_never_worsens_across_stages() {
        let ins = instance();
        let mut driver = MultiStageSolver::new(&ins);
        driver.add_stage(Box::new(GreedyHeuristics::new(&ins)));
        driver.add_stage(Box::new(TabuSearch::new(&ins)));
        driver.add_stage(Box::new(BranchAndBoundOnOrder::new(&ins)));

        let cfg = SolverConfig::new(Duration::from_secs(60), ObjectiveKind::TotalTardiness);
        let final_result = driver.solve(&cfg).unwrap();

        let mut best_so_far = f64::MAX;
        for stage_result in driver.stage_results() {
            if stage_result.status.has_solution() {
                assert!(stage_result.objective_value <= best_so_far + 1e-9);
                best_so_far = best_so_far.min(stage_result.objective_value);
            }
        }
        assert!(final_result.objective_value <= best_so_far);
    }
}
