//! Tabu search over permutations.
//!
//! Random restarts around a greedy shuffle (or the warm start on the first
//! restart), each running a fixed number of iterations. An iteration samples
//! a neighbourhood of swap/insert moves, schedules every candidate with the
//! fixed-order scheduler, and moves to the best feasible candidate that is
//! not tabu; candidates improving on the best-so-far are always eligible.
//! The tabu list is a FIFO of full permutations.

use crate::checker::RobustnessChecker;
use crate::fixed_order::{DefaultOrderSchedule, OrderSchedule};
use crate::greedy::GreedyHeuristics;
use crate::{Feasibility, Solver, SolverError};
use enersched_core::{
    Instance, SolverConfig, SolverResult, SolverStatus, StartTimes, Stopwatch, TotalTardiness,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

struct TabuConfig {
    num_iterations: i64,
    num_restarts: i64,
    neighbourhood_size: i64,
    tabu_list_length: i64,
    max_nonimproving_iterations: i64,
}

impl TabuConfig {
    fn from_config(cfg: &SolverConfig) -> Self {
        let scfg = &cfg.specialized;
        Self {
            num_iterations: scfg.int_or(TabuSearch::KEY, TabuSearch::KEY_NUM_ITERATIONS, 100),
            num_restarts: scfg.int_or(TabuSearch::KEY, TabuSearch::KEY_NUM_RESTARTS, 5),
            neighbourhood_size: scfg.int_or(
                TabuSearch::KEY,
                TabuSearch::KEY_NEIGHBOURHOOD_SIZE,
                200,
            ),
            tabu_list_length: scfg.int_or(TabuSearch::KEY, TabuSearch::KEY_TABU_LIST_LENGTH, 5),
            max_nonimproving_iterations: scfg.int_or(
                TabuSearch::KEY,
                TabuSearch::KEY_MAX_NONIMPROVING_ITERATIONS,
                -1,
            ),
        }
    }
}

#[derive(Clone)]
struct Solution {
    ordered: Vec<usize>,
    start_times: StartTimes,
    feasible: bool,
    objective: f64,
}

impl Solution {
    fn none() -> Self {
        Self {
            ordered: Vec::new(),
            start_times: StartTimes::default(),
            feasible: false,
            objective: TotalTardiness::worst_value(),
        }
    }
}

/// Two distinct integers drawn uniformly from `lower..=upper`.
fn two_distinct<R: Rng>(lower: usize, upper: usize, rng: &mut R) -> (usize, usize) {
    let first = rng.gen_range(lower..=upper);
    let second = if first == lower {
        rng.gen_range(lower + 1..=upper)
    } else if first == upper {
        rng.gen_range(lower..=upper - 1)
    } else if rng.gen_range(0..=1) == 0 {
        rng.gen_range(lower..=first - 1)
    } else {
        rng.gen_range(first + 1..=upper)
    };
    (first, second)
}

pub struct TabuSearch<'a> {
    instance: &'a Instance,
    rng: StdRng,
}

impl<'a> TabuSearch<'a> {
    pub const KEY: &'static str = "TabuSearch";
    pub const KEY_NUM_ITERATIONS: &'static str = "numIterations";
    pub const KEY_NUM_RESTARTS: &'static str = "numRestarts";
    pub const KEY_NEIGHBOURHOOD_SIZE: &'static str = "neighbourhoodSize";
    pub const KEY_TABU_LIST_LENGTH: &'static str = "tabuListLength";
    pub const KEY_MAX_NONIMPROVING_ITERATIONS: &'static str = "maxNonimprovingIterations";

    pub fn new(instance: &'a Instance) -> Self {
        Self {
            instance,
            rng: StdRng::seed_from_u64(42),
        }
    }

    /// Schedule one perturbed permutation.
    fn evaluate(&self, ordered: Vec<usize>) -> Solution {
        let mut alg = DefaultOrderSchedule::new(self.instance);
        let feasibility = alg.create(&ordered);
        let objective = TotalTardiness.compute(self.instance, alg.start_times());
        Solution {
            ordered,
            start_times: alg.start_times().clone(),
            feasible: feasibility == Feasibility::Feasible,
            objective,
        }
    }

    fn random_candidate(&mut self, current: &Solution) -> Solution {
        let n = self.instance.num_operations();
        let insert_move = self.rng.gen_range(0..=1) == 1;
        let (a, b) = two_distinct(0, n - 1, &mut self.rng);

        let mut ordered = current.ordered.clone();
        if insert_move {
            let operation = ordered.remove(a);
            ordered.insert(b, operation);
        } else {
            ordered.swap(a, b);
        }
        self.evaluate(ordered)
    }

    fn is_tabu(&self, ordered: &[usize], tabu_list: &VecDeque<Vec<usize>>) -> bool {
        tabu_list.iter().any(|tabu| tabu == ordered)
    }

    fn neighbourhood_search(
        &mut self,
        cfg: &SolverConfig,
        scfg: &TabuConfig,
        current: &Solution,
        best: &Solution,
        tabu_list: &VecDeque<Vec<usize>>,
        stopwatch: &Stopwatch,
    ) -> Solution {
        let mut neighbourhood_best = Solution::none();

        if self.instance.num_operations() < 2 {
            // No pair of positions to perturb.
            return current.clone();
        }

        for _ in 0..scfg.neighbourhood_size {
            if stopwatch.time_limit_reached(cfg.time_limit) {
                break;
            }

            let candidate = self.random_candidate(current);
            if !candidate.feasible {
                continue;
            }

            let better_than_best = candidate.objective < best.objective;
            let better_than_neighbourhood = candidate.objective < neighbourhood_best.objective;
            if better_than_best && better_than_neighbourhood {
                // Aspiration: an improvement on the global best is eligible
                // even when tabu.
                neighbourhood_best = candidate;
            } else if !self.is_tabu(&candidate.ordered, tabu_list) && better_than_neighbourhood {
                neighbourhood_best = candidate;
            }
        }

        if neighbourhood_best.ordered.is_empty() {
            current.clone()
        } else {
            neighbourhood_best
        }
    }

    fn run_restart(
        &mut self,
        cfg: &SolverConfig,
        scfg: &TabuConfig,
        start: Solution,
        stopwatch: &Stopwatch,
    ) -> Solution {
        let mut tabu_list: VecDeque<Vec<usize>> = VecDeque::new();
        let mut best = start.clone();
        let mut current = start;
        let mut nonimproving_iterations = 0i64;

        for _ in 0..scfg.num_iterations {
            if stopwatch.time_limit_reached(cfg.time_limit) {
                break;
            }

            let candidate =
                self.neighbourhood_search(cfg, scfg, &current, &best, &tabu_list, stopwatch);
            if candidate.feasible && TotalTardiness::is_better(candidate.objective, best.objective)
            {
                best = candidate.clone();
                nonimproving_iterations = 0;
            } else {
                nonimproving_iterations += 1;
            }

            current = candidate;
            tabu_list.push_back(current.ordered.clone());
            while tabu_list.len() as i64 > scfg.tabu_list_length {
                tabu_list.pop_front();
            }

            if scfg.max_nonimproving_iterations > 0
                && nonimproving_iterations > scfg.max_nonimproving_iterations
            {
                break;
            }
        }

        best
    }
}

impl Solver for TabuSearch<'_> {
    fn solve(&mut self, cfg: &SolverConfig) -> Result<SolverResult, SolverError> {
        let stopwatch = Stopwatch::started();
        let ins = self.instance;
        let scfg = TabuConfig::from_config(cfg);

        let mut result =
            SolverResult::no_solution(ins.num_operations(), TotalTardiness::worst_value());
        if cfg.use_init_start_times
            && RobustnessChecker::new(ins).is_robust(&cfg.init_start_times)
        {
            let objective = TotalTardiness.compute(ins, &cfg.init_start_times);
            result.set_solution(SolverStatus::Feasible, &cfg.init_start_times, objective);
        }

        for restart in 0..scfg.num_restarts {
            if stopwatch.time_limit_reached(cfg.time_limit) {
                break;
            }

            let start = if restart == 0 && cfg.use_init_start_times {
                let start_times = cfg.init_start_times.clone();
                let ordered = start_times.ordered_permutation();
                let feasible = RobustnessChecker::new(ins).is_robust(&start_times);
                let objective = TotalTardiness.compute(ins, &start_times);
                Solution {
                    ordered,
                    start_times,
                    feasible,
                    objective: if feasible {
                        objective
                    } else {
                        TotalTardiness::worst_value()
                    },
                }
            } else {
                let ordered = GreedyHeuristics::rule_random(ins, &mut self.rng);
                let mut solution = self.evaluate(ordered);
                if !solution.feasible {
                    solution.objective = TotalTardiness::worst_value();
                }
                solution
            };

            let restart_best = self.run_restart(cfg, &scfg, start, &stopwatch);
            if result.status == SolverStatus::NoSolution
                || (restart_best.feasible
                    && TotalTardiness::is_better(restart_best.objective, result.objective_value))
            {
                let status = if restart_best.feasible {
                    SolverStatus::Feasible
                } else {
                    SolverStatus::NoSolution
                };
                result.set_solution(status, &restart_best.start_times, restart_best.objective);
            }
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

    fn instance() -> Instance {
        Instance::new(
            vec![0, 0, 0, 2],
            vec![4, 5, 6, 12],
            vec![3, 3, 3, 2],
            vec![1.0, 1.0, 1.0, 2.0],
            0,
            4,
            5,
            vec![10.0; 4],
            BTreeMap::new(),
        )
        .unwrap()
    }

    fn config() -> SolverConfig {
        SolverConfig::new(Duration::from_secs(60), ObjectiveKind::TotalTardiness)
    }

    #[test]
    fn finds_a_feasible_schedule() {
        let ins = instance();
        let mut solver = TabuSearch::new(&ins);
        let result = solver.solve(&config()).unwrap();

        assert_eq!(result.status, SolverStatus::Feasible);
        let mut checker = RobustnessChecker::new(&ins);
        assert!(checker.is_robust(&result.start_times));
    }

    #[test]
    fn seeded_search_is_deterministic() {
        let ins = instance();
        let first = TabuSearch::new(&ins).solve(&config()).unwrap();
        let second = TabuSearch::new(&ins).solve(&config()).unwrap();

        assert_eq!(first.status, second.status);
        assert_eq!(first.start_times, second.start_times);
        assert_eq!(first.objective_value, second.objective_value);
    }

    #[test]
    fn warm_start_is_never_worsened() {
        let ins = instance();

        // A feasible schedule built by hand: due-date order.
        let warm = StartTimes::from_vec(vec![0, 3, 6, 9]);
        assert!(RobustnessChecker::new(&ins).is_robust(&warm));
        let warm_objective = TotalTardiness.compute(&ins, &warm);

        let cfg = config().with_warm_start(warm);
        let result = TabuSearch::new(&ins).solve(&cfg).unwrap();

        assert_eq!(result.status, SolverStatus::Feasible);
        assert!(result.objective_value <= warm_objective);
    }

    #[test]
    fn distinct_pair_sampler_never_repeats() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let (a, b) = two_distinct(0, 5, &mut rng);
            assert!(a != b);
            assert!(a <= 5 && b <= 5);
        }
    }
}
