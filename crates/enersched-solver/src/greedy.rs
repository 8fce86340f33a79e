//! Constructive greedy heuristics.
//!
//! Produces a single permutation by a configured rule and schedules it with
//! the fixed-order scheduler. The sorting rules are one-shot; the tardiness
//! rule builds the permutation position by position with a look-ahead
//! estimate of the tardiness the choice commits the remaining operations to.

use crate::fixed_order::{DefaultOrderSchedule, OrderSchedule};
use crate::{Feasibility, Solver, SolverError};
use enersched_core::{
    are_close, Instance, SolverConfig, SolverResult, SolverStatus, Stopwatch, TotalTardiness,
    DEFAULT_TOLERANCE,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::BTreeSet;

/// Ordering rule selected via the specialized configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Rule {
    DueDates,
    ReleaseTimes,
    ProcessingTimes,
    PowerConsumptions,
    Tardiness,
    Random,
}

impl Rule {
    fn parse(rule: &str) -> Result<Self, SolverError> {
        match rule {
            GreedyHeuristics::RULE_DUE_DATES => Ok(Rule::DueDates),
            GreedyHeuristics::RULE_RELEASE_TIMES => Ok(Rule::ReleaseTimes),
            GreedyHeuristics::RULE_PROCESSING_TIMES => Ok(Rule::ProcessingTimes),
            GreedyHeuristics::RULE_POWER_CONSUMPTIONS => Ok(Rule::PowerConsumptions),
            GreedyHeuristics::RULE_TARDINESS => Ok(Rule::Tardiness),
            GreedyHeuristics::RULE_RANDOM => Ok(Rule::Random),
            other => Err(SolverError::UnknownGreedyRule(other.to_owned())),
        }
    }
}

pub struct GreedyHeuristics<'a> {
    instance: &'a Instance,
    rng: StdRng,
}

impl<'a> GreedyHeuristics<'a> {
    pub const KEY: &'static str = "GreedyHeuristics";
    pub const KEY_RULE: &'static str = "rule";
    pub const KEY_ASCENDING: &'static str = "ascending";

    pub const RULE_DUE_DATES: &'static str = "due_dates";
    pub const RULE_RELEASE_TIMES: &'static str = "release_times";
    pub const RULE_PROCESSING_TIMES: &'static str = "processing_times";
    pub const RULE_POWER_CONSUMPTIONS: &'static str = "power_consumptions";
    pub const RULE_TARDINESS: &'static str = "tardiness";
    pub const RULE_RANDOM: &'static str = "random";

    pub fn new(instance: &'a Instance) -> Self {
        Self {
            instance,
            rng: StdRng::seed_from_u64(42),
        }
    }

    fn rule_by_key<K: Ord>(&self, ascending: bool, key: impl Fn(usize) -> K) -> Vec<usize> {
        let mut ordered: Vec<usize> = (0..self.instance.num_operations()).collect();
        ordered.sort_by_key(|&index| key(index));
        if !ascending {
            ordered.reverse();
        }
        ordered
    }

    fn rule_power_consumptions(&self, ascending: bool) -> Vec<usize> {
        let mut ordered: Vec<usize> = (0..self.instance.num_operations()).collect();
        ordered.sort_by(|&lhs, &rhs| {
            self.instance
                .operation(lhs)
                .power_consumption
                .total_cmp(&self.instance.operation(rhs).power_consumption)
                .then(lhs.cmp(&rhs))
        });
        if !ascending {
            ordered.reverse();
        }
        ordered
    }

    /// Uniform shuffle of the operation indices.
    pub fn rule_random<R: Rng>(instance: &Instance, rng: &mut R) -> Vec<usize> {
        let mut ordered: Vec<usize> = (0..instance.num_operations()).collect();
        ordered.shuffle(rng);
        ordered
    }

    /// Position-by-position construction minimizing a tardiness look-ahead:
    /// the candidate's own tardiness plus the tardiness every remaining
    /// operation would incur if started right after it (or at its release
    /// time). Ties go to the smaller completion time.
    ///
    /// Returns an empty permutation when no remaining operation can be
    /// feasibly appended at some position.
    fn rule_tardiness(&self, cfg: &SolverConfig, stopwatch: &Stopwatch) -> Vec<usize> {
        let ins = self.instance;
        let n = ins.num_operations();
        let mut remaining: BTreeSet<usize> = (0..n).collect();
        let mut ordered: Vec<usize> = Vec::with_capacity(n);
        let mut alg = DefaultOrderSchedule::new(ins);

        for position in 0..n {
            if stopwatch.time_limit_reached(cfg.time_limit) {
                return Vec::new();
            }

            let mut best_objective = TotalTardiness::worst_value();
            let mut best_candidate = None;
            let mut best_completion = i64::MAX;

            for &candidate in &remaining {
                let operation = ins.operation(candidate);
                ordered.push(candidate);
                let feasibility = alg.append_position(&ordered, position);
                ordered.pop();
                if feasibility == Feasibility::Infeasible {
                    continue;
                }

                let completion = alg.start_times()[candidate] + operation.processing_time;
                let mut objective = 0.max(completion - operation.due_date) as f64;
                for &other in &remaining {
                    if other == candidate {
                        continue;
                    }
                    let op = ins.operation(other);
                    objective += 0.max(
                        completion.max(op.release_time) + op.processing_time - op.due_date,
                    ) as f64;
                }

                if objective < best_objective
                    || (are_close(objective, best_objective, DEFAULT_TOLERANCE)
                        && completion < best_completion)
                {
                    best_objective = objective;
                    best_candidate = Some(candidate);
                    best_completion = completion;
                }
            }

            let Some(best) = best_candidate else {
                return Vec::new();
            };
            remaining.remove(&best);
            ordered.push(best);
            alg.append_position(&ordered, position);
        }

        ordered
    }
}

impl Solver for GreedyHeuristics<'_> {
    fn solve(&mut self, cfg: &SolverConfig) -> Result<SolverResult, SolverError> {
        let stopwatch = Stopwatch::started();
        let ins = self.instance;

        let rule = Rule::parse(cfg.specialized.str_or(Self::KEY, Self::KEY_RULE, Self::RULE_TARDINESS))?;
        let ascending = cfg.specialized.bool_or(Self::KEY, Self::KEY_ASCENDING, true);

        let ordered = match rule {
            Rule::DueDates => self.rule_by_key(ascending, |i| ins.operation(i).due_date),
            Rule::ReleaseTimes => self.rule_by_key(ascending, |i| ins.operation(i).release_time),
            Rule::ProcessingTimes => {
                self.rule_by_key(ascending, |i| ins.operation(i).processing_time)
            }
            Rule::PowerConsumptions => self.rule_power_consumptions(ascending),
            Rule::Random => Self::rule_random(ins, &mut self.rng),
            Rule::Tardiness => self.rule_tardiness(cfg, &stopwatch),
        };

        let mut result =
            SolverResult::no_solution(ins.num_operations(), TotalTardiness::worst_value());
        if !ordered.is_empty() {
            let mut alg = DefaultOrderSchedule::new(ins);
            if alg.create(&ordered) == Feasibility::Feasible {
                let objective = TotalTardiness.compute(ins, alg.start_times());
                result.set_solution(SolverStatus::Feasible, alg.start_times(), objective);
            }
        }

        result.runtime = stopwatch.duration();
        Ok(result)
    }
}
