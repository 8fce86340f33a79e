//! Differential and property tests for the fixed-order scheduler.
//!
//! The baseline variant is the oracle: on every permutation of every
//! generated instance both variants must agree on feasibility and, when
//! feasible, on the start times. Feasible outputs are additionally validated
//! against the robustness checker, the release/maximum-start bounds, and
//! pointwise minimality (any unilateral left-shift that keeps the ordering
//! constraints must be rejected by the checker).

use enersched_core::Instance;
use enersched_solver::{
    BaselineOrderSchedule, Feasibility, OptimisedOrderSchedule, OrderSchedule, RobustnessChecker,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

fn random_instance(rng: &mut StdRng) -> Instance {
    let n = rng.gen_range(2..=4);
    let interval_length = rng.gen_range(3..=6);
    let num_intervals = rng.gen_range(4..=8);
    let max_deviation = rng.gen_range(0..=2);

    let mut release_times = Vec::new();
    let mut due_dates = Vec::new();
    let mut processing_times = Vec::new();
    let mut power_consumptions = Vec::new();
    for _ in 0..n {
        let release = rng.gen_range(0..=interval_length * 2);
        let processing = rng.gen_range(1..=interval_length);
        release_times.push(release);
        due_dates.push(release + processing + rng.gen_range(0..=interval_length * 2));
        processing_times.push(processing);
        power_consumptions.push(rng.gen_range(1..=6) as f64);
    }

    let caps: Vec<f64> = (0..num_intervals)
        .map(|_| rng.gen_range(8..=30) as f64)
        .collect();

    Instance::new(
        release_times,
        due_dates,
        processing_times,
        power_consumptions,
        max_deviation,
        num_intervals as usize,
        interval_length,
        caps,
        BTreeMap::new(),
    )
    .unwrap()
}

fn permutations(n: usize) -> Vec<Vec<usize>> {
    fn recurse(prefix: &mut Vec<usize>, remaining: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
        if remaining.is_empty() {
            out.push(prefix.clone());
            return;
        }
        for i in 0..remaining.len() {
            let value = remaining.remove(i);
            prefix.push(value);
            recurse(prefix, remaining, out);
            prefix.pop();
            remaining.insert(i, value);
        }
    }
    let mut out = Vec::new();
    recurse(&mut Vec::new(), &mut (0..n).collect(), &mut out);
    out
}

#[test]
fn baseline_and_optimised_agree_on_random_instances() {
    let mut rng = StdRng::seed_from_u64(2016);

    for _ in 0..60 {
        let ins = random_instance(&mut rng);
        for ordered in permutations(ins.num_operations()) {
            let mut baseline = BaselineOrderSchedule::new(&ins);
            let mut optimised = OptimisedOrderSchedule::new(&ins);

            let fb = baseline.create(&ordered);
            let fo = optimised.create(&ordered);
            assert_eq!(fb, fo, "feasibility mismatch on {ordered:?} of {ins:?}");

            if fb == Feasibility::Feasible {
                assert_eq!(
                    baseline.start_times().as_slice(),
                    optimised.start_times().as_slice(),
                    "start-time mismatch on {ordered:?} of {ins:?}"
                );
            }
        }
    }
}

#[test]
fn feasible_schedules_pass_the_checker() {
    let mut rng = StdRng::seed_from_u64(7);

    for _ in 0..60 {
        let ins = random_instance(&mut rng);
        let mut checker = RobustnessChecker::new(&ins);
        for ordered in permutations(ins.num_operations()) {
            let mut alg = OptimisedOrderSchedule::new(&ins);
            if alg.create(&ordered) == Feasibility::Feasible {
                assert!(
                    checker.is_robust(alg.start_times()),
                    "checker rejects scheduler output {:?} for order {ordered:?} of {ins:?}",
                    alg.start_times()
                );
            }
        }
    }
}

#[test]
fn feasible_start_times_stay_in_bounds() {
    let mut rng = StdRng::seed_from_u64(99);

    for _ in 0..60 {
        let ins = random_instance(&mut rng);
        for ordered in permutations(ins.num_operations()) {
            let mut alg = OptimisedOrderSchedule::new(&ins);
            if alg.create(&ordered) == Feasibility::Feasible {
                let s = alg.start_times();
                for operation in ins.operations() {
                    assert!(s[operation.index] >= operation.release_time);
                    assert!(s[operation.index] <= ins.max_start_time());
                }
            }
        }
    }
}

#[test]
fn any_unilateral_left_shift_is_rejected() {
    let mut rng = StdRng::seed_from_u64(33);

    for _ in 0..40 {
        let ins = random_instance(&mut rng);
        let mut checker = RobustnessChecker::new(&ins);
        for ordered in permutations(ins.num_operations()) {
            let mut alg = OptimisedOrderSchedule::new(&ins);
            if alg.create(&ordered) != Feasibility::Feasible {
                continue;
            }
            let s = alg.start_times().clone();

            for (position, &operation_index) in ordered.iter().enumerate() {
                let operation = ins.operation(operation_index);
                let floor = if position == 0 {
                    operation.release_time
                } else {
                    let prev = ins.operation(ordered[position - 1]);
                    operation.release_time.max(s[prev.index] + prev.processing_time)
                };
                if s[operation_index] - 1 < floor {
                    // A left shift would break release or ordering
                    // constraints; minimality says nothing here.
                    continue;
                }

                let mut shifted = s.clone();
                shifted[operation_index] -= 1;
                assert!(
                    !checker.is_robust(&shifted),
                    "start times {s:?} are not minimal at position {position} \
                     for order {ordered:?} of {ins:?}"
                );
            }
        }
    }
}

#[test]
fn lengthening_an_earlier_operation_never_pulls_later_starts_left() {
    let mut rng = StdRng::seed_from_u64(123);

    for _ in 0..40 {
        let ins = random_instance(&mut rng);
        let n = ins.num_operations();

        // Same instance with the first-ordered operation lengthened by one.
        for ordered in permutations(n) {
            let mut alg = OptimisedOrderSchedule::new(&ins);
            if alg.create(&ordered) != Feasibility::Feasible {
                continue;
            }
            let original = alg.start_times().clone();

            let mut processing_times = ins.collect_processing_times();
            processing_times[ordered[0]] += 1;
            let longer = Instance::new(
                ins.collect_release_times(),
                ins.collect_due_dates(),
                processing_times,
                ins.collect_power_consumptions(),
                ins.max_deviation(),
                ins.num_metering_intervals(),
                ins.interval_length(),
                ins.collect_max_energy_consumptions(),
                BTreeMap::new(),
            )
            .unwrap();

            let mut alg = OptimisedOrderSchedule::new(&longer);
            if alg.create(&ordered) == Feasibility::Feasible {
                let stretched = alg.start_times();
                for position in 1..n {
                    assert!(
                        stretched[ordered[position]] >= original[ordered[position]],
                        "start of position {position} decreased for order {ordered:?}"
                    );
                }
            }
        }
    }
}
